//! Main entry point for the CLI: load and check configuration, compose the schema.

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use anyhow::anyhow;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::configuration::Configuration;
use crate::configuration::generate_config_schema;
use crate::schema::ComposedSchema;
use crate::therapeutic_areas::TherapeuticAreas;

/// Options for the router
#[derive(Parser, Debug)]
#[clap(
    name = "evidence-router",
    about = "Composes and checks the evidence graph schema"
)]
pub(crate) struct Opt {
    /// Log level (off|error|warn|info|debug|trace).
    #[clap(
        long = "log",
        default_value = "info",
        alias = "log-level",
        env = "EVIDENCE_ROUTER_LOG"
    )]
    log_level: String,

    /// Configuration location relative to the current directory.
    #[clap(short, long = "config", env = "EVIDENCE_ROUTER_CONFIG_PATH")]
    config_path: Option<PathBuf>,

    /// Prints the configuration schema.
    #[clap(long)]
    schema: bool,

    /// Prints the composed GraphQL schema.
    #[clap(long)]
    print_sdl: bool,

    /// Display version and exit.
    #[clap(long, short = 'V')]
    version: bool,
}

/// This is the main router entrypoint.
pub fn main() -> Result<()> {
    run(Opt::parse())
}

fn run(opt: Opt) -> Result<()> {
    if opt.version {
        println!("{}", std::env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if opt.schema {
        let schema = generate_config_schema();
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    init_logging(&opt.log_level)?;
    let composed = load(&opt)?;
    if opt.print_sdl {
        println!("{}", composed.sdl());
        return Ok(());
    }

    tracing::info!(
        version = std::env!("CARGO_PKG_VERSION"),
        types = composed.resolvers().len(),
        "schema composed and checked"
    );
    Ok(())
}

/// Load the configuration and the tables it names, then compose the schema.
fn load(opt: &Opt) -> Result<ComposedSchema> {
    let configuration = match &opt.config_path {
        Some(path) => {
            let path = if path.is_relative() {
                std::env::current_dir()?.join(path)
            } else {
                path.clone()
            };
            Configuration::from_file(&path)
                .with_context(|| format!("could not load configuration from {}", path.display()))?
        }
        None => Configuration::default(),
    };

    if let Some(path) = &configuration.therapeutic_areas {
        TherapeuticAreas::from_file(path).context("could not load therapeutic areas")?;
    }

    ComposedSchema::compose().context("could not compose the schema")
}

fn init_logging(log_level: &str) -> Result<()> {
    let builder = tracing_subscriber::fmt::fmt().with_env_filter(
        EnvFilter::try_new(log_level).context("could not parse log configuration")?,
    );
    let result = if std::io::stdout().is_terminal() {
        builder.try_init()
    } else {
        builder.json().try_init()
    };
    result.map_err(|error| anyhow!(error))
}
