//! Logic for loading configuration in to an object model

use std::path::Path;
use std::path::PathBuf;

use schemars::JsonSchema;
use schemars::r#gen::SchemaSettings;
use schemars::schema::RootSchema;
use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigurationError;

/// The configuration for the router.
///
/// Can be created through `serde::Deserialize` from YAML, or inline in Rust code with
/// `Configuration::default()`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct Configuration {
    /// Path of the JSON table mapping diseases to their therapeutic areas.
    /// When unset no disease has therapeutic areas.
    pub therapeutic_areas: Option<PathBuf>,

    /// Paging of connection fields.
    pub connection: ConnectionSettings,
}

/// Paging of connection fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct ConnectionSettings {
    /// The page size used when `first` is not given.
    pub default_page_size: i32,

    /// The largest `first` a client may ask for.
    pub max_page_size: i32,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            default_page_size: 50,
            max_page_size: 10_000,
        }
    }
}

impl Configuration {
    pub fn from_file(path: &Path) -> Result<Self, ConfigurationError> {
        let contents =
            std::fs::read_to_string(path).map_err(|error| ConfigurationError::CannotReadFile {
                path: path.display().to_string(),
                error,
            })?;
        contents.parse()
    }

    fn validate(self) -> Result<Self, ConfigurationError> {
        let connection = &self.connection;
        if connection.default_page_size < 0 || connection.max_page_size < 0 {
            return Err(ConfigurationError::InvalidConfiguration {
                message: "page sizes must not be negative",
                error: format!(
                    "default_page_size: {}, max_page_size: {}",
                    connection.default_page_size, connection.max_page_size
                ),
            });
        }
        if connection.default_page_size > connection.max_page_size {
            return Err(ConfigurationError::InvalidConfiguration {
                message: "default_page_size must not exceed max_page_size",
                error: format!(
                    "{} > {}",
                    connection.default_page_size, connection.max_page_size
                ),
            });
        }
        Ok(self)
    }
}

impl std::str::FromStr for Configuration {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // an empty file is a valid, all-defaults configuration
        if s.trim().is_empty() {
            return Configuration::default().validate();
        }
        serde_yaml::from_str::<Configuration>(s)
            .map_err(ConfigurationError::DeserializeConfigError)?
            .validate()
    }
}

/// Generate a JSON schema for the configuration.
pub fn generate_config_schema() -> RootSchema {
    let settings = SchemaSettings::draft07().with(|s| {
        s.option_nullable = true;
        s.option_add_null_type = false;
        s.inline_subschemas = true;
    });
    let generator = settings.into_generator();
    generator.into_root_schema_for::<Configuration>()
}
