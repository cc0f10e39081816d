//! Main entry point for the CLI.

use anyhow::Result;

fn main() -> Result<()> {
    evidence_router::main()
}
