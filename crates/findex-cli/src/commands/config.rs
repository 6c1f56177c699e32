//! Config command - show the normalized configuration.

use findex_core::Config;
use std::path::Path;

/// Run the config command.
pub fn run(config_path: &Path) -> anyhow::Result<()> {
    let config = Config::load_from(config_path)?;

    println!("Configuration file: {}", config_path.display());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);

    Ok(())
}
