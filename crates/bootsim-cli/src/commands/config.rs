//! Configuration commands.

use anyhow::{Context, Result};
use bootsim_config::{BootSimConfig, Paths};
use std::path::Path;

/// Show the configuration resolved for `dir`.
pub fn show(dir: &Path, format: &str) -> Result<()> {
    let config = BootSimConfig::load_from_dir(dir).context("Failed to load configuration")?;

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(&config)?;
            println!("{json}");
        }
        "toml" => {
            for file in Paths::existing_project_files(dir) {
                println!("# from {}", file.display());
            }
            print!("{}", config.to_toml()?);
        }
        other => anyhow::bail!("Unknown format '{other}' (expected toml or json)"),
    }

    Ok(())
}
