//! Config command - print or save idiogram configuration

use anyhow::{Context, Result};
use idiogram_core::IdiogramConfig;
use std::path::PathBuf;

use super::write_json;
use crate::error::CliError;

pub fn execute(config: &IdiogramConfig, example: bool, save: Option<PathBuf>) -> Result<()> {
    if example {
        let content = IdiogramConfig::example_toml().map_err(CliError::from)?;
        print!("{}", content);
        return Ok(());
    }

    if let Some(path) = save {
        config
            .save_to_file(&path)
            .map_err(CliError::from)
            .with_context(|| format!("Failed to save configuration to {}", path.display()))?;
        log::info!("Configuration saved to {}", path.display());
        return Ok(());
    }

    write_json(config, None)
}
