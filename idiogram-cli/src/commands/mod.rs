//! Command implementations for the idiogram CLI

pub mod config;
pub mod genome;
pub mod position;
pub mod render;

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

/// Pretty-print `value` as JSON to `out`, or to stdout when no path is given.
pub fn write_json<T: Serialize>(value: &T, out: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    match out {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("Wrote {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
