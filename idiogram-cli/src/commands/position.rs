//! Position command - resolve base pairs to chromosome positions

use anyhow::Result;
use idiogram_core::{GenomicPos, Idiogram, IdiogramConfig};
use std::path::PathBuf;

use super::write_json;
use crate::error::CliError;
use crate::input::load_rows;

/// With `chromosome`, `positions` are relative to it (none means its end);
/// otherwise they are absolute genome coordinates.
pub fn execute(
    config: &IdiogramConfig,
    bands: PathBuf,
    chromosome: Option<String>,
    positions: Vec<GenomicPos>,
    out: Option<PathBuf>,
) -> Result<()> {
    let rows = load_rows(&bands)?;
    let idiogram = Idiogram::initialize(rows, config.clone()).map_err(CliError::from)?;

    let mut resolved = Vec::new();
    match chromosome {
        Some(name) if positions.is_empty() => {
            let position = idiogram
                .position_at_relative(&name, None)
                .map_err(CliError::from)?;
            resolved.push(serde_json::to_value(&position)?);
        }
        Some(name) => {
            for bp in positions {
                let position = idiogram
                    .position_at_relative(&name, Some(bp))
                    .map_err(CliError::from)?;
                resolved.push(serde_json::to_value(&position)?);
            }
        }
        None => {
            if positions.is_empty() {
                return Err(CliError::argument("give at least one position or --chromosome").into());
            }
            for bp in positions {
                let position = idiogram.position_at(bp);
                if !position.is_within_genome() {
                    log::warn!("{} lies outside the genome [0, {})", bp, idiogram.genome().total_bases);
                }
                resolved.push(serde_json::to_value(&position)?);
            }
        }
    }

    write_json(&resolved, out.as_deref())
}
