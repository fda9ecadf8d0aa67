//! Genome command - summarize the chromosomes built from a band table

use anyhow::Result;
use idiogram_core::{fingerprint, GenomeBuilder, GenomicPos};
use serde::Serialize;
use std::path::PathBuf;

use super::write_json;
use crate::error::CliError;
use crate::input::load_rows;

#[derive(Debug, Serialize)]
struct ChromosomeSummary {
    name: String,
    absolute_start: GenomicPos,
    absolute_end: GenomicPos,
    total_bases: GenomicPos,
    centromere: Option<GenomicPos>,
    bands: Vec<String>,
}

#[derive(Debug, Serialize)]
struct GenomeSummary {
    fingerprint: String,
    total_bases: GenomicPos,
    chromosomes: Vec<ChromosomeSummary>,
}

pub fn execute(bands: PathBuf, with_bands: bool, out: Option<PathBuf>) -> Result<()> {
    let rows = load_rows(&bands)?;
    let key = fingerprint(&rows);
    let genome = GenomeBuilder::build_from_rows(&rows).map_err(CliError::from)?;
    log::info!(
        "Built genome {:016x}: {} chromosomes, {} bp",
        key,
        genome.len(),
        genome.total_bases
    );

    let chromosomes = genome
        .chromosomes
        .iter()
        .map(|chromosome| ChromosomeSummary {
            name: chromosome.name.clone(),
            absolute_start: chromosome.absolute_start,
            absolute_end: chromosome.absolute_end,
            total_bases: chromosome.total_bases,
            centromere: chromosome.centromere,
            bands: if with_bands {
                chromosome.bands.iter().map(|band| band.name.clone()).collect()
            } else {
                Vec::new()
            },
        })
        .collect();

    let summary = GenomeSummary {
        fingerprint: format!("{:016x}", key),
        total_bases: genome.total_bases,
        chromosomes,
    };
    write_json(&summary, out.as_deref())
}
