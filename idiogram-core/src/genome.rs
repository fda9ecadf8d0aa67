//! Genomic model builder
//!
//! Turns raw cytoband rows into an ordered [`Genome`] where every chromosome
//! carries its absolute offset and every band a back-reference to its owner.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use xxhash_rust::xxh64::Xxh64;

use crate::error::{IdiogramError, Result};
use crate::types::*;

/// Prefix stripped before comparing chromosome names.
pub const CHROMOSOME_PREFIX: &str = "chr";

/// Number of autosomes kept by the allow-list.
pub const AUTOSOME_COUNT: u32 = 22;

/// Sort rank of a canonical chromosome name, `None` for anything off the allow-list.
///
/// Autosomes rank by number, then X, then Y.
pub fn canonical_rank(name: &str) -> Option<u32> {
    let stripped = name.strip_prefix(CHROMOSOME_PREFIX)?;
    match stripped {
        "X" => Some(AUTOSOME_COUNT + 1),
        "Y" => Some(AUTOSOME_COUNT + 2),
        number => {
            // "01" is not canonical
            if number.starts_with('0') {
                return None;
            }
            number
                .parse::<u32>()
                .ok()
                .filter(|n| (1..=AUTOSOME_COUNT).contains(n))
        }
    }
}

pub fn is_canonical(name: &str) -> bool {
    canonical_rank(name).is_some()
}

/// Orders chromosome names: numeric ascending, then X, then Y, then the rest lexically.
pub fn compare_chromosome_names(a: &str, b: &str) -> Ordering {
    match (canonical_rank(a), canonical_rank(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Input accepted by the builder: raw rows, or a genome that was already built.
#[derive(Debug, Clone)]
pub enum GenomeSource {
    Rows(Vec<RawBand>),
    Built(Arc<Genome>),
}

impl From<Vec<RawBand>> for GenomeSource {
    fn from(rows: Vec<RawBand>) -> Self {
        GenomeSource::Rows(rows)
    }
}

impl From<&[RawBand]> for GenomeSource {
    fn from(rows: &[RawBand]) -> Self {
        GenomeSource::Rows(rows.to_vec())
    }
}

impl From<Genome> for GenomeSource {
    fn from(genome: Genome) -> Self {
        GenomeSource::Built(Arc::new(genome))
    }
}

impl From<Arc<Genome>> for GenomeSource {
    fn from(genome: Arc<Genome>) -> Self {
        GenomeSource::Built(genome)
    }
}

pub struct GenomeBuilder;

impl GenomeBuilder {
    /// Build a genome from any source. A built genome passes through untouched.
    pub fn build(source: impl Into<GenomeSource>) -> Result<Arc<Genome>> {
        match source.into() {
            GenomeSource::Rows(rows) => Ok(Arc::new(Self::build_from_rows(&rows)?)),
            GenomeSource::Built(genome) => {
                log::debug!("Genome already built ({} chromosomes), reusing", genome.len());
                Ok(genome)
            }
        }
    }

    pub fn build_from_rows(rows: &[RawBand]) -> Result<Genome> {
        let mut groups: HashMap<&str, Vec<&RawBand>> = HashMap::new();
        let mut dropped = 0usize;

        for row in rows {
            if !is_canonical(&row.chromosome) {
                dropped += 1;
                continue;
            }
            if row.start < 0 || row.start > row.end {
                return Err(IdiogramError::malformed_input(format!(
                    "band {} on {} has invalid range {}-{}",
                    row.name, row.chromosome, row.start, row.end
                )));
            }
            groups.entry(row.chromosome.as_str()).or_default().push(row);
        }

        if dropped > 0 {
            log::debug!("Dropped {} bands on non-canonical contigs", dropped);
        }

        let mut names: Vec<&str> = groups.keys().copied().collect();
        names.sort_by(|a, b| compare_chromosome_names(a, b));

        let mut genome = Genome::new();
        for name in names {
            let group = &groups[name];
            let total_bases = group.iter().map(|row| row.end).max().unwrap_or(0);
            if total_bases == 0 {
                log::warn!("Chromosome {} has no bases after filtering, excluding it", name);
                continue;
            }
            check_disjoint(name, group)?;

            let index = genome.chromosomes.len();
            let bands: Vec<Band> = group
                .iter()
                .map(|row| Band {
                    name: row.name.clone(),
                    stain: Stain::from(row.stain.as_str()),
                    start: row.start,
                    end: row.end,
                    chromosome: index,
                })
                .collect();
            let centromere = locate_centromere(&bands);
            if centromere.is_none() {
                log::debug!("Chromosome {} has no acen band, treating as acentromeric", name);
            }

            let absolute_start = genome.total_bases;
            let absolute_end = absolute_start.checked_add(total_bases).ok_or_else(|| {
                IdiogramError::malformed_input(format!(
                    "genome length overflows at {} ({} bp after {} bp)",
                    name, total_bases, absolute_start
                ))
            })?;
            genome.chromosomes.push(Chromosome {
                index,
                name: name.to_string(),
                bands,
                absolute_start,
                absolute_end,
                total_bases,
                centromere,
            });
            genome.chromosome_map.insert(name.to_string(), index);
            genome.total_bases = absolute_end;
        }

        if genome.is_empty() {
            return Err(IdiogramError::malformed_input(
                "no canonical chromosome with bands in input",
            ));
        }

        log::info!(
            "Built genome: {} chromosomes, {} bp",
            genome.len(),
            genome.total_bases
        );
        Ok(genome)
    }
}

fn check_disjoint(name: &str, group: &[&RawBand]) -> Result<()> {
    let mut ranges: Vec<(GenomicPos, GenomicPos)> =
        group.iter().map(|row| (row.start, row.end)).collect();
    ranges.sort_unstable();
    for pair in ranges.windows(2) {
        if pair[1].0 < pair[0].1 {
            return Err(IdiogramError::malformed_input(format!(
                "overlapping bands on {}: {}-{} and {}-{}",
                name, pair[0].0, pair[0].1, pair[1].0, pair[1].1
            )));
        }
    }
    Ok(())
}

/// p-arm acen end, else q-arm acen start.
fn locate_centromere(bands: &[Band]) -> Option<GenomicPos> {
    let first_acen = |arm: Arm| {
        bands
            .iter()
            .find(|band| band.is_centromeric() && band.arm() == Some(arm))
    };
    first_acen(Arm::P)
        .map(|band| band.end)
        .or_else(|| first_acen(Arm::Q).map(|band| band.start))
}

/// Stable fingerprint of a row set, used as the cache key.
pub fn fingerprint(rows: &[RawBand]) -> u64 {
    let mut hasher = Xxh64::new(0);
    for row in rows {
        hasher.update(row.chromosome.as_bytes());
        hasher.update(&[0]);
        hasher.update(&row.start.to_le_bytes());
        hasher.update(&row.end.to_le_bytes());
        hasher.update(row.name.as_bytes());
        hasher.update(&[0]);
        hasher.update(row.stain.as_bytes());
        hasher.update(&[0xff]);
    }
    hasher.digest()
}

/// Memoizes built genomes by input fingerprint.
///
/// Owned by the caller; two engines only share a genome if they share a cache.
#[derive(Debug, Default)]
pub struct GenomeCache {
    entries: HashMap<u64, Arc<Genome>>,
    hits: usize,
    misses: usize,
}

impl GenomeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(&mut self, rows: &[RawBand]) -> Result<Arc<Genome>> {
        let key = fingerprint(rows);
        if let Some(genome) = self.entries.get(&key) {
            self.hits += 1;
            return Ok(Arc::clone(genome));
        }
        self.misses += 1;
        let genome = Arc::new(GenomeBuilder::build_from_rows(rows)?);
        self.entries.insert(key, Arc::clone(&genome));
        Ok(genome)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
