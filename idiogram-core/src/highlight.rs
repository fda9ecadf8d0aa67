//! Highlight specifications and the highlight collection
//!
//! Every accepted call shape is a [`HighlightSpec`] variant. Resolution against
//! a [`Genome`] turns it into a normalized [`ResolvedRange`], which the engine
//! stores as a [`Highlight`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::engine::Idiogram;
use crate::error::{IdiogramError, Result};
use crate::types::*;

/// A `{chromosome, basePair}` record.
///
/// With a chromosome the base pair is relative to it; without one it is absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locus {
    pub chromosome: Option<String>,
    pub base_pair: GenomicPos,
}

impl Locus {
    pub fn relative<S: Into<String>>(chromosome: S, base_pair: GenomicPos) -> Self {
        Self {
            chromosome: Some(chromosome.into()),
            base_pair,
        }
    }

    pub fn absolute(base_pair: GenomicPos) -> Self {
        Self {
            chromosome: None,
            base_pair,
        }
    }
}

/// The genomic range a highlight (or a range zoom) covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HighlightSpec {
    /// Chromosome-relative endpoints, possibly on different chromosomes.
    Span {
        start_chromosome: String,
        start_bp: GenomicPos,
        end_chromosome: String,
        end_bp: GenomicPos,
    },
    /// Genome-wide absolute endpoints.
    Absolute { start: GenomicPos, end: GenomicPos },
    /// Two position-shaped records.
    Positions { start: Locus, end: Locus },
    /// A whole chromosome.
    Chromosome(String),
    /// A single named band.
    Band { chromosome: String, band: String },
    /// Every chromosome.
    Genome,
}

impl HighlightSpec {
    pub fn span<S: Into<String>>(
        start_chromosome: S,
        start_bp: GenomicPos,
        end_chromosome: S,
        end_bp: GenomicPos,
    ) -> Self {
        HighlightSpec::Span {
            start_chromosome: start_chromosome.into(),
            start_bp,
            end_chromosome: end_chromosome.into(),
            end_bp,
        }
    }

    pub fn absolute(start: GenomicPos, end: GenomicPos) -> Self {
        HighlightSpec::Absolute { start, end }
    }

    pub fn positions(start: Locus, end: Locus) -> Self {
        HighlightSpec::Positions { start, end }
    }

    pub fn chromosome<S: Into<String>>(name: S) -> Self {
        HighlightSpec::Chromosome(name.into())
    }

    pub fn band<S: Into<String>>(chromosome: S, band: S) -> Self {
        HighlightSpec::Band {
            chromosome: chromosome.into(),
            band: band.into(),
        }
    }

    /// Build a spec from loosely typed arguments, as typed on a command line.
    ///
    /// * `all`: the whole genome
    /// * `chr`: a chromosome
    /// * `chr band`: a band
    /// * `start end`: absolute base pairs
    /// * `chr start end`: a range on one chromosome
    /// * `chr start chr end`: a range across chromosomes
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Self> {
        let args: Vec<&str> = args.iter().map(|arg| arg.as_ref()).collect();
        let number = |text: &str| text.parse::<GenomicPos>().ok();

        match args.as_slice() {
            ["all"] => Ok(HighlightSpec::Genome),
            [chromosome] => Ok(HighlightSpec::chromosome(*chromosome)),
            [first, second] => match (number(*first), number(*second)) {
                (Some(start), Some(end)) => Ok(HighlightSpec::absolute(start, end)),
                (None, _) => Ok(HighlightSpec::band(*first, *second)),
                (Some(_), None) => Err(IdiogramError::invalid_arguments(format!(
                    "expected `start end` or `chromosome band`, got `{} {}`",
                    first, second
                ))),
            },
            [chromosome, start, end] => match (number(*start), number(*end)) {
                (Some(start), Some(end)) => {
                    Ok(HighlightSpec::span(*chromosome, start, *chromosome, end))
                }
                _ => Err(IdiogramError::invalid_arguments(format!(
                    "expected `chromosome start end`, got `{} {} {}`",
                    chromosome, start, end
                ))),
            },
            [start_chromosome, start, end_chromosome, end] => {
                match (number(*start), number(*end)) {
                    (Some(start), Some(end)) => Ok(HighlightSpec::span(
                        *start_chromosome,
                        start,
                        *end_chromosome,
                        end,
                    )),
                    _ => Err(IdiogramError::invalid_arguments(format!(
                        "expected `chromosome start chromosome end`, got `{}`",
                        args.join(" ")
                    ))),
                }
            }
            _ => Err(IdiogramError::invalid_arguments(format!(
                "unrecognized highlight arguments ({} given)",
                args.len()
            ))),
        }
    }

    /// Resolve to absolute endpoints, clamped to the chromosomes they name and
    /// ordered so that start <= end.
    pub fn resolve(&self, genome: &Genome) -> Result<ResolvedRange> {
        let range = match self {
            HighlightSpec::Span {
                start_chromosome,
                start_bp,
                end_chromosome,
                end_bp,
            } => ResolvedRange {
                start: relative_endpoint(genome, start_chromosome, *start_bp)?,
                end: relative_endpoint(genome, end_chromosome, *end_bp)?,
            },
            HighlightSpec::Absolute { start, end } => absolute_range(genome, *start, *end)?,
            HighlightSpec::Positions { start, end } => match (&start.chromosome, &end.chromosome) {
                (None, None) => absolute_range(genome, start.base_pair, end.base_pair)?,
                _ => ResolvedRange {
                    start: locus_endpoint(genome, start, false)?,
                    end: locus_endpoint(genome, end, true)?,
                },
            },
            HighlightSpec::Chromosome(name) => {
                let chromosome = genome.chromosome(name)?;
                ResolvedRange::within(chromosome, 0, chromosome.total_bases)
            }
            HighlightSpec::Band { chromosome, band } => {
                let band = genome.band(chromosome, band)?;
                let owner = genome
                    .owner(band)
                    .ok_or_else(|| IdiogramError::unknown_chromosome(chromosome.as_str()))?;
                ResolvedRange::within(owner, band.start, band.end.min(owner.total_bases))
            }
            HighlightSpec::Genome => {
                let (first, last) = match (genome.chromosomes.first(), genome.last_chromosome()) {
                    (Some(first), Some(last)) => (first, last),
                    _ => return Err(IdiogramError::malformed_input("genome has no chromosomes")),
                };
                ResolvedRange {
                    start: Endpoint::new(first, 0),
                    end: Endpoint::new(last, genome.total_bases),
                }
            }
        };
        Ok(range.normalized())
    }
}

/// One end of a resolved range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub chromosome: String,
    pub chromosome_start: GenomicPos,
    pub absolute: GenomicPos,
}

impl Endpoint {
    fn new(chromosome: &Chromosome, absolute: GenomicPos) -> Self {
        Self {
            chromosome: chromosome.name.clone(),
            chromosome_start: chromosome.absolute_start,
            absolute,
        }
    }

    pub fn relative(&self) -> GenomicPos {
        self.absolute - self.chromosome_start
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRange {
    pub start: Endpoint,
    pub end: Endpoint,
}

impl ResolvedRange {
    fn within(chromosome: &Chromosome, start: GenomicPos, end: GenomicPos) -> Self {
        Self {
            start: Endpoint::new(chromosome, chromosome.to_absolute(start)),
            end: Endpoint::new(chromosome, chromosome.to_absolute(end)),
        }
    }

    /// Swap endpoints, owners included, if they arrived reversed.
    fn normalized(self) -> Self {
        if self.start.absolute > self.end.absolute {
            Self {
                start: self.end,
                end: self.start,
            }
        } else {
            self
        }
    }

    pub fn length(&self) -> GenomicPos {
        self.end.absolute - self.start.absolute
    }
}

fn relative_endpoint(genome: &Genome, name: &str, relative: GenomicPos) -> Result<Endpoint> {
    let chromosome = genome.chromosome(name)?;
    let clamped = relative.clamp(0, chromosome.total_bases);
    Ok(Endpoint::new(chromosome, chromosome.to_absolute(clamped)))
}

fn locus_endpoint(genome: &Genome, locus: &Locus, closing: bool) -> Result<Endpoint> {
    match &locus.chromosome {
        Some(name) => relative_endpoint(genome, name, locus.base_pair),
        None => absolute_endpoint(genome, locus.base_pair, closing),
    }
}

fn absolute_endpoint(genome: &Genome, bp: GenomicPos, closing: bool) -> Result<Endpoint> {
    let clamped = bp.clamp(0, genome.total_bases);
    let owner = genome
        .endpoint_owner(clamped, closing)
        .ok_or_else(|| IdiogramError::malformed_input("genome has no chromosomes"))?;
    Ok(Endpoint::new(owner, clamped))
}

fn absolute_range(genome: &Genome, start: GenomicPos, end: GenomicPos) -> Result<ResolvedRange> {
    let (start, end) = if start > end { (end, start) } else { (start, end) };
    Ok(ResolvedRange {
        start: absolute_endpoint(genome, start, false)?,
        end: absolute_endpoint(genome, end, true)?,
    })
}

/// Per-highlight overrides. Unset fields fall back to the configured defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HighlightOptions {
    pub color: Option<String>,
    pub opacity: Option<f64>,
    /// Redraw the whole idiogram instead of only the highlight layer.
    #[serde(default)]
    pub full_redraw: bool,
}

impl HighlightOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_color<S: Into<String>>(mut self, color: S) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn with_full_redraw(mut self) -> Self {
        self.full_redraw = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HighlightId(pub u64);

/// Identity used to match highlight visuals between redraws.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HighlightKey(String);

impl HighlightKey {
    pub(crate) fn new<S: Into<String>>(key: S) -> Self {
        HighlightKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HighlightKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub id: HighlightId,
    pub start_chromosome: String,
    pub end_chromosome: String,
    pub relative_start: GenomicPos,
    pub relative_end: GenomicPos,
    pub absolute_start: GenomicPos,
    pub absolute_end: GenomicPos,
    pub color: String,
    pub opacity: f64,
}

impl Highlight {
    pub fn new(
        id: HighlightId,
        range: ResolvedRange,
        options: &HighlightOptions,
        default_color: &str,
        default_opacity: f64,
    ) -> Self {
        Self {
            id,
            relative_start: range.start.relative(),
            relative_end: range.end.relative(),
            absolute_start: range.start.absolute,
            absolute_end: range.end.absolute,
            start_chromosome: range.start.chromosome,
            end_chromosome: range.end.chromosome,
            color: options
                .color
                .clone()
                .unwrap_or_else(|| default_color.to_string()),
            opacity: options.opacity.unwrap_or(default_opacity),
        }
    }

    pub fn key(&self) -> HighlightKey {
        HighlightKey::new(format!(
            "{}:{}-{}:{}",
            self.start_chromosome, self.absolute_start, self.end_chromosome, self.absolute_end
        ))
    }

    pub fn length(&self) -> GenomicPos {
        self.absolute_end - self.absolute_start
    }
}

/// Capability returned by [`Idiogram::highlight`]; consumed by [`remove`](Self::remove).
#[derive(Debug, PartialEq, Eq)]
#[must_use = "dropping the handle leaves no way to remove this highlight individually"]
pub struct HighlightHandle {
    id: HighlightId,
}

impl HighlightHandle {
    pub(crate) fn new(id: HighlightId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> HighlightId {
        self.id
    }

    /// Remove the highlight from `idiogram`. Returns `false` if it was already
    /// gone (bulk removal, or a deferred highlight that failed to resolve).
    pub fn remove(self, idiogram: &mut Idiogram) -> bool {
        idiogram.remove_highlight(self.id)
    }
}

/// Ordered highlight collection, oldest first.
#[derive(Debug, Clone, Default)]
pub struct HighlightSet {
    entries: Vec<Highlight>,
}

impl HighlightSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, highlight: Highlight) {
        self.entries.push(highlight);
    }

    pub fn remove(&mut self, id: HighlightId) -> Option<Highlight> {
        let index = self.entries.iter().position(|highlight| highlight.id == id)?;
        Some(self.entries.remove(index))
    }

    pub fn get(&self, id: HighlightId) -> Option<&Highlight> {
        self.entries.iter().find(|highlight| highlight.id == id)
    }

    pub fn ids(&self) -> Vec<HighlightId> {
        self.entries.iter().map(|highlight| highlight.id).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Highlight> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a HighlightSet {
    type Item = &'a Highlight;
    type IntoIter = std::slice::Iter<'a, Highlight>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
