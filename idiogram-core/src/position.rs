//! Absolute and chromosome-relative position lookup

use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::error::Result;
use crate::types::*;

/// A resolved genomic location.
///
/// `chromosome` is `None` when the base pair lies outside the genome, which is
/// a normal outcome for pointer positions left or right of the idiogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position<'g> {
    pub chromosome: Option<&'g Chromosome>,
    pub absolute_bp: GenomicPos,
    pub relative_bp: Option<GenomicPos>,
}

impl<'g> Position<'g> {
    pub fn outside(absolute_bp: GenomicPos) -> Self {
        Self {
            chromosome: None,
            absolute_bp,
            relative_bp: None,
        }
    }

    pub fn chromosome_name(&self) -> Option<&'g str> {
        self.chromosome.map(|chromosome| chromosome.name.as_str())
    }

    pub fn is_within_genome(&self) -> bool {
        self.chromosome.is_some()
    }

    /// The band under this position, if any.
    pub fn band(&self) -> Option<&'g Band> {
        let chromosome = self.chromosome?;
        let relative = self.relative_bp?;
        chromosome
            .bands
            .iter()
            .find(|band| band.start <= relative && relative < band.end)
    }
}

impl Serialize for Position<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Position", 4)?;
        state.serialize_field("chromosome", &self.chromosome_name())?;
        state.serialize_field("absolute_bp", &self.absolute_bp)?;
        state.serialize_field("relative_bp", &self.relative_bp)?;
        state.serialize_field("band", &self.band().map(|band| band.name.as_str()))?;
        state.end()
    }
}

impl Genome {
    /// Chromosome whose half-open `[absolute_start, absolute_end)` holds `bp`.
    pub fn chromosome_at(&self, bp: GenomicPos) -> Option<&Chromosome> {
        let index = self.chromosomes.partition_point(|c| c.absolute_end <= bp);
        self.chromosomes
            .get(index)
            .filter(|chromosome| chromosome.contains_absolute(bp))
    }

    pub fn resolve(&self, absolute_bp: GenomicPos) -> Position<'_> {
        match self.chromosome_at(absolute_bp) {
            Some(chromosome) => Position {
                chromosome: Some(chromosome),
                absolute_bp,
                relative_bp: Some(absolute_bp - chromosome.absolute_start),
            },
            None => Position::outside(absolute_bp),
        }
    }

    /// Position on a named chromosome. `None` means the chromosome's end.
    pub fn resolve_relative(
        &self,
        name: &str,
        relative_bp: Option<GenomicPos>,
    ) -> Result<Position<'_>> {
        let chromosome = self.chromosome(name)?;
        let relative = relative_bp.unwrap_or(chromosome.total_bases);
        Ok(Position {
            chromosome: Some(chromosome),
            absolute_bp: chromosome.to_absolute(relative),
            relative_bp: Some(relative),
        })
    }

    /// Owner of an interval endpoint inside `[0, total_bases]`.
    ///
    /// A closing endpoint sitting on a boundary belongs to the chromosome on its
    /// left, an opening one to the chromosome on its right.
    pub(crate) fn endpoint_owner(&self, bp: GenomicPos, closing: bool) -> Option<&Chromosome> {
        let probe = if closing { bp - 1 } else { bp };
        self.chromosome_at(probe)
            .or_else(|| {
                if probe >= self.total_bases {
                    self.last_chromosome()
                } else {
                    None
                }
            })
            .or_else(|| self.chromosomes.first())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IdiogramError;
    use crate::genome::GenomeBuilder;

    fn genome() -> Genome {
        GenomeBuilder::build_from_rows(&[
            RawBand::new("chr1", 0, 600, "p1", "gneg"),
            RawBand::new("chr1", 600, 1000, "q1", "gpos50"),
            RawBand::new("chr2", 0, 800, "q1", "gneg"),
        ])
        .unwrap()
    }

    #[test]
    fn test_resolve_inside_chromosomes() {
        let genome = genome();
        let first = genome.resolve(500);
        assert_eq!(first.chromosome_name(), Some("chr1"));
        assert_eq!(first.relative_bp, Some(500));
        assert_eq!(first.band().unwrap().name, "p1");

        let second = genome.resolve(1200);
        assert_eq!(second.chromosome_name(), Some("chr2"));
        assert_eq!(second.relative_bp, Some(200));
    }

    #[test]
    fn test_boundary_belongs_to_next_chromosome() {
        let genome = genome();
        assert_eq!(genome.resolve(999).chromosome_name(), Some("chr1"));
        assert_eq!(genome.resolve(1000).chromosome_name(), Some("chr2"));
        assert_eq!(genome.resolve(1000).relative_bp, Some(0));
    }

    #[test]
    fn test_resolve_outside_genome() {
        let genome = genome();
        let past_end = genome.resolve(1800);
        assert!(!past_end.is_within_genome());
        assert_eq!(past_end.absolute_bp, 1800);
        assert_eq!(past_end.relative_bp, None);
        assert!(!genome.resolve(-1).is_within_genome());
    }

    #[test]
    fn test_resolve_relative() {
        let genome = genome();
        let position = genome.resolve_relative("chr2", Some(200)).unwrap();
        assert_eq!(position.absolute_bp, 1200);

        let end = genome.resolve_relative("chr1", None).unwrap();
        assert_eq!(end.chromosome_name(), Some("chr1"));
        assert_eq!(end.relative_bp, Some(1000));
        assert_eq!(end.absolute_bp, 1000);

        assert!(matches!(
            genome.resolve_relative("chr9", Some(1)),
            Err(IdiogramError::UnknownChromosome { .. })
        ));
    }

    #[test]
    fn test_endpoint_owner() {
        let genome = genome();
        assert_eq!(genome.endpoint_owner(1000, true).unwrap().name, "chr1");
        assert_eq!(genome.endpoint_owner(1000, false).unwrap().name, "chr2");
        assert_eq!(genome.endpoint_owner(1800, false).unwrap().name, "chr2");
        assert_eq!(genome.endpoint_owner(0, true).unwrap().name, "chr1");
    }
}
