use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{IdiogramError, Result};

/// Base-pair coordinate. Signed: the pointer can sit left of the genome.
pub type GenomicPos = i64;

/// One row of a cytoband table before model building.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawBand {
    pub chromosome: String,
    pub start: GenomicPos,
    pub end: GenomicPos,
    pub name: String,
    pub stain: String,
}

impl RawBand {
    pub fn new<S: Into<String>>(
        chromosome: S,
        start: GenomicPos,
        end: GenomicPos,
        name: S,
        stain: S,
    ) -> Self {
        Self {
            chromosome: chromosome.into(),
            start,
            end,
            name: name.into(),
            stain: stain.into(),
        }
    }
}

/// Giemsa stain category of a band.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Stain {
    Gneg,
    /// `gposNN`; the density is 0 when the table omits it.
    Gpos(u8),
    Acen,
    Gvar,
    Stalk,
    Other(String),
}

impl From<&str> for Stain {
    fn from(s: &str) -> Self {
        match s {
            "gneg" => Stain::Gneg,
            "acen" => Stain::Acen,
            "gvar" => Stain::Gvar,
            "stalk" => Stain::Stalk,
            stain if stain.starts_with("gpos") => {
                let density = &stain[4..];
                if density.is_empty() {
                    return Stain::Gpos(0);
                }
                match density.parse::<u8>() {
                    Ok(percentage) if percentage <= 100 => Stain::Gpos(percentage),
                    _ => Stain::Other(stain.to_string()),
                }
            }
            other => Stain::Other(other.to_string()),
        }
    }
}

impl From<String> for Stain {
    fn from(s: String) -> Self {
        Stain::from(s.as_str())
    }
}

impl From<Stain> for String {
    fn from(stain: Stain) -> Self {
        match stain {
            Stain::Gneg => "gneg".to_string(),
            Stain::Gpos(0) => "gpos".to_string(),
            Stain::Gpos(density) => format!("gpos{}", density),
            Stain::Acen => "acen".to_string(),
            Stain::Gvar => "gvar".to_string(),
            Stain::Stalk => "stalk".to_string(),
            Stain::Other(other) => other,
        }
    }
}

/// Chromosome arm a band belongs to, taken from the first letter of its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arm {
    P,
    Q,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub name: String,
    pub stain: Stain,
    /// Chromosome-relative start.
    pub start: GenomicPos,
    /// Chromosome-relative end.
    pub end: GenomicPos,
    /// Index of the owning chromosome in [`Genome::chromosomes`].
    pub chromosome: usize,
}

impl Band {
    pub fn length(&self) -> GenomicPos {
        self.end - self.start
    }

    pub fn arm(&self) -> Option<Arm> {
        match self.name.chars().next() {
            Some('p') => Some(Arm::P),
            Some('q') => Some(Arm::Q),
            _ => None,
        }
    }

    pub fn is_centromeric(&self) -> bool {
        self.stain == Stain::Acen
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chromosome {
    pub index: usize,
    pub name: String,
    pub bands: Vec<Band>,
    pub absolute_start: GenomicPos,
    pub absolute_end: GenomicPos,
    pub total_bases: GenomicPos,
    /// p/q boundary, chromosome-relative. `None` when no acen band exists.
    pub centromere: Option<GenomicPos>,
}

impl Chromosome {
    pub fn band(&self, name: &str) -> Option<&Band> {
        self.bands.iter().find(|band| band.name == name)
    }

    pub fn contains_absolute(&self, bp: GenomicPos) -> bool {
        self.absolute_start <= bp && bp < self.absolute_end
    }

    pub fn to_absolute(&self, relative: GenomicPos) -> GenomicPos {
        self.absolute_start + relative
    }

    /// Relative ranges the chromosome is clipped to when drawn.
    ///
    /// Two arms when a centromere is known, otherwise the whole chromosome.
    pub fn arm_bounds(&self) -> Vec<(GenomicPos, GenomicPos)> {
        match self.centromere {
            Some(centromere) => vec![(0, centromere), (centromere, self.total_bases)],
            None => vec![(0, self.total_bases)],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    pub chromosomes: Vec<Chromosome>,
    pub total_bases: GenomicPos,
    pub chromosome_map: HashMap<String, usize>,
}

impl Genome {
    pub fn new() -> Self {
        Self {
            chromosomes: Vec::new(),
            total_bases: 0,
            chromosome_map: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.chromosomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chromosomes.is_empty()
    }

    pub fn get_chromosome(&self, index: usize) -> Option<&Chromosome> {
        self.chromosomes.get(index)
    }

    pub fn get_chromosome_by_name(&self, name: &str) -> Option<&Chromosome> {
        self.chromosome_map
            .get(name)
            .and_then(|&index| self.get_chromosome(index))
    }

    pub fn chromosome(&self, name: &str) -> Result<&Chromosome> {
        self.get_chromosome_by_name(name)
            .ok_or_else(|| IdiogramError::unknown_chromosome(name))
    }

    pub fn band(&self, chromosome: &str, band: &str) -> Result<&Band> {
        self.chromosome(chromosome)?
            .band(band)
            .ok_or_else(|| IdiogramError::unknown_band(chromosome, band))
    }

    /// The chromosome owning `band`, following its back-reference.
    pub fn owner(&self, band: &Band) -> Option<&Chromosome> {
        self.get_chromosome(band.chromosome)
    }

    pub fn last_chromosome(&self) -> Option<&Chromosome> {
        self.chromosomes.last()
    }
}

impl Default for Genome {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stain_parsing() {
        assert_eq!(Stain::from("gneg"), Stain::Gneg);
        assert_eq!(Stain::from("gpos75"), Stain::Gpos(75));
        assert_eq!(Stain::from("gpos"), Stain::Gpos(0));
        assert_eq!(Stain::from("acen"), Stain::Acen);
        assert_eq!(Stain::from("gvar"), Stain::Gvar);
        assert_eq!(Stain::from("stalk"), Stain::Stalk);
        assert_eq!(Stain::from("gpos250"), Stain::Other("gpos250".to_string()));
        assert_eq!(Stain::from(""), Stain::Other(String::new()));
    }

    #[test]
    fn test_stain_string_roundtrip() {
        for raw in ["gneg", "gpos", "gpos50", "acen", "gvar", "stalk", "weird"] {
            let back: String = Stain::from(raw).into();
            assert_eq!(back, raw);
        }
    }

    #[test]
    fn test_band_arm() {
        let band = Band {
            name: "p36.33".to_string(),
            stain: Stain::Gneg,
            start: 0,
            end: 100,
            chromosome: 0,
        };
        assert_eq!(band.arm(), Some(Arm::P));
        assert_eq!(band.length(), 100);
        assert!(!band.is_centromeric());
    }

    #[test]
    fn test_arm_bounds_without_centromere() {
        let chromosome = Chromosome {
            index: 0,
            name: "chrY".to_string(),
            bands: Vec::new(),
            absolute_start: 0,
            absolute_end: 500,
            total_bases: 500,
            centromere: None,
        };
        assert_eq!(chromosome.arm_bounds(), vec![(0, 500)]);
    }
}
