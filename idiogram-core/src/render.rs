/*!
# Rendering Surface

The engine never draws. After every geometry-affecting mutation it lays out
pixel geometry and hands it to a [`RenderSurface`]:

- [`IdiogramFrame`]: chromosome offsets, band rectangles, arm clips, centromere markers
- [`HighlightJoin`]: highlight rectangles split into enter / update / exit by identity key
*/

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::config::IdiogramConfig;
use crate::highlight::{HighlightId, HighlightKey, HighlightSet};
use crate::types::*;
use crate::viewport::Viewport;

/// Maps a band to its fill color; `None` leaves the band unfilled.
pub type Stainer = Box<dyn Fn(&Band) -> Option<String>>;

/// Default Giemsa palette.
pub fn default_stain_color(stain: &Stain) -> Option<&'static str> {
    match stain {
        Stain::Gneg => Some("#dfdfdf"),
        Stain::Gpos(_) => Some("#525252"),
        Stain::Acen => None,
        Stain::Gvar | Stain::Stalk => Some("#cfcfcf"),
        Stain::Other(_) => Some("white"),
    }
}

pub fn default_stainer() -> Stainer {
    Box::new(|band: &Band| default_stain_color(&band.stain).map(str::to_string))
}

/// Consumer of layout geometry.
pub trait RenderSurface {
    /// Full redraw of the chromosome layer.
    fn draw_idiogram(&mut self, frame: &IdiogramFrame);

    /// Incremental update of the highlight layer.
    fn draw_highlights(&mut self, join: &HighlightJoin);
}

impl<S: RenderSurface + ?Sized> RenderSurface for Rc<RefCell<S>> {
    fn draw_idiogram(&mut self, frame: &IdiogramFrame) {
        self.borrow_mut().draw_idiogram(frame);
    }

    fn draw_highlights(&mut self, join: &HighlightJoin) {
        self.borrow_mut().draw_highlights(join);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdiogramFrame {
    /// Viewport version this frame was laid out against.
    pub version: u64,
    pub domain: (f64, f64),
    pub chromosomes: Vec<ChromosomeGeometry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChromosomeGeometry {
    pub name: String,
    /// Pixel offset of the chromosome's absolute start.
    pub x: f64,
    pub width: f64,
    /// Band rectangles, x relative to the chromosome offset.
    pub bands: Vec<BandRect>,
    /// One clip per arm; a single clip when the chromosome is acentromeric.
    pub clips: Vec<ClipRect>,
    pub centromere: Option<CentromereMarker>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandRect {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fill: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentromereMarker {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

pub fn layout_idiogram(
    genome: &Genome,
    viewport: &Viewport,
    config: &IdiogramConfig,
    stainer: &dyn Fn(&Band) -> Option<String>,
) -> IdiogramFrame {
    let height = config.idiogram_height;
    let chromosomes = genome
        .chromosomes
        .iter()
        .map(|chromosome| {
            let bands = chromosome
                .bands
                .iter()
                .map(|band| BandRect {
                    name: band.name.clone(),
                    x: viewport.pixel_span(band.start as f64),
                    y: 0.0,
                    width: viewport.pixel_span(band.length() as f64),
                    height,
                    fill: stainer(band),
                })
                .collect();
            let clips = chromosome
                .arm_bounds()
                .into_iter()
                .map(|(start, end)| ClipRect {
                    x: viewport.pixel_span(start as f64),
                    y: 0.0,
                    width: viewport.pixel_span((end - start) as f64),
                    height,
                    radius: config.clip_radius,
                })
                .collect();
            let centromere = chromosome.centromere.map(|offset| CentromereMarker {
                x: viewport.pixel_span(offset as f64),
                y: height / 2.0,
                radius: config.clip_radius,
            });
            ChromosomeGeometry {
                name: chromosome.name.clone(),
                x: viewport.to_pixel(chromosome.absolute_start as f64),
                width: viewport.pixel_span(chromosome.total_bases as f64),
                bands,
                clips,
                centromere,
            }
        })
        .collect();

    IdiogramFrame {
        version: viewport.version(),
        domain: viewport.domain(),
        chromosomes,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightRect {
    pub id: HighlightId,
    pub key: HighlightKey,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: String,
    pub opacity: f64,
}

pub fn layout_highlights(
    highlights: &HighlightSet,
    viewport: &Viewport,
    config: &IdiogramConfig,
) -> Vec<HighlightRect> {
    // centred vertically on the band strip
    let y = -(config.highlight_height / 2.0) + config.idiogram_height / 2.0;
    highlights
        .iter()
        .map(|highlight| HighlightRect {
            id: highlight.id,
            key: highlight.key(),
            x: viewport.to_pixel(highlight.absolute_start as f64),
            y,
            width: viewport.pixel_span(highlight.length() as f64),
            height: config.highlight_height,
            color: highlight.color.clone(),
            opacity: highlight.opacity,
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HighlightJoin {
    /// New this pass.
    pub enter: Vec<HighlightRect>,
    /// Present last pass too; move or restyle in place.
    pub update: Vec<HighlightRect>,
    /// Gone this pass.
    pub exit: Vec<HighlightRect>,
}

impl HighlightJoin {
    pub fn is_empty(&self) -> bool {
        self.enter.is_empty() && self.update.is_empty() && self.exit.is_empty()
    }

    /// Rectangles visible after this join: matched ones first, then new ones.
    pub fn visible(&self) -> impl Iterator<Item = &HighlightRect> {
        self.update.iter().chain(self.enter.iter())
    }
}

/// Remembers the previous highlight pass and keys the next one against it.
///
/// Within one key, rectangles pair up by highlight id first. Whatever is left
/// pairs by occurrence: the n-th leftover in this pass with the n-th leftover
/// from the last pass.
#[derive(Debug, Clone, Default)]
pub struct HighlightLayer {
    previous: Vec<HighlightRect>,
}

impl HighlightLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reconcile(&mut self, current: Vec<HighlightRect>) -> HighlightJoin {
        let mut buckets: HashMap<&HighlightKey, Vec<usize>> = HashMap::new();
        for (index, rect) in self.previous.iter().enumerate() {
            buckets.entry(&rect.key).or_default().push(index);
        }

        let mut matched = vec![false; self.previous.len()];
        let mut paired = vec![false; current.len()];

        for (slot, rect) in current.iter().enumerate() {
            let Some(bucket) = buckets.get(&rect.key) else {
                continue;
            };
            let same_id = bucket
                .iter()
                .copied()
                .find(|&index| !matched[index] && self.previous[index].id == rect.id);
            if let Some(index) = same_id {
                matched[index] = true;
                paired[slot] = true;
            }
        }

        for (slot, rect) in current.iter().enumerate() {
            if paired[slot] {
                continue;
            }
            let Some(bucket) = buckets.get(&rect.key) else {
                continue;
            };
            if let Some(index) = bucket.iter().copied().find(|&index| !matched[index]) {
                matched[index] = true;
                paired[slot] = true;
            }
        }

        let mut join = HighlightJoin::default();
        for (rect, paired) in current.iter().zip(&paired) {
            if *paired {
                join.update.push(rect.clone());
            } else {
                join.enter.push(rect.clone());
            }
        }
        join.exit = self
            .previous
            .iter()
            .zip(matched)
            .filter(|(_, matched)| !matched)
            .map(|(rect, _)| rect.clone())
            .collect();

        self.previous = current;
        join
    }

    pub fn visible(&self) -> &[HighlightRect] {
        &self.previous
    }

    pub fn clear(&mut self) {
        self.previous.clear();
    }
}

/// Surface that keeps everything it is given. Used by tests and the CLI.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    pub frames: Vec<IdiogramFrame>,
    pub joins: Vec<HighlightJoin>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn last_frame(&self) -> Option<&IdiogramFrame> {
        self.frames.last()
    }

    pub fn last_join(&self) -> Option<&HighlightJoin> {
        self.joins.last()
    }
}

impl RenderSurface for RecordingSurface {
    fn draw_idiogram(&mut self, frame: &IdiogramFrame) {
        self.frames.push(frame.clone());
    }

    fn draw_highlights(&mut self, join: &HighlightJoin) {
        self.joins.push(join.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::GenomeBuilder;
    use crate::highlight::{Highlight, HighlightOptions, HighlightSpec};

    fn genome() -> Genome {
        GenomeBuilder::build_from_rows(&[
            RawBand::new("chr1", 0, 450, "p12", "gneg"),
            RawBand::new("chr1", 450, 500, "p11", "acen"),
            RawBand::new("chr1", 500, 1000, "q12", "gpos50"),
            RawBand::new("chr2", 0, 800, "q21", "stalk"),
        ])
        .unwrap()
    }

    fn viewport() -> Viewport {
        let mut viewport = Viewport::default();
        viewport.set_domain(1800, 900.0);
        viewport
    }

    fn rect(id: u64, key: &str) -> HighlightRect {
        HighlightRect {
            id: HighlightId(id),
            key: HighlightKey::new(key),
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
            color: "yellow".to_string(),
            opacity: 0.2,
        }
    }

    #[test]
    fn test_default_palette() {
        assert_eq!(default_stain_color(&Stain::Gneg), Some("#dfdfdf"));
        assert_eq!(default_stain_color(&Stain::Gpos(100)), Some("#525252"));
        assert_eq!(default_stain_color(&Stain::Acen), None);
        assert_eq!(default_stain_color(&Stain::Stalk), Some("#cfcfcf"));
        assert_eq!(default_stain_color(&Stain::Other("x".into())), Some("white"));
    }

    #[test]
    fn test_layout_geometry() {
        let genome = genome();
        let stainer = default_stainer();
        let frame = layout_idiogram(&genome, &viewport(), &IdiogramConfig::default(), &*stainer);

        assert_eq!(frame.chromosomes.len(), 2);
        let chr1 = &frame.chromosomes[0];
        assert_eq!(chr1.x, 0.0);
        assert_eq!(chr1.width, 500.0);
        assert_eq!(chr1.bands[1].x, 225.0);
        assert_eq!(chr1.bands[1].width, 25.0);
        assert_eq!(chr1.bands[1].fill, None);
        assert_eq!(chr1.clips.len(), 2);
        assert_eq!(chr1.clips[1].x, 250.0);
        assert_eq!(chr1.centromere.as_ref().unwrap().x, 250.0);

        let chr2 = &frame.chromosomes[1];
        assert_eq!(chr2.x, 500.0);
        assert_eq!(chr2.clips.len(), 1);
        assert!(chr2.centromere.is_none());
    }

    #[test]
    fn test_highlight_rects_follow_viewport() {
        let genome = genome();
        let mut set = HighlightSet::new();
        let range = HighlightSpec::span("chr2", 0, "chr2", 200).resolve(&genome).unwrap();
        set.push(Highlight::new(HighlightId(1), range, &HighlightOptions::new(), "yellow", 0.2));

        let config = IdiogramConfig::default();
        let rects = layout_highlights(&set, &viewport(), &config);
        assert_eq!(rects[0].x, 500.0);
        assert_eq!(rects[0].width, 100.0);
        assert_eq!(rects[0].y, -7.0);
        assert_eq!(rects[0].height, 21.0);
    }

    #[test]
    fn test_reconcile_enter_update_exit() {
        let mut layer = HighlightLayer::new();
        let first = layer.reconcile(vec![rect(1, "a"), rect(2, "b")]);
        assert_eq!(first.enter.len(), 2);
        assert!(first.update.is_empty() && first.exit.is_empty());

        let second = layer.reconcile(vec![rect(2, "b"), rect(3, "c")]);
        assert_eq!(second.update.len(), 1);
        assert_eq!(second.update[0].key.as_str(), "b");
        assert_eq!(second.enter[0].key.as_str(), "c");
        assert_eq!(second.exit[0].key.as_str(), "a");

        let idempotent = layer.reconcile(layer.visible().to_vec());
        assert!(idempotent.enter.is_empty() && idempotent.exit.is_empty());
        assert_eq!(idempotent.update.len(), 2);
    }

    #[test]
    fn test_reconcile_duplicate_keys() {
        let mut layer = HighlightLayer::new();
        layer.reconcile(vec![rect(1, "a"), rect(2, "a")]);
        let join = layer.reconcile(vec![rect(1, "a")]);
        assert_eq!(join.update.len(), 1);
        assert_eq!(join.exit.len(), 1);
        assert_eq!(join.exit[0].id, HighlightId(2));
    }

    #[test]
    fn test_reconcile_duplicate_keys_pair_by_id() {
        let mut layer = HighlightLayer::new();
        layer.reconcile(vec![rect(1, "a"), rect(2, "a")]);

        let join = layer.reconcile(vec![rect(2, "a")]);
        assert_eq!(join.update.len(), 1);
        assert_eq!(join.update[0].id, HighlightId(2));
        assert_eq!(join.exit.len(), 1);
        assert_eq!(join.exit[0].id, HighlightId(1));

        // Every old entry for the key is claimed, so the new id enters.
        let join = layer.reconcile(vec![rect(3, "a"), rect(2, "a")]);
        assert_eq!(join.update.len(), 1);
        assert_eq!(join.update[0].id, HighlightId(2));
        assert_eq!(join.enter.len(), 1);
        assert_eq!(join.enter[0].id, HighlightId(3));
        assert!(join.exit.is_empty());
    }

    #[test]
    fn test_shared_surface_records() {
        let surface = RecordingSurface::shared();
        let mut handle: Box<dyn RenderSurface> = Box::new(Rc::clone(&surface));
        handle.draw_highlights(&HighlightJoin::default());
        assert_eq!(surface.borrow().joins.len(), 1);
    }
}
