/*!
# Idiogram Engine

One [`Idiogram`] owns a genome, a viewport, a highlight collection and a
handler table. Nothing is shared between instances except the read-only
genome (through `Arc`).

Highlights and handlers registered before the first [`attach`](Idiogram::attach)
are queued and replayed in registration order when the surface is attached.
*/

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::config::IdiogramConfig;
use crate::error::{IdiogramError, Result};
use crate::events::{DragState, EventChannel, EventHandler, HandlerTable, PointerEvent};
use crate::genome::{GenomeBuilder, GenomeSource};
use crate::highlight::{
    Highlight, HighlightHandle, HighlightId, HighlightOptions, HighlightSet, HighlightSpec,
};
use crate::position::Position;
use crate::render::{
    default_stainer, layout_highlights, layout_idiogram, HighlightLayer, RenderSurface, Stainer,
};
use crate::types::*;
use crate::viewport::Viewport;

/// What an [`Idiogram::zoom_to`] call zooms to.
#[derive(Debug, Clone, PartialEq)]
pub enum ZoomTarget {
    /// Zoom factor about a pivot base pair; the viewport centre when `None`.
    Scale { scale: f64, pivot: Option<f64> },
    /// Fit a genomic range to the plot width.
    Range(HighlightSpec),
}

impl ZoomTarget {
    pub fn scale(scale: f64) -> Self {
        ZoomTarget::Scale { scale, pivot: None }
    }

    pub fn scale_about(scale: f64, pivot: f64) -> Self {
        ZoomTarget::Scale {
            scale,
            pivot: Some(pivot),
        }
    }
}

enum Command {
    Highlight {
        id: HighlightId,
        spec: HighlightSpec,
        options: HighlightOptions,
    },
    On {
        channel: EventChannel,
        handler: EventHandler,
    },
}

pub struct Idiogram {
    genome: Arc<Genome>,
    config: IdiogramConfig,
    viewport: Viewport,
    highlights: HighlightSet,
    layer: HighlightLayer,
    handlers: HandlerTable,
    deferred: VecDeque<Command>,
    surface: Option<Box<dyn RenderSurface>>,
    stainer: Stainer,
    redraw_hook: Option<Box<dyn FnMut(&Viewport)>>,
    drag: DragState,
    next_highlight: u64,
}

impl Idiogram {
    /// Build (or reuse) the genome and set up an undrawn engine.
    pub fn initialize(source: impl Into<GenomeSource>, config: IdiogramConfig) -> Result<Self> {
        config.validate()?;
        let genome = GenomeBuilder::build(source)?;
        let viewport = Viewport::new(config.min_scale, config.max_scale);
        Ok(Self {
            genome,
            config,
            viewport,
            highlights: HighlightSet::new(),
            layer: HighlightLayer::new(),
            handlers: HandlerTable::new(),
            deferred: VecDeque::new(),
            surface: None,
            stainer: default_stainer(),
            redraw_hook: None,
            drag: DragState::default(),
            next_highlight: 0,
        })
    }

    /// First render: fit the genome to the plot width, replay queued calls, draw.
    ///
    /// Attaching again swaps the surface and resets the view.
    pub fn attach(&mut self, surface: Box<dyn RenderSurface>) {
        self.viewport
            .set_domain(self.genome.total_bases, self.config.plot_width());
        self.layer.clear();
        self.drag.end();
        self.surface = Some(surface);
        self.flush_deferred();
        self.redraw();
        log::info!(
            "Idiogram drawn: {} chromosomes, {} highlights, {} handlers",
            self.genome.len(),
            self.highlights.len(),
            self.handlers.len()
        );
    }

    pub fn is_drawn(&self) -> bool {
        self.surface.is_some()
    }

    fn flush_deferred(&mut self) {
        if self.deferred.is_empty() {
            return;
        }
        log::debug!("Replaying {} deferred calls", self.deferred.len());
        while let Some(command) = self.deferred.pop_front() {
            match command {
                Command::Highlight { id, spec, options } => {
                    if let Err(err) = self.insert_highlight(id, &spec, &options) {
                        log::warn!("Dropping deferred highlight {:?}: {}", spec, err);
                    }
                }
                Command::On { channel, handler } => self.handlers.insert(channel, handler),
            }
        }
    }

    // Accessors

    pub fn genome(&self) -> &Arc<Genome> {
        &self.genome
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn config(&self) -> &IdiogramConfig {
        &self.config
    }

    pub fn chromosome(&self, name: &str) -> Result<&Chromosome> {
        self.genome.chromosome(name)
    }

    pub fn band(&self, chromosome: &str, band: &str) -> Result<&Band> {
        self.genome.band(chromosome, band)
    }

    pub fn set_stainer<F>(&mut self, stainer: F)
    where
        F: Fn(&Band) -> Option<String> + 'static,
    {
        self.stainer = Box::new(stainer);
        if self.is_drawn() {
            self.redraw();
        }
    }

    /// Extra work to run after every redraw.
    pub fn on_redraw<F>(&mut self, hook: F)
    where
        F: FnMut(&Viewport) + 'static,
    {
        self.redraw_hook = Some(Box::new(hook));
    }

    // Positions

    pub fn position_at(&self, absolute_bp: GenomicPos) -> Position<'_> {
        self.genome.resolve(absolute_bp)
    }

    pub fn position_at_relative(
        &self,
        chromosome: &str,
        relative_bp: Option<GenomicPos>,
    ) -> Result<Position<'_>> {
        self.genome.resolve_relative(chromosome, relative_bp)
    }

    // Viewport

    pub fn zoom_to(&mut self, target: ZoomTarget) -> Result<()> {
        let changed = match target {
            ZoomTarget::Scale { scale, pivot } => {
                let pivot = pivot.unwrap_or_else(|| self.viewport.center());
                self.viewport.zoom_to(scale, pivot)
            }
            ZoomTarget::Range(spec) => {
                let range = spec.resolve(&self.genome)?;
                self.viewport.set_domain_bounds(
                    range.start.absolute as f64,
                    range.end.absolute as f64,
                    self.genome.total_bases as f64,
                )
            }
        };
        if changed && self.is_drawn() {
            self.redraw();
        }
        Ok(())
    }

    /// Shift the view by `shift_bp`; positive shifts move the window left.
    pub fn pan(&mut self, shift_bp: f64) {
        if self.viewport.pan_by(shift_bp) && self.is_drawn() {
            self.redraw();
        }
    }

    // Highlights

    pub fn highlight(&mut self, spec: HighlightSpec) -> Result<HighlightHandle> {
        self.highlight_with(spec, HighlightOptions::default())
    }

    /// Add a highlight. Before the first render the call is queued and
    /// validated on replay; afterwards it is validated and drawn immediately.
    pub fn highlight_with(
        &mut self,
        spec: HighlightSpec,
        options: HighlightOptions,
    ) -> Result<HighlightHandle> {
        if let Some(opacity) = options.opacity {
            if !(0.0..=1.0).contains(&opacity) {
                return Err(IdiogramError::invalid_arguments(format!(
                    "opacity must be within [0, 1], got {}",
                    opacity
                )));
            }
        }

        if !self.is_drawn() {
            let id = self.allocate_id();
            self.deferred.push_back(Command::Highlight { id, spec, options });
            return Ok(HighlightHandle::new(id));
        }

        let range = spec.resolve(&self.genome)?;
        let id = self.allocate_id();
        let highlight = Highlight::new(
            id,
            range,
            &options,
            &self.config.highlight_color,
            self.config.highlight_opacity,
        );
        log::debug!("Highlight {} added", highlight.key());
        self.highlights.push(highlight);
        if options.full_redraw {
            self.redraw();
        } else {
            self.render_highlights();
        }
        Ok(HighlightHandle::new(id))
    }

    fn allocate_id(&mut self) -> HighlightId {
        self.next_highlight += 1;
        HighlightId(self.next_highlight)
    }

    fn insert_highlight(
        &mut self,
        id: HighlightId,
        spec: &HighlightSpec,
        options: &HighlightOptions,
    ) -> Result<()> {
        let range = spec.resolve(&self.genome)?;
        self.highlights.push(Highlight::new(
            id,
            range,
            options,
            &self.config.highlight_color,
            self.config.highlight_opacity,
        ));
        Ok(())
    }

    pub fn highlights(&self) -> &HighlightSet {
        &self.highlights
    }

    pub fn get_highlight(&self, handle: &HighlightHandle) -> Option<&Highlight> {
        self.highlights.get(handle.id())
    }

    /// Drop one highlight, applied or still queued. `false` if already gone.
    pub(crate) fn remove_highlight(&mut self, id: HighlightId) -> bool {
        let removed = self.unlink_highlight(id);
        if removed && self.is_drawn() {
            self.render_highlights();
        }
        removed
    }

    fn unlink_highlight(&mut self, id: HighlightId) -> bool {
        if let Some(highlight) = self.highlights.remove(id) {
            log::debug!("Highlight {} removed", highlight.key());
            return true;
        }
        let queued = self.deferred.len();
        self.deferred.retain(|command| {
            !matches!(command, Command::Highlight { id: queued_id, .. } if *queued_id == id)
        });
        self.deferred.len() != queued
    }

    /// Remove every outstanding highlight once. Returns how many were removed.
    pub fn remove_all_highlights(&mut self) -> usize {
        let mut ids = self.highlights.ids();
        ids.extend(self.deferred.iter().filter_map(|command| match command {
            Command::Highlight { id, .. } => Some(*id),
            Command::On { .. } => None,
        }));
        let removed = ids
            .into_iter()
            .filter(|id| self.unlink_highlight(*id))
            .count();
        if removed > 0 && self.is_drawn() {
            self.render_highlights();
        }
        removed
    }

    // Events

    /// Register `handler` for `channel`, replacing any previous one.
    pub fn on<F>(&mut self, channel: EventChannel, handler: F)
    where
        F: FnMut(&Position<'_>, &mut Idiogram, &PointerEvent) + 'static,
    {
        let handler: EventHandler = Box::new(handler);
        if self.is_drawn() {
            self.handlers.insert(channel, handler);
        } else {
            self.deferred.push_back(Command::On { channel, handler });
        }
    }

    pub fn off(&mut self, channel: EventChannel) -> bool {
        let queued = self.deferred.len();
        self.deferred
            .retain(|command| !matches!(command, Command::On { channel: c, .. } if *c == channel));
        let removed = self.handlers.remove(channel);
        removed || self.deferred.len() != queued
    }

    /// Feed one pointer event through the viewport and on to its handler.
    pub fn dispatch(&mut self, event: PointerEvent) {
        if !self.is_drawn() {
            log::debug!("Ignoring {} before first render", event.channel);
            return;
        }

        let bp = self.viewport.to_bp(event.x);
        let genome = Arc::clone(&self.genome);
        let position = genome.resolve(bp);

        match event.channel {
            EventChannel::DragStart => self.drag.start(bp),
            EventChannel::Drag => {
                if let Some(delta) = self.drag.step(bp) {
                    self.pan(delta as f64);
                    self.drag.regrab(self.viewport.to_bp(event.x));
                }
            }
            EventChannel::DragEnd => self.drag.end(),
            EventChannel::Zoom => match event.scale {
                Some(scale) if position.is_within_genome() => {
                    if self.viewport.zoom_to(scale, bp as f64) {
                        self.redraw();
                    }
                }
                Some(_) => log::debug!("Zoom pivot {} is outside the genome, ignoring", bp),
                None => {}
            },
            _ => {}
        }

        if let Some((mut handler, generation)) = self.handlers.take(event.channel) {
            handler(&position, self, &event);
            self.handlers.restore(event.channel, handler, generation);
        }
    }

    // Drawing

    /// Recompute all geometry and push it to the surface.
    pub fn redraw(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        let frame = layout_idiogram(&self.genome, &self.viewport, &self.config, &*self.stainer);
        surface.draw_idiogram(&frame);
        self.render_highlights();
        if let Some(hook) = self.redraw_hook.as_mut() {
            hook(&self.viewport);
        }
    }

    fn render_highlights(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        let rects = layout_highlights(&self.highlights, &self.viewport, &self.config);
        let join = self.layer.reconcile(rects);
        surface.draw_highlights(&join);
    }
}

impl fmt::Debug for Idiogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Idiogram")
            .field("chromosomes", &self.genome.len())
            .field("total_bases", &self.genome.total_bases)
            .field("viewport", &self.viewport)
            .field("highlights", &self.highlights.len())
            .field("handlers", &self.handlers)
            .field("deferred", &self.deferred.len())
            .field("drawn", &self.is_drawn())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingSurface;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn rows() -> Vec<RawBand> {
        vec![
            RawBand::new("chr1", 0, 450, "p12", "gneg"),
            RawBand::new("chr1", 450, 500, "p11", "acen"),
            RawBand::new("chr1", 500, 1000, "q12", "gpos50"),
            RawBand::new("chr2", 0, 800, "q21", "gneg"),
        ]
    }

    fn config() -> IdiogramConfig {
        IdiogramConfig::default().with_width(940.0)
    }

    fn drawn() -> (Idiogram, Rc<RefCell<RecordingSurface>>) {
        let mut idiogram = Idiogram::initialize(rows(), config()).unwrap();
        let surface = RecordingSurface::shared();
        idiogram.attach(Box::new(Rc::clone(&surface)));
        (idiogram, surface)
    }

    #[test]
    fn test_attach_sets_domain_and_draws() {
        let (idiogram, surface) = drawn();
        assert_eq!(idiogram.viewport().domain(), (0.0, 1800.0));
        assert_eq!(idiogram.viewport().range(), (0.0, 900.0));
        assert_eq!(idiogram.viewport().scale(), Some(1.0));
        assert_eq!(surface.borrow().frames.len(), 1);
        assert_eq!(surface.borrow().joins.len(), 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let narrow = IdiogramConfig::default().with_width(10.0);
        assert!(matches!(
            Idiogram::initialize(rows(), narrow),
            Err(IdiogramError::Config { .. })
        ));
    }

    #[test]
    fn test_highlight_after_render_only_touches_highlight_layer() {
        let (mut idiogram, surface) = drawn();
        let handle = idiogram
            .highlight(HighlightSpec::span("chr1", 100, "chr1", 200))
            .unwrap();
        assert_eq!(surface.borrow().frames.len(), 1);
        assert_eq!(surface.borrow().joins.len(), 2);

        let highlight = idiogram.get_highlight(&handle).unwrap();
        assert_eq!((highlight.absolute_start, highlight.absolute_end), (100, 200));
        assert_eq!(highlight.color, "yellow");
        assert_eq!(highlight.opacity, 0.2);
    }

    #[test]
    fn test_full_redraw_flag() {
        let (mut idiogram, surface) = drawn();
        let _handle = idiogram
            .highlight_with(
                HighlightSpec::chromosome("chr2"),
                HighlightOptions::new().with_full_redraw(),
            )
            .unwrap();
        assert_eq!(surface.borrow().frames.len(), 2);
    }

    #[test]
    fn test_failed_highlight_leaves_state_untouched() {
        let (mut idiogram, surface) = drawn();
        let result = idiogram.highlight(HighlightSpec::band("chr1", "q99"));
        assert!(matches!(result, Err(IdiogramError::UnknownBand { .. })));
        assert!(idiogram.highlights().is_empty());
        assert_eq!(surface.borrow().joins.len(), 1);

        let result = idiogram.highlight_with(
            HighlightSpec::chromosome("chr1"),
            HighlightOptions::new().with_opacity(3.0),
        );
        assert!(matches!(result, Err(IdiogramError::InvalidArguments { .. })));
        assert!(idiogram.highlights().is_empty());
    }

    #[test]
    fn test_remove_then_remove_all() {
        let (mut idiogram, _surface) = drawn();
        let first = idiogram.highlight(HighlightSpec::chromosome("chr1")).unwrap();
        let _second = idiogram.highlight(HighlightSpec::chromosome("chr2")).unwrap();
        let third = idiogram.highlight(HighlightSpec::absolute(10, 20)).unwrap();

        assert!(first.remove(&mut idiogram));
        assert_eq!(idiogram.highlights().len(), 2);
        assert_eq!(idiogram.remove_all_highlights(), 2);
        assert!(idiogram.highlights().is_empty());
        assert!(!third.remove(&mut idiogram));
    }

    #[test]
    fn test_deferred_highlights_replay_in_order() {
        let mut idiogram = Idiogram::initialize(rows(), config()).unwrap();
        let _a = idiogram.highlight(HighlightSpec::chromosome("chr2")).unwrap();
        let bad = idiogram.highlight(HighlightSpec::chromosome("chr9")).unwrap();
        let _c = idiogram.highlight(HighlightSpec::absolute(5, 50)).unwrap();
        assert!(idiogram.highlights().is_empty());

        idiogram.attach(Box::new(RecordingSurface::new()));
        let starts: Vec<GenomicPos> = idiogram.highlights().iter().map(|h| h.absolute_start).collect();
        assert_eq!(starts, vec![1000, 5]);
        assert!(!bad.remove(&mut idiogram));
    }

    #[test]
    fn test_removing_queued_highlight_cancels_it() {
        let mut idiogram = Idiogram::initialize(rows(), config()).unwrap();
        let handle = idiogram.highlight(HighlightSpec::chromosome("chr1")).unwrap();
        assert!(handle.remove(&mut idiogram));
        idiogram.attach(Box::new(RecordingSurface::new()));
        assert!(idiogram.highlights().is_empty());
    }

    #[test]
    fn test_zoom_to_range() {
        let (mut idiogram, surface) = drawn();
        idiogram
            .zoom_to(ZoomTarget::Range(HighlightSpec::chromosome("chr2")))
            .unwrap();
        assert_eq!(idiogram.viewport().domain(), (1000.0, 1800.0));
        assert_eq!(idiogram.viewport().scale(), Some(2.25));
        assert_eq!(surface.borrow().frames.len(), 2);

        let err = idiogram.zoom_to(ZoomTarget::Range(HighlightSpec::chromosome("chrQ")));
        assert!(err.is_err());
        assert_eq!(idiogram.viewport().domain(), (1000.0, 1800.0));
    }

    #[test]
    fn test_zoom_and_pan_redraw() {
        let (mut idiogram, surface) = drawn();
        idiogram.zoom_to(ZoomTarget::scale_about(2.0, 900.0)).unwrap();
        assert_eq!(idiogram.viewport().domain(), (450.0, 1350.0));
        idiogram.pan(50.0);
        assert_eq!(idiogram.viewport().domain(), (400.0, 1300.0));
        assert_eq!(surface.borrow().frames.len(), 3);
    }

    #[test]
    fn test_redraw_hook_runs() {
        let (mut idiogram, _surface) = drawn();
        let calls = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&calls);
        idiogram.on_redraw(move |_| *counter.borrow_mut() += 1);
        idiogram.redraw();
        idiogram.pan(10.0);
        assert_eq!(*calls.borrow(), 2);
    }

    #[test]
    fn test_custom_stainer() {
        let (mut idiogram, surface) = drawn();
        idiogram.set_stainer(|_| Some("black".to_string()));
        let recorded = surface.borrow();
        let frame = recorded.last_frame().unwrap();
        assert!(frame.chromosomes[0].bands.iter().all(|b| b.fill.as_deref() == Some("black")));
    }
}
