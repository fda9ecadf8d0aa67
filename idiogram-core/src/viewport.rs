/*!
# Viewport Scale

Linear mapping between the plot's pixel range and a base-pair domain.
Zoom narrows or widens the domain around a pivot base pair; pan translates it.
*/

use serde::{Deserialize, Serialize};

use crate::types::GenomicPos;

pub const DEFAULT_MIN_SCALE: f64 = 1.0;
pub const DEFAULT_MAX_SCALE: f64 = 1000.0;

/// Largest pan offset at which every whole base pair is still representable.
const MAX_EXACT_OFFSET: f64 = 9_007_199_254_740_992.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Zoomed window before any pan is applied.
    span: (f64, f64),
    /// Accumulated pan, always a whole number of base pairs.
    offset: f64,
    range: (f64, f64),
    scale: Option<f64>,
    min_scale: f64,
    max_scale: f64,
    /// Bumped on every mutation, so frames can tell which viewport they show.
    version: u64,
}

impl Viewport {
    pub fn new(min_scale: f64, max_scale: f64) -> Self {
        Self {
            span: (0.0, 1.0),
            offset: 0.0,
            range: (0.0, 1.0),
            scale: None,
            min_scale,
            max_scale,
            version: 0,
        }
    }

    /// Domain `[0, total]` over `[0, width]` pixels at scale 1.
    pub fn set_domain(&mut self, total: GenomicPos, width: f64) {
        self.span = (0.0, total as f64);
        self.offset = 0.0;
        self.range = (0.0, width);
        self.scale = Some(1.0);
        self.version += 1;
        log::debug!("Viewport domain set to [0, {}] over {} px", total, width);
    }

    /// Jump straight to `[start, end]`, recording the scale that implies.
    pub fn set_domain_bounds(&mut self, start: f64, end: f64, full_extent: f64) -> bool {
        if !start.is_finite() || !end.is_finite() || end <= start {
            return false;
        }
        self.span = (start, end);
        self.offset = 0.0;
        if full_extent > 0.0 {
            let scale = full_extent / (end - start);
            self.scale = Some(scale.clamp(self.min_scale, self.max_scale));
        }
        self.version += 1;
        true
    }

    /// Zoom to `scale` keeping `pivot_bp` on the same pixel.
    ///
    /// Returns `false` when nothing changed.
    pub fn zoom_to(&mut self, scale: f64, pivot_bp: f64) -> bool {
        if !scale.is_finite() || scale <= 0.0 || !pivot_bp.is_finite() {
            return false;
        }
        let scale = scale.clamp(self.min_scale, self.max_scale);

        let Some(previous) = self.scale else {
            self.scale = Some(scale);
            return false;
        };
        if scale == previous {
            return false;
        }

        let factor = scale / previous;
        let pivot = pivot_bp + self.offset;
        let (start, end) = self.span;
        let new_start = pivot - (pivot - start) / factor;
        let new_end = pivot + (end - pivot) / factor;
        if !new_start.is_finite() || !new_end.is_finite() {
            return false;
        }

        self.span = (new_start, new_end);
        self.scale = Some(scale);
        self.version += 1;
        let (d0, d1) = self.domain();
        log::debug!(
            "Zoomed to {} about {}: domain [{}, {}]",
            scale,
            pivot_bp,
            d0,
            d1
        );
        true
    }

    /// Translate the domain by `-shift_bp`, rounded to a whole base pair.
    /// No clamping to the genome.
    ///
    /// `pan_by(s)` followed by `pan_by(-s)` restores the domain bit for bit.
    pub fn pan_by(&mut self, shift_bp: f64) -> bool {
        let shift = shift_bp.round();
        if !shift.is_finite() || shift == 0.0 {
            return false;
        }
        let offset = self.offset + shift;
        if offset.abs() > MAX_EXACT_OFFSET {
            return false;
        }
        self.offset = offset;
        self.version += 1;
        true
    }

    pub fn to_pixel(&self, bp: f64) -> f64 {
        let (d0, d1) = self.domain();
        let (r0, r1) = self.range;
        r0 + (bp - d0) * (r1 - r0) / (d1 - d0)
    }

    /// Inverse of [`to_pixel`](Self::to_pixel), rounded to a whole base pair.
    pub fn to_bp(&self, pixel: f64) -> GenomicPos {
        let (d0, d1) = self.domain();
        let (r0, r1) = self.range;
        let bp = d0 + (pixel - r0) * (d1 - d0) / (r1 - r0);
        bp.round() as GenomicPos
    }

    /// Pixel width of a span of `length` base pairs.
    pub fn pixel_span(&self, length: f64) -> f64 {
        let (d0, d1) = self.domain();
        let (r0, r1) = self.range;
        length * (r1 - r0) / (d1 - d0)
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.span.0 - self.offset, self.span.1 - self.offset)
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    pub fn scale(&self) -> Option<f64> {
        self.scale
    }

    pub fn scale_extent(&self) -> (f64, f64) {
        (self.min_scale, self.max_scale)
    }

    pub fn center(&self) -> f64 {
        let (d0, d1) = self.domain();
        (d0 + d1) / 2.0
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_SCALE, DEFAULT_MAX_SCALE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered() -> Viewport {
        let mut viewport = Viewport::default();
        viewport.set_domain(1800, 760.0);
        viewport
    }

    #[test]
    fn test_first_zoom_only_records_scale() {
        let mut viewport = Viewport::default();
        assert!(!viewport.zoom_to(4.0, 100.0));
        assert_eq!(viewport.scale(), Some(4.0));
        assert_eq!(viewport.domain(), (0.0, 1.0));
    }

    #[test]
    fn test_zoom_in_then_out_restores_domain() {
        let mut viewport = Viewport::default();
        viewport.set_domain(1000, 500.0);
        assert!(viewport.zoom_to(2.0, 500.0));
        assert_eq!(viewport.domain(), (250.0, 750.0));
        assert!(viewport.zoom_to(1.0, 500.0));
        assert_eq!(viewport.domain(), (0.0, 1000.0));
    }

    #[test]
    fn test_zoom_keeps_pivot_pixel() {
        let mut viewport = rendered();
        let before = viewport.to_pixel(300.0);
        viewport.zoom_to(8.0, 300.0);
        let after = viewport.to_pixel(300.0);
        assert!((before - after).abs() < 1e-9);
    }

    #[test]
    fn test_scale_is_clamped() {
        let mut viewport = rendered();
        viewport.zoom_to(5000.0, 0.0);
        assert_eq!(viewport.scale(), Some(DEFAULT_MAX_SCALE));
        viewport.zoom_to(0.01, 0.0);
        assert_eq!(viewport.scale(), Some(DEFAULT_MIN_SCALE));
    }

    #[test]
    fn test_invalid_zoom_is_noop() {
        let mut viewport = rendered();
        let before = viewport.clone();
        assert!(!viewport.zoom_to(f64::NAN, 10.0));
        assert!(!viewport.zoom_to(2.0, f64::INFINITY));
        assert!(!viewport.zoom_to(-3.0, 10.0));
        assert_eq!(viewport, before);
    }

    #[test]
    fn test_pan_moves_window_left() {
        let mut viewport = rendered();
        assert!(viewport.pan_by(100.0));
        assert_eq!(viewport.domain(), (-100.0, 1700.0));
        assert!(viewport.pan_by(-100.0));
        assert_eq!(viewport.domain(), (0.0, 1800.0));
        assert!(!viewport.pan_by(f64::NAN));
    }

    #[test]
    fn test_pan_round_trip_after_fractional_zoom() {
        let mut viewport = Viewport::default();
        viewport.set_domain(1800, 900.0);
        viewport.zoom_to(3.0, 511.0);
        let zoomed = viewport.domain();
        assert_ne!(zoomed.0.fract(), 0.0);

        for shift in 1..2000 {
            assert!(viewport.pan_by(shift as f64));
            assert!(viewport.pan_by(-(shift as f64)));
            assert_eq!(viewport.domain(), zoomed, "shift {}", shift);
        }
    }

    #[test]
    fn test_pan_rounds_to_whole_base_pairs() {
        let mut viewport = rendered();
        assert!(!viewport.pan_by(0.4));
        assert!(viewport.pan_by(2.6));
        assert_eq!(viewport.domain(), (-3.0, 1797.0));
    }

    #[test]
    fn test_zoom_after_pan_keeps_pivot_pixel() {
        let mut viewport = rendered();
        viewport.pan_by(250.0);
        let before = viewport.to_pixel(400.0);
        assert!(viewport.zoom_to(3.0, 400.0));
        assert!((viewport.to_pixel(400.0) - before).abs() < 1e-9);
    }

    #[test]
    fn test_pixel_mapping() {
        let viewport = rendered();
        assert_eq!(viewport.to_pixel(900.0), 380.0);
        assert_eq!(viewport.to_bp(380.0), 900);
        assert_eq!(viewport.to_bp(-10.0), -24);
        assert!((viewport.pixel_span(1800.0) - 760.0).abs() < 1e-9);
    }

    #[test]
    fn test_version_tracks_mutations() {
        let mut viewport = rendered();
        let version = viewport.version();
        viewport.pan_by(1.0);
        viewport.zoom_to(2.0, 5.0);
        assert_eq!(viewport.version(), version + 2);
    }

    #[test]
    fn test_set_domain_bounds() {
        let mut viewport = rendered();
        assert!(viewport.set_domain_bounds(450.0, 900.0, 1800.0));
        assert_eq!(viewport.scale(), Some(4.0));
        assert!(!viewport.set_domain_bounds(900.0, 900.0, 1800.0));
    }
}
