//! Idiogram Core Library
//!
//! Genome model, coordinate resolution, viewport scale, highlights and event
//! dispatch for interactive chromosome idiograms. Drawing goes through the
//! [`RenderSurface`] trait, so the engine runs with or without a display.

pub mod types;
pub mod error;
pub mod genome;
pub mod position;
pub mod viewport;
pub mod config;
pub mod highlight;
pub mod events;
pub mod render;
pub mod engine;

// Re-export commonly used types and functions
pub use types::{Arm, Band, Chromosome, Genome, GenomicPos, RawBand, Stain};
pub use error::{IdiogramError, Result};
pub use genome::{fingerprint, GenomeBuilder, GenomeCache, GenomeSource};
pub use position::Position;
pub use viewport::Viewport;
pub use config::{IdiogramConfig, Margin};
pub use highlight::{
    Highlight, HighlightHandle, HighlightId, HighlightOptions, HighlightSet, HighlightSpec, Locus,
};
pub use events::{EventChannel, PointerEvent};
pub use render::{
    default_stain_color, HighlightJoin, HighlightRect, IdiogramFrame, RecordingSurface,
    RenderSurface,
};
pub use engine::{Idiogram, ZoomTarget};

/// Version information for the idiogram core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
