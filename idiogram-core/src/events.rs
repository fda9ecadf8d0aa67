//! Pointer event channels and handler bookkeeping

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::engine::Idiogram;
use crate::error::IdiogramError;
use crate::position::Position;
use crate::types::GenomicPos;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventChannel {
    MouseMove,
    MouseDown,
    MouseUp,
    Click,
    DragStart,
    Drag,
    DragEnd,
    ZoomStart,
    Zoom,
    ZoomEnd,
}

impl EventChannel {
    pub const ALL: [EventChannel; 10] = [
        EventChannel::MouseMove,
        EventChannel::MouseDown,
        EventChannel::MouseUp,
        EventChannel::Click,
        EventChannel::DragStart,
        EventChannel::Drag,
        EventChannel::DragEnd,
        EventChannel::ZoomStart,
        EventChannel::Zoom,
        EventChannel::ZoomEnd,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventChannel::MouseMove => "mousemove",
            EventChannel::MouseDown => "mousedown",
            EventChannel::MouseUp => "mouseup",
            EventChannel::Click => "click",
            EventChannel::DragStart => "dragstart",
            EventChannel::Drag => "drag",
            EventChannel::DragEnd => "dragend",
            EventChannel::ZoomStart => "zoomstart",
            EventChannel::Zoom => "zoom",
            EventChannel::ZoomEnd => "zoomend",
        }
    }
}

impl fmt::Display for EventChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventChannel {
    type Err = IdiogramError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventChannel::ALL
            .iter()
            .copied()
            .find(|channel| channel.as_str() == s)
            .ok_or_else(|| IdiogramError::invalid_arguments(format!("unknown event channel `{}`", s)))
    }
}

/// Low-level pointer input, in plot-area pixels (margins already subtracted).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub channel: EventChannel,
    pub x: f64,
    pub y: f64,
    /// New zoom factor, carried by `zoom` events.
    pub scale: Option<f64>,
}

impl PointerEvent {
    pub fn new(channel: EventChannel, x: f64, y: f64) -> Self {
        Self {
            channel,
            x,
            y,
            scale: None,
        }
    }

    pub fn zoom(x: f64, y: f64, scale: f64) -> Self {
        Self {
            channel: EventChannel::Zoom,
            x,
            y,
            scale: Some(scale),
        }
    }
}

/// Callback for one channel. Receives the resolved position, the engine and the raw event.
pub type EventHandler = Box<dyn FnMut(&Position<'_>, &mut Idiogram, &PointerEvent)>;

/// One handler per channel.
///
/// A handler is taken out while it runs so it can borrow the engine mutably;
/// the generation counter stops it from being put back over a replacement it
/// registered (or a removal it made) during its own call.
#[derive(Default)]
pub struct HandlerTable {
    handlers: HashMap<EventChannel, EventHandler>,
    generations: HashMap<EventChannel, u64>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, channel: EventChannel, handler: EventHandler) {
        self.handlers.insert(channel, handler);
        *self.generations.entry(channel).or_insert(0) += 1;
    }

    pub fn remove(&mut self, channel: EventChannel) -> bool {
        *self.generations.entry(channel).or_insert(0) += 1;
        self.handlers.remove(&channel).is_some()
    }

    pub fn contains(&self, channel: EventChannel) -> bool {
        self.handlers.contains_key(&channel)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub(crate) fn take(&mut self, channel: EventChannel) -> Option<(EventHandler, u64)> {
        let handler = self.handlers.remove(&channel)?;
        let generation = self.generations.get(&channel).copied().unwrap_or(0);
        Some((handler, generation))
    }

    pub(crate) fn restore(&mut self, channel: EventChannel, handler: EventHandler, generation: u64) {
        if self.generations.get(&channel).copied().unwrap_or(0) == generation {
            self.handlers.insert(channel, handler);
        }
    }
}

impl fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut channels: Vec<&str> = self.handlers.keys().map(|c| c.as_str()).collect();
        channels.sort_unstable();
        f.debug_struct("HandlerTable").field("channels", &channels).finish()
    }
}

/// Base pair under the pointer at the last drag step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DragState {
    last_bp: Option<GenomicPos>,
}

impl DragState {
    pub fn start(&mut self, bp: GenomicPos) {
        self.last_bp = Some(bp);
    }

    /// Pan delta for a drag step to `bp`, recording `bp` for the next step.
    pub fn step(&mut self, bp: GenomicPos) -> Option<GenomicPos> {
        let last = self.last_bp?;
        self.last_bp = Some(bp);
        Some(bp - last)
    }

    /// Re-read the pointer's base pair after the view moved under it.
    pub fn regrab(&mut self, bp: GenomicPos) {
        if self.last_bp.is_some() {
            self.last_bp = Some(bp);
        }
    }

    pub fn end(&mut self) {
        self.last_bp = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.last_bp.is_some()
    }
}
