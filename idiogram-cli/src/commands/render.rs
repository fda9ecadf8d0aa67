//! Render command - lay out an idiogram with highlights and emit its geometry

use anyhow::{Context, Result};
use idiogram_core::{
    EventChannel, HighlightOptions, HighlightRect, HighlightSpec, Idiogram, IdiogramConfig,
    IdiogramFrame, PointerEvent, RecordingSurface, Viewport, ZoomTarget,
};
use serde::Serialize;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use super::write_json;
use crate::error::CliError;
use crate::input::load_rows;

#[derive(Debug, Serialize)]
struct ViewportSummary {
    domain: (f64, f64),
    range: (f64, f64),
    scale: Option<f64>,
    version: u64,
}

impl From<&Viewport> for ViewportSummary {
    fn from(viewport: &Viewport) -> Self {
        Self {
            domain: viewport.domain(),
            range: viewport.range(),
            scale: viewport.scale(),
            version: viewport.version(),
        }
    }
}

#[derive(Debug, Serialize)]
struct RenderOutput {
    viewport: ViewportSummary,
    frame: Option<IdiogramFrame>,
    highlights: Vec<HighlightRect>,
    clicks: Vec<serde_json::Value>,
}

/// View operations applied after the first render, in this order.
#[derive(Debug, Default)]
pub struct ViewArgs {
    pub zoom_range: Option<String>,
    pub zoom: Option<f64>,
    pub pivot: Option<f64>,
    pub pan: Option<f64>,
    pub clicks: Vec<f64>,
}

/// Split a loose argument string ("chr1 100 chr1 200") into a range.
pub fn parse_range(text: &str) -> Result<HighlightSpec, CliError> {
    let args: Vec<&str> = text.split_whitespace().collect();
    HighlightSpec::from_args(&args).map_err(CliError::from)
}

#[allow(clippy::too_many_arguments)]
pub fn execute(
    config: &IdiogramConfig,
    bands: PathBuf,
    highlights: Vec<String>,
    color: Option<String>,
    opacity: Option<f64>,
    view: ViewArgs,
    out: Option<PathBuf>,
) -> Result<()> {
    log::info!("Starting idiogram layout");
    let rows = load_rows(&bands)?;
    let mut idiogram = Idiogram::initialize(rows, config.clone()).map_err(CliError::from)?;

    let surface = RecordingSurface::shared();
    idiogram.attach(Box::new(Rc::clone(&surface)));

    let mut options = HighlightOptions::new();
    if let Some(color) = color {
        options = options.with_color(color);
    }
    if let Some(opacity) = opacity {
        options = options.with_opacity(opacity);
    }
    for text in &highlights {
        let spec = parse_range(text).with_context(|| format!("Invalid highlight '{}'", text))?;
        let handle = idiogram
            .highlight_with(spec, options.clone())
            .map_err(CliError::from)
            .with_context(|| format!("Failed to highlight '{}'", text))?;
        log::debug!("Highlight '{}' has id {:?}", text, handle.id());
    }

    if let Some(text) = &view.zoom_range {
        let spec = parse_range(text).with_context(|| format!("Invalid zoom range '{}'", text))?;
        idiogram
            .zoom_to(ZoomTarget::Range(spec))
            .map_err(CliError::from)?;
    }
    if let Some(scale) = view.zoom {
        let target = match view.pivot {
            Some(pivot) => ZoomTarget::scale_about(scale, pivot),
            None => ZoomTarget::scale(scale),
        };
        idiogram.zoom_to(target).map_err(CliError::from)?;
    }
    if let Some(shift) = view.pan {
        idiogram.pan(shift);
    }

    let clicks = Rc::new(RefCell::new(Vec::new()));
    if !view.clicks.is_empty() {
        let sink = Rc::clone(&clicks);
        idiogram.on(EventChannel::Click, move |position, _, _| {
            match serde_json::to_value(position) {
                Ok(value) => sink.borrow_mut().push(value),
                Err(err) => log::warn!("Could not serialize click position: {}", err),
            }
        });
        for x in &view.clicks {
            idiogram.dispatch(PointerEvent::new(EventChannel::Click, *x, 0.0));
        }
    }

    let recorded = surface.borrow();
    log::info!(
        "Rendered {} frames, {} highlight passes",
        recorded.frames.len(),
        recorded.joins.len()
    );
    let output = RenderOutput {
        viewport: idiogram.viewport().into(),
        frame: recorded.last_frame().cloned(),
        highlights: recorded
            .last_join()
            .map(|join| join.visible().cloned().collect())
            .unwrap_or_default(),
        clicks: clicks.borrow().clone(),
    };
    write_json(&output, out.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range_shapes() {
        assert_eq!(parse_range("chr1").unwrap(), HighlightSpec::chromosome("chr1"));
        assert_eq!(parse_range("chr2 q21").unwrap(), HighlightSpec::band("chr2", "q21"));
        assert_eq!(
            parse_range("  chr1 100   chr1 200 ").unwrap(),
            HighlightSpec::span("chr1", 100, "chr1", 200)
        );
        assert!(matches!(parse_range(""), Err(CliError::Idiogram(_))));
    }

    #[test]
    fn test_render_writes_geometry() {
        let dir = tempfile::tempdir().unwrap();
        let bands = dir.path().join("bands.json");
        std::fs::write(
            &bands,
            r#"[{"chromosome":"chr1","start":0,"end":1000,"name":"p11","stain":"gneg"},
                {"chromosome":"chr2","start":0,"end":800,"name":"q11","stain":"gpos50"}]"#,
        )
        .unwrap();
        let out = dir.path().join("frame.json");
        let config = IdiogramConfig::default().with_width(940.0);
        let view = ViewArgs {
            clicks: vec![600.0],
            ..ViewArgs::default()
        };

        execute(
            &config,
            bands,
            vec!["chr1 100 chr1 200".to_string()],
            Some("red".to_string()),
            None,
            view,
            Some(out.clone()),
        )
        .unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out).unwrap()).unwrap();
        assert_eq!(json["frame"]["chromosomes"].as_array().unwrap().len(), 2);
        assert_eq!(json["highlights"][0]["color"], "red");
        assert_eq!(json["highlights"][0]["x"], 50.0);
        assert_eq!(json["clicks"][0]["chromosome"], "chr2");
        assert_eq!(json["viewport"]["domain"][1], 1800.0);
    }

    #[test]
    fn test_render_reports_panned_domain() {
        let dir = tempfile::tempdir().unwrap();
        let bands = dir.path().join("bands.json");
        std::fs::write(
            &bands,
            r#"[{"chromosome":"chr1","start":0,"end":1000,"name":"p11","stain":"gneg"}]"#,
        )
        .unwrap();
        let out = dir.path().join("frame.json");
        let config = IdiogramConfig::default().with_width(940.0);
        let view = ViewArgs {
            pan: Some(250.0),
            ..ViewArgs::default()
        };

        execute(&config, bands, Vec::new(), None, None, view, Some(out.clone())).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out).unwrap()).unwrap();
        assert_eq!(json["viewport"]["domain"][0], -250.0);
        assert_eq!(json["viewport"]["domain"][1], 750.0);
        assert_eq!(json["viewport"]["scale"], 1.0);
    }
}
