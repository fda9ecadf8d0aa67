//! Configuration for idiogram layout and interaction
//!
//! Every option has a default; a TOML file only needs to name the options it overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{IdiogramError, Result};
use crate::viewport::{DEFAULT_MAX_SCALE, DEFAULT_MIN_SCALE};

/// Config file picked up from the working directory when none is named.
pub const DEFAULT_CONFIG_FILE: &str = "idiogram.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdiogramConfig {
    /// Total drawing width in pixels, margins included
    #[serde(default = "default_width")]
    pub width: f64,

    /// Total drawing height in pixels, margins included
    #[serde(default = "default_height")]
    pub height: f64,

    /// Height of the band rectangles
    #[serde(default = "default_idiogram_height")]
    pub idiogram_height: f64,

    /// Corner radius of arm clips and radius of centromere markers
    #[serde(default = "default_clip_radius")]
    pub clip_radius: f64,

    /// Height of highlight rectangles
    #[serde(default = "default_highlight_height")]
    pub highlight_height: f64,

    #[serde(default = "default_highlight_color")]
    pub highlight_color: String,

    #[serde(default = "default_highlight_opacity")]
    pub highlight_opacity: f64,

    #[serde(default = "default_min_scale")]
    pub min_scale: f64,

    #[serde(default = "default_max_scale")]
    pub max_scale: f64,

    #[serde(default)]
    pub margin: Margin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Margin {
    #[serde(default = "default_margin_top")]
    pub top: f64,
    #[serde(default = "default_margin_bottom")]
    pub bottom: f64,
    #[serde(default = "default_margin_side")]
    pub left: f64,
    #[serde(default = "default_margin_side")]
    pub right: f64,
}

// Default value functions
fn default_width() -> f64 { 800.0 }
fn default_height() -> f64 { 100.0 }
fn default_margin_top() -> f64 { 50.0 }
fn default_margin_bottom() -> f64 { 20.0 }
fn default_margin_side() -> f64 { 20.0 }
fn default_idiogram_height() -> f64 { 7.0 }
fn default_clip_radius() -> f64 { 7.0 }
fn default_highlight_height() -> f64 { 21.0 }
fn default_highlight_color() -> String { "yellow".to_string() }
fn default_highlight_opacity() -> f64 { 0.2 }
fn default_min_scale() -> f64 { DEFAULT_MIN_SCALE }
fn default_max_scale() -> f64 { DEFAULT_MAX_SCALE }

impl Default for Margin {
    fn default() -> Self {
        Self {
            top: default_margin_top(),
            bottom: default_margin_bottom(),
            left: default_margin_side(),
            right: default_margin_side(),
        }
    }
}

impl Default for IdiogramConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            idiogram_height: default_idiogram_height(),
            clip_radius: default_clip_radius(),
            highlight_height: default_highlight_height(),
            highlight_color: default_highlight_color(),
            highlight_opacity: default_highlight_opacity(),
            min_scale: default_min_scale(),
            max_scale: default_max_scale(),
            margin: Margin::default(),
        }
    }
}

impl IdiogramConfig {
    /// Width of the plot area, which is the viewport's pixel range.
    pub fn plot_width(&self) -> f64 {
        self.width - self.margin.left - self.margin.right
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    pub fn with_height(mut self, height: f64) -> Self {
        self.height = height;
        self
    }

    pub fn with_margin(mut self, margin: Margin) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_scale_extent(mut self, min_scale: f64, max_scale: f64) -> Self {
        self.min_scale = min_scale;
        self.max_scale = max_scale;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.plot_width() > 0.0) {
            return Err(IdiogramError::config(format!(
                "plot width must be positive, got {} (width {} minus margins)",
                self.plot_width(),
                self.width
            )));
        }
        if !(self.min_scale > 0.0) || !(self.max_scale >= self.min_scale) {
            return Err(IdiogramError::config(format!(
                "invalid zoom scale extent [{}, {}]",
                self.min_scale, self.max_scale
            )));
        }
        if !(0.0..=1.0).contains(&self.highlight_opacity) {
            return Err(IdiogramError::config(format!(
                "highlight opacity must be within [0, 1], got {}",
                self.highlight_opacity
            )));
        }
        Ok(())
    }

    /// Load configuration from file or use defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                Self::load_from_file(path)?
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    log::info!("Loading configuration from: {}", DEFAULT_CONFIG_FILE);
                    Self::load_from_file(&default_path)?
                } else {
                    log::info!("Using default configuration");
                    Self::default()
                }
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|err| {
            IdiogramError::io(format!(
                "Failed to read configuration file {}: {}",
                path.display(),
                err
            ))
        })?;
        let config: IdiogramConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Generate example configuration file content
    pub fn example_toml() -> Result<String> {
        Ok(toml::to_string_pretty(&Self::default())?)
    }
}
