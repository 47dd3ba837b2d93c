//! Viewer settings loaded from TOML.
//!
//! Every field has a default so a partial file (or none at all) is valid.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::enums::HeaderScope;
use crate::frame_cache::DEFAULT_CAPACITY;
use crate::intensity::WindowLevel;
use crate::view::ViewLimits;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Maximum number of decoded instances kept in memory.
    pub cache_capacity: usize,
    pub zoom: ZoomConfig,
    pub timing: TimingConfig,
    pub window: WindowConfig,
    pub header: HeaderConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CAPACITY,
            zoom: ZoomConfig::default(),
            timing: TimingConfig::default(),
            window: WindowConfig::default(),
            header: HeaderConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    pub min: f64,
    pub max: f64,
    /// Factor applied per wheel notch.
    pub step: f64,
    pub min_scale: f64,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        let limits = ViewLimits::default();
        Self {
            min: limits.min_zoom,
            max: limits.max_zoom,
            step: limits.zoom_step,
            min_scale: limits.min_scale,
        }
    }
}

/// Intervals in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub pointer_redraw_ms: u64,
    pub settle_ms: u64,
    pub filter_debounce_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            pointer_redraw_ms: 20,
            settle_ms: 100,
            filter_debounce_ms: 150,
        }
    }
}

impl TimingConfig {
    pub fn pointer_redraw(&self) -> Duration {
        Duration::from_millis(self.pointer_redraw_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn filter_debounce(&self) -> Duration {
        Duration::from_millis(self.filter_debounce_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Used when neither metadata nor pixel data yield a window.
    pub fallback_center: f64,
    pub fallback_width: f64,
    /// Window units per pointer pixel while dragging.
    pub drag_sensitivity: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            fallback_center: 40.0,
            fallback_width: 400.0,
            drag_sensitivity: 2.0,
        }
    }
}

impl WindowConfig {
    pub fn fallback(&self) -> WindowLevel {
        WindowLevel::new(self.fallback_center, self.fallback_width)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderConfig {
    pub scope: HeaderScope,
    /// Refresh a frame-scoped header whenever the frame changes.
    pub link_to_frame: bool,
}

impl ViewerConfig {
    /// Read and validate a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or fails validation
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_capacity == 0 {
            return Err(ConfigError::Invalid("cache_capacity must be at least 1".into()));
        }
        let zoom = &self.zoom;
        if !(zoom.min > 0.0 && zoom.min.is_finite() && zoom.max.is_finite()) || zoom.min > zoom.max {
            return Err(ConfigError::Invalid(format!(
                "zoom bounds must satisfy 0 < min <= max, got {} and {}",
                zoom.min, zoom.max
            )));
        }
        if !(zoom.step > 1.0 && zoom.step.is_finite()) {
            return Err(ConfigError::Invalid(format!("zoom step must exceed 1, got {}", zoom.step)));
        }
        if !(zoom.min_scale > 0.0 && zoom.min_scale.is_finite()) {
            return Err(ConfigError::Invalid("min_scale must be positive".into()));
        }
        if !(self.window.fallback_width > 0.0 && self.window.fallback_center.is_finite()) {
            return Err(ConfigError::Invalid("fallback window must have a positive width".into()));
        }
        if !self.window.drag_sensitivity.is_finite() {
            return Err(ConfigError::Invalid("drag_sensitivity must be finite".into()));
        }
        Ok(())
    }

    pub fn view_limits(&self) -> ViewLimits {
        ViewLimits {
            min_zoom: self.zoom.min,
            max_zoom: self.zoom.max,
            zoom_step: self.zoom.step,
            min_scale: self.zoom.min_scale,
        }
    }
}
