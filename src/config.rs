//! Engine tunables
//!
//! Every magic number of the scroll engine lives here so hosts can override
//! them from a TOML file or build the struct directly. Missing fields fall
//! back to the defaults below; the pixel margins are deliberately fixed
//! constants and do not scale with zoom or viewport size.

use std::fs;
use std::path::Path;
use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};

/// Tunable parameters for the scroll engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Vertical gap between page boxes, in pixels
    pub gap: f32,

    /// Extra items rendered beyond the visible boundary on each side
    pub overscan: usize,

    /// Estimated page height used before geometry resolves (and as the
    /// fallback when a geometry batch fails)
    pub default_page_height: f32,

    /// Horizontal padding added around a page's rendered box
    pub extra_page_width: f32,

    /// Trailing debounce window for zoom requests, in milliseconds
    pub zoom_debounce_ms: u64,

    /// Smooth scroll animation duration, in milliseconds
    pub scroll_duration_ms: u64,

    /// Velocity sampling interval, in milliseconds
    pub velocity_interval_ms: u64,

    /// Normalized velocity magnitude above which pages render as placeholders
    pub fast_scroll_velocity: f32,

    /// Pixels subtracted from the start offset when jumping to a highlight
    pub highlight_offset_margin: f32,

    /// Pixels subtracted from the item height when jumping to a highlight
    pub highlight_height_margin: f32,

    /// Capacity of the rendered-page LRU cache
    pub render_cache_capacity: usize,

    /// Fixed initial scale; fit-to-width is used when absent
    pub initial_scale: Option<f32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gap: 4.0,
            overscan: 1,
            default_page_height: 800.0,
            extra_page_width: 5.0,
            zoom_debounce_ms: 100,
            scroll_duration_ms: 400,
            velocity_interval_ms: 50,
            fast_scroll_velocity: 1.0,
            highlight_offset_margin: 5.0,
            highlight_height_margin: 10.0,
            render_cache_capacity: 32,
            initial_scale: None,
        }
    }
}

impl EngineConfig {
    /// Parse a config from TOML; absent fields keep their defaults
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Load a config file, falling back to defaults on any failure
    #[must_use]
    pub fn load_or_default(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    warn!("invalid config {}: {e}, using defaults", path.display());
                    Self::default()
                }
            },
            Err(e) => {
                warn!("cannot read config {}: {e}, using defaults", path.display());
                Self::default()
            }
        }
    }

    #[must_use]
    pub fn zoom_debounce(&self) -> Duration {
        Duration::from_millis(self.zoom_debounce_ms)
    }

    #[must_use]
    pub fn scroll_duration(&self) -> Duration {
        Duration::from_millis(self.scroll_duration_ms)
    }

    #[must_use]
    pub fn velocity_interval(&self) -> Duration {
        Duration::from_millis(self.velocity_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_values() {
        let config = EngineConfig::default();
        assert_eq!(config.gap, 4.0);
        assert_eq!(config.overscan, 1);
        assert_eq!(config.zoom_debounce_ms, 100);
        assert_eq!(config.scroll_duration_ms, 400);
        assert_eq!(config.velocity_interval_ms, 50);
        assert_eq!(config.fast_scroll_velocity, 1.0);
        assert!(config.initial_scale.is_none());
    }

    #[test]
    fn partial_toml_keeps_defaults_for_missing_fields() {
        let config = EngineConfig::from_toml_str("gap = 8.0\noverscan = 3\n").unwrap();
        assert_eq!(config.gap, 8.0);
        assert_eq!(config.overscan, 3);
        assert_eq!(config.default_page_height, 800.0);
        assert_eq!(config.scroll_duration_ms, 400);
    }

    #[test]
    fn initial_scale_round_trips() {
        let config = EngineConfig::from_toml_str("initial_scale = 1.5\n").unwrap();
        assert_eq!(config.initial_scale, Some(1.5));
    }

    #[test]
    fn load_or_default_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "zoom_debounce_ms = 250").unwrap();
        let config = EngineConfig::load_or_default(file.path());
        assert_eq!(config.zoom_debounce_ms, 250);
        assert_eq!(config.overscan, 1);
    }

    #[test]
    fn load_or_default_falls_back_on_missing_file() {
        let config = EngineConfig::load_or_default(Path::new("/nonexistent/vellum.toml"));
        assert_eq!(config, EngineConfig::default());
    }
}
