//! Overlay configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an empty
//! file (or no file at all) yields a working menu:
//!
//! ```toml
//! [text]
//! gc_timeout_ms = 1000
//! scale = 1.5
//!
//! [animation.tile_move]
//! duration_ms = 300
//! curve = "cubic-in-out"
//! ```
//!
//! Curve names are kept as strings here; `marquee_animation` parses them.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Root configuration
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MenuConfig {
    pub text: TextConfig,
    pub animation: AnimationConfig,
    pub layout: LayoutConfig,
    pub console: ConsoleConfig,
}

impl MenuConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!("Loaded menu config from {}", path.display());
        Ok(config)
    }
}

/// Text cache settings
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TextConfig {
    /// Idle time after which cached textures and layouts are evicted
    pub gc_timeout_ms: u64,
    /// Pixels per device-independent unit
    pub scale: f32,
    /// Drop shadow offset in pixels
    pub shadow_offset: u32,
    /// Outline radius in pixels
    pub outline_radius: u32,
    /// Text color, `0xRRGGBBAA`
    pub fill_color: u32,
    /// Shadow and outline color, `0xRRGGBBAA`
    pub effect_color: u32,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            gc_timeout_ms: 1000,
            scale: 1.0,
            shadow_offset: 2,
            outline_radius: 2,
            fill_color: 0xFFFFFFFF,
            effect_color: 0x000000C0,
        }
    }
}

/// Timing of one animated transition
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TransitionConfig {
    pub duration_ms: u64,
    pub delay_ms: u64,
    /// Easing curve name, e.g. `"cubic-in-out"`
    pub curve: String,
}

impl TransitionConfig {
    pub fn new(duration_ms: u64, delay_ms: u64, curve: &str) -> Self {
        Self {
            duration_ms,
            delay_ms,
            curve: curve.to_string(),
        }
    }
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self::new(300, 0, "cubic-in-out")
    }
}

/// Per-transition animation timings
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub tile_move: TransitionConfig,
    pub tile_zoom: TransitionConfig,
    pub tile_size: TransitionConfig,
    pub tile_fade: TransitionConfig,
    pub bounce: TransitionConfig,
    pub background_fade: TransitionConfig,
    pub hud_fade: TransitionConfig,
    pub progress: TransitionConfig,
    pub highlight: TransitionConfig,
    pub modal: TransitionConfig,
    pub subtitle_fade: TransitionConfig,
    /// One loader revolution
    pub loader_period_ms: u64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            tile_move: TransitionConfig::new(350, 0, "cubic-in-out"),
            tile_zoom: TransitionConfig::new(250, 50, "quad-out"),
            tile_size: TransitionConfig::new(350, 0, "cubic-in-out"),
            tile_fade: TransitionConfig::new(200, 0, "linear"),
            bounce: TransitionConfig::new(400, 0, "bounce-right"),
            background_fade: TransitionConfig::new(600, 0, "quad-in-out"),
            hud_fade: TransitionConfig::new(250, 0, "quad-out"),
            progress: TransitionConfig::new(500, 0, "linear"),
            highlight: TransitionConfig::new(200, 0, "cubic-out"),
            modal: TransitionConfig::new(300, 0, "quint-out"),
            subtitle_fade: TransitionConfig::new(150, 0, "linear"),
            loader_period_ms: 1200,
        }
    }
}

/// Screen layout
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub tile_width: f32,
    pub tile_height: f32,
    pub tile_gap: f32,
    pub columns: usize,
    /// Zoom applied to the selected tile
    pub selected_zoom: f32,
    pub label_height: f32,
    pub body_text_height: f32,
    pub title_text_height: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            viewport_width: 1920.0,
            viewport_height: 1080.0,
            tile_width: 320.0,
            tile_height: 180.0,
            tile_gap: 40.0,
            columns: 5,
            selected_zoom: 1.15,
            label_height: 28.0,
            body_text_height: 32.0,
            title_text_height: 44.0,
        }
    }
}

/// Log console settings
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub capacity: usize,
    pub visible_lines: usize,
    pub text_height: f32,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            capacity: 256,
            visible_lines: 12,
            text_height: 20.0,
        }
    }
}
