//! Panel configuration
//!
//! Geometry and timing knobs. Every field has a default, so a host can pass
//! `PanelConfig::default()` or a partial TOML document.

use serde::{Deserialize, Serialize};

use crate::interface::PanelError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, uniffi::Record)]
#[serde(default)]
pub struct PanelConfig {
    pub window_width: u32,
    pub item_width: u32,
    pub item_height: u32,
    /// Vertical gap between rows
    pub item_spacing: u32,
    /// Horizontal inset of a row inside the window
    pub item_margin: u32,
    pub viewport_height: u32,
    /// Box image thumbnails are scaled to fit
    pub pixmap_width: u32,
    pub pixmap_height: u32,
    pub file_icon_size: u32,
    pub corner_radius: u32,
    /// Row shift and close fade duration
    pub animation_ms: u64,
    /// Extra delay before the view settles after a removal
    pub settle_slack_ms: u64,
    /// Time label refresh tick
    pub refresh_interval_ms: u64,
    /// Clipboard service readiness polling
    pub poll_interval_ms: u64,
    pub hover_alpha: u8,
    pub idle_alpha: u8,
    /// Caption width budget, in characters
    pub caption_chars: u32,
    /// Text preview length, in characters
    pub preview_chars: u32,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            window_width: 300,
            item_width: 280,
            item_height: 200,
            item_spacing: 10,
            item_margin: 10,
            viewport_height: 640,
            pixmap_width: 180,
            pixmap_height: 100,
            file_icon_size: 100,
            corner_radius: 8,
            animation_ms: 300,
            settle_slack_ms: 10,
            refresh_interval_ms: 60_000,
            poll_interval_ms: 1_000,
            hover_alpha: 160,
            idle_alpha: 80,
            caption_chars: 40,
            preview_chars: 200,
        }
    }
}

impl PanelConfig {
    /// Distance between the top edges of two consecutive rows
    pub fn row_pitch(&self) -> f64 {
        f64::from(self.item_height + self.item_spacing)
    }

    pub fn validate(&self) -> Result<(), PanelError> {
        let invalid = |msg: &str| Err(PanelError::InvalidConfig(msg.to_string()));

        if self.item_height == 0 || self.item_width == 0 {
            return invalid("item dimensions must be non-zero");
        }
        if self.item_width + 2 * self.item_margin > self.window_width {
            return invalid("item_width plus margins exceeds window_width");
        }
        if self.pixmap_width == 0 || self.pixmap_height == 0 || self.file_icon_size == 0 {
            return invalid("thumbnail dimensions must be non-zero");
        }
        if 2 * self.corner_radius > self.pixmap_width.min(self.pixmap_height) {
            return invalid("corner_radius too large for the pixmap box");
        }
        if self.animation_ms == 0 {
            return invalid("animation_ms must be non-zero");
        }
        if self.refresh_interval_ms == 0 || self.poll_interval_ms == 0 {
            return invalid("intervals must be non-zero");
        }
        if self.caption_chars < 4 {
            return invalid("caption_chars must leave room for an ellipsis");
        }
        Ok(())
    }

    /// Parse a (possibly partial) TOML document; missing keys take defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, PanelError> {
        let config: PanelConfig =
            toml::from_str(source).map_err(|e| PanelError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

#[uniffi::export]
pub fn default_panel_config() -> PanelConfig {
    PanelConfig::default()
}

#[uniffi::export]
pub fn panel_config_from_toml(source: String) -> Result<PanelConfig, PanelError> {
    PanelConfig::from_toml_str(&source)
}
