//! Trigger mode and detection thresholds.
//!
//! A [`DetectionConfig`] is built once when a detection session starts and
//! is read-only afterwards. Thresholds are validated on construction, so a
//! config that exists is always usable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PeekError, Result};

/// Default long-press delay in milliseconds.
pub const DEFAULT_LONG_PRESS_DELAY_MS: u32 = 800;

/// Default drag distance in CSS pixels.
pub const DEFAULT_DRAG_THRESHOLD_PX: f64 = 10.0;

// ---------------------------------------------------------------------------
// TriggerMode
// ---------------------------------------------------------------------------

/// The gesture protocol that opens a preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerMode {
    /// Press on a link and drag it past the distance threshold.
    #[serde(rename = "drag")]
    Drag,
    /// Press on a link and hold it past the delay.
    #[serde(rename = "long-press")]
    LongPress,
    /// Click a link while holding Alt.
    #[serde(rename = "alt-click")]
    AltClick,
}

impl TriggerMode {
    pub const ALL: [TriggerMode; 3] = [Self::Drag, Self::LongPress, Self::AltClick];

    /// The stored string form (`drag`, `long-press`, `alt-click`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Drag => "drag",
            Self::LongPress => "long-press",
            Self::AltClick => "alt-click",
        }
    }

    /// Whether this mode tracks a press across pointer-down/move/up.
    pub fn tracks_press(self) -> bool {
        matches!(self, Self::Drag | Self::LongPress)
    }

    /// Whether this mode needs a click listener ahead of page handlers.
    pub fn guards_clicks(self) -> bool {
        matches!(self, Self::LongPress | Self::AltClick)
    }
}

impl fmt::Display for TriggerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerMode {
    type Err = PeekError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "drag" => Ok(Self::Drag),
            "long-press" => Ok(Self::LongPress),
            "alt-click" => Ok(Self::AltClick),
            other => Err(PeekError::Config(format!("unknown trigger mode: {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// DetectionConfig
// ---------------------------------------------------------------------------

/// Mode and thresholds for one detection session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDetectionConfig")]
pub struct DetectionConfig {
    mode: TriggerMode,
    long_press_delay_ms: u32,
    drag_threshold_px: f64,
}

/// Unvalidated form used for deserialization.
#[derive(Deserialize)]
struct RawDetectionConfig {
    mode: TriggerMode,
    #[serde(default = "default_delay")]
    long_press_delay_ms: u32,
    #[serde(default = "default_threshold")]
    drag_threshold_px: f64,
}

fn default_delay() -> u32 {
    DEFAULT_LONG_PRESS_DELAY_MS
}

fn default_threshold() -> f64 {
    DEFAULT_DRAG_THRESHOLD_PX
}

impl TryFrom<RawDetectionConfig> for DetectionConfig {
    type Error = PeekError;

    fn try_from(raw: RawDetectionConfig) -> Result<Self> {
        DetectionConfig::new(raw.mode)
            .with_long_press_delay(raw.long_press_delay_ms)?
            .with_drag_threshold(raw.drag_threshold_px)
    }
}

impl DetectionConfig {
    /// A config for `mode` with the default thresholds.
    pub fn new(mode: TriggerMode) -> Self {
        Self {
            mode,
            long_press_delay_ms: DEFAULT_LONG_PRESS_DELAY_MS,
            drag_threshold_px: DEFAULT_DRAG_THRESHOLD_PX,
        }
    }

    /// Replace the long-press delay. Zero is rejected.
    pub fn with_long_press_delay(mut self, delay_ms: u32) -> Result<Self> {
        if delay_ms == 0 {
            return Err(PeekError::Config(
                "long-press delay must be greater than zero".into(),
            ));
        }
        self.long_press_delay_ms = delay_ms;
        Ok(self)
    }

    /// Replace the drag threshold. Must be finite and greater than zero.
    pub fn with_drag_threshold(mut self, threshold_px: f64) -> Result<Self> {
        if !threshold_px.is_finite() || threshold_px <= 0.0 {
            return Err(PeekError::Config(format!(
                "drag threshold must be a positive number, got {threshold_px}"
            )));
        }
        self.drag_threshold_px = threshold_px;
        Ok(self)
    }

    /// The same thresholds under a different mode.
    pub fn with_mode(mut self, mode: TriggerMode) -> Self {
        self.mode = mode;
        self
    }

    /// Parse and validate a config from TOML.
    ///
    /// ```toml
    /// mode = "long-press"
    /// long_press_delay_ms = 300
    /// ```
    pub fn from_toml(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn mode(&self) -> TriggerMode {
        self.mode
    }

    pub fn long_press_delay_ms(&self) -> u32 {
        self.long_press_delay_ms
    }

    pub fn drag_threshold_px(&self) -> f64 {
        self.drag_threshold_px
    }
}
