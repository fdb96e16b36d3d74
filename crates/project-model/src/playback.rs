//! Playback speed table and editor settings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Fixed per-frame display durations used for preview and export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PlaybackSpeed {
    #[default]
    #[serde(rename = "1x")]
    X1,
    #[serde(rename = "2x")]
    X2,
    #[serde(rename = "3x")]
    X3,
    #[serde(rename = "4x")]
    X4,
}

impl PlaybackSpeed {
    pub const ALL: [PlaybackSpeed; 4] = [Self::X1, Self::X2, Self::X3, Self::X4];

    /// How long each frame stays on screen.
    pub fn frame_duration_ms(self) -> u32 {
        match self {
            Self::X1 => 1000,
            Self::X2 => 500,
            Self::X3 => 250,
            Self::X4 => 125,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::X1 => "1x",
            Self::X2 => "2x",
            Self::X3 => "3x",
            Self::X4 => "4x",
        }
    }
}

impl fmt::Display for PlaybackSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Error for an unknown playback speed key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown playback speed '{0}'. Use: 1x, 2x, 3x, 4x")]
pub struct UnknownPlaybackSpeed(pub String);

impl FromStr for PlaybackSpeed {
    type Err = UnknownPlaybackSpeed;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|speed| speed.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownPlaybackSpeed(s.to_string()))
    }
}

/// Settings that affect rendering, passed explicitly to whoever needs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorSettings {
    /// Show the previous frame as a ghost while aligning.
    pub ghost: bool,

    /// Per-frame duration for playback and export.
    pub playback_speed: PlaybackSpeed,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            ghost: true,
            playback_speed: PlaybackSpeed::X1,
        }
    }
}
