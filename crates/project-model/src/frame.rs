//! Frames: one photograph of the sequence plus its alignment.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::transform::Transform;

/// Opaque, unique frame identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameId(String);

/// Opaque, unique project identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            /// Generate a fresh random (UUID v4) identifier.
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(FrameId);
string_id!(ProjectId);

/// Where a frame's encoded image bytes live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageSource {
    /// An image file. Persisted paths are relative to the project directory.
    File { path: PathBuf },
    /// Encoded image bytes kept with the frame (base64 in JSON).
    Inline {
        #[serde(serialize_with = "serialize_base64", deserialize_with = "deserialize_base64")]
        data: Vec<u8>,
    },
}

impl ImageSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File { path: path.into() }
    }

    pub fn inline(data: impl Into<Vec<u8>>) -> Self {
        Self::Inline { data: data.into() }
    }

    /// Read the encoded image bytes.
    pub fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        match self {
            Self::File { path } => std::fs::read(path),
            Self::Inline { data } => Ok(data.clone()),
        }
    }

    /// Resolve a relative file path against `root`; inline data is unchanged.
    pub fn resolved_against(&self, root: &Path) -> Self {
        match self {
            Self::File { path } if path.is_relative() => Self::File {
                path: root.join(path),
            },
            other => other.clone(),
        }
    }
}

fn serialize_base64<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&BASE64.encode(data))
}

fn deserialize_base64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let encoded = String::deserialize(deserializer)?;
    BASE64
        .decode(encoded.as_bytes())
        .map_err(serde::de::Error::custom)
}

/// File extension for encoded image bytes, from their magic number.
pub fn image_extension(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0x89, b'P', b'N', b'G', ..] => Some("png"),
        [0xFF, 0xD8, 0xFF, ..] => Some("jpg"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("webp"),
        _ => None,
    }
}

/// Mirror axis for flipping a frame's image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlipAxis {
    /// Left and right swap.
    Horizontal,
    /// Top and bottom swap.
    Vertical,
}

impl fmt::Display for FlipAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown flip axis '{0}'. Use: horizontal, vertical")]
pub struct UnknownFlipAxis(pub String);

impl FromStr for FlipAxis {
    type Err = UnknownFlipAxis;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "horizontal" | "h" => Ok(Self::Horizontal),
            "vertical" | "v" => Ok(Self::Vertical),
            _ => Err(UnknownFlipAxis(s.to_string())),
        }
    }
}

/// One photograph in the sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Unique identifier.
    pub id: FrameId,

    /// Encoded image.
    pub image: ImageSource,

    /// Optional caption drawn over the bottom of the frame.
    #[serde(default)]
    pub caption: Option<String>,

    /// Hidden frames stay in the edit list but are skipped on playback/export.
    #[serde(default)]
    pub hidden: bool,

    /// Alignment relative to the display container.
    #[serde(default)]
    pub transform: Transform,
}

impl Frame {
    /// A new visible frame with identity transform and no caption.
    pub fn new(image: ImageSource) -> Self {
        Self {
            id: FrameId::generate(),
            image,
            caption: None,
            hidden: false,
            transform: Transform::IDENTITY,
        }
    }

    /// Whether this frame takes part in playback and export.
    pub fn is_visible(&self) -> bool {
        !self.hidden
    }

    /// Caption text, if it has any visible content.
    pub fn caption_text(&self) -> Option<&str> {
        self.caption
            .as_deref()
            .map(str::trim)
            .filter(|caption| !caption.is_empty())
    }
}
