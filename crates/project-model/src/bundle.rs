//! Portable single-file project bundles.
//!
//! A bundle is one JSON document carrying the project name and every frame
//! with its image inlined as a `data:` URL:
//!
//! ```json
//! {
//!   "name": "Garden",
//!   "frames": [
//!     {
//!       "image": "data:image/jpeg;base64,...",
//!       "caption": "Week 1",
//!       "hidden": false,
//!       "position": { "x": 0.1, "y": -0.05 },
//!       "scale": 1.2,
//!       "rotation": -3
//!     }
//!   ]
//! }
//! ```
//!
//! Importing always assigns fresh project and frame ids.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::frame::{Frame, FrameId, ImageSource};
use crate::project::{Project, ProjectError};
use crate::transform::Transform;

/// Serialized bundle document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bundle {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub frames: Vec<BundleFrame>,
}

/// One frame inside a bundle. Fields are optional on the way in so that
/// validation can report what is missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub hidden: Option<bool>,
    pub position: Option<BundlePosition>,
    pub scale: Option<f64>,
    pub rotation: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BundlePosition {
    pub x: f64,
    pub y: f64,
}

impl Bundle {
    /// Parse a bundle from JSON text.
    pub fn from_json(json: &str) -> Result<Self, ProjectError> {
        serde_json::from_str(json).map_err(|e| ProjectError::ValidationError {
            message: format!("Unable to read bundle: {e}"),
        })
    }

    pub fn to_json(&self) -> Result<String, ProjectError> {
        serde_json::to_string(self).map_err(|e| ProjectError::ValidationError {
            message: format!("Unable to write bundle: {e}"),
        })
    }

    /// Build a bundle from a project, inlining every frame image.
    pub fn from_project(project: &Project) -> Result<Self, ProjectError> {
        let frames = project
            .frames
            .iter()
            .map(|frame| {
                let bytes = frame.image.read_bytes().map_err(|e| match &frame.image {
                    ImageSource::File { path } => ProjectError::IoError {
                        path: path.clone(),
                        source: e,
                    },
                    ImageSource::Inline { .. } => ProjectError::ValidationError {
                        message: e.to_string(),
                    },
                })?;
                Ok(BundleFrame {
                    id: Some(frame.id.to_string()),
                    image: Some(encode_data_url(&bytes)),
                    caption: frame.caption.clone(),
                    hidden: Some(frame.hidden),
                    position: Some(BundlePosition {
                        x: frame.transform.position_x,
                        y: frame.transform.position_y,
                    }),
                    scale: Some(frame.transform.scale),
                    rotation: Some(frame.transform.rotation_deg),
                })
            })
            .collect::<Result<Vec<_>, ProjectError>>()?;

        Ok(Self {
            name: project.name.clone(),
            frames,
        })
    }

    /// Check the bundle has everything an import needs.
    pub fn validate(&self) -> Result<(), ProjectError> {
        if self.name.trim().is_empty() {
            return Err(invalid("bundle has no project name"));
        }
        for (index, frame) in self.frames.iter().enumerate() {
            if frame.image.is_none() {
                return Err(invalid(format!("frame {index} has no image")));
            }
            if frame.position.is_none() {
                return Err(invalid(format!("frame {index} has no position")));
            }
            if frame.scale.is_none() {
                return Err(invalid(format!("frame {index} has no scale")));
            }
            if frame.rotation.is_none() {
                return Err(invalid(format!("frame {index} has no rotation")));
            }
        }
        Ok(())
    }

    /// Validate and convert into a new project with fresh ids.
    pub fn into_project(self) -> Result<Project, ProjectError> {
        self.validate()?;

        let mut project = Project::new(self.name);
        for (index, bundled) in self.frames.into_iter().enumerate() {
            let data_url = bundled.image.unwrap_or_default();
            let bytes = decode_data_url(&data_url)
                .ok_or_else(|| invalid(format!("frame {index} image is not valid base64")))?;

            let position = bundled.position.unwrap_or(BundlePosition { x: 0.0, y: 0.0 });
            let scale = bundled.scale.filter(|s| *s != 0.0).unwrap_or(1.0);
            let rotation = bundled.rotation.unwrap_or(0.0);

            project.frames.push(Frame {
                id: FrameId::generate(),
                image: ImageSource::inline(bytes),
                caption: bundled.caption.filter(|c| !c.is_empty()),
                hidden: bundled.hidden.unwrap_or(false),
                transform: Transform::new(position.x, position.y, scale, rotation),
            });
        }

        tracing::info!(
            project_id = %project.id,
            frames = project.frames.len(),
            "Imported bundle"
        );
        Ok(project)
    }
}

fn invalid(message: impl Into<String>) -> ProjectError {
    ProjectError::ValidationError {
        message: message.into(),
    }
}

/// Encode image bytes as a `data:` URL, sniffing the MIME type.
pub fn encode_data_url(bytes: &[u8]) -> String {
    format!("data:{};base64,{}", sniff_mime(bytes), BASE64.encode(bytes))
}

/// Decode a `data:...;base64,` URL. Bare base64 is accepted too.
pub fn decode_data_url(value: &str) -> Option<Vec<u8>> {
    let payload = match value.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest.split_once(',')?;
            if !header.ends_with(";base64") {
                return None;
            }
            payload
        }
        None => value,
    };
    BASE64.decode(payload.trim()).ok()
}

fn sniff_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_data_url_sniffs_png() {
        let url = encode_data_url(&PNG_MAGIC);
        assert!(url.starts_with("data:image/png;base64,"));
        assert_eq!(decode_data_url(&url).unwrap(), PNG_MAGIC);
    }

    #[test]
    fn test_import_assigns_fresh_ids_and_defaults() {
        let json = format!(
            r#"{{"name":"Garden","frames":[{{"id":"old","image":"{}","position":{{"x":0.2,"y":0}},"scale":0,"rotation":0}}]}}"#,
            encode_data_url(&PNG_MAGIC)
        );
        let project = Bundle::from_json(&json).unwrap().into_project().unwrap();
        assert_eq!(project.name, "Garden");
        assert_eq!(project.frames.len(), 1);

        let frame = &project.frames[0];
        assert_ne!(frame.id.as_str(), "old");
        assert_eq!(frame.transform.scale, 1.0);
        assert_eq!(frame.transform.position_x, 0.2);
        assert!(!frame.hidden);
        assert!(frame.caption.is_none());
    }

    #[test]
    fn test_missing_name_is_rejected() {
        let bundle = Bundle::from_json(r#"{"frames":[]}"#).unwrap();
        assert!(matches!(
            bundle.into_project(),
            Err(ProjectError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_frame_without_rotation_is_rejected() {
        let json = r#"{"name":"G","frames":[{"image":"AA==","position":{"x":0,"y":0},"scale":1}]}"#;
        let err = Bundle::from_json(json).unwrap().validate().unwrap_err();
        assert!(err.to_string().contains("rotation"));
    }

    #[test]
    fn test_export_then_import_keeps_alignment() {
        let mut project = Project::new("Garden");
        let mut frame = Frame::new(ImageSource::inline(PNG_MAGIC.to_vec()));
        frame.transform = Transform::new(-0.3, 0.4, 2.5, -45.0);
        frame.caption = Some("Day 9".into());
        frame.hidden = true;
        project.push_frame(frame);

        let json = Bundle::from_project(&project).unwrap().to_json().unwrap();
        let imported = Bundle::from_json(&json).unwrap().into_project().unwrap();

        let frame = &imported.frames[0];
        assert_eq!(frame.transform, Transform::new(-0.3, 0.4, 2.5, -45.0));
        assert_eq!(frame.caption.as_deref(), Some("Day 9"));
        assert!(frame.hidden);
        assert_eq!(frame.image, ImageSource::inline(PNG_MAGIC.to_vec()));
    }
}
