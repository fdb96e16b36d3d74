//! Project metadata and the ordered frame list.
//!
//! A project is the top-level container: a name plus the frames in playback
//! order. Order is the position in `frames`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::frame::{Frame, FrameId, ProjectId};
use crate::transform::Transform;

/// Current schema version written to `project.json`.
pub const PROJECT_SCHEMA_VERSION: &str = "1.0";

/// Top-level project file (`project.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Schema version.
    pub version: String,

    /// Unique project identifier.
    pub id: ProjectId,

    /// Human-readable project name.
    pub name: String,

    /// Creation timestamp (RFC 3339).
    pub created_at: String,

    /// Last modified timestamp (RFC 3339).
    pub modified_at: String,

    /// Frames in playback order.
    #[serde(default)]
    pub frames: Vec<Frame>,
}

impl Project {
    /// Create an empty project.
    pub fn new(name: impl Into<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            version: PROJECT_SCHEMA_VERSION.to_string(),
            id: ProjectId::generate(),
            name: name.into(),
            created_at: now.clone(),
            modified_at: now,
            frames: vec![],
        }
    }

    /// Bump the modification timestamp.
    pub fn touch(&mut self) {
        self.modified_at = chrono::Utc::now().to_rfc3339();
    }

    /// Frames that take part in playback/export, in order.
    pub fn visible_frames(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter().filter(|frame| frame.is_visible())
    }

    /// Position of a frame in the sequence.
    pub fn frame_index(&self, frame_id: &FrameId) -> Option<usize> {
        self.frames.iter().position(|frame| &frame.id == frame_id)
    }

    pub fn frame(&self, frame_id: &FrameId) -> Result<&Frame, ProjectError> {
        self.frames
            .iter()
            .find(|frame| &frame.id == frame_id)
            .ok_or_else(|| self.missing_frame(frame_id))
    }

    pub fn frame_mut(&mut self, frame_id: &FrameId) -> Result<&mut Frame, ProjectError> {
        let missing = self.missing_frame(frame_id);
        self.frames
            .iter_mut()
            .find(|frame| &frame.id == frame_id)
            .ok_or(missing)
    }

    /// Append a frame at the end of the sequence.
    pub fn push_frame(&mut self, frame: Frame) -> FrameId {
        let id = frame.id.clone();
        self.frames.push(frame);
        self.touch();
        id
    }

    /// Remove a frame, returning it.
    pub fn remove_frame(&mut self, frame_id: &FrameId) -> Result<Frame, ProjectError> {
        let index = self
            .frame_index(frame_id)
            .ok_or_else(|| self.missing_frame(frame_id))?;
        let frame = self.frames.remove(index);
        self.touch();
        Ok(frame)
    }

    /// Move a frame to a new position, shifting the frames in between.
    pub fn move_frame(&mut self, frame_id: &FrameId, to_index: usize) -> Result<(), ProjectError> {
        let from = self
            .frame_index(frame_id)
            .ok_or_else(|| self.missing_frame(frame_id))?;
        if to_index >= self.frames.len() {
            return Err(ProjectError::ValidationError {
                message: format!(
                    "target index {to_index} out of range for {} frames",
                    self.frames.len()
                ),
            });
        }
        let frame = self.frames.remove(from);
        self.frames.insert(to_index, frame);
        self.touch();
        Ok(())
    }

    /// Replace a frame's transform as one atomic update.
    pub fn set_transform(
        &mut self,
        frame_id: &FrameId,
        transform: Transform,
    ) -> Result<(), ProjectError> {
        self.frame_mut(frame_id)?.transform = transform;
        self.touch();
        Ok(())
    }

    /// Load `project.json` from a project directory.
    pub fn load(root: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let project_path = root.as_ref().join(PROJECT_FILE);
        let project_json =
            std::fs::read_to_string(&project_path).map_err(|e| ProjectError::IoError {
                path: project_path.clone(),
                source: e,
            })?;

        serde_json::from_str(&project_json).map_err(|e| ProjectError::ParseError {
            path: project_path,
            source: e,
        })
    }

    /// Write `project.json` into a project directory, creating it if needed.
    pub fn save(&self, root: impl AsRef<Path>) -> Result<(), ProjectError> {
        let root = root.as_ref();
        std::fs::create_dir_all(root).map_err(|e| ProjectError::IoError {
            path: root.to_path_buf(),
            source: e,
        })?;

        let project_path = root.join(PROJECT_FILE);
        let project_json =
            serde_json::to_string_pretty(self).map_err(|e| ProjectError::ParseError {
                path: project_path.clone(),
                source: e,
            })?;

        // Write-then-rename so a crash never leaves a truncated project file.
        let staging_path = root.join(format!("{PROJECT_FILE}.tmp"));
        std::fs::write(&staging_path, project_json).map_err(|e| ProjectError::IoError {
            path: staging_path.clone(),
            source: e,
        })?;
        std::fs::rename(&staging_path, &project_path).map_err(|e| ProjectError::IoError {
            path: project_path,
            source: e,
        })
    }

    fn missing_frame(&self, frame_id: &FrameId) -> ProjectError {
        ProjectError::FrameNotFound {
            project_id: self.id.clone(),
            frame_id: frame_id.clone(),
        }
    }
}

/// Name of the project file inside a project directory.
pub const PROJECT_FILE: &str = "project.json";

/// Errors that can occur when working with projects.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Project not found: {project_id}")]
    ProjectNotFound { project_id: ProjectId },

    #[error("Frame {frame_id} not found in project {project_id}")]
    FrameNotFound {
        project_id: ProjectId,
        frame_id: FrameId,
    },

    #[error("Invalid project: {message}")]
    ValidationError { message: String },
}
