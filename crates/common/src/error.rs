//! Error types shared across Lapse crates.

/// Top-level error type for Lapse operations.
#[derive(Debug, thiserror::Error)]
pub enum LapseError {
    #[error("Rasterize error: {message}")]
    Rasterize { message: String },

    #[error("Encode error: {message}")]
    Encode { message: String },

    #[error("An export is already in progress")]
    ExportInProgress,

    #[error("Project {project_id} has no visible frames to export")]
    NothingToExport { project_id: String },

    #[error("Project error: {message}")]
    Project { message: String },

    #[error("Image error: {message}")]
    Image { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias using LapseError.
pub type LapseResult<T> = Result<T, LapseError>;

impl LapseError {
    pub fn rasterize(msg: impl Into<String>) -> Self {
        Self::Rasterize {
            message: msg.into(),
        }
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode {
            message: msg.into(),
        }
    }

    pub fn project(msg: impl Into<String>) -> Self {
        Self::Project {
            message: msg.into(),
        }
    }

    pub fn image(msg: impl Into<String>) -> Self {
        Self::Image {
            message: msg.into(),
        }
    }

    /// Whether this error came out of the capture half of an export.
    pub fn is_rasterize(&self) -> bool {
        matches!(self, Self::Rasterize { .. })
    }

    /// Whether this error came out of the encoding half of an export.
    pub fn is_encode(&self) -> bool {
        matches!(self, Self::Encode { .. })
    }
}
