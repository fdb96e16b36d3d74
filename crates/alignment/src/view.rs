//! Read-only frame placement.

use lapse_project_model::{ContainerSize, Frame, FrameId, ImageSource, PixelOffset, Transform};

/// A frame placed with its stored transform, without gesture handling.
///
/// Used for thumbnails, previews, export compositions and the ghost layer.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticView {
    pub frame_id: FrameId,
    pub image: ImageSource,
    pub transform: Transform,
    pub caption: Option<String>,
    /// Layer opacity in `[0, 1]`.
    pub opacity: f32,
}

impl StaticView {
    /// Fully opaque view of a frame.
    pub fn of(frame: &Frame) -> Self {
        Self {
            frame_id: frame.id.clone(),
            image: frame.image.clone(),
            transform: frame.transform.clamped(),
            caption: frame.caption_text().map(str::to_string),
            opacity: 1.0,
        }
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Pan offset inside a container, re-derived on every call.
    pub fn offset_in(&self, container: ContainerSize) -> PixelOffset {
        self.transform.to_pixels(container)
    }
}
