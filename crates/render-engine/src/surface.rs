//! Capture surfaces: where compositions are mounted and captured as PNG.

use std::collections::HashMap;

use lapse_common::error::{LapseError, LapseResult};
use lapse_project_model::FrameId;

use crate::compositor::{Compositor, FrameComposition, DEFAULT_CONTAINER_HEIGHT, DEFAULT_CONTAINER_WIDTH};

/// How a surface decodes images relative to a capture request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMode {
    /// Images are fully decoded before a capture returns.
    Synchronous,
    /// Decoding may still be pending when a capture runs, so early captures
    /// can come back incomplete.
    Deferred,
}

/// A surface that holds mounted compositions and captures them to PNG.
pub trait CaptureSurface: Send {
    /// Replace the mounted set with `compositions`.
    fn mount(&mut self, compositions: Vec<FrameComposition>);

    fn unmount_all(&mut self);

    /// Capture the composition mounted for `frame_id` as PNG bytes.
    ///
    /// A frame that is not mounted is an error.
    fn capture(&mut self, frame_id: &FrameId) -> LapseResult<Vec<u8>>;

    fn decode_mode(&self) -> DecodeMode;

    fn name(&self) -> &str;
}

/// In-process surface rendering through the CPU [`Compositor`].
pub struct OffscreenSurface {
    compositor: Compositor,
    mounted: HashMap<FrameId, FrameComposition>,
}

impl OffscreenSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            compositor: Compositor::new(width, height),
            mounted: HashMap::new(),
        }
    }

    pub fn mounted_count(&self) -> usize {
        self.mounted.len()
    }
}

impl Default for OffscreenSurface {
    fn default() -> Self {
        Self::new(DEFAULT_CONTAINER_WIDTH, DEFAULT_CONTAINER_HEIGHT)
    }
}

impl CaptureSurface for OffscreenSurface {
    fn mount(&mut self, compositions: Vec<FrameComposition>) {
        self.mounted = compositions
            .into_iter()
            .map(|composition| (composition.frame_id().clone(), composition))
            .collect();
        tracing::debug!(count = self.mounted.len(), "Mounted compositions");
    }

    fn unmount_all(&mut self) {
        self.mounted.clear();
    }

    fn capture(&mut self, frame_id: &FrameId) -> LapseResult<Vec<u8>> {
        let composition = self.mounted.get(frame_id).ok_or_else(|| {
            LapseError::rasterize(format!("Frame {frame_id} is not mounted on the capture surface"))
        })?;
        self.compositor.render_png(composition)
    }

    fn decode_mode(&self) -> DecodeMode {
        DecodeMode::Synchronous
    }

    fn name(&self) -> &str {
        "offscreen"
    }
}
