//! Interactive alignment of one frame.
//!
//! The controller owns the editing state of a single frame: the current pixel
//! offset inside the measured container, the zoom and the rotation. Every
//! change is converted back to normalized form and written to the store in a
//! single `update_frame_transform` call. There is no separate save step.

use std::sync::Arc;

use lapse_project_model::transform::{
    clamp_rotation, clamp_scale, ROTATION_STEP, SCALE_STEP,
};
use lapse_project_model::{
    ContainerSize, FrameId, FrameStore, PixelOffset, ProjectError, ProjectId, Transform,
};

use crate::bounds::DragBounds;

/// Errors raised by alignment gestures.
#[derive(Debug, thiserror::Error)]
pub enum AlignmentError {
    /// The container has no size yet, so a drag cannot be mapped to a position.
    #[error("Container has not been measured yet")]
    NotMeasured,

    #[error("No drag in progress")]
    NoActiveDrag,

    #[error(transparent)]
    Store(#[from] ProjectError),
}

#[derive(Debug, Clone, Copy)]
struct DragState {
    origin: PixelOffset,
}

/// Editing session for one frame.
pub struct AlignmentController {
    store: Arc<dyn FrameStore>,
    project_id: ProjectId,
    frame_id: FrameId,
    transform: Transform,
    container: ContainerSize,
    offset: PixelOffset,
    bounds: DragBounds,
    drag: Option<DragState>,
}

impl AlignmentController {
    /// Start editing a frame with its persisted transform.
    ///
    /// The container starts unmeasured; call [`measure`](Self::measure) once
    /// the display size is known.
    pub fn open(
        store: Arc<dyn FrameStore>,
        project_id: ProjectId,
        frame_id: FrameId,
    ) -> Result<Self, AlignmentError> {
        let frame = store.get_frame(&project_id, &frame_id)?;
        tracing::debug!(
            project_id = %project_id,
            frame_id = %frame_id,
            "Opened frame for alignment"
        );
        Ok(Self {
            store,
            project_id,
            frame_id,
            transform: frame.transform.clamped(),
            container: ContainerSize::UNMEASURED,
            offset: PixelOffset::ZERO,
            bounds: DragBounds::UNMEASURED,
            drag: None,
        })
    }

    /// Record the rendered container size.
    ///
    /// The pixel offset is re-derived from the normalized position and the
    /// drag bounds are recomputed. A drag in progress keeps its origin at the
    /// same relative spot, or ends if either size is unmeasured. Nothing is
    /// written to the store.
    pub fn measure(&mut self, container: ContainerSize) {
        let previous = self.container;
        self.drag = self.drag.and_then(|drag| {
            (previous.is_measured() && container.is_measured()).then(|| DragState {
                origin: PixelOffset::new(
                    drag.origin.x * container.width / previous.width,
                    drag.origin.y * container.height / previous.height,
                ),
            })
        });
        self.container = container;
        self.bounds = DragBounds::for_container(container);
        self.offset = self.transform.to_pixels(container);
        tracing::trace!(
            width = container.width,
            height = container.height,
            "Alignment container measured"
        );
    }

    pub fn frame_id(&self) -> &FrameId {
        &self.frame_id
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn offset(&self) -> PixelOffset {
        self.offset
    }

    pub fn bounds(&self) -> DragBounds {
        self.bounds
    }

    pub fn container(&self) -> ContainerSize {
        self.container
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Begin a pan gesture. Refused while the container is unmeasured.
    pub fn begin_drag(&mut self) -> Result<(), AlignmentError> {
        if !self.container.is_measured() {
            return Err(AlignmentError::NotMeasured);
        }
        self.drag = Some(DragState {
            origin: self.offset,
        });
        Ok(())
    }

    /// Move the image to an absolute offset, clamped to the drag bounds.
    pub fn drag_to(&mut self, offset: PixelOffset) -> Result<Transform, AlignmentError> {
        if self.drag.is_none() {
            return Err(AlignmentError::NoActiveDrag);
        }
        self.offset = self.bounds.clamp(offset);
        Ok(self.commit())
    }

    /// Move the image by a pointer delta measured from where the drag began.
    pub fn drag_by(&mut self, dx: f64, dy: f64) -> Result<Transform, AlignmentError> {
        let origin = self.drag.ok_or(AlignmentError::NoActiveDrag)?.origin;
        self.drag_to(PixelOffset::new(origin.x + dx, origin.y + dy))
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    /// Set the zoom factor (clamped) and commit.
    pub fn set_scale(&mut self, scale: f64) -> Transform {
        self.transform.scale = clamp_scale(scale);
        self.commit()
    }

    /// Set the rotation in degrees (clamped) and commit.
    pub fn set_rotation(&mut self, rotation_deg: f64) -> Transform {
        self.transform.rotation_deg = clamp_rotation(rotation_deg);
        self.commit()
    }

    pub fn zoom_in(&mut self) -> Transform {
        self.set_scale(self.transform.scale + SCALE_STEP)
    }

    pub fn zoom_out(&mut self) -> Transform {
        self.set_scale(self.transform.scale - SCALE_STEP)
    }

    pub fn rotate_clockwise(&mut self) -> Transform {
        self.set_rotation(self.transform.rotation_deg + ROTATION_STEP)
    }

    pub fn rotate_counterclockwise(&mut self) -> Transform {
        self.set_rotation(self.transform.rotation_deg - ROTATION_STEP)
    }

    /// Return to the identity placement and commit.
    pub fn reset(&mut self) -> Transform {
        self.drag = None;
        self.transform = Transform::IDENTITY;
        self.offset = PixelOffset::ZERO;
        self.commit()
    }

    /// Fold the pixel offset into the transform and persist it.
    ///
    /// With an unmeasured container the persisted position is kept as is.
    fn commit(&mut self) -> Transform {
        self.transform = self
            .transform
            .with_pixel_offset(self.offset, self.container);

        if let Err(e) =
            self.store
                .update_frame_transform(&self.project_id, &self.frame_id, self.transform)
        {
            tracing::warn!(
                project_id = %self.project_id,
                frame_id = %self.frame_id,
                error = %e,
                "Failed to persist frame transform"
            );
        }
        self.transform
    }
}
