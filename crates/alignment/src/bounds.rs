//! Drag limits for the pan gesture.

use lapse_project_model::{ContainerSize, PixelOffset};
use serde::{Deserialize, Serialize};

/// Allowed pan range in container pixels.
///
/// The range is half the container in each direction regardless of the image
/// aspect ratio or the current zoom.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DragBounds {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl DragBounds {
    /// Bounds of a container that has not been measured yet.
    pub const UNMEASURED: DragBounds = DragBounds {
        left: 0.0,
        right: 0.0,
        top: 0.0,
        bottom: 0.0,
    };

    /// Bounds for a measured container, `UNMEASURED` otherwise.
    pub fn for_container(container: ContainerSize) -> Self {
        if !container.is_measured() {
            return Self::UNMEASURED;
        }
        let half_w = container.width / 2.0;
        let half_h = container.height / 2.0;
        Self {
            left: -half_w,
            right: half_w,
            top: -half_h,
            bottom: half_h,
        }
    }

    pub fn is_unmeasured(&self) -> bool {
        *self == Self::UNMEASURED
    }

    pub fn contains(&self, offset: PixelOffset) -> bool {
        offset.x >= self.left
            && offset.x <= self.right
            && offset.y >= self.top
            && offset.y <= self.bottom
    }

    /// Pull an offset back inside the bounds.
    pub fn clamp(&self, offset: PixelOffset) -> PixelOffset {
        PixelOffset {
            x: clamp_axis(offset.x, self.left, self.right),
            y: clamp_axis(offset.y, self.top, self.bottom),
        }
    }
}

fn clamp_axis(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        return 0.0_f64.clamp(min, max);
    }
    value.clamp(min, max)
}
