//! Per-frame alignment transforms.
//!
//! Positions are stored as fractions of the display container so that a
//! frame aligned in one container size lines up identically in any other.
//! Pixel offsets are always re-derived from the current container size.

use serde::{Deserialize, Serialize};

/// Smallest allowed zoom factor.
pub const SCALE_MIN: f64 = 0.5;
/// Largest allowed zoom factor.
pub const SCALE_MAX: f64 = 3.0;
/// Smallest allowed rotation in degrees.
pub const ROTATION_MIN: f64 = -180.0;
/// Largest allowed rotation in degrees.
pub const ROTATION_MAX: f64 = 180.0;
/// Zoom nudge step.
pub const SCALE_STEP: f64 = 0.1;
/// Rotation nudge step in degrees.
pub const ROTATION_STEP: f64 = 1.0;

/// How a frame's image is composed inside its display container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Horizontal offset as a fraction of container width (signed, unclamped).
    pub position_x: f64,
    /// Vertical offset as a fraction of container height (signed, unclamped).
    pub position_y: f64,
    /// Zoom about the image center.
    pub scale: f64,
    /// Rotation about the image center in degrees, applied after scale.
    pub rotation_deg: f64,
}

impl Transform {
    /// The untouched placement every new frame starts with.
    pub const IDENTITY: Transform = Transform {
        position_x: 0.0,
        position_y: 0.0,
        scale: 1.0,
        rotation_deg: 0.0,
    };

    /// Create a transform, clamping scale and rotation to their ranges.
    pub fn new(position_x: f64, position_y: f64, scale: f64, rotation_deg: f64) -> Self {
        Self {
            position_x,
            position_y,
            scale: clamp_scale(scale),
            rotation_deg: clamp_rotation(rotation_deg),
        }
    }

    /// Pixel offset of this transform inside a container of the given size.
    pub fn to_pixels(&self, container: ContainerSize) -> PixelOffset {
        to_pixels(self, container.width, container.height)
    }

    /// Copy of this transform with the position replaced by a pixel offset
    /// measured in `container`.
    ///
    /// An unmeasured container leaves the stored position untouched.
    pub fn with_pixel_offset(&self, offset: PixelOffset, container: ContainerSize) -> Self {
        if !container.is_measured() {
            return *self;
        }
        let (position_x, position_y) =
            to_normalized(offset.x, offset.y, container.width, container.height);
        Self {
            position_x,
            position_y,
            ..*self
        }
    }

    /// Copy with scale and rotation clamped to their allowed ranges.
    pub fn clamped(&self) -> Self {
        Self::new(self.position_x, self.position_y, self.scale, self.rotation_deg)
    }

    /// Rotation in radians.
    pub fn rotation_rad(&self) -> f64 {
        self.rotation_deg.to_radians()
    }

    /// Whether this is the identity placement.
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Rendered size of a frame's display container, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ContainerSize {
    pub width: f64,
    pub height: f64,
}

impl ContainerSize {
    /// A container that has not been laid out yet.
    pub const UNMEASURED: ContainerSize = ContainerSize {
        width: 0.0,
        height: 0.0,
    };

    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether both dimensions are usable for coordinate conversion.
    pub fn is_measured(&self) -> bool {
        is_usable_dimension(self.width) && is_usable_dimension(self.height)
    }
}

/// Pan offset in container pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelOffset {
    pub x: f64,
    pub y: f64,
}

impl PixelOffset {
    pub const ZERO: PixelOffset = PixelOffset { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Project a normalized position into container pixels.
///
/// Returns a zero offset when either container dimension is zero (or not
/// finite); callers treat that as "not positionable yet".
pub fn to_pixels(transform: &Transform, container_width: f64, container_height: f64) -> PixelOffset {
    if !is_usable_dimension(container_width) || !is_usable_dimension(container_height) {
        return PixelOffset::ZERO;
    }
    PixelOffset {
        x: transform.position_x * container_width,
        y: transform.position_y * container_height,
    }
}

/// Exact inverse of [`to_pixels`]: pixel offset to `(position_x, position_y)`.
pub fn to_normalized(
    offset_x: f64,
    offset_y: f64,
    container_width: f64,
    container_height: f64,
) -> (f64, f64) {
    if !is_usable_dimension(container_width) || !is_usable_dimension(container_height) {
        return (0.0, 0.0);
    }
    (offset_x / container_width, offset_y / container_height)
}

/// Clamp a zoom factor into `[SCALE_MIN, SCALE_MAX]`.
pub fn clamp_scale(scale: f64) -> f64 {
    if scale.is_nan() {
        return 1.0;
    }
    scale.clamp(SCALE_MIN, SCALE_MAX)
}

/// Clamp a rotation into `[ROTATION_MIN, ROTATION_MAX]` degrees.
pub fn clamp_rotation(rotation_deg: f64) -> f64 {
    if rotation_deg.is_nan() {
        return 0.0;
    }
    rotation_deg.clamp(ROTATION_MIN, ROTATION_MAX)
}

fn is_usable_dimension(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_default() {
        let t = Transform::default();
        assert!(t.is_identity());
        assert_eq!(t.to_pixels(ContainerSize::new(384.0, 512.0)), PixelOffset::ZERO);
    }

    #[test]
    fn test_to_pixels_scales_by_container() {
        let t = Transform::new(0.25, -0.5, 1.0, 0.0);
        let px = to_pixels(&t, 400.0, 600.0);
        assert!((px.x - 100.0).abs() < 1e-9);
        assert!((px.y + 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_resolution_independence() {
        let t = Transform::new(0.1, 0.2, 1.0, 0.0);
        let small = t.to_pixels(ContainerSize::new(100.0, 200.0));
        let large = t.to_pixels(ContainerSize::new(1000.0, 2000.0));
        assert!((large.x - small.x * 10.0).abs() < 1e-9);
        assert!((large.y - small.y * 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_unmeasured_container_yields_zero() {
        let t = Transform::new(0.4, 0.4, 1.0, 0.0);
        assert_eq!(to_pixels(&t, 0.0, 512.0), PixelOffset::ZERO);
        assert_eq!(to_pixels(&t, 384.0, 0.0), PixelOffset::ZERO);
        assert_eq!(to_normalized(10.0, 10.0, 0.0, 0.0), (0.0, 0.0));
    }

    #[test]
    fn test_extreme_pan_exceeds_unit_range() {
        let (x, y) = to_normalized(-600.0, 900.0, 400.0, 600.0);
        assert!((x + 1.5).abs() < 1e-9);
        assert!((y - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_with_pixel_offset_keeps_position_when_unmeasured() {
        let t = Transform::new(0.3, 0.1, 2.0, 15.0);
        let same = t.with_pixel_offset(PixelOffset::new(50.0, 50.0), ContainerSize::UNMEASURED);
        assert_eq!(same, t);
    }

    #[test]
    fn test_clamping() {
        assert_eq!(clamp_scale(10.0), 3.0);
        assert_eq!(clamp_scale(0.01), 0.5);
        assert_eq!(clamp_rotation(200.0), 180.0);
        assert_eq!(clamp_rotation(-200.0), -180.0);
        assert_eq!(clamp_scale(f64::NAN), 1.0);
    }

    #[test]
    fn test_serialization_field_names() {
        let json = serde_json::to_value(Transform::IDENTITY).unwrap();
        assert_eq!(json["position_x"], 0.0);
        assert_eq!(json["scale"], 1.0);
        assert_eq!(json["rotation_deg"], 0.0);
    }
}
