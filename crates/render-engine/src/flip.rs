//! Mirroring a frame's stored image.
//!
//! Flipping rewrites the image itself; the frame's transform is untouched.
//! The result is always re-encoded as JPEG.

use image::codecs::jpeg::JpegEncoder;
use lapse_common::error::{LapseError, LapseResult};
use lapse_project_model::{FlipAxis, FrameId, ImageSource, ProjectId, ProjectStore};

/// JPEG quality of flipped images.
pub const FLIP_JPEG_QUALITY: u8 = 92;

/// Decode `bytes`, mirror them along `axis` and encode the result as JPEG.
pub fn flip_image(bytes: &[u8], axis: FlipAxis) -> LapseResult<Vec<u8>> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| LapseError::image(format!("Failed to decode image: {e}")))?;
    let flipped = match axis {
        FlipAxis::Horizontal => decoded.fliph(),
        FlipAxis::Vertical => decoded.flipv(),
    };

    let rgb = flipped.to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, FLIP_JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(|e| LapseError::image(format!("Failed to encode JPEG: {e}")))?;
    Ok(out)
}

/// Flip one frame's image in the store.
pub fn flip_frame<S>(
    store: &S,
    project_id: &ProjectId,
    frame_id: &FrameId,
    axis: FlipAxis,
) -> LapseResult<()>
where
    S: ProjectStore + ?Sized,
{
    let frame = store
        .get_frame(project_id, frame_id)
        .map_err(|e| LapseError::project(e.to_string()))?;
    let bytes = frame.image.read_bytes()?;
    let flipped = flip_image(&bytes, axis)?;

    store
        .replace_image(project_id, frame_id, ImageSource::inline(flipped))
        .map_err(|e| LapseError::project(e.to_string()))?;
    tracing::info!(project_id = %project_id, frame_id = %frame_id, axis = %axis, "Flipped frame");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Luma, Rgba, RgbaImage};
    use lapse_project_model::{Frame, FrameStore, MemoryStore, Transform};

    use crate::compositor::encode_png;

    // White top-right quadrant, black elsewhere.
    fn marked_png() -> Vec<u8> {
        let image = RgbaImage::from_fn(32, 32, |x, y| {
            if x >= 16 && y < 16 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        });
        encode_png(&image).unwrap()
    }

    fn luma_at(jpeg: &[u8], x: u32, y: u32) -> u8 {
        let decoded = image::load_from_memory(jpeg).unwrap();
        assert_eq!(decoded.dimensions(), (32, 32));
        let Luma([value]) = *decoded.to_luma8().get_pixel(x, y);
        value
    }

    #[test]
    fn test_horizontal_flip_mirrors_columns() {
        let flipped = flip_image(&marked_png(), FlipAxis::Horizontal).unwrap();
        assert_eq!(&flipped[..3], &[0xFF, 0xD8, 0xFF]);
        assert!(luma_at(&flipped, 4, 4) > 200);
        assert!(luma_at(&flipped, 28, 4) < 50);
    }

    #[test]
    fn test_vertical_flip_mirrors_rows() {
        let flipped = flip_image(&marked_png(), FlipAxis::Vertical).unwrap();
        assert!(luma_at(&flipped, 28, 28) > 200);
        assert!(luma_at(&flipped, 28, 4) < 50);
    }

    #[test]
    fn test_undecodable_bytes_are_image_error() {
        let err = flip_image(b"not an image", FlipAxis::Horizontal).unwrap_err();
        assert!(matches!(err, LapseError::Image { .. }));
    }

    #[test]
    fn test_flip_frame_keeps_transform() {
        let store = MemoryStore::new();
        let project = store.create_project("Flip").unwrap();
        let mut frame = Frame::new(ImageSource::inline(marked_png()));
        frame.transform = Transform::new(0.1, -0.2, 1.4, 30.0);
        let frame_id = store.add_frame(&project.id, frame).unwrap();

        flip_frame(&store, &project.id, &frame_id, FlipAxis::Horizontal).unwrap();

        let stored = store.get_frame(&project.id, &frame_id).unwrap();
        assert_eq!(stored.transform, Transform::new(0.1, -0.2, 1.4, 30.0));
        let bytes = stored.image.read_bytes().unwrap();
        assert!(luma_at(&bytes, 4, 4) > 200);
    }
}
