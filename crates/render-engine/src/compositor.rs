//! Frame compositor: places a frame image per its transform and draws the
//! caption and optional ghost layer on top.
//!
//! The image is laid out at the container width with its natural aspect
//! ratio, anchored at the top-left corner and shifted by the pan offset.
//! Zoom and rotation are applied about the image center.

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};
use kurbo::{Affine, Point};
use lapse_alignment::{ghost_for, StaticView};
use lapse_common::error::{LapseError, LapseResult};
use lapse_project_model::{ContainerSize, EditorSettings, Frame, FrameId};
use resvg::tiny_skia;

use crate::caption::CaptionRenderer;

/// Export container width (a 3:4 portrait card).
pub const DEFAULT_CONTAINER_WIDTH: u32 = 384;
/// Export container height.
pub const DEFAULT_CONTAINER_HEIGHT: u32 = 512;
/// Neutral fill behind the image.
pub const BACKGROUND: Rgba<u8> = Rgba([0xE5, 0xE5, 0xE5, 0xFF]);

/// What to draw for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameComposition {
    pub view: StaticView,
    pub ghost: Option<StaticView>,
}

impl FrameComposition {
    /// Composition used for export: the frame alone, never a ghost.
    pub fn for_export(frame: &Frame) -> Self {
        Self {
            view: StaticView::of(frame),
            ghost: None,
        }
    }

    /// Editing view of `frames[index]`, with the previous frame as ghost when
    /// enabled.
    pub fn for_editing(frames: &[Frame], index: usize, settings: &EditorSettings) -> Option<Self> {
        let frame = frames.get(index)?;
        Some(Self {
            view: StaticView::of(frame),
            ghost: ghost_for(frames, index, settings),
        })
    }

    pub fn frame_id(&self) -> &FrameId {
        &self.view.frame_id
    }
}

/// CPU compositor for a fixed container size.
pub struct Compositor {
    width: u32,
    height: u32,
    captions: Option<CaptionRenderer>,
}

impl Compositor {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            captions: None,
        }
    }

    pub fn container(&self) -> ContainerSize {
        ContainerSize::new(self.width as f64, self.height as f64)
    }

    /// Draw a composition onto a fresh canvas.
    ///
    /// The ghost is painted over the frame, not beneath it, so the previous
    /// photo stays visible through an opaque current one.
    pub fn render(&mut self, composition: &FrameComposition) -> LapseResult<RgbaImage> {
        let mut canvas = RgbaImage::from_pixel(self.width, self.height, BACKGROUND);
        self.draw_view(&mut canvas, &composition.view)?;
        if let Some(ghost) = &composition.ghost {
            self.draw_view(&mut canvas, ghost)?;
        }
        Ok(canvas)
    }

    /// Draw a composition and encode it as PNG.
    pub fn render_png(&mut self, composition: &FrameComposition) -> LapseResult<Vec<u8>> {
        let canvas = self.render(composition)?;
        encode_png(&canvas)
    }

    fn draw_view(&mut self, canvas: &mut RgbaImage, view: &StaticView) -> LapseResult<()> {
        let bytes = view.image.read_bytes().map_err(|e| {
            LapseError::rasterize(format!(
                "Failed to read image for frame {}: {e}",
                view.frame_id
            ))
        })?;
        let source = image::load_from_memory(&bytes)
            .map_err(|e| {
                LapseError::rasterize(format!(
                    "Failed to decode image for frame {}: {e}",
                    view.frame_id
                ))
            })?
            .to_rgba8();

        let placement = placement(view, source.width(), source.height(), self.container());
        draw_image(canvas, &source, placement, view.opacity);

        if let Some(caption) = &view.caption {
            let renderer = self.captions.get_or_insert_with(CaptionRenderer::new);
            if let Some(pixmap) = renderer.render(caption, self.width, self.height)? {
                blend_pixmap(canvas, &pixmap, view.opacity);
            }
        }
        Ok(())
    }
}

/// Affine map from source image pixels to container pixels.
pub fn placement(view: &StaticView, image_width: u32, image_height: u32, container: ContainerSize) -> Affine {
    let iw = image_width.max(1) as f64;
    let ih = image_height.max(1) as f64;
    let dw = container.width;
    let dh = dw * ih / iw;
    let offset = view.offset_in(container);
    let t = &view.transform;

    Affine::translate((offset.x + dw / 2.0, offset.y + dh / 2.0))
        * Affine::rotate(t.rotation_rad())
        * Affine::scale(t.scale)
        * Affine::translate((-dw / 2.0, -dh / 2.0))
        * Affine::scale_non_uniform(dw / iw, dh / ih)
}

fn draw_image(canvas: &mut RgbaImage, source: &RgbaImage, placement: Affine, opacity: f32) {
    if opacity <= 0.0 || placement.determinant().abs() < 1e-12 {
        return;
    }
    let inverse = placement.inverse();
    let (sw, sh) = (source.width() as f64, source.height() as f64);
    let opacity = opacity as f64;

    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        let p = inverse * Point::new(x as f64 + 0.5, y as f64 + 0.5);
        if p.x < 0.0 || p.y < 0.0 || p.x >= sw || p.y >= sh {
            continue;
        }
        let [r, g, b, a] = sample_bilinear(source, p.x, p.y);
        blend_premultiplied(pixel, [r, g, b], a, opacity);
    }
}

/// Premultiplied RGBA in `[0, 1]` at a continuous source position.
fn sample_bilinear(source: &RgbaImage, x: f64, y: f64) -> [f64; 4] {
    let max_x = (source.width() - 1) as f64;
    let max_y = (source.height() - 1) as f64;
    let x = (x - 0.5).clamp(0.0, max_x);
    let y = (y - 0.5).clamp(0.0, max_y);

    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let x0 = x0 as u32;
    let y0 = y0 as u32;
    let x1 = (x0 + 1).min(source.width() - 1);
    let y1 = (y0 + 1).min(source.height() - 1);

    let mut out = [0.0; 4];
    for (px, py, weight) in [
        (x0, y0, (1.0 - fx) * (1.0 - fy)),
        (x1, y0, fx * (1.0 - fy)),
        (x0, y1, (1.0 - fx) * fy),
        (x1, y1, fx * fy),
    ] {
        let Rgba([r, g, b, a]) = *source.get_pixel(px, py);
        let alpha = a as f64 / 255.0;
        out[0] += weight * alpha * r as f64 / 255.0;
        out[1] += weight * alpha * g as f64 / 255.0;
        out[2] += weight * alpha * b as f64 / 255.0;
        out[3] += weight * alpha;
    }
    out
}

fn blend_premultiplied(pixel: &mut Rgba<u8>, rgb: [f64; 3], alpha: f64, opacity: f64) {
    let coverage = alpha * opacity;
    for channel in 0..3 {
        let dst = pixel[channel] as f64 / 255.0;
        let out = rgb[channel] * opacity + dst * (1.0 - coverage);
        pixel[channel] = (out.clamp(0.0, 1.0) * 255.0).round() as u8;
    }
    pixel[3] = 255;
}

fn blend_pixmap(canvas: &mut RgbaImage, pixmap: &tiny_skia::Pixmap, opacity: f32) {
    let opacity = opacity as f64;
    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        let Some(src) = pixmap.pixel(x, y) else {
            continue;
        };
        if src.alpha() == 0 {
            continue;
        }
        let rgb = [
            src.red() as f64 / 255.0,
            src.green() as f64 / 255.0,
            src.blue() as f64 / 255.0,
        ];
        blend_premultiplied(pixel, rgb, src.alpha() as f64 / 255.0, opacity);
    }
}

/// Encode a canvas as PNG bytes.
pub fn encode_png(canvas: &RgbaImage) -> LapseResult<Vec<u8>> {
    let mut png = Vec::new();
    canvas
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| LapseError::rasterize(format!("Failed to encode PNG: {e}")))?;
    Ok(png)
}
