//! Caption overlay rendered through SVG text.
//!
//! Captions are laid out as an SVG document sized to the container and
//! rasterized with `resvg`, so text shaping and font fallback come from the
//! system font database.

use std::sync::Arc;

use lapse_common::error::{LapseError, LapseResult};
use resvg::tiny_skia;

/// Caption font size in container pixels.
pub const CAPTION_FONT_SIZE: f64 = 20.0;
/// Gap between the caption baseline area and the container bottom.
pub const CAPTION_BOTTOM_INSET: f64 = 8.0;

/// Rasterizes caption text for a fixed font database.
pub struct CaptionRenderer {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl CaptionRenderer {
    /// Renderer backed by the system fonts.
    pub fn new() -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        tracing::debug!(faces = db.faces().count(), "Loaded caption fonts");
        Self {
            fontdb: Arc::new(db),
        }
    }

    /// Render `text` into a transparent, premultiplied pixmap of the container size.
    ///
    /// Returns `None` for blank text.
    pub fn render(&self, text: &str, width: u32, height: u32) -> LapseResult<Option<tiny_skia::Pixmap>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let svg = caption_svg(text, width, height);
        let options = usvg::Options {
            fontdb: self.fontdb.clone(),
            ..Default::default()
        };
        let tree = usvg::Tree::from_str(&svg, &options)
            .map_err(|e| LapseError::rasterize(format!("Failed to lay out caption: {e}")))?;

        let mut pixmap = tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| LapseError::rasterize("Failed to allocate caption pixmap"))?;
        resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());
        Ok(Some(pixmap))
    }
}

impl Default for CaptionRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// SVG markup for a caption: white bold text centered near the bottom with a
/// dark drop shadow.
pub fn caption_svg(text: &str, width: u32, height: u32) -> String {
    let escaped = escape_xml(text);
    let x = width as f64 / 2.0;
    let y = height as f64 - CAPTION_BOTTOM_INSET - CAPTION_FONT_SIZE * 0.3;
    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            r#"<g font-family="sans-serif" font-weight="bold" font-size="{size}" text-anchor="middle">"#,
            r#"<text x="{sx}" y="{sy}" fill="black" fill-opacity="0.8">{text}</text>"#,
            r#"<text x="{x}" y="{y}" fill="white">{text}</text>"#,
            "</g></svg>"
        ),
        w = width,
        h = height,
        size = CAPTION_FONT_SIZE,
        sx = x + 1.0,
        sy = y + 2.0,
        x = x,
        y = y,
        text = escaped,
    )
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if c.is_control() => out.push(' '),
            c => out.push(c),
        }
    }
    out
}
