//! Concat demuxer manifest.
//!
//! ```text
//! file 'frame-0.png'
//! duration 0.5
//! file 'frame-1.png'
//! duration 0.5
//! file 'frame-1.png'
//! ```
//!
//! The demuxer ignores the duration of the final entry, so the last file is
//! listed once more to make its duration count.

/// Name of the manifest inside the engine file space.
pub const MANIFEST_FILE: &str = "input.txt";

/// File name of the frame at `index`.
pub fn frame_file_name(index: usize) -> String {
    format!("frame-{index}.png")
}

/// One manifest entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestEntry {
    pub file_name: String,
    pub duration_ms: u32,
}

/// Build the manifest text. Empty input yields an empty manifest.
pub fn build_manifest(entries: &[ManifestEntry]) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(entries.len() * 2 + 1);
    for entry in entries {
        lines.push(format!("file '{}'", entry.file_name));
        lines.push(format!("duration {}", entry.duration_ms as f64 / 1000.0));
    }
    if let Some(last) = entries.last() {
        lines.push(format!("file '{}'", last.file_name));
    }
    lines.join("\n")
}
