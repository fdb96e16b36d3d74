//! Video assembly: rasters plus durations in, one MP4 out.

use std::path::Path;

use lapse_common::error::{LapseError, LapseResult};

use crate::engine::EncodingEngine;
use crate::manifest::{build_manifest, frame_file_name, ManifestEntry, MANIFEST_FILE};

/// MIME type of the exported video.
pub const VIDEO_MIME: &str = "video/mp4";
/// Suggested download name of the exported video.
pub const VIDEO_FILE_NAME: &str = "timelapse.mp4";

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// One rasterized frame and how long it stays on screen.
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    pub png: Vec<u8>,
    pub duration_ms: u32,
}

/// Encoder parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeSettings {
    pub frame_rate: u32,
    pub codec: String,
    pub crf: u8,
    pub preset: String,
    pub tune: Option<String>,
    pub profile: String,
    pub pixel_format: String,
    pub width: u32,
    pub height: u32,
    pub pad_color: String,
    pub output_name: String,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            frame_rate: 24,
            codec: "libx264".to_string(),
            crf: 25,
            preset: "faster".to_string(),
            tune: Some("fastdecode".to_string()),
            profile: "main".to_string(),
            pixel_format: "yuv420p".to_string(),
            width: 400,
            height: 532,
            pad_color: "black".to_string(),
            output_name: "output.mp4".to_string(),
        }
    }
}

impl EncodeSettings {
    /// Scale to fit, pad to the exact output size, square pixels.
    pub fn video_filter(&self) -> String {
        format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:color={color},setsar=1",
            w = self.width,
            h = self.height,
            color = self.pad_color,
        )
    }

    /// Full encoder argument list, reading the manifest from the file space.
    pub fn args(&self) -> Vec<String> {
        let mut args: Vec<String> = [
            "-hide_banner",
            "-loglevel",
            "error",
            "-f",
            "concat",
            "-safe",
            "0",
            "-i",
            MANIFEST_FILE,
        ]
        .into_iter()
        .map(String::from)
        .collect();

        args.extend([
            "-r".to_string(),
            self.frame_rate.to_string(),
            "-c:v".to_string(),
            self.codec.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-preset".to_string(),
            self.preset.clone(),
        ]);
        if let Some(tune) = &self.tune {
            args.extend(["-tune".to_string(), tune.clone()]);
        }
        args.extend([
            "-profile:v".to_string(),
            self.profile.clone(),
            "-pix_fmt".to_string(),
            self.pixel_format.clone(),
            "-movflags".to_string(),
            "+faststart".to_string(),
            "-vf".to_string(),
            self.video_filter(),
            "-y".to_string(),
            self.output_name.clone(),
        ]);
        args
    }
}

/// The exported video.
#[derive(Debug, Clone)]
pub struct VideoArtifact {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    pub file_name: &'static str,
}

impl VideoArtifact {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime: VIDEO_MIME,
            file_name: VIDEO_FILE_NAME,
        }
    }

    /// Write the video to `path`, creating parent directories.
    pub fn write_to(&self, path: &Path) -> LapseResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, &self.bytes)?;
        Ok(())
    }
}

/// Tracks every file written to an engine and deletes them all when dropped,
/// whether assembly succeeded or not.
pub struct EngineScope<'a, E: EncodingEngine + ?Sized> {
    engine: &'a mut E,
    files: Vec<String>,
}

impl<'a, E: EncodingEngine + ?Sized> EngineScope<'a, E> {
    pub fn new(engine: &'a mut E) -> Self {
        Self {
            engine,
            files: Vec::new(),
        }
    }

    /// Mark a name for cleanup. Registered before the file exists so a
    /// partial write is still removed.
    pub fn track(&mut self, name: &str) {
        if !self.files.iter().any(|f| f == name) {
            self.files.push(name.to_string());
        }
    }

    pub fn write(&mut self, name: &str, bytes: &[u8]) -> LapseResult<()> {
        self.track(name);
        self.engine.write_file(name, bytes)
    }

    pub fn engine(&mut self) -> &mut E {
        &mut *self.engine
    }
}

impl<E: EncodingEngine + ?Sized> Drop for EngineScope<'_, E> {
    fn drop(&mut self) {
        for name in self.files.drain(..) {
            if let Err(e) = self.engine.delete_file(&name) {
                tracing::warn!(file = %name, error = %e, "Failed to clean up engine file");
            }
        }
    }
}

/// Encode `frames` in order into one video.
///
/// Empty input is rejected before the engine is touched. All transient files
/// are removed from the engine before this returns, on success or failure.
pub async fn assemble<E>(
    engine: &mut E,
    frames: &[EncodedFrame],
    settings: &EncodeSettings,
) -> LapseResult<VideoArtifact>
where
    E: EncodingEngine + ?Sized,
{
    if frames.is_empty() {
        return Err(LapseError::encode("No frames to encode"));
    }

    let mut scope = EngineScope::new(engine);
    let mut entries = Vec::with_capacity(frames.len());

    for (index, frame) in frames.iter().enumerate() {
        if !frame.png.starts_with(&PNG_SIGNATURE) {
            return Err(LapseError::encode(format!("Frame {index} is not a readable PNG")));
        }
        let file_name = frame_file_name(index);
        scope.write(&file_name, &frame.png)?;
        entries.push(ManifestEntry {
            file_name,
            duration_ms: frame.duration_ms,
        });
    }

    scope.write(MANIFEST_FILE, build_manifest(&entries).as_bytes())?;
    scope.track(&settings.output_name);

    tracing::info!(
        frames = frames.len(),
        engine = scope.engine().name(),
        "Encoding video"
    );
    tokio::task::yield_now().await;
    scope.engine().exec(&settings.args())?;

    let bytes = scope.engine().read_file(&settings.output_name)?;
    if bytes.is_empty() {
        return Err(LapseError::encode("Encoder produced an empty video"));
    }

    tracing::info!(bytes = bytes.len(), "Video assembled");
    Ok(VideoArtifact::new(bytes))
}
