//! Export a project to video.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use lapse_common::config::AppConfig;
use lapse_render_engine::{
    ExportOrchestrator, ExportProgress, ExportState, FfmpegEngine, OffscreenSurface,
};

use super::{open_store, playback_speed, resolve_project};

pub async fn run(
    config: &AppConfig,
    project: String,
    output: Option<PathBuf>,
    speed: Option<String>,
) -> anyhow::Result<()> {
    let store = Arc::new(open_store(config));
    let project = resolve_project(&store, &project)?;

    let speed = playback_speed(config, speed.as_deref())?;
    let output_path = output.unwrap_or_else(|| PathBuf::from(lapse_render_engine::assembler::VIDEO_FILE_NAME));

    let engine = FfmpegEngine::new(&config.export.ffmpeg_binary)?;
    if !engine.is_available() {
        anyhow::bail!(
            "Encoder '{}' not found. Install ffmpeg or set export.ffmpeg_binary in {}",
            config.export.ffmpeg_binary.display(),
            lapse_common::config::config_file_path().display()
        );
    }
    let surface = OffscreenSurface::new(config.export.container_width, config.export.container_height);

    println!("Exporting '{}'", project.name);
    println!("  Frames: {} visible", project.visible_frames().count());
    println!("  Speed: {} ({} ms per frame)", speed, speed.frame_duration_ms());
    println!("  Output: {}", output_path.display());

    let progress_cb: Box<dyn Fn(ExportProgress) + Send + Sync> = Box::new(|p| {
        match p.stage {
            ExportState::Capturing => print!(
                "\r  Capturing: {}/{} frames  ",
                p.frames_captured, p.total_frames
            ),
            ExportState::Encoding => print!("\r  Encoding {} frames...     ", p.total_frames),
            _ => {}
        }
        let _ = std::io::stdout().flush();
    });

    let orchestrator = ExportOrchestrator::new(store, surface, engine)
        .with_config(&config.export)
        .with_progress(progress_cb);

    match orchestrator.run_export(&project.id, speed).await {
        Ok(artifact) => {
            artifact.write_to(&output_path)?;
            println!(
                "\nExport complete: {} ({} bytes, {})",
                output_path.display(),
                artifact.bytes.len(),
                artifact.mime
            );
            Ok(())
        }
        Err(e) => {
            println!("\nExport failed: {e}");
            Err(e.into())
        }
    }
}
