//! Render the editing view of one frame to PNG.

use std::path::PathBuf;

use lapse_common::config::AppConfig;
use lapse_project_model::EditorSettings;
use lapse_render_engine::compositor::{Compositor, FrameComposition};

use super::{open_store, playback_speed, resolve_frame, resolve_project};

pub fn run(
    config: &AppConfig,
    project: String,
    frame: String,
    output: PathBuf,
    no_ghost: bool,
) -> anyhow::Result<()> {
    let settings = EditorSettings {
        ghost: config.editor.ghost && !no_ghost,
        playback_speed: playback_speed(config, None)?,
    };

    let store = open_store(config);
    let project = resolve_project(&store, &project)?;
    let (index, frame_id) = resolve_frame(&project, &frame)?;

    let composition = FrameComposition::for_editing(&project.frames, index, &settings)
        .ok_or_else(|| anyhow::anyhow!("Frame {frame_id} is no longer in the project"))?;

    let mut compositor = Compositor::new(config.export.container_width, config.export.container_height);
    let png = compositor.render_png(&composition)?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&output, png)?;

    println!("Preview of frame #{} written to {}", index + 1, output.display());
    if composition.ghost.is_some() {
        println!("  Ghost: frame #{}", index);
    }
    Ok(())
}
