//! Append photos to a project.

use std::path::PathBuf;

use lapse_common::config::AppConfig;
use lapse_project_model::{Frame, ImageSource, ProjectStore};

use super::{open_store, resolve_project};

pub fn run(config: &AppConfig, project: String, images: Vec<PathBuf>) -> anyhow::Result<()> {
    let store = open_store(config);
    let project = resolve_project(&store, &project)?;

    for path in &images {
        if !path.is_file() {
            anyhow::bail!("Image not found: {}", path.display());
        }
    }

    let start = project.frames.len();
    for (offset, path) in images.iter().enumerate() {
        let frame_id = store
            .add_frame(&project.id, Frame::new(ImageSource::file(path)))
            .map_err(|e| anyhow::anyhow!("Failed to add {}: {e}", path.display()))?;
        println!("  #{:<3} {}  ({})", start + offset + 1, frame_id, path.display());
    }

    println!("Added {} frame(s) to '{}'", images.len(), project.name);
    Ok(())
}
