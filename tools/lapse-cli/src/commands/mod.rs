pub mod add;
pub mod align;
pub mod bundle;
pub mod check;
pub mod export;
pub mod frame;
pub mod info;
pub mod init;
pub mod preview;

use lapse_common::config::AppConfig;
use lapse_project_model::{DirectoryStore, FrameId, PlaybackSpeed, Project, ProjectId, ProjectStore};

/// Store rooted at the configured projects directory.
pub fn open_store(config: &AppConfig) -> DirectoryStore {
    DirectoryStore::new(&config.projects_dir)
}

/// Playback speed from `--speed`, else from the config.
pub fn playback_speed(config: &AppConfig, requested: Option<&str>) -> anyhow::Result<PlaybackSpeed> {
    let key = requested.unwrap_or(&config.editor.playback_speed);
    Ok(key.parse()?)
}

/// Find a project by id, or by name when the name is unique.
pub fn resolve_project(store: &DirectoryStore, key: &str) -> anyhow::Result<Project> {
    if let Ok(project) = store.load_project(&ProjectId::from(key)) {
        return Ok(project);
    }

    let mut matches: Vec<Project> = store
        .list_projects()
        .map_err(|e| anyhow::anyhow!("Failed to list projects: {e}"))?
        .into_iter()
        .filter(|p| p.name == key)
        .collect();

    match matches.len() {
        0 => Err(anyhow::anyhow!(
            "No project '{key}' in {}",
            store.root().display()
        )),
        1 => Ok(matches.remove(0)),
        n => Err(anyhow::anyhow!(
            "{n} projects are named '{key}'; use the project id instead"
        )),
    }
}

/// Find a frame by id, or by 1-based position in the sequence.
pub fn resolve_frame(project: &Project, key: &str) -> anyhow::Result<(usize, FrameId)> {
    if let Some(index) = project.frame_index(&FrameId::from(key)) {
        return Ok((index, project.frames[index].id.clone()));
    }
    if let Ok(position) = key.parse::<usize>() {
        if position >= 1 && position <= project.frames.len() {
            let index = position - 1;
            return Ok((index, project.frames[index].id.clone()));
        }
    }
    Err(anyhow::anyhow!(
        "No frame '{key}' in project '{}' ({} frames)",
        project.name,
        project.frames.len()
    ))
}
