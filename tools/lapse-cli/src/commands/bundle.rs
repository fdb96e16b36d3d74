//! Import and write single-file project bundles.

use std::path::PathBuf;

use lapse_common::config::AppConfig;
use lapse_project_model::{Bundle, ProjectStore};

use super::{open_store, resolve_project};

pub fn import(config: &AppConfig, path: PathBuf) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(&path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?;
    let project = Bundle::from_json(&json)
        .and_then(Bundle::into_project)
        .map_err(|e| anyhow::anyhow!("Unable to validate imported project file: {e}"))?;

    let store = open_store(config);
    store.save_project(&project)?;

    println!("Project {} imported.", project.name);
    println!("  ID: {}", project.id);
    println!("  Frames: {}", project.frames.len());
    Ok(())
}

pub fn pack(config: &AppConfig, project: String, output: Option<PathBuf>) -> anyhow::Result<()> {
    let store = open_store(config);
    let project = resolve_project(&store, &project)?;

    let json = Bundle::from_project(&project)?.to_json()?;
    let output = output.unwrap_or_else(|| PathBuf::from(format!("{}.json", project.name)));
    std::fs::write(&output, json)?;

    println!("Wrote bundle for '{}' to {}", project.name, output.display());
    Ok(())
}
