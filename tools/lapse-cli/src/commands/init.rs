//! Create a new Lapse project.

use lapse_common::config::AppConfig;
use lapse_project_model::ProjectStore;

use super::open_store;

pub fn run(config: &AppConfig, name: String) -> anyhow::Result<()> {
    let store = open_store(config);
    let project = store
        .create_project(&name)
        .map_err(|e| anyhow::anyhow!("Failed to create project: {e}"))?;

    println!("Project created successfully:");
    println!("  Name: {}", project.name);
    println!("  ID: {}", project.id);
    println!("  Directory: {}", store.project_dir(&project.id).display());
    println!();
    println!("Add photos with: lapse add {} <IMAGES>...", project.id);

    Ok(())
}
