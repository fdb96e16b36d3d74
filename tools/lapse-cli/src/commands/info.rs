//! Show project information.

use lapse_common::config::AppConfig;

use super::{open_store, resolve_project};

pub fn run(config: &AppConfig, project: String, json: bool) -> anyhow::Result<()> {
    let store = open_store(config);
    let p = resolve_project(&store, &project)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&p)?);
        return Ok(());
    }

    println!("Project: {}", p.name);
    println!("  ID: {}", p.id);
    println!("  Created: {}", p.created_at);
    println!("  Modified: {}", p.modified_at);
    println!("  Directory: {}", store.project_dir(&p.id).display());
    println!();

    let visible = p.visible_frames().count();
    println!("Frames: {} ({} visible)", p.frames.len(), visible);
    for (index, frame) in p.frames.iter().enumerate() {
        let t = &frame.transform;
        println!(
            "  #{:<3} {}  x={:+.3} y={:+.3} scale={:.2} rot={:+.0}°{}{}",
            index + 1,
            frame.id,
            t.position_x,
            t.position_y,
            t.scale,
            t.rotation_deg,
            if frame.hidden { "  [hidden]" } else { "" },
            frame
                .caption_text()
                .map(|c| format!("  \"{c}\""))
                .unwrap_or_default(),
        );
    }

    Ok(())
}
