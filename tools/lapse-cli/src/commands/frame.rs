//! Edit caption, visibility, position or orientation of one frame.

use lapse_common::config::AppConfig;
use lapse_project_model::{FlipAxis, ProjectStore};
use lapse_render_engine::flip_frame;

use super::{open_store, resolve_frame, resolve_project};

pub struct FrameArgs {
    pub caption: Option<String>,
    pub hidden: Option<bool>,
    pub move_to: Option<usize>,
    pub flip: Option<FlipAxis>,
    pub remove: bool,
}

pub fn run(config: &AppConfig, project: String, frame: String, args: FrameArgs) -> anyhow::Result<()> {
    let store = open_store(config);
    let project = resolve_project(&store, &project)?;
    let (index, frame_id) = resolve_frame(&project, &frame)?;

    if args.remove {
        store.remove_frame(&project.id, &frame_id)?;
        println!("Removed frame #{} ({})", index + 1, frame_id);
        return Ok(());
    }

    if let Some(caption) = args.caption {
        let caption = Some(caption).filter(|c| !c.trim().is_empty());
        println!(
            "  Caption: {}",
            caption.as_deref().unwrap_or("(cleared)")
        );
        store.set_caption(&project.id, &frame_id, caption)?;
    }

    if let Some(hidden) = args.hidden {
        store.set_hidden(&project.id, &frame_id, hidden)?;
        println!("  {}", if hidden { "Hidden" } else { "Visible" });
    }

    if let Some(position) = args.move_to {
        if position == 0 {
            anyhow::bail!("Positions start at 1");
        }
        store.move_frame(&project.id, &frame_id, position - 1)?;
        println!("  Moved #{} -> #{}", index + 1, position);
    }

    if let Some(axis) = args.flip {
        flip_frame(&store, &project.id, &frame_id, axis)?;
        println!("  Flipped {axis}");
    }

    println!("Updated frame {frame_id}");
    Ok(())
}
