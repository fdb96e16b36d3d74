//! Pan, zoom or rotate one frame.

use std::sync::Arc;

use lapse_alignment::AlignmentController;
use lapse_common::config::AppConfig;
use lapse_project_model::{ContainerSize, PixelOffset};

use super::{open_store, resolve_frame, resolve_project};

/// Requested alignment changes, applied in field order.
pub struct AlignArgs {
    pub drag: Option<(f64, f64)>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub scale: Option<f64>,
    pub rotation: Option<f64>,
    pub zoom_in: u32,
    pub zoom_out: u32,
    pub rotate_cw: u32,
    pub rotate_ccw: u32,
    pub reset: bool,
}

/// Parse a `DX,DY` pixel delta.
pub fn parse_delta(value: &str) -> Result<(f64, f64), String> {
    let (dx, dy) = value
        .split_once(',')
        .ok_or_else(|| format!("expected DX,DY, got '{value}'"))?;
    let dx = dx.trim().parse::<f64>().map_err(|e| format!("bad DX: {e}"))?;
    let dy = dy.trim().parse::<f64>().map_err(|e| format!("bad DY: {e}"))?;
    Ok((dx, dy))
}

pub fn run(config: &AppConfig, project: String, frame: String, args: AlignArgs) -> anyhow::Result<()> {
    let store = Arc::new(open_store(config));
    let project = resolve_project(&store, &project)?;
    let (index, frame_id) = resolve_frame(&project, &frame)?;

    let mut controller = AlignmentController::open(store, project.id.clone(), frame_id.clone())?;
    let container = ContainerSize::new(
        config.export.container_width as f64,
        config.export.container_height as f64,
    );
    controller.measure(container);

    if args.reset {
        controller.reset();
    }

    if args.drag.is_some() || args.x.is_some() || args.y.is_some() {
        controller.begin_drag()?;
        if let Some((dx, dy)) = args.drag {
            controller.drag_by(dx, dy)?;
        }
        if args.x.is_some() || args.y.is_some() {
            let current = controller.offset();
            let target = PixelOffset::new(
                args.x.map_or(current.x, |x| x * container.width),
                args.y.map_or(current.y, |y| y * container.height),
            );
            controller.drag_to(target)?;
        }
        controller.end_drag();
    }

    if let Some(scale) = args.scale {
        controller.set_scale(scale);
    }
    if let Some(rotation) = args.rotation {
        controller.set_rotation(rotation);
    }
    for _ in 0..args.zoom_in {
        controller.zoom_in();
    }
    for _ in 0..args.zoom_out {
        controller.zoom_out();
    }
    for _ in 0..args.rotate_cw {
        controller.rotate_clockwise();
    }
    for _ in 0..args.rotate_ccw {
        controller.rotate_counterclockwise();
    }

    let t = controller.transform();
    let offset = controller.offset();
    println!("Frame #{} ({})", index + 1, frame_id);
    println!("  Position: x={:+.4} y={:+.4}", t.position_x, t.position_y);
    println!(
        "  Offset: {:+.1}px, {:+.1}px in {}x{}",
        offset.x, offset.y, container.width, container.height
    );
    println!("  Scale: {:.2}", t.scale);
    println!("  Rotation: {:+.1}°", t.rotation_deg);

    Ok(())
}
