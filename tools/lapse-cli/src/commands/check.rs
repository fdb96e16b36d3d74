//! Check system capabilities.

use lapse_common::config::{config_file_path, AppConfig};
use lapse_render_engine::engine::binary_runs;

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Lapse System Check");
    println!("{}", "=".repeat(50));

    let mut ready = true;

    let ffmpeg = &config.export.ffmpeg_binary;
    if binary_runs(ffmpeg) {
        println!("[OK] Encoder: {}", ffmpeg.display());
    } else {
        println!("[FAIL] Encoder not runnable: {}", ffmpeg.display());
        println!("       Install ffmpeg or set export.ffmpeg_binary");
        ready = false;
    }

    let config_path = config_file_path();
    if config_path.exists() {
        println!("[OK] Config: {}", config_path.display());
    } else {
        println!("[INFO] Config: defaults ({} not found)", config_path.display());
    }

    let projects_dir = &config.projects_dir;
    match std::fs::create_dir_all(projects_dir) {
        Ok(()) => println!("[OK] Projects directory: {}", projects_dir.display()),
        Err(e) => {
            println!("[FAIL] Projects directory {}: {e}", projects_dir.display());
            ready = false;
        }
    }

    println!(
        "[OK] Export container: {}x{} (stabilization: {:?})",
        config.export.container_width, config.export.container_height, config.export.stabilization
    );

    println!();
    if ready {
        println!("All required capabilities are available. Lapse is ready.");
    } else {
        println!("Some required capabilities are missing. See above for fixes.");
    }

    Ok(())
}
