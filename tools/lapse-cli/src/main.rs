//! Lapse CLI: build, align and export photo timelapses.
//!
//! Usage:
//!   lapse init <NAME>                 Create a new project
//!   lapse add <PROJECT> <IMAGES>...   Append photos as frames
//!   lapse info <PROJECT>              Show project information
//!   lapse align <PROJECT> <FRAME>     Pan, zoom or rotate a frame
//!   lapse frame <PROJECT> <FRAME>     Edit caption, visibility, order or flip
//!   lapse preview <PROJECT> <FRAME>   Render the editing view to PNG
//!   lapse export <PROJECT>            Export the project to MP4
//!   lapse import <BUNDLE>             Import a project bundle
//!   lapse pack <PROJECT>              Write a project bundle
//!   lapse check                       Check system capabilities

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use lapse_project_model::FlipAxis;

mod commands;

#[derive(Parser)]
#[command(
    name = "lapse",
    about = "Align photos into a timelapse and export it as video",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory holding projects (overrides config)
    #[arg(long, global = true)]
    projects_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new empty project
    Init {
        /// Project name
        name: String,
    },

    /// Append photos to a project as frames
    Add {
        /// Project id or name
        project: String,

        /// Image files, in order
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },

    /// Show project information
    Info {
        /// Project id or name
        project: String,

        /// Print the project as JSON
        #[arg(long)]
        json: bool,
    },

    /// Pan, zoom or rotate one frame
    Align {
        /// Project id or name
        project: String,

        /// Frame id or 1-based position
        frame: String,

        /// Drag by a pixel delta in the export container, e.g. `12,-30`
        #[arg(long, value_parser = commands::align::parse_delta, allow_hyphen_values = true)]
        drag: Option<(f64, f64)>,

        /// Horizontal position as a fraction of container width
        #[arg(long, allow_hyphen_values = true)]
        x: Option<f64>,

        /// Vertical position as a fraction of container height
        #[arg(long, allow_hyphen_values = true)]
        y: Option<f64>,

        /// Zoom factor [0.5, 3.0]
        #[arg(long)]
        scale: Option<f64>,

        /// Rotation in degrees [-180, 180]
        #[arg(long, allow_hyphen_values = true)]
        rotation: Option<f64>,

        /// Zoom in by N steps
        #[arg(long, default_value = "0")]
        zoom_in: u32,

        /// Zoom out by N steps
        #[arg(long, default_value = "0")]
        zoom_out: u32,

        /// Rotate clockwise by N degrees
        #[arg(long, default_value = "0")]
        rotate_cw: u32,

        /// Rotate counterclockwise by N degrees
        #[arg(long, default_value = "0")]
        rotate_ccw: u32,

        /// Reset to the untouched placement first
        #[arg(long)]
        reset: bool,
    },

    /// Edit caption, visibility, position or orientation of one frame
    Frame {
        /// Project id or name
        project: String,

        /// Frame id or 1-based position
        frame: String,

        /// Caption text (empty to clear)
        #[arg(long)]
        caption: Option<String>,

        /// Hide the frame from playback and export
        #[arg(long, conflicts_with = "show")]
        hide: bool,

        /// Show a hidden frame again
        #[arg(long)]
        show: bool,

        /// Move the frame to a 1-based position
        #[arg(long)]
        move_to: Option<usize>,

        /// Mirror the frame's image: horizontal or vertical
        #[arg(long)]
        flip: Option<FlipAxis>,

        /// Remove the frame from the project
        #[arg(long, conflicts_with_all = ["caption", "hide", "show", "move_to", "flip"])]
        remove: bool,
    },

    /// Render the editing view of a frame (with ghost) to PNG
    Preview {
        /// Project id or name
        project: String,

        /// Frame id or 1-based position
        frame: String,

        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,

        /// Do not draw the previous frame as a ghost
        #[arg(long)]
        no_ghost: bool,
    },

    /// Export the visible frames to MP4
    Export {
        /// Project id or name
        project: String,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Playback speed: 1x, 2x, 3x, 4x
        #[arg(long)]
        speed: Option<String>,
    },

    /// Import a project bundle (.json)
    Import {
        /// Path to the bundle
        path: PathBuf,
    },

    /// Write a project bundle (.json) with images inlined
    Pack {
        /// Project id or name
        project: String,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check system capabilities
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = lapse_common::config::AppConfig::load();
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    if let Some(dir) = cli.projects_dir {
        config.projects_dir = dir;
    }
    lapse_common::logging::init_logging(&config.logging);
    tracing::debug!(projects_dir = %config.projects_dir.display(), "Loaded configuration");

    match cli.command {
        Commands::Init { name } => commands::init::run(&config, name),
        Commands::Add { project, images } => commands::add::run(&config, project, images),
        Commands::Info { project, json } => commands::info::run(&config, project, json),
        Commands::Align {
            project,
            frame,
            drag,
            x,
            y,
            scale,
            rotation,
            zoom_in,
            zoom_out,
            rotate_cw,
            rotate_ccw,
            reset,
        } => commands::align::run(
            &config,
            project,
            frame,
            commands::align::AlignArgs {
                drag,
                x,
                y,
                scale,
                rotation,
                zoom_in,
                zoom_out,
                rotate_cw,
                rotate_ccw,
                reset,
            },
        ),
        Commands::Frame {
            project,
            frame,
            caption,
            hide,
            show,
            move_to,
            flip,
            remove,
        } => commands::frame::run(
            &config,
            project,
            frame,
            commands::frame::FrameArgs {
                caption,
                hidden: match (hide, show) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
                move_to,
                flip,
                remove,
            },
        ),
        Commands::Preview {
            project,
            frame,
            output,
            no_ghost,
        } => commands::preview::run(&config, project, frame, output, no_ghost),
        Commands::Export {
            project,
            output,
            speed,
        } => commands::export::run(&config, project, output, speed).await,
        Commands::Import { path } => commands::bundle::import(&config, path),
        Commands::Pack { project, output } => commands::bundle::pack(&config, project, output),
        Commands::Check => commands::check::run(&config),
    }
}
