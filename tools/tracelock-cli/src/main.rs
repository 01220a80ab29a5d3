//! Tracelock CLI: Command-line interface for replaying and inspecting frames.
//!
//! Usage:
//!   tracelock replay <DIR>     Run the tracker over a PNG frame sequence
//!   tracelock synth <DIR>      Write a synthetic scenario as PNG frames
//!   tracelock inspect <PNG>    Show identity and detections for one frame
//!   tracelock config           Show or initialize the app config file

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracelock_common::config::AppConfig;
use tracelock_processing_core::TrackerConfig;

mod annotate;
mod commands;
mod frames;

#[derive(Parser)]
#[command(
    name = "tracelock",
    about = "Track colored projectiles and triangulate their source",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON file with tracker tuning overrides
    #[arg(long, global = true)]
    tuning: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the tracker over a directory of PNG frames
    Replay {
        /// Directory of frames, processed in file name order
        dir: PathBuf,

        /// Write per-tick JSON lines here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write annotated copies of the frames into this directory
        #[arg(long)]
        annotate: Option<PathBuf>,

        /// Spacing between frame timestamps (ms)
        #[arg(long)]
        frame_interval_ms: Option<u64>,
    },

    /// Write a synthetic scenario as PNG frames
    Synth {
        /// Output directory
        dir: PathBuf,

        /// Number of frames
        #[arg(long, default_value = "40")]
        frames: u32,

        /// Frame width
        #[arg(long, default_value = "1000")]
        width: u32,

        /// Frame height
        #[arg(long, default_value = "800")]
        height: u32,

        /// Horizontal view scroll per frame (px)
        #[arg(long, default_value = "3", allow_hyphen_values = true)]
        scroll_x: i64,

        /// Vertical view scroll per frame (px)
        #[arg(long, default_value = "2", allow_hyphen_values = true)]
        scroll_y: i64,

        /// Color of the object at the viewport center: red|blue|purple|green
        #[arg(long, default_value = "red")]
        own: String,
    },

    /// Show identity counts and detections for one frame
    Inspect {
        /// Path to a PNG frame
        path: PathBuf,
    },

    /// Show the effective app config and where it is loaded from
    Config {
        /// Write the effective config to the config file
        #[arg(long)]
        init: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let app = AppConfig::load();
    let mut logging = app.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    tracelock_common::logging::init_logging(&logging);

    let tuning = load_tuning(cli.tuning.as_ref().or(app.replay.tuning_file.as_ref()))?;

    match cli.command {
        Commands::Replay {
            dir,
            output,
            annotate,
            frame_interval_ms,
        } => commands::replay::run(
            dir,
            output,
            annotate,
            frame_interval_ms.unwrap_or(app.replay.frame_interval_ms),
            app.replay.annotate_rays,
            tuning,
        ),
        Commands::Synth {
            dir,
            frames,
            width,
            height,
            scroll_x,
            scroll_y,
            own,
        } => commands::synth::run(dir, frames, width, height, (scroll_x, scroll_y), &own),
        Commands::Inspect { path } => commands::inspect::run(path, tuning),
        Commands::Config { init } => commands::config::run(&app, init),
    }
}

fn load_tuning(path: Option<&PathBuf>) -> anyhow::Result<TrackerConfig> {
    let Some(path) = path else {
        return Ok(TrackerConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read tuning file {}", path.display()))?;
    let config = TrackerConfig::from_json(&content)
        .with_context(|| format!("Invalid tuning file {}", path.display()))?;
    tracing::info!(path = %path.display(), "Loaded tracker tuning");
    Ok(config)
}
