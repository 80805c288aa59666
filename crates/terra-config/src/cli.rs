//! Command-line overrides.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Terra command-line arguments.
///
/// Values given here override `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "terra", about = "Cube-sphere planet LOD fly-through")]
pub struct CliArgs {
    /// Planet radius in meters.
    #[arg(long)]
    pub radius: Option<f64>,

    /// Grid cells per chunk edge.
    #[arg(long)]
    pub resolution: Option<u32>,

    /// Smallest node size in meters.
    #[arg(long)]
    pub min_node_size: Option<f64>,

    /// Split distance in node half-sizes.
    #[arg(long)]
    pub split_threshold: Option<f64>,

    /// Mesh worker threads (0 = inline).
    #[arg(long)]
    pub workers: Option<usize>,

    /// Frames for the descent.
    #[arg(long)]
    pub frames: Option<u32>,

    /// Upload meshes to a headless GPU device.
    #[arg(long)]
    pub gpu: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(radius) = args.radius {
            self.planet.radius_m = radius;
        }
        if let Some(resolution) = args.resolution {
            self.planet.resolution = resolution;
        }
        if let Some(size) = args.min_node_size {
            self.planet.min_node_size_m = size;
        }
        if let Some(threshold) = args.split_threshold {
            self.planet.split_threshold = threshold;
        }
        if let Some(threads) = args.workers {
            self.workers.threads = threads;
        }
        if let Some(frames) = args.frames {
            self.flight.frames = frames;
        }
        if args.gpu {
            self.render.gpu = true;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
