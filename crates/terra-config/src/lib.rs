//! Configuration for Terra planets and the demo fly-through.
//!
//! Settings persist to disk as `config.ron`; missing sections and fields fall
//! back to defaults and unknown fields are ignored, so old files keep loading.
//! Command-line flags override the loaded values.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CONFIG_FILE_NAME, Config, DebugConfig, FlightConfig, LifecycleConfig, PlanetConfig,
    RenderConfig, TerrainConfig, WorkerConfig,
};
pub use error::ConfigError;
