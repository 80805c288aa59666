//! Configuration sections, defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const CONFIG_FILE_NAME: &str = "config.ron";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub planet: PlanetConfig,
    pub workers: WorkerConfig,
    pub lifecycle: LifecycleConfig,
    pub terrain: TerrainConfig,
    pub render: RenderConfig,
    pub debug: DebugConfig,
    /// Demo camera path.
    pub flight: FlightConfig,
}

/// Planet geometry and LOD.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlanetConfig {
    /// Sphere radius in meters.
    pub radius_m: f64,
    /// Nodes this small never split.
    pub min_node_size_m: f64,
    /// Grid cells per chunk edge.
    pub resolution: u32,
    /// Split when closer than `split_threshold × half_size`.
    pub split_threshold: f64,
    /// Render the surface from inside the sphere.
    pub inverted: bool,
    /// Planet center in world space.
    pub origin: [f64; 3],
}

/// Background mesh generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkerConfig {
    /// Worker threads; 0 meshes inline on the update thread.
    pub threads: usize,
    /// Maximum chunks queued or in progress.
    pub queue_budget: usize,
}

/// Chunk residency limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Retired chunks kept for reuse.
    pub pool_capacity: usize,
    /// Resident chunk cap (`None` = unbounded).
    pub max_chunks: Option<usize>,
}

/// Lunar terrain generator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    /// Smooth sphere when disabled.
    pub enabled: bool,
    pub seed: u32,
    pub frequency: f64,
    /// Peak relief as a fraction of the radius.
    pub amplitude: f64,
    /// Fraction of crater cells holding a crater (0.0 - 1.0).
    pub crater_density: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Upload meshes to a headless GPU device instead of counting bytes.
    pub gpu: bool,
    /// Cap on GPU mesh memory in MiB (`None` = unbounded).
    pub gpu_memory_budget_mib: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Filter directive, e.g. "info" or "debug,terra_planet=trace".
    pub log_level: String,
    /// Log a report line every this many frames (0 = never).
    pub report_interval: u32,
}

/// Straight descent from orbit to the surface and back out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FlightConfig {
    /// Starting distance from the center, in radii.
    pub start_altitude_factor: f64,
    /// Closest distance from the center, in radii.
    pub end_altitude_factor: f64,
    /// Frames for the descent; the climb takes as many again.
    pub frames: u32,
    /// Direction of travel from the planet center.
    pub direction: [f64; 3],
}

impl Default for PlanetConfig {
    fn default() -> Self {
        Self {
            radius_m: 1_737_400.0,
            min_node_size_m: 1_000.0,
            resolution: 32,
            split_threshold: 1.25,
            inverted: false,
            origin: [0.0; 3],
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            threads: 2,
            queue_budget: 64,
        }
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            pool_capacity: 256,
            max_chunks: Some(4096),
        }
    }
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            seed: 0,
            frequency: 12.0,
            amplitude: 0.003,
            crater_density: 1.0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            report_interval: 10,
        }
    }
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            start_altitude_factor: 4.0,
            end_altitude_factor: 1.002,
            frames: 120,
            direction: [0.3, 0.4, 1.0],
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.into(),
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be finite and > 0, got {value}")))
    }
}

impl Config {
    /// Platform config directory for Terra, e.g. `~/.config/terra`.
    pub fn default_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join("terra"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let config = Self::read(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        ron::from_str(&contents).map_err(ConfigError::ParseError)
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);
        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(config_dir.join(CONFIG_FILE_NAME), serialized)
            .map_err(ConfigError::WriteError)
    }

    /// Re-read the file. `Some` only when it differs from `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = Self::read(&config_dir.join(CONFIG_FILE_NAME))?;
        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    /// Range checks that do not need the engine. The planet repeats the
    /// LOD checks when it is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let planet = &self.planet;
        positive("planet.radius_m", planet.radius_m)?;
        positive("planet.min_node_size_m", planet.min_node_size_m)?;
        positive("planet.split_threshold", planet.split_threshold)?;
        if planet.resolution == 0 {
            return Err(invalid("planet.resolution", "must be at least 1"));
        }
        if planet.origin.iter().any(|c| !c.is_finite()) {
            return Err(invalid("planet.origin", "must be finite"));
        }

        if self.workers.threads > 0 && self.workers.queue_budget == 0 {
            return Err(invalid(
                "workers.queue_budget",
                "must be > 0 when worker threads are enabled",
            ));
        }

        if let Some(max) = self.lifecycle.max_chunks
            && max < 6
        {
            return Err(invalid("lifecycle.max_chunks", "must be at least 6"));
        }

        let terrain = &self.terrain;
        positive("terrain.frequency", terrain.frequency)?;
        if !(terrain.amplitude.is_finite() && terrain.amplitude >= 0.0) {
            return Err(invalid("terrain.amplitude", "must be finite and >= 0"));
        }
        if !(0.0..=1.0).contains(&terrain.crater_density) {
            return Err(invalid("terrain.crater_density", "must be within 0.0 - 1.0"));
        }

        let flight = &self.flight;
        positive("flight.start_altitude_factor", flight.start_altitude_factor)?;
        positive("flight.end_altitude_factor", flight.end_altitude_factor)?;
        if flight.frames == 0 {
            return Err(invalid("flight.frames", "must be at least 1"));
        }
        let length = flight.direction.iter().map(|c| c * c).sum::<f64>().sqrt();
        if !(length.is_finite() && length > 0.0) {
            return Err(invalid("flight.direction", "must be a finite non-zero vector"));
        }
        Ok(())
    }
}
