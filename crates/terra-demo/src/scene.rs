//! Planet parameters and generators built from configuration.

use terra_config::Config;
use terra_math::DVec3;
use terra_mesh::Generators;
use terra_planet::PlanetParams;
use terra_terrain::{AltitudeColorRamp, MoonTerrain, MoonTerrainParams, TerrainError};

pub fn planet_params(config: &Config) -> PlanetParams {
    let planet = &config.planet;
    let mut params = PlanetParams::new(
        planet.radius_m,
        planet.min_node_size_m,
        planet.resolution,
        DVec3::from_array(planet.origin),
        planet.split_threshold,
    )
    .with_inverted(planet.inverted)
    .with_workers(config.workers.threads)
    .with_max_chunks(config.lifecycle.max_chunks)
    .with_pool_capacity(config.lifecycle.pool_capacity);
    params.queue_budget = config.workers.queue_budget;
    params
}

/// Lunar height and color, or a bare sphere when terrain is disabled.
pub fn generators(config: &Config) -> Result<Generators, TerrainError> {
    let terrain = &config.terrain;
    if !terrain.enabled {
        return Ok(Generators::new());
    }

    let moon = MoonTerrain::new(MoonTerrainParams {
        seed: terrain.seed,
        frequency: terrain.frequency,
        amplitude: terrain.amplitude,
        crater_density: terrain.crater_density,
    });
    let relief = config.planet.radius_m * terrain.amplitude;
    let generators = Generators::new().with_height(moon);
    if relief > 0.0 {
        Ok(generators.with_color(AltitudeColorRamp::lunar(relief)?))
    } else {
        Ok(generators)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_carry_every_section() {
        let mut config = Config::default();
        config.planet.origin = [1.0, 2.0, 3.0];
        config.planet.inverted = true;
        config.workers.threads = 3;
        config.workers.queue_budget = 7;
        config.lifecycle.max_chunks = None;
        config.lifecycle.pool_capacity = 11;

        let params = planet_params(&config);
        assert_eq!(params.radius, config.planet.radius_m);
        assert_eq!(params.resolution, 32);
        assert_eq!(params.origin, DVec3::new(1.0, 2.0, 3.0));
        assert!(params.inverted);
        assert_eq!(params.worker_threads, 3);
        assert_eq!(params.queue_budget, 7);
        assert_eq!(params.max_chunks, None);
        assert_eq!(params.pool_capacity, 11);
    }

    #[test]
    fn test_default_config_builds_valid_params() {
        planet_params(&Config::default()).validate().unwrap();
    }

    #[test]
    fn test_terrain_generators() {
        let config = Config::default();
        let generators = generators(&config).unwrap();
        assert!(generators.height.is_some());
        assert!(generators.color.is_some());

        let radius = config.planet.radius_m;
        let height = generators.sample_height(DVec3::new(0.0, radius, 0.0), radius).unwrap();
        assert!(height.abs() <= radius * config.terrain.amplitude * MoonTerrain::relief_bound());
    }

    #[test]
    fn test_disabled_terrain_is_smooth() {
        let mut config = Config::default();
        config.terrain.enabled = false;
        let generators = generators(&config).unwrap();
        assert!(generators.height.is_none());
        assert!(generators.color.is_none());
    }

    #[test]
    fn test_flat_terrain_skips_color_ramp() {
        let mut config = Config::default();
        config.terrain.amplitude = 0.0;
        let generators = generators(&config).unwrap();
        assert!(generators.height.is_some());
        assert!(generators.color.is_none());
    }
}
