//! Headless fly-through of a lunar planet.
//!
//! Loads `config.ron` (created on first run), applies CLI overrides, then
//! flies a viewpoint from orbit down to the surface and back while the
//! planet rebuilds its LOD every frame. Meshes go to a headless GPU device
//! with `--gpu`, otherwise to a CPU-side tracker. At the end every uploaded
//! mesh must have been released.
//!
//! Run with `cargo run -p terra-demo -- --frames 60 --workers 4`.

mod flight;
mod scene;

use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use terra_config::{CliArgs, Config, ConfigError};
use terra_math::DVec3;
use terra_mesh::Generators;
use terra_planet::{HeadlessUploader, MeshUploader, Planet, PlanetError, PlanetParams};
use terra_render::WgpuUploader;
use terra_terrain::TerrainError;
use tracing::{debug, info, warn};

use crate::flight::FlightPath;

/// Extra updates at the final viewpoint while worker tasks drain.
const SETTLE_FRAMES: u32 = 500;

/// Keep the viewpoint this fraction of the finest node size above ground.
const GROUND_CLEARANCE: f64 = 0.05;

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Terrain(#[from] TerrainError),

    #[error(transparent)]
    Planet(#[from] PlanetError),

    #[error("{uploader} uploader still holds {live} meshes after teardown")]
    LeakedMeshes { uploader: &'static str, live: usize },

    #[error("{0} mesh handles were released twice")]
    DoubleRelease(u64),
}

/// Totals over the whole flight.
#[derive(Debug, Default)]
struct FlightSummary {
    frames: u32,
    peak_resident: usize,
    peak_triangles: usize,
    created: usize,
    reused: usize,
    uploaded: usize,
    failed: usize,
    coarsened: usize,
    closest_altitude: f64,
    elapsed: Duration,
}

fn fly<U: MeshUploader>(
    params: PlanetParams,
    generators: Generators,
    path: &FlightPath,
    report_interval: u32,
    uploader: U,
) -> Result<FlightSummary, PlanetError> {
    let clearance = params.min_node_size * GROUND_CLEARANCE;
    let up = if params.inverted {
        -path.direction()
    } else {
        path.direction()
    };

    let mut planet = Planet::new(params, generators, uploader)?;
    let mut summary = FlightSummary {
        closest_altitude: f64::INFINITY,
        ..Default::default()
    };
    let started = Instant::now();

    let mut viewpoint = DVec3::ZERO;
    for frame in 0..path.total_frames() {
        viewpoint = path.viewpoint(frame);
        // Never fly through the terrain.
        let altitude = planet.surface_altitude(viewpoint);
        if altitude < clearance {
            viewpoint += up * (clearance - altitude);
        }
        summary.closest_altitude = summary.closest_altitude.min(altitude.max(clearance));

        let report = planet.update(viewpoint)?;
        summary.frames += 1;
        summary.peak_resident = summary.peak_resident.max(report.resident);
        summary.peak_triangles = summary.peak_triangles.max(report.triangles);
        summary.created += report.created;
        summary.reused += report.reused;
        summary.uploaded += report.uploaded;
        summary.failed += report.failed;
        summary.coarsened += report.coarsened;

        if report_interval > 0 && frame % report_interval == 0 {
            info!(
                frame,
                altitude_m = altitude,
                leaves = report.leaves,
                resident = report.resident,
                created = report.created,
                retired = report.retired,
                reused = report.reused,
                in_flight = report.in_flight,
                triangles = report.triangles,
                "Frame report"
            );
        }
    }

    for _ in 0..SETTLE_FRAMES {
        if planet.in_flight() == 0 {
            break;
        }
        std::thread::sleep(Duration::from_millis(2));
        let report = planet.update(viewpoint)?;
        summary.uploaded += report.uploaded;
        summary.failed += report.failed;
    }
    if planet.in_flight() > 0 {
        warn!(in_flight = planet.in_flight(), "Mesh workers still busy at shutdown");
    }

    debug!(
        renderable = planet.renderable_chunks().len(),
        pooled = planet.pool_len(),
        "Final planet state"
    );
    summary.elapsed = started.elapsed();
    planet.destroy();
    Ok(summary)
}

fn ensure_released(uploader: &'static str, live: usize) -> Result<(), DemoError> {
    if live > 0 {
        return Err(DemoError::LeakedMeshes { uploader, live });
    }
    Ok(())
}

fn run(config: &Config) -> Result<FlightSummary, DemoError> {
    config.validate()?;
    let params = scene::planet_params(config);
    let generators = scene::generators(config)?;
    let path = FlightPath::from_config(&config.flight, &config.planet);
    let interval = config.debug.report_interval;
    let byte_budget = config.render.gpu_memory_budget_mib.map(|mib| mib << 20);

    info!(
        radius_m = params.radius,
        resolution = params.resolution,
        workers = params.worker_threads,
        frames = path.total_frames(),
        "Starting fly-through"
    );

    if config.render.gpu {
        match terra_render::request_headless_device_blocking() {
            Ok((device, queue)) => {
                let mut uploader = WgpuUploader::new(device, queue);
                if let Some(budget) = byte_budget {
                    uploader = uploader.with_byte_budget(budget);
                }
                let summary = fly(params, generators, &path, interval, &mut uploader)?;
                ensure_released("gpu", uploader.live_count())?;
                info!(
                    pooled_bytes = uploader.pool().gpu_memory_allocated(),
                    "GPU buffers idle after teardown"
                );
                uploader.trim();
                return Ok(summary);
            }
            Err(err) => warn!(%err, "GPU unavailable; counting uploads on the CPU instead"),
        }
    }

    let mut uploader = match byte_budget {
        Some(budget) => HeadlessUploader::with_byte_budget(budget),
        None => HeadlessUploader::new(),
    };
    let summary = fly(params, generators, &path, interval, &mut uploader)?;
    ensure_released("headless", uploader.live_count())?;
    if uploader.double_release_count() > 0 {
        return Err(DemoError::DoubleRelease(uploader.double_release_count()));
    }
    info!(
        uploads = uploader.upload_count(),
        releases = uploader.release_count(),
        "Every mesh released"
    );
    Ok(summary)
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config_dir = match args.config.clone() {
        Some(dir) => dir,
        None => match Config::default_dir() {
            Ok(dir) => dir,
            Err(e) => {
                eprintln!("{e}");
                return ExitCode::FAILURE;
            }
        },
    };

    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    terra_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    match run(&config) {
        Ok(summary) => {
            info!(
                frames = summary.frames,
                peak_resident = summary.peak_resident,
                peak_triangles = summary.peak_triangles,
                created = summary.created,
                reused = summary.reused,
                uploaded = summary.uploaded,
                failed = summary.failed,
                coarsened = summary.coarsened,
                closest_altitude_m = summary.closest_altitude,
                elapsed_ms = summary.elapsed.as_millis() as u64,
                "Fly-through complete"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(%err, "Fly-through failed");
            ExitCode::FAILURE
        }
    }
}
