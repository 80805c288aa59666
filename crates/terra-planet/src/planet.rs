//! The planet orchestrator.
//!
//! Every [`Planet::update`] builds a fresh [`CubicQuadtree`] for the
//! viewpoint, diffs its leaf keys against the resident [`ChunkTable`] and
//! swaps in the result:
//!
//! - **keep**: same chunk object, untouched;
//! - **create**: a pooled chunk (or a new one) reset to the leaf geometry;
//! - **retire**: GPU residency released, then pooled, or parked in the
//!   retiring set while a worker still holds it.
//!
//! Nothing is drawn from tree nodes. The tree is dropped before `update`
//! returns, so coarsening when the viewpoint recedes is just the absence of
//! a split.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use terra_cubesphere::{ChunkKey, CubicQuadtree};
use terra_math::{DMat4, DVec3};
use terra_mesh::{ChunkParams, Generators};

use crate::params::PRECISION_WARNING_RATIO;
use crate::{
    Chunk, ChunkHandle, ChunkId, ChunkPool, ChunkState, ChunkTable, MeshHandle, MeshUploader,
    MeshWorkerPool, PlanetError, PlanetParams,
};

/// Fraction of `max_chunks` at which a capacity warning is logged.
const CAPACITY_WARNING_FRACTION: f64 = 0.8;

/// What one [`Planet::update`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Leaves drawn this update, after any coarsening.
    pub leaves: usize,
    pub kept: usize,
    /// Chunks assigned to new keys, fresh or reused.
    pub created: usize,
    /// Of `created`, chunks taken from the pool.
    pub reused: usize,
    /// Retiring chunks whose key came back before their task finished.
    pub revived: usize,
    pub retired: usize,
    /// Retired chunks destroyed because the pool was full.
    pub evicted: usize,
    pub uploaded: usize,
    /// Generations that failed; those chunks are retried next update.
    pub failed: usize,
    /// Uploads that failed; those chunks stay `ReadyToUpload`.
    pub upload_failed: usize,
    /// Ideal leaves drawn through a coarser ancestor because `max_chunks`
    /// was reached.
    pub coarsened: usize,
    /// Pending chunks the worker queue had no room for.
    pub deferred: usize,
    /// Worker tasks queued or running after this update.
    pub in_flight: usize,
    pub resident: usize,
    pub pooled: usize,
    pub retiring: usize,
    /// Triangles across resident chunks, skirts excluded.
    pub triangles: usize,
}

/// A GPU-resident chunk ready to draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderableChunk {
    pub key: ChunkKey,
    pub mesh: MeshHandle,
    /// Face-local to world, planet origin included.
    pub model_matrix: DMat4,
    pub triangles: usize,
}

/// A cube-sphere planet with view-dependent LOD.
///
/// `U` uploads finished meshes. It is only called from [`update`](Self::update)
/// and teardown, on the thread that owns the planet.
pub struct Planet<U: MeshUploader> {
    params: PlanetParams,
    generators: Generators,
    uploader: U,
    table: ChunkTable,
    pool: ChunkPool,
    /// Chunks retired while a worker still held them.
    retiring: FxHashMap<ChunkKey, ChunkHandle>,
    workers: Option<MeshWorkerPool>,
    next_id: u64,
    frame: u64,
    capacity_warned: bool,
    coarsening: bool,
}

impl<U: MeshUploader> Planet<U> {
    pub fn new(params: PlanetParams, generators: Generators, uploader: U) -> Result<Self, PlanetError> {
        params.validate()?;

        let ratio = params.precision_ratio();
        if ratio > PRECISION_WARNING_RATIO {
            tracing::warn!(
                ratio,
                "radius / min_node_size exceeds {PRECISION_WARNING_RATIO}; expect f32 jitter at the finest LOD"
            );
        }
        if let Some(max) = params.max_chunks {
            let estimated = params.estimated_max_chunks();
            if estimated > max as f64 * 0.5 {
                tracing::warn!(
                    estimated,
                    max_chunks = max,
                    "worst-case chunk count is close to max_chunks; distant detail may be drawn coarser"
                );
            }
        }

        let workers = if params.worker_threads > 0 {
            let pool = MeshWorkerPool::new(
                params.worker_threads,
                params.queue_budget,
                generators.clone(),
            )
            .map_err(PlanetError::WorkerSpawn)?;
            Some(pool)
        } else {
            None
        };

        tracing::info!(
            radius = params.radius,
            min_node_size = params.min_node_size,
            resolution = params.resolution,
            split_threshold = params.split_threshold,
            workers = params.worker_threads,
            "planet created"
        );

        Ok(Self {
            table: ChunkTable::with_capacity_limit(params.max_chunks),
            pool: ChunkPool::new(params.pool_capacity),
            retiring: FxHashMap::default(),
            workers,
            generators,
            uploader,
            params,
            next_id: 0,
            frame: 0,
            capacity_warned: false,
            coarsening: false,
        })
    }

    /// Rebuild the LOD for `viewpoint`, generate what is missing and upload
    /// whatever finished.
    pub fn update(&mut self, viewpoint: DVec3) -> Result<UpdateReport, PlanetError> {
        if !viewpoint.is_finite() {
            return Err(PlanetError::InvalidViewpoint(viewpoint));
        }
        self.frame += 1;
        let mut report = UpdateReport::default();

        self.collect_outcomes(&mut report);
        self.settle_retiring();

        let (leaves, coarsened) = {
            let mut tree = CubicQuadtree::new(
                self.params.radius,
                self.params.min_node_size,
                self.params.split_threshold,
                self.params.origin,
            )?;
            tree.insert(viewpoint);
            let limit = self.params.max_chunks.unwrap_or(usize::MAX);
            let nodes = tree.collect_leaves_limited(viewpoint, limit);
            let drawn_ideal = nodes.iter().filter(|node| node.is_leaf()).count();
            let keys: Vec<ChunkKey> = nodes.iter().map(|node| node.key()).collect();
            (keys, tree.leaf_count() - drawn_ideal)
        };
        report.leaves = leaves.len();
        report.coarsened = coarsened;
        if report.coarsened > 0 && !self.coarsening {
            tracing::warn!(
                coarsened = report.coarsened,
                max_chunks = ?self.params.max_chunks,
                "chunk limit reached; distant leaves drawn coarser"
            );
        }
        self.coarsening = report.coarsened > 0;

        let diff = self.table.diff(&leaves);
        let mut next = ChunkTable::with_capacity_limit(self.params.max_chunks);
        for key in &leaves {
            let chunk = match self.table.get(key) {
                Some(chunk) => {
                    report.kept += 1;
                    Arc::clone(chunk)
                }
                None => self.assign_chunk(*key, &mut report),
            };
            if let Err(e) = next.insert(chunk) {
                tracing::warn!(%key, error = %e, "chunk not inserted");
            }
        }

        let retired: Vec<ChunkHandle> = diff
            .retire
            .iter()
            .filter_map(|key| self.table.get(key).cloned())
            .collect();
        let _previous = std::mem::replace(&mut self.table, next);
        for chunk in retired {
            self.retire(chunk, &mut report);
        }

        self.dispatch(&mut report);
        self.upload_ready(&mut report);
        self.check_capacity();

        report.in_flight = self.workers.as_ref().map_or(0, MeshWorkerPool::in_flight_count);
        report.resident = self.table.len();
        report.pooled = self.pool.len();
        report.retiring = self.retiring.len();
        report.triangles = self.triangle_count();

        tracing::debug!(
            frame = self.frame,
            leaves = report.leaves,
            kept = report.kept,
            created = report.created,
            retired = report.retired,
            uploaded = report.uploaded,
            in_flight = report.in_flight,
            triangles = report.triangles,
            "planet updated"
        );
        Ok(report)
    }

    /// Uploaded chunks in leaf order.
    pub fn renderable_chunks(&self) -> Vec<RenderableChunk> {
        let triangles = self.params.triangles_per_chunk();
        self.table
            .iter()
            .filter(|chunk| chunk.is_renderable())
            .filter_map(|chunk| {
                let mesh = chunk.gpu_handle()?;
                Some(RenderableChunk {
                    key: chunk.key(),
                    mesh,
                    model_matrix: chunk.params().model_matrix(),
                    triangles,
                })
            })
            .collect()
    }

    /// Σ resolution² · 2 over resident chunks.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.table.len() * self.params.triangles_per_chunk()
    }

    /// Height of `position` above the generated surface, measured along the
    /// direction from the planet center. Negative below ground.
    #[must_use]
    pub fn surface_altitude(&self, position: DVec3) -> f64 {
        let offset = position - self.params.origin;
        let distance = offset.length();
        let direction = offset.try_normalize().unwrap_or(DVec3::Z);
        let radius = self.params.radius;
        let height = self
            .generators
            .sample_height(direction * radius, radius)
            .unwrap_or(0.0);
        let sign = if self.params.inverted { -1.0 } else { 1.0 };
        let surface = radius + height * sign;
        (distance - surface) * sign
    }

    #[must_use]
    pub fn chunk(&self, key: &ChunkKey) -> Option<&ChunkHandle> {
        self.table.get(key)
    }

    /// Resident chunks in leaf order.
    pub fn chunks(&self) -> impl Iterator<Item = &ChunkHandle> {
        self.table.iter()
    }

    #[must_use]
    pub fn table(&self) -> &ChunkTable {
        &self.table
    }

    #[must_use]
    pub fn pool(&self) -> &ChunkPool {
        &self.pool
    }

    #[must_use]
    pub fn resident_len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    #[must_use]
    pub fn retiring_len(&self) -> usize {
        self.retiring.len()
    }

    /// Worker tasks queued or running.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.workers.as_ref().map_or(0, MeshWorkerPool::in_flight_count)
    }

    #[must_use]
    pub fn params(&self) -> &PlanetParams {
        &self.params
    }

    #[must_use]
    pub fn generators(&self) -> &Generators {
        &self.generators
    }

    /// Updates run so far.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    #[must_use]
    pub fn uploader(&self) -> &U {
        &self.uploader
    }

    pub fn uploader_mut(&mut self) -> &mut U {
        &mut self.uploader
    }

    /// Stop the workers and release every GPU handle.
    pub fn destroy(mut self) {
        self.teardown();
    }

    /// A chunk for `key`: revived from the retiring set, reset from the
    /// pool, or newly allocated.
    fn assign_chunk(&mut self, key: ChunkKey, report: &mut UpdateReport) -> ChunkHandle {
        if let Some(chunk) = self.retiring.remove(&key) {
            report.revived += 1;
            tracing::trace!(%key, id = chunk.id().0, "revived in-flight chunk");
            return chunk;
        }

        report.created += 1;
        let params = self.chunk_params(&key);
        match self.pool.acquire() {
            Some(chunk) => {
                report.reused += 1;
                if let Some(stale) = chunk.reset(key, params) {
                    self.uploader.release(stale);
                }
                tracing::trace!(%key, id = chunk.id().0, "reused pooled chunk");
                chunk
            }
            None => {
                self.next_id += 1;
                tracing::trace!(%key, id = self.next_id, "allocated chunk");
                Arc::new(Chunk::new(ChunkId(self.next_id), key, params))
            }
        }
    }

    fn chunk_params(&self, key: &ChunkKey) -> ChunkParams {
        ChunkParams::for_key(
            key,
            self.params.resolution,
            self.params.radius,
            self.params.origin,
            self.params.inverted,
        )
    }

    /// Release GPU residency, then pool the chunk or park it until its
    /// worker task finishes.
    fn retire(&mut self, chunk: ChunkHandle, report: &mut UpdateReport) {
        report.retired += 1;
        if let Some(handle) = chunk.detach_gpu() {
            self.uploader.release(handle);
        }
        if chunk.is_in_flight() {
            tracing::trace!(key = %chunk.key(), "retired while in flight");
            self.retiring.insert(chunk.key(), chunk);
            return;
        }
        if self.pool_chunk(chunk) {
            report.evicted += 1;
        }
    }

    /// Returns `true` if the pool was full and the chunk was dropped.
    fn pool_chunk(&mut self, chunk: ChunkHandle) -> bool {
        chunk.unload();
        match self.pool.release(chunk) {
            Some(evicted) => {
                tracing::trace!(id = evicted.id().0, "pool full; chunk destroyed");
                true
            }
            None => false,
        }
    }

    fn collect_outcomes(&mut self, report: &mut UpdateReport) {
        let Some(workers) = &self.workers else {
            return;
        };
        for outcome in workers.drain_outcomes() {
            if let Err(e) = outcome.result {
                tracing::warn!(key = %outcome.key, error = %e, "chunk generation failed");
                report.failed += 1;
            }
        }
    }

    /// Pool retiring chunks whose tasks have finished.
    fn settle_retiring(&mut self) {
        let finished: Vec<ChunkKey> = self
            .retiring
            .iter()
            .filter(|(_, chunk)| !chunk.is_in_flight())
            .map(|(key, _)| *key)
            .collect();
        for key in finished {
            if let Some(chunk) = self.retiring.remove(&key) {
                self.pool_chunk(chunk);
            }
        }
    }

    /// Generate pending chunks inline, or queue them on the workers.
    fn dispatch(&mut self, report: &mut UpdateReport) {
        for chunk in self.table.iter() {
            if chunk.state() == ChunkState::Failed {
                chunk.retry();
            }
            match &self.workers {
                None => {
                    if chunk.state() != ChunkState::Pending {
                        continue;
                    }
                    if let Err(e) = chunk.generate(&self.generators) {
                        tracing::warn!(key = %chunk.key(), error = %e, "chunk generation failed");
                        report.failed += 1;
                    }
                }
                Some(workers) => {
                    if !chunk.mark_dispatched() {
                        continue;
                    }
                    if !workers.submit(Arc::clone(chunk)) {
                        chunk.cancel_dispatch();
                        report.deferred += 1;
                    }
                }
            }
        }
    }

    fn upload_ready(&mut self, report: &mut UpdateReport) {
        for chunk in self.table.iter() {
            if chunk.state() != ChunkState::ReadyToUpload {
                continue;
            }
            let key = chunk.key();
            let result = chunk.with_mesh(|mesh| self.uploader.upload(&key, mesh));
            match result {
                Ok(handle) => {
                    if let Some(stale) = chunk.mark_uploaded(handle) {
                        self.uploader.release(stale);
                    }
                    report.uploaded += 1;
                }
                Err(e) => {
                    tracing::warn!(%key, error = %e, "chunk upload failed; retrying next update");
                    report.upload_failed += 1;
                }
            }
        }
    }

    fn check_capacity(&mut self) {
        let Some(max) = self.params.max_chunks else {
            return;
        };
        let near_full = self.table.len() as f64 >= max as f64 * CAPACITY_WARNING_FRACTION;
        if near_full && !self.capacity_warned {
            tracing::warn!(
                resident = self.table.len(),
                max_chunks = max,
                "chunk table above 80% capacity"
            );
        }
        self.capacity_warned = near_full;
    }

    /// Join workers first so no task holds a chunk, then release GPU
    /// residency before the CPU buffers drop.
    fn teardown(&mut self) {
        if let Some(mut workers) = self.workers.take() {
            workers.shutdown();
        }
        let chunks = self
            .table
            .drain()
            .into_iter()
            .chain(self.pool.drain())
            .chain(self.retiring.drain().map(|(_, chunk)| chunk));
        for chunk in chunks {
            if let Some(handle) = chunk.detach_gpu() {
                self.uploader.release(handle);
            }
        }
    }
}

impl<U: MeshUploader> Drop for Planet<U> {
    fn drop(&mut self) {
        self.teardown();
    }
}
