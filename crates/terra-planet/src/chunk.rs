//! A renderable terrain tile and its generation state machine.
//!
//! ```text
//! Unloaded ──reset──▶ Pending ──▶ Generating ──▶ ReadyToUpload ──▶ Uploaded
//!                        ▲             │
//!                        └── retry ── Failed
//! ```
//!
//! Every field lives behind one per-chunk mutex so the owning thread can
//! poll state while a worker generates. Workers take the mesh buffers out
//! of the chunk while building, so the lock is never held during
//! generation.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use terra_cubesphere::ChunkKey;
use terra_mesh::{ChunkMesh, ChunkParams, Generators, MeshStats, build_chunk_mesh};

use crate::{GenerationError, MeshHandle};

/// Stable identity of a chunk object across reuse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId(pub u64);

/// Where a chunk is in its generate/upload cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkState {
    /// In the pool, or never assigned a node.
    Unloaded,
    /// Assigned a node; mesh not generated yet.
    Pending,
    /// A worker is building the mesh.
    Generating,
    /// CPU buffers are complete; waiting for the owning thread to upload.
    ReadyToUpload,
    /// GPU-resident and drawable.
    Uploaded,
    /// Generation failed; retried on the next update.
    Failed,
}

/// Shared handle: the table, pool, retiring set and worker tasks all hold
/// the same chunk object.
pub type ChunkHandle = Arc<Chunk>;

#[derive(Debug)]
struct ChunkInner {
    key: ChunkKey,
    params: ChunkParams,
    state: ChunkState,
    /// Queued on a worker but not picked up yet.
    dispatched: bool,
    mesh: ChunkMesh,
    gpu: Option<MeshHandle>,
    generations: u64,
    last_error: Option<GenerationError>,
}

#[derive(Debug)]
pub struct Chunk {
    id: ChunkId,
    inner: Mutex<ChunkInner>,
}

impl Chunk {
    /// A new chunk for `key`, ready to generate.
    pub fn new(id: ChunkId, key: ChunkKey, params: ChunkParams) -> Self {
        Self {
            id,
            inner: Mutex::new(ChunkInner {
                key,
                params,
                state: ChunkState::Pending,
                dispatched: false,
                mesh: ChunkMesh::new(),
                gpu: None,
                generations: 0,
                last_error: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChunkInner> {
        // Mesh generation runs outside the lock, so a poisoned lock can only
        // come from a panic in this module's own bookkeeping.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn id(&self) -> ChunkId {
        self.id
    }

    #[must_use]
    pub fn key(&self) -> ChunkKey {
        self.lock().key
    }

    #[must_use]
    pub fn params(&self) -> ChunkParams {
        self.lock().params
    }

    #[must_use]
    pub fn state(&self) -> ChunkState {
        self.lock().state
    }

    /// Drawable: only after upload.
    #[must_use]
    pub fn is_renderable(&self) -> bool {
        self.lock().state == ChunkState::Uploaded
    }

    /// Queued on or being built by a worker.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        let inner = self.lock();
        inner.dispatched || inner.state == ChunkState::Generating
    }

    #[must_use]
    pub fn gpu_handle(&self) -> Option<MeshHandle> {
        self.lock().gpu
    }

    /// Completed mesh builds over the chunk's lifetime, across reuse.
    #[must_use]
    pub fn generation_count(&self) -> u64 {
        self.lock().generations
    }

    #[must_use]
    pub fn last_error(&self) -> Option<GenerationError> {
        self.lock().last_error.clone()
    }

    /// Run `f` on the CPU mesh. Holds the chunk lock for the duration.
    pub fn with_mesh<R>(&self, f: impl FnOnce(&ChunkMesh) -> R) -> R {
        f(&self.lock().mesh)
    }

    /// Reassign a detached chunk to a new node. Buffers keep their capacity.
    ///
    /// Returns any GPU handle the chunk still held; the caller must release it.
    pub(crate) fn reset(&self, key: ChunkKey, params: ChunkParams) -> Option<MeshHandle> {
        let mut inner = self.lock();
        debug_assert!(inner.gpu.is_none(), "reset of a GPU-resident chunk {}", inner.key);
        debug_assert!(!inner.dispatched && inner.state != ChunkState::Generating);
        inner.key = key;
        inner.params = params;
        inner.state = ChunkState::Pending;
        inner.dispatched = false;
        inner.last_error = None;
        inner.mesh.clear();
        inner.gpu.take()
    }

    /// Take the GPU handle, dropping residency. A drawable chunk falls back
    /// to `ReadyToUpload`, since its CPU buffers are still complete.
    pub(crate) fn detach_gpu(&self) -> Option<MeshHandle> {
        let mut inner = self.lock();
        let handle = inner.gpu.take();
        if inner.state == ChunkState::Uploaded {
            inner.state = ChunkState::ReadyToUpload;
        }
        handle
    }

    /// Park a detached, idle chunk in the pool.
    pub(crate) fn unload(&self) {
        let mut inner = self.lock();
        debug_assert!(inner.gpu.is_none());
        inner.state = ChunkState::Unloaded;
        inner.dispatched = false;
    }

    /// Claim a `Pending` chunk for a worker. Returns `false` if it is not
    /// pending or already queued.
    pub(crate) fn mark_dispatched(&self) -> bool {
        let mut inner = self.lock();
        if inner.state != ChunkState::Pending || inner.dispatched {
            return false;
        }
        inner.dispatched = true;
        true
    }

    /// Undo [`mark_dispatched`](Self::mark_dispatched) after a rejected submit.
    pub(crate) fn cancel_dispatch(&self) {
        self.lock().dispatched = false;
    }

    /// `Failed` → `Pending`. Returns whether the chunk was failed.
    pub(crate) fn retry(&self) -> bool {
        let mut inner = self.lock();
        if inner.state != ChunkState::Failed {
            return false;
        }
        inner.state = ChunkState::Pending;
        inner.dispatched = false;
        true
    }

    /// Record a successful upload.
    pub(crate) fn mark_uploaded(&self, handle: MeshHandle) -> Option<MeshHandle> {
        let mut inner = self.lock();
        inner.state = ChunkState::Uploaded;
        inner.gpu.replace(handle)
    }

    /// Build the mesh for the chunk's current params.
    ///
    /// `Pending → Generating → ReadyToUpload`, or `Failed` if the build
    /// errors or panics. Safe to call from any thread.
    pub fn generate(&self, generators: &Generators) -> Result<MeshStats, GenerationError> {
        let (params, mut mesh) = {
            let mut inner = self.lock();
            if inner.state != ChunkState::Pending {
                let state = inner.state;
                inner.dispatched = false;
                return Err(GenerationError::NotPending(state));
            }
            inner.state = ChunkState::Generating;
            inner.dispatched = false;
            (inner.params, std::mem::take(&mut inner.mesh))
        };

        let result = catch_unwind(AssertUnwindSafe(|| {
            build_chunk_mesh(&params, generators, &mut mesh)
        }));
        let result = match result {
            Ok(Ok(stats)) => Ok(stats),
            Ok(Err(e)) => Err(GenerationError::from(e)),
            Err(payload) => Err(GenerationError::Panicked(panic_message(payload.as_ref()))),
        };

        let mut inner = self.lock();
        inner.mesh = mesh;
        inner.generations += 1;
        match &result {
            Ok(_) => {
                inner.state = ChunkState::ReadyToUpload;
                inner.last_error = None;
            }
            Err(e) => {
                inner.state = ChunkState::Failed;
                inner.mesh.clear();
                inner.last_error = Some(e.clone());
            }
        }
        result
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
