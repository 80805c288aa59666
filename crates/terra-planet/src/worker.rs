//! Background mesh generation on a fixed pool of worker threads.
//!
//! Tasks are chunk handles pushed onto a bounded FIFO channel. A worker
//! drives the chunk through `Pending → Generating → ReadyToUpload` (or
//! `Failed`) and reports the outcome on an unbounded result channel. Workers
//! never touch the GPU; uploading stays on the thread that owns the planet.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::JoinHandle;

use terra_cubesphere::ChunkKey;
use terra_mesh::{Generators, MeshStats};

use crate::{ChunkHandle, ChunkId, GenerationError};

/// Result of one background generation.
#[derive(Debug)]
pub struct GenerationOutcome {
    pub chunk_id: ChunkId,
    /// Key the chunk was generated for.
    pub key: ChunkKey,
    pub result: Result<MeshStats, GenerationError>,
}

/// Fixed-size pool of mesh generation threads.
pub struct MeshWorkerPool {
    /// Dropped on shutdown to close the channel.
    task_sender: Option<crossbeam_channel::Sender<ChunkHandle>>,
    result_receiver: crossbeam_channel::Receiver<GenerationOutcome>,
    worker_handles: Vec<JoinHandle<()>>,
    /// Maximum queued plus running tasks.
    budget: usize,
    in_flight: Arc<AtomicUsize>,
}

impl MeshWorkerPool {
    /// Spawn `worker_count` threads sharing `generators`.
    ///
    /// `budget` bounds the number of tasks queued or running at once.
    /// `worker_count` must be at least one; inline generation does not go
    /// through the pool.
    pub fn new(
        worker_count: usize,
        budget: usize,
        generators: Generators,
    ) -> std::io::Result<Self> {
        if worker_count == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "mesh worker pool needs at least one thread",
            ));
        }
        let (task_tx, task_rx) = crossbeam_channel::bounded::<ChunkHandle>(budget.max(1));
        let (result_tx, result_rx) = crossbeam_channel::unbounded();
        let in_flight = Arc::new(AtomicUsize::new(0));

        let mut pool = Self {
            task_sender: Some(task_tx),
            result_receiver: result_rx,
            worker_handles: Vec::with_capacity(worker_count),
            budget,
            in_flight: Arc::clone(&in_flight),
        };

        for index in 0..worker_count {
            let rx = task_rx.clone();
            let tx = result_tx.clone();
            let generators = generators.clone();
            let flight = Arc::clone(&in_flight);

            let handle = std::thread::Builder::new()
                .name(format!("terra-mesh-{index}"))
                .spawn(move || {
                    while let Ok(chunk) = rx.recv() {
                        let key = chunk.key();
                        let result = chunk.generate(&generators);
                        if let Err(e) = &result {
                            tracing::debug!(%key, error = %e, "background generation failed");
                        }
                        let _ = tx.send(GenerationOutcome {
                            chunk_id: chunk.id(),
                            key,
                            result,
                        });
                        flight.fetch_sub(1, Ordering::AcqRel);
                    }
                });
            match handle {
                Ok(handle) => pool.worker_handles.push(handle),
                Err(e) => {
                    pool.shutdown();
                    return Err(e);
                }
            }
        }

        tracing::debug!(workers = worker_count, budget, "mesh worker pool started");
        Ok(pool)
    }

    /// Default thread count: all cores but two, at least one.
    pub fn default_worker_count() -> usize {
        let cpus = num_cpus::get().max(2);
        (cpus - 2).max(1)
    }

    /// Queue a chunk for generation. Returns `false` if the budget is
    /// exhausted or the pool has been shut down.
    pub fn submit(&self, chunk: ChunkHandle) -> bool {
        let sender = match &self.task_sender {
            Some(s) => s,
            None => return false,
        };
        if self.in_flight.load(Ordering::Acquire) >= self.budget {
            return false;
        }
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        if sender.try_send(chunk).is_err() {
            self.in_flight.fetch_sub(1, Ordering::AcqRel);
            return false;
        }
        true
    }

    /// Collect every finished outcome without blocking.
    pub fn drain_outcomes(&self) -> Vec<GenerationOutcome> {
        self.result_receiver.try_iter().collect()
    }

    /// Tasks queued or running.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn worker_count(&self) -> usize {
        self.worker_handles.len()
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Close the queue and join every worker. Tasks already queued are
    /// finished first.
    pub fn shutdown(&mut self) {
        self.task_sender.take();
        for handle in self.worker_handles.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for MeshWorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
