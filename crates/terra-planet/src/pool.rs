//! Free list of retired chunks.
//!
//! Pooled chunks are detached from the GPU and keep their CPU buffers, so
//! acquiring one for a new node reuses the allocations.

use crate::ChunkHandle;

#[derive(Debug)]
pub struct ChunkPool {
    free: Vec<ChunkHandle>,
    capacity: usize,
}

impl ChunkPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Vec::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Most recently released chunk first.
    pub fn acquire(&mut self) -> Option<ChunkHandle> {
        self.free.pop()
    }

    /// Return a chunk to the pool. When the pool is full the chunk is handed
    /// back for the caller to destroy.
    #[must_use]
    pub fn release(&mut self, chunk: ChunkHandle) -> Option<ChunkHandle> {
        if self.free.len() >= self.capacity {
            return Some(chunk);
        }
        self.free.push(chunk);
        None
    }

    pub fn contains(&self, chunk: &ChunkHandle) -> bool {
        self.free.iter().any(|c| std::sync::Arc::ptr_eq(c, chunk))
    }

    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn drain(&mut self) -> Vec<ChunkHandle> {
        std::mem::take(&mut self.free)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Chunk, ChunkId};
    use std::sync::Arc;
    use terra_cubesphere::{ChunkKey, CubeFace};
    use terra_math::{DVec2, DVec3};
    use terra_mesh::ChunkParams;

    fn handle(id: u64) -> ChunkHandle {
        let key = ChunkKey::new(CubeFace::NegZ, DVec2::new(id as f64, 0.0), 1.0);
        let params = ChunkParams::for_key(&key, 1, 100.0, DVec3::ZERO, false);
        Arc::new(Chunk::new(ChunkId(id), key, params))
    }

    #[test]
    fn test_lifo_reuse() {
        let mut pool = ChunkPool::new(4);
        assert!(pool.release(handle(1)).is_none());
        assert!(pool.release(handle(2)).is_none());
        assert_eq!(pool.acquire().unwrap().id(), ChunkId(2));
        assert_eq!(pool.acquire().unwrap().id(), ChunkId(1));
        assert!(pool.acquire().is_none());
    }

    #[test]
    fn test_overflow_hands_chunk_back() {
        let mut pool = ChunkPool::new(1);
        assert!(pool.release(handle(1)).is_none());
        let evicted = pool.release(handle(2)).expect("pool is full");
        assert_eq!(evicted.id(), ChunkId(2));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_zero_capacity_pools_nothing() {
        let mut pool = ChunkPool::new(0);
        assert!(pool.release(handle(1)).is_some());
        assert!(pool.is_empty());
    }

    #[test]
    fn test_contains_uses_identity() {
        let mut pool = ChunkPool::new(2);
        let a = handle(1);
        let _ = pool.release(Arc::clone(&a));
        assert!(pool.contains(&a));
        assert!(!pool.contains(&handle(1)));
    }
}
