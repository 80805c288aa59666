//! Resident chunks keyed by [`ChunkKey`].
//!
//! Lookups go through an [`FxHashMap`]; iteration follows insertion order,
//! which the planet keeps equal to quadtree leaf order so draw order is
//! deterministic.

use rustc_hash::{FxHashMap, FxHashSet};
use terra_cubesphere::ChunkKey;

use crate::{ChunkHandle, TableError};

/// Key-set comparison between the resident table and a desired leaf set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableDiff {
    /// Desired and resident.
    pub keep: Vec<ChunkKey>,
    /// Desired, not resident.
    pub create: Vec<ChunkKey>,
    /// Resident, no longer desired.
    pub retire: Vec<ChunkKey>,
}

/// Map of resident chunks with an optional capacity limit.
#[derive(Debug, Default)]
pub struct ChunkTable {
    chunks: FxHashMap<ChunkKey, ChunkHandle>,
    order: Vec<ChunkKey>,
    capacity: Option<usize>,
}

impl ChunkTable {
    /// Unbounded table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table that refuses inserts beyond `capacity` chunks (`None` = unbounded).
    pub fn with_capacity_limit(capacity: Option<usize>) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    pub fn capacity_limit(&self) -> Option<usize> {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.capacity.is_some_and(|cap| self.chunks.len() >= cap)
    }

    /// Insert under the chunk's current key.
    pub fn insert(&mut self, chunk: ChunkHandle) -> Result<(), TableError> {
        let key = chunk.key();
        if self.chunks.contains_key(&key) {
            return Err(TableError::DuplicateKey(key));
        }
        if let Some(capacity) = self.capacity
            && self.chunks.len() >= capacity
        {
            return Err(TableError::CapacityExceeded { capacity });
        }
        self.chunks.insert(key, chunk);
        self.order.push(key);
        Ok(())
    }

    pub fn get(&self, key: &ChunkKey) -> Option<&ChunkHandle> {
        self.chunks.get(key)
    }

    pub fn contains(&self, key: &ChunkKey) -> bool {
        self.chunks.contains_key(key)
    }

    pub fn remove(&mut self, key: &ChunkKey) -> Option<ChunkHandle> {
        let chunk = self.chunks.remove(key)?;
        self.order.retain(|k| k != key);
        Some(chunk)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> &[ChunkKey] {
        &self.order
    }

    /// Chunks in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ChunkHandle> {
        self.order.iter().filter_map(|k| self.chunks.get(k))
    }

    /// Remove every chunk, in insertion order.
    pub fn drain(&mut self) -> Vec<ChunkHandle> {
        let mut chunks = std::mem::take(&mut self.chunks);
        self.order
            .drain(..)
            .filter_map(|k| chunks.remove(&k))
            .collect()
    }

    /// Compare the resident key set against `desired`.
    ///
    /// `keep` and `create` follow `desired` order; `retire` follows
    /// insertion order. Duplicate desired keys are reported once.
    pub fn diff(&self, desired: &[ChunkKey]) -> TableDiff {
        let mut diff = TableDiff::default();
        let mut seen = FxHashSet::default();
        for key in desired {
            if !seen.insert(*key) {
                continue;
            }
            if self.chunks.contains_key(key) {
                diff.keep.push(*key);
            } else {
                diff.create.push(*key);
            }
        }
        diff.retire = self
            .order
            .iter()
            .filter(|k| !seen.contains(*k))
            .copied()
            .collect();
        diff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Chunk, ChunkId};
    use std::sync::Arc;
    use terra_cubesphere::CubeFace;
    use terra_math::{DVec2, DVec3};
    use terra_mesh::ChunkParams;

    fn key(x: f64) -> ChunkKey {
        ChunkKey::new(CubeFace::PosX, DVec2::new(x, 0.0), 10.0)
    }

    fn handle(id: u64, k: ChunkKey) -> ChunkHandle {
        let params = ChunkParams::for_key(&k, 2, 100.0, DVec3::ZERO, false);
        Arc::new(Chunk::new(ChunkId(id), k, params))
    }

    #[test]
    fn test_insert_get_remove() {
        let mut table = ChunkTable::new();
        table.insert(handle(1, key(0.0))).unwrap();
        table.insert(handle(2, key(10.0))).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&key(10.0)).unwrap().id(), ChunkId(2));
        assert!(table.remove(&key(0.0)).is_some());
        assert!(!table.contains(&key(0.0)));
        assert_eq!(table.keys(), &[key(10.0)]);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut table = ChunkTable::new();
        table.insert(handle(1, key(0.0))).unwrap();
        assert_eq!(
            table.insert(handle(2, key(0.0))),
            Err(TableError::DuplicateKey(key(0.0)))
        );
        assert_eq!(table.get(&key(0.0)).unwrap().id(), ChunkId(1));
    }

    #[test]
    fn test_capacity_limit() {
        let mut table = ChunkTable::with_capacity_limit(Some(2));
        table.insert(handle(1, key(0.0))).unwrap();
        table.insert(handle(2, key(10.0))).unwrap();
        assert!(table.is_full());
        assert_eq!(
            table.insert(handle(3, key(20.0))),
            Err(TableError::CapacityExceeded { capacity: 2 })
        );
    }

    #[test]
    fn test_iteration_follows_insertion_order() {
        let mut table = ChunkTable::new();
        for (i, x) in [30.0, 10.0, 20.0].into_iter().enumerate() {
            table.insert(handle(i as u64, key(x))).unwrap();
        }
        let ids: Vec<u64> = table.iter().map(|c| c.id().0).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        let drained: Vec<u64> = table.drain().iter().map(|c| c.id().0).collect();
        assert_eq!(drained, vec![0, 1, 2]);
        assert!(table.is_empty());
    }

    #[test]
    fn test_diff_partitions_keys() {
        let mut table = ChunkTable::new();
        for (i, x) in [0.0, 10.0, 20.0].into_iter().enumerate() {
            table.insert(handle(i as u64, key(x))).unwrap();
        }
        let diff = table.diff(&[key(20.0), key(30.0), key(0.0), key(30.0)]);
        assert_eq!(diff.keep, vec![key(20.0), key(0.0)]);
        assert_eq!(diff.create, vec![key(30.0)]);
        assert_eq!(diff.retire, vec![key(10.0)]);
    }
}
