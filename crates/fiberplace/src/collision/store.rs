//! Matrix persistence keyed by `catalog::cache_key`.
//!
//! The store only moves opaque blobs; encoding is serde_json. A blob that
//! fails to decode or does not match the current target/fiber counts is
//! treated as absent and the matrix is rebuilt.

use std::collections::HashMap;
use std::io;

use super::build::MatrixBuilder;
use super::footprint::FootprintTable;
use super::types::CollisionMatrix;
use crate::progress::Observer;

/// Key-value blob storage.
pub trait MatrixStore {
    fn get(&self, key: &str) -> Option<Vec<u8>>;
    fn put(&mut self, key: &str, blob: Vec<u8>) -> io::Result<()>;
}

/// In-process store.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MatrixStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: &str, blob: Vec<u8>) -> io::Result<()> {
        self.entries.insert(key.to_string(), blob);
        Ok(())
    }
}

/// Where a matrix came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatrixSource {
    Cache,
    Built,
}

pub fn encode(matrix: &CollisionMatrix) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(matrix)
}

/// Decode and validate against the expected shape.
pub fn decode(blob: &[u8], n_targets: usize, n_fibers: usize) -> Option<CollisionMatrix> {
    let matrix: CollisionMatrix = match serde_json::from_slice(blob) {
        Ok(m) => m,
        Err(e) => {
            tracing::info!(error = %e, "cached collision matrix unreadable");
            return None;
        }
    };
    if !matrix.is_well_formed() || matrix.len() != n_targets || !matrix.fits_fibers(n_fibers) {
        tracing::info!(
            cached = matrix.len(),
            expected = n_targets,
            "cached collision matrix does not match the field"
        );
        return None;
    }
    Some(matrix)
}

/// Cached matrix for `key` if usable, otherwise build and store it.
pub fn load_or_build(
    store: &mut dyn MatrixStore,
    key: &str,
    table: &FootprintTable,
    builder: &MatrixBuilder,
    observer: &mut dyn Observer,
) -> (CollisionMatrix, MatrixSource) {
    if let Some(m) = store
        .get(key)
        .and_then(|blob| decode(&blob, table.len(), table.fibers().len()))
    {
        tracing::info!(key, "collision matrix loaded from cache");
        observer.on_progress(100);
        return (m, MatrixSource::Cache);
    }
    tracing::info!(key, "rebuilding collision matrix");
    let matrix = builder.build(table, observer);
    match encode(&matrix) {
        Ok(blob) => {
            if let Err(e) = store.put(key, blob) {
                tracing::warn!(error = %e, key, "could not store collision matrix");
            }
        }
        Err(e) => tracing::warn!(error = %e, "could not encode collision matrix"),
    }
    (matrix, MatrixSource::Built)
}
