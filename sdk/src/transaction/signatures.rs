//! # Signature Collector
//!
//! Per-cell signature maps for a frozen request.
//!
//! Maps are keyed by the flat cell index of the [`super::matrix::BodyMatrix`];
//! callers resolve `(identity, node)` to an index before reaching here. Each
//! cell holds at most one signature per public key.
//!
//! ## Overwrite policy
//!
//! A second signature for the same `(cell, public key)` with **different**
//! bytes replaces the first (last write wins). Re-submitting identical bytes
//! is a no-op. Both cases leave the map size unchanged.
//!
//! ## Concurrency
//!
//! Signing from several threads at once is expected: one party per key,
//! each walking every cell. The per-cell maps sit inside a `DashMap`, so a
//! write to one cell only contends with writes that land on the same shard.

use std::collections::BTreeMap;
use std::ops::Range;

use dashmap::DashMap;

use crate::crypto::PublicKey;

/// Signature map of a single cell.
pub type SignatureMap = BTreeMap<PublicKey, Vec<u8>>;

/// Result of inserting one signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignatureInsert {
    /// The key had no signature in this cell.
    Added,
    /// The key already had a different signature; it was replaced.
    Replaced,
    /// The key already had exactly these bytes.
    Unchanged,
}

impl SignatureInsert {
    /// Whether the stored state changed.
    pub fn changed(self) -> bool {
        !matches!(self, SignatureInsert::Unchanged)
    }
}

/// Concurrent per-cell signature storage.
#[derive(Debug, Default)]
pub struct SignatureCollector {
    cells: DashMap<usize, SignatureMap>,
}

impl SignatureCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `signature` for `public_key` in cell `index`.
    pub fn insert(&self, index: usize, public_key: PublicKey, signature: Vec<u8>) -> SignatureInsert {
        let mut cell = self.cells.entry(index).or_default();
        match cell.insert(public_key, signature) {
            None => SignatureInsert::Added,
            Some(previous) if previous == cell[&public_key] => SignatureInsert::Unchanged,
            Some(_) => SignatureInsert::Replaced,
        }
    }

    /// Copy of cell `index`'s signatures. Empty if none were collected.
    pub fn signatures(&self, index: usize) -> SignatureMap {
        self.cells
            .get(&index)
            .map(|cell| cell.value().clone())
            .unwrap_or_default()
    }

    /// `true` if `public_key` has signed cell `index`.
    pub fn contains(&self, index: usize, public_key: &PublicKey) -> bool {
        self.cells
            .get(&index)
            .is_some_and(|cell| cell.contains_key(public_key))
    }

    /// Drop every signature held for cells in `range`.
    pub fn clear_range(&self, range: Range<usize>) {
        for index in range {
            self.cells.remove(&index);
        }
    }

    /// Total signatures across all cells.
    pub fn len(&self) -> usize {
        self.cells.iter().map(|cell| cell.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distinct keys that have signed at least one cell, sorted.
    pub fn public_keys(&self) -> Vec<PublicKey> {
        let mut keys: Vec<_> = self
            .cells
            .iter()
            .flat_map(|cell| cell.keys().copied().collect::<Vec<_>>())
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }
}
