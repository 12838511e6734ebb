//! # Node × Chunk Matrix
//!
//! Holds the canonical body bytes for every `(chunk, node)` pair of a
//! frozen request.
//!
//! Every cell is encoded up front at freeze time: `chunks × nodes` calls to
//! the body builder. Failing over to another node during execution is then
//! just picking a different, already-built cell.
//!
//! ## Layout
//!
//! Cells live in one flat vector in chunk-major, node-minor order:
//!
//! ```text
//! index = chunk * node_count + node_index
//!
//!            node 0    node 1    node 2
//! chunk 0  [  0    ] [  1    ] [  2    ]
//! chunk 1  [  3    ] [  4    ] [  5    ]
//! ```
//!
//! That order is the order `all_cells()` returns, the order signable bodies
//! are handed to external signers, and the order of the shape C list.
//!
//! Bodies never change once built. The only sanctioned mutation is
//! [`BodyMatrix::rebuild_rows`], used when the request's identity is
//! regenerated, which replaces whole rows with bodies for new identities.

use std::collections::HashMap;
use std::ops::Range;

use super::body::{build_body, TransactionContent};
use super::chunking::Chunk;
use super::error::ConstructionError;
use crate::identity::{NodeId, TransactionId};

/// One `(chunk, node)` slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    pub chunk: usize,
    pub transaction_id: TransactionId,
    pub node: NodeId,
    /// Shape A body bytes. The exact bytes signers sign.
    pub body: Vec<u8>,
}

/// The full grid of encoded bodies for one request.
#[derive(Clone, Debug)]
pub struct BodyMatrix {
    nodes: Vec<NodeId>,
    cells: Vec<Cell>,
    index: HashMap<(TransactionId, NodeId), usize>,
}

impl BodyMatrix {
    /// Encode one body per `(chunk, node)` pair.
    ///
    /// `chunks` must be ordered by index starting at 0; `nodes` must be
    /// non-empty and free of duplicates.
    pub fn build(
        content: &TransactionContent,
        chunks: &[Chunk],
        nodes: &[NodeId],
    ) -> Result<Self, ConstructionError> {
        if nodes.is_empty() {
            return Err(ConstructionError::NoNodes);
        }
        let cells = Self::encode_rows(content, chunks, nodes)?;
        Ok(Self::from_parts(nodes.to_vec(), cells))
    }

    /// Assemble a matrix from already-encoded cells (the decode path).
    /// Cells must already be in chunk-major, node-minor order.
    pub(crate) fn from_parts(nodes: Vec<NodeId>, cells: Vec<Cell>) -> Self {
        let index = cells
            .iter()
            .enumerate()
            .map(|(i, cell)| ((cell.transaction_id, cell.node), i))
            .collect();
        Self {
            nodes,
            cells,
            index,
        }
    }

    fn encode_rows(
        content: &TransactionContent,
        chunks: &[Chunk],
        nodes: &[NodeId],
    ) -> Result<Vec<Cell>, ConstructionError> {
        let mut cells = Vec::with_capacity(chunks.len() * nodes.len());
        for chunk in chunks {
            let chunk_content = content.with_operation(chunk.operation.clone());
            for node in nodes {
                cells.push(Cell {
                    chunk: chunk.index,
                    transaction_id: chunk.transaction_id,
                    node: *node,
                    body: build_body(&chunk_content, &chunk.transaction_id, node)?,
                });
            }
        }
        Ok(cells)
    }

    /// Replace the rows for `chunks` (a contiguous tail of the request)
    /// with freshly encoded bodies. Returns the range of cell indices that
    /// were replaced. On error the matrix is left untouched.
    pub(crate) fn rebuild_rows(
        &mut self,
        content: &TransactionContent,
        chunks: &[Chunk],
    ) -> Result<Range<usize>, ConstructionError> {
        let Some(first) = chunks.first() else {
            return Ok(0..0);
        };
        let start = first.index * self.nodes.len();
        let fresh = Self::encode_rows(content, chunks, &self.nodes)?;
        let end = start + fresh.len();

        self.cells.truncate(start);
        self.cells.extend(fresh);
        *self = Self::from_parts(std::mem::take(&mut self.nodes), std::mem::take(&mut self.cells));
        Ok(start..end)
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn chunk_count(&self) -> usize {
        self.cells.len() / self.nodes.len().max(1)
    }

    /// Identity of each chunk, in chunk order.
    pub fn transaction_ids(&self) -> Vec<TransactionId> {
        self.cells
            .iter()
            .step_by(self.nodes.len().max(1))
            .map(|cell| cell.transaction_id)
            .collect()
    }

    /// Every node's cell for one chunk identity, in node order. Empty if
    /// the identity is not part of this matrix.
    pub fn cells_for(&self, transaction_id: &TransactionId) -> &[Cell] {
        self.nodes
            .first()
            .and_then(|node| self.index.get(&(*transaction_id, *node)))
            .map(|&start| &self.cells[start..start + self.nodes.len()])
            .unwrap_or(&[])
    }

    /// All cells of chunk `chunk`, in node order.
    pub fn row(&self, chunk: usize) -> &[Cell] {
        let width = self.nodes.len();
        let start = chunk * width;
        self.cells.get(start..start + width).unwrap_or(&[])
    }

    /// Every cell, chunk-major, node-minor.
    pub fn all_cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Flat index of the cell for `(transaction_id, node)`, if built.
    pub fn position(&self, transaction_id: &TransactionId, node: &NodeId) -> Option<usize> {
        self.index.get(&(*transaction_id, *node)).copied()
    }

    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    /// Flat index for `(chunk, node_index)`.
    pub fn index_of(&self, chunk: usize, node_index: usize) -> usize {
        chunk * self.nodes.len() + node_index
    }
}
