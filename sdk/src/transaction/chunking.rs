//! # Chunking Splitter
//!
//! Splits payload-bearing operations into an ordered sequence of chunks.
//!
//! - Chunk count is `ceil(len / chunk_size)`, fixed before any chunk is
//!   produced, with a floor of one chunk so an empty payload still yields a
//!   (single, empty) request.
//! - Chunk 0 uses the initial identity as-is (no nonce). Chunk `k` uses the
//!   same payer and valid-start with `nonce = k`.
//! - More chunks than `max_chunks` is a construction error; the splitter
//!   never truncates.
//!
//! Operations without a chunk payload pass through as a single chunk.

use super::error::ConstructionError;
use super::operation::{ChunkInfo, Operation};
use crate::identity::TransactionId;

/// One chunk of a request: its index, identity and operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub transaction_id: TransactionId,
    pub operation: Operation,
}

/// Chunks a payload of `len` bytes needs at `chunk_size`. Never zero.
pub fn chunk_count(len: usize, chunk_size: usize) -> Result<usize, ConstructionError> {
    if chunk_size == 0 {
        return Err(ConstructionError::ZeroChunkSize);
    }
    Ok(len.div_ceil(chunk_size).max(1))
}

/// Split `operation` into chunks.
pub fn split(
    operation: &Operation,
    chunk_size: usize,
    max_chunks: usize,
    initial_id: TransactionId,
) -> Result<Vec<Chunk>, ConstructionError> {
    split_correlated(operation, chunk_size, max_chunks, initial_id, initial_id)
}

/// Like [`split`], but chunk identities derive from `identity_base` while
/// chunk metadata keeps pointing at `correlation_id`. Used when a request
/// regenerates its identity after some chunks were already accepted: the
/// remaining chunks get fresh identities but must still reference the
/// chunk the network has already seen.
pub fn split_correlated(
    operation: &Operation,
    chunk_size: usize,
    max_chunks: usize,
    identity_base: TransactionId,
    correlation_id: TransactionId,
) -> Result<Vec<Chunk>, ConstructionError> {
    let Some(payload) = operation.chunk_payload() else {
        return Ok(vec![Chunk {
            index: 0,
            transaction_id: identity_base,
            operation: operation.clone(),
        }]);
    };

    let total = chunk_count(payload.len(), chunk_size)?;
    if total > max_chunks {
        return Err(ConstructionError::TooManyChunks {
            required: total,
            max: max_chunks,
        });
    }

    let chunks = (0..total)
        .map(|index| {
            let start = (index * chunk_size).min(payload.len());
            let end = (start + chunk_size).min(payload.len());
            let info = ChunkInfo {
                initial_transaction_id: correlation_id,
                number: index as u32 + 1,
                total: total as u32,
            };
            Chunk {
                index,
                transaction_id: identity_base.for_chunk(index),
                operation: operation.for_chunk(&payload[start..end], info),
            }
        })
        .collect();

    Ok(chunks)
}
