//! # Serialization Engine
//!
//! Converts frozen requests to and from bytes.
//!
//! ## Envelope shapes
//!
//! Each shape starts with its own 4-byte magic followed by a bincode
//! payload (fixed-width little-endian integers, trailing bytes rejected):
//!
//! ```text
//! A  "TBDY"  TransactionBody                         bare, unsigned body
//! B  "TSIG"  { body_bytes: A, sig_map }              one signed cell
//! C  "TLST"  { transactions: [ { signed_transaction_bytes: B } ] }
//! ```
//!
//! Encoding always produces shape C, one entry per matrix cell in
//! chunk-major, node-minor order. Decoding accepts all three, because
//! bytes written by older tooling must stay loadable.
//!
//! ## Decoding
//!
//! [`decode`] walks [`DECODE_ATTEMPTS`], narrowest shape first, and returns
//! the first match tagged with its shape. An attempt either declines (the
//! magic is not its own) or commits; a committed attempt that then fails
//! to parse is an error, not a reason to keep guessing.
//!
//! [`assemble`] turns decoded cells back into a matrix, and refuses
//! containers whose cells do not all describe the same request.

use bincode::Options;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::body::{TransactionBody, TransactionContent};
use super::chunking::Chunk;
use super::error::{ConstructionError, DecodeError};
use super::matrix::{BodyMatrix, Cell};
use super::operation::Operation;
use super::signatures::SignatureMap;
use crate::config::{
    BODY_MAGIC, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_CHUNKS, LIST_MAGIC, MAX_DECODE_BYTES, SIGNED_MAGIC,
};
use crate::identity::{NodeId, TransactionId};

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

/// The three envelope shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WireShape {
    /// Shape A: a bare body.
    Body,
    /// Shape B: a body plus signatures.
    Signed,
    /// Shape C: a list of shape B envelopes.
    List,
}

impl WireShape {
    pub fn magic(self) -> [u8; 4] {
        match self {
            WireShape::Body => BODY_MAGIC,
            WireShape::Signed => SIGNED_MAGIC,
            WireShape::List => LIST_MAGIC,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            WireShape::Body => "body",
            WireShape::Signed => "signed transaction",
            WireShape::List => "transaction list",
        }
    }
}

impl fmt::Display for WireShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Shape B payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    /// Shape A bytes, exactly as signed.
    pub body_bytes: Vec<u8>,
    pub sig_map: SignatureMap,
}

/// One entry of a shape C list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEnvelope {
    /// Shape B bytes.
    pub signed_transaction_bytes: Vec<u8>,
}

/// Shape C payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionList {
    pub transactions: Vec<TransactionEnvelope>,
}

fn wire_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_limit(MAX_DECODE_BYTES)
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

/// Encode `value` as the given shape: magic, then payload.
pub(crate) fn encode_envelope<T: Serialize>(shape: WireShape, value: &T) -> Result<Vec<u8>, bincode::Error> {
    let payload = wire_options().serialize(value)?;
    let mut out = Vec::with_capacity(4 + payload.len());
    out.extend_from_slice(&shape.magic());
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Why a single decode attempt did not produce a value.
enum AttemptError {
    /// The magic belongs to another shape; try the next attempt.
    Declined,
    /// The magic matched but the payload is broken.
    Failed(DecodeError),
}

fn decode_envelope<T: DeserializeOwned>(shape: WireShape, bytes: &[u8]) -> Result<T, AttemptError> {
    match bytes.strip_prefix(&shape.magic()) {
        None => Err(AttemptError::Declined),
        Some(payload) => wire_options().deserialize(payload).map_err(|e| {
            AttemptError::Failed(DecodeError::Malformed {
                shape: shape.name(),
                reason: e.to_string(),
            })
        }),
    }
}

/// Encode one cell as shape B.
pub fn encode_signed(body_bytes: &[u8], sig_map: &SignatureMap) -> Result<Vec<u8>, ConstructionError> {
    let signed = SignedTransaction {
        body_bytes: body_bytes.to_vec(),
        sig_map: sig_map.clone(),
    };
    encode_envelope(WireShape::Signed, &signed).map_err(|e| ConstructionError::Encoding(e.to_string()))
}

/// Wrap shape B envelopes into shape C.
pub fn encode_list(signed: Vec<Vec<u8>>) -> Result<Vec<u8>, ConstructionError> {
    let list = TransactionList {
        transactions: signed
            .into_iter()
            .map(|signed_transaction_bytes| TransactionEnvelope {
                signed_transaction_bytes,
            })
            .collect(),
    };
    encode_envelope(WireShape::List, &list).map_err(|e| ConstructionError::Encoding(e.to_string()))
}

// ---------------------------------------------------------------------------
// Decode attempts
// ---------------------------------------------------------------------------

/// One decoded cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedCell {
    pub body: TransactionBody,
    /// The shape A bytes as received. Signatures cover these exact bytes.
    pub body_bytes: Vec<u8>,
    pub signatures: SignatureMap,
}

/// Result of [`decode`], tagged with the shape that matched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decoded {
    Body(DecodedCell),
    Signed(DecodedCell),
    List(Vec<DecodedCell>),
}

impl Decoded {
    pub fn shape(&self) -> WireShape {
        match self {
            Decoded::Body(_) => WireShape::Body,
            Decoded::Signed(_) => WireShape::Signed,
            Decoded::List(_) => WireShape::List,
        }
    }

    pub fn into_cells(self) -> Vec<DecodedCell> {
        match self {
            Decoded::Body(cell) | Decoded::Signed(cell) => vec![cell],
            Decoded::List(cells) => cells,
        }
    }
}

type DecodeAttempt = fn(&[u8]) -> Result<Decoded, AttemptError>;

/// Decode attempts, in the order they are tried.
const DECODE_ATTEMPTS: [(WireShape, DecodeAttempt); 3] = [
    (WireShape::Body, attempt_body),
    (WireShape::Signed, attempt_signed),
    (WireShape::List, attempt_list),
];

fn body_cell(body_bytes: Vec<u8>, signatures: SignatureMap) -> Result<DecodedCell, AttemptError> {
    let body = decode_envelope::<TransactionBody>(WireShape::Body, &body_bytes).map_err(|e| match e {
        AttemptError::Declined => AttemptError::Failed(DecodeError::Malformed {
            shape: WireShape::Signed.name(),
            reason: "body_bytes is not a body envelope".into(),
        }),
        failed => failed,
    })?;
    Ok(DecodedCell {
        body,
        body_bytes,
        signatures,
    })
}

fn attempt_body(bytes: &[u8]) -> Result<Decoded, AttemptError> {
    let body = decode_envelope(WireShape::Body, bytes)?;
    Ok(Decoded::Body(DecodedCell {
        body,
        body_bytes: bytes.to_vec(),
        signatures: SignatureMap::new(),
    }))
}

fn signed_cell(bytes: &[u8]) -> Result<DecodedCell, AttemptError> {
    let signed: SignedTransaction = decode_envelope(WireShape::Signed, bytes)?;
    body_cell(signed.body_bytes, signed.sig_map)
}

fn attempt_signed(bytes: &[u8]) -> Result<Decoded, AttemptError> {
    signed_cell(bytes).map(Decoded::Signed)
}

fn attempt_list(bytes: &[u8]) -> Result<Decoded, AttemptError> {
    let list: TransactionList = decode_envelope(WireShape::List, bytes)?;
    if list.transactions.is_empty() {
        return Err(AttemptError::Failed(DecodeError::EmptyList));
    }
    let cells = list
        .transactions
        .iter()
        .map(|entry| {
            signed_cell(&entry.signed_transaction_bytes).map_err(|e| match e {
                AttemptError::Declined => AttemptError::Failed(DecodeError::Malformed {
                    shape: WireShape::List.name(),
                    reason: "entry is not a signed transaction envelope".into(),
                }),
                failed => failed,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Decoded::List(cells))
}

/// Decode bytes of any known shape.
pub fn decode(bytes: &[u8]) -> Result<Decoded, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }

    let mut declined = Vec::with_capacity(DECODE_ATTEMPTS.len());
    for (shape, attempt) in DECODE_ATTEMPTS {
        match attempt(bytes) {
            Ok(decoded) => return Ok(decoded),
            Err(AttemptError::Declined) => {
                declined.push(format!("not a {} (magic {:?})", shape, String::from_utf8_lossy(&shape.magic())));
            }
            Err(AttemptError::Failed(e)) => return Err(e),
        }
    }
    Err(DecodeError::Unrecognized(declined))
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// A matrix rebuilt from decoded cells, plus what the request needs to keep
/// behaving like one that was frozen locally.
#[derive(Debug)]
pub(crate) struct Assembled {
    pub content: TransactionContent,
    pub chunks: Vec<Chunk>,
    pub chunk_size: usize,
    pub max_chunks: usize,
    pub correlation_id: TransactionId,
    pub matrix: BodyMatrix,
    pub signatures: Vec<(usize, SignatureMap)>,
}

fn mismatch(field: &'static str, first: impl fmt::Debug, other: impl fmt::Debug) -> DecodeError {
    DecodeError::ContentMismatch {
        field,
        first: format!("{:?}", first),
        other: format!("{:?}", other),
    }
}

/// First field on which two bodies disagree, ignoring the node. With
/// `across_chunks`, the nonce, valid-start and chunk payload are ignored as
/// well; [`check_chunk_sequence`] decides whether a differing valid-start
/// is acceptable.
fn compare_bodies(
    first: &TransactionBody,
    other: &TransactionBody,
    across_chunks: bool,
) -> Result<(), DecodeError> {
    if across_chunks {
        let (a, b) = (&first.transaction_id, &other.transaction_id);
        if a.account_id != b.account_id || a.scheduled != b.scheduled {
            return Err(mismatch("transaction_id", a, b));
        }
    } else if first.transaction_id != other.transaction_id {
        return Err(mismatch("transaction_id", first.transaction_id, other.transaction_id));
    }
    if first.transaction_fee != other.transaction_fee {
        return Err(mismatch("transaction_fee", first.transaction_fee, other.transaction_fee));
    }
    if first.transaction_valid_duration != other.transaction_valid_duration {
        return Err(mismatch(
            "transaction_valid_duration",
            first.transaction_valid_duration,
            other.transaction_valid_duration,
        ));
    }
    if first.memo != other.memo {
        return Err(mismatch("memo", &first.memo, &other.memo));
    }
    if first.max_custom_fees != other.max_custom_fees {
        return Err(mismatch("max_custom_fees", &first.max_custom_fees, &other.max_custom_fees));
    }
    if first.batch_key != other.batch_key {
        return Err(mismatch("batch_key", first.batch_key, other.batch_key));
    }
    let (a, b) = if across_chunks {
        (first.data.chunk_template(), other.data.chunk_template())
    } else {
        (first.data.clone(), other.data.clone())
    };
    if a != b {
        return Err(mismatch("data", a.kind(), b.kind()).with_detail(&a, &b));
    }
    Ok(())
}

/// Rows of a chunked request must read as one split payload: every chunk
/// but the last exactly as long as chunk 0, the last one non-empty and no
/// longer, and topic chunks numbered `1..=total` with `total` equal to the
/// row count. Rows may sit on a valid-start other than chunk 0's only when
/// a topic correlation id ties them to it.
fn check_chunk_sequence(rows: &[Vec<DecodedCell>]) -> Result<(), DecodeError> {
    let head = &rows[0][0].body;
    let chunk_size = head.data.chunk_payload().map_or(0, <[u8]>::len);
    let last = rows.len() - 1;

    for (index, row) in rows.iter().enumerate() {
        let body = &row[0].body;
        let len = body.data.chunk_payload().map_or(0, <[u8]>::len);
        if index < last && len != chunk_size {
            return Err(DecodeError::IrregularMatrix(format!(
                "chunk {} carries {} payload bytes, chunk 0 carries {}",
                index, len, chunk_size
            )));
        }
        if index == last && last > 0 && (len == 0 || len > chunk_size) {
            return Err(DecodeError::IrregularMatrix(format!(
                "final chunk {} carries {} payload bytes, expected 1..={}",
                index, len, chunk_size
            )));
        }

        match &body.data {
            Operation::TopicMessageSubmit {
                chunk_info: Some(info),
                ..
            } => {
                if usize::try_from(info.total).ok() != Some(rows.len()) {
                    return Err(DecodeError::IrregularMatrix(format!(
                        "chunk {} belongs to a message of {} chunk(s), the container holds {}",
                        index,
                        info.total,
                        rows.len()
                    )));
                }
                if usize::try_from(info.number).ok() != Some(index + 1) {
                    return Err(DecodeError::IrregularMatrix(format!(
                        "chunk {} is numbered {}, expected {}",
                        index,
                        info.number,
                        index + 1
                    )));
                }
            }
            _ if body.transaction_id.valid_start != head.transaction_id.valid_start => {
                return Err(mismatch("transaction_id", head.transaction_id, body.transaction_id));
            }
            _ => {}
        }
    }
    Ok(())
}

impl DecodeError {
    /// Replace the summary in a data mismatch with full operation dumps
    /// when the kinds alone do not explain the difference.
    fn with_detail(self, a: &Operation, b: &Operation) -> Self {
        match self {
            DecodeError::ContentMismatch { field, first, other } if first == other => {
                DecodeError::ContentMismatch {
                    field,
                    first: format!("{:?}", a),
                    other: format!("{:?}", b),
                }
            }
            unchanged => unchanged,
        }
    }
}

/// Regroup decoded cells into a request matrix and verify they all describe
/// the same request.
pub(crate) fn assemble(cells: Vec<DecodedCell>) -> Result<Assembled, DecodeError> {
    // Group into rows by identity, in first-seen order.
    let mut row_of: HashMap<TransactionId, usize> = HashMap::new();
    let mut rows: Vec<Vec<DecodedCell>> = Vec::new();
    for cell in cells {
        let id = cell.body.transaction_id;
        let row = *row_of.entry(id).or_insert_with(|| {
            rows.push(Vec::new());
            rows.len() - 1
        });
        rows[row].push(cell);
    }
    let Some(first_row) = rows.first() else {
        return Err(DecodeError::EmptyList);
    };

    let nodes: Vec<NodeId> = first_row.iter().map(|c| c.body.node_account_id).collect();
    let mut distinct = nodes.clone();
    distinct.sort();
    distinct.dedup();
    if distinct.len() != nodes.len() {
        return Err(DecodeError::IrregularMatrix(
            "the same node appears twice for one transaction id".into(),
        ));
    }

    let head = first_row[0].body.clone();
    let chunked = head.data.chunk_payload().is_some();
    if !chunked && rows.len() > 1 {
        return Err(mismatch(
            "transaction_id",
            head.transaction_id,
            rows[1][0].body.transaction_id,
        ));
    }

    for (index, row) in rows.iter().enumerate() {
        let row_nodes: Vec<NodeId> = row.iter().map(|c| c.body.node_account_id).collect();
        if row_nodes != nodes {
            return Err(DecodeError::IrregularMatrix(format!(
                "chunk {} targets nodes {:?}, chunk 0 targets {:?}",
                index, row_nodes, nodes
            )));
        }
        let row_head = &row[0].body;
        let expected_nonce = row_head.transaction_id.for_chunk(index).nonce;
        if row_head.transaction_id.nonce != expected_nonce {
            return Err(DecodeError::IrregularMatrix(format!(
                "chunk {} carries nonce {:?}, expected {:?}",
                index, row_head.transaction_id.nonce, expected_nonce
            )));
        }
        for cell in &row[1..] {
            compare_bodies(row_head, &cell.body, false)?;
        }
        compare_bodies(&head, row_head, true)?;
    }
    if chunked {
        check_chunk_sequence(&rows)?;
    }

    // Reassemble the whole-request content from the chunk payloads.
    let payload: Vec<u8> = rows
        .iter()
        .flat_map(|row| row[0].body.data.chunk_payload().unwrap_or_default().to_vec())
        .collect();
    let first_chunk_len = head.data.chunk_payload().map_or(0, <[u8]>::len);
    let chunk_size = if rows.len() > 1 {
        first_chunk_len
    } else {
        first_chunk_len.max(DEFAULT_CHUNK_SIZE)
    };
    let mut content = head.content();
    if chunked {
        content.operation = head.data.with_payload(payload);
    }
    let correlation_id = match &head.data {
        Operation::TopicMessageSubmit {
            chunk_info: Some(info),
            ..
        } => info.initial_transaction_id,
        _ => head.transaction_id,
    };

    let chunks = rows
        .iter()
        .enumerate()
        .map(|(index, row)| Chunk {
            index,
            transaction_id: row[0].body.transaction_id,
            operation: row[0].body.data.clone(),
        })
        .collect::<Vec<_>>();

    let mut matrix_cells = Vec::with_capacity(rows.len() * nodes.len());
    let mut signatures = Vec::new();
    for (chunk, row) in rows.into_iter().enumerate() {
        for cell in row {
            if !cell.signatures.is_empty() {
                signatures.push((matrix_cells.len(), cell.signatures));
            }
            matrix_cells.push(Cell {
                chunk,
                transaction_id: cell.body.transaction_id,
                node: cell.body.node_account_id,
                body: cell.body_bytes,
            });
        }
    }

    Ok(Assembled {
        content,
        max_chunks: chunks.len().max(DEFAULT_MAX_CHUNKS),
        chunks,
        chunk_size,
        correlation_id,
        matrix: BodyMatrix::from_parts(nodes, matrix_cells),
        signatures,
    })
}
