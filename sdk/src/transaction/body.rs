//! # Wire Body Builder
//!
//! Turns `(content, identity, node)` into the canonical unsigned body bytes
//! for one matrix cell.
//!
//! [`build_body`] is a pure function: no clocks, no RNG, no hidden state.
//! The same triple always yields byte-identical output, which is what lets
//! the matrix be built once at freeze time and trusted afterwards.
//!
//! Optional fields that were never set are encoded as absent, so a body
//! carrying an explicit fee or validity window is always strictly larger
//! than one that leaves them to the network defaults.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::codec::{encode_envelope, WireShape};
use super::error::ConstructionError;
use super::operation::Operation;
use crate::config::{DEFAULT_MAX_TRANSACTION_FEE, DEFAULT_TRANSACTION_VALID_DURATION, MAX_MEMO_BYTES};
use crate::crypto::PublicKey;
use crate::identity::{AccountId, NodeId, TransactionId};

/// Upper bound on custom fees the payer accepts for one fee collector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomFeeLimit {
    /// Account the limit applies to. `None` means any collector.
    pub account_id: Option<AccountId>,
    pub max_amount: u64,
}

/// The schedulable part of a request: what the network executes once the
/// schedule collects its signatures. Identity, node and validity window
/// belong to the schedule-create request carrying it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulableBody {
    pub transaction_fee: Option<u64>,
    pub memo: String,
    pub max_custom_fees: Vec<CustomFeeLimit>,
    pub data: Operation,
}

impl SchedulableBody {
    pub fn new(content: &TransactionContent) -> Self {
        Self {
            transaction_fee: content.max_transaction_fee,
            memo: content.memo.clone(),
            max_custom_fees: content.custom_fee_limits.clone(),
            data: content.operation.clone(),
        }
    }
}

/// Everything a request says, independent of identity and target node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionContent {
    pub operation: Operation,
    pub max_transaction_fee: Option<u64>,
    pub valid_duration: Option<Duration>,
    pub memo: String,
    pub custom_fee_limits: Vec<CustomFeeLimit>,
    pub batch_key: Option<PublicKey>,
}

impl TransactionContent {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            max_transaction_fee: None,
            valid_duration: None,
            memo: String::new(),
            custom_fee_limits: Vec::new(),
            batch_key: None,
        }
    }

    /// Check the content can be encoded.
    pub fn validate(&self) -> Result<(), ConstructionError> {
        if self.memo.len() > MAX_MEMO_BYTES {
            return Err(ConstructionError::MemoTooLong {
                len: self.memo.len(),
                max: MAX_MEMO_BYTES,
            });
        }
        self.operation.validate()
    }

    /// Fee bound the network will apply: the explicit one, or the default.
    pub fn effective_max_fee(&self) -> u64 {
        self.max_transaction_fee.unwrap_or(DEFAULT_MAX_TRANSACTION_FEE)
    }

    /// Validity window the network will apply.
    pub fn effective_valid_duration(&self) -> Duration {
        self.valid_duration
            .unwrap_or(DEFAULT_TRANSACTION_VALID_DURATION)
    }

    /// Same content with the operation swapped for a chunk's operation.
    pub(crate) fn with_operation(&self, operation: Operation) -> Self {
        Self {
            operation,
            ..self.clone()
        }
    }
}

/// The decoded form of shape A.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionBody {
    pub transaction_id: TransactionId,
    pub node_account_id: NodeId,
    pub transaction_fee: Option<u64>,
    /// Validity window in whole seconds.
    pub transaction_valid_duration: Option<u64>,
    pub memo: String,
    pub max_custom_fees: Vec<CustomFeeLimit>,
    pub batch_key: Option<PublicKey>,
    pub data: Operation,
}

impl TransactionBody {
    pub fn new(content: &TransactionContent, transaction_id: TransactionId, node: NodeId) -> Self {
        Self {
            transaction_id,
            node_account_id: node,
            transaction_fee: content.max_transaction_fee,
            transaction_valid_duration: content.valid_duration.map(|d| d.as_secs()),
            memo: content.memo.clone(),
            max_custom_fees: content.custom_fee_limits.clone(),
            batch_key: content.batch_key,
            data: content.operation.clone(),
        }
    }

    /// Recover the request content this body was built from. For a chunked
    /// request this is the content of one chunk.
    pub fn content(&self) -> TransactionContent {
        TransactionContent {
            operation: self.data.clone(),
            max_transaction_fee: self.transaction_fee,
            valid_duration: self.transaction_valid_duration.map(Duration::from_secs),
            memo: self.memo.clone(),
            custom_fee_limits: self.max_custom_fees.clone(),
            batch_key: self.batch_key,
        }
    }

    /// Shape A encoding.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ConstructionError> {
        encode_envelope(WireShape::Body, self).map_err(|e| ConstructionError::Encoding(e.to_string()))
    }
}

/// Build the canonical body bytes for one cell.
pub fn build_body(
    content: &TransactionContent,
    transaction_id: &TransactionId,
    node: &NodeId,
) -> Result<Vec<u8>, ConstructionError> {
    content.validate()?;
    TransactionBody::new(content, *transaction_id, *node).to_bytes()
}
