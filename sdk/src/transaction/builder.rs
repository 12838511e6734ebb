//! Transaction construction via the builder pattern.
//!
//! [`TransactionBuilder`] collects the content of a request and consumes
//! itself on freeze, producing a [`FrozenTransaction`]. A frozen request has
//! no setters at all, so "modify after freeze" is a compile error rather
//! than a runtime one. [`super::lifecycle::Transaction`] offers the same
//! flow behind runtime checks.
//!
//! Freezing resolves anything left unset against a [`Client`]: node list,
//! identity (generated for the client's operator), default fee bound and
//! the regeneration flag.

use std::time::Duration;

use super::body::{CustomFeeLimit, SchedulableBody, TransactionContent};
use super::error::ConstructionError;
use super::frozen::{FreezeOptions, FrozenTransaction};
use super::operation::Operation;
use crate::config::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_CHUNKS};
use crate::crypto::PublicKey;
use crate::identity::{NodeId, TransactionId};
use crate::network::Client;

/// Fluent builder for a single request.
///
/// # Example
///
/// ```rust
/// use tessera_sdk::identity::{AccountId, NodeId, Timestamp, TransactionId};
/// use tessera_sdk::transaction::{Operation, TransactionBuilder, Transfer};
///
/// let payer = AccountId::from_num(1001);
/// let frozen = TransactionBuilder::new(Operation::transfer(vec![
///         Transfer::new(payer, -10),
///         Transfer::new(AccountId::from_num(1002), 10),
///     ]))
///     .transaction_id(TransactionId::with_valid_start(payer, Timestamp::from_seconds(1_700_000_000)))
///     .node_account_ids([NodeId::from_num(3)])
///     .memo("rent")
///     .freeze()
///     .unwrap();
/// assert_eq!(frozen.chunk_count(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct TransactionBuilder {
    content: TransactionContent,
    transaction_id: Option<TransactionId>,
    node_account_ids: Vec<NodeId>,
    regenerate_transaction_id: Option<bool>,
    chunk_size: usize,
    max_chunks: usize,
}

impl TransactionBuilder {
    /// Creates a builder for `operation`.
    ///
    /// Defaults: no explicit fee or validity window (network defaults
    /// apply), empty memo, chunk size 1024, at most 20 chunks.
    pub fn new(operation: Operation) -> Self {
        Self {
            content: TransactionContent::new(operation),
            transaction_id: None,
            node_account_ids: Vec::new(),
            regenerate_transaction_id: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_chunks: DEFAULT_MAX_CHUNKS,
        }
    }

    /// Replaces the operation.
    pub fn operation(mut self, operation: Operation) -> Self {
        self.content.operation = operation;
        self
    }

    /// Sets the identity explicitly. An explicit identity is never
    /// regenerated during execution.
    pub fn transaction_id(mut self, transaction_id: TransactionId) -> Self {
        self.transaction_id = Some(transaction_id);
        self
    }

    /// Sets the target nodes. Duplicates are dropped, first occurrence wins.
    pub fn node_account_ids(mut self, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        self.node_account_ids = dedup_nodes(nodes);
        self
    }

    pub fn max_transaction_fee(mut self, fee: u64) -> Self {
        self.content.max_transaction_fee = Some(fee);
        self
    }

    /// Validity window. The wire carries whole seconds, so any sub-second
    /// part is dropped here and the frozen request holds exactly what is
    /// encoded.
    pub fn valid_duration(mut self, duration: Duration) -> Self {
        self.content.valid_duration = Some(whole_seconds(duration));
        self
    }

    pub fn memo(mut self, memo: impl Into<String>) -> Self {
        self.content.memo = memo.into();
        self
    }

    pub fn custom_fee_limits(mut self, limits: Vec<CustomFeeLimit>) -> Self {
        self.content.custom_fee_limits = limits;
        self
    }

    pub fn batch_key(mut self, key: PublicKey) -> Self {
        self.content.batch_key = Some(key);
        self
    }

    /// Overrides the client's setting for answering an expired identity
    /// with a fresh one.
    pub fn regenerate_transaction_id(mut self, regenerate: bool) -> Self {
        self.regenerate_transaction_id = Some(regenerate);
        self
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn max_chunks(mut self, max_chunks: usize) -> Self {
        self.max_chunks = max_chunks;
        self
    }

    /// Wrap this request in a schedule-create request.
    ///
    /// The wrapped request keeps its fee bound, memo, fee limits and
    /// operation; the schedule takes over its transaction id when one was
    /// set. Nodes belong to the outer request, so none may be set here, and
    /// a chunked payload must fit in a single chunk.
    pub fn schedule(self) -> Result<TransactionBuilder, ConstructionError> {
        if !self.node_account_ids.is_empty() {
            return Err(ConstructionError::NotSchedulable(
                "the scheduled transaction cannot have node account ids",
            ));
        }
        if matches!(self.content.operation, Operation::ScheduleCreate { .. }) {
            return Err(ConstructionError::NotSchedulable("a schedule cannot wrap another schedule"));
        }
        self.content.validate()?;
        if self
            .content
            .operation
            .chunk_payload()
            .is_some_and(|payload| payload.len() > self.chunk_size)
        {
            return Err(ConstructionError::NotSchedulable(
                "a payload longer than one chunk cannot be scheduled",
            ));
        }

        let mut schedule = TransactionBuilder::new(Operation::ScheduleCreate {
            scheduled: Box::new(SchedulableBody::new(&self.content)),
        });
        schedule.transaction_id = self.transaction_id;
        Ok(schedule)
    }

    /// Mark this request as the inner transaction of a batch: set the batch
    /// key, freeze against `client` and sign with the client's operator.
    pub fn batchify(self, client: &Client, batch_key: PublicKey) -> Result<FrozenTransaction, ConstructionError> {
        let frozen = self.batch_key(batch_key).freeze_with(client)?;
        frozen.sign_with_operator(client)?;
        Ok(frozen)
    }

    /// Freeze without a client. Nodes and identity must both be set.
    pub fn freeze(self) -> Result<FrozenTransaction, ConstructionError> {
        self.freeze_inner(None)
    }

    /// Freeze, taking anything left unset from `client`.
    pub fn freeze_with(self, client: &Client) -> Result<FrozenTransaction, ConstructionError> {
        self.freeze_inner(Some(client))
    }

    pub(crate) fn freeze_inner(self, client: Option<&Client>) -> Result<FrozenTransaction, ConstructionError> {
        let mut content = self.content;
        content.validate()?;
        content.valid_duration = content.valid_duration.map(whole_seconds);
        if content.max_transaction_fee.is_none() {
            content.max_transaction_fee = client.and_then(Client::default_max_transaction_fee);
        }

        let nodes = match (self.node_account_ids.is_empty(), client) {
            (false, _) => self.node_account_ids,
            (true, Some(client)) => client.nodes().to_vec(),
            (true, None) => Vec::new(),
        };
        if nodes.is_empty() {
            return Err(ConstructionError::NoNodes);
        }

        let (transaction_id, id_pinned) = match self.transaction_id {
            Some(id) => (id, true),
            None => {
                let client = client.ok_or(ConstructionError::MissingTransactionId)?;
                let payer = client
                    .operator_account_id()
                    .ok_or(ConstructionError::MissingTransactionId)?;
                (client.generator().next(payer), false)
            }
        };

        let regenerate_transaction_id = self
            .regenerate_transaction_id
            .or_else(|| client.map(|c| c.execution_config().regenerate_transaction_id))
            .unwrap_or(true);

        FrozenTransaction::freeze(
            content,
            transaction_id,
            &nodes,
            FreezeOptions {
                chunk_size: self.chunk_size,
                max_chunks: self.max_chunks,
                id_pinned,
                regenerate_transaction_id,
            },
        )
    }

    pub(crate) fn content_mut(&mut self) -> &mut TransactionContent {
        &mut self.content
    }

    pub(crate) fn set_transaction_id(&mut self, transaction_id: TransactionId) {
        self.transaction_id = Some(transaction_id);
    }

    pub(crate) fn set_node_account_ids(&mut self, nodes: Vec<NodeId>) {
        self.node_account_ids = dedup_nodes(nodes);
    }

    pub(crate) fn set_regenerate_transaction_id(&mut self, regenerate: bool) {
        self.regenerate_transaction_id = Some(regenerate);
    }

    pub(crate) fn set_chunk_size(&mut self, chunk_size: usize) {
        self.chunk_size = chunk_size;
    }

    pub(crate) fn set_max_chunks(&mut self, max_chunks: usize) {
        self.max_chunks = max_chunks;
    }
}

pub(crate) fn whole_seconds(duration: Duration) -> Duration {
    Duration::from_secs(duration.as_secs())
}

fn dedup_nodes(nodes: impl IntoIterator<Item = NodeId>) -> Vec<NodeId> {
    let mut out: Vec<NodeId> = Vec::new();
    for node in nodes {
        if !out.contains(&node) {
            out.push(node);
        }
    }
    out
}
