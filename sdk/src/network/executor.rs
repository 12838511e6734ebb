//! # Execution Engine
//!
//! Drives a frozen request to acceptance, chunk by chunk.
//!
//! ## Loop
//!
//! ```text
//! for chunk in 0..chunks:
//!     check cancellation
//!     node = first node
//!     loop:
//!         submit signed cell (chunk, node) under the per-attempt timeout
//!         OK                  -> accepted, next chunk
//!         node fault          -> next node (round robin)
//!         TRANSACTION_EXPIRED -> fresh identity, rebuild + re-sign rows
//!                                chunk.., or fatal if not allowed
//!         anything else       -> fatal
//!         attempts exhausted  -> MaxAttemptsExceeded
//!         sleep(backoff(attempt))
//! ```
//!
//! Node faults are `BUSY`, `PLATFORM_TRANSACTION_NOT_CREATED`,
//! `PLATFORM_NOT_ACTIVE`, `INVALID_NODE_ACCOUNT`, transport
//! unavailability/exhaustion and attempt timeouts.
//!
//! Chunks are strictly sequential: chunk `k + 1` is never submitted before
//! chunk `k` is accepted. Cancellation is observed only between chunks, so
//! a chunk that has been sent is always seen through to a verdict.
//!
//! Regeneration is allowed only when the request's flag is on, its identity
//! was generated (not set by the caller, not decoded from bytes), and every
//! key that has signed has a registered signer able to sign the new bodies.
//! Every identity ever submitted is remembered; drawing one twice is an
//! [`ExecutionError::IdentityCollision`].

use std::collections::HashSet;
use std::fmt;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::watch;
use tokio::task::block_in_place;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use super::backoff::BackoffPolicy;
use super::client::Client;
use super::transport::TransportError;
use crate::config::DEFAULT_MAX_ATTEMPTS;
use crate::crypto::sha384;
use crate::identity::{NodeId, TransactionId};
use crate::transaction::{ConstructionError, FrozenTransaction, Status, StatusClass, Transaction};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Retry envelope for execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionConfig {
    /// Submission attempts per chunk, first attempt included.
    pub max_attempts: u32,
    pub backoff: BackoffPolicy,
    /// Default for requests that do not set the flag themselves.
    pub regenerate_transaction_id: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: BackoffPolicy::default(),
            regenerate_transaction_id: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Why an attempt was not accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    Status(Status),
    Transport(TransportError),
    Timeout(Duration),
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::Status(status) => write!(f, "status {}", status),
            Fault::Transport(e) => write!(f, "{}", e),
            Fault::Timeout(after) => write!(f, "no reply within {:?}", after),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExecutionError {
    /// A node rejected the request with a non-retryable status.
    #[error("transaction {transaction_id} failed precheck with status {status}")]
    Precheck {
        status: Status,
        transaction_id: TransactionId,
    },

    #[error("chunk {chunk} not accepted after {attempts} attempts, last fault: {last}")]
    MaxAttemptsExceeded { chunk: usize, attempts: u32, last: Fault },

    #[error("regenerated transaction id {0} was already attempted")]
    IdentityCollision(TransactionId),

    #[error("execution cancelled after {completed} accepted chunk(s)")]
    Cancelled { completed: usize },

    /// A transport failure that another node would not fix.
    #[error("transport failure: {0}")]
    Transport(TransportError),

    #[error(transparent)]
    Construction(#[from] ConstructionError),

    /// Blocking execution could not get a runtime to drive it.
    #[error("blocking execution unavailable: {0}")]
    Runtime(String),
}

/// One accepted chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionResponse {
    pub node: NodeId,
    pub transaction_id: TransactionId,
    /// SHA-384 of the shape B bytes the node accepted.
    pub transaction_hash: Vec<u8>,
    pub status: Status,
    /// Attempts spent on this chunk, the accepting one included.
    pub attempts: u32,
}

enum Retry {
    NextNode,
    Regenerate,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

fn cancelled(cancel: &Option<watch::Receiver<bool>>) -> bool {
    cancel.as_ref().is_some_and(|rx| *rx.borrow())
}

async fn run(
    tx: &mut FrozenTransaction,
    client: &Client,
    cancel: Option<watch::Receiver<bool>>,
) -> Result<Vec<TransactionResponse>, ExecutionError> {
    let config = client.execution_config().clone();
    let metrics = client.metrics();
    let request_timeout = client.request_timeout();

    if let Some(operator) = client.operator_signer() {
        if !tx.has_signer(&operator.public_key()) {
            tx.sign_shared(operator);
        }
    }

    let mut attempted: HashSet<TransactionId> = tx.transaction_ids().into_iter().collect();
    let mut responses = Vec::with_capacity(tx.chunk_count());
    let node_count = tx.matrix().node_count();

    for chunk in 0..tx.chunk_count() {
        if cancelled(&cancel) {
            info!(completed = chunk, "execution cancelled");
            return Err(ExecutionError::Cancelled { completed: chunk });
        }

        let mut node_index = 0;
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let index = tx.matrix().index_of(chunk, node_index);
            let (node, transaction_id) = match tx.matrix().cell(index) {
                Some(cell) => (cell.node, cell.transaction_id),
                None => return Err(ConstructionError::Encoding(format!("no cell at index {}", index)).into()),
            };
            let bytes = tx.signed_cell_bytes(index)?;
            let hash = sha384(&bytes);

            debug!(node = %node, transaction_id = %transaction_id, chunk, attempt, "submitting");
            if let Some(m) = metrics {
                m.submissions_total.inc();
            }
            let started = Instant::now();
            let outcome = timeout(request_timeout, client.transport().submit(node, bytes)).await;
            if let Some(m) = metrics {
                m.attempt_latency_seconds.observe(started.elapsed().as_secs_f64());
            }

            let (fault, retry) = match outcome {
                Ok(Ok(response)) => match response.status.class() {
                    StatusClass::Accepted => {
                        info!(node = %node, transaction_id = %transaction_id, chunk, attempt, "chunk accepted");
                        if let Some(m) = metrics {
                            m.chunks_accepted_total.inc();
                        }
                        responses.push(TransactionResponse {
                            node,
                            transaction_id,
                            transaction_hash: hash,
                            status: response.status,
                            attempts: attempt,
                        });
                        break;
                    }
                    StatusClass::NodeFault => (Fault::Status(response.status), Retry::NextNode),
                    StatusClass::IdentityFault if tx.can_regenerate() => {
                        (Fault::Status(response.status), Retry::Regenerate)
                    }
                    StatusClass::IdentityFault | StatusClass::Fatal => {
                        warn!(node = %node, transaction_id = %transaction_id, status = %response.status, "precheck failed");
                        if let Some(m) = metrics {
                            m.fatal_faults_total.inc();
                        }
                        return Err(ExecutionError::Precheck {
                            status: response.status,
                            transaction_id,
                        });
                    }
                },
                Ok(Err(e)) if e.is_node_fault() => (Fault::Transport(e), Retry::NextNode),
                Ok(Err(e)) => {
                    warn!(node = %node, error = %e, "transport failed");
                    if let Some(m) = metrics {
                        m.fatal_faults_total.inc();
                    }
                    return Err(ExecutionError::Transport(e));
                }
                Err(_) => (Fault::Timeout(request_timeout), Retry::NextNode),
            };

            warn!(node = %node, transaction_id = %transaction_id, attempt, fault = %fault, "attempt failed");
            if let (Some(m), Retry::NextNode) = (metrics, &retry) {
                m.node_faults_total.inc();
            }
            if attempt >= config.max_attempts {
                if let Some(m) = metrics {
                    m.fatal_faults_total.inc();
                }
                return Err(ExecutionError::MaxAttemptsExceeded {
                    chunk,
                    attempts: attempt,
                    last: fault,
                });
            }

            match retry {
                Retry::NextNode => {
                    node_index = (node_index + 1) % node_count;
                }
                Retry::Regenerate => {
                    let fresh = client.generator().next(tx.transaction_id().account_id);
                    if !attempted.insert(fresh.for_chunk(chunk)) {
                        return Err(ExecutionError::IdentityCollision(fresh.for_chunk(chunk)));
                    }
                    tx.regenerate_from(chunk, fresh)?;
                    attempted.extend(tx.transaction_ids().into_iter().skip(chunk));
                    if let Some(m) = metrics {
                        m.identity_regenerations_total.inc();
                    }
                    info!(
                        expired = %transaction_id,
                        fresh = %fresh.for_chunk(chunk),
                        chunk,
                        "transaction id regenerated"
                    );
                }
            }

            sleep(config.backoff.delay_for(attempt)).await;
        }
    }

    Ok(responses)
}

impl FrozenTransaction {
    /// Execute every chunk; returns the first chunk's response.
    pub async fn execute(&mut self, client: &Client) -> Result<TransactionResponse, ExecutionError> {
        first(self.execute_all(client).await?)
    }

    /// Execute every chunk; returns one response per chunk, in order.
    pub async fn execute_all(&mut self, client: &Client) -> Result<Vec<TransactionResponse>, ExecutionError> {
        run(self, client, None).await
    }

    /// [`execute_all`](Self::execute_all), stopping at the next chunk
    /// boundary once `cancel` reads `true`.
    pub async fn execute_all_with_cancel(
        &mut self,
        client: &Client,
        cancel: watch::Receiver<bool>,
    ) -> Result<Vec<TransactionResponse>, ExecutionError> {
        run(self, client, Some(cancel)).await
    }

    /// Blocking form of [`execute`](Self::execute).
    pub fn execute_blocking(&mut self, client: &Client) -> Result<TransactionResponse, ExecutionError> {
        first(self.execute_all_blocking(client)?)
    }

    /// Blocking form of [`execute_all`](Self::execute_all).
    ///
    /// Outside a runtime this drives a private current-thread runtime.
    /// Inside a multi-threaded runtime the calling worker is handed over
    /// with `block_in_place` and the ambient runtime drives the request.
    /// A current-thread runtime cannot be blocked on from within, so that
    /// case fails with [`ExecutionError::Runtime`] instead of panicking.
    pub fn execute_all_blocking(&mut self, client: &Client) -> Result<Vec<TransactionResponse>, ExecutionError> {
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                block_in_place(|| handle.block_on(self.execute_all(client)))
            }
            Ok(_) => Err(ExecutionError::Runtime(
                "cannot block inside a current-thread runtime; use the async execute".into(),
            )),
            Err(_) => {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .map_err(|e| ExecutionError::Runtime(format!("failed to create runtime: {}", e)))?;
                runtime.block_on(self.execute_all(client))
            }
        }
    }
}

impl Transaction {
    /// Execute a frozen request. Fails with `NotFrozen` on a draft.
    pub async fn execute(&mut self, client: &Client) -> Result<TransactionResponse, ExecutionError> {
        self.frozen_mut()?.execute(client).await
    }

    pub async fn execute_all(&mut self, client: &Client) -> Result<Vec<TransactionResponse>, ExecutionError> {
        self.frozen_mut()?.execute_all(client).await
    }

    pub fn execute_blocking(&mut self, client: &Client) -> Result<TransactionResponse, ExecutionError> {
        self.frozen_mut()?.execute_blocking(client)
    }
}

fn first(responses: Vec<TransactionResponse>) -> Result<TransactionResponse, ExecutionError> {
    responses
        .into_iter()
        .next()
        .ok_or_else(|| ConstructionError::Encoding("request produced no chunks".into()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;
    use crate::identity::{AccountId, FileId, Timestamp};
    use crate::network::{ExecutionMetrics, MockReply, MockTransport};
    use crate::transaction::{decode, Operation, TransactionBuilder, Transfer};
    use std::sync::Arc;

    const OPERATOR: AccountId = AccountId::from_num(1001);

    fn nodes() -> Vec<NodeId> {
        vec![NodeId::from_num(3), NodeId::from_num(4)]
    }

    fn client_with(mock: &Arc<MockTransport>, operator: &Keypair) -> Client {
        Client::builder(Arc::clone(mock) as Arc<dyn crate::network::Transport>)
            .nodes(nodes())
            .operator(OPERATOR, operator.clone())
            .metrics(ExecutionMetrics::new().unwrap())
            .build()
    }

    fn transfer() -> Operation {
        Operation::transfer(vec![
            Transfer::new(OPERATOR, -10),
            Transfer::new(AccountId::from_num(1002), 10),
        ])
    }

    /// Transaction id carried by a submitted shape B envelope.
    fn submitted_id(bytes: &[u8]) -> TransactionId {
        decode(bytes).unwrap().into_cells()[0].body.transaction_id
    }

    fn submitted_node(bytes: &[u8]) -> NodeId {
        decode(bytes).unwrap().into_cells()[0].body.node_account_id
    }

    #[tokio::test(start_paused = true)]
    async fn accepted_on_first_attempt() {
        let mock = Arc::new(MockTransport::new());
        let operator = Keypair::generate();
        let client = client_with(&mock, &operator);
        let mut tx = TransactionBuilder::new(transfer()).freeze_with(&client).unwrap();

        let response = tx.execute(&client).await.unwrap();
        assert_eq!(response.status, Status::Ok);
        assert_eq!(response.node, NodeId::from_num(3));
        assert_eq!(response.attempts, 1);
        assert!(tx.is_signed_by(&operator.public_key()), "operator signs implicitly");
        assert_eq!(client.metrics().unwrap().chunks_accepted_total.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_three_times_then_accepted() {
        let mock = Arc::new(MockTransport::with_replies([
            MockReply::Status(Status::TransactionExpired),
            MockReply::Status(Status::TransactionExpired),
            MockReply::Status(Status::TransactionExpired),
        ]));
        let operator = Keypair::generate();
        let client = client_with(&mock, &operator);
        let mut tx = TransactionBuilder::new(transfer()).freeze_with(&client).unwrap();
        let original = tx.transaction_id();

        let response = tx.execute(&client).await.unwrap();

        let ids: Vec<_> = mock.submissions().iter().map(|s| submitted_id(&s.bytes)).collect();
        assert_eq!(ids.len(), 4);
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 4, "every attempt used a fresh id");
        assert_eq!(ids[0], original);
        assert_eq!(response.transaction_id, ids[3]);
        assert_eq!(tx.transaction_id(), ids[3]);

        // Only the final identity holds signatures, and they verify.
        let all = tx.get_all_signatures();
        assert_eq!(all.keys().copied().collect::<Vec<_>>(), vec![ids[3]]);
        for body in tx.signable_bodies() {
            let sigs = &all[&body.transaction_id][&body.node];
            assert!(operator.public_key().verify(&body.body, &sigs[&operator.public_key()]));
        }
        assert_eq!(client.metrics().unwrap().identity_regenerations_total.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn pinned_identity_expiry_is_fatal() {
        let mock = Arc::new(MockTransport::with_replies([MockReply::Status(Status::TransactionExpired)]));
        let operator = Keypair::generate();
        let client = client_with(&mock, &operator);
        let pinned = TransactionId::with_valid_start(OPERATOR, Timestamp::from_seconds(1_700_000_000));
        let mut tx = TransactionBuilder::new(transfer())
            .transaction_id(pinned)
            .freeze_with(&client)
            .unwrap();

        match tx.execute(&client).await {
            Err(ExecutionError::Precheck { status, transaction_id }) => {
                assert_eq!(status, Status::TransactionExpired);
                assert_eq!(transaction_id, pinned);
            }
            other => panic!("expected Precheck, got {other:?}"),
        }
        assert_eq!(mock.submission_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_with_foreign_signature_is_fatal() {
        let mock = Arc::new(MockTransport::with_replies([MockReply::Status(Status::TransactionExpired)]));
        let operator = Keypair::generate();
        let client = client_with(&mock, &operator);
        let tx_frozen = TransactionBuilder::new(transfer()).freeze_with(&client).unwrap();
        let outsider = Keypair::generate();
        for body in tx_frozen.signable_bodies() {
            tx_frozen.add_signature(outsider.public_key(), outsider.sign(&body.body), &body.transaction_id, &body.node);
        }
        let mut tx = tx_frozen;

        assert!(matches!(
            tx.execute(&client).await,
            Err(ExecutionError::Precheck { status: Status::TransactionExpired, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn busy_fails_over_to_next_node() {
        let mock = Arc::new(MockTransport::with_replies([MockReply::Status(Status::Busy)]));
        let operator = Keypair::generate();
        let client = client_with(&mock, &operator);
        let mut tx = TransactionBuilder::new(transfer()).freeze_with(&client).unwrap();

        let response = tx.execute(&client).await.unwrap();
        let targets: Vec<_> = mock.submissions().iter().map(|s| s.node).collect();
        assert_eq!(targets, vec![NodeId::from_num(3), NodeId::from_num(4)]);
        assert_eq!(response.node, NodeId::from_num(4));
        assert_eq!(response.attempts, 2);
        // The identity survives a node fault.
        assert_eq!(submitted_id(&mock.submissions()[1].bytes), tx.transaction_id());
        assert_eq!(submitted_node(&mock.submissions()[1].bytes), NodeId::from_num(4));
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_grows_between_attempts() {
        let mock = Arc::new(MockTransport::with_replies([
            MockReply::Status(Status::Busy),
            MockReply::Status(Status::Busy),
            MockReply::Status(Status::Busy),
        ]));
        let operator = Keypair::generate();
        let client = client_with(&mock, &operator);
        let mut tx = TransactionBuilder::new(transfer()).freeze_with(&client).unwrap();

        let started = tokio::time::Instant::now();
        tx.execute(&client).await.unwrap();
        // 250 + 500 + 1000 ms of backoff before the fourth attempt.
        assert!(started.elapsed() >= Duration::from_millis(1750));
    }

    #[tokio::test(start_paused = true)]
    async fn transport_unavailable_is_a_node_fault() {
        let mock = Arc::new(MockTransport::with_replies([MockReply::Error(TransportError::Unavailable(
            NodeId::from_num(3),
        ))]));
        let operator = Keypair::generate();
        let client = client_with(&mock, &operator);
        let mut tx = TransactionBuilder::new(transfer()).freeze_with(&client).unwrap();

        assert_eq!(tx.execute(&client).await.unwrap().node, NodeId::from_num(4));
    }

    #[tokio::test(start_paused = true)]
    async fn other_transport_errors_are_fatal() {
        let mock = Arc::new(MockTransport::with_replies([MockReply::Error(TransportError::Other("tls".into()))]));
        let operator = Keypair::generate();
        let client = client_with(&mock, &operator);
        let mut tx = TransactionBuilder::new(transfer()).freeze_with(&client).unwrap();

        assert!(matches!(tx.execute(&client).await, Err(ExecutionError::Transport(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn attempt_timeout_is_a_node_fault() {
        let mock = Arc::new(MockTransport::with_replies([MockReply::Hang]));
        let operator = Keypair::generate();
        let client = Client::builder(Arc::clone(&mock) as Arc<dyn crate::network::Transport>)
            .nodes(nodes())
            .operator(OPERATOR, operator)
            .request_timeout(Duration::from_secs(2))
            .build();
        let mut tx = TransactionBuilder::new(transfer()).freeze_with(&client).unwrap();

        let response = tx.execute(&client).await.unwrap();
        assert_eq!(response.node, NodeId::from_num(4));
        assert_eq!(response.attempts, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_status_stops_immediately() {
        let mock = Arc::new(MockTransport::with_replies([MockReply::Status(Status::InsufficientPayerBalance)]));
        let operator = Keypair::generate();
        let client = client_with(&mock, &operator);
        let mut tx = TransactionBuilder::new(transfer()).freeze_with(&client).unwrap();

        assert!(matches!(
            tx.execute(&client).await,
            Err(ExecutionError::Precheck { status: Status::InsufficientPayerBalance, .. })
        ));
        assert_eq!(mock.submission_count(), 1);
        assert_eq!(client.metrics().unwrap().fatal_faults_total.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let mock = Arc::new(MockTransport::with_replies(
            std::iter::repeat(MockReply::Status(Status::Busy)).take(20),
        ));
        let operator = Keypair::generate();
        let client = client_with(&mock, &operator);
        let mut tx = TransactionBuilder::new(transfer()).freeze_with(&client).unwrap();

        match tx.execute(&client).await {
            Err(ExecutionError::MaxAttemptsExceeded { chunk, attempts, last }) => {
                assert_eq!(chunk, 0);
                assert_eq!(attempts, DEFAULT_MAX_ATTEMPTS);
                assert_eq!(last, Fault::Status(Status::Busy));
            }
            other => panic!("expected MaxAttemptsExceeded, got {other:?}"),
        }
        assert_eq!(mock.submission_count(), DEFAULT_MAX_ATTEMPTS as usize);
        let metrics = client.metrics().unwrap();
        assert_eq!(metrics.node_faults_total.get(), u64::from(DEFAULT_MAX_ATTEMPTS));
        assert_eq!(metrics.fatal_faults_total.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn chunks_are_submitted_in_order() {
        let mock = Arc::new(MockTransport::new());
        let operator = Keypair::generate();
        let client = client_with(&mock, &operator);
        let mut tx = TransactionBuilder::new(Operation::file_append(FileId::from_num(9), vec![1u8; 4096]))
            .chunk_size(2048)
            .freeze_with(&client)
            .unwrap();
        assert_eq!(tx.signable_bodies().len(), 4);

        let responses = tx.execute_all(&client).await.unwrap();
        assert_eq!(responses.len(), 2);

        let ids: Vec<_> = mock.submissions().iter().map(|s| submitted_id(&s.bytes)).collect();
        assert_eq!(ids, vec![tx.transaction_id(), tx.transaction_id().for_chunk(1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_on_second_chunk_keeps_first_chunk() {
        let mock = Arc::new(MockTransport::with_replies([
            MockReply::Status(Status::Ok),
            MockReply::Status(Status::TransactionExpired),
        ]));
        let operator = Keypair::generate();
        let client = client_with(&mock, &operator);
        let mut tx = TransactionBuilder::new(Operation::file_append(FileId::from_num(9), vec![1u8; 4096]))
            .chunk_size(2048)
            .freeze_with(&client)
            .unwrap();
        let first_id = tx.transaction_id();

        let responses = tx.execute_all(&client).await.unwrap();
        assert_eq!(responses[0].transaction_id, first_id);
        assert_ne!(responses[1].transaction_id.valid_start, first_id.valid_start);
        assert_eq!(responses[1].transaction_id.nonce, Some(1));
        assert_eq!(tx.transaction_id(), first_id);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_is_observed_between_chunks() {
        let mock = Arc::new(MockTransport::new());
        let operator = Keypair::generate();
        let client = client_with(&mock, &operator);
        let mut tx = TransactionBuilder::new(Operation::file_append(FileId::from_num(9), vec![1u8; 4096]))
            .chunk_size(2048)
            .freeze_with(&client)
            .unwrap();

        let (cancel_tx, cancel_rx) = watch::channel(true);
        let result = tx.execute_all_with_cancel(&client, cancel_rx).await;
        assert!(matches!(result, Err(ExecutionError::Cancelled { completed: 0 })));
        assert_eq!(mock.submission_count(), 0);
        drop(cancel_tx);
    }

    #[test]
    fn blocking_execute_runs_its_own_runtime() {
        let mock = Arc::new(MockTransport::new());
        let operator = Keypair::generate();
        let client = client_with(&mock, &operator);
        let mut tx = TransactionBuilder::new(transfer()).freeze_with(&client).unwrap();
        assert_eq!(tx.execute_blocking(&client).unwrap().status, Status::Ok);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn blocking_execute_inside_multi_thread_runtime() {
        let mock = Arc::new(MockTransport::with_replies([MockReply::Status(Status::Busy)]));
        let operator = Keypair::generate();
        let client = Client::builder(Arc::clone(&mock) as Arc<dyn crate::network::Transport>)
            .nodes(nodes())
            .operator(OPERATOR, operator.clone())
            .execution_config(ExecutionConfig {
                backoff: BackoffPolicy::new(Duration::from_millis(1), Duration::from_millis(1)),
                ..ExecutionConfig::default()
            })
            .build();
        let mut tx = TransactionBuilder::new(transfer()).freeze_with(&client).unwrap();

        let response = tx.execute_blocking(&client).unwrap();
        assert_eq!(response.status, Status::Ok);
        assert_eq!(response.node, NodeId::from_num(4));
        assert_eq!(mock.submission_count(), 2);
    }

    #[tokio::test]
    async fn blocking_execute_inside_current_thread_runtime_is_an_error() {
        let mock = Arc::new(MockTransport::new());
        let client = client_with(&mock, &Keypair::generate());
        let mut tx = TransactionBuilder::new(transfer()).freeze_with(&client).unwrap();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| tx.execute_blocking(&client)));
        assert!(matches!(result, Ok(Err(ExecutionError::Runtime(_)))));
        assert_eq!(mock.submission_count(), 0);
    }

    #[tokio::test]
    async fn draft_cannot_execute() {
        let mock = Arc::new(MockTransport::new());
        let client = client_with(&mock, &Keypair::generate());
        let mut draft = Transaction::new(transfer());
        assert!(matches!(
            draft.execute(&client).await,
            Err(ExecutionError::Construction(ConstructionError::NotFrozen))
        ));
    }
}
