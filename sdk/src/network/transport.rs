//! Submission transport seam.
//!
//! The execution engine never opens a connection itself. It hands one
//! shape B envelope at a time to a [`Transport`] and interprets what comes
//! back. Production code plugs in a real network client; tests use
//! [`MockTransport`].

use std::collections::VecDeque;
use std::future::pending;

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;

use crate::identity::NodeId;
use crate::transaction::Status;

/// A node's reply to one submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: Status,
    /// Fee the node quoted for the request, when it reports one.
    pub cost: Option<u64>,
}

impl TransportResponse {
    pub fn status(status: Status) -> Self {
        Self { status, cost: None }
    }
}

/// Failures below the precheck layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The node could not be reached.
    #[error("node {0} unavailable")]
    Unavailable(NodeId),

    /// The node refused the connection for capacity reasons.
    #[error("node {0} resource exhausted")]
    ResourceExhausted(NodeId),

    #[error("transport error: {0}")]
    Other(String),
}

impl TransportError {
    /// Worth retrying on another node.
    pub fn is_node_fault(&self) -> bool {
        matches!(
            self,
            TransportError::Unavailable(_) | TransportError::ResourceExhausted(_)
        )
    }
}

/// Delivers signed envelopes to nodes.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Submit shape B `bytes` to `node` and wait for its precheck reply.
    async fn submit(&self, node: NodeId, bytes: Vec<u8>) -> Result<TransportResponse, TransportError>;
}

// ---------------------------------------------------------------------------
// Mock
// ---------------------------------------------------------------------------

/// One scripted reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MockReply {
    Status(Status),
    Error(TransportError),
    /// Never answer. Exercises the per-attempt timeout.
    Hang,
}

/// One recorded submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    pub node: NodeId,
    pub bytes: Vec<u8>,
}

/// Transport that replays queued replies FIFO and records every submission.
/// Answers `OK` once the queue is empty.
#[derive(Debug, Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<MockReply>>,
    submissions: Mutex<Vec<Submission>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport preloaded with `replies`.
    pub fn with_replies(replies: impl IntoIterator<Item = MockReply>) -> Self {
        let mock = Self::new();
        mock.replies.lock().extend(replies);
        mock
    }

    pub fn push_reply(&self, reply: MockReply) {
        self.replies.lock().push_back(reply);
    }

    pub fn push_status(&self, status: Status) {
        self.push_reply(MockReply::Status(status));
    }

    /// Copy of everything submitted so far, in order.
    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().clone()
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.lock().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn submit(&self, node: NodeId, bytes: Vec<u8>) -> Result<TransportResponse, TransportError> {
        self.submissions.lock().push(Submission { node, bytes });
        let reply = self.replies.lock().pop_front();
        match reply {
            None => Ok(TransportResponse::status(Status::Ok)),
            Some(MockReply::Status(status)) => Ok(TransportResponse::status(status)),
            Some(MockReply::Error(e)) => Err(e),
            Some(MockReply::Hang) => pending().await,
        }
    }
}
