//! # Network Module
//!
//! Everything between a frozen request and a node's verdict on it.
//!
//! ## Architecture
//!
//! ```text
//! client.rs     — Client: node pool, operator, generator, execution settings
//! transport.rs  — Transport seam (async) and the in-crate MockTransport
//! backoff.rs    — capped exponential backoff between attempts
//! executor.rs   — the execution loop: failover, regeneration, cancellation
//! metrics.rs    — Prometheus counters for the execution loop
//! ```
//!
//! ## Design Decisions
//!
//! - The engine never opens sockets. A [`Transport`] receives one signed
//!   envelope per call and returns a status, which keeps the whole retry
//!   state machine testable with [`MockTransport`] and paused tokio time.
//! - Node list, transport and signers are shared `Arc`s. Execution reads
//!   them and never mutates them.
//! - Metrics are optional on the client and live in their own registry.

pub mod backoff;
pub mod client;
pub mod executor;
pub mod metrics;
pub mod transport;

pub use backoff::BackoffPolicy;
pub use client::{Client, ClientBuilder, Operator};
pub use executor::{ExecutionConfig, ExecutionError, Fault, TransactionResponse};
pub use metrics::ExecutionMetrics;
pub use transport::{MockReply, MockTransport, Submission, Transport, TransportError, TransportResponse};
