//! # Execution Metrics
//!
//! Prometheus counters for the execution engine, registered in a dedicated
//! [`prometheus::Registry`] (prefix `tessera`) so an embedding application
//! can expose them next to its own without name clashes.

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};

/// Metric handles for one client. Cheap to clone.
#[derive(Clone)]
pub struct ExecutionMetrics {
    registry: Registry,
    /// Cells handed to the transport.
    pub submissions_total: IntCounter,
    /// Attempts that failed over to another node.
    pub node_faults_total: IntCounter,
    /// Identities replaced after `TRANSACTION_EXPIRED`.
    pub identity_regenerations_total: IntCounter,
    /// Requests that ended in a non-retryable fault.
    pub fatal_faults_total: IntCounter,
    pub chunks_accepted_total: IntCounter,
    /// Latency of a single submission attempt, in seconds.
    pub attempt_latency_seconds: Histogram,
}

fn counter(registry: &Registry, name: &str, help: &str) -> Result<IntCounter, prometheus::Error> {
    let counter = IntCounter::new(name, help)?;
    registry.register(Box::new(counter.clone()))?;
    Ok(counter)
}

impl ExecutionMetrics {
    /// Creates and registers all metrics.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("tessera".into()), None)?;

        let submissions_total = counter(&registry, "submissions_total", "Total cells submitted to nodes")?;
        let node_faults_total = counter(
            &registry,
            "node_faults_total",
            "Submission attempts answered with a retryable node fault",
        )?;
        let identity_regenerations_total = counter(
            &registry,
            "identity_regenerations_total",
            "Transaction ids regenerated after expiry",
        )?;
        let fatal_faults_total = counter(&registry, "fatal_faults_total", "Executions ended by a fatal fault")?;
        let chunks_accepted_total = counter(&registry, "chunks_accepted_total", "Chunks accepted by a node")?;

        let attempt_latency_seconds = Histogram::with_opts(
            HistogramOpts::new("attempt_latency_seconds", "Latency of a single submission attempt in seconds")
                .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        )?;
        registry.register(Box::new(attempt_latency_seconds.clone()))?;

        Ok(Self {
            registry,
            submissions_total,
            node_faults_total,
            identity_regenerations_total,
            fatal_faults_total,
            chunks_accepted_total,
            attempt_latency_seconds,
        })
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl std::fmt::Debug for ExecutionMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionMetrics")
            .field("submissions_total", &self.submissions_total.get())
            .field("chunks_accepted_total", &self.chunks_accepted_total.get())
            .finish_non_exhaustive()
    }
}
