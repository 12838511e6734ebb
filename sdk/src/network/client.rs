//! Client: the node pool, operator and execution settings shared by every
//! request.
//!
//! A `Client` is a cheap handle (`Arc` inside). Cloning it shares the node
//! list, transport, identity generator and metrics.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::executor::ExecutionConfig;
use super::metrics::ExecutionMetrics;
use super::transport::Transport;
use crate::config::DEFAULT_REQUEST_TIMEOUT;
use crate::crypto::{SharedSigner, Signer};
use crate::identity::{AccountId, IdentityGenerator, NodeId};

/// The account paying for requests, with the signer that authorizes it.
#[derive(Clone)]
pub struct Operator {
    pub account_id: AccountId,
    pub signer: SharedSigner,
}

impl fmt::Debug for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operator")
            .field("account_id", &self.account_id)
            .field("public_key", &self.signer.public_key())
            .finish()
    }
}

struct ClientInner {
    transport: Arc<dyn Transport>,
    nodes: Vec<NodeId>,
    operator: Option<Operator>,
    generator: IdentityGenerator,
    request_timeout: Duration,
    default_max_transaction_fee: Option<u64>,
    execution: ExecutionConfig,
    metrics: Option<ExecutionMetrics>,
}

#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    pub fn builder(transport: Arc<dyn Transport>) -> ClientBuilder {
        ClientBuilder::new(transport)
    }

    /// Default node list, in failover order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.inner.nodes
    }

    pub fn operator(&self) -> Option<&Operator> {
        self.inner.operator.as_ref()
    }

    pub fn operator_account_id(&self) -> Option<AccountId> {
        self.inner.operator.as_ref().map(|op| op.account_id)
    }

    pub fn operator_signer(&self) -> Option<SharedSigner> {
        self.inner.operator.as_ref().map(|op| Arc::clone(&op.signer))
    }

    /// Deadline for one submission attempt.
    pub fn request_timeout(&self) -> Duration {
        self.inner.request_timeout
    }

    pub fn generator(&self) -> &IdentityGenerator {
        &self.inner.generator
    }

    /// Fee bound applied at freeze to requests that set none.
    pub fn default_max_transaction_fee(&self) -> Option<u64> {
        self.inner.default_max_transaction_fee
    }

    pub fn execution_config(&self) -> &ExecutionConfig {
        &self.inner.execution
    }

    pub fn metrics(&self) -> Option<&ExecutionMetrics> {
        self.inner.metrics.as_ref()
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.inner.transport
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("nodes", &self.inner.nodes)
            .field("operator", &self.inner.operator)
            .field("request_timeout", &self.inner.request_timeout)
            .field("execution", &self.inner.execution)
            .finish_non_exhaustive()
    }
}

pub struct ClientBuilder {
    transport: Arc<dyn Transport>,
    nodes: Vec<NodeId>,
    operator: Option<Operator>,
    generator: Option<IdentityGenerator>,
    request_timeout: Duration,
    default_max_transaction_fee: Option<u64>,
    execution: ExecutionConfig,
    metrics: Option<ExecutionMetrics>,
}

impl ClientBuilder {
    fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            nodes: Vec::new(),
            operator: None,
            generator: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            default_max_transaction_fee: None,
            execution: ExecutionConfig::default(),
            metrics: None,
        }
    }

    pub fn nodes(mut self, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        self.nodes = nodes.into_iter().collect();
        self
    }

    pub fn operator(self, account_id: AccountId, signer: impl Signer + 'static) -> Self {
        self.operator_shared(account_id, Arc::new(signer))
    }

    pub fn operator_shared(mut self, account_id: AccountId, signer: SharedSigner) -> Self {
        self.operator = Some(Operator { account_id, signer });
        self
    }

    /// Replace the system-clock generator, e.g. with a fixed clock in tests.
    pub fn generator(mut self, generator: IdentityGenerator) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn default_max_transaction_fee(mut self, fee: u64) -> Self {
        self.default_max_transaction_fee = Some(fee);
        self
    }

    pub fn execution_config(mut self, config: ExecutionConfig) -> Self {
        self.execution = config;
        self
    }

    pub fn metrics(mut self, metrics: ExecutionMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn build(self) -> Client {
        Client {
            inner: Arc::new(ClientInner {
                transport: self.transport,
                nodes: self.nodes,
                operator: self.operator,
                generator: self.generator.unwrap_or_default(),
                request_timeout: self.request_timeout,
                default_max_transaction_fee: self.default_max_transaction_fee,
                execution: self.execution,
                metrics: self.metrics,
            }),
        }
    }
}
