//! # Frozen Transaction
//!
//! A request after freeze: content fixed, every `(chunk, node)` body built,
//! signatures accumulating.
//!
//! ## State
//!
//! ```text
//! content      whole-request content (unchunked payload)
//! matrix       BodyMatrix, built once, rows replaced only on regeneration
//! signatures   SignatureCollector, one map per cell
//! signers      every signer registered through sign()/sign_with(), kept
//!              so cells rebuilt on regeneration can be signed again
//! ```
//!
//! Signing takes `&self` and may run from several threads at once. The
//! matrix is only ever rebuilt through `&mut self`, by the execution engine.
//!
//! Every collection getter returns an owned copy; nothing handed out can
//! alias internal state.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::body::TransactionContent;
use super::chunking::{split, split_correlated};
use super::codec::{self, Decoded, WireShape};
use super::error::{ConstructionError, DecodeError};
use super::matrix::{BodyMatrix, Cell};
use super::signatures::{SignatureCollector, SignatureMap};
use crate::crypto::{sha384, FnSigner, PublicKey, SharedSigner, Signer};
use crate::identity::{NodeId, TransactionId};
use crate::network::Client;

/// One body awaiting an external signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignableBody {
    pub node: NodeId,
    pub transaction_id: TransactionId,
    /// The exact bytes to sign.
    pub body: Vec<u8>,
}

/// Freeze-time settings that survive into the frozen request.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FreezeOptions {
    pub chunk_size: usize,
    pub max_chunks: usize,
    /// The identity was supplied by the caller rather than generated.
    pub id_pinned: bool,
    pub regenerate_transaction_id: bool,
}

pub struct FrozenTransaction {
    content: TransactionContent,
    options: FreezeOptions,
    /// Identity of chunk 0.
    transaction_id: TransactionId,
    /// Identity chunk metadata points at. Differs from `transaction_id`
    /// once chunks after an accepted chunk 0 have been regenerated.
    correlation_id: TransactionId,
    matrix: BodyMatrix,
    signatures: SignatureCollector,
    signers: RwLock<Vec<SharedSigner>>,
}

impl FrozenTransaction {
    pub(crate) fn freeze(
        content: TransactionContent,
        transaction_id: TransactionId,
        nodes: &[NodeId],
        options: FreezeOptions,
    ) -> Result<Self, ConstructionError> {
        content.validate()?;
        let chunks = split(&content.operation, options.chunk_size, options.max_chunks, transaction_id)?;
        let matrix = BodyMatrix::build(&content, &chunks, nodes)?;

        debug!(
            transaction_id = %transaction_id,
            operation = %content.operation.kind(),
            chunks = matrix.chunk_count(),
            nodes = matrix.node_count(),
            "transaction frozen"
        );

        Ok(Self {
            content,
            options,
            transaction_id,
            correlation_id: transaction_id,
            matrix,
            signatures: SignatureCollector::new(),
            signers: RwLock::new(Vec::new()),
        })
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    /// Identity of chunk 0.
    pub fn transaction_id(&self) -> TransactionId {
        self.transaction_id
    }

    /// Identity of every chunk, in chunk order.
    pub fn transaction_ids(&self) -> Vec<TransactionId> {
        self.matrix.transaction_ids()
    }

    pub fn node_account_ids(&self) -> Vec<NodeId> {
        self.matrix.nodes().to_vec()
    }

    /// Copy of the whole-request content.
    pub fn content(&self) -> TransactionContent {
        self.content.clone()
    }

    pub fn memo(&self) -> &str {
        &self.content.memo
    }

    pub fn max_transaction_fee(&self) -> Option<u64> {
        self.content.max_transaction_fee
    }

    pub fn chunk_count(&self) -> usize {
        self.matrix.chunk_count()
    }

    pub fn chunk_size(&self) -> usize {
        self.options.chunk_size
    }

    pub fn max_chunks(&self) -> usize {
        self.options.max_chunks
    }

    pub fn regenerate_transaction_id(&self) -> bool {
        self.options.regenerate_transaction_id
    }

    /// `true` when the identity was set by the caller or decoded from bytes.
    pub fn is_transaction_id_pinned(&self) -> bool {
        self.options.id_pinned
    }

    pub(crate) fn matrix(&self) -> &BodyMatrix {
        &self.matrix
    }

    /// Every cell's body, chunk-major, node-minor, for out-of-band signing.
    pub fn signable_bodies(&self) -> Vec<SignableBody> {
        self.matrix
            .all_cells()
            .iter()
            .map(|cell| SignableBody {
                node: cell.node,
                transaction_id: cell.transaction_id,
                body: cell.body.clone(),
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Signing
    // -----------------------------------------------------------------------

    /// Sign every cell with `signer` and keep it for regeneration.
    pub fn sign(&self, signer: impl Signer + 'static) -> &Self {
        self.sign_shared(Arc::new(signer))
    }

    /// [`sign`](Self::sign) with an already shared signer.
    pub fn sign_shared(&self, signer: SharedSigner) -> &Self {
        let public_key = signer.public_key();
        {
            let mut signers = self.signers.write();
            signers.retain(|s| s.public_key() != public_key);
            signers.push(Arc::clone(&signer));
        }
        let changed = self.sign_range(signer.as_ref(), 0..self.matrix.all_cells().len());
        debug!(public_key = %public_key, cells = changed, "signed transaction");
        self
    }

    /// Sign with a closure producing signatures for `public_key`.
    pub fn sign_with<F>(&self, public_key: PublicKey, sign_fn: F) -> &Self
    where
        F: Fn(&[u8]) -> Vec<u8> + Send + Sync + 'static,
    {
        self.sign(FnSigner::new(public_key, sign_fn))
    }

    /// Sign with the client's operator.
    pub fn sign_with_operator(&self, client: &Client) -> Result<&Self, ConstructionError> {
        let signer = client.operator_signer().ok_or(ConstructionError::NoOperator)?;
        Ok(self.sign_shared(signer))
    }

    fn sign_range(&self, signer: &dyn Signer, range: Range<usize>) -> usize {
        let public_key = signer.public_key();
        let mut changed = 0;
        for index in range {
            if let Some(cell) = self.matrix.cell(index) {
                let signature = signer.sign(&cell.body);
                if self.signatures.insert(index, public_key, signature).changed() {
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Attach a signature produced out of band. Returns `false` when
    /// `(transaction_id, node)` names no cell or the exact signature is
    /// already present.
    pub fn add_signature(
        &self,
        public_key: PublicKey,
        signature: Vec<u8>,
        transaction_id: &TransactionId,
        node: &NodeId,
    ) -> bool {
        match self.matrix.position(transaction_id, node) {
            Some(index) => self.signatures.insert(index, public_key, signature).changed(),
            None => false,
        }
    }

    /// [`add_signature`](Self::add_signature) for a request with exactly
    /// one cell.
    pub fn add_signature_single(&self, public_key: PublicKey, signature: Vec<u8>) -> Result<bool, ConstructionError> {
        self.require_single_chunk()?;
        if self.matrix.node_count() != 1 {
            return Err(ConstructionError::MultipleNodes(self.matrix.node_count()));
        }
        Ok(self.signatures.insert(0, public_key, signature).changed())
    }

    /// Signatures held for `node`, keyed by chunk identity.
    pub fn signatures_for(&self, node: &NodeId) -> BTreeMap<TransactionId, SignatureMap> {
        self.matrix
            .all_cells()
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.node == *node)
            .map(|(index, cell)| (cell.transaction_id, self.signatures.signatures(index)))
            .collect()
    }

    /// Signatures of a single-chunk request, keyed by node.
    pub fn get_signatures(&self) -> Result<BTreeMap<NodeId, SignatureMap>, ConstructionError> {
        self.require_single_chunk()?;
        Ok(self
            .matrix
            .row(0)
            .iter()
            .enumerate()
            .map(|(index, cell)| (cell.node, self.signatures.signatures(index)))
            .collect())
    }

    /// Signatures of every cell, keyed by chunk identity then node.
    pub fn get_all_signatures(&self) -> BTreeMap<TransactionId, BTreeMap<NodeId, SignatureMap>> {
        let mut all: BTreeMap<TransactionId, BTreeMap<NodeId, SignatureMap>> = BTreeMap::new();
        for (index, cell) in self.matrix.all_cells().iter().enumerate() {
            all.entry(cell.transaction_id)
                .or_default()
                .insert(cell.node, self.signatures.signatures(index));
        }
        all
    }

    /// Keys with at least one collected signature.
    pub fn signer_keys(&self) -> Vec<PublicKey> {
        self.signatures.public_keys()
    }

    /// `true` if `public_key` has signed any cell.
    pub fn is_signed_by(&self, public_key: &PublicKey) -> bool {
        self.signer_keys().contains(public_key)
    }

    fn require_single_chunk(&self) -> Result<(), ConstructionError> {
        match self.matrix.chunk_count() {
            1 => Ok(()),
            n => Err(ConstructionError::MultipleChunks(n)),
        }
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    /// Shape B bytes of the cell at flat `index`.
    pub(crate) fn signed_cell_bytes(&self, index: usize) -> Result<Vec<u8>, ConstructionError> {
        let cell = self
            .matrix
            .cell(index)
            .ok_or_else(|| ConstructionError::Encoding(format!("no cell at index {}", index)))?;
        codec::encode_signed(&cell.body, &self.signatures.signatures(index))
    }

    /// Shape C encoding of the whole signed matrix.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ConstructionError> {
        let signed = (0..self.matrix.all_cells().len())
            .map(|index| self.signed_cell_bytes(index))
            .collect::<Result<Vec<_>, _>>()?;
        codec::encode_list(signed)
    }

    pub fn to_hex(&self) -> Result<String, ConstructionError> {
        self.to_bytes().map(hex::encode)
    }

    /// Rebuild a frozen request from bytes of any envelope shape.
    ///
    /// The result keeps the decoded body bytes and signatures as-is. Its
    /// identity counts as pinned, so it is never regenerated.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        Self::from_decoded(codec::decode(bytes)?)
    }

    pub fn from_hex(s: &str) -> Result<Self, DecodeError> {
        let bytes = hex::decode(s.trim()).map_err(|e| DecodeError::Malformed {
            shape: "hex",
            reason: e.to_string(),
        })?;
        Self::from_bytes(&bytes)
    }

    fn from_decoded(decoded: Decoded) -> Result<Self, DecodeError> {
        let shape = decoded.shape();
        let assembled = codec::assemble(decoded.into_cells())?;

        let transaction_id = assembled
            .chunks
            .first()
            .map(|chunk| chunk.transaction_id)
            .ok_or(DecodeError::EmptyList)?;
        let signatures = SignatureCollector::new();
        for (index, map) in assembled.signatures {
            for (public_key, signature) in map {
                signatures.insert(index, public_key, signature);
            }
        }

        debug!(
            shape = %shape,
            transaction_id = %transaction_id,
            chunks = assembled.matrix.chunk_count(),
            nodes = assembled.matrix.node_count(),
            "transaction decoded"
        );

        Ok(Self {
            content: assembled.content,
            options: FreezeOptions {
                chunk_size: assembled.chunk_size,
                max_chunks: assembled.max_chunks,
                id_pinned: true,
                regenerate_transaction_id: false,
            },
            transaction_id,
            correlation_id: assembled.correlation_id,
            matrix: assembled.matrix,
            signatures,
            signers: RwLock::new(Vec::new()),
        })
    }

    /// Decode only far enough to report the envelope shape.
    pub fn detect_shape(bytes: &[u8]) -> Result<WireShape, DecodeError> {
        codec::decode(bytes).map(|decoded| decoded.shape())
    }

    // -----------------------------------------------------------------------
    // Hashes and sizes
    // -----------------------------------------------------------------------

    /// SHA-384 of the first cell's shape B bytes.
    pub fn transaction_hash(&self) -> Result<Vec<u8>, ConstructionError> {
        self.signed_cell_bytes(0).map(|bytes| sha384(&bytes))
    }

    /// Hash of chunk 0 as it would be submitted to each node.
    pub fn transaction_hash_per_node(&self) -> Result<BTreeMap<NodeId, Vec<u8>>, ConstructionError> {
        (0..self.matrix.node_count())
            .map(|node_index| {
                let index = self.matrix.index_of(0, node_index);
                let bytes = self.signed_cell_bytes(index)?;
                Ok((self.matrix.nodes()[node_index], sha384(&bytes)))
            })
            .collect()
    }

    /// Hash of every cell, keyed by chunk identity then node.
    pub fn all_transaction_hashes_per_node(
        &self,
    ) -> Result<BTreeMap<TransactionId, BTreeMap<NodeId, Vec<u8>>>, ConstructionError> {
        let mut all: BTreeMap<TransactionId, BTreeMap<NodeId, Vec<u8>>> = BTreeMap::new();
        for (index, cell) in self.matrix.all_cells().iter().enumerate() {
            let bytes = self.signed_cell_bytes(index)?;
            all.entry(cell.transaction_id)
                .or_default()
                .insert(cell.node, sha384(&bytes));
        }
        Ok(all)
    }

    /// Shape B length of the first cell, signatures included.
    pub fn transaction_size(&self) -> Result<usize, ConstructionError> {
        self.signed_cell_bytes(0).map(|bytes| bytes.len())
    }

    /// Shape A length of the first cell.
    pub fn transaction_body_size(&self) -> Result<usize, ConstructionError> {
        self.require_single_chunk()?;
        Ok(self.first_cell().map_or(0, |cell| cell.body.len()))
    }

    /// Shape A length of each chunk's first cell.
    pub fn body_size_all_chunks(&self) -> Vec<usize> {
        (0..self.matrix.chunk_count())
            .filter_map(|chunk| self.matrix.row(chunk).first())
            .map(|cell| cell.body.len())
            .collect()
    }

    fn first_cell(&self) -> Option<&Cell> {
        self.matrix.cell(0)
    }

    // -----------------------------------------------------------------------
    // Regeneration
    // -----------------------------------------------------------------------

    /// Whether a `TRANSACTION_EXPIRED` may be answered with a fresh
    /// identity: enabled, not caller-pinned, and every key that has signed
    /// can sign again.
    pub(crate) fn can_regenerate(&self) -> bool {
        if !self.options.regenerate_transaction_id || self.options.id_pinned {
            return false;
        }
        let signers = self.signers.read();
        self.signatures
            .public_keys()
            .iter()
            .all(|key| signers.iter().any(|s| s.public_key() == *key))
    }

    /// `true` if a signer for `public_key` is registered.
    pub(crate) fn has_signer(&self, public_key: &PublicKey) -> bool {
        self.signers.read().iter().any(|s| s.public_key() == *public_key)
    }

    /// Give chunks `from_chunk..` identities derived from `fresh`, rebuild
    /// their rows, drop their signatures and sign them again with every
    /// registered signer. Earlier chunks keep their rows.
    pub(crate) fn regenerate_from(
        &mut self,
        from_chunk: usize,
        fresh: TransactionId,
    ) -> Result<Range<usize>, ConstructionError> {
        let correlation_id = if from_chunk == 0 { fresh } else { self.correlation_id };
        let chunks = split_correlated(
            &self.content.operation,
            self.options.chunk_size,
            self.options.max_chunks,
            fresh,
            correlation_id,
        )?;
        let tail = chunks.get(from_chunk..).unwrap_or(&[]);
        let replaced = self.matrix.rebuild_rows(&self.content, tail)?;

        self.signatures.clear_range(replaced.clone());
        let signers = self.signers.read().clone();
        for signer in &signers {
            self.sign_range(signer.as_ref(), replaced.clone());
        }

        if from_chunk == 0 {
            self.transaction_id = fresh;
        }
        self.correlation_id = correlation_id;
        Ok(replaced)
    }
}

impl fmt::Debug for FrozenTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrozenTransaction")
            .field("transaction_id", &self.transaction_id)
            .field("operation", &self.content.operation.kind())
            .field("chunks", &self.matrix.chunk_count())
            .field("nodes", &self.matrix.nodes())
            .field("signatures", &self.signatures.len())
            .field("signers", &self.signers.read().len())
            .finish()
    }
}

impl fmt::Display for FrozenTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({} chunk(s) x {} node(s), {} signature(s))",
            self.content.operation.kind(),
            self.transaction_id,
            self.matrix.chunk_count(),
            self.matrix.node_count(),
            self.signatures.len()
        )
    }
}
