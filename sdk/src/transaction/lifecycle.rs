//! Runtime-checked request lifecycle.
//!
//! [`Transaction`] is the mutable-handle form of [`TransactionBuilder`]:
//! `set_*` methods take `&mut self` and return
//! `Result<&mut Self, ConstructionError>`, failing with `Immutable` once the
//! request has been frozen. Accessors that need the body matrix fail with
//! `NotFrozen` before freeze.

use std::time::Duration;

use super::body::CustomFeeLimit;
use super::builder::{whole_seconds, TransactionBuilder};
use super::error::ConstructionError;
use super::frozen::{FrozenTransaction, SignableBody};
use super::operation::Operation;
use crate::crypto::PublicKey;
use crate::identity::{NodeId, TransactionId};
use crate::network::Client;

enum State {
    Draft(Box<TransactionBuilder>),
    Frozen(Box<FrozenTransaction>),
}

/// A request that starts mutable and becomes immutable on freeze.
pub struct Transaction {
    state: State,
}

impl Transaction {
    pub fn new(operation: Operation) -> Self {
        Self {
            state: State::Draft(Box::new(TransactionBuilder::new(operation))),
        }
    }

    pub fn is_frozen(&self) -> bool {
        matches!(self.state, State::Frozen(_))
    }

    fn draft(&mut self) -> Result<&mut TransactionBuilder, ConstructionError> {
        match &mut self.state {
            State::Draft(builder) => Ok(builder.as_mut()),
            State::Frozen(_) => Err(ConstructionError::Immutable),
        }
    }

    // -- setters -------------------------------------------------------------

    pub fn set_operation(&mut self, operation: Operation) -> Result<&mut Self, ConstructionError> {
        self.draft()?.content_mut().operation = operation;
        Ok(self)
    }

    pub fn set_transaction_id(&mut self, transaction_id: TransactionId) -> Result<&mut Self, ConstructionError> {
        self.draft()?.set_transaction_id(transaction_id);
        Ok(self)
    }

    pub fn set_node_account_ids(&mut self, nodes: Vec<NodeId>) -> Result<&mut Self, ConstructionError> {
        self.draft()?.set_node_account_ids(nodes);
        Ok(self)
    }

    pub fn set_max_transaction_fee(&mut self, fee: u64) -> Result<&mut Self, ConstructionError> {
        self.draft()?.content_mut().max_transaction_fee = Some(fee);
        Ok(self)
    }

    pub fn set_valid_duration(&mut self, duration: Duration) -> Result<&mut Self, ConstructionError> {
        self.draft()?.content_mut().valid_duration = Some(whole_seconds(duration));
        Ok(self)
    }

    pub fn set_memo(&mut self, memo: impl Into<String>) -> Result<&mut Self, ConstructionError> {
        self.draft()?.content_mut().memo = memo.into();
        Ok(self)
    }

    pub fn set_custom_fee_limits(&mut self, limits: Vec<CustomFeeLimit>) -> Result<&mut Self, ConstructionError> {
        self.draft()?.content_mut().custom_fee_limits = limits;
        Ok(self)
    }

    pub fn set_batch_key(&mut self, key: PublicKey) -> Result<&mut Self, ConstructionError> {
        self.draft()?.content_mut().batch_key = Some(key);
        Ok(self)
    }

    pub fn set_regenerate_transaction_id(&mut self, regenerate: bool) -> Result<&mut Self, ConstructionError> {
        self.draft()?.set_regenerate_transaction_id(regenerate);
        Ok(self)
    }

    pub fn set_chunk_size(&mut self, chunk_size: usize) -> Result<&mut Self, ConstructionError> {
        self.draft()?.set_chunk_size(chunk_size);
        Ok(self)
    }

    pub fn set_max_chunks(&mut self, max_chunks: usize) -> Result<&mut Self, ConstructionError> {
        self.draft()?.set_max_chunks(max_chunks);
        Ok(self)
    }

    // -- freeze --------------------------------------------------------------

    pub fn freeze(&mut self) -> Result<&mut Self, ConstructionError> {
        self.freeze_inner(None)
    }

    pub fn freeze_with(&mut self, client: &Client) -> Result<&mut Self, ConstructionError> {
        self.freeze_inner(Some(client))
    }

    /// On failure the request stays a draft, with every field intact.
    fn freeze_inner(&mut self, client: Option<&Client>) -> Result<&mut Self, ConstructionError> {
        let State::Draft(builder) = &self.state else {
            return Err(ConstructionError::Immutable);
        };
        let frozen = builder.as_ref().clone().freeze_inner(client)?;
        self.state = State::Frozen(Box::new(frozen));
        Ok(self)
    }

    /// Schedule-create request wrapping this draft. See
    /// [`TransactionBuilder::schedule`].
    pub fn schedule(&self) -> Result<Transaction, ConstructionError> {
        let State::Draft(builder) = &self.state else {
            return Err(ConstructionError::Immutable);
        };
        let schedule = builder.as_ref().clone().schedule()?;
        Ok(Self {
            state: State::Draft(Box::new(schedule)),
        })
    }

    /// Set the batch key, freeze against `client` and sign with its
    /// operator.
    pub fn batchify(&mut self, client: &Client, batch_key: PublicKey) -> Result<&mut Self, ConstructionError> {
        self.set_batch_key(batch_key)?;
        self.freeze_with(client)?;
        self.frozen()?.sign_with_operator(client)?;
        Ok(self)
    }

    // -- frozen access -------------------------------------------------------

    pub fn frozen(&self) -> Result<&FrozenTransaction, ConstructionError> {
        match &self.state {
            State::Frozen(frozen) => Ok(frozen.as_ref()),
            _ => Err(ConstructionError::NotFrozen),
        }
    }

    pub fn frozen_mut(&mut self) -> Result<&mut FrozenTransaction, ConstructionError> {
        match &mut self.state {
            State::Frozen(frozen) => Ok(frozen.as_mut()),
            _ => Err(ConstructionError::NotFrozen),
        }
    }

    pub fn into_frozen(self) -> Result<FrozenTransaction, ConstructionError> {
        match self.state {
            State::Frozen(frozen) => Ok(*frozen),
            _ => Err(ConstructionError::NotFrozen),
        }
    }

    pub fn signable_bodies(&self) -> Result<Vec<SignableBody>, ConstructionError> {
        self.frozen().map(FrozenTransaction::signable_bodies)
    }

    pub fn add_signature(
        &self,
        public_key: PublicKey,
        signature: Vec<u8>,
        transaction_id: &TransactionId,
        node: &NodeId,
    ) -> Result<bool, ConstructionError> {
        Ok(self.frozen()?.add_signature(public_key, signature, transaction_id, node))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ConstructionError> {
        self.frozen()?.to_bytes()
    }
}

impl From<FrozenTransaction> for Transaction {
    fn from(frozen: FrozenTransaction) -> Self {
        Self {
            state: State::Frozen(Box::new(frozen)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;
    use crate::identity::{AccountId, Timestamp};
    use crate::transaction::operation::Transfer;

    fn id() -> TransactionId {
        TransactionId::with_valid_start(AccountId::from_num(5006), Timestamp::from_seconds(1_554_158_542))
    }

    fn draft() -> Transaction {
        let mut tx = Transaction::new(Operation::transfer(vec![Transfer::new(AccountId::from_num(2), 1)]));
        tx.set_transaction_id(id())
            .unwrap()
            .set_node_account_ids(vec![NodeId::from_num(3)])
            .unwrap();
        tx
    }

    #[test]
    fn matrix_accessors_need_freeze() {
        let tx = draft();
        assert_eq!(tx.signable_bodies().unwrap_err(), ConstructionError::NotFrozen);
        assert_eq!(tx.to_bytes().unwrap_err(), ConstructionError::NotFrozen);
    }

    #[test]
    fn every_setter_fails_after_freeze() {
        let mut tx = draft();
        tx.freeze().unwrap();
        assert!(tx.is_frozen());

        let key = Keypair::generate().public_key();
        let results = [
            tx.set_operation(Operation::transfer(vec![])).map(|_| ()),
            tx.set_transaction_id(id()).map(|_| ()),
            tx.set_node_account_ids(vec![NodeId::from_num(4)]).map(|_| ()),
            tx.set_max_transaction_fee(1).map(|_| ()),
            tx.set_valid_duration(Duration::from_secs(30)).map(|_| ()),
            tx.set_memo("late").map(|_| ()),
            tx.set_custom_fee_limits(vec![]).map(|_| ()),
            tx.set_batch_key(key).map(|_| ()),
            tx.set_regenerate_transaction_id(false).map(|_| ()),
            tx.set_chunk_size(10).map(|_| ()),
            tx.set_max_chunks(2).map(|_| ()),
        ];
        for result in results {
            assert_eq!(result, Err(ConstructionError::Immutable));
        }
        assert_eq!(tx.freeze().map(|_| ()), Err(ConstructionError::Immutable));
        assert_eq!(tx.frozen().unwrap().memo(), "");
    }

    #[test]
    fn failed_freeze_keeps_the_draft() {
        let mut tx = Transaction::new(Operation::transfer(vec![Transfer::new(AccountId::from_num(2), 1)]));
        tx.set_memo("kept").unwrap();
        assert_eq!(tx.freeze().map(|_| ()), Err(ConstructionError::NoNodes));
        assert!(!tx.is_frozen());

        tx.set_node_account_ids(vec![NodeId::from_num(3)])
            .unwrap()
            .set_transaction_id(id())
            .unwrap();
        tx.freeze().unwrap();
        assert_eq!(tx.frozen().unwrap().memo(), "kept");
    }

    #[test]
    fn frozen_request_accepts_signatures() {
        let mut tx = draft();
        tx.freeze().unwrap();
        let kp = Keypair::generate();
        let body = tx.signable_bodies().unwrap().remove(0);
        assert!(tx
            .add_signature(kp.public_key(), kp.sign(&body.body), &body.transaction_id, &body.node)
            .unwrap());
    }

    #[test]
    fn valid_duration_is_stored_as_encoded() {
        let mut tx = draft();
        tx.set_valid_duration(Duration::from_millis(2_999)).unwrap();
        tx.freeze().unwrap();
        assert_eq!(tx.frozen().unwrap().content().valid_duration, Some(Duration::from_secs(2)));
    }

    #[test]
    fn schedule_needs_an_unfrozen_draft_without_nodes() {
        assert!(matches!(draft().schedule(), Err(ConstructionError::NotSchedulable(_))));

        let mut tx = Transaction::new(Operation::transfer(vec![Transfer::new(AccountId::from_num(2), 1)]));
        tx.set_transaction_id(id()).unwrap();
        let mut schedule = tx.schedule().unwrap();
        schedule.set_node_account_ids(vec![NodeId::from_num(3)]).unwrap();
        schedule.freeze().unwrap();
        assert_eq!(schedule.frozen().unwrap().transaction_id(), id());
        assert!(matches!(schedule.schedule(), Err(ConstructionError::Immutable)));
    }
}
