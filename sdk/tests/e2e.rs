//! End-to-end integration tests for the Tessera SDK.
//!
//! These tests drive the public API only: build, freeze, sign (locally,
//! out of band and concurrently), serialize, reload and execute against a
//! mock transport.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tessera_sdk::crypto::{Keypair, Signer};
use tessera_sdk::identity::{AccountId, FileId, NodeId, Timestamp, TopicId, TransactionId};
use tessera_sdk::network::{Client, MockReply, MockTransport, Transport};
use tessera_sdk::transaction::codec::{encode_list, encode_signed};
use tessera_sdk::transaction::{
    build_body, ChunkInfo, DecodeError, FrozenTransaction, Operation, SignatureMap, Status, Transaction,
    TransactionBuilder, TransactionContent, Transfer, WireShape,
};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

const OPERATOR: AccountId = AccountId::from_num(1001);

fn nodes() -> Vec<NodeId> {
    vec![NodeId::from_num(3), NodeId::from_num(4)]
}

fn client(mock: &Arc<MockTransport>, operator: &Keypair) -> Client {
    Client::builder(Arc::clone(mock) as Arc<dyn Transport>)
        .nodes(nodes())
        .operator(OPERATOR, operator.clone())
        .build()
}

fn fixed_id() -> TransactionId {
    TransactionId::with_valid_start(OPERATOR, Timestamp::from_seconds(1_554_158_542))
}

fn transfer() -> Operation {
    Operation::transfer(vec![
        Transfer::new(OPERATOR, -500),
        Transfer::new(AccountId::from_num(1002), 500),
    ])
}

fn frozen_transfer() -> FrozenTransaction {
    TransactionBuilder::new(transfer())
        .transaction_id(fixed_id())
        .node_account_ids(nodes())
        .memo("e2e")
        .freeze()
        .unwrap()
}

fn frozen_append(len: usize, chunk_size: usize) -> FrozenTransaction {
    TransactionBuilder::new(Operation::file_append(FileId::from_num(77), vec![0x5A; len]))
        .transaction_id(fixed_id())
        .node_account_ids(nodes())
        .chunk_size(chunk_size)
        .freeze()
        .unwrap()
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn full_transfer_lifecycle() {
    let mock = Arc::new(MockTransport::new());
    let operator = Keypair::generate();
    let client = client(&mock, &operator);

    let mut tx = TransactionBuilder::new(transfer())
        .max_transaction_fee(100_000_000)
        .valid_duration(Duration::from_secs(60))
        .freeze_with(&client)
        .unwrap();
    tx.sign(operator.clone());

    let response = tx.execute(&client).await.unwrap();
    assert_eq!(response.status, Status::Ok);
    assert_eq!(response.transaction_id, tx.transaction_id());
    assert_eq!(response.transaction_hash, tx.transaction_hash().unwrap());
    assert_eq!(mock.submission_count(), 1);
}

#[test]
fn runtime_checked_lifecycle() {
    let mut tx = Transaction::new(transfer());
    tx.set_transaction_id(fixed_id())
        .unwrap()
        .set_node_account_ids(nodes())
        .unwrap()
        .set_memo("draft")
        .unwrap();
    assert!(tx.signable_bodies().is_err());

    tx.freeze().unwrap();
    assert!(tx.set_memo("too late").is_err());
    assert_eq!(tx.signable_bodies().unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// Serialization Round Trips
// ---------------------------------------------------------------------------

#[test]
fn shape_c_round_trip_preserves_bodies_and_signatures() {
    let tx = frozen_append(3000, 1024);
    let alice = Keypair::generate();
    tx.sign(alice.clone());

    let bytes = tx.to_bytes().unwrap();
    assert_eq!(FrozenTransaction::detect_shape(&bytes).unwrap(), WireShape::List);

    let reloaded = FrozenTransaction::from_bytes(&bytes).unwrap();
    assert_eq!(reloaded.signable_bodies(), tx.signable_bodies());
    assert_eq!(reloaded.get_all_signatures(), tx.get_all_signatures());
    assert_eq!(reloaded.transaction_ids(), tx.transaction_ids());
    assert_eq!(reloaded.chunk_size(), 1024);
    assert_eq!(reloaded.content(), tx.content());
    assert!(reloaded.is_transaction_id_pinned());
    assert_eq!(reloaded.to_bytes().unwrap(), bytes);
}

#[test]
fn hex_string_round_trip() {
    let tx = frozen_transfer();
    tx.sign(Keypair::generate());
    let text = tx.to_hex().unwrap();
    let reloaded = FrozenTransaction::from_hex(&text).unwrap();
    assert_eq!(reloaded.to_hex().unwrap(), text);
}

#[test]
fn shape_a_bare_body_loads() {
    let tx = frozen_transfer();
    let body = tx.signable_bodies().remove(0);
    assert_eq!(FrozenTransaction::detect_shape(&body.body).unwrap(), WireShape::Body);

    let reloaded = FrozenTransaction::from_bytes(&body.body).unwrap();
    assert_eq!(reloaded.node_account_ids(), vec![body.node]);
    assert_eq!(reloaded.transaction_id(), body.transaction_id);
    assert!(reloaded.signer_keys().is_empty());
    assert_eq!(reloaded.memo(), "e2e");
}

#[test]
fn shape_b_signed_cell_loads() {
    let tx = frozen_transfer();
    let kp = Keypair::generate();
    let body = tx.signable_bodies().remove(1);
    let mut sigs = SignatureMap::new();
    sigs.insert(kp.public_key(), kp.sign(&body.body));

    let bytes = encode_signed(&body.body, &sigs).unwrap();
    let reloaded = FrozenTransaction::from_bytes(&bytes).unwrap();
    assert_eq!(reloaded.node_account_ids(), vec![NodeId::from_num(4)]);
    assert_eq!(reloaded.get_signatures().unwrap()[&NodeId::from_num(4)], sigs);
}

#[test]
fn stitched_container_is_rejected() {
    let a = frozen_transfer();
    let b = TransactionBuilder::new(Operation::transfer(vec![Transfer::new(OPERATOR, -1)]))
        .transaction_id(fixed_id())
        .node_account_ids(nodes())
        .memo("e2e")
        .freeze()
        .unwrap();

    let cells = vec![
        encode_signed(&a.signable_bodies()[0].body, &SignatureMap::new()).unwrap(),
        encode_signed(&b.signable_bodies()[1].body, &SignatureMap::new()).unwrap(),
    ];
    let err = FrozenTransaction::from_bytes(&encode_list(cells).unwrap()).unwrap_err();
    assert!(matches!(err, DecodeError::ContentMismatch { field: "data", .. }), "{err}");
}

#[test]
fn garbage_is_rejected() {
    assert_eq!(FrozenTransaction::from_bytes(&[]).unwrap_err(), DecodeError::Empty);
    assert!(matches!(
        FrozenTransaction::from_bytes(b"not a transaction"),
        Err(DecodeError::Unrecognized(_))
    ));
    assert!(matches!(FrozenTransaction::from_hex("zz"), Err(DecodeError::Malformed { shape: "hex", .. })));
}

// ---------------------------------------------------------------------------
// Container validation
// ---------------------------------------------------------------------------

fn list_of(bodies: &[Vec<u8>]) -> Vec<u8> {
    let cells = bodies
        .iter()
        .map(|body| encode_signed(body, &SignatureMap::new()).unwrap())
        .collect();
    encode_list(cells).unwrap()
}

fn topic_chunk(id: TransactionId, message: &[u8], info: ChunkInfo) -> Vec<Vec<u8>> {
    let op = Operation::topic_message(TopicId::from_num(12), message.to_vec()).for_chunk(message, info);
    let content = TransactionContent::new(op);
    nodes().iter().map(|node| build_body(&content, &id, node).unwrap()).collect()
}

#[test]
fn truncated_topic_container_is_rejected() {
    let frozen = TransactionBuilder::new(Operation::topic_message(TopicId::from_num(12), vec![0x42; 30]))
        .transaction_id(fixed_id())
        .node_account_ids(nodes())
        .chunk_size(10)
        .freeze()
        .unwrap();
    assert_eq!(frozen.chunk_count(), 3);

    let kept: Vec<Vec<u8>> = frozen.signable_bodies()[..4].iter().map(|b| b.body.clone()).collect();
    let err = FrozenTransaction::from_bytes(&list_of(&kept)).unwrap_err();
    assert!(matches!(err, DecodeError::IrregularMatrix(_)), "{err}");
}

#[test]
fn misnumbered_topic_chunks_are_rejected() {
    let id = fixed_id();
    let info = ChunkInfo { initial_transaction_id: id, number: 1, total: 2 };
    let mut bodies = topic_chunk(id, b"abcd", info);
    bodies.extend(topic_chunk(id.for_chunk(1), b"ef", info));

    let err = FrozenTransaction::from_bytes(&list_of(&bodies)).unwrap_err();
    assert!(matches!(err, DecodeError::IrregularMatrix(_)), "{err}");

    let mut bodies = topic_chunk(id, b"abcd", info);
    bodies.extend(topic_chunk(id.for_chunk(1), b"ef", ChunkInfo { number: 2, ..info }));
    let reloaded = FrozenTransaction::from_bytes(&list_of(&bodies)).unwrap();
    assert_eq!(reloaded.chunk_count(), 2);
}

#[test]
fn short_middle_chunk_is_rejected() {
    let id = fixed_id();
    let bodies: Vec<Vec<u8>> = [4usize, 2, 4]
        .iter()
        .enumerate()
        .flat_map(|(k, len)| {
            let content = TransactionContent::new(Operation::file_append(FileId::from_num(77), vec![0x5A; *len]));
            let chunk_id = id.for_chunk(k);
            nodes()
                .iter()
                .map(|node| build_body(&content, &chunk_id, node).unwrap())
                .collect::<Vec<_>>()
        })
        .collect();

    let err = FrozenTransaction::from_bytes(&list_of(&bodies)).unwrap_err();
    assert!(matches!(err, DecodeError::IrregularMatrix(_)), "{err}");
}

#[test]
fn file_append_chunks_from_different_requests_are_rejected() {
    let a = frozen_append(2048, 1024);
    let b = TransactionBuilder::new(Operation::file_append(FileId::from_num(77), vec![0x5A; 2048]))
        .transaction_id(TransactionId::with_valid_start(OPERATOR, Timestamp::from_seconds(1_554_158_600)))
        .node_account_ids(nodes())
        .chunk_size(1024)
        .freeze()
        .unwrap();

    let mut bodies: Vec<Vec<u8>> = a.signable_bodies()[..2].iter().map(|c| c.body.clone()).collect();
    bodies.extend(b.signable_bodies()[2..].iter().map(|c| c.body.clone()));

    let err = FrozenTransaction::from_bytes(&list_of(&bodies)).unwrap_err();
    assert!(matches!(err, DecodeError::ContentMismatch { field: "transaction_id", .. }), "{err}");
}

#[test]
fn topic_chunks_correlate_through_the_initial_id() {
    let id = fixed_id();
    let info = ChunkInfo { initial_transaction_id: id, number: 1, total: 2 };
    let later = TransactionId::with_valid_start(OPERATOR, Timestamp::from_seconds(1_554_158_600)).for_chunk(1);
    let mut bodies = topic_chunk(id, b"abcd", info);
    bodies.extend(topic_chunk(later, b"ef", ChunkInfo { number: 2, ..info }));

    let reloaded = FrozenTransaction::from_bytes(&list_of(&bodies)).unwrap();
    assert_eq!(reloaded.transaction_ids(), vec![id, later]);
}

// ---------------------------------------------------------------------------
// Sizes
// ---------------------------------------------------------------------------

#[test]
fn size_properties() {
    let unsigned = frozen_transfer();
    let signed = frozen_transfer();
    signed.sign(Keypair::generate());

    assert_eq!(frozen_transfer().transaction_size().unwrap(), unsigned.transaction_size().unwrap());
    assert!(signed.transaction_size().unwrap() > unsigned.transaction_size().unwrap());
    assert_eq!(signed.transaction_body_size().unwrap(), unsigned.transaction_body_size().unwrap());

    let explicit = TransactionBuilder::new(transfer())
        .transaction_id(fixed_id())
        .node_account_ids(nodes())
        .memo("e2e")
        .max_transaction_fee(1)
        .valid_duration(Duration::from_secs(30))
        .freeze()
        .unwrap();
    assert!(explicit.transaction_body_size().unwrap() > unsigned.transaction_body_size().unwrap());
}

// ---------------------------------------------------------------------------
// Signatures
// ---------------------------------------------------------------------------

#[test]
fn signature_indexing_semantics() {
    let tx = frozen_append(4096, 2048);
    let kp = Keypair::generate();
    let second = fixed_id().for_chunk(1);

    assert!(!tx.add_signature(kp.public_key(), vec![1], &second, &NodeId::from_num(99)), "wrong node");
    let unrelated = TransactionId::with_valid_start(OPERATOR, Timestamp::from_seconds(1));
    assert!(!tx.add_signature(kp.public_key(), vec![1], &unrelated, &NodeId::from_num(3)), "wrong id");

    assert!(tx.add_signature(kp.public_key(), vec![1], &second, &NodeId::from_num(4)));
    let by_node = tx.signatures_for(&NodeId::from_num(4));
    assert_eq!(by_node[&second][&kp.public_key()], vec![1]);
    assert!(by_node[&fixed_id()].is_empty());
    assert!(tx.signatures_for(&NodeId::from_num(3)).values().all(|m| m.is_empty()));
}

#[test]
fn out_of_band_signing_through_bytes() {
    let tx = frozen_append(4096, 2048);
    let offline = Keypair::generate();

    // Ship the unsigned grid to another party, who signs every body.
    let shipped = FrozenTransaction::from_bytes(&tx.to_bytes().unwrap()).unwrap();
    for body in shipped.signable_bodies() {
        let signature = offline.sign(&body.body);
        assert!(shipped.add_signature(offline.public_key(), signature, &body.transaction_id, &body.node));
    }

    // And back again.
    let returned = FrozenTransaction::from_bytes(&shipped.to_bytes().unwrap()).unwrap();
    for body in returned.signable_bodies() {
        let sigs = &returned.get_all_signatures()[&body.transaction_id][&body.node];
        assert!(offline.public_key().verify(&body.body, &sigs[&offline.public_key()]));
    }
}

#[test]
fn concurrent_signers() {
    let tx = Arc::new(frozen_append(8192, 1024));
    let keys: Vec<Keypair> = (0..6u8).map(|i| Keypair::from_seed(&[i + 1; 32])).collect();

    let handles: Vec<_> = keys
        .iter()
        .cloned()
        .map(|kp| {
            let tx = Arc::clone(&tx);
            thread::spawn(move || {
                tx.sign(kp);
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let all = tx.get_all_signatures();
    assert_eq!(all.len(), 8);
    for per_node in all.values() {
        for sigs in per_node.values() {
            assert_eq!(sigs.len(), keys.len());
        }
    }
    let expected: HashSet<_> = keys.iter().map(Signer::public_key).collect();
    assert_eq!(tx.signer_keys().into_iter().collect::<HashSet<_>>(), expected);
}

// ---------------------------------------------------------------------------
// Chunked Execution
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn chunked_topic_message_executes_in_order() {
    let mock = Arc::new(MockTransport::with_replies([MockReply::Status(Status::Busy)]));
    let operator = Keypair::generate();
    let client = client(&mock, &operator);

    let message: Vec<u8> = (0..2500u32).map(|i| (i % 256) as u8).collect();
    let mut tx = TransactionBuilder::new(Operation::topic_message(TopicId::from_num(5), message))
        .freeze_with(&client)
        .unwrap();
    assert_eq!(tx.chunk_count(), 3);

    let responses = tx.execute_all(&client).await.unwrap();
    assert_eq!(responses.len(), 3);
    assert_eq!(responses[0].node, NodeId::from_num(4), "busy node 3 was skipped");

    let submitted: Vec<_> = mock.submissions().iter().map(|s| s.node).collect();
    assert_eq!(submitted, vec![NodeId::from_num(3), NodeId::from_num(4), NodeId::from_num(3), NodeId::from_num(3)]);
    let nonces: Vec<_> = responses.iter().map(|r| r.transaction_id.nonce).collect();
    assert_eq!(nonces, vec![None, Some(1), Some(2)]);
}

#[tokio::test(start_paused = true)]
async fn decoded_transaction_executes_without_regeneration() {
    let mock = Arc::new(MockTransport::with_replies([MockReply::Status(Status::TransactionExpired)]));
    let operator = Keypair::generate();
    let client = client(&mock, &operator);

    let original = TransactionBuilder::new(transfer()).freeze_with(&client).unwrap();
    original.sign(operator.clone());
    let mut reloaded = FrozenTransaction::from_bytes(&original.to_bytes().unwrap()).unwrap();

    assert!(reloaded.execute(&client).await.is_err());
    assert_eq!(mock.submission_count(), 1);
}
