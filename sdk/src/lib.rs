// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Tessera SDK
//!
//! Client-side engine for building, signing and submitting ledger requests
//! to a pool of nodes.
//!
//! A request is frozen once: its payload is split into chunks, an identity
//! is assigned, and one canonical body is encoded for every `(chunk, node)`
//! pair. Signers sign those exact bytes, possibly from several threads or
//! several machines (the whole signed grid round-trips through bytes).
//! Execution then walks the chunks in order, failing over between nodes and
//! replacing an expired identity when it safely can.
//!
//! ## Architecture
//!
//! - **config** — Wire magics, defaults and limits.
//! - **crypto** — The `Signer` seam, an Ed25519 reference signer, SHA-384.
//! - **identity** — Entity ids, timestamps, transaction ids and the
//!   collision-free identity generator.
//! - **transaction** — Operations, body encoding, chunking, the node×chunk
//!   matrix, signature collection, serialization and the request lifecycle.
//! - **network** — Client, transport seam, backoff and the execution engine.
//!
//! ## Quick Tour
//!
//! ```rust
//! use std::sync::Arc;
//! use tessera_sdk::crypto::Keypair;
//! use tessera_sdk::identity::{AccountId, NodeId};
//! use tessera_sdk::network::{Client, MockTransport};
//! use tessera_sdk::transaction::{Operation, TransactionBuilder, Transfer};
//!
//! let operator = Keypair::generate();
//! let client = Client::builder(Arc::new(MockTransport::new()))
//!     .nodes([NodeId::from_num(3), NodeId::from_num(4)])
//!     .operator(AccountId::from_num(1001), operator.clone())
//!     .build();
//!
//! let mut tx = TransactionBuilder::new(Operation::transfer(vec![
//!     Transfer::new(AccountId::from_num(1001), -10),
//!     Transfer::new(AccountId::from_num(1002), 10),
//! ]))
//! .freeze_with(&client)
//! .unwrap();
//! tx.sign(operator);
//!
//! let response = tx.execute_blocking(&client).unwrap();
//! assert!(response.transaction_hash.len() == 48);
//! ```

pub mod config;
pub mod crypto;
pub mod identity;
pub mod network;
pub mod transaction;
