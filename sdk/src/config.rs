//! # SDK Configuration & Constants
//!
//! Every default the engine relies on lives here: wire magics, transaction
//! defaults, chunking limits, identity generation parameters and the retry
//! envelope used by the execution engine.
//!
//! Runtime-tunable knobs (backoff, attempts, timeouts) are carried by
//! [`crate::network::ExecutionConfig`] and the [`crate::network::Client`]
//! builder; the values below are their defaults.

use std::time::Duration;

// ---------------------------------------------------------------------------
// SDK Version
// ---------------------------------------------------------------------------

/// SDK version string, reported by the CLI and attached to log lines.
pub const SDK_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Wire Format
// ---------------------------------------------------------------------------

/// Magic prefix for shape A: a bare, unsigned transaction body.
pub const BODY_MAGIC: [u8; 4] = *b"TBDY";

/// Magic prefix for shape B: body bytes plus a signature map.
pub const SIGNED_MAGIC: [u8; 4] = *b"TSIG";

/// Magic prefix for shape C: an ordered list of shape B envelopes.
pub const LIST_MAGIC: [u8; 4] = *b"TLST";

/// Upper bound on the number of bytes the decoder is willing to allocate
/// for a single envelope. Protects `from_bytes` against hostile length
/// prefixes.
pub const MAX_DECODE_BYTES: u64 = 64 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Transaction Defaults
// ---------------------------------------------------------------------------

/// Validity window applied by the network when a body carries no explicit
/// duration.
pub const DEFAULT_TRANSACTION_VALID_DURATION: Duration = Duration::from_secs(120);

/// Fee bound (in the ledger's smallest unit) assumed when neither the
/// transaction nor the client specifies one. 2 whole units.
pub const DEFAULT_MAX_TRANSACTION_FEE: u64 = 200_000_000;

/// Longest memo accepted at freeze time, in bytes.
pub const MAX_MEMO_BYTES: usize = 100;

// ---------------------------------------------------------------------------
// Chunking
// ---------------------------------------------------------------------------

/// Default chunk size for payload-bearing operations, in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Default upper bound on the number of chunks one request may produce.
pub const DEFAULT_MAX_CHUNKS: usize = 20;

// ---------------------------------------------------------------------------
// Identity Generation
// ---------------------------------------------------------------------------

/// Nanoseconds subtracted from "now" when generating a valid-start time.
/// Ten seconds of slack keeps a slightly fast client clock from producing
/// identities the node considers to be in the future.
pub const VALID_START_BACKOFF_NANOS: i64 = 10_000_000_000;

/// Step applied when the clock has not advanced past the last issued
/// valid-start. Jitter added on top stays strictly below this value.
pub const TIMESTAMP_INCREMENT_NANOS: i64 = 1_000;

/// Nanoseconds per millisecond. The generator samples the clock at
/// millisecond precision.
pub const NANOS_PER_MILLI: i64 = 1_000_000;

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Maximum submission attempts per chunk before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Backoff before the first retry. Doubles on every subsequent retry.
pub const DEFAULT_MIN_BACKOFF: Duration = Duration::from_millis(250);

/// Ceiling for the exponential backoff.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(8);

/// Deadline applied to a single submission attempt. Exceeding it counts as
/// a node fault, not as a failure of the whole request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
