//! # CLI Interface
//!
//! Defines the command-line argument structure for `tessera` using `clap`
//! derive. Supports six subcommands: `keygen`, `txid`, `build`, `sign`,
//! `inspect` and `simulate`.
//!
//! Every flag that makes sense outside a single invocation can also be set
//! through a `TESSERA_*` environment variable.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use tessera_sdk::config::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_CHUNKS};
use tessera_sdk::identity::{AccountId, EntityId, NodeId, TransactionId};

/// Build, sign, inspect and simulate Tessera ledger transactions.
///
/// Transactions are exchanged as hex-encoded transaction lists, so the
/// output of one subcommand can be piped into the next.
#[derive(Parser, Debug)]
#[command(
    name = "tessera",
    about = "Tessera transaction toolkit",
    version,
    propagate_version = true
)]
pub struct TesseraCli {
    /// Log output format.
    #[arg(long, global = true, env = "TESSERA_LOG_FORMAT", value_enum, default_value_t = LogFormatArg::Pretty)]
    pub log_format: LogFormatArg,

    /// Default log filter when `RUST_LOG` is unset.
    #[arg(long, global = true, env = "TESSERA_LOG", default_value = "tessera_cli=info,tessera_sdk=info")]
    pub log_level: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a fresh Ed25519 keypair.
    Keygen(KeygenArgs),
    /// Generate transaction ids for a payer.
    Txid(TxidArgs),
    /// Build and freeze a transaction, printing it as hex.
    Build(BuildArgs),
    /// Add a signature to every cell of a hex-encoded transaction.
    Sign(SignArgs),
    /// Decode a hex-encoded transaction and describe it.
    Inspect(InspectArgs),
    /// Execute a transaction against a scripted in-memory network.
    Simulate(SimulateArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Json,
}

#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Derive the keypair from a 32-byte hex seed instead of the OS RNG.
    #[arg(long)]
    pub seed: Option<String>,

    /// Print a JSON object instead of two lines.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct TxidArgs {
    /// Paying account, `shard.realm.num`.
    #[arg(long, env = "TESSERA_PAYER")]
    pub payer: AccountId,

    /// Number of ids to generate.
    #[arg(long, short = 'n', default_value_t = 1)]
    pub count: usize,
}

/// Operation selected by `build`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OperationArg {
    Transfer,
    AccountCreate,
    FileCreate,
    FileAppend,
    TopicMessage,
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Operation to build.
    #[arg(long, value_enum)]
    pub operation: OperationArg,

    /// Paying account, `shard.realm.num`. Used to generate the transaction
    /// id unless `--transaction-id` is given.
    #[arg(long, env = "TESSERA_PAYER")]
    pub payer: Option<AccountId>,

    /// Explicit transaction id, `payer@seconds.nanos`.
    #[arg(long)]
    pub transaction_id: Option<TransactionId>,

    /// Target nodes, comma separated, in failover order.
    #[arg(long, env = "TESSERA_NODES", value_delimiter = ',', required = true)]
    pub nodes: Vec<NodeId>,

    /// Transfer: receiving account.
    #[arg(long)]
    pub to: Option<AccountId>,

    /// Transfer: amount moved from the payer to `--to`.
    #[arg(long)]
    pub amount: Option<i64>,

    /// File append / topic message: target file or topic.
    #[arg(long)]
    pub target: Option<EntityId>,

    /// Account create / file create: hex public key.
    #[arg(long)]
    pub key: Option<String>,

    /// Payload for file and topic operations, read from a file.
    #[arg(long, conflicts_with = "message")]
    pub data_file: Option<PathBuf>,

    /// Payload for file and topic operations, given inline.
    #[arg(long)]
    pub message: Option<String>,

    #[arg(long, default_value = "")]
    pub memo: String,

    #[arg(long, env = "TESSERA_MAX_FEE")]
    pub max_fee: Option<u64>,

    /// Validity window in seconds.
    #[arg(long)]
    pub valid_duration: Option<u64>,

    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    #[arg(long, default_value_t = DEFAULT_MAX_CHUNKS)]
    pub max_chunks: usize,

    /// Hex private key to sign with right after freezing.
    #[arg(long, env = "TESSERA_SIGNING_KEY")]
    pub sign_with: Option<String>,

    /// Write the hex output here instead of stdout.
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,
}

/// Where a hex-encoded transaction comes from.
#[derive(Args, Debug)]
pub struct InputArgs {
    /// Hex transaction. Read from `--file` or stdin when omitted.
    pub hex: Option<String>,

    /// File containing the hex transaction.
    #[arg(long, short = 'f', conflicts_with = "hex")]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct SignArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Hex private key.
    #[arg(long, env = "TESSERA_SIGNING_KEY")]
    pub key: String,

    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Print a JSON document instead of text.
    #[arg(long)]
    pub json: bool,
}

/// A scripted node reply for `simulate`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReplyArg {
    Ok,
    Busy,
    Expired,
    Unavailable,
    Exhausted,
    Hang,
    InvalidSignature,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Replies returned in order by the simulated network, comma separated.
    /// Every submission after the script runs out is accepted.
    #[arg(long, value_enum, value_delimiter = ',')]
    pub replies: Vec<ReplyArg>,

    /// Operator account; its key also signs regenerated bodies.
    #[arg(long, env = "TESSERA_OPERATOR_ID")]
    pub operator_id: Option<AccountId>,

    /// Operator hex private key.
    #[arg(long, env = "TESSERA_OPERATOR_KEY", requires = "operator_id")]
    pub operator_key: Option<String>,

    #[arg(long, env = "TESSERA_MAX_ATTEMPTS", default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,

    /// Per-attempt timeout in milliseconds.
    #[arg(long, env = "TESSERA_REQUEST_TIMEOUT_MS", default_value_t = 10_000)]
    pub timeout_ms: u64,

    /// Minimum backoff in milliseconds.
    #[arg(long, default_value_t = 250)]
    pub min_backoff_ms: u64,

    /// Maximum backoff in milliseconds.
    #[arg(long, default_value_t = 8_000)]
    pub max_backoff_ms: u64,

    /// Dump execution metrics in Prometheus text format afterwards.
    #[arg(long)]
    pub metrics: bool,
}
