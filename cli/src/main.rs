// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Tessera CLI
//!
//! Entry point for the `tessera` binary. Parses CLI arguments, initializes
//! logging and dispatches to one of the subcommands:
//!
//! - `keygen`   — generate an Ed25519 keypair
//! - `txid`     — generate transaction ids for a payer
//! - `build`    — build, freeze and optionally sign a transaction
//! - `sign`     — add a signature to a hex-encoded transaction
//! - `inspect`  — decode a transaction and describe its grid
//! - `simulate` — execute against a scripted in-memory network
//!
//! Transactions travel between subcommands as hex-encoded transaction
//! lists on stdin/stdout. Logs go to stderr.

mod cli;
mod logging;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tessera_sdk::crypto::{Keypair, PublicKey};
use tessera_sdk::identity::{AccountId, IdentityGenerator, NodeId};
use tessera_sdk::network::{
    BackoffPolicy, Client, ExecutionConfig, ExecutionMetrics, MockReply, MockTransport, TransportError,
};
use tessera_sdk::transaction::{FrozenTransaction, Operation, Status, Transfer, TransactionBuilder};

use cli::{
    BuildArgs, Commands, InputArgs, InspectArgs, KeygenArgs, OperationArg, ReplyArg, SignArgs, SimulateArgs,
    TesseraCli, TxidArgs,
};
use logging::LogFormat;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = TesseraCli::parse();
    logging::init_logging(&cli.log_level, LogFormat::from(cli.log_format));

    match cli.command {
        Commands::Keygen(args) => keygen(args),
        Commands::Txid(args) => txid(args),
        Commands::Build(args) => build(args),
        Commands::Sign(args) => sign(args),
        Commands::Inspect(args) => inspect(args),
        Commands::Simulate(args) => simulate(args).await,
    }
}

// ---------------------------------------------------------------------------
// Input / output
// ---------------------------------------------------------------------------

fn read_input(input: &InputArgs) -> Result<String> {
    let raw = match (&input.hex, &input.file) {
        (Some(hex), _) => hex.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, None) => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read transaction from stdin")?;
            buf
        }
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("no transaction given");
    }
    Ok(trimmed.to_string())
}

fn write_output(out: Option<&Path>, text: &str) -> Result<()> {
    match out {
        Some(path) => std::fs::write(path, format!("{}\n", text))
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            println!("{}", text);
            Ok(())
        }
    }
}

fn load_transaction(input: &InputArgs) -> Result<FrozenTransaction> {
    let hex = read_input(input)?;
    FrozenTransaction::from_hex(&hex).context("failed to decode transaction")
}

fn parse_keypair(hex: &str) -> Result<Keypair> {
    Keypair::from_hex(hex).context("invalid private key")
}

// ---------------------------------------------------------------------------
// keygen / txid
// ---------------------------------------------------------------------------

fn keygen(args: KeygenArgs) -> Result<()> {
    let keypair = match args.seed {
        Some(seed) => {
            let bytes = hex::decode(seed.trim()).context("seed is not hex")?;
            let seed: [u8; 32] = bytes
                .try_into()
                .map_err(|_| anyhow!("seed must be exactly 32 bytes"))?;
            Keypair::from_seed(&seed)
        }
        None => Keypair::generate(),
    };

    if args.json {
        let doc = serde_json::json!({
            "private_key": keypair.to_hex(),
            "public_key": keypair.public_key().to_hex(),
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        println!("private: {}", keypair.to_hex());
        println!("public:  {}", keypair.public_key());
    }
    Ok(())
}

fn txid(args: TxidArgs) -> Result<()> {
    let generator = IdentityGenerator::new();
    for _ in 0..args.count {
        println!("{}", generator.next(args.payer));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// build
// ---------------------------------------------------------------------------

fn payload(args: &BuildArgs) -> Result<Vec<u8>> {
    match (&args.data_file, &args.message) {
        (Some(path), _) => std::fs::read(path).with_context(|| format!("failed to read {}", path.display())),
        (None, Some(message)) => Ok(message.clone().into_bytes()),
        (None, None) => bail!("{:?} needs --data-file or --message", args.operation),
    }
}

fn operation(args: &BuildArgs, payer: AccountId) -> Result<Operation> {
    let key = args
        .key
        .as_deref()
        .map(PublicKey::from_hex)
        .transpose()
        .context("invalid public key")?;

    let op = match args.operation {
        OperationArg::Transfer => {
            let to = args.to.ok_or_else(|| anyhow!("transfer needs --to"))?;
            let amount = args.amount.ok_or_else(|| anyhow!("transfer needs --amount"))?;
            Operation::transfer(vec![Transfer::new(payer, -amount), Transfer::new(to, amount)])
        }
        OperationArg::AccountCreate => {
            Operation::account_create(key.ok_or_else(|| anyhow!("account-create needs --key"))?)
        }
        OperationArg::FileCreate => Operation::file_create(key.into_iter().collect(), payload(args)?),
        OperationArg::FileAppend => {
            let file = args.target.ok_or_else(|| anyhow!("file-append needs --target"))?;
            Operation::file_append(file, payload(args)?)
        }
        OperationArg::TopicMessage => {
            let topic = args.target.ok_or_else(|| anyhow!("topic-message needs --target"))?;
            Operation::topic_message(topic, payload(args)?)
        }
    };
    Ok(op)
}

fn build(args: BuildArgs) -> Result<()> {
    let payer = args
        .transaction_id
        .map(|id| id.account_id)
        .or(args.payer)
        .ok_or_else(|| anyhow!("either --payer or --transaction-id is required"))?;
    let transaction_id = args
        .transaction_id
        .unwrap_or_else(|| IdentityGenerator::new().next(payer));

    let mut builder = TransactionBuilder::new(operation(&args, payer)?)
        .transaction_id(transaction_id)
        .node_account_ids(args.nodes.iter().copied())
        .memo(args.memo.as_str())
        .chunk_size(args.chunk_size)
        .max_chunks(args.max_chunks);
    if let Some(fee) = args.max_fee {
        builder = builder.max_transaction_fee(fee);
    }
    if let Some(secs) = args.valid_duration {
        builder = builder.valid_duration(Duration::from_secs(secs));
    }

    let frozen = builder.freeze().context("failed to freeze transaction")?;
    if let Some(key) = &args.sign_with {
        frozen.sign(parse_keypair(key)?);
    }

    tracing::info!(
        transaction_id = %frozen.transaction_id(),
        chunks = frozen.chunk_count(),
        nodes = frozen.node_account_ids().len(),
        "transaction built"
    );
    write_output(args.out.as_deref(), &frozen.to_hex()?)
}

// ---------------------------------------------------------------------------
// sign / inspect
// ---------------------------------------------------------------------------

fn sign(args: SignArgs) -> Result<()> {
    let frozen = load_transaction(&args.input)?;
    let keypair = parse_keypair(&args.key)?;
    let public_key = keypair.public_key();
    frozen.sign(keypair);
    tracing::info!(
        transaction_id = %frozen.transaction_id(),
        public_key = %public_key,
        "transaction signed"
    );
    write_output(args.out.as_deref(), &frozen.to_hex()?)
}

fn inspect(args: InspectArgs) -> Result<()> {
    let hex = read_input(&args.input)?;
    let bytes = hex::decode(&hex).context("input is not hex")?;
    let shape = FrozenTransaction::detect_shape(&bytes).context("unrecognised transaction bytes")?;
    let frozen = FrozenTransaction::from_bytes(&bytes).context("failed to decode transaction")?;

    let ids: Vec<String> = frozen.transaction_ids().iter().map(ToString::to_string).collect();
    let nodes: Vec<String> = frozen.node_account_ids().iter().map(ToString::to_string).collect();
    let signers: Vec<String> = frozen.signer_keys().iter().map(ToString::to_string).collect();
    let hashes = frozen.transaction_hash_per_node()?;
    let kind = frozen.content().operation.kind();

    if args.json {
        let hashes: serde_json::Map<String, serde_json::Value> = hashes
            .iter()
            .map(|(node, hash)| (node.to_string(), hex::encode(hash).into()))
            .collect();
        let doc = serde_json::json!({
            "shape": shape.name(),
            "operation": kind.to_string(),
            "transaction_id": frozen.transaction_id().to_string(),
            "chunk_ids": ids,
            "nodes": nodes,
            "chunk_count": frozen.chunk_count(),
            "chunk_size": frozen.chunk_size(),
            "memo": frozen.memo(),
            "max_transaction_fee": frozen.max_transaction_fee(),
            "signers": signers,
            "transaction_size": frozen.transaction_size()?,
            "body_sizes": frozen.body_size_all_chunks(),
            "hashes": hashes,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!("shape:      {}", shape);
    println!("operation:  {}", kind);
    println!("id:         {}", frozen.transaction_id());
    println!("chunks:     {} x {} bytes", frozen.chunk_count(), frozen.chunk_size());
    for id in &ids {
        println!("  - {}", id);
    }
    println!("nodes:      {}", nodes.join(", "));
    println!("memo:       {:?}", frozen.memo());
    if let Some(fee) = frozen.max_transaction_fee() {
        println!("max fee:    {}", fee);
    }
    println!("size:       {} bytes", frozen.transaction_size()?);
    println!("signers:    {}", signers.len());
    for signer in &signers {
        println!("  - {}", signer);
    }
    println!("hashes:");
    for (node, hash) in &hashes {
        println!("  {} {}", node, hex::encode(hash));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// simulate
// ---------------------------------------------------------------------------

fn scripted_reply(reply: ReplyArg, node: NodeId) -> MockReply {
    match reply {
        ReplyArg::Ok => MockReply::Status(Status::Ok),
        ReplyArg::Busy => MockReply::Status(Status::Busy),
        ReplyArg::Expired => MockReply::Status(Status::TransactionExpired),
        ReplyArg::InvalidSignature => MockReply::Status(Status::InvalidSignature),
        ReplyArg::Unavailable => MockReply::Error(TransportError::Unavailable(node)),
        ReplyArg::Exhausted => MockReply::Error(TransportError::ResourceExhausted(node)),
        ReplyArg::Hang => MockReply::Hang,
    }
}

async fn simulate(args: SimulateArgs) -> Result<()> {
    let mut frozen = load_transaction(&args.input)?;
    let nodes = frozen.node_account_ids();
    let first_node = nodes
        .first()
        .copied()
        .ok_or_else(|| anyhow!("transaction has no nodes"))?;

    let transport = Arc::new(MockTransport::with_replies(
        args.replies.iter().map(|reply| scripted_reply(*reply, first_node)),
    ));

    let mut builder = Client::builder(transport.clone())
        .nodes(nodes)
        .request_timeout(Duration::from_millis(args.timeout_ms))
        .execution_config(ExecutionConfig {
            max_attempts: args.max_attempts,
            backoff: BackoffPolicy::new(
                Duration::from_millis(args.min_backoff_ms),
                Duration::from_millis(args.max_backoff_ms),
            ),
            ..ExecutionConfig::default()
        });
    if let (Some(account_id), Some(key)) = (args.operator_id, &args.operator_key) {
        builder = builder.operator(account_id, parse_keypair(key)?);
    }
    let metrics = if args.metrics {
        let metrics = ExecutionMetrics::new().context("failed to register metrics")?;
        builder = builder.metrics(metrics.clone());
        Some(metrics)
    } else {
        None
    };
    let client = builder.build();

    tracing::info!(
        transaction_id = %frozen.transaction_id(),
        chunks = frozen.chunk_count(),
        scripted = args.replies.len(),
        "simulating execution"
    );
    let result = frozen.execute_all(&client).await;

    println!("submissions: {}", transport.submission_count());
    let outcome = match result {
        Ok(responses) => {
            for (chunk, response) in responses.iter().enumerate() {
                println!(
                    "chunk {}: {} via {} after {} attempt(s), hash {}",
                    chunk,
                    response.status,
                    response.node,
                    response.attempts,
                    hex::encode(&response.transaction_hash),
                );
            }
            Ok(())
        }
        Err(e) => Err(anyhow::Error::new(e).context("execution failed")),
    };

    if let Some(metrics) = metrics {
        print!("{}", metrics.encode().context("failed to encode metrics")?);
    }
    outcome
}
