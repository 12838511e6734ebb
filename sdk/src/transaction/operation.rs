//! Operation payloads.
//!
//! Every ledger operation the SDK can build is a variant of [`Operation`].
//! The engine never matches on variants directly; it goes through the
//! small capability surface below (`validate`, `chunk_payload`,
//! `for_chunk`, `with_payload`, `chunk_template`), so adding an operation
//! means adding a variant and teaching those methods about it.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::body::SchedulableBody;
use super::error::ConstructionError;
use crate::crypto::PublicKey;
use crate::identity::{AccountId, FileId, Timestamp, TopicId, TransactionId};

/// One leg of a value transfer. Debits are negative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub account_id: AccountId,
    pub amount: i64,
}

impl Transfer {
    pub const fn new(account_id: AccountId, amount: i64) -> Self {
        Self { account_id, amount }
    }
}

/// Correlates the chunks of a multi-chunk topic message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkInfo {
    /// Identity of chunk 0; shared by every chunk.
    pub initial_transaction_id: TransactionId,
    /// 1-based chunk number.
    pub number: u32,
    /// Total chunks in the message.
    pub total: u32,
}

/// Operation-specific body content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Transfer {
        transfers: Vec<Transfer>,
    },
    AccountCreate {
        key: Option<PublicKey>,
        initial_balance: Option<u64>,
        account_memo: String,
    },
    FileCreate {
        keys: Vec<PublicKey>,
        contents: Vec<u8>,
        expiration_time: Option<Timestamp>,
    },
    FileAppend {
        file_id: Option<FileId>,
        contents: Vec<u8>,
    },
    TopicMessageSubmit {
        topic_id: Option<TopicId>,
        message: Vec<u8>,
        chunk_info: Option<ChunkInfo>,
    },
    /// Hands another request's content to the network for later execution.
    ScheduleCreate {
        scheduled: Box<SchedulableBody>,
    },
}

/// Discriminant of [`Operation`], used in logs and error messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Transfer,
    AccountCreate,
    FileCreate,
    FileAppend,
    TopicMessageSubmit,
    ScheduleCreate,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::Transfer => "Transfer",
            OperationKind::AccountCreate => "AccountCreate",
            OperationKind::FileCreate => "FileCreate",
            OperationKind::FileAppend => "FileAppend",
            OperationKind::TopicMessageSubmit => "TopicMessageSubmit",
            OperationKind::ScheduleCreate => "ScheduleCreate",
        };
        write!(f, "{}", name)
    }
}

impl Operation {
    pub fn transfer(transfers: Vec<Transfer>) -> Self {
        Operation::Transfer { transfers }
    }

    pub fn account_create(key: PublicKey) -> Self {
        Operation::AccountCreate {
            key: Some(key),
            initial_balance: None,
            account_memo: String::new(),
        }
    }

    pub fn file_create(keys: Vec<PublicKey>, contents: impl Into<Vec<u8>>) -> Self {
        Operation::FileCreate {
            keys,
            contents: contents.into(),
            expiration_time: None,
        }
    }

    pub fn file_append(file_id: FileId, contents: impl Into<Vec<u8>>) -> Self {
        Operation::FileAppend {
            file_id: Some(file_id),
            contents: contents.into(),
        }
    }

    pub fn topic_message(topic_id: TopicId, message: impl Into<Vec<u8>>) -> Self {
        Operation::TopicMessageSubmit {
            topic_id: Some(topic_id),
            message: message.into(),
            chunk_info: None,
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Transfer { .. } => OperationKind::Transfer,
            Operation::AccountCreate { .. } => OperationKind::AccountCreate,
            Operation::FileCreate { .. } => OperationKind::FileCreate,
            Operation::FileAppend { .. } => OperationKind::FileAppend,
            Operation::TopicMessageSubmit { .. } => OperationKind::TopicMessageSubmit,
            Operation::ScheduleCreate { .. } => OperationKind::ScheduleCreate,
        }
    }

    /// Check that every field the encoding depends on is present.
    pub fn validate(&self) -> Result<(), ConstructionError> {
        match self {
            Operation::Transfer { transfers } if transfers.is_empty() => {
                Err(ConstructionError::MissingField("transfers"))
            }
            Operation::AccountCreate { key: None, .. } => {
                Err(ConstructionError::MissingField("key"))
            }
            Operation::FileAppend { file_id: None, .. } => {
                Err(ConstructionError::MissingField("file_id"))
            }
            Operation::TopicMessageSubmit { topic_id: None, .. } => {
                Err(ConstructionError::MissingField("topic_id"))
            }
            Operation::ScheduleCreate { scheduled } => match &scheduled.data {
                Operation::ScheduleCreate { .. } => {
                    Err(ConstructionError::NotSchedulable("a schedule cannot wrap another schedule"))
                }
                inner => inner.validate(),
            },
            _ => Ok(()),
        }
    }

    /// The payload the chunking splitter divides, for operations that are
    /// chunked. `None` means the operation is always sent as one chunk.
    pub fn chunk_payload(&self) -> Option<&[u8]> {
        match self {
            Operation::FileAppend { contents, .. } => Some(contents),
            Operation::TopicMessageSubmit { message, .. } => Some(message),
            _ => None,
        }
    }

    /// The operation carried by one chunk: the same fields with the payload
    /// replaced by `data`. Topic messages split across several chunks also
    /// carry `info`.
    pub fn for_chunk(&self, data: &[u8], info: ChunkInfo) -> Operation {
        match self {
            Operation::FileAppend { file_id, .. } => Operation::FileAppend {
                file_id: *file_id,
                contents: data.to_vec(),
            },
            Operation::TopicMessageSubmit { topic_id, .. } => Operation::TopicMessageSubmit {
                topic_id: *topic_id,
                message: data.to_vec(),
                chunk_info: (info.total > 1).then_some(info),
            },
            other => other.clone(),
        }
    }

    /// Inverse of [`for_chunk`](Self::for_chunk): the whole-request
    /// operation carrying the reassembled `payload`.
    pub fn with_payload(&self, payload: Vec<u8>) -> Operation {
        match self {
            Operation::FileAppend { file_id, .. } => Operation::FileAppend {
                file_id: *file_id,
                contents: payload,
            },
            Operation::TopicMessageSubmit { topic_id, .. } => Operation::TopicMessageSubmit {
                topic_id: *topic_id,
                message: payload,
                chunk_info: None,
            },
            other => other.clone(),
        }
    }

    /// The parts of a chunk that every chunk of one request shares: payload
    /// emptied, chunk number zeroed. Two chunks of the same request have
    /// equal templates.
    pub fn chunk_template(&self) -> Operation {
        match self {
            Operation::TopicMessageSubmit {
                topic_id,
                chunk_info,
                ..
            } => Operation::TopicMessageSubmit {
                topic_id: *topic_id,
                message: Vec::new(),
                chunk_info: chunk_info.map(|info| ChunkInfo { number: 0, ..info }),
            },
            other => other.with_payload(Vec::new()),
        }
    }

    /// Collection getter returning an owned copy.
    pub fn transfers(&self) -> Vec<Transfer> {
        match self {
            Operation::Transfer { transfers } => transfers.clone(),
            _ => Vec::new(),
        }
    }
}
