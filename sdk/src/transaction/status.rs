//! Precheck status codes returned by nodes on submission.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A node's verdict on one submitted cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Ok,
    InvalidTransaction,
    PayerAccountNotFound,
    InvalidNodeAccount,
    TransactionExpired,
    InvalidTransactionStart,
    InvalidTransactionDuration,
    InvalidSignature,
    MemoTooLong,
    InsufficientTxFee,
    InsufficientPayerBalance,
    DuplicateTransaction,
    Busy,
    NotSupported,
    /// The node accepted the bytes but could not hand them to consensus.
    PlatformTransactionNotCreated,
    /// The node is up but not yet participating in consensus.
    PlatformNotActive,
    /// A code this SDK does not know.
    Other(i32),
}

/// How the execution engine reacts to a status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusClass {
    Accepted,
    /// Try the same cell on the next node.
    NodeFault,
    /// The identity is no longer usable; regenerate it if allowed.
    IdentityFault,
    Fatal,
}

impl Status {
    pub fn code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::InvalidTransaction => 1,
            Status::PayerAccountNotFound => 2,
            Status::InvalidNodeAccount => 3,
            Status::TransactionExpired => 4,
            Status::InvalidTransactionStart => 5,
            Status::InvalidTransactionDuration => 6,
            Status::InvalidSignature => 7,
            Status::MemoTooLong => 8,
            Status::InsufficientTxFee => 9,
            Status::InsufficientPayerBalance => 10,
            Status::DuplicateTransaction => 11,
            Status::Busy => 12,
            Status::NotSupported => 13,
            Status::PlatformTransactionNotCreated => 17,
            Status::PlatformNotActive => 18,
            Status::Other(code) => code,
        }
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Status::Ok,
            1 => Status::InvalidTransaction,
            2 => Status::PayerAccountNotFound,
            3 => Status::InvalidNodeAccount,
            4 => Status::TransactionExpired,
            5 => Status::InvalidTransactionStart,
            6 => Status::InvalidTransactionDuration,
            7 => Status::InvalidSignature,
            8 => Status::MemoTooLong,
            9 => Status::InsufficientTxFee,
            10 => Status::InsufficientPayerBalance,
            11 => Status::DuplicateTransaction,
            12 => Status::Busy,
            13 => Status::NotSupported,
            17 => Status::PlatformTransactionNotCreated,
            18 => Status::PlatformNotActive,
            other => Status::Other(other),
        }
    }

    pub fn class(self) -> StatusClass {
        match self {
            Status::Ok => StatusClass::Accepted,
            Status::Busy
            | Status::PlatformTransactionNotCreated
            | Status::PlatformNotActive
            | Status::InvalidNodeAccount => StatusClass::NodeFault,
            Status::TransactionExpired => StatusClass::IdentityFault,
            _ => StatusClass::Fatal,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Ok => "OK",
            Status::InvalidTransaction => "INVALID_TRANSACTION",
            Status::PayerAccountNotFound => "PAYER_ACCOUNT_NOT_FOUND",
            Status::InvalidNodeAccount => "INVALID_NODE_ACCOUNT",
            Status::TransactionExpired => "TRANSACTION_EXPIRED",
            Status::InvalidTransactionStart => "INVALID_TRANSACTION_START",
            Status::InvalidTransactionDuration => "INVALID_TRANSACTION_DURATION",
            Status::InvalidSignature => "INVALID_SIGNATURE",
            Status::MemoTooLong => "MEMO_TOO_LONG",
            Status::InsufficientTxFee => "INSUFFICIENT_TX_FEE",
            Status::InsufficientPayerBalance => "INSUFFICIENT_PAYER_BALANCE",
            Status::DuplicateTransaction => "DUPLICATE_TRANSACTION",
            Status::Busy => "BUSY",
            Status::NotSupported => "NOT_SUPPORTED",
            Status::PlatformTransactionNotCreated => "PLATFORM_TRANSACTION_NOT_CREATED",
            Status::PlatformNotActive => "PLATFORM_NOT_ACTIVE",
            Status::Other(code) => return write!(f, "UNKNOWN({})", code),
        };
        write!(f, "{}", name)
    }
}
