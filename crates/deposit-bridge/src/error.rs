//! Error types for the deposit bridge.

use std::time::Duration;

use alloy_primitives::B256;

use crate::deposit::DepositError;

pub type Result<T> = std::result::Result<T, BridgeError>;

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("no wallet connected")]
    NotConnected,

    #[error("a bridge operation is already in progress")]
    AlreadyInProgress,

    #[error("deposit submission failed: {0}")]
    Submission(String),

    #[error("deposit transaction reverted: {0}")]
    Reverted(B256),

    #[error("no deposit message {message_index} found in transaction {tx_hash}")]
    MessageNotFound { tx_hash: B256, message_index: usize },

    #[error("invalid deposit log: {0}")]
    Deposit(#[from] DepositError),

    #[error("waiting for the L2 receipt failed: {0}")]
    ReceiptWait(String),

    #[error("no L2 receipt after {0:?}")]
    Timeout(Duration),

    #[error("bridge operation cancelled")]
    Cancelled,
}
