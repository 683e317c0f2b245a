//! Cross-chain messenger: the operations the bridge controller needs from the
//! two chains.

use std::{fmt, future::Future};

use alloy_primitives::{B256, U256};
use async_trait::async_trait;
use futures::{FutureExt, future::BoxFuture};

use crate::{error::Result, status::MessageStatus};

mod op;

pub use op::OpMessenger;

/// Index of the deposit message within its L1 transaction. A plain ETH deposit
/// emits exactly one.
pub const FIRST_MESSAGE: usize = 0;

#[async_trait]
pub trait CrossChainMessenger: Send + Sync + 'static {
    /// Submit a deposit of `amount` wei on L1.
    async fn deposit_eth(&self, amount: U256) -> Result<DepositHandle>;

    /// Current L2 block height.
    async fn l2_block_number(&self) -> Result<u64>;

    /// Seconds until the message is expected to be observable on L2.
    async fn estimate_message_wait_time_seconds(
        &self,
        l1_tx_hash: B256,
        message_index: usize,
        l2_block_number: u64,
    ) -> Result<u64>;

    async fn get_message_status(
        &self,
        l1_tx_hash: B256,
        message_index: usize,
        l2_block_number: u64,
    ) -> Result<MessageStatus>;

    /// Resolves once the message has a receipt on L2, searching from `from_block`.
    async fn wait_for_message_receipt(
        &self,
        l1_tx_hash: B256,
        message_index: usize,
        from_block: u64,
    ) -> Result<MessageReceipt>;
}

/// A submitted L1 deposit.
pub struct DepositHandle {
    hash: B256,
    confirmation: BoxFuture<'static, Result<()>>,
}

impl DepositHandle {
    pub fn new<F>(hash: B256, confirmation: F) -> Self
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            hash,
            confirmation: confirmation.boxed(),
        }
    }

    pub fn hash(&self) -> B256 {
        self.hash
    }

    /// Wait until the deposit is mined on L1.
    pub async fn wait(self) -> Result<()> {
        self.confirmation.await
    }
}

impl fmt::Debug for DepositHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DepositHandle")
            .field("hash", &self.hash)
            .finish_non_exhaustive()
    }
}

/// The L2 side of a delivered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageReceipt {
    pub transaction_hash: B256,
    pub block_number: Option<u64>,
    /// [`MessageStatus::Relayed`] or [`MessageStatus::FailedL1ToL2Message`].
    pub status: MessageStatus,
}
