//! Scripted messenger for driving the controller through a bridge operation.

#![allow(dead_code, unreachable_pub)]

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use alloy_primitives::{B256, U256};
use async_trait::async_trait;
use deposit_bridge::{
    BridgeError, Result,
    messenger::{CrossChainMessenger, DepositHandle, MessageReceipt},
    status::MessageStatus,
};
use parking_lot::Mutex;
use tokio::sync::{oneshot, watch};

pub const L1_TX_HASH: B256 = B256::repeat_byte(0xAA);
pub const L2_TX_HASH: B256 = B256::repeat_byte(0xBB);
pub const L2_START_BLOCK: u64 = 12345;
pub const ESTIMATED_WAIT: u64 = 120;

/// Test-side ends of one operation's pending results.
pub struct Triggers {
    pub confirm_l1: oneshot::Sender<Result<()>>,
    pub deliver_receipt: oneshot::Sender<Result<MessageReceipt>>,
}

pub fn relayed_receipt() -> MessageReceipt {
    MessageReceipt {
        transaction_hash: L2_TX_HASH,
        block_number: Some(L2_START_BLOCK + 3),
        status: MessageStatus::Relayed,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusQuery {
    pub l1_tx_hash: B256,
    pub message_index: usize,
    pub l2_block_number: u64,
}

pub struct MockMessenger {
    reject_deposit: AtomicBool,
    deposits: Mutex<Vec<U256>>,
    status: Mutex<std::result::Result<MessageStatus, String>>,
    status_queries: Mutex<Vec<StatusQuery>>,
    l1_confirmation: Mutex<Option<oneshot::Receiver<Result<()>>>>,
    receipt: Mutex<Option<oneshot::Receiver<Result<MessageReceipt>>>>,
}

impl MockMessenger {
    pub fn new() -> (Arc<Self>, Triggers) {
        let messenger = Arc::new(Self {
            reject_deposit: AtomicBool::new(false),
            deposits: Mutex::new(Vec::new()),
            status: Mutex::new(Ok(MessageStatus::UnconfirmedL1ToL2Message)),
            status_queries: Mutex::new(Vec::new()),
            l1_confirmation: Mutex::new(None),
            receipt: Mutex::new(None),
        });
        let triggers = messenger.arm();
        (messenger, triggers)
    }

    /// Prepare the pending results of the next operation.
    pub fn arm(&self) -> Triggers {
        let (confirm_l1, l1_rx) = oneshot::channel();
        let (deliver_receipt, receipt_rx) = oneshot::channel();
        *self.l1_confirmation.lock() = Some(l1_rx);
        *self.receipt.lock() = Some(receipt_rx);
        Triggers {
            confirm_l1,
            deliver_receipt,
        }
    }

    pub fn reject_deposits(&self) {
        self.reject_deposit.store(true, Ordering::SeqCst);
    }

    pub fn set_status(&self, status: std::result::Result<MessageStatus, String>) {
        *self.status.lock() = status;
    }

    pub fn deposits(&self) -> Vec<U256> {
        self.deposits.lock().clone()
    }

    pub fn status_queries(&self) -> Vec<StatusQuery> {
        self.status_queries.lock().clone()
    }

    pub fn status_query_count(&self) -> usize {
        self.status_queries.lock().len()
    }
}

#[async_trait]
impl CrossChainMessenger for MockMessenger {
    async fn deposit_eth(&self, amount: U256) -> Result<DepositHandle> {
        if self.reject_deposit.load(Ordering::SeqCst) {
            return Err(BridgeError::Submission("user rejected the request".into()));
        }
        self.deposits.lock().push(amount);

        let confirmation = self
            .l1_confirmation
            .lock()
            .take()
            .ok_or_else(|| BridgeError::Submission("no deposit armed".into()))?;
        Ok(DepositHandle::new(L1_TX_HASH, async move {
            confirmation
                .await
                .map_err(|_| BridgeError::Rpc("l1 confirmation dropped".into()))?
        }))
    }

    async fn l2_block_number(&self) -> Result<u64> {
        Ok(L2_START_BLOCK)
    }

    async fn estimate_message_wait_time_seconds(
        &self,
        _l1_tx_hash: B256,
        _message_index: usize,
        _l2_block_number: u64,
    ) -> Result<u64> {
        Ok(ESTIMATED_WAIT)
    }

    async fn get_message_status(
        &self,
        l1_tx_hash: B256,
        message_index: usize,
        l2_block_number: u64,
    ) -> Result<MessageStatus> {
        self.status_queries.lock().push(StatusQuery {
            l1_tx_hash,
            message_index,
            l2_block_number,
        });
        self.status.lock().clone().map_err(BridgeError::Rpc)
    }

    async fn wait_for_message_receipt(
        &self,
        _l1_tx_hash: B256,
        _message_index: usize,
        _from_block: u64,
    ) -> Result<MessageReceipt> {
        let receipt = self
            .receipt
            .lock()
            .take()
            .ok_or_else(|| BridgeError::ReceiptWait("no receipt armed".into()))?;
        receipt
            .await
            .map_err(|_| BridgeError::ReceiptWait("receipt dropped".into()))?
    }
}

/// Wait for a state matching `f` and return a copy of it.
pub async fn wait_for<T: Clone>(
    rx: &mut watch::Receiver<T>,
    f: impl FnMut(&T) -> bool,
) -> T {
    rx.wait_for(f)
        .await
        .expect("controller state channel closed")
        .clone()
}
