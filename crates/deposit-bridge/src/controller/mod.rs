//! Bridge progress controller.
//!
//! Drives one deposit from L1 submission to its L2 receipt. The submission
//! flow runs in the caller's task. Two periodic tasks run next to it for the
//! lifetime of the operation:
//!
//! - the status poller refreshes [`BridgeOperation::message_status`] while the
//!   operation is in progress and the L2 start block is known;
//! - the elapsed ticker advances [`BridgeOperation::elapsed_seconds`] while the
//!   operation is in progress, L1 is confirmed and L2 is not.
//!
//! State is published through a [`watch`] channel so a front end can render
//! every change.

use std::{sync::Arc, time::Duration};

use alloy_primitives::{B256, U256};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::{
    config::Config,
    error::{BridgeError, Result},
    messenger::{CrossChainMessenger, FIRST_MESSAGE, MessageReceipt},
    status::{MessageStatus, TxStatus},
};

mod tasks;

use tasks::OperationTasks;

/// State of the current (or last) bridge operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeOperation {
    pub l1_tx_hash: Option<B256>,
    pub l1_status: Option<TxStatus>,
    /// L2 block from which the deposit is searched for. Set once L1 confirms.
    pub l2_start_block: Option<u64>,
    /// Set once L1 confirms.
    pub estimated_wait_seconds: Option<u64>,
    pub elapsed_seconds: u64,
    pub message_status: Option<MessageStatus>,
    pub l2_tx_hash: Option<B256>,
    pub l2_status: Option<TxStatus>,
    pub in_progress: bool,
    /// Why the last operation was aborted.
    pub last_error: Option<String>,
}

/// Where an operation is in its lifecycle, derived from [`BridgeOperation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    L1Submitted,
    L1Confirmed,
    L2Polling,
    L2Confirmed,
    Aborted,
}

impl BridgeOperation {
    pub fn phase(&self) -> Phase {
        if self.l2_status.is_some_and(|s| s.is_confirmed()) {
            return Phase::L2Confirmed;
        }
        if !self.in_progress {
            return if self.last_error.is_some() {
                Phase::Aborted
            } else {
                Phase::Idle
            };
        }
        match (self.l1_status, self.l2_start_block) {
            (Some(TxStatus::Confirmed), Some(_)) => Phase::L2Polling,
            (Some(TxStatus::Confirmed), None) => Phase::L1Confirmed,
            (Some(TxStatus::Pending), _) => Phase::L1Submitted,
            (None, _) => Phase::Idle,
        }
    }

    /// The status poller runs while this returns `Some`.
    pub(crate) fn polling_target(&self) -> Option<(B256, u64)> {
        if !self.in_progress {
            return None;
        }
        self.l1_tx_hash.zip(self.l2_start_block)
    }

    /// The elapsed ticker runs while this holds.
    pub(crate) fn is_ticking(&self) -> bool {
        self.in_progress
            && self.l1_status == Some(TxStatus::Confirmed)
            && self.l2_status != Some(TxStatus::Confirmed)
    }
}

/// How the controller behaves, independent of the chains it talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSettings {
    pub amount: U256,
    pub status_poll_interval: Duration,
    pub max_receipt_wait: Option<Duration>,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            amount: U256::from(1),
            status_poll_interval: Duration::from_secs(1),
            max_receipt_wait: None,
        }
    }
}

impl ControllerSettings {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            amount: config.amount()?,
            status_poll_interval: config.timing.status_poll_interval(),
            max_receipt_wait: config.timing.max_receipt_wait(),
        })
    }
}

/// Result of a completed bridge operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeOutcome {
    pub l1_tx_hash: B256,
    pub l2_tx_hash: B256,
    pub message_status: MessageStatus,
}

pub struct BridgeController<M> {
    messenger: Arc<M>,
    settings: ControllerSettings,
    state: Arc<watch::Sender<BridgeOperation>>,
    /// Cancelled when the controller is torn down.
    shutdown: CancellationToken,
    /// Token of the running operation.
    current: Mutex<Option<CancellationToken>>,
}

impl<M: CrossChainMessenger> BridgeController<M> {
    pub fn new(messenger: Arc<M>, settings: ControllerSettings) -> Self {
        let (state, _) = watch::channel(BridgeOperation::default());
        Self {
            messenger,
            settings,
            state: Arc::new(state),
            shutdown: CancellationToken::new(),
            current: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn snapshot(&self) -> BridgeOperation {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<BridgeOperation> {
        self.state.subscribe()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Run one bridge operation to completion.
    ///
    /// Fails with [`BridgeError::AlreadyInProgress`] if another operation is
    /// running. Any failure after that aborts the operation: `in_progress` is
    /// cleared, the error is recorded in [`BridgeOperation::last_error`], and
    /// fields recorded so far stay as they are. Dropping the returned future
    /// aborts the operation the same way [`Self::cancel`] does.
    pub async fn start(&self) -> Result<BridgeOutcome> {
        let mut refused = None;
        self.state.send_if_modified(|op| {
            if self.shutdown.is_cancelled() {
                refused = Some(BridgeError::Cancelled);
                return false;
            }
            if op.in_progress {
                refused = Some(BridgeError::AlreadyInProgress);
                return false;
            }
            *op = BridgeOperation {
                in_progress: true,
                ..Default::default()
            };
            true
        });
        if let Some(err) = refused {
            return Err(err);
        }

        let token = self.shutdown.child_token();
        *self.current.lock() = Some(token.clone());
        let guard = ClaimGuard {
            state: &self.state,
            current: &self.current,
            shutdown: &self.shutdown,
            armed: true,
        };

        let tasks = OperationTasks::spawn(
            self.messenger.clone(),
            self.state.clone(),
            token.clone(),
            self.settings.status_poll_interval,
        );

        let result = tokio::select! {
            biased;
            _ = token.cancelled() => Err(BridgeError::Cancelled),
            result = self.run_operation() => result,
        };

        // Stop both tasks before the final write so neither can touch the
        // next operation.
        tasks.shutdown().await;
        guard.release();

        match result {
            Ok((l1_tx_hash, receipt)) => {
                self.update(|op| {
                    op.l2_tx_hash = Some(receipt.transaction_hash);
                    op.l2_status = Some(TxStatus::Confirmed);
                    op.message_status = Some(receipt.status);
                    op.in_progress = false;
                });
                tracing::info!(
                    %l1_tx_hash,
                    l2_tx_hash = %receipt.transaction_hash,
                    status = %receipt.status,
                    "bridge operation complete"
                );
                Ok(BridgeOutcome {
                    l1_tx_hash,
                    l2_tx_hash: receipt.transaction_hash,
                    message_status: receipt.status,
                })
            }
            Err(err) => {
                tracing::error!(error = %err, "bridge operation aborted");
                self.update(|op| {
                    op.in_progress = false;
                    op.last_error = Some(err.to_string());
                });
                Err(err)
            }
        }
    }

    async fn run_operation(&self) -> Result<(B256, MessageReceipt)> {
        let deposit = self.messenger.deposit_eth(self.settings.amount).await?;
        let l1_tx_hash = deposit.hash();
        self.update(|op| {
            op.l1_tx_hash = Some(l1_tx_hash);
            op.l1_status = Some(TxStatus::Pending);
        });

        deposit.wait().await?;
        self.update(|op| op.l1_status = Some(TxStatus::Confirmed));

        let l2_start_block = self.messenger.l2_block_number().await?;
        let estimated_wait_seconds = self
            .messenger
            .estimate_message_wait_time_seconds(l1_tx_hash, FIRST_MESSAGE, l2_start_block)
            .await?;
        self.update(|op| {
            op.estimated_wait_seconds = Some(estimated_wait_seconds);
            op.l2_start_block = Some(l2_start_block);
        });

        tracing::info!(
            %l1_tx_hash,
            l2_start_block,
            estimated_wait_seconds,
            "waiting for the deposit on L2"
        );

        let wait = self
            .messenger
            .wait_for_message_receipt(l1_tx_hash, FIRST_MESSAGE, l2_start_block);
        let receipt = match self.settings.max_receipt_wait {
            Some(limit) => tokio::time::timeout(limit, wait)
                .await
                .map_err(|_| BridgeError::Timeout(limit))??,
            None => wait.await?,
        };

        Ok((l1_tx_hash, receipt))
    }

    /// Abort the running operation, if any.
    pub fn cancel(&self) {
        if let Some(token) = self.current.lock().as_ref() {
            tracing::info!("cancelling bridge operation");
            token.cancel();
        }
    }

    /// Tear down the controller. Stops the running operation and both periodic
    /// tasks; the state is not modified afterwards.
    pub fn shutdown(&self) {
        // Cancel under the state lock so no write is half way through.
        self.state.send_if_modified(|_| {
            self.shutdown.cancel();
            false
        });
    }

    fn update(&self, f: impl FnOnce(&mut BridgeOperation)) {
        self.state.send_if_modified(|op| {
            if self.shutdown.is_cancelled() {
                return false;
            }
            f(op);
            true
        });
    }
}

/// Holds the claim of a running operation.
///
/// If [`BridgeController::start`] is dropped before it finishes, the claim is
/// given up as if the operation had been cancelled.
struct ClaimGuard<'a> {
    state: &'a watch::Sender<BridgeOperation>,
    current: &'a Mutex<Option<CancellationToken>>,
    shutdown: &'a CancellationToken,
    armed: bool,
}

impl ClaimGuard<'_> {
    /// Forget the operation token; the caller records the outcome.
    fn release(mut self) {
        self.armed = false;
        self.current.lock().take();
    }
}

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Some(token) = self.current.lock().take() {
            token.cancel();
        }
        self.state.send_if_modified(|op| {
            if self.shutdown.is_cancelled() {
                return false;
            }
            tracing::warn!("bridge operation dropped before completion");
            op.in_progress = false;
            op.last_error = Some(BridgeError::Cancelled.to_string());
            true
        });
    }
}

impl<M> Drop for BridgeController<M> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
