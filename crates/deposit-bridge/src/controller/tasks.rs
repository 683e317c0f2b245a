//! The two periodic tasks of a bridge operation.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::watch,
    task::JoinSet,
    time::{Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use super::BridgeOperation;
use crate::messenger::{CrossChainMessenger, FIRST_MESSAGE};

const ELAPSED_TICK: Duration = Duration::from_secs(1);

/// Disposal handle for the periodic tasks of one operation.
pub(super) struct OperationTasks {
    token: CancellationToken,
    tasks: JoinSet<()>,
}

impl OperationTasks {
    pub(super) fn spawn<M: CrossChainMessenger>(
        messenger: Arc<M>,
        state: Arc<watch::Sender<BridgeOperation>>,
        token: CancellationToken,
        status_poll_interval: Duration,
    ) -> Self {
        let mut tasks = JoinSet::new();
        tasks.spawn(run_status_poller(
            messenger,
            state.clone(),
            token.clone(),
            status_poll_interval,
        ));
        tasks.spawn(run_elapsed_ticker(state, token.clone()));
        Self { token, tasks }
    }

    /// Cancel both tasks and wait for them to exit.
    pub(super) async fn shutdown(mut self) {
        self.token.cancel();
        while let Some(result) = self.tasks.join_next().await {
            if let Err(err) = result
                && err.is_panic()
            {
                tracing::error!(error = %err, "bridge task panicked");
            }
        }
    }
}

impl Drop for OperationTasks {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Waits until `ready` holds. Returns `false` if the operation ends or the
/// token is cancelled first.
async fn wait_until(
    changes: &mut watch::Receiver<BridgeOperation>,
    token: &CancellationToken,
    ready: impl Fn(&BridgeOperation) -> bool,
) -> bool {
    loop {
        {
            let op = changes.borrow_and_update();
            if !op.in_progress {
                return false;
            }
            if ready(&op) {
                return true;
            }
        }

        tokio::select! {
            _ = token.cancelled() => return false,
            changed = changes.changed() => {
                if changed.is_err() {
                    return false;
                }
            }
        }
    }
}

/// Refreshes the message status immediately and then every `period` while
/// the operation has a polling target.
async fn run_status_poller<M: CrossChainMessenger>(
    messenger: Arc<M>,
    state: Arc<watch::Sender<BridgeOperation>>,
    token: CancellationToken,
    period: Duration,
) {
    let mut changes = state.subscribe();
    if !wait_until(&mut changes, &token, |op| op.polling_target().is_some()).await {
        return;
    }

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => return,
            changed = changes.changed() => {
                if changed.is_err() || changes.borrow_and_update().polling_target().is_none() {
                    return;
                }
                continue;
            }
            _ = interval.tick() => {}
        }

        let Some((l1_tx_hash, l2_start_block)) = state.borrow().polling_target() else {
            return;
        };

        let result = tokio::select! {
            biased;
            _ = token.cancelled() => return,
            result = messenger.get_message_status(l1_tx_hash, FIRST_MESSAGE, l2_start_block) => result,
        };

        match result {
            Ok(status) => {
                state.send_if_modified(|op| {
                    if token.is_cancelled() || op.polling_target().is_none() {
                        return false;
                    }
                    let changed = op.message_status != Some(status);
                    op.message_status = Some(status);
                    changed
                });
                tracing::debug!(%l1_tx_hash, %status, "message status");
            }
            Err(err) => {
                tracing::warn!(%l1_tx_hash, error = %err, "failed to fetch message status");
            }
        }
    }
}

/// Advances the elapsed counter once per second while the operation waits
/// for L2.
async fn run_elapsed_ticker(state: Arc<watch::Sender<BridgeOperation>>, token: CancellationToken) {
    let mut changes = state.subscribe();

    loop {
        if !wait_until(&mut changes, &token, BridgeOperation::is_ticking).await {
            return;
        }

        let mut interval = tokio::time::interval_at(Instant::now() + ELAPSED_TICK, ELAPSED_TICK);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => return,
                changed = changes.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    if !changes.borrow_and_update().is_ticking() {
                        break;
                    }
                }
                _ = interval.tick() => {
                    state.send_if_modified(|op| {
                        if token.is_cancelled() || !op.is_ticking() {
                            return false;
                        }
                        op.elapsed_seconds += 1;
                        true
                    });
                }
            }
        }
    }
}
