//! Text rendering of bridge progress.

use crate::{
    controller::BridgeOperation,
    explorer::{ChainSide, ExplorerLinks},
    status::TxStatus,
};

pub const CONNECT_PROMPT: &str = "Connect to a wallet to get started";

/// One line per visible piece of the operation, in display order.
pub fn render_operation(op: &BridgeOperation, links: &ExplorerLinks) -> Vec<String> {
    let mut lines = Vec::new();

    match op.l1_tx_hash {
        None if op.in_progress => lines.push("Submitting deposit...".to_string()),
        None => lines.push("Ready to bridge".to_string()),
        Some(hash) => lines.push(tx_line(ChainSide::L1, op.l1_status, hash, links)),
    }

    if let Some(estimated) = op.estimated_wait_seconds.filter(|s| *s > 0) {
        lines.push(format!(
            "Waiting for L2. Estimated wait time: {estimated} seconds; Elapsed time: {} seconds",
            op.elapsed_seconds
        ));
    }

    if let Some(status) = op.message_status {
        lines.push(format!("L2 message status: {status}"));
    }

    if let Some(hash) = op.l2_tx_hash {
        lines.push(tx_line(ChainSide::L2, op.l2_status, hash, links));
    }

    if let Some(err) = &op.last_error {
        lines.push(format!("Bridge failed: {err}"));
    }

    lines
}

fn tx_line(
    side: ChainSide,
    status: Option<TxStatus>,
    hash: impl std::fmt::Display,
    links: &ExplorerLinks,
) -> String {
    let state = match status {
        Some(TxStatus::Confirmed) => "confirmed!",
        Some(TxStatus::Pending) | None => "pending...",
    };
    format!(
        "{} tx {state} view transaction: {}",
        side.label(),
        links.tx_url(side, hash)
    )
}
