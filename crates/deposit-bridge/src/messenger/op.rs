//! [`CrossChainMessenger`] for OP-stack chains, backed by JSON-RPC.
//!
//! Deposits go through `OptimismPortal.depositTransaction` on L1. A deposit
//! message is found on L2 by deriving the hash of its `0x7E` deposit
//! transaction from the `TransactionDeposited` log and asking the L2 for that
//! receipt.

use std::time::Duration;

use alloy::{
    network::{AnyNetwork, EthereumWallet, ReceiptResponse},
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use alloy_primitives::{Address, B256, Bytes, U256};
use async_trait::async_trait;
use parking_lot::Mutex;

use super::{CrossChainMessenger, DepositHandle, MessageReceipt};
use crate::{
    config::Config,
    deposit::{DepositedTransaction, OptimismPortal, TRANSACTION_DEPOSITED_TOPIC},
    error::{BridgeError, Result},
    status::MessageStatus,
};

/// An L1 deposit message resolved to its L2 transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DepositMessage {
    l1_block_number: u64,
    l2_tx_hash: B256,
}

pub struct OpMessenger {
    l1: DynProvider,
    /// L2 receipts of deposit transactions carry a type the plain Ethereum
    /// network cannot decode.
    l2: DynProvider<AnyNetwork>,
    l1_chain_id: u64,
    l2_chain_id: u64,
    portal: Address,
    /// Deposit recipient on L2, the signer's own address.
    sender: Option<Address>,
    deposit_gas_limit: u64,
    confirmation_blocks: u64,
    l1_block_time_secs: u64,
    receipt_poll_interval: Duration,
    /// Last resolved message. One operation runs at a time, so one slot is
    /// enough.
    message: Mutex<Option<((B256, usize), DepositMessage)>>,
}

impl OpMessenger {
    /// Build the messenger. Without a signer it can only read message state.
    pub fn new(config: &Config, signer: Option<PrivateKeySigner>) -> Result<Self> {
        let l1_url = parse_url("l1", &config.l1.rpc_url)?;
        let l2_url = parse_url("l2", &config.l2.rpc_url)?;

        let sender = signer.as_ref().map(PrivateKeySigner::address);
        let l1 = match signer {
            Some(signer) => ProviderBuilder::new()
                .wallet(EthereumWallet::from(signer))
                .connect_http(l1_url)
                .erased(),
            None => ProviderBuilder::new().connect_http(l1_url).erased(),
        };
        let l2 = ProviderBuilder::new()
            .network::<AnyNetwork>()
            .connect_http(l2_url)
            .erased();

        Self::with_providers(config, l1, l2, sender)
    }

    /// Build the messenger on top of existing providers. `sender` is the
    /// account the L1 provider signs for.
    pub fn with_providers(
        config: &Config,
        l1: DynProvider,
        l2: DynProvider<AnyNetwork>,
        sender: Option<Address>,
    ) -> Result<Self> {
        Ok(Self {
            l1,
            l2,
            l1_chain_id: config.l1.chain_id,
            l2_chain_id: config.l2.chain_id,
            portal: config.portal_address()?,
            sender,
            deposit_gas_limit: config.deposit_gas_limit,
            confirmation_blocks: config.timing.confirmation_blocks,
            l1_block_time_secs: config.timing.l1_block_time_secs,
            receipt_poll_interval: config.timing.receipt_poll_interval(),
            message: Mutex::new(None),
        })
    }

    /// Check that both RPC endpoints serve the configured chains.
    pub async fn verify_chains(&self) -> Result<()> {
        let l1_chain_id = self
            .l1
            .get_chain_id()
            .await
            .map_err(|e| BridgeError::Rpc(format!("l1 chain id: {e}")))?;
        let l2_chain_id = self
            .l2
            .get_chain_id()
            .await
            .map_err(|e| BridgeError::Rpc(format!("l2 chain id: {e}")))?;

        for (side, actual, expected) in [
            ("l1", l1_chain_id, self.l1_chain_id),
            ("l2", l2_chain_id, self.l2_chain_id),
        ] {
            if actual != expected {
                return Err(BridgeError::Config(format!(
                    "{side} rpc serves chain {actual}, expected {expected}"
                )));
            }
        }

        tracing::debug!(l1_chain_id, l2_chain_id, "rpc endpoints match configured chains");
        Ok(())
    }

    /// Resolve the `message_index`-th deposit of an L1 transaction.
    async fn deposit_message(&self, l1_tx_hash: B256, message_index: usize) -> Result<DepositMessage> {
        let key = (l1_tx_hash, message_index);
        let cached = *self.message.lock();
        if let Some((cached_key, message)) = cached
            && cached_key == key
        {
            return Ok(message);
        }

        let not_found = || BridgeError::MessageNotFound {
            tx_hash: l1_tx_hash,
            message_index,
        };

        let receipt = self
            .l1
            .get_transaction_receipt(l1_tx_hash)
            .await
            .map_err(|e| BridgeError::Rpc(e.to_string()))?
            .ok_or_else(not_found)?;
        let (Some(block_hash), Some(l1_block_number)) = (receipt.block_hash, receipt.block_number)
        else {
            return Err(not_found());
        };

        let log = receipt
            .inner
            .logs()
            .iter()
            .filter(|log| {
                log.address() == self.portal && log.topic0() == Some(&TRANSACTION_DEPOSITED_TOPIC)
            })
            .nth(message_index)
            .ok_or_else(not_found)?;
        let log_index = log
            .log_index
            .ok_or_else(|| BridgeError::Rpc("deposit log is missing its index".into()))?;

        let deposit =
            DepositedTransaction::from_log(log.topics(), &log.data().data, block_hash, log_index)?;
        let message = DepositMessage {
            l1_block_number,
            l2_tx_hash: deposit.tx_hash(),
        };

        tracing::debug!(
            %l1_tx_hash,
            message_index,
            l2_tx_hash = %message.l2_tx_hash,
            "resolved deposit message"
        );

        *self.message.lock() = Some((key, message));
        Ok(message)
    }

    /// L2 receipt of the deposit, if the L2 has reached `from_block` and
    /// executed it.
    async fn l2_receipt(
        &self,
        message: DepositMessage,
        from_block: u64,
    ) -> Result<Option<MessageReceipt>> {
        let head = self
            .l2
            .get_block_number()
            .await
            .map_err(|e| BridgeError::Rpc(e.to_string()))?;
        if head < from_block {
            return Ok(None);
        }

        let receipt = self
            .l2
            .get_transaction_receipt(message.l2_tx_hash)
            .await
            .map_err(|e| BridgeError::Rpc(e.to_string()))?;

        Ok(receipt.map(|receipt| MessageReceipt {
            transaction_hash: receipt.transaction_hash(),
            block_number: receipt.block_number(),
            status: if receipt.status() {
                MessageStatus::Relayed
            } else {
                MessageStatus::FailedL1ToL2Message
            },
        }))
    }
}

#[async_trait]
impl CrossChainMessenger for OpMessenger {
    async fn deposit_eth(&self, amount: U256) -> Result<DepositHandle> {
        let sender = self.sender.ok_or(BridgeError::NotConnected)?;
        let portal = OptimismPortal::new(self.portal, &self.l1);

        tracing::info!(
            portal = %self.portal,
            from = %sender,
            %amount,
            "submitting deposit"
        );

        let pending = portal
            .depositTransaction(sender, amount, self.deposit_gas_limit, false, Bytes::new())
            .value(amount)
            .send()
            .await
            .map_err(|e| BridgeError::Submission(e.to_string()))?;

        let tx_hash = *pending.tx_hash();
        tracing::info!(%tx_hash, "deposit submitted, waiting for confirmation");

        let confirmation = async move {
            let receipt = pending
                .get_receipt()
                .await
                .map_err(|e| BridgeError::Submission(e.to_string()))?;

            if !receipt.status() {
                return Err(BridgeError::Reverted(tx_hash));
            }

            tracing::info!(
                %tx_hash,
                block = ?receipt.block_number,
                "deposit confirmed on L1"
            );
            Ok(())
        };

        Ok(DepositHandle::new(tx_hash, confirmation))
    }

    async fn l2_block_number(&self) -> Result<u64> {
        self.l2
            .get_block_number()
            .await
            .map_err(|e| BridgeError::Rpc(e.to_string()))
    }

    async fn estimate_message_wait_time_seconds(
        &self,
        l1_tx_hash: B256,
        message_index: usize,
        l2_block_number: u64,
    ) -> Result<u64> {
        let message = self.deposit_message(l1_tx_hash, message_index).await?;
        if self.l2_receipt(message, l2_block_number).await?.is_some() {
            return Ok(0);
        }

        let l1_head = self
            .l1
            .get_block_number()
            .await
            .map_err(|e| BridgeError::Rpc(e.to_string()))?;

        Ok(estimate_wait_seconds(
            l1_head,
            message.l1_block_number,
            self.confirmation_blocks,
            self.l1_block_time_secs,
        ))
    }

    async fn get_message_status(
        &self,
        l1_tx_hash: B256,
        message_index: usize,
        l2_block_number: u64,
    ) -> Result<MessageStatus> {
        let message = self.deposit_message(l1_tx_hash, message_index).await?;
        let receipt = self.l2_receipt(message, l2_block_number).await?;
        Ok(receipt.map_or(MessageStatus::UnconfirmedL1ToL2Message, |r| r.status))
    }

    async fn wait_for_message_receipt(
        &self,
        l1_tx_hash: B256,
        message_index: usize,
        from_block: u64,
    ) -> Result<MessageReceipt> {
        let message = self
            .deposit_message(l1_tx_hash, message_index)
            .await
            .map_err(|e| BridgeError::ReceiptWait(e.to_string()))?;

        tracing::info!(
            %l1_tx_hash,
            l2_tx_hash = %message.l2_tx_hash,
            from_block,
            "waiting for deposit on L2"
        );

        let mut interval = tokio::time::interval(self.receipt_poll_interval);
        loop {
            interval.tick().await;

            match self.l2_receipt(message, from_block).await {
                Ok(Some(receipt)) => {
                    tracing::info!(
                        l2_tx_hash = %receipt.transaction_hash,
                        block = ?receipt.block_number,
                        status = %receipt.status,
                        "deposit observed on L2"
                    );
                    return Ok(receipt);
                }
                Ok(None) => {
                    tracing::trace!(l2_tx_hash = %message.l2_tx_hash, "deposit not on L2 yet");
                }
                Err(e) => {
                    tracing::warn!(
                        l2_tx_hash = %message.l2_tx_hash,
                        error = %e,
                        "failed to query L2 receipt, retrying"
                    );
                }
            }
        }
    }
}

fn parse_url(side: &str, url: &str) -> Result<Url> {
    url.parse()
        .map_err(|e| BridgeError::Config(format!("invalid {side} rpc url: {e}")))
}

/// Seconds of L1 confirmations the deposit still needs before the sequencer
/// picks it up.
fn estimate_wait_seconds(
    l1_head: u64,
    inclusion_block: u64,
    confirmation_blocks: u64,
    l1_block_time_secs: u64,
) -> u64 {
    let confirmations = l1_head.saturating_sub(inclusion_block);
    confirmation_blocks
        .saturating_sub(confirmations)
        .saturating_mul(l1_block_time_secs)
}
