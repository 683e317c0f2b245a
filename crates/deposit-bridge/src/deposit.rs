//! OP-stack deposit transactions.
//!
//! Every ETH deposit made through the `OptimismPortal` emits a
//! `TransactionDeposited` event on L1. The L2 derives a deposit transaction
//! (type `0x7E`) from that event, and its hash is what we look up on L2 to
//! learn whether the deposit landed.

use alloy::{sol, sol_types::SolEvent};
use alloy_primitives::{Address, B256, Bytes, U256, keccak256};
use alloy_rlp::{EMPTY_STRING_CODE, Encodable, Header};

sol! {
    #[sol(rpc)]
    interface OptimismPortal {
        #[derive(Debug)]
        event TransactionDeposited(
            address indexed from,
            address indexed to,
            uint256 indexed version,
            bytes opaqueData
        );

        function depositTransaction(
            address _to,
            uint256 _value,
            uint64 _gasLimit,
            bool _isCreation,
            bytes _data
        ) external payable;
    }
}

/// EIP-2718 type byte of OP-stack deposit transactions.
pub const DEPOSIT_TX_TYPE: u8 = 0x7E;

/// topic0 of `TransactionDeposited`.
pub const TRANSACTION_DEPOSITED_TOPIC: B256 =
    OptimismPortal::TransactionDeposited::SIGNATURE_HASH;

/// Source hash domain of user deposits.
const USER_DEPOSIT_DOMAIN: u8 = 0;

/// mint (32) + value (32) + gas limit (8) + is creation (1).
const OPAQUE_HEADER_LEN: usize = 73;

#[derive(Debug, thiserror::Error)]
pub enum DepositError {
    #[error("unsupported deposit version: {0}")]
    UnsupportedVersion(U256),
    #[error("invalid opaque data length: expected at least {OPAQUE_HEADER_LEN} bytes, got {0}")]
    InvalidOpaqueDataLength(usize),
    #[error("failed to decode TransactionDeposited log: {0}")]
    Decode(#[from] alloy::sol_types::Error),
}

/// An L1 to L2 deposit as the L2 sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositedTransaction {
    pub source_hash: B256,
    pub from: Address,
    /// `None` for contract creations.
    pub to: Option<Address>,
    pub mint: U256,
    pub value: U256,
    pub gas_limit: u64,
    pub is_system_tx: bool,
    pub data: Bytes,
}

impl DepositedTransaction {
    /// Decode a deposit from the topics and data of a `TransactionDeposited`
    /// log emitted at `log_index` in block `l1_block_hash`.
    pub fn from_log(
        topics: &[B256],
        data: &[u8],
        l1_block_hash: B256,
        log_index: u64,
    ) -> Result<Self, DepositError> {
        let event =
            OptimismPortal::TransactionDeposited::decode_raw_log(topics.iter().copied(), data)?;
        if !event.version.is_zero() {
            return Err(DepositError::UnsupportedVersion(event.version));
        }

        let opaque = event.opaqueData.as_ref();
        if opaque.len() < OPAQUE_HEADER_LEN {
            return Err(DepositError::InvalidOpaqueDataLength(opaque.len()));
        }

        let gas_limit = opaque[64..72]
            .try_into()
            .map(u64::from_be_bytes)
            .map_err(|_| DepositError::InvalidOpaqueDataLength(opaque.len()))?;
        let is_creation = opaque[72] != 0;

        Ok(Self {
            source_hash: user_deposit_source_hash(l1_block_hash, log_index),
            from: event.from,
            to: (!is_creation).then_some(event.to),
            mint: U256::from_be_slice(&opaque[0..32]),
            value: U256::from_be_slice(&opaque[32..64]),
            gas_limit,
            is_system_tx: false,
            data: Bytes::copy_from_slice(&opaque[OPAQUE_HEADER_LEN..]),
        })
    }

    /// Writes `0x7E || rlp([source_hash, from, to, mint, value, gas, is_system_tx, data])`.
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.push(DEPOSIT_TX_TYPE);
        Header {
            list: true,
            payload_length: self.fields_len(),
        }
        .encode(out);
        self.source_hash.encode(out);
        self.from.encode(out);
        match &self.to {
            Some(to) => to.encode(out),
            None => out.push(EMPTY_STRING_CODE),
        }
        self.mint.encode(out);
        self.value.encode(out);
        self.gas_limit.encode(out);
        self.is_system_tx.encode(out);
        self.data.encode(out);
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut buf = Vec::with_capacity(128 + self.data.len());
        self.encode(&mut buf);
        Bytes::from(buf)
    }

    /// Hash of the deposit transaction on L2.
    pub fn tx_hash(&self) -> B256 {
        let mut buf = Vec::with_capacity(128 + self.data.len());
        self.encode(&mut buf);
        keccak256(&buf)
    }

    fn fields_len(&self) -> usize {
        self.source_hash.length()
            + self.from.length()
            + self.to.as_ref().map_or(1, |to| to.length())
            + self.mint.length()
            + self.value.length()
            + self.gas_limit.length()
            + self.is_system_tx.length()
            + self.data.length()
    }
}

/// `keccak256(bytes32(0) || keccak256(l1_block_hash || bytes32(log_index)))`
pub fn user_deposit_source_hash(l1_block_hash: B256, log_index: u64) -> B256 {
    let mut deposit_id = [0u8; 64];
    deposit_id[..32].copy_from_slice(l1_block_hash.as_slice());
    deposit_id[56..].copy_from_slice(&log_index.to_be_bytes());

    let mut domained = [0u8; 64];
    domained[31] = USER_DEPOSIT_DOMAIN;
    domained[32..].copy_from_slice(keccak256(deposit_id).as_slice());
    keccak256(domained)
}
