//! Bridge configuration, loaded from a TOML file.
//!
//! ```toml
//! amount_wei = "1"
//! portal_address = "0x..."
//!
//! [l1]
//! name = "sepolia"
//! chain_id = 11155111
//! rpc_url = "https://..."
//! explorer_url = "https://sepolia.etherscan.io"
//!
//! [l2]
//! name = "op-sepolia"
//! chain_id = 11155420
//! rpc_url = "https://..."
//! explorer_url = "https://sepolia-optimism.etherscan.io"
//!
//! [signer]
//! key_file = "deposit.key"
//! ```

use std::{path::Path, str::FromStr, time::Duration};

use alloy_primitives::{Address, U256};
use serde::Deserialize;

use crate::error::{BridgeError, Result};

const DEFAULT_AMOUNT_WEI: &str = "1";
const DEFAULT_DEPOSIT_GAS_LIMIT: u64 = 100_000;
const DEFAULT_STATUS_POLL_INTERVAL_MS: u64 = 1_000;
const DEFAULT_RECEIPT_POLL_INTERVAL_MS: u64 = 2_000;
const DEFAULT_CONFIRMATION_BLOCKS: u64 = 2;
const DEFAULT_L1_BLOCK_TIME_SECS: u64 = 12;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub l1: ChainConfig,
    pub l2: ChainConfig,
    /// `OptimismPortal` proxy on L1.
    pub portal_address: String,
    /// Amount to bridge, decimal or `0x` hex.
    #[serde(default = "default_amount_wei")]
    pub amount_wei: String,
    /// Gas limit of the deposit transaction on L2.
    #[serde(default = "default_deposit_gas_limit")]
    pub deposit_gas_limit: u64,
    #[serde(default)]
    pub timing: TimingConfig,
    pub signer: Option<SignerConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    pub name: String,
    pub chain_id: u64,
    pub rpc_url: String,
    pub explorer_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// How often the message status is refreshed while waiting for L2.
    pub status_poll_interval_ms: u64,
    /// How often the L2 is asked for the deposit receipt.
    pub receipt_poll_interval_ms: u64,
    /// L1 blocks the sequencer waits for before including a deposit.
    pub confirmation_blocks: u64,
    pub l1_block_time_secs: u64,
    /// Give up waiting for the L2 receipt after this long. Unbounded if unset.
    pub max_receipt_wait_secs: Option<u64>,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            status_poll_interval_ms: DEFAULT_STATUS_POLL_INTERVAL_MS,
            receipt_poll_interval_ms: DEFAULT_RECEIPT_POLL_INTERVAL_MS,
            confirmation_blocks: DEFAULT_CONFIRMATION_BLOCKS,
            l1_block_time_secs: DEFAULT_L1_BLOCK_TIME_SECS,
            max_receipt_wait_secs: None,
        }
    }
}

impl TimingConfig {
    pub fn status_poll_interval(&self) -> Duration {
        Duration::from_millis(self.status_poll_interval_ms)
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }

    pub fn max_receipt_wait(&self) -> Option<Duration> {
        self.max_receipt_wait_secs.map(Duration::from_secs)
    }
}

/// Where the L1 signing key comes from. Exactly one of the two must be set.
#[derive(Debug, Clone, Deserialize)]
pub struct SignerConfig {
    /// Hex-encoded private key.
    pub private_key: Option<String>,
    /// File containing a hex-encoded private key.
    pub key_file: Option<String>,
}

fn default_amount_wei() -> String {
    DEFAULT_AMOUNT_WEI.to_string()
}

fn default_deposit_gas_limit() -> u64 {
    DEFAULT_DEPOSIT_GAS_LIMIT
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BridgeError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| BridgeError::Config(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        self.amount()?;
        self.portal_address()?;
        if self.l1.chain_id == self.l2.chain_id {
            return Err(BridgeError::Config(format!(
                "l1 and l2 share chain id {}",
                self.l1.chain_id
            )));
        }
        if self.timing.status_poll_interval_ms == 0 || self.timing.receipt_poll_interval_ms == 0 {
            return Err(BridgeError::Config("poll intervals must be non-zero".into()));
        }
        Ok(())
    }

    pub fn amount(&self) -> Result<U256> {
        U256::from_str(self.amount_wei.trim())
            .map_err(|e| BridgeError::Config(format!("invalid amount_wei: {e}")))
    }

    pub fn portal_address(&self) -> Result<Address> {
        self.portal_address
            .parse::<Address>()
            .map_err(|e| BridgeError::Config(format!("invalid portal address: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"
        portal_address = "0x49048044D57e1C92A77f79988d21Fa8fAF74E97e"

        [l1]
        name = "sepolia"
        chain_id = 11155111
        rpc_url = "http://localhost:8545"
        explorer_url = "https://sepolia.etherscan.io/"

        [l2]
        name = "op-sepolia"
        chain_id = 11155420
        rpc_url = "http://localhost:9545"
        explorer_url = "https://sepolia-optimism.etherscan.io"
    "#;

    #[test]
    fn test_defaults() {
        let config = Config::from_toml(MINIMAL).unwrap();

        assert_eq!(config.amount().unwrap(), U256::from(1));
        assert_eq!(config.deposit_gas_limit, 100_000);
        assert_eq!(config.timing.status_poll_interval(), Duration::from_secs(1));
        assert_eq!(config.timing.receipt_poll_interval(), Duration::from_secs(2));
        assert_eq!(config.timing.confirmation_blocks, 2);
        assert_eq!(config.timing.l1_block_time_secs, 12);
        assert_eq!(config.timing.max_receipt_wait(), None);
        assert!(config.signer.is_none());
        assert_eq!(config.l1.name, "sepolia");
        assert_eq!(config.l2.chain_id, 11155420);
    }

    #[test]
    fn test_overrides() {
        let content = format!(
            r#"
            amount_wei = "0x2386f26fc10000"
            deposit_gas_limit = 200000
            {MINIMAL}
            [timing]
            status_poll_interval_ms = 500
            max_receipt_wait_secs = 600

            [signer]
            key_file = "deposit.key"
            "#
        );
        let config = Config::from_toml(&content).unwrap();

        assert_eq!(config.amount().unwrap(), U256::from(10_000_000_000_000_000u64));
        assert_eq!(config.deposit_gas_limit, 200_000);
        assert_eq!(config.timing.status_poll_interval(), Duration::from_millis(500));
        assert_eq!(config.timing.receipt_poll_interval(), Duration::from_secs(2));
        assert_eq!(config.timing.max_receipt_wait(), Some(Duration::from_secs(600)));
        assert_eq!(
            config.signer.unwrap().key_file.as_deref(),
            Some("deposit.key")
        );
    }

    #[test]
    fn test_rejects_invalid_values() {
        let bad_amount = format!("amount_wei = \"one\"\n{MINIMAL}");
        assert!(matches!(
            Config::from_toml(&bad_amount),
            Err(BridgeError::Config(_))
        ));

        let bad_portal = MINIMAL.replace("0x49048044D57e1C92A77f79988d21Fa8fAF74E97e", "0x1234");
        assert!(matches!(
            Config::from_toml(&bad_portal),
            Err(BridgeError::Config(_))
        ));

        let same_chain = MINIMAL.replace("11155420", "11155111");
        assert!(matches!(
            Config::from_toml(&same_chain),
            Err(BridgeError::Config(_))
        ));

        let zero_poll = format!("{MINIMAL}\n[timing]\nstatus_poll_interval_ms = 0\n");
        assert!(matches!(
            Config::from_toml(&zero_poll),
            Err(BridgeError::Config(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.l2.name, "op-sepolia");

        let missing = Config::load(Path::new("/nonexistent/bridge.toml"));
        assert!(matches!(missing, Err(BridgeError::Config(_))));
    }
}
