//! The connected wallet: an optional local L1 signer.

use alloy::signers::local::PrivateKeySigner;
use alloy_primitives::Address;

use crate::{
    config::SignerConfig,
    error::{BridgeError, Result},
};

#[derive(Debug, Clone, Default)]
pub struct Wallet {
    signer: Option<PrivateKeySigner>,
}

impl Wallet {
    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn connected(signer: PrivateKeySigner) -> Self {
        Self {
            signer: Some(signer),
        }
    }

    /// Build the wallet from the `[signer]` section. A missing section yields a
    /// disconnected wallet.
    pub fn from_config(config: Option<&SignerConfig>) -> Result<Self> {
        let Some(config) = config else {
            return Ok(Self::disconnected());
        };

        let hex_key = match (&config.private_key, &config.key_file) {
            (Some(key), None) => key.clone(),
            (None, Some(path)) => std::fs::read_to_string(path).map_err(|e| {
                BridgeError::Config(format!("failed to read key file {path}: {e}"))
            })?,
            (Some(_), Some(_)) => {
                return Err(BridgeError::Config(
                    "set either signer.private_key or signer.key_file, not both".into(),
                ));
            }
            (None, None) => return Ok(Self::disconnected()),
        };

        Self::from_hex(&hex_key).map(Self::connected)
    }

    fn from_hex(hex_key: &str) -> Result<PrivateKeySigner> {
        let trimmed = hex_key.trim().trim_start_matches("0x");
        let bytes = const_hex::decode(trimmed)
            .map_err(|e| BridgeError::Config(format!("invalid hex in private key: {e}")))?;
        PrivateKeySigner::from_slice(&bytes)
            .map_err(|e| BridgeError::Config(format!("invalid private key: {e}")))
    }

    pub fn is_connected(&self) -> bool {
        self.signer.is_some()
    }

    pub fn signer(&self) -> Option<&PrivateKeySigner> {
        self.signer.as_ref()
    }

    pub fn address(&self) -> Option<Address> {
        self.signer.as_ref().map(PrivateKeySigner::address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // First account of the `test test ... junk` mnemonic.
    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    fn signer_config(private_key: Option<&str>, key_file: Option<&str>) -> SignerConfig {
        SignerConfig {
            private_key: private_key.map(str::to_string),
            key_file: key_file.map(str::to_string),
        }
    }

    #[test]
    fn test_missing_section_is_disconnected() {
        let wallet = Wallet::from_config(None).unwrap();
        assert!(!wallet.is_connected());
        assert!(wallet.signer().is_none());
        assert!(wallet.address().is_none());

        let empty = Wallet::from_config(Some(&signer_config(None, None))).unwrap();
        assert!(!empty.is_connected());
    }

    #[test]
    fn test_inline_private_key() {
        let wallet = Wallet::from_config(Some(&signer_config(Some(TEST_KEY), None))).unwrap();
        assert!(wallet.is_connected());
        assert_eq!(wallet.address().unwrap(), TEST_ADDRESS.parse::<Address>().unwrap());
    }

    #[test]
    fn test_key_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", TEST_KEY.trim_start_matches("0x")).unwrap();
        let path = file.path().display().to_string();

        let wallet = Wallet::from_config(Some(&signer_config(None, Some(&path)))).unwrap();
        assert_eq!(wallet.address().unwrap(), TEST_ADDRESS.parse::<Address>().unwrap());
    }

    #[test]
    fn test_rejects_bad_keys() {
        let both = Wallet::from_config(Some(&signer_config(Some(TEST_KEY), Some("k"))));
        assert!(matches!(both, Err(BridgeError::Config(_))));

        let not_hex = Wallet::from_config(Some(&signer_config(Some("0xzz"), None)));
        assert!(matches!(not_hex, Err(BridgeError::Config(_))));

        let short = Wallet::from_config(Some(&signer_config(Some("0x01"), None)));
        assert!(matches!(short, Err(BridgeError::Config(_))));
    }
}
