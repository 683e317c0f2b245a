//! Block explorer links.

use std::fmt::Display;

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainSide {
    L1,
    L2,
}

impl ChainSide {
    pub fn label(&self) -> &'static str {
        match self {
            Self::L1 => "L1",
            Self::L2 => "L2",
        }
    }
}

/// Static `<base>/tx/<hash>` templates, one per chain side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplorerLinks {
    l1_base: String,
    l2_base: String,
}

impl ExplorerLinks {
    pub fn new(l1_base: impl AsRef<str>, l2_base: impl AsRef<str>) -> Self {
        Self {
            l1_base: normalize(l1_base.as_ref()),
            l2_base: normalize(l2_base.as_ref()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.l1.explorer_url, &config.l2.explorer_url)
    }

    /// The hash is inserted as given.
    pub fn tx_url(&self, side: ChainSide, tx_hash: impl Display) -> String {
        let base = match side {
            ChainSide::L1 => &self.l1_base,
            ChainSide::L2 => &self.l2_base,
        };
        format!("{base}/tx/{tx_hash}")
    }
}

fn normalize(base: &str) -> String {
    base.trim().trim_end_matches('/').to_string()
}
