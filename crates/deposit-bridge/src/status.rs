//! Transaction confirmation and cross-chain message status.
//!
//! [`TxStatus`] tracks whether a single transaction has been mined.
//! [`MessageStatus`] tracks the relay stage of a cross-chain message.

use std::fmt;

/// Confirmation state of an L1 or L2 transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxStatus {
    Pending,
    Confirmed,
}

impl TxStatus {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed)
    }
}

/// Relay stage of a cross-chain message.
///
/// Codes follow the OP-stack message status numbering. Codes this crate does
/// not know about are kept as [`MessageStatus::Unknown`] instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageStatus {
    UnconfirmedL1ToL2Message,
    FailedL1ToL2Message,
    StateRootNotPublished,
    ReadyToProve,
    InChallengePeriod,
    ReadyForRelay,
    Relayed,
    Unknown(u8),
}

impl MessageStatus {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::UnconfirmedL1ToL2Message,
            1 => Self::FailedL1ToL2Message,
            2 => Self::StateRootNotPublished,
            3 => Self::ReadyToProve,
            4 => Self::InChallengePeriod,
            5 => Self::ReadyForRelay,
            6 => Self::Relayed,
            other => Self::Unknown(other),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::UnconfirmedL1ToL2Message => 0,
            Self::FailedL1ToL2Message => 1,
            Self::StateRootNotPublished => 2,
            Self::ReadyToProve => 3,
            Self::InChallengePeriod => 4,
            Self::ReadyForRelay => 5,
            Self::Relayed => 6,
            Self::Unknown(code) => *code,
        }
    }

    /// Human readable label shown next to the deposit.
    pub fn label(&self) -> &'static str {
        match self {
            Self::UnconfirmedL1ToL2Message => "UNCONFIRMED_L1_TO_L2_MESSAGE",
            Self::FailedL1ToL2Message => "FAILED_L1_TO_L2_MESSAGE",
            Self::StateRootNotPublished => "STATE_ROOT_NOT_PUBLISHED",
            Self::ReadyToProve => "READY_TO_PROVE",
            Self::InChallengePeriod => "IN_CHALLENGE_PERIOD",
            Self::ReadyForRelay => "READY_FOR_RELAY",
            Self::Relayed => "RELAYED",
            Self::Unknown(_) => "UNKNOWN",
        }
    }

    /// Whether the message reached a final state on L2.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Relayed | Self::FailedL1ToL2Message)
    }
}

impl From<u8> for MessageStatus {
    fn from(code: u8) -> Self {
        Self::from_code(code)
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
