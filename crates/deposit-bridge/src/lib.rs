//! L1 to L2 ETH deposits for OP-stack chains.
//!
//! A [`controller::BridgeController`] drives one deposit at a time: it submits
//! the deposit on L1 through a [`messenger::CrossChainMessenger`], waits for
//! the L1 confirmation, then tracks the cross-chain message until its L2
//! transaction is observed. Progress is published as
//! [`controller::BridgeOperation`] snapshots.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

// Used by the `deposit-bridge` binary only.
use clap as _;
use eyre as _;
use tracing_subscriber as _;

pub mod app;
pub mod config;
pub mod controller;
pub mod deposit;
pub mod error;
pub mod explorer;
pub mod messenger;
pub mod render;
pub mod status;
pub mod wallet;

pub use error::{BridgeError, Result};
