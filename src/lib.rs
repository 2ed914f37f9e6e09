//! Launchpad Orchestrator - Solana launchpad transaction backend
//!
//! Builds, signs and submits the launchpad program's transactions: config and
//! market creation, the LOCKED/FREE market lifecycle, permissioned swaps and
//! quotes, staking and vesting. The HTTP surface in [`api`] is a thin shell
//! over [`engine::Launchpad`].

pub mod api;
pub mod config;
pub mod engine;
pub mod errors;
pub mod executor;
pub mod ledger;
pub mod lifecycle;
pub mod pda;
pub mod provisioner;
pub mod readiness;
pub mod state;
pub mod structured_logging;
pub mod swap;
pub mod test_utils;
pub mod tx_builder;
pub mod types;
pub mod wallet;

// Re-export commonly used types
pub use engine::{EngineSettings, Launchpad};
pub use errors::{OrchestratorError, Result};
pub use solana_sdk::{pubkey::Pubkey, signature::Signature};
