//! Ledger access
//!
//! The orchestrator never talks to an RPC node directly; it goes through
//! [`LedgerClient`], which exposes exactly the reads and writes the engine
//! needs. `RpcLedger` is the production implementation over the nonblocking
//! Solana RPC client.

use async_trait::async_trait;
use solana_sdk::{
    account::Account, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::VersionedTransaction,
};

pub mod errors;
mod rpc_ledger;

pub use errors::{LedgerError, LedgerResult};
pub use rpc_ledger::{RpcLedger, RpcLedgerConfig};

use crate::types::TokenBalance;

/// Terminal status of a submitted transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationOutcome {
    /// Program/runtime error payload, `None` on success
    pub err: Option<String>,
}

impl ConfirmationOutcome {
    pub fn success() -> Self {
        Self { err: None }
    }

    pub fn failed(err: impl Into<String>) -> Self {
        Self {
            err: Some(err.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.err.is_none()
    }
}

/// Result of simulating a transaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationOutcome {
    pub err: Option<String>,
    pub logs: Vec<String>,
    /// Base64 return data of the last instruction that set any
    pub return_data: Option<String>,
}

/// Everything the orchestrator needs from the ledger
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn latest_blockhash(&self) -> LedgerResult<Hash>;

    /// Submit a fully signed transaction
    async fn send_transaction(&self, tx: &VersionedTransaction) -> LedgerResult<Signature>;

    /// Block until the transaction reaches a terminal status
    async fn confirm_transaction(&self, signature: &Signature) -> LedgerResult<ConfirmationOutcome>;

    async fn simulate_transaction(
        &self,
        tx: &VersionedTransaction,
    ) -> LedgerResult<SimulationOutcome>;

    /// `None` when no account lives at `address`
    async fn get_account_info(&self, address: &Pubkey) -> LedgerResult<Option<Account>>;

    async fn get_token_account_balance(&self, address: &Pubkey) -> LedgerResult<TokenBalance>;

    /// Endpoint label for logs
    fn endpoint(&self) -> &str;
}
