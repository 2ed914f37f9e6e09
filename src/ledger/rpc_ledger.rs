//! `LedgerClient` over the nonblocking Solana RPC client

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_rpc_client_api::config::RpcSimulateTransactionConfig;
use solana_sdk::{
    account::Account, commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey,
    signature::Signature, transaction::VersionedTransaction,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use super::{ConfirmationOutcome, LedgerClient, LedgerError, LedgerResult, SimulationOutcome};
use crate::types::TokenBalance;

/// Connection settings for [`RpcLedger`]
#[derive(Debug, Clone)]
pub struct RpcLedgerConfig {
    pub url: String,
    pub commitment: CommitmentConfig,
    pub request_timeout: Duration,
    /// Upper bound on a single confirmation wait
    pub confirm_timeout: Duration,
    pub confirm_poll_interval: Duration,
}

pub struct RpcLedger {
    client: Arc<RpcClient>,
    config: RpcLedgerConfig,
}

impl RpcLedger {
    pub fn new(config: RpcLedgerConfig) -> Self {
        let client = Arc::new(RpcClient::new_with_timeout_and_commitment(
            config.url.clone(),
            config.request_timeout,
            config.commitment,
        ));
        Self { client, config }
    }

    fn map_err(&self, err: solana_client::client_error::ClientError) -> LedgerError {
        LedgerError::from_client_error(err, &self.config.url)
    }
}

#[async_trait]
impl LedgerClient for RpcLedger {
    async fn latest_blockhash(&self) -> LedgerResult<Hash> {
        self.client
            .get_latest_blockhash()
            .await
            .map_err(|e| self.map_err(e))
    }

    async fn send_transaction(&self, tx: &VersionedTransaction) -> LedgerResult<Signature> {
        self.client
            .send_transaction(tx)
            .await
            .map_err(|e| self.map_err(e))
    }

    async fn confirm_transaction(
        &self,
        signature: &Signature,
    ) -> LedgerResult<ConfirmationOutcome> {
        let deadline = Instant::now() + self.config.confirm_timeout;
        loop {
            let status = self
                .client
                .get_signature_status_with_commitment(signature, self.config.commitment)
                .await
                .map_err(|e| self.map_err(e))?;

            match status {
                Some(Ok(())) => return Ok(ConfirmationOutcome::success()),
                Some(Err(tx_err)) => return Ok(ConfirmationOutcome::failed(tx_err.to_string())),
                None => {
                    if Instant::now() >= deadline {
                        return Err(LedgerError::Timeout {
                            endpoint: self.config.url.clone(),
                            timeout_ms: self.config.confirm_timeout.as_millis() as u64,
                        });
                    }
                    debug!(signature = %signature, "Awaiting confirmation");
                    tokio::time::sleep(self.config.confirm_poll_interval).await;
                }
            }
        }
    }

    async fn simulate_transaction(
        &self,
        tx: &VersionedTransaction,
    ) -> LedgerResult<SimulationOutcome> {
        let sim_config = RpcSimulateTransactionConfig {
            sig_verify: false,
            replace_recent_blockhash: true,
            commitment: Some(self.config.commitment),
            ..RpcSimulateTransactionConfig::default()
        };
        let response = self
            .client
            .simulate_transaction_with_config(tx, sim_config)
            .await
            .map_err(|e| self.map_err(e))?;

        let result = response.value;
        Ok(SimulationOutcome {
            err: result.err.map(|e| format!("{e:?}")),
            logs: result.logs.unwrap_or_default(),
            return_data: result.return_data.map(|rd| rd.data.0),
        })
    }

    async fn get_account_info(&self, address: &Pubkey) -> LedgerResult<Option<Account>> {
        let response = self
            .client
            .get_account_with_commitment(address, self.config.commitment)
            .await
            .map_err(|e| self.map_err(e))?;
        Ok(response.value)
    }

    async fn get_token_account_balance(&self, address: &Pubkey) -> LedgerResult<TokenBalance> {
        let ui = self
            .client
            .get_token_account_balance(address)
            .await
            .map_err(|e| self.map_err(e))?;
        let amount = ui.amount.parse::<u64>().map_err(|e| {
            LedgerError::InvalidResponse(format!(
                "token balance for {address} is not a u64 ({}): {e}",
                ui.amount
            ))
        })?;
        Ok(TokenBalance {
            amount,
            decimals: ui.decimals,
        })
    }

    fn endpoint(&self) -> &str {
        &self.config.url
    }
}
