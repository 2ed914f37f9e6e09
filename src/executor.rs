//! Transaction submission
//!
//! One path for every write: fetch a blockhash, compile and sign, send, wait
//! for a terminal status. A program error (at preflight or after landing) is
//! surfaced as `OnChainRejection` carrying the program's payload verbatim.

use solana_sdk::signature::Signature;
use std::sync::Arc;

use crate::errors::{OrchestratorError, Result};
use crate::ledger::{LedgerClient, LedgerError, SimulationOutcome};
use crate::structured_logging::OperationContext;
use crate::tx_builder::{PreparedTransaction, TxBuilder};

#[derive(Clone)]
pub struct TxExecutor {
    ledger: Arc<dyn LedgerClient>,
    builder: TxBuilder,
}

impl TxExecutor {
    pub fn new(ledger: Arc<dyn LedgerClient>, builder: TxBuilder) -> Self {
        Self { ledger, builder }
    }

    pub fn ledger(&self) -> &Arc<dyn LedgerClient> {
        &self.ledger
    }

    pub fn builder(&self) -> &TxBuilder {
        &self.builder
    }

    /// Build, send and confirm `prepared`; returns the confirmed signature.
    pub async fn submit(
        &self,
        prepared: &PreparedTransaction,
        ctx: &OperationContext,
    ) -> Result<Signature> {
        let blockhash = self.ledger.latest_blockhash().await?;
        let output = self.builder.build(prepared, blockhash)?;
        let expected_sig = output.tx.signatures.first().copied().unwrap_or_default();

        let signature = match self.ledger.send_transaction(&output.tx).await {
            Ok(sig) => sig,
            Err(LedgerError::Preflight { message, .. }) => {
                ctx.logger
                    .log_tx_rejected(&prepared.label, &expected_sig.to_string(), &message);
                return Err(OrchestratorError::rejected(expected_sig, message));
            }
            Err(e) => return Err(e.into()),
        };
        ctx.logger.log_tx_submitted(
            &prepared.label,
            &signature.to_string(),
            output.required_signers().len(),
        );

        let outcome = self.ledger.confirm_transaction(&signature).await?;
        if let Some(err) = outcome.err {
            ctx.logger
                .log_tx_rejected(&prepared.label, &signature.to_string(), &err);
            return Err(OrchestratorError::rejected(signature, err));
        }

        ctx.logger
            .log_tx_confirmed(&prepared.label, &signature.to_string(), ctx.elapsed_ms());
        Ok(signature)
    }

    /// Build and simulate `prepared` without submitting it.
    pub async fn simulate(
        &self,
        prepared: &PreparedTransaction,
        ctx: &OperationContext,
    ) -> Result<SimulationOutcome> {
        let blockhash = self.ledger.latest_blockhash().await?;
        let output = self.builder.build(prepared, blockhash)?;
        tracing::debug!(
            context_id = %ctx.request_id,
            label = %prepared.label,
            "Simulating transaction"
        );
        Ok(self.ledger.simulate_transaction(&output.tx).await?)
    }
}
