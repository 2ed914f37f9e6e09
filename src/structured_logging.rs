//! Structured logging and operation context

use std::time::Instant;
use uuid::Uuid;

/// Structured logger for orchestration events
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    context_id: String,
}

impl StructuredLogger {
    pub fn new(context_id: String) -> Self {
        Self { context_id }
    }

    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    pub fn log_tx_submitted(&self, label: &str, sig: &str, signers: usize) {
        tracing::info!(
            context_id = %self.context_id,
            label = %label,
            signature = %sig,
            signers = %signers,
            "Transaction submitted"
        );
    }

    pub fn log_tx_confirmed(&self, label: &str, sig: &str, latency_ms: u64) {
        tracing::info!(
            context_id = %self.context_id,
            label = %label,
            signature = %sig,
            latency_ms = %latency_ms,
            "Transaction confirmed"
        );
    }

    pub fn log_tx_rejected(&self, label: &str, sig: &str, error: &str) {
        tracing::warn!(
            context_id = %self.context_id,
            label = %label,
            signature = %sig,
            error = %error,
            "Transaction rejected on-chain"
        );
    }

    pub fn log_account_provisioned(&self, kind: &str, address: &str, created: bool) {
        tracing::debug!(
            context_id = %self.context_id,
            kind = %kind,
            address = %address,
            created = %created,
            "Account provisioned"
        );
    }

    pub fn log_lifecycle(&self, market: &str, state: &str, quote_balance: f64) {
        tracing::debug!(
            context_id = %self.context_id,
            market = %market,
            state = %state,
            quote_balance = %quote_balance,
            "Market lifecycle observed"
        );
    }

    pub fn log_swap_quote(&self, market: &str, input_amount: u64, output_amount: u64) {
        tracing::info!(
            context_id = %self.context_id,
            market = %market,
            input_amount = %input_amount,
            output_amount = %output_amount,
            "Swap quoted"
        );
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!(
            context_id = %self.context_id,
            message = %message,
            "Warning"
        );
    }

    pub fn error(&self, message: &str) {
        tracing::error!(
            context_id = %self.context_id,
            message = %message,
            "Error"
        );
    }
}

/// Per-request context threaded through one engine operation
#[derive(Debug, Clone)]
pub struct OperationContext {
    /// Unique request ID
    pub request_id: String,

    /// Operation name
    pub operation: String,

    pub started: Instant,

    pub logger: StructuredLogger,
}

impl OperationContext {
    pub fn new(operation: &str) -> Self {
        let request_id = Uuid::new_v4().to_string();
        Self {
            logger: StructuredLogger::new(request_id.clone()),
            request_id,
            operation: operation.to_string(),
            started: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

impl Default for OperationContext {
    fn default() -> Self {
        Self::new("default")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_shares_request_id() {
        let ctx = OperationContext::new("swap");
        assert_eq!(ctx.operation, "swap");
        assert_eq!(ctx.logger.context_id(), ctx.request_id);
    }

    #[test]
    fn test_request_ids_are_unique() {
        assert_ne!(
            OperationContext::new("a").request_id,
            OperationContext::new("a").request_id
        );
    }
}
