//! On-chain readiness polling
//!
//! Waits until a set of accounts is visible to the ledger before a dependent
//! transaction is built. Delays grow exponentially with jitter up to a cap;
//! the whole wait is bounded by an overall timeout.

use solana_sdk::pubkey::Pubkey;
use std::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use tracing::debug;

use crate::errors::{OrchestratorError, Result};
use crate::ledger::LedgerClient;
use crate::structured_logging::OperationContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    /// First delay between polls
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub timeout: Duration,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            timeout: Duration::from_secs(60),
        }
    }
}

impl ReadinessPolicy {
    /// Delay sequence: initial, 2x, 4x, ... capped at `max_delay`, jittered
    fn strategy(&self) -> impl Iterator<Item = Duration> {
        // from_millis(2).factor(n) yields n*2, n*4, n*8 ...
        let factor = (self.initial_delay.as_millis() as u64 / 2).max(1);
        ExponentialBackoff::from_millis(2)
            .factor(factor)
            .max_delay(self.max_delay)
            .map(jitter)
    }
}

/// Poll until every `(label, address)` has an account, or time out.
///
/// Transport errors that are retryable keep polling; anything else aborts.
pub async fn wait_for_accounts(
    ledger: &dyn LedgerClient,
    accounts: &[(&str, Pubkey)],
    policy: &ReadinessPolicy,
    ctx: &OperationContext,
) -> Result<()> {
    let probe = || async move {
        for (label, address) in accounts {
            if ledger.get_account_info(address).await?.is_none() {
                debug!(
                    context_id = %ctx.request_id,
                    account = %label,
                    address = %address,
                    "Account not yet visible"
                );
                return Err(OrchestratorError::not_found(*label, address));
            }
        }
        Ok(())
    };
    let should_retry = |err: &OrchestratorError| {
        matches!(err, OrchestratorError::AccountNotFound { .. }) || err.is_retryable()
    };

    match tokio::time::timeout(
        policy.timeout,
        RetryIf::spawn(policy.strategy(), probe, should_retry),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => {
            let labels: Vec<&str> = accounts.iter().map(|(label, _)| *label).collect();
            ctx.logger
                .warn(&format!("readiness wait timed out for {}", labels.join(", ")));
            Err(OrchestratorError::Timeout(format!(
                "{} not visible after {:?}",
                labels.join(", "),
                policy.timeout
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_grows_and_caps() {
        let policy = ReadinessPolicy {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
            timeout: Duration::from_secs(1),
        };
        let delays: Vec<Duration> = policy.strategy().take(6).collect();
        assert_eq!(delays.len(), 6);
        assert!(delays.iter().all(|d| *d <= Duration::from_millis(500)));
    }
}
