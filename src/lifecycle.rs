//! Market lifecycle: LOCKED until the quote vault holds the free-market
//! threshold, FREE afterwards
//!
//! The state is a view recomputed from the quote vault balance on every call.
//! The program's own `locked` flag is what binds swaps; this controller only
//! decides which off-chain path to drive.

use solana_sdk::{instruction::Instruction, pubkey::Pubkey, signature::Signature};

use crate::errors::{OrchestratorError, Result};
use crate::executor::TxExecutor;
use crate::state::MarketAccount;
use crate::structured_logging::OperationContext;
use crate::tx_builder::{LaunchpadProgram, PreparedTransaction};
use crate::types::{LifecycleState, TokenBalance, FREE_MARKET_THRESHOLD_UNITS};

/// Lifecycle state for a given quote vault balance. No hysteresis.
pub fn lifecycle_for_balance(balance: &TokenBalance) -> LifecycleState {
    if balance.meets_whole_units(FREE_MARKET_THRESHOLD_UNITS) {
        LifecycleState::Free
    } else {
        LifecycleState::Locked
    }
}

/// One observation of a market
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleView {
    pub state: LifecycleState,
    pub quote_vault: Pubkey,
    pub quote_balance: TokenBalance,
}

impl LifecycleView {
    /// View of a quote vault that has not been created yet
    pub fn unfunded(quote_vault: Pubkey) -> Self {
        Self {
            state: LifecycleState::Locked,
            quote_vault,
            quote_balance: TokenBalance {
                amount: 0,
                decimals: 0,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreeOutcome {
    Freed(Signature),
    /// Program already reports the market unlocked; nothing sent
    AlreadyFree,
}

impl FreeOutcome {
    pub fn signature(&self) -> Option<Signature> {
        match self {
            Self::Freed(sig) => Some(*sig),
            Self::AlreadyFree => None,
        }
    }
}

#[derive(Clone)]
pub struct MarketLifecycleController {
    executor: TxExecutor,
    program: LaunchpadProgram,
}

impl MarketLifecycleController {
    pub fn new(executor: TxExecutor, program: LaunchpadProgram) -> Self {
        Self { executor, program }
    }

    pub async fn observe(
        &self,
        market_address: &Pubkey,
        market: &MarketAccount,
        ctx: &OperationContext,
    ) -> Result<LifecycleView> {
        let quote_vault = self
            .program
            .market_quote_vault(market_address, &market.quote_token_mint);
        let quote_balance = self
            .executor
            .ledger()
            .get_token_account_balance(&quote_vault)
            .await?;
        let state = lifecycle_for_balance(&quote_balance);

        ctx.logger.log_lifecycle(
            &market_address.to_string(),
            &state.to_string(),
            quote_balance.ui_amount(),
        );
        Ok(LifecycleView {
            state,
            quote_vault,
            quote_balance,
        })
    }

    pub fn free_market_instruction(
        &self,
        market_address: &Pubkey,
        market: &MarketAccount,
    ) -> Instruction {
        self.program.free_market(
            &self.executor.builder().signing().wallet_pubkey(),
            market_address,
            &market.quote_token_mint,
            &market.swap_authority,
        )
    }

    /// LOCKED -> FREE.
    ///
    /// # Errors
    ///
    /// `PreconditionUnmet` while the quote vault is below the threshold; no
    /// transaction is built in that case.
    pub async fn free_market(
        &self,
        market_address: &Pubkey,
        market: &MarketAccount,
        ctx: &OperationContext,
    ) -> Result<FreeOutcome> {
        let view = self.observe(market_address, market, ctx).await?;
        if view.state == LifecycleState::Locked {
            return Err(OrchestratorError::precondition(
                "quote vault balance",
                view.quote_balance.ui_amount(),
                FREE_MARKET_THRESHOLD_UNITS,
            ));
        }
        self.submit_free(market_address, market, ctx).await
    }

    /// Send `free_market` for a market already observed FREE, unless the
    /// program has already unlocked it.
    pub async fn submit_free(
        &self,
        market_address: &Pubkey,
        market: &MarketAccount,
        ctx: &OperationContext,
    ) -> Result<FreeOutcome> {
        if !market.locked {
            return Ok(FreeOutcome::AlreadyFree);
        }
        let prepared = PreparedTransaction::new(
            "free_market",
            self.executor.builder().signing().wallet_pubkey(),
            vec![self.free_market_instruction(market_address, market)],
        );
        let signature = self.executor.submit(&prepared, ctx).await?;
        Ok(FreeOutcome::Freed(signature))
    }

    /// Establish LOCKED with the delegated swap authority of the signing context.
    pub async fn lock_market(
        &self,
        market_address: &Pubkey,
        config: &Pubkey,
        ctx: &OperationContext,
    ) -> Result<Signature> {
        let signing = self.executor.builder().signing();
        let prepared = PreparedTransaction::new(
            "lock_market",
            signing.wallet_pubkey(),
            vec![self.program.lock_market(
                &signing.wallet_pubkey(),
                config,
                market_address,
                &signing.swap_authority_pubkey(),
            )],
        );
        self.executor.submit(&prepared, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_boundary() {
        let below = TokenBalance {
            amount: 68_999_999,
            decimals: 6,
        };
        let at = TokenBalance {
            amount: 69_000_000,
            decimals: 6,
        };
        let above = TokenBalance {
            amount: 1_000_000_000,
            decimals: 6,
        };
        assert_eq!(lifecycle_for_balance(&below), LifecycleState::Locked);
        assert_eq!(lifecycle_for_balance(&at), LifecycleState::Free);
        assert_eq!(lifecycle_for_balance(&above), LifecycleState::Free);
    }

    #[test]
    fn test_zero_decimals() {
        let balance = TokenBalance {
            amount: 69,
            decimals: 0,
        };
        assert_eq!(lifecycle_for_balance(&balance), LifecycleState::Free);
        let balance = TokenBalance {
            amount: 68,
            decimals: 0,
        };
        assert_eq!(lifecycle_for_balance(&balance), LifecycleState::Locked);
    }
}
