//! Permissioned swaps and quotes
//!
//! Both paths share [`SwapOrchestrator::plan`], which yields the unsent swap
//! transaction for the current lifecycle. `swap` provisions token accounts,
//! observes the lifecycle, and frees the market with real transactions before
//! submitting; `quote` folds those steps into the single simulated
//! transaction instead.

use solana_sdk::{instruction::Instruction, pubkey::Pubkey, signature::Signature};

use crate::errors::{OrchestratorError, Result};
use crate::executor::TxExecutor;
use crate::lifecycle::{FreeOutcome, LifecycleView, MarketLifecycleController};
use crate::provisioner::{AccountProvisioner, TokenAccountSpec};
use crate::state::{fetch_config, fetch_market, LaunchpadConfig, MarketAccount};
use crate::structured_logging::OperationContext;
use crate::tx_builder::{quote_from_simulation, LaunchpadProgram, PreparedTransaction, SwapAccounts};
use crate::types::{LifecycleState, SwapParams, SwapQuote};

/// Market, config and the token accounts a swap on it touches
#[derive(Debug, Clone)]
pub struct SwapTarget {
    pub address: Pubkey,
    pub market: MarketAccount,
    pub config: LaunchpadConfig,
    pub market_base: TokenAccountSpec,
    pub market_quote: TokenAccountSpec,
    pub user_base: TokenAccountSpec,
    pub user_quote: TokenAccountSpec,
    pub protocol_fee_quote: TokenAccountSpec,
}

impl SwapTarget {
    /// Token accounts in provisioning order
    pub fn token_accounts(&self) -> [TokenAccountSpec; 5] {
        [
            self.market_base,
            self.market_quote,
            self.user_base,
            self.user_quote,
            self.protocol_fee_quote,
        ]
    }
}

/// A swap target plus its observed lifecycle
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    pub target: SwapTarget,
    pub lifecycle: LifecycleView,
}

impl MarketSnapshot {
    /// FREE by balance but the program still has the lock flag set
    pub fn needs_free(&self) -> bool {
        self.lifecycle.state == LifecycleState::Free && self.target.market.locked
    }
}

/// Unsent swap transaction plus what it was planned against
#[derive(Debug, Clone)]
pub struct SwapPlan {
    pub prepared: PreparedTransaction,
    pub lifecycle: LifecycleState,
    pub swap_authority: Pubkey,
    pub params: SwapParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapReceipt {
    pub signature: Signature,
    pub lifecycle: LifecycleState,
    pub other_amount_threshold: u64,
    /// Set when this call freed the market first
    pub free_signature: Option<Signature>,
}

#[derive(Clone)]
pub struct SwapOrchestrator {
    executor: TxExecutor,
    program: LaunchpadProgram,
    provisioner: AccountProvisioner,
    lifecycle: MarketLifecycleController,
}

impl SwapOrchestrator {
    pub fn new(
        executor: TxExecutor,
        program: LaunchpadProgram,
        provisioner: AccountProvisioner,
        lifecycle: MarketLifecycleController,
    ) -> Self {
        Self {
            executor,
            program,
            provisioner,
            lifecycle,
        }
    }

    /// Fetch market and config and derive the swap's token accounts.
    pub async fn resolve(&self, market_address: &Pubkey) -> Result<SwapTarget> {
        let ledger = self.executor.ledger().as_ref();
        let market = fetch_market(ledger, market_address).await?;
        let config = fetch_config(ledger, &market.config).await?;

        let wallet = self.executor.builder().signing().wallet_pubkey();
        let base = self.program.base_token_program();
        let quote = self.program.quote_token_program();
        Ok(SwapTarget {
            address: *market_address,
            market_base: TokenAccountSpec::new(*market_address, market.base_token_mint, base),
            market_quote: TokenAccountSpec::new(*market_address, market.quote_token_mint, quote),
            user_base: TokenAccountSpec::new(wallet, market.base_token_mint, base),
            user_quote: TokenAccountSpec::new(wallet, market.quote_token_mint, quote),
            protocol_fee_quote: TokenAccountSpec::new(
                config.protocol_fee_recipient,
                market.quote_token_mint,
                quote,
            ),
            market,
            config,
        })
    }

    /// Observe the lifecycle of a resolved target. The quote vault must exist.
    pub async fn observe(
        &self,
        target: SwapTarget,
        ctx: &OperationContext,
    ) -> Result<MarketSnapshot> {
        let lifecycle = self
            .lifecycle
            .observe(&target.address, &target.market, ctx)
            .await?;
        Ok(MarketSnapshot { target, lifecycle })
    }

    /// Resolve and observe in one step, for markets whose vaults exist.
    pub async fn snapshot(
        &self,
        market_address: &Pubkey,
        ctx: &OperationContext,
    ) -> Result<MarketSnapshot> {
        let target = self.resolve(market_address).await?;
        self.observe(target, ctx).await
    }

    /// Build the unsent swap for the snapshot's lifecycle.
    ///
    /// LOCKED: wallet and delegated authority both sign, badge included.
    /// FREE: the wallet signs alone and stands in as swap authority.
    pub fn plan(&self, snapshot: &MarketSnapshot, params: SwapParams) -> SwapPlan {
        let signing = self.executor.builder().signing();
        let wallet = signing.wallet_pubkey();
        let target = &snapshot.target;

        let (swap_authority, badge) = match snapshot.lifecycle.state {
            LifecycleState::Locked => {
                let authority = signing.swap_authority_pubkey();
                let (badge, _) = self
                    .program
                    .deriver()
                    .swap_authority_badge(&target.address, &authority);
                (authority, Some(badge))
            }
            LifecycleState::Free => (wallet, None),
        };

        let accounts = SwapAccounts {
            user: wallet,
            swap_authority,
            swap_authority_badge: badge,
            config: target.market.config,
            market: target.address,
            base_mint: target.market.base_token_mint,
            quote_mint: target.market.quote_token_mint,
            market_base_vault: target.market_base.address,
            market_quote_vault: target.market_quote.address,
            user_base: target.user_base.address,
            user_quote: target.user_quote.address,
            protocol_fee_quote: target.protocol_fee_quote.address,
        };
        let ix = self.program.permissioned_swap(&accounts, &params);

        SwapPlan {
            prepared: PreparedTransaction::new("permissioned_swap", wallet, vec![ix]),
            lifecycle: snapshot.lifecycle.state,
            swap_authority,
            params,
        }
    }

    /// Provision, free if needed, then submit and confirm the swap.
    pub async fn swap(
        &self,
        market_address: &Pubkey,
        params: SwapParams,
        ctx: &OperationContext,
    ) -> Result<SwapReceipt> {
        validate_params(&params)?;
        let target = self.resolve(market_address).await?;

        for spec in target.token_accounts() {
            self.provisioner
                .ensure_associated_token_account(&spec, ctx)
                .await?;
        }
        let snapshot = self.observe(target, ctx).await?;

        let free_signature = if snapshot.lifecycle.state == LifecycleState::Free {
            match self
                .lifecycle
                .submit_free(&snapshot.target.address, &snapshot.target.market, ctx)
                .await?
            {
                FreeOutcome::Freed(sig) => Some(sig),
                FreeOutcome::AlreadyFree => None,
            }
        } else {
            None
        };

        let plan = self.plan(&snapshot, params);
        let signature = self.executor.submit(&plan.prepared, ctx).await?;
        Ok(SwapReceipt {
            signature,
            lifecycle: plan.lifecycle,
            other_amount_threshold: params.other_amount_threshold,
            free_signature,
        })
    }

    /// Simulate the swap; mutates nothing on-chain.
    pub async fn quote(
        &self,
        market_address: &Pubkey,
        params: SwapParams,
        ctx: &OperationContext,
    ) -> Result<SwapQuote> {
        validate_params(&params)?;
        let target = self.resolve(market_address).await?;

        let mut missing = Vec::new();
        for spec in target.token_accounts() {
            if !self.provisioner.exists(&spec.address).await? {
                missing.push(spec);
            }
        }

        // A quote vault that is not created yet holds nothing
        let vault_missing = missing
            .iter()
            .any(|spec| spec.address == target.market_quote.address);
        let snapshot = if vault_missing {
            let lifecycle = LifecycleView::unfunded(target.market_quote.address);
            MarketSnapshot { target, lifecycle }
        } else {
            self.observe(target, ctx).await?
        };
        let setup = self.quote_setup_instructions(&snapshot, &missing);

        let plan = self.plan(&snapshot, params);
        let prepared = plan.prepared.prepend(setup);
        let outcome = self.executor.simulate(&prepared, ctx).await?;

        let quote = quote_from_simulation(&outcome);
        if quote.is_unknown() {
            ctx.logger
                .warn(&format!("no quote decoded for market {market_address}"));
        } else {
            ctx.logger.log_swap_quote(
                &market_address.to_string(),
                quote.input_amount,
                quote.output_amount,
            );
        }
        Ok(quote)
    }

    /// Create-if-missing token accounts and a pending free, as instructions
    fn quote_setup_instructions(
        &self,
        snapshot: &MarketSnapshot,
        missing: &[TokenAccountSpec],
    ) -> Vec<Instruction> {
        let mut setup: Vec<Instruction> = missing
            .iter()
            .map(|spec| self.provisioner.create_token_account_instruction(spec))
            .collect();
        if snapshot.needs_free() {
            setup.push(
                self.lifecycle
                    .free_market_instruction(&snapshot.target.address, &snapshot.target.market),
            );
        }
        setup
    }
}

fn validate_params(params: &SwapParams) -> Result<()> {
    if params.amount == 0 {
        return Err(OrchestratorError::validation("amount must be greater than 0"));
    }
    Ok(())
}
