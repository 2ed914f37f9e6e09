//! Launchpad engine
//!
//! Composes the provisioner, lifecycle controller and swap orchestrator over a
//! single [`TxExecutor`], and exposes one method per externally visible
//! operation. The HTTP layer validates requests into the command types below
//! before calling in.

use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
};
use std::sync::Arc;
use tracing::info;

use crate::errors::{OrchestratorError, Result};
use crate::executor::TxExecutor;
use crate::lifecycle::{FreeOutcome, LifecycleView, MarketLifecycleController};
use crate::ledger::LedgerClient;
use crate::provisioner::AccountProvisioner;
use crate::readiness::{wait_for_accounts, ReadinessPolicy};
use crate::state::fetch_market;
use crate::structured_logging::OperationContext;
use crate::swap::{SwapOrchestrator, SwapReceipt};
use crate::tx_builder::{
    ComputeBudget, CreateMarketArgs, CreateVestingArgs, LaunchpadProgram, PreparedTransaction,
    TxBuilder,
};
use crate::types::{SwapParams, SwapQuote};
use crate::wallet::SigningContext;

/// Deployment-specific inputs, resolved from configuration at startup
#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    pub program: LaunchpadProgram,
    /// Launchpad config account; the derived singleton unless overridden
    pub config_address: Pubkey,
    pub quote_mint: Pubkey,
    pub compute_budget: ComputeBudget,
    pub readiness: ReadinessPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateConfigCommand {
    pub authority: Pubkey,
    pub protocol_fee_recipient: Pubkey,
    pub protocol_fee_share: u16,
    pub referral_fee_share: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigCreated {
    pub config_address: Pubkey,
    /// `None` when the config already existed
    pub signature: Option<Signature>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketCreated {
    pub market_address: Pubkey,
    pub base_token_mint: Pubkey,
    pub signature: Signature,
    pub lock_signature: Signature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateVestingCommand {
    pub market: Pubkey,
    pub recipient: Pubkey,
    pub amount: u64,
    pub duration: i64,
    pub cliff_duration: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VestingCreated {
    pub vesting_account: Pubkey,
    pub signature: Signature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseVestingCommand {
    pub market: Pubkey,
    pub staking: Pubkey,
    pub stake_position: Pubkey,
    pub vesting_plan: Pubkey,
    pub base_mint: Pubkey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StakeCommand {
    pub market: Pubkey,
    pub amount: u64,
    pub lockup_period: Option<i64>,
}

pub struct Launchpad {
    executor: TxExecutor,
    settings: EngineSettings,
    provisioner: AccountProvisioner,
    lifecycle: MarketLifecycleController,
    swaps: SwapOrchestrator,
}

impl Launchpad {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        signing: SigningContext,
        settings: EngineSettings,
    ) -> Self {
        let executor = TxExecutor::new(ledger, TxBuilder::new(signing, settings.compute_budget));
        let provisioner = AccountProvisioner::new(executor.clone(), settings.program);
        let lifecycle = MarketLifecycleController::new(executor.clone(), settings.program);
        let swaps = SwapOrchestrator::new(
            executor.clone(),
            settings.program,
            provisioner.clone(),
            lifecycle.clone(),
        );
        Self {
            executor,
            settings,
            provisioner,
            lifecycle,
            swaps,
        }
    }

    pub fn signing(&self) -> &SigningContext {
        self.executor.builder().signing()
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn ledger(&self) -> &Arc<dyn LedgerClient> {
        self.executor.ledger()
    }

    fn program(&self) -> &LaunchpadProgram {
        &self.settings.program
    }

    fn wallet(&self) -> Pubkey {
        self.signing().wallet_pubkey()
    }

    /// Create the launchpad config unless it already exists.
    pub async fn create_config(
        &self,
        cmd: CreateConfigCommand,
        ctx: &OperationContext,
    ) -> Result<ConfigCreated> {
        if self.signing().keypair_for(&cmd.authority).is_none() {
            return Err(OrchestratorError::validation(format!(
                "authority {} is not a key held by this service",
                cmd.authority
            )));
        }
        validate_share("protocolFeeShare", cmd.protocol_fee_share)?;
        validate_share("referralFeeShare", cmd.referral_fee_share)?;

        let (config_address, outcome) = self
            .provisioner
            .ensure_config_created(
                &cmd.authority,
                &cmd.protocol_fee_recipient,
                cmd.protocol_fee_share,
                cmd.referral_fee_share,
                ctx,
            )
            .await?;
        Ok(ConfigCreated {
            config_address,
            signature: outcome.signature(),
        })
    }

    /// Create a market with a fresh base mint, then lock it to the delegated authority.
    pub async fn create_market(
        &self,
        args: CreateMarketArgs,
        ctx: &OperationContext,
    ) -> Result<MarketCreated> {
        validate_market_args(&args)?;
        let config = self.settings.config_address;
        let quote_mint = self.settings.quote_mint;

        self.provisioner
            .ensure_quote_token_badge_created(&config, &quote_mint, ctx)
            .await?;

        let base_mint = Arc::new(Keypair::new());
        let base_mint_pubkey = base_mint.pubkey();
        let (market_address, _) = self.program().deriver().market(&base_mint_pubkey);

        let prepared = PreparedTransaction::new(
            "create_market",
            self.wallet(),
            vec![self.program().create_market(
                &self.wallet(),
                &config,
                &quote_mint,
                &base_mint_pubkey,
                &args,
            )],
        )
        .with_signer(base_mint);
        let signature = self.executor.submit(&prepared, ctx).await?;

        let lock_signature = self
            .lifecycle
            .lock_market(&market_address, &config, ctx)
            .await?;

        info!(
            context_id = %ctx.request_id,
            market = %market_address,
            base_mint = %base_mint_pubkey,
            "Market created and locked"
        );
        Ok(MarketCreated {
            market_address,
            base_token_mint: base_mint_pubkey,
            signature,
            lock_signature,
        })
    }

    pub async fn lifecycle(
        &self,
        market_address: &Pubkey,
        ctx: &OperationContext,
    ) -> Result<LifecycleView> {
        let market = fetch_market(self.ledger().as_ref(), market_address).await?;
        self.lifecycle.observe(market_address, &market, ctx).await
    }

    pub async fn free_market(
        &self,
        market_address: &Pubkey,
        ctx: &OperationContext,
    ) -> Result<FreeOutcome> {
        let market = fetch_market(self.ledger().as_ref(), market_address).await?;
        self.lifecycle.free_market(market_address, &market, ctx).await
    }

    /// Lock `amount` of the wallet's base tokens into a vesting plan for `recipient`.
    pub async fn create_vesting(
        &self,
        cmd: CreateVestingCommand,
        ctx: &OperationContext,
    ) -> Result<VestingCreated> {
        if cmd.amount == 0 {
            return Err(OrchestratorError::validation("amount must be greater than 0"));
        }
        if cmd.duration <= 0 {
            return Err(OrchestratorError::validation("duration must be positive"));
        }
        if let Some(cliff) = cmd.cliff_duration {
            if cliff < 0 || cliff > cmd.duration {
                return Err(OrchestratorError::validation(
                    "cliffDuration must be within [0, duration]",
                ));
            }
        }

        let market = fetch_market(self.ledger().as_ref(), &cmd.market).await?;
        self.provisioner
            .ensure_staking_activated(&cmd.market, &market.base_token_mint, ctx)
            .await?;
        self.provisioner
            .ensure_stake_position_created(&cmd.market, &cmd.recipient, ctx)
            .await?;

        let (vesting_account, _) = self
            .program()
            .deriver()
            .vesting_plan(&cmd.market, &cmd.recipient);
        let args = CreateVestingArgs {
            amount: cmd.amount,
            duration: cmd.duration,
            cliff_duration: cmd.cliff_duration,
        };
        let prepared = PreparedTransaction::new(
            "create_vesting",
            self.wallet(),
            vec![self.program().create_vesting(
                &self.wallet(),
                &cmd.market,
                &market.base_token_mint,
                &cmd.recipient,
                &args,
            )],
        );
        let signature = self.executor.submit(&prepared, ctx).await?;
        Ok(VestingCreated {
            vesting_account,
            signature,
        })
    }

    /// Release vested tokens once the plan and stake position are visible on-chain.
    pub async fn release_vesting(
        &self,
        cmd: ReleaseVestingCommand,
        ctx: &OperationContext,
    ) -> Result<Signature> {
        wait_for_accounts(
            self.ledger().as_ref(),
            &[
                ("vesting_plan", cmd.vesting_plan),
                ("stake_position", cmd.stake_position),
            ],
            &self.settings.readiness,
            ctx,
        )
        .await?;

        let prepared = PreparedTransaction::new(
            "release_vesting",
            self.wallet(),
            vec![self.program().release_vesting(
                &self.wallet(),
                &cmd.market,
                &cmd.staking,
                &cmd.stake_position,
                &cmd.vesting_plan,
                &cmd.base_mint,
            )],
        );
        self.executor.submit(&prepared, ctx).await
    }

    /// Stake the wallet's base tokens into the market's staking pool.
    pub async fn stake(&self, cmd: StakeCommand, ctx: &OperationContext) -> Result<Signature> {
        if cmd.amount == 0 {
            return Err(OrchestratorError::validation("amount must be greater than 0"));
        }
        if matches!(cmd.lockup_period, Some(p) if p < 0) {
            return Err(OrchestratorError::validation(
                "lockupPeriod must not be negative",
            ));
        }

        let market = fetch_market(self.ledger().as_ref(), &cmd.market).await?;
        let wallet = self.wallet();
        self.provisioner
            .ensure_staking_activated(&cmd.market, &market.base_token_mint, ctx)
            .await?;
        self.provisioner
            .ensure_stake_position_created(&cmd.market, &wallet, ctx)
            .await?;

        let prepared = PreparedTransaction::new(
            "stake",
            wallet,
            vec![self.program().stake(
                &wallet,
                &cmd.market,
                &market.base_token_mint,
                cmd.amount,
                cmd.lockup_period,
            )],
        );
        self.executor.submit(&prepared, ctx).await
    }

    pub async fn swap(
        &self,
        market_address: &Pubkey,
        params: SwapParams,
        ctx: &OperationContext,
    ) -> Result<SwapReceipt> {
        self.swaps.swap(market_address, params, ctx).await
    }

    pub async fn quote(
        &self,
        market_address: &Pubkey,
        params: SwapParams,
        ctx: &OperationContext,
    ) -> Result<SwapQuote> {
        self.swaps.quote(market_address, params, ctx).await
    }

    pub fn swaps(&self) -> &SwapOrchestrator {
        &self.swaps
    }
}

const MAX_SHARE_BPS: u16 = 10_000;

fn validate_share(field: &str, share: u16) -> Result<()> {
    if share > MAX_SHARE_BPS {
        return Err(OrchestratorError::validation(format!(
            "{field} must be at most {MAX_SHARE_BPS} bps, got {share}"
        )));
    }
    Ok(())
}

fn validate_market_args(args: &CreateMarketArgs) -> Result<()> {
    if args.name.trim().is_empty() {
        return Err(OrchestratorError::validation("name must not be empty"));
    }
    if args.symbol.trim().is_empty() {
        return Err(OrchestratorError::validation("symbol must not be empty"));
    }
    if args.total_supply == 0 {
        return Err(OrchestratorError::validation(
            "totalSupply must be greater than 0",
        ));
    }
    validate_share("creatorFeeShare", args.creator_fee_share)?;
    validate_share("stakingFeeShare", args.staking_fee_share)?;
    if args.creator_fee_share as u32 + args.staking_fee_share as u32 > MAX_SHARE_BPS as u32 {
        return Err(OrchestratorError::validation(
            "creatorFeeShare + stakingFeeShare must not exceed 10000 bps",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market_args() -> CreateMarketArgs {
        CreateMarketArgs {
            name: "Launch".to_string(),
            symbol: "LNC".to_string(),
            uri: "https://example.com/meta.json".to_string(),
            total_supply: 1_000_000_000,
            creator_fee_share: 100,
            staking_fee_share: 200,
        }
    }

    #[test]
    fn test_market_args_validation() {
        assert!(validate_market_args(&market_args()).is_ok());

        let mut args = market_args();
        args.name = "  ".to_string();
        assert!(validate_market_args(&args).is_err());

        let mut args = market_args();
        args.total_supply = 0;
        assert!(validate_market_args(&args).is_err());

        let mut args = market_args();
        args.creator_fee_share = 6_000;
        args.staking_fee_share = 5_000;
        let err = validate_market_args(&args).unwrap_err();
        assert_eq!(err.category(), "validation");
    }

    #[test]
    fn test_share_bounds() {
        assert!(validate_share("x", 10_000).is_ok());
        assert!(validate_share("x", 10_001).is_err());
    }
}
