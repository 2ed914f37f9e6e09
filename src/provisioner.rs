//! Check-then-create provisioning of dependent accounts
//!
//! `ensure` reads the target address and submits a creation transaction only
//! when nothing lives there. Two requests racing on the same account may both
//! submit; the loser's rejection is downgraded to `Existing` once a re-read
//! shows the account. Token accounts use the idempotent ATA instruction, so
//! the associated-token program itself absorbs that race.

use solana_sdk::{instruction::Instruction, pubkey::Pubkey, signature::Signature};
use spl_associated_token_account::instruction::create_associated_token_account_idempotent;

use crate::errors::{OrchestratorError, Result};
use crate::executor::TxExecutor;
use crate::pda::associated_token_address;
use crate::structured_logging::OperationContext;
use crate::tx_builder::{LaunchpadProgram, PreparedTransaction};
use crate::types::{AccountKind, TokenProgram};

/// Result of an `ensure` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// Account was already there; nothing sent
    Existing,
    Created(Signature),
}

impl ProvisionOutcome {
    pub fn signature(&self) -> Option<Signature> {
        match self {
            Self::Existing => None,
            Self::Created(sig) => Some(*sig),
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// A token account the caller needs, with its derived address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAccountSpec {
    pub owner: Pubkey,
    pub mint: Pubkey,
    pub program: TokenProgram,
    pub address: Pubkey,
}

impl TokenAccountSpec {
    pub fn new(owner: Pubkey, mint: Pubkey, program: TokenProgram) -> Self {
        Self {
            owner,
            mint,
            program,
            address: associated_token_address(&owner, &mint, program),
        }
    }
}

#[derive(Clone)]
pub struct AccountProvisioner {
    executor: TxExecutor,
    program: LaunchpadProgram,
}

impl AccountProvisioner {
    pub fn new(executor: TxExecutor, program: LaunchpadProgram) -> Self {
        Self { executor, program }
    }

    fn payer(&self) -> Pubkey {
        self.executor.builder().signing().wallet_pubkey()
    }

    pub async fn exists(&self, address: &Pubkey) -> Result<bool> {
        Ok(self
            .executor
            .ledger()
            .get_account_info(address)
            .await?
            .is_some())
    }

    /// Create the account at `address` with `build` unless it already exists.
    pub async fn ensure<F>(
        &self,
        kind: AccountKind,
        address: Pubkey,
        build: F,
        ctx: &OperationContext,
    ) -> Result<ProvisionOutcome>
    where
        F: FnOnce() -> PreparedTransaction,
    {
        if self.exists(&address).await? {
            ctx.logger
                .log_account_provisioned(kind.as_str(), &address.to_string(), false);
            return Ok(ProvisionOutcome::Existing);
        }

        let prepared = build();
        match self.executor.submit(&prepared, ctx).await {
            Ok(signature) => {
                ctx.logger
                    .log_account_provisioned(kind.as_str(), &address.to_string(), true);
                Ok(ProvisionOutcome::Created(signature))
            }
            Err(err @ OrchestratorError::OnChainRejection { .. }) => {
                if self.exists(&address).await? {
                    ctx.logger.warn(&format!(
                        "{kind} {address} created concurrently, treating as existing"
                    ));
                    Ok(ProvisionOutcome::Existing)
                } else {
                    Err(err)
                }
            }
            Err(err) => Err(err),
        }
    }

    /// Idempotent ATA creation instruction, paid by the wallet
    pub fn create_token_account_instruction(&self, spec: &TokenAccountSpec) -> Instruction {
        create_associated_token_account_idempotent(
            &self.payer(),
            &spec.owner,
            &spec.mint,
            &spec.program.id(),
        )
    }

    pub async fn ensure_associated_token_account(
        &self,
        spec: &TokenAccountSpec,
        ctx: &OperationContext,
    ) -> Result<ProvisionOutcome> {
        let payer = self.payer();
        self.ensure(
            AccountKind::AssociatedToken(spec.program),
            spec.address,
            || {
                PreparedTransaction::new(
                    "create_associated_token_account",
                    payer,
                    vec![self.create_token_account_instruction(spec)],
                )
            },
            ctx,
        )
        .await
    }

    pub async fn ensure_staking_activated(
        &self,
        market: &Pubkey,
        base_mint: &Pubkey,
        ctx: &OperationContext,
    ) -> Result<(Pubkey, ProvisionOutcome)> {
        let payer = self.payer();
        let (staking, _) = self.program.deriver().market_staking(market);
        let outcome = self
            .ensure(
                AccountKind::MarketStaking,
                staking,
                || {
                    PreparedTransaction::new(
                        "activate_staking",
                        payer,
                        vec![self.program.activate_staking(&payer, market, base_mint)],
                    )
                },
                ctx,
            )
            .await?;
        Ok((staking, outcome))
    }

    pub async fn ensure_stake_position_created(
        &self,
        market: &Pubkey,
        owner: &Pubkey,
        ctx: &OperationContext,
    ) -> Result<(Pubkey, ProvisionOutcome)> {
        let payer = self.payer();
        let (position, _) = self.program.deriver().stake_position(market, owner);
        let outcome = self
            .ensure(
                AccountKind::StakePosition,
                position,
                || {
                    PreparedTransaction::new(
                        "create_stake_position",
                        payer,
                        vec![self.program.create_stake_position(&payer, market, owner)],
                    )
                },
                ctx,
            )
            .await?;
        Ok((position, outcome))
    }

    pub async fn ensure_quote_token_badge_created(
        &self,
        config: &Pubkey,
        quote_mint: &Pubkey,
        ctx: &OperationContext,
    ) -> Result<(Pubkey, ProvisionOutcome)> {
        let payer = self.payer();
        let (badge, _) = self.program.deriver().quote_token_badge(config, quote_mint);
        let outcome = self
            .ensure(
                AccountKind::QuoteTokenBadge,
                badge,
                || {
                    PreparedTransaction::new(
                        "create_quote_token_badge",
                        payer,
                        vec![self
                            .program
                            .create_quote_token_badge(&payer, config, quote_mint)],
                    )
                },
                ctx,
            )
            .await?;
        Ok((badge, outcome))
    }

    /// The config singleton is created with the wallet as payer and `authority` signer.
    pub async fn ensure_config_created(
        &self,
        authority: &Pubkey,
        protocol_fee_recipient: &Pubkey,
        protocol_fee_share: u16,
        referral_fee_share: u16,
        ctx: &OperationContext,
    ) -> Result<(Pubkey, ProvisionOutcome)> {
        let payer = self.payer();
        let (config, _) = self.program.deriver().config();
        let outcome = self
            .ensure(
                AccountKind::Config,
                config,
                || {
                    PreparedTransaction::new(
                        "create_config",
                        payer,
                        vec![self.program.create_config(
                            authority,
                            protocol_fee_recipient,
                            protocol_fee_share,
                            referral_fee_share,
                        )],
                    )
                },
                ctx,
            )
            .await?;
        Ok((config, outcome))
    }
}
