//! Shared fixtures for engine scenarios
//!
//! A [`Fixture`] seeds a `MockLedger` with a launchpad config and one market
//! (locked, quote vault empty) and wires a `Launchpad` engine over it.

use solana_sdk::{pubkey::Pubkey, signature::Keypair};
use std::sync::Arc;
use std::time::Duration;

use crate::engine::{EngineSettings, Launchpad};
use crate::executor::TxExecutor;
use crate::pda::AddressDeriver;
use crate::provisioner::{AccountProvisioner, TokenAccountSpec};
use crate::readiness::ReadinessPolicy;
use crate::state::{LaunchpadConfig, MarketAccount};
use crate::structured_logging::OperationContext;
use crate::test_utils::MockLedger;
use crate::tx_builder::{ComputeBudget, LaunchpadProgram, TxBuilder};
use crate::types::TokenProgram;
use crate::wallet::SigningContext;

pub const QUOTE_DECIMALS: u8 = 9;

pub struct Fixture {
    pub ledger: Arc<MockLedger>,
    pub signing: SigningContext,
    pub settings: EngineSettings,
    pub engine: Launchpad,
    pub config: LaunchpadConfig,
    pub market_address: Pubkey,
    pub market: MarketAccount,
}

impl Fixture {
    pub fn new() -> Self {
        let ledger = Arc::new(MockLedger::new());
        let signing = SigningContext::new(Keypair::new(), Keypair::new());
        let program = LaunchpadProgram::new(
            AddressDeriver::new(Pubkey::new_unique()),
            TokenProgram::Extended,
            TokenProgram::Legacy,
        );
        let (config_address, config_bump) = program.deriver().config();
        let settings = EngineSettings {
            program,
            config_address,
            quote_mint: spl_token::native_mint::id(),
            compute_budget: ComputeBudget::default(),
            readiness: ReadinessPolicy {
                initial_delay: Duration::from_millis(4),
                max_delay: Duration::from_millis(20),
                timeout: Duration::from_millis(200),
            },
        };

        let config = LaunchpadConfig {
            authority: signing.wallet_pubkey(),
            protocol_fee_recipient: Pubkey::new_unique(),
            protocol_fee_share: 100,
            referral_fee_share: 50,
            bump: config_bump,
        };
        ledger.seed_config(config_address, program.program_id(), &config);

        let base_mint = Pubkey::new_unique();
        let (market_address, market_bump) = program.deriver().market(&base_mint);
        let market = MarketAccount {
            config: config_address,
            creator: signing.wallet_pubkey(),
            base_token_mint: base_mint,
            quote_token_mint: settings.quote_mint,
            swap_authority: signing.swap_authority_pubkey(),
            creator_fee_share: 100,
            staking_fee_share: 100,
            locked: true,
            bump: market_bump,
        };
        ledger.seed_market(market_address, program.program_id(), &market);

        let engine = Launchpad::new(ledger.clone(), signing.clone(), settings);
        let fixture = Self {
            ledger,
            signing,
            settings,
            engine,
            config,
            market_address,
            market,
        };
        fixture.set_quote_balance(0);
        fixture
    }

    pub fn program(&self) -> &LaunchpadProgram {
        &self.settings.program
    }

    pub fn wallet(&self) -> Pubkey {
        self.signing.wallet_pubkey()
    }

    pub fn ctx(&self, operation: &str) -> OperationContext {
        OperationContext::new(operation)
    }

    pub fn quote_vault(&self) -> Pubkey {
        self.program()
            .market_quote_vault(&self.market_address, &self.market.quote_token_mint)
    }

    /// Raw quote vault balance, at `QUOTE_DECIMALS`
    pub fn set_quote_balance(&self, amount: u64) {
        self.ledger
            .set_token_balance(self.quote_vault(), amount, QUOTE_DECIMALS);
    }

    /// Rewrite the seeded market with the program-side lock flag changed
    pub fn set_program_locked(&mut self, locked: bool) {
        self.market.locked = locked;
        self.ledger
            .seed_market(self.market_address, self.program().program_id(), &self.market);
    }

    /// The five token accounts a swap on the seeded market touches
    pub fn swap_token_accounts(&self) -> [TokenAccountSpec; 5] {
        let base = self.program().base_token_program();
        let quote = self.program().quote_token_program();
        let wallet = self.wallet();
        [
            TokenAccountSpec::new(self.market_address, self.market.base_token_mint, base),
            TokenAccountSpec::new(self.market_address, self.market.quote_token_mint, quote),
            TokenAccountSpec::new(wallet, self.market.base_token_mint, base),
            TokenAccountSpec::new(wallet, self.market.quote_token_mint, quote),
            TokenAccountSpec::new(
                self.config.protocol_fee_recipient,
                self.market.quote_token_mint,
                quote,
            ),
        ]
    }

    pub fn seed_swap_token_accounts(&self) {
        for spec in self.swap_token_accounts() {
            self.ledger.touch(spec.address);
        }
    }

    pub fn provisioner(&self) -> AccountProvisioner {
        let executor = TxExecutor::new(
            self.ledger.clone(),
            TxBuilder::new(self.signing.clone(), ComputeBudget::default()),
        );
        AccountProvisioner::new(executor, *self.program())
    }
}

/// Raw amount for `units` whole quote tokens
pub fn quote_units(units: u64) -> u64 {
    units * 10u64.pow(QUOTE_DECIMALS as u32)
}
