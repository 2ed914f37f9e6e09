//! Launchpad program instruction builders
//!
//! Instruction data is Anchor's layout: `sha256("global:<name>")[..8]`
//! followed by the Borsh-encoded arguments. Account order must match the
//! program's `#[derive(Accounts)]` struct field order.

use sha2::{Digest, Sha256};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_program, sysvar,
};

use crate::pda::{associated_token_address, AddressDeriver};
use crate::types::{SwapParams, TokenProgram};

/// Compute an Anchor instruction discriminator: sha256("global:<name>")[..8].
pub fn instruction_discriminator(name: &str) -> [u8; 8] {
    let hash = Sha256::digest(format!("global:{name}").as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&hash[..8]);
    out
}

/// Borsh argument writer, seeded with the instruction discriminator
struct ArgWriter {
    data: Vec<u8>,
}

impl ArgWriter {
    fn new(ix_name: &str) -> Self {
        Self {
            data: instruction_discriminator(ix_name).to_vec(),
        }
    }

    fn u8(mut self, v: u8) -> Self {
        self.data.push(v);
        self
    }

    fn u16(mut self, v: u16) -> Self {
        self.data.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn u64(mut self, v: u64) -> Self {
        self.data.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn i64(mut self, v: i64) -> Self {
        self.data.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn pubkey(mut self, v: &Pubkey) -> Self {
        self.data.extend_from_slice(v.as_ref());
        self
    }

    // String => (u32 len + utf8 bytes)
    fn string(mut self, v: &str) -> Self {
        self.data.extend_from_slice(&(v.len() as u32).to_le_bytes());
        self.data.extend_from_slice(v.as_bytes());
        self
    }

    // Option<i64> => 0 | 1 + value
    fn option_i64(self, v: Option<i64>) -> Self {
        match v {
            Some(v) => self.u8(1).i64(v),
            None => self.u8(0),
        }
    }

    fn finish(self) -> Vec<u8> {
        self.data
    }
}

/// Arguments of `create_market`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateMarketArgs {
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub total_supply: u64,
    pub creator_fee_share: u16,
    pub staking_fee_share: u16,
}

/// Arguments of `create_vesting`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateVestingArgs {
    pub amount: u64,
    pub duration: i64,
    pub cliff_duration: Option<i64>,
}

/// Accounts of a `permissioned_swap`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapAccounts {
    pub user: Pubkey,
    /// Wallet itself on a free market, the delegated authority on a locked one
    pub swap_authority: Pubkey,
    /// Present only while the market is locked
    pub swap_authority_badge: Option<Pubkey>,
    pub config: Pubkey,
    pub market: Pubkey,
    pub base_mint: Pubkey,
    pub quote_mint: Pubkey,
    pub market_base_vault: Pubkey,
    pub market_quote_vault: Pubkey,
    pub user_base: Pubkey,
    pub user_quote: Pubkey,
    pub protocol_fee_quote: Pubkey,
}

/// Instruction factory for one deployment of the launchpad program
#[derive(Debug, Clone, Copy)]
pub struct LaunchpadProgram {
    deriver: AddressDeriver,
    base_token_program: TokenProgram,
    quote_token_program: TokenProgram,
}

impl LaunchpadProgram {
    pub fn new(
        deriver: AddressDeriver,
        base_token_program: TokenProgram,
        quote_token_program: TokenProgram,
    ) -> Self {
        Self {
            deriver,
            base_token_program,
            quote_token_program,
        }
    }

    pub fn program_id(&self) -> Pubkey {
        self.deriver.program_id()
    }

    pub fn deriver(&self) -> &AddressDeriver {
        &self.deriver
    }

    pub fn base_token_program(&self) -> TokenProgram {
        self.base_token_program
    }

    pub fn quote_token_program(&self) -> TokenProgram {
        self.quote_token_program
    }

    pub fn market_base_vault(&self, market: &Pubkey, base_mint: &Pubkey) -> Pubkey {
        associated_token_address(market, base_mint, self.base_token_program)
    }

    pub fn market_quote_vault(&self, market: &Pubkey, quote_mint: &Pubkey) -> Pubkey {
        associated_token_address(market, quote_mint, self.quote_token_program)
    }

    pub fn staking_vault(&self, staking: &Pubkey, base_mint: &Pubkey) -> Pubkey {
        associated_token_address(staking, base_mint, self.base_token_program)
    }

    fn instruction(&self, accounts: Vec<AccountMeta>, data: Vec<u8>) -> Instruction {
        Instruction {
            program_id: self.program_id(),
            accounts,
            data,
        }
    }

    pub fn create_config(
        &self,
        authority: &Pubkey,
        protocol_fee_recipient: &Pubkey,
        protocol_fee_share: u16,
        referral_fee_share: u16,
    ) -> Instruction {
        let (config, _) = self.deriver.config();
        let accounts = vec![
            AccountMeta::new(*authority, true),
            AccountMeta::new(config, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ];
        let data = ArgWriter::new("create_config")
            .pubkey(protocol_fee_recipient)
            .u16(protocol_fee_share)
            .u16(referral_fee_share)
            .finish();
        self.instruction(accounts, data)
    }

    pub fn create_quote_token_badge(
        &self,
        authority: &Pubkey,
        config: &Pubkey,
        quote_mint: &Pubkey,
    ) -> Instruction {
        let (badge, _) = self.deriver.quote_token_badge(config, quote_mint);
        let accounts = vec![
            AccountMeta::new(*authority, true),
            AccountMeta::new_readonly(*config, false),
            AccountMeta::new_readonly(*quote_mint, false),
            AccountMeta::new(badge, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ];
        self.instruction(accounts, ArgWriter::new("create_quote_token_badge").finish())
    }

    /// `base_mint` is a fresh keypair and must co-sign.
    pub fn create_market(
        &self,
        creator: &Pubkey,
        config: &Pubkey,
        quote_mint: &Pubkey,
        base_mint: &Pubkey,
        args: &CreateMarketArgs,
    ) -> Instruction {
        let (market, _) = self.deriver.market(base_mint);
        let (quote_token_badge, _) = self.deriver.quote_token_badge(config, quote_mint);
        let (metadata, _) = self.deriver.token_metadata(base_mint);
        let accounts = vec![
            AccountMeta::new(*creator, true),
            AccountMeta::new_readonly(*config, false),
            AccountMeta::new_readonly(quote_token_badge, false),
            AccountMeta::new_readonly(*quote_mint, false),
            AccountMeta::new(*base_mint, true),
            AccountMeta::new(market, false),
            AccountMeta::new(self.market_base_vault(&market, base_mint), false),
            AccountMeta::new(self.market_quote_vault(&market, quote_mint), false),
            AccountMeta::new(metadata, false),
            AccountMeta::new_readonly(self.deriver.metadata_program_id(), false),
            AccountMeta::new_readonly(self.base_token_program.id(), false),
            AccountMeta::new_readonly(self.quote_token_program.id(), false),
            AccountMeta::new_readonly(spl_associated_token_account::id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
            AccountMeta::new_readonly(sysvar::rent::id(), false),
        ];
        let data = ArgWriter::new("create_market")
            .string(&args.name)
            .string(&args.symbol)
            .string(&args.uri)
            .u64(args.total_supply)
            .u16(args.creator_fee_share)
            .u16(args.staking_fee_share)
            .finish();
        self.instruction(accounts, data)
    }

    /// Record `swap_authority` as the only party allowed to swap until the market is freed.
    pub fn lock_market(
        &self,
        creator: &Pubkey,
        config: &Pubkey,
        market: &Pubkey,
        swap_authority: &Pubkey,
    ) -> Instruction {
        let (badge, _) = self.deriver.swap_authority_badge(market, swap_authority);
        let accounts = vec![
            AccountMeta::new(*creator, true),
            AccountMeta::new_readonly(*config, false),
            AccountMeta::new(*market, false),
            AccountMeta::new_readonly(*swap_authority, false),
            AccountMeta::new(badge, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ];
        self.instruction(accounts, ArgWriter::new("lock_market").finish())
    }

    pub fn free_market(
        &self,
        payer: &Pubkey,
        market: &Pubkey,
        quote_mint: &Pubkey,
        locked_authority: &Pubkey,
    ) -> Instruction {
        let (badge, _) = self.deriver.swap_authority_badge(market, locked_authority);
        let accounts = vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new(*market, false),
            AccountMeta::new_readonly(self.market_quote_vault(market, quote_mint), false),
            AccountMeta::new(badge, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ];
        self.instruction(accounts, ArgWriter::new("free_market").finish())
    }

    pub fn activate_staking(
        &self,
        payer: &Pubkey,
        market: &Pubkey,
        base_mint: &Pubkey,
    ) -> Instruction {
        let (staking, _) = self.deriver.market_staking(market);
        let accounts = vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new_readonly(*market, false),
            AccountMeta::new_readonly(*base_mint, false),
            AccountMeta::new(staking, false),
            AccountMeta::new(self.staking_vault(&staking, base_mint), false),
            AccountMeta::new_readonly(self.base_token_program.id(), false),
            AccountMeta::new_readonly(spl_associated_token_account::id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
        ];
        self.instruction(accounts, ArgWriter::new("activate_staking").finish())
    }

    pub fn create_stake_position(
        &self,
        payer: &Pubkey,
        market: &Pubkey,
        owner: &Pubkey,
    ) -> Instruction {
        let (staking, _) = self.deriver.market_staking(market);
        let (position, _) = self.deriver.stake_position(market, owner);
        let accounts = vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new_readonly(*owner, false),
            AccountMeta::new_readonly(*market, false),
            AccountMeta::new_readonly(staking, false),
            AccountMeta::new(position, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ];
        self.instruction(accounts, ArgWriter::new("create_stake_position").finish())
    }

    pub fn stake(
        &self,
        owner: &Pubkey,
        market: &Pubkey,
        base_mint: &Pubkey,
        amount: u64,
        lockup_period: Option<i64>,
    ) -> Instruction {
        let (staking, _) = self.deriver.market_staking(market);
        let (position, _) = self.deriver.stake_position(market, owner);
        let accounts = vec![
            AccountMeta::new(*owner, true),
            AccountMeta::new_readonly(*market, false),
            AccountMeta::new(staking, false),
            AccountMeta::new(position, false),
            AccountMeta::new_readonly(*base_mint, false),
            AccountMeta::new(
                associated_token_address(owner, base_mint, self.base_token_program),
                false,
            ),
            AccountMeta::new(self.staking_vault(&staking, base_mint), false),
            AccountMeta::new_readonly(self.base_token_program.id(), false),
        ];
        let data = ArgWriter::new("stake")
            .u64(amount)
            .option_i64(lockup_period)
            .finish();
        self.instruction(accounts, data)
    }

    pub fn create_vesting(
        &self,
        creator: &Pubkey,
        market: &Pubkey,
        base_mint: &Pubkey,
        recipient: &Pubkey,
        args: &CreateVestingArgs,
    ) -> Instruction {
        let (staking, _) = self.deriver.market_staking(market);
        let (position, _) = self.deriver.stake_position(market, recipient);
        let (vesting_plan, _) = self.deriver.vesting_plan(market, recipient);
        let accounts = vec![
            AccountMeta::new(*creator, true),
            AccountMeta::new_readonly(*recipient, false),
            AccountMeta::new_readonly(*market, false),
            AccountMeta::new(staking, false),
            AccountMeta::new(position, false),
            AccountMeta::new(vesting_plan, false),
            AccountMeta::new_readonly(*base_mint, false),
            AccountMeta::new(
                associated_token_address(creator, base_mint, self.base_token_program),
                false,
            ),
            AccountMeta::new(self.staking_vault(&staking, base_mint), false),
            AccountMeta::new_readonly(self.base_token_program.id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
        ];
        let data = ArgWriter::new("create_vesting")
            .u64(args.amount)
            .i64(args.duration)
            .option_i64(args.cliff_duration)
            .finish();
        self.instruction(accounts, data)
    }

    pub fn release_vesting(
        &self,
        payer: &Pubkey,
        market: &Pubkey,
        staking: &Pubkey,
        stake_position: &Pubkey,
        vesting_plan: &Pubkey,
        base_mint: &Pubkey,
    ) -> Instruction {
        let accounts = vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new_readonly(*market, false),
            AccountMeta::new(*staking, false),
            AccountMeta::new(*stake_position, false),
            AccountMeta::new(*vesting_plan, false),
            AccountMeta::new_readonly(*base_mint, false),
            AccountMeta::new(self.staking_vault(staking, base_mint), false),
            AccountMeta::new_readonly(self.base_token_program.id(), false),
        ];
        self.instruction(accounts, ArgWriter::new("release_vesting").finish())
    }

    /// `action` and `trade_type` are unit enums on the program side, so each
    /// encodes as its bare variant index.
    pub fn permissioned_swap(&self, accs: &SwapAccounts, params: &SwapParams) -> Instruction {
        // Anchor passes the program id in place of an absent Option<Account>
        let badge = accs.swap_authority_badge.unwrap_or_else(|| self.program_id());
        let accounts = vec![
            AccountMeta::new(accs.user, true),
            AccountMeta::new_readonly(accs.swap_authority, true),
            AccountMeta::new_readonly(badge, false),
            AccountMeta::new_readonly(accs.config, false),
            AccountMeta::new(accs.market, false),
            AccountMeta::new_readonly(accs.base_mint, false),
            AccountMeta::new_readonly(accs.quote_mint, false),
            AccountMeta::new(accs.market_base_vault, false),
            AccountMeta::new(accs.market_quote_vault, false),
            AccountMeta::new(accs.user_base, false),
            AccountMeta::new(accs.user_quote, false),
            AccountMeta::new(accs.protocol_fee_quote, false),
            AccountMeta::new_readonly(self.base_token_program.id(), false),
            AccountMeta::new_readonly(self.quote_token_program.id(), false),
        ];
        let data = ArgWriter::new("permissioned_swap")
            .u8(params.action.variant_index())
            .u8(params.trade_type.variant_index())
            .u64(params.amount)
            .u64(params.other_amount_threshold)
            .finish();
        self.instruction(accounts, data)
    }
}
