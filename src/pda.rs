//! Program-derived addresses for the launchpad program
//!
//! Every account the orchestrator touches is addressed deterministically from a
//! literal seed tag plus entity keys. The tags and their ordering must match the
//! program's `#[account(seeds = ...)]` declarations byte for byte.

use solana_sdk::pubkey::Pubkey;
use spl_associated_token_account::get_associated_token_address_with_program_id;

use crate::types::TokenProgram;

pub const CONFIG_SEED: &[u8] = b"config";
pub const QUOTE_TOKEN_BADGE_SEED: &[u8] = b"quote_token_badge";
pub const MARKET_SEED: &[u8] = b"market";
pub const METADATA_SEED: &[u8] = b"metadata";
pub const SWAP_AUTHORITY_SEED: &[u8] = b"swap_authority";
pub const MARKET_STAKING_SEED: &[u8] = b"market_staking";
pub const STAKE_POSITION_SEED: &[u8] = b"stake_position";
pub const VESTING_PLAN_SEED: &[u8] = b"vesting_plan";

/// Metaplex token metadata program
pub const METADATA_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s");

/// Ordered seed list for one derived account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedSpec {
    seeds: Vec<Vec<u8>>,
}

impl SeedSpec {
    /// Start a seed list with its literal tag
    pub fn tagged(tag: &[u8]) -> Self {
        Self {
            seeds: vec![tag.to_vec()],
        }
    }

    /// Append an entity key
    pub fn with_key(mut self, key: &Pubkey) -> Self {
        self.seeds.push(key.to_bytes().to_vec());
        self
    }

    pub fn seeds(&self) -> Vec<&[u8]> {
        self.seeds.iter().map(Vec::as_slice).collect()
    }

    /// Find the canonical `(address, bump)` under `program_id`.
    pub fn derive(&self, program_id: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(&self.seeds(), program_id)
    }
}

/// Address derivation bound to one deployed program id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressDeriver {
    program_id: Pubkey,
    metadata_program_id: Pubkey,
}

impl AddressDeriver {
    pub fn new(program_id: Pubkey) -> Self {
        Self {
            program_id,
            metadata_program_id: METADATA_PROGRAM_ID,
        }
    }

    pub fn with_metadata_program(mut self, metadata_program_id: Pubkey) -> Self {
        self.metadata_program_id = metadata_program_id;
        self
    }

    pub fn program_id(&self) -> Pubkey {
        self.program_id
    }

    pub fn metadata_program_id(&self) -> Pubkey {
        self.metadata_program_id
    }

    /// Process-wide configuration singleton
    pub fn config(&self) -> (Pubkey, u8) {
        SeedSpec::tagged(CONFIG_SEED).derive(&self.program_id)
    }

    pub fn quote_token_badge(&self, config: &Pubkey, quote_mint: &Pubkey) -> (Pubkey, u8) {
        SeedSpec::tagged(QUOTE_TOKEN_BADGE_SEED)
            .with_key(config)
            .with_key(quote_mint)
            .derive(&self.program_id)
    }

    pub fn market(&self, base_mint: &Pubkey) -> (Pubkey, u8) {
        SeedSpec::tagged(MARKET_SEED)
            .with_key(base_mint)
            .derive(&self.program_id)
    }

    /// Metaplex metadata account; owned by the metadata program, not the launchpad.
    pub fn token_metadata(&self, base_mint: &Pubkey) -> (Pubkey, u8) {
        SeedSpec::tagged(METADATA_SEED)
            .with_key(&self.metadata_program_id)
            .with_key(base_mint)
            .derive(&self.metadata_program_id)
    }

    pub fn swap_authority_badge(&self, market: &Pubkey, authority: &Pubkey) -> (Pubkey, u8) {
        SeedSpec::tagged(SWAP_AUTHORITY_SEED)
            .with_key(market)
            .with_key(authority)
            .derive(&self.program_id)
    }

    pub fn market_staking(&self, market: &Pubkey) -> (Pubkey, u8) {
        SeedSpec::tagged(MARKET_STAKING_SEED)
            .with_key(market)
            .derive(&self.program_id)
    }

    pub fn stake_position(&self, market: &Pubkey, user: &Pubkey) -> (Pubkey, u8) {
        SeedSpec::tagged(STAKE_POSITION_SEED)
            .with_key(market)
            .with_key(user)
            .derive(&self.program_id)
    }

    pub fn vesting_plan(&self, market: &Pubkey, recipient: &Pubkey) -> (Pubkey, u8) {
        SeedSpec::tagged(VESTING_PLAN_SEED)
            .with_key(market)
            .with_key(recipient)
            .derive(&self.program_id)
    }
}

/// Associated token account of `owner` for `mint` under the given token program.
///
/// Works for off-curve owners (market and staking PDAs hold vaults this way).
pub fn associated_token_address(owner: &Pubkey, mint: &Pubkey, program: TokenProgram) -> Pubkey {
    get_associated_token_address_with_program_id(owner, mint, &program.id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn deriver() -> AddressDeriver {
        AddressDeriver::new(Pubkey::new_from_array([7u8; 32]))
    }

    #[test]
    fn test_seed_order_matters() {
        let d = deriver();
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        assert_ne!(d.stake_position(&a, &b), d.stake_position(&b, &a));
        assert_ne!(d.swap_authority_badge(&a, &b), d.swap_authority_badge(&b, &a));
    }

    #[test]
    fn test_tags_are_distinct() {
        let d = deriver();
        let market = Pubkey::new_unique();
        let user = Pubkey::new_unique();
        // same entity keys, different tags
        assert_ne!(d.stake_position(&market, &user), d.vesting_plan(&market, &user));
        assert_ne!(
            d.stake_position(&market, &user),
            d.swap_authority_badge(&market, &user)
        );
        assert_ne!(d.market(&market), d.market_staking(&market));
    }

    #[test]
    fn test_matches_raw_find_program_address() {
        let d = deriver();
        let mint = Pubkey::new_unique();
        let expected = Pubkey::find_program_address(&[b"market", mint.as_ref()], &d.program_id());
        assert_eq!(d.market(&mint), expected);

        let expected = Pubkey::find_program_address(&[b"config"], &d.program_id());
        assert_eq!(d.config(), expected);
    }

    #[test]
    fn test_metadata_derived_under_metadata_program() {
        let d = deriver();
        let mint = Pubkey::new_unique();
        let expected = Pubkey::find_program_address(
            &[b"metadata", METADATA_PROGRAM_ID.as_ref(), mint.as_ref()],
            &METADATA_PROGRAM_ID,
        );
        assert_eq!(d.token_metadata(&mint), expected);
    }

    #[test]
    fn test_program_id_changes_address() {
        let mint = Pubkey::new_unique();
        let other = AddressDeriver::new(Pubkey::new_from_array([8u8; 32]));
        assert_ne!(deriver().market(&mint), other.market(&mint));
    }

    #[test]
    fn test_associated_token_address_per_program() {
        let owner = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        assert_ne!(
            associated_token_address(&owner, &mint, TokenProgram::Legacy),
            associated_token_address(&owner, &mint, TokenProgram::Extended)
        );
        assert_eq!(
            associated_token_address(&owner, &mint, TokenProgram::Legacy),
            spl_associated_token_account::get_associated_token_address(&owner, &mint)
        );
    }

    proptest! {
        #[test]
        fn prop_derivation_is_deterministic(
            market in any::<[u8; 32]>(),
            user in any::<[u8; 32]>()
        ) {
            let d = deriver();
            let market = Pubkey::new_from_array(market);
            let user = Pubkey::new_from_array(user);
            prop_assert_eq!(d.stake_position(&market, &user), d.stake_position(&market, &user));
            prop_assert_eq!(
                d.swap_authority_badge(&market, &user),
                AddressDeriver::new(d.program_id()).swap_authority_badge(&market, &user)
            );
        }
    }
}
