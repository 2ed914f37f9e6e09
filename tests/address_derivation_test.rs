//! Integration tests for launchpad address derivation
//!
//! Addresses must be stable across calls and distinct across entities,
//! otherwise check-then-create provisioning would look in the wrong place.

use launchpad_orchestrator::pda::{associated_token_address, AddressDeriver, SeedSpec, MARKET_SEED};
use launchpad_orchestrator::types::TokenProgram;
use solana_sdk::pubkey::Pubkey;

#[test]
fn test_derivation_is_deterministic() {
    let program_id = Pubkey::new_unique();
    let a = AddressDeriver::new(program_id);
    let b = AddressDeriver::new(program_id);
    let mint = Pubkey::new_unique();

    assert_eq!(a.config(), b.config());
    assert_eq!(a.market(&mint), b.market(&mint));
    assert_eq!(a.market_staking(&mint), b.market_staking(&mint));
}

#[test]
fn test_market_matches_seed_spec() {
    let program_id = Pubkey::new_unique();
    let deriver = AddressDeriver::new(program_id);
    let mint = Pubkey::new_unique();

    let expected = SeedSpec::tagged(MARKET_SEED).with_key(&mint).derive(&program_id);
    assert_eq!(deriver.market(&mint), expected);
    assert_eq!(
        Pubkey::find_program_address(&[MARKET_SEED, mint.as_ref()], &program_id),
        expected
    );
}

#[test]
fn test_per_user_accounts_differ() {
    let deriver = AddressDeriver::new(Pubkey::new_unique());
    let market = Pubkey::new_unique();
    let alice = Pubkey::new_unique();
    let bob = Pubkey::new_unique();

    assert_ne!(
        deriver.stake_position(&market, &alice).0,
        deriver.stake_position(&market, &bob).0
    );
    assert_ne!(
        deriver.vesting_plan(&market, &alice).0,
        deriver.stake_position(&market, &alice).0
    );
    assert_ne!(
        deriver.swap_authority_badge(&market, &alice).0,
        deriver.swap_authority_badge(&market, &bob).0
    );
}

#[test]
fn test_program_id_scopes_addresses() {
    let mint = Pubkey::new_unique();
    let a = AddressDeriver::new(Pubkey::new_unique());
    let b = AddressDeriver::new(Pubkey::new_unique());
    assert_ne!(a.market(&mint).0, b.market(&mint).0);
    assert_ne!(a.config().0, b.config().0);
}

#[test]
fn test_token_program_changes_ata() {
    let owner = Pubkey::new_unique();
    let mint = Pubkey::new_unique();
    let legacy = associated_token_address(&owner, &mint, TokenProgram::Legacy);
    let extended = associated_token_address(&owner, &mint, TokenProgram::Extended);

    assert_ne!(legacy, extended);
    assert_eq!(
        legacy,
        spl_associated_token_account::get_associated_token_address(&owner, &mint)
    );
}
