//! Read-only views of the launchpad program's accounts
//!
//! Both accounts are Anchor accounts: an 8-byte `sha256("account:<Name>")`
//! prefix followed by the fields in declaration order, little-endian.

use sha2::{Digest, Sha256};
use solana_sdk::pubkey::Pubkey;

use crate::errors::{OrchestratorError, Result};
use crate::ledger::LedgerClient;

/// Anchor account discriminator: sha256("account:<name>")[..8]
pub fn account_discriminator(name: &str) -> [u8; 8] {
    let hash = Sha256::digest(format!("account:{name}").as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&hash[..8]);
    out
}

/// Launchpad-wide configuration (`LaunchpadConfig`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchpadConfig {
    pub authority: Pubkey,
    pub protocol_fee_recipient: Pubkey,
    pub protocol_fee_share: u16,
    pub referral_fee_share: u16,
    pub bump: u8,
}

impl LaunchpadConfig {
    pub const ACCOUNT_NAME: &'static str = "LaunchpadConfig";
    pub const LEN: usize = 8 + 32 + 32 + 2 + 2 + 1;

    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut r = AccountReader::new(Self::ACCOUNT_NAME, data, Self::LEN)?;
        Ok(Self {
            authority: r.pubkey(),
            protocol_fee_recipient: r.pubkey(),
            protocol_fee_share: r.u16(),
            referral_fee_share: r.u16(),
            bump: r.u8(),
        })
    }

    #[cfg(any(test, feature = "test_utils"))]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = account_discriminator(Self::ACCOUNT_NAME).to_vec();
        out.extend_from_slice(self.authority.as_ref());
        out.extend_from_slice(self.protocol_fee_recipient.as_ref());
        out.extend_from_slice(&self.protocol_fee_share.to_le_bytes());
        out.extend_from_slice(&self.referral_fee_share.to_le_bytes());
        out.push(self.bump);
        out
    }
}

/// A launched token market (`Market`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketAccount {
    pub config: Pubkey,
    pub creator: Pubkey,
    pub base_token_mint: Pubkey,
    pub quote_token_mint: Pubkey,
    /// Delegated authority recorded at lock time
    pub swap_authority: Pubkey,
    pub creator_fee_share: u16,
    pub staking_fee_share: u16,
    /// Program-side lock flag; cleared by `free_market`
    pub locked: bool,
    pub bump: u8,
}

impl MarketAccount {
    pub const ACCOUNT_NAME: &'static str = "Market";
    pub const LEN: usize = 8 + 32 * 5 + 2 + 2 + 1 + 1;

    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut r = AccountReader::new(Self::ACCOUNT_NAME, data, Self::LEN)?;
        Ok(Self {
            config: r.pubkey(),
            creator: r.pubkey(),
            base_token_mint: r.pubkey(),
            quote_token_mint: r.pubkey(),
            swap_authority: r.pubkey(),
            creator_fee_share: r.u16(),
            staking_fee_share: r.u16(),
            locked: r.u8() != 0,
            bump: r.u8(),
        })
    }

    #[cfg(any(test, feature = "test_utils"))]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = account_discriminator(Self::ACCOUNT_NAME).to_vec();
        for key in [
            &self.config,
            &self.creator,
            &self.base_token_mint,
            &self.quote_token_mint,
            &self.swap_authority,
        ] {
            out.extend_from_slice(key.as_ref());
        }
        out.extend_from_slice(&self.creator_fee_share.to_le_bytes());
        out.extend_from_slice(&self.staking_fee_share.to_le_bytes());
        out.push(self.locked as u8);
        out.push(self.bump);
        out
    }
}

/// Fetch and decode a market; a missing account is `AccountNotFound`.
pub async fn fetch_market(ledger: &dyn LedgerClient, address: &Pubkey) -> Result<MarketAccount> {
    let account = ledger
        .get_account_info(address)
        .await?
        .ok_or_else(|| OrchestratorError::not_found("market", address))?;
    MarketAccount::decode(&account.data)
}

pub async fn fetch_config(ledger: &dyn LedgerClient, address: &Pubkey) -> Result<LaunchpadConfig> {
    let account = ledger
        .get_account_info(address)
        .await?
        .ok_or_else(|| OrchestratorError::not_found("config", address))?;
    LaunchpadConfig::decode(&account.data)
}

/// Cursor over account data; length and discriminator are checked up front
/// so field reads cannot run past the end.
struct AccountReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> AccountReader<'a> {
    fn new(name: &str, data: &'a [u8], min_len: usize) -> Result<Self> {
        if data.len() < min_len {
            return Err(OrchestratorError::decode(
                name,
                format!("expected at least {min_len} bytes, got {}", data.len()),
            ));
        }
        if data[..8] != account_discriminator(name) {
            return Err(OrchestratorError::decode(name, "discriminator mismatch"));
        }
        Ok(Self { data, offset: 8 })
    }

    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[self.offset..self.offset + N]);
        self.offset += N;
        out
    }

    fn pubkey(&mut self) -> Pubkey {
        Pubkey::new_from_array(self.take::<32>())
    }

    fn u16(&mut self) -> u16 {
        u16::from_le_bytes(self.take::<2>())
    }

    fn u8(&mut self) -> u8 {
        self.take::<1>()[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_market() -> MarketAccount {
        MarketAccount {
            config: Pubkey::new_unique(),
            creator: Pubkey::new_unique(),
            base_token_mint: Pubkey::new_unique(),
            quote_token_mint: Pubkey::new_unique(),
            swap_authority: Pubkey::new_unique(),
            creator_fee_share: 250,
            staking_fee_share: 100,
            locked: true,
            bump: 254,
        }
    }

    #[test]
    fn test_market_decode() {
        let market = sample_market();
        let data = market.encode();
        assert_eq!(data.len(), MarketAccount::LEN);
        assert_eq!(MarketAccount::decode(&data).unwrap(), market);
    }

    #[test]
    fn test_decode_tolerates_trailing_padding() {
        let config = LaunchpadConfig {
            authority: Pubkey::new_unique(),
            protocol_fee_recipient: Pubkey::new_unique(),
            protocol_fee_share: 100,
            referral_fee_share: 50,
            bump: 255,
        };
        let mut data = config.encode();
        data.extend_from_slice(&[0u8; 64]);
        assert_eq!(LaunchpadConfig::decode(&data).unwrap(), config);
    }

    #[test]
    fn test_wrong_discriminator_rejected() {
        let mut data = sample_market().encode();
        data[0] ^= 0xff;
        let err = MarketAccount::decode(&data).unwrap_err();
        assert!(matches!(err, OrchestratorError::AccountDecode { .. }));
    }

    #[test]
    fn test_short_buffer_rejected() {
        let data = sample_market().encode();
        assert!(MarketAccount::decode(&data[..40]).is_err());
        assert!(LaunchpadConfig::decode(&[]).is_err());
    }

    #[test]
    fn test_config_bytes_do_not_decode_as_market() {
        let config = LaunchpadConfig {
            authority: Pubkey::new_unique(),
            protocol_fee_recipient: Pubkey::new_unique(),
            protocol_fee_share: 1,
            referral_fee_share: 1,
            bump: 1,
        };
        let mut data = config.encode();
        data.resize(MarketAccount::LEN, 0);
        assert!(MarketAccount::decode(&data).is_err());
    }
}
