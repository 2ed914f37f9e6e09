//! Signing identities
//!
//! The backend signs with two keypairs: the wallet (fee payer and trader) and
//! the delegated swap authority that co-signs swaps on locked markets. Both
//! are loaded once at startup into a [`SigningContext`] that is passed into the
//! engine explicitly and never mutated.

use anyhow::{Context, Result};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use std::path::Path;
use std::sync::Arc;

/// Read a keypair file: the CLI JSON array format, a base58 secret key
/// (wallet export format), or raw 64 bytes.
pub fn load_keypair(path: impl AsRef<Path>) -> Result<Keypair> {
    let path = path.as_ref();
    let keypair_bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read keypair file: {}", path.display()))?;

    let raw = if keypair_bytes.len() == 64 {
        keypair_bytes
    } else if keypair_bytes.trim_ascii_start().starts_with(b"[") {
        serde_json::from_slice::<Vec<u8>>(&keypair_bytes)
            .with_context(|| format!("Failed to parse keypair JSON: {}", path.display()))?
    } else {
        let text = std::str::from_utf8(&keypair_bytes)
            .with_context(|| format!("Keypair file is not text: {}", path.display()))?;
        bs58::decode(text.trim())
            .into_vec()
            .with_context(|| format!("Failed to decode base58 keypair: {}", path.display()))?
    };
    if raw.len() != 64 {
        anyhow::bail!("Invalid keypair length: expected 64 bytes, got {}", raw.len());
    }

    if raw.iter().all(|&b| b == 0) {
        anyhow::bail!("Invalid keypair: all-zero key rejected");
    }
    Keypair::try_from(raw.as_slice()).context("Invalid keypair bytes")
}

/// Wallet plus delegated swap authority
#[derive(Clone)]
pub struct SigningContext {
    wallet: Arc<Keypair>,
    swap_authority: Arc<Keypair>,
}

impl SigningContext {
    pub fn new(wallet: Keypair, swap_authority: Keypair) -> Self {
        Self {
            wallet: Arc::new(wallet),
            swap_authority: Arc::new(swap_authority),
        }
    }

    pub fn from_files(wallet_path: &str, swap_authority_path: &str) -> Result<Self> {
        let wallet = load_keypair(wallet_path).context("Failed to load wallet")?;
        let swap_authority =
            load_keypair(swap_authority_path).context("Failed to load swap authority")?;
        Ok(Self::new(wallet, swap_authority))
    }

    /// Fee payer and trading identity
    pub fn wallet_pubkey(&self) -> Pubkey {
        self.wallet.pubkey()
    }

    pub fn swap_authority_pubkey(&self) -> Pubkey {
        self.swap_authority.pubkey()
    }

    /// Keypair for a long-lived signer, if this context holds it
    pub fn keypair_for(&self, pubkey: &Pubkey) -> Option<&Keypair> {
        if *pubkey == self.wallet.pubkey() {
            Some(&self.wallet)
        } else if *pubkey == self.swap_authority.pubkey() {
            Some(&self.swap_authority)
        } else {
            None
        }
    }
}

impl std::fmt::Debug for SigningContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningContext")
            .field("wallet", &self.wallet.pubkey())
            .field("swap_authority", &self.swap_authority.pubkey())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_json_keypair() {
        let kp = Keypair::new();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let json = serde_json::to_string(&kp.to_bytes().to_vec()).unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let loaded = load_keypair(file.path()).unwrap();
        assert_eq!(loaded.pubkey(), kp.pubkey());
    }

    #[test]
    fn test_load_raw_keypair() {
        let kp = Keypair::new();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&kp.to_bytes()).unwrap();

        let loaded = load_keypair(file.path()).unwrap();
        assert_eq!(loaded.pubkey(), kp.pubkey());
    }

    #[test]
    fn test_load_base58_keypair() {
        let kp = Keypair::new();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", bs58::encode(kp.to_bytes()).into_string()).unwrap();

        let loaded = load_keypair(file.path()).unwrap();
        assert_eq!(loaded.pubkey(), kp.pubkey());
    }

    #[test]
    fn test_reject_zero_and_short_keys() {
        let mut zero = tempfile::NamedTempFile::new().unwrap();
        zero.write_all(&[0u8; 64]).unwrap();
        assert!(load_keypair(zero.path()).is_err());

        let mut short = tempfile::NamedTempFile::new().unwrap();
        short.write_all(b"[1,2,3]").unwrap();
        assert!(load_keypair(short.path()).is_err());

        assert!(load_keypair("/nonexistent/keypair.json").is_err());
    }

    #[test]
    fn test_keypair_lookup() {
        let ctx = SigningContext::new(Keypair::new(), Keypair::new());
        assert!(ctx.keypair_for(&ctx.wallet_pubkey()).is_some());
        assert!(ctx.keypair_for(&ctx.swap_authority_pubkey()).is_some());
        assert!(ctx.keypair_for(&Pubkey::new_unique()).is_none());
        assert_ne!(ctx.wallet_pubkey(), ctx.swap_authority_pubkey());
    }
}
