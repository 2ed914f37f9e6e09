//! Core TxBuilder implementation
//!
//! Compiles a [`PreparedTransaction`] into a v0 message against a blockhash
//! and signs it with the keypairs the message requires: long-lived ones from
//! the [`SigningContext`], one-shot ones carried by the plan itself.

use solana_sdk::{
    hash::Hash,
    message::{v0::Message as MessageV0, VersionedMessage},
    signature::Keypair,
    transaction::VersionedTransaction,
};
use tracing::debug;

use super::instructions::{plan_instructions, sanity_check_ix_order};
use super::output::{PreparedTransaction, TxBuildOutput};
use crate::errors::{OrchestratorError, Result};
use crate::wallet::SigningContext;

/// Compute budget applied to every transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComputeBudget {
    /// 0 leaves the runtime default
    pub unit_limit: u32,
    /// Micro-lamports per CU; 0 sends no price instruction
    pub unit_price: u64,
}

impl Default for ComputeBudget {
    fn default() -> Self {
        Self {
            unit_limit: 400_000,
            unit_price: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TxBuilder {
    signing: SigningContext,
    budget: ComputeBudget,
}

impl TxBuilder {
    pub fn new(signing: SigningContext, budget: ComputeBudget) -> Self {
        Self { signing, budget }
    }

    pub fn signing(&self) -> &SigningContext {
        &self.signing
    }

    /// Compile and sign `prepared` against `blockhash`.
    ///
    /// # Errors
    ///
    /// `InstructionBuild` when the plan is empty or fails to compile,
    /// `Signing` when a required signer has no keypair available.
    pub fn build(&self, prepared: &PreparedTransaction, blockhash: Hash) -> Result<TxBuildOutput> {
        let instructions = plan_instructions(
            self.budget.unit_limit,
            self.budget.unit_price,
            prepared.instructions.clone(),
        )?;
        sanity_check_ix_order(&instructions)?;

        let message = MessageV0::try_compile(&prepared.payer, &instructions, &[], blockhash)
            .map_err(|e| {
                OrchestratorError::instruction_failed(prepared.label.as_str(), e.to_string())
            })?;

        let mut signers: Vec<&Keypair> = Vec::new();
        for pubkey in prepared.required_signers() {
            let keypair = self
                .signing
                .keypair_for(&pubkey)
                .or_else(|| prepared.ephemeral_signer(&pubkey))
                .ok_or_else(|| {
                    OrchestratorError::Signing(format!(
                        "{}: no keypair for required signer {}",
                        prepared.label, pubkey
                    ))
                })?;
            signers.push(keypair);
        }

        let tx = VersionedTransaction::try_new(VersionedMessage::V0(message), signers.as_slice())
            .map_err(|e| OrchestratorError::Signing(format!("{}: {}", prepared.label, e)))?;

        debug!(
            label = %prepared.label,
            instructions = instructions.len(),
            signers = signers.len(),
            "Transaction built"
        );
        Ok(TxBuildOutput::new(prepared.label.as_str(), tx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::{
        instruction::{AccountMeta, Instruction},
        pubkey::Pubkey,
        signature::Signer,
    };
    use std::sync::Arc;

    fn builder() -> TxBuilder {
        TxBuilder::new(
            SigningContext::new(Keypair::new(), Keypair::new()),
            ComputeBudget::default(),
        )
    }

    fn ix(signers: &[Pubkey]) -> Instruction {
        let mut accounts: Vec<AccountMeta> =
            signers.iter().map(|k| AccountMeta::new(*k, true)).collect();
        accounts.push(AccountMeta::new(Pubkey::new_unique(), false));
        Instruction::new_with_bytes(Pubkey::new_unique(), &[7], accounts)
    }

    #[test]
    fn test_build_wallet_only() {
        let b = builder();
        let wallet = b.signing().wallet_pubkey();
        let prepared = PreparedTransaction::new("swap", wallet, vec![ix(&[wallet])]);
        let out = b.build(&prepared, Hash::new_unique()).unwrap();

        assert_eq!(out.required_signers(), &[wallet]);
        assert_eq!(out.tx.signatures.len(), 1);
        // compute limit only; price is 0
        assert_eq!(out.tx.message.instructions().len(), 2);
    }

    #[test]
    fn test_build_with_swap_authority_and_ephemeral() {
        let b = builder();
        let wallet = b.signing().wallet_pubkey();
        let authority = b.signing().swap_authority_pubkey();
        let mint = Arc::new(Keypair::new());
        let prepared = PreparedTransaction::new(
            "create_market",
            wallet,
            vec![ix(&[wallet, authority, mint.pubkey()])],
        )
        .with_signer(mint.clone());

        let out = b.build(&prepared, Hash::new_unique()).unwrap();
        assert_eq!(out.required_signers().len(), 3);
        assert!(out.required_signers().contains(&mint.pubkey()));
        assert!(out.tx.verify_with_results().iter().all(|ok| *ok));
    }

    #[test]
    fn test_missing_signer_is_signing_error() {
        let b = builder();
        let wallet = b.signing().wallet_pubkey();
        let stranger = Pubkey::new_unique();
        let prepared = PreparedTransaction::new("stake", wallet, vec![ix(&[wallet, stranger])]);

        let err = b.build(&prepared, Hash::new_unique()).unwrap_err();
        assert!(matches!(err, OrchestratorError::Signing(_)));
        assert!(err.to_string().contains(&stranger.to_string()));
    }

    #[test]
    fn test_empty_plan_rejected() {
        let b = builder();
        let prepared = PreparedTransaction::new("noop", b.signing().wallet_pubkey(), vec![]);
        let err = b.build(&prepared, Hash::new_unique()).unwrap_err();
        assert!(matches!(err, OrchestratorError::InstructionBuild { .. }));
    }
}
