//! Transaction plans and build output
//!
//! A [`PreparedTransaction`] is everything needed to compile one transaction
//! except the blockhash: payer, program instructions, and any one-shot
//! keypairs (e.g. a fresh mint) that must co-sign. The builder turns it into
//! a [`TxBuildOutput`] holding the signed `VersionedTransaction`.

use solana_sdk::{
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::VersionedTransaction,
};
use std::sync::Arc;

/// One transaction worth of program instructions, not yet compiled
#[derive(Clone)]
pub struct PreparedTransaction {
    /// Short operation name for logs (e.g. "create_market")
    pub label: String,
    pub payer: Pubkey,
    pub instructions: Vec<Instruction>,
    /// Signers that live only for this transaction
    pub ephemeral_signers: Vec<Arc<Keypair>>,
}

impl PreparedTransaction {
    pub fn new(label: impl Into<String>, payer: Pubkey, instructions: Vec<Instruction>) -> Self {
        Self {
            label: label.into(),
            payer,
            instructions,
            ephemeral_signers: Vec::new(),
        }
    }

    pub fn with_signer(mut self, signer: Arc<Keypair>) -> Self {
        self.ephemeral_signers.push(signer);
        self
    }

    /// Prepend instructions, e.g. account provisioning folded into a simulation
    pub fn prepend(mut self, mut instructions: Vec<Instruction>) -> Self {
        instructions.append(&mut self.instructions);
        self.instructions = instructions;
        self
    }

    /// Payer first, then every signer account in instruction order, deduplicated
    pub fn required_signers(&self) -> Vec<Pubkey> {
        let mut signers = vec![self.payer];
        for meta in self.instructions.iter().flat_map(|ix| ix.accounts.iter()) {
            if meta.is_signer && !signers.contains(&meta.pubkey) {
                signers.push(meta.pubkey);
            }
        }
        signers
    }

    pub fn ephemeral_signer(&self, pubkey: &Pubkey) -> Option<&Keypair> {
        self.ephemeral_signers
            .iter()
            .find(|kp| kp.pubkey() == *pubkey)
            .map(Arc::as_ref)
    }
}

impl std::fmt::Debug for PreparedTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedTransaction")
            .field("label", &self.label)
            .field("payer", &self.payer)
            .field("instructions", &self.instructions.len())
            .field(
                "ephemeral_signers",
                &self
                    .ephemeral_signers
                    .iter()
                    .map(|kp| kp.pubkey())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Signed transaction ready for broadcast or simulation
#[derive(Debug, Clone)]
pub struct TxBuildOutput {
    pub label: String,
    pub tx: VersionedTransaction,
    /// Extracted from `message.header.num_required_signatures`
    pub required_signers: Vec<Pubkey>,
}

impl TxBuildOutput {
    pub fn new(label: impl Into<String>, tx: VersionedTransaction) -> Self {
        let num_signers = tx.message.header().num_required_signatures as usize;
        let keys = tx.message.static_account_keys();
        let required_signers = keys[..num_signers.min(keys.len())].to_vec();
        Self {
            label: label.into(),
            tx,
            required_signers,
        }
    }

    pub fn required_signers(&self) -> &[Pubkey] {
        &self.required_signers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::instruction::AccountMeta;

    #[test]
    fn test_required_signers_dedup_and_order() {
        let payer = Pubkey::new_unique();
        let co_signer = Pubkey::new_unique();
        let program = Pubkey::new_unique();
        let ixs = vec![
            Instruction::new_with_bytes(
                program,
                &[0],
                vec![
                    AccountMeta::new(payer, true),
                    AccountMeta::new_readonly(co_signer, true),
                    AccountMeta::new(Pubkey::new_unique(), false),
                ],
            ),
            Instruction::new_with_bytes(program, &[1], vec![AccountMeta::new(co_signer, true)]),
        ];
        let prepared = PreparedTransaction::new("test", payer, ixs);
        assert_eq!(prepared.required_signers(), vec![payer, co_signer]);
    }

    #[test]
    fn test_prepend_keeps_order() {
        let program = Pubkey::new_unique();
        let payer = Pubkey::new_unique();
        let meta = || vec![AccountMeta::new(payer, true)];
        let prepared = PreparedTransaction::new(
            "swap",
            payer,
            vec![Instruction::new_with_bytes(program, &[9], meta())],
        )
        .prepend(vec![
            Instruction::new_with_bytes(program, &[1], meta()),
            Instruction::new_with_bytes(program, &[2], meta()),
        ]);
        let tags: Vec<u8> = prepared.instructions.iter().map(|ix| ix.data[0]).collect();
        assert_eq!(tags, vec![1, 2, 9]);
    }

    #[test]
    fn test_ephemeral_signer_lookup() {
        let mint = Arc::new(Keypair::new());
        let prepared =
            PreparedTransaction::new("create_market", Pubkey::new_unique(), vec![])
                .with_signer(mint.clone());
        assert!(prepared.ephemeral_signer(&mint.pubkey()).is_some());
        assert!(prepared.ephemeral_signer(&Pubkey::new_unique()).is_none());
    }
}
