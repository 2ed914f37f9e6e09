//! Test Utilities Module
//!
//! In-memory [`LedgerClient`] for driving the engine without a validator.
//! Accounts, token balances, simulation results and failures are all seeded
//! by the test; every transaction sent is recorded for inspection.
//!
//! These utilities are only compiled when running tests or when the
//! `test_utils` feature is enabled.

#![cfg(any(test, feature = "test_utils"))]

use async_trait::async_trait;
use solana_sdk::{
    account::Account, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::VersionedTransaction,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use crate::ledger::{
    ConfirmationOutcome, LedgerClient, LedgerError, LedgerResult, SimulationOutcome,
};
use crate::state::{LaunchpadConfig, MarketAccount};
use crate::tx_builder::instruction_discriminator;
use crate::types::TokenBalance;

const MOCK_ENDPOINT: &str = "mock://ledger";

#[derive(Default)]
struct MockState {
    accounts: HashMap<Pubkey, Account>,
    balances: HashMap<Pubkey, TokenBalance>,
    /// Remaining reads for which an account is reported absent
    hidden: HashMap<Pubkey, usize>,
    sent: Vec<VersionedTransaction>,
    confirm_errors: VecDeque<String>,
    preflight_errors: VecDeque<String>,
    simulation: SimulationOutcome,
    simulated: Vec<VersionedTransaction>,
    account_reads: usize,
}

/// Mock ledger for testing
///
/// A successfully sent transaction materializes every writable, non-signer
/// account it touches (empty data, zero token balance), so check-then-create
/// flows observe their own writes on the next read.
pub struct MockLedger {
    state: Mutex<MockState>,
    blockhash: Hash,
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLedger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            blockhash: Hash::new_unique(),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_account(&self, address: Pubkey, owner: Pubkey, data: Vec<u8>) {
        self.state().accounts.insert(
            address,
            Account {
                lamports: 1_000_000,
                data,
                owner,
                executable: false,
                rent_epoch: 0,
            },
        );
    }

    /// Mark an address as existing, with no data
    pub fn touch(&self, address: Pubkey) {
        self.set_account(address, Pubkey::default(), Vec::new());
    }

    pub fn remove_account(&self, address: &Pubkey) {
        self.state().accounts.remove(address);
    }

    pub fn seed_market(&self, address: Pubkey, program_id: Pubkey, market: &MarketAccount) {
        self.set_account(address, program_id, market.encode());
    }

    pub fn seed_config(&self, address: Pubkey, program_id: Pubkey, config: &LaunchpadConfig) {
        self.set_account(address, program_id, config.encode());
    }

    pub fn set_token_balance(&self, address: Pubkey, amount: u64, decimals: u8) {
        self.state()
            .balances
            .insert(address, TokenBalance { amount, decimals });
    }

    /// Forget a token balance; the account reads as not found again
    pub fn clear_token_balance(&self, address: &Pubkey) {
        self.state().balances.remove(address);
    }

    /// Report `address` absent for its next `reads` lookups
    pub fn hide_for_reads(&self, address: Pubkey, reads: usize) {
        self.state().hidden.insert(address, reads);
    }

    /// Next confirmation reports this program error
    pub fn push_confirm_error(&self, err: impl Into<String>) {
        self.state().confirm_errors.push_back(err.into());
    }

    /// Next send fails preflight with this message
    pub fn push_preflight_error(&self, err: impl Into<String>) {
        self.state().preflight_errors.push_back(err.into());
    }

    pub fn set_simulation(&self, outcome: SimulationOutcome) {
        self.state().simulation = outcome;
    }

    pub fn exists(&self, address: &Pubkey) -> bool {
        self.state().accounts.contains_key(address)
    }

    pub fn sent_transactions(&self) -> Vec<VersionedTransaction> {
        self.state().sent.clone()
    }

    pub fn sent_count(&self) -> usize {
        self.state().sent.len()
    }

    pub fn simulated_transactions(&self) -> Vec<VersionedTransaction> {
        self.state().simulated.clone()
    }

    pub fn account_reads(&self) -> usize {
        self.state().account_reads
    }

    /// Number of sent transactions carrying the named Anchor instruction
    pub fn sent_with_instruction(&self, name: &str) -> usize {
        let disc = instruction_discriminator(name);
        self.state()
            .sent
            .iter()
            .filter(|tx| {
                tx.message
                    .instructions()
                    .iter()
                    .any(|ix| ix.data.starts_with(&disc))
            })
            .count()
    }

    /// Number of sent transactions invoking `program_id`
    pub fn sent_to_program(&self, program_id: &Pubkey) -> usize {
        self.state()
            .sent
            .iter()
            .filter(|tx| transaction_invokes(tx, program_id))
            .count()
    }
}

/// True if any instruction of `tx` targets `program_id`
pub fn transaction_invokes(tx: &VersionedTransaction, program_id: &Pubkey) -> bool {
    let keys = tx.message.static_account_keys();
    tx.message
        .instructions()
        .iter()
        .any(|ix| keys.get(ix.program_id_index as usize) == Some(program_id))
}

/// Writable accounts of `tx` that do not sign
pub fn writable_non_signers(tx: &VersionedTransaction) -> Vec<Pubkey> {
    let header = tx.message.header();
    let keys = tx.message.static_account_keys();
    let signers = header.num_required_signatures as usize;
    let writable_end = keys
        .len()
        .saturating_sub(header.num_readonly_unsigned_accounts as usize);
    keys.get(signers..writable_end)
        .map(|slice| slice.to_vec())
        .unwrap_or_default()
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn latest_blockhash(&self) -> LedgerResult<Hash> {
        Ok(self.blockhash)
    }

    async fn send_transaction(&self, tx: &VersionedTransaction) -> LedgerResult<Signature> {
        let mut state = self.state();
        if let Some(message) = state.preflight_errors.pop_front() {
            return Err(LedgerError::Preflight {
                endpoint: MOCK_ENDPOINT.to_string(),
                message,
            });
        }

        let signature = tx.signatures.first().copied().unwrap_or_default();
        let will_fail = !state.confirm_errors.is_empty();
        if !will_fail {
            for address in writable_non_signers(tx) {
                state.accounts.entry(address).or_insert_with(|| Account {
                    lamports: 1,
                    data: Vec::new(),
                    owner: Pubkey::default(),
                    executable: false,
                    rent_epoch: 0,
                });
                state.balances.entry(address).or_insert(TokenBalance {
                    amount: 0,
                    decimals: 0,
                });
            }
        }
        state.sent.push(tx.clone());
        Ok(signature)
    }

    async fn confirm_transaction(
        &self,
        _signature: &Signature,
    ) -> LedgerResult<ConfirmationOutcome> {
        Ok(match self.state().confirm_errors.pop_front() {
            Some(err) => ConfirmationOutcome::failed(err),
            None => ConfirmationOutcome::success(),
        })
    }

    async fn simulate_transaction(
        &self,
        tx: &VersionedTransaction,
    ) -> LedgerResult<SimulationOutcome> {
        let mut state = self.state();
        state.simulated.push(tx.clone());
        Ok(state.simulation.clone())
    }

    async fn get_account_info(&self, address: &Pubkey) -> LedgerResult<Option<Account>> {
        let mut state = self.state();
        state.account_reads += 1;
        if let Some(remaining) = state.hidden.get_mut(address) {
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(None);
            }
        }
        Ok(state.accounts.get(address).cloned())
    }

    async fn get_token_account_balance(&self, address: &Pubkey) -> LedgerResult<TokenBalance> {
        self.state()
            .balances
            .get(address)
            .copied()
            .ok_or_else(|| LedgerError::RpcResponse {
                endpoint: MOCK_ENDPOINT.to_string(),
                message: format!("Invalid param: could not find account {address}"),
                code: Some(-32602),
            })
    }

    fn endpoint(&self) -> &str {
        MOCK_ENDPOINT
    }
}
