//! Instruction planning and ordering validation
//!
//! Every transaction the orchestrator sends has the same shape:
//! 1. Compute budget instructions (CU limit, priority fee), optional
//! 2. Program instructions, in the order the caller supplied them

use crate::errors::{OrchestratorError, Result};
use solana_sdk::{compute_budget::ComputeBudgetInstruction, instruction::Instruction};

/// Prefix `program_ixs` with the configured compute budget instructions.
///
/// `cu_limit == 0` and `prio_fee == 0` each skip their instruction.
///
/// # Errors
///
/// `InstructionBuild` if there are no program instructions or one of them
/// has no accounts (every launchpad instruction takes at least a payer).
pub fn plan_instructions(
    cu_limit: u32,
    prio_fee: u64,
    program_ixs: Vec<Instruction>,
) -> Result<Vec<Instruction>> {
    if program_ixs.is_empty() {
        return Err(OrchestratorError::instruction_failed(
            "plan",
            "no program instructions",
        ));
    }
    if let Some(ix) = program_ixs.iter().find(|ix| ix.accounts.is_empty()) {
        return Err(OrchestratorError::instruction_failed(
            "plan",
            format!("instruction for {} has no accounts", ix.program_id),
        ));
    }

    let mut instructions = Vec::with_capacity(program_ixs.len() + 2);
    if cu_limit > 0 {
        instructions.push(ComputeBudgetInstruction::set_compute_unit_limit(cu_limit));
    }
    if prio_fee > 0 {
        instructions.push(ComputeBudgetInstruction::set_compute_unit_price(prio_fee));
    }
    instructions.extend(program_ixs);
    Ok(instructions)
}

/// Validate that compute budget instructions only appear as a prefix (debug/test only)
#[cfg(debug_assertions)]
pub fn sanity_check_ix_order(instructions: &[Instruction]) -> Result<()> {
    if instructions.is_empty() {
        return Err(OrchestratorError::instruction_failed(
            "plan",
            "instruction list is empty",
        ));
    }

    let budget_id = solana_sdk::compute_budget::id();
    let prefix = instructions
        .iter()
        .take_while(|ix| ix.program_id == budget_id)
        .count();

    if prefix == instructions.len() {
        return Err(OrchestratorError::instruction_failed(
            "plan",
            "only compute budget instructions present",
        ));
    }
    if let Some(idx) = instructions
        .iter()
        .skip(prefix)
        .position(|ix| ix.program_id == budget_id)
    {
        return Err(OrchestratorError::instruction_failed(
            "plan",
            format!(
                "compute budget instruction after program instruction (at position {})",
                idx + prefix
            ),
        ));
    }
    Ok(())
}

#[cfg(not(debug_assertions))]
#[inline]
pub fn sanity_check_ix_order(_instructions: &[Instruction]) -> Result<()> {
    Ok(())
}
