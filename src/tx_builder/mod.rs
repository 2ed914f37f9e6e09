//! Transaction building for the launchpad program
//!
//! The module is split into focused parts:
//! - **program**: Anchor instruction encoders for every launchpad instruction
//! - **instructions**: compute budget planning and ordering validation
//! - **output**: uncompiled transaction plans and signed build output
//! - **builder**: v0 message compilation and signing
//! - **simulate**: swap quote decoding from simulation return data

mod builder;
mod instructions;
mod output;
pub mod program;
pub mod simulate;

pub use builder::{ComputeBudget, TxBuilder};
pub use instructions::{plan_instructions, sanity_check_ix_order};
pub use output::{PreparedTransaction, TxBuildOutput};
pub use program::{
    instruction_discriminator, CreateMarketArgs, CreateVestingArgs, LaunchpadProgram,
    SwapAccounts,
};
pub use simulate::{decode_swap_quote, quote_from_simulation};
