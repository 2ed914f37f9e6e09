//! Error taxonomy for the orchestration engine
//!
//! Every ledger-facing operation returns `Result<_, OrchestratorError>`; the
//! HTTP shell maps each variant onto a status code. Malformed quote buffers are
//! deliberately absent here: they decode to the zero sentinel instead.

use thiserror::Error;

use crate::ledger::LedgerError;

pub type Result<T> = std::result::Result<T, OrchestratorError>;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// Malformed or missing input, detected before any network call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Transport failure reaching the ledger
    #[error("Ledger unavailable: {0}")]
    RemoteUnavailable(#[from] LedgerError),

    /// A submitted transaction confirmed with a program-level error
    ///
    /// `payload` is the program's error verbatim.
    #[error("On-chain rejection (signature={signature}): {payload}")]
    OnChainRejection { signature: String, payload: String },

    /// A domain guard failed before any transaction was built
    #[error("Precondition unmet: {what} (observed={observed}, required={required})")]
    PreconditionUnmet {
        what: String,
        observed: String,
        required: String,
    },

    /// A required on-chain account does not exist
    #[error("Account not found: {kind} {address}")]
    AccountNotFound { kind: String, address: String },

    /// Account data did not match the expected layout
    #[error("Account decode error ({account}): {reason}")]
    AccountDecode { account: String, reason: String },

    #[error("Instruction build error (instruction={instruction}): {reason}")]
    InstructionBuild { instruction: String, reason: String },

    #[error("Signing failed: {0}")]
    Signing(String),

    /// A readiness wait ran past its deadline
    #[error("Timed out: {0}")]
    Timeout(String),
}

impl OrchestratorError {
    /// Check if retrying the same request might succeed
    ///
    /// Provisioning is idempotent, so a retried swap after a transport failure
    /// skips the steps that already landed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RemoteUnavailable(e) => e.is_retryable(),
            Self::Timeout(_) => true,

            Self::Validation(_) => false,
            Self::OnChainRejection { .. } => false,
            Self::PreconditionUnmet { .. } => false,
            Self::AccountNotFound { .. } => false,
            Self::AccountDecode { .. } => false,
            Self::InstructionBuild { .. } => false,
            Self::Signing(_) => false,
        }
    }

    /// Get the error category for logs and API error codes
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::RemoteUnavailable(_) => "remote_unavailable",
            Self::OnChainRejection { .. } => "on_chain_rejection",
            Self::PreconditionUnmet { .. } => "precondition_unmet",
            Self::AccountNotFound { .. } => "not_found",
            Self::AccountDecode { .. } => "decode",
            Self::InstructionBuild { .. } => "instruction",
            Self::Signing(_) => "signing",
            Self::Timeout(_) => "timeout",
        }
    }
}

// Convenience constructors for common error scenarios
impl OrchestratorError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }

    pub fn rejected(signature: impl ToString, payload: impl Into<String>) -> Self {
        Self::OnChainRejection {
            signature: signature.to_string(),
            payload: payload.into(),
        }
    }

    pub fn precondition(
        what: impl Into<String>,
        observed: impl ToString,
        required: impl ToString,
    ) -> Self {
        Self::PreconditionUnmet {
            what: what.into(),
            observed: observed.to_string(),
            required: required.to_string(),
        }
    }

    pub fn not_found(kind: impl Into<String>, address: impl ToString) -> Self {
        Self::AccountNotFound {
            kind: kind.into(),
            address: address.to_string(),
        }
    }

    pub fn decode(account: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AccountDecode {
            account: account.into(),
            reason: reason.into(),
        }
    }

    pub fn instruction_failed(instruction: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InstructionBuild {
            instruction: instruction.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OrchestratorError::precondition("quote vault balance", 12.5, 69);
        assert_eq!(
            err.to_string(),
            "Precondition unmet: quote vault balance (observed=12.5, required=69)"
        );

        let err = OrchestratorError::rejected("sig", "custom program error: 0x1771");
        assert_eq!(
            err.to_string(),
            "On-chain rejection (signature=sig): custom program error: 0x1771"
        );
    }

    #[test]
    fn test_error_retryability() {
        let transport = LedgerError::Transport {
            endpoint: "ep".to_string(),
            message: "connection reset".to_string(),
        };
        assert!(OrchestratorError::from(transport).is_retryable());
        assert!(OrchestratorError::Timeout("vesting plan".to_string()).is_retryable());

        assert!(!OrchestratorError::rejected("sig", "err").is_retryable());
        assert!(!OrchestratorError::precondition("x", 1, 2).is_retryable());
        assert!(!OrchestratorError::validation("bad").is_retryable());
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(OrchestratorError::validation("x").category(), "validation");
        assert_eq!(
            OrchestratorError::rejected("s", "p").category(),
            "on_chain_rejection"
        );
        assert_eq!(
            OrchestratorError::not_found("market", "abc").category(),
            "not_found"
        );
    }
}
