use solana_client::client_error::ClientError;
use thiserror::Error;

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Failures reaching or talking to the ledger RPC node.
///
/// Program-level failures of a confirmed transaction are NOT represented here;
/// those come back as a successful [`ConfirmationOutcome`](super::ConfirmationOutcome)
/// carrying the error payload.
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    /// Transport-level errors (network, connection)
    #[error("Transport error: {message} (endpoint: {endpoint})")]
    Transport { endpoint: String, message: String },

    #[error("Timeout after {timeout_ms}ms (endpoint: {endpoint})")]
    Timeout { endpoint: String, timeout_ms: u64 },

    /// RPC response errors (from the RPC server)
    #[error("RPC response error: {message} (endpoint: {endpoint}, code: {code:?})")]
    RpcResponse {
        endpoint: String,
        message: String,
        code: Option<i64>,
    },

    #[error("Rate limit exceeded (endpoint: {endpoint})")]
    RateLimitExceeded { endpoint: String },

    #[error("Blockhash not found (endpoint: {endpoint})")]
    BlockhashNotFound { endpoint: String },

    /// Preflight rejected the transaction before it reached a leader
    #[error("Preflight failed: {message} (endpoint: {endpoint})")]
    Preflight { endpoint: String, message: String },

    /// The node answered with something we could not interpret
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl LedgerError {
    /// Check if this error is retryable by the caller
    pub fn is_retryable(&self) -> bool {
        match self {
            LedgerError::Transport { .. } => true,
            LedgerError::Timeout { .. } => true,
            LedgerError::RateLimitExceeded { .. } => true,
            LedgerError::BlockhashNotFound { .. } => true,

            LedgerError::Preflight { .. } => false,
            LedgerError::InvalidResponse(_) => false,

            // Retry on server errors (5xx)
            LedgerError::RpcResponse { code, .. } => {
                matches!(code, Some(c) if (500..600).contains(c))
            }
        }
    }

    /// Get the endpoint associated with this error, if any
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            LedgerError::Transport { endpoint, .. } => Some(endpoint),
            LedgerError::Timeout { endpoint, .. } => Some(endpoint),
            LedgerError::RpcResponse { endpoint, .. } => Some(endpoint),
            LedgerError::RateLimitExceeded { endpoint } => Some(endpoint),
            LedgerError::BlockhashNotFound { endpoint } => Some(endpoint),
            LedgerError::Preflight { endpoint, .. } => Some(endpoint),
            LedgerError::InvalidResponse(_) => None,
        }
    }

    /// Create from ClientError with context
    pub fn from_client_error(err: ClientError, endpoint: &str) -> Self {
        Self::classify(&err.to_string(), endpoint)
    }

    /// Classify a raw RPC error message
    pub fn classify(message: &str, endpoint: &str) -> Self {
        let lower = message.to_lowercase();
        let endpoint = endpoint.to_string();

        if lower.contains("blockhash not found") {
            LedgerError::BlockhashNotFound { endpoint }
        } else if lower.contains("transaction simulation failed")
            || lower.contains("preflight")
        {
            LedgerError::Preflight {
                endpoint,
                message: message.to_string(),
            }
        } else if lower.contains("rate limit")
            || lower.contains("too many requests")
            || lower.contains("429")
        {
            LedgerError::RateLimitExceeded { endpoint }
        } else if lower.contains("timeout") || lower.contains("timed out") {
            LedgerError::Timeout {
                endpoint,
                timeout_ms: 0,
            }
        } else if lower.contains("connection")
            || lower.contains("dns")
            || lower.contains("error sending request")
        {
            LedgerError::Transport {
                endpoint,
                message: message.to_string(),
            }
        } else {
            let code = lower
                .split("code:")
                .nth(1)
                .and_then(|s| s.split_whitespace().next())
                .and_then(|s| s.trim_end_matches(',').parse::<i64>().ok());

            LedgerError::RpcResponse {
                endpoint,
                message: message.to_string(),
                code,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_retryable() {
        assert!(LedgerError::Transport {
            endpoint: "test".to_string(),
            message: "connection failed".to_string(),
        }
        .is_retryable());

        assert!(LedgerError::Timeout {
            endpoint: "test".to_string(),
            timeout_ms: 5000,
        }
        .is_retryable());

        assert!(!LedgerError::InvalidResponse("garbage".to_string()).is_retryable());
        assert!(!LedgerError::Preflight {
            endpoint: "test".to_string(),
            message: "custom program error: 0x1".to_string(),
        }
        .is_retryable());
    }

    #[test]
    fn test_classify() {
        let ep = "http://localhost:8899";
        assert!(matches!(
            LedgerError::classify("Blockhash not found", ep),
            LedgerError::BlockhashNotFound { .. }
        ));
        assert!(matches!(
            LedgerError::classify("HTTP status client error (429 Too Many Requests)", ep),
            LedgerError::RateLimitExceeded { .. }
        ));
        assert!(matches!(
            LedgerError::classify("error sending request for url", ep),
            LedgerError::Transport { .. }
        ));
        assert!(matches!(
            LedgerError::classify("RPC response error -32002: Transaction simulation failed", ep),
            LedgerError::Preflight { .. }
        ));
    }

    #[test]
    fn test_classify_extracts_code() {
        let err = LedgerError::classify("server error code: 503 unavailable", "ep");
        match err {
            LedgerError::RpcResponse { code, .. } => assert_eq!(code, Some(503)),
            other => panic!("unexpected {other:?}"),
        }
        assert!(LedgerError::classify("server error code: 503 unavailable", "ep").is_retryable());
    }

    #[test]
    fn test_error_endpoint() {
        let err = LedgerError::Timeout {
            endpoint: "https://test.com".to_string(),
            timeout_ms: 5000,
        };
        assert_eq!(err.endpoint(), Some("https://test.com"));
        assert_eq!(LedgerError::InvalidResponse("x".to_string()).endpoint(), None);
    }
}
