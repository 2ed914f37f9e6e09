//! Swap quote decoding from simulation return data
//!
//! `permissioned_swap` sets 16 bytes of return data: `input_amount` then
//! `output_amount`, both u64 little-endian. Anything else decodes to the
//! [`SwapQuote::UNKNOWN`] sentinel rather than an error.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::warn;

use crate::ledger::SimulationOutcome;
use crate::types::SwapQuote;

pub const SWAP_QUOTE_LEN: usize = 16;

/// Decode base64 return data into a quote
pub fn decode_swap_quote(return_data: Option<&str>) -> SwapQuote {
    let Some(encoded) = return_data else {
        return SwapQuote::UNKNOWN;
    };
    let bytes = match STANDARD.decode(encoded) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "Swap return data is not valid base64");
            return SwapQuote::UNKNOWN;
        }
    };
    decode_swap_quote_bytes(&bytes)
}

pub fn decode_swap_quote_bytes(bytes: &[u8]) -> SwapQuote {
    if bytes.len() < SWAP_QUOTE_LEN {
        warn!(len = bytes.len(), "Swap return data too short");
        return SwapQuote::UNKNOWN;
    }
    let mut input = [0u8; 8];
    let mut output = [0u8; 8];
    input.copy_from_slice(&bytes[0..8]);
    output.copy_from_slice(&bytes[8..16]);
    SwapQuote {
        input_amount: u64::from_le_bytes(input),
        output_amount: u64::from_le_bytes(output),
    }
}

/// Quote from a whole simulation; a failed simulation yields the sentinel.
pub fn quote_from_simulation(outcome: &SimulationOutcome) -> SwapQuote {
    if let Some(err) = &outcome.err {
        warn!(
            error = %err,
            logs = outcome.logs.len(),
            "Swap simulation failed, returning empty quote"
        );
        return SwapQuote::UNKNOWN;
    }
    decode_swap_quote(outcome.return_data.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(input: u64, output: u64) -> String {
        let mut bytes = input.to_le_bytes().to_vec();
        bytes.extend_from_slice(&output.to_le_bytes());
        STANDARD.encode(bytes)
    }

    #[test]
    fn test_decode_quote() {
        let quote = decode_swap_quote(Some(&encode(1_000_000, 42_000)));
        assert_eq!(
            quote,
            SwapQuote {
                input_amount: 1_000_000,
                output_amount: 42_000
            }
        );
    }

    #[test]
    fn test_malformed_return_data_is_sentinel() {
        assert!(decode_swap_quote(None).is_unknown());
        assert!(decode_swap_quote(Some("not base64!!")).is_unknown());
        assert!(decode_swap_quote(Some(&STANDARD.encode([1u8; 15]))).is_unknown());
        assert!(decode_swap_quote(Some("")).is_unknown());
    }

    #[test]
    fn test_failed_simulation_is_sentinel() {
        let outcome = SimulationOutcome {
            err: Some("custom program error: 0x1".to_string()),
            logs: vec!["Program log: slippage".to_string()],
            return_data: Some(encode(5, 6)),
        };
        assert!(quote_from_simulation(&outcome).is_unknown());

        let ok = SimulationOutcome {
            return_data: Some(encode(5, 6)),
            ..Default::default()
        };
        assert_eq!(quote_from_simulation(&ok).output_amount, 6);
    }
}
