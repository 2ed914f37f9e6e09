//! Common types used throughout the orchestrator

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::fmt;

/// Whole quote-asset units a market's quote vault must hold before it may be freed.
pub const FREE_MARKET_THRESHOLD_UNITS: u64 = 69;

/// Default slippage band applied when a swap omits `otherAmountThreshold` (basis points).
pub const DEFAULT_SLIPPAGE_BPS: u64 = 100;

const BPS_DENOMINATOR: u64 = 10_000;

/// Swap direction, relative to the market's base token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapAction {
    /// Spend quote, receive base
    Buy,
    /// Spend base, receive quote
    Sell,
}

impl SwapAction {
    /// Borsh enum index; the program declares `Buy` first.
    pub fn variant_index(&self) -> u8 {
        match self {
            Self::Buy => 0,
            Self::Sell => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

/// Which side of the swap `amount` pins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TradeType {
    ExactInput,
    ExactOutput,
}

impl TradeType {
    pub fn variant_index(&self) -> u8 {
        match self {
            Self::ExactInput => 0,
            Self::ExactOutput => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExactInput => "exactInput",
            Self::ExactOutput => "exactOutput",
        }
    }
}

/// Asset side of a market
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Asset {
    Base,
    Quote,
}

/// What a swap amount field represents for a given (action, trade type) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountRole {
    /// Exact amount of `Asset` the wallet pays
    Spent(Asset),
    /// Exact amount of `Asset` the wallet receives
    Received(Asset),
}

/// What `other_amount_threshold` bounds for a given (action, trade type) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdRole {
    /// Minimum amount of `Asset` the wallet must receive
    MinReceived(Asset),
    /// Maximum amount of `Asset` the wallet may pay
    MaxSpent(Asset),
}

/// Parameters of a single permissioned swap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapParams {
    pub action: SwapAction,
    pub trade_type: TradeType,
    pub amount: u64,
    pub other_amount_threshold: u64,
}

impl SwapParams {
    /// Build params, filling a missing threshold with the default slippage band.
    pub fn new(
        action: SwapAction,
        trade_type: TradeType,
        amount: u64,
        other_amount_threshold: Option<u64>,
    ) -> Self {
        Self {
            action,
            trade_type,
            amount,
            other_amount_threshold: other_amount_threshold
                .unwrap_or_else(|| default_other_amount_threshold(action, amount)),
        }
    }

    /// Meaning of `amount` and `other_amount_threshold` for this combination.
    pub fn semantics(&self) -> (AmountRole, ThresholdRole) {
        match (self.action, self.trade_type) {
            (SwapAction::Buy, TradeType::ExactInput) => (
                AmountRole::Spent(Asset::Quote),
                ThresholdRole::MinReceived(Asset::Base),
            ),
            (SwapAction::Buy, TradeType::ExactOutput) => (
                AmountRole::Received(Asset::Base),
                ThresholdRole::MaxSpent(Asset::Quote),
            ),
            (SwapAction::Sell, TradeType::ExactInput) => (
                AmountRole::Spent(Asset::Base),
                ThresholdRole::MinReceived(Asset::Quote),
            ),
            (SwapAction::Sell, TradeType::ExactOutput) => (
                AmountRole::Received(Asset::Quote),
                ThresholdRole::MaxSpent(Asset::Base),
            ),
        }
    }
}

/// ±1% band around `amount`: buys tolerate 1% less, sells 1% more.
///
/// Integer arithmetic in u128, floored, saturating at `u64::MAX`.
pub fn default_other_amount_threshold(action: SwapAction, amount: u64) -> u64 {
    let bps = match action {
        SwapAction::Buy => BPS_DENOMINATOR - DEFAULT_SLIPPAGE_BPS,
        SwapAction::Sell => BPS_DENOMINATOR + DEFAULT_SLIPPAGE_BPS,
    };
    let scaled = amount as u128 * bps as u128 / BPS_DENOMINATOR as u128;
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

/// Lifecycle of a market as seen from the quote vault balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LifecycleState {
    /// Swaps require the delegated swap authority
    Locked,
    /// Swaps are signed by the wallet directly
    Free,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Locked => write!(f, "LOCKED"),
            Self::Free => write!(f, "FREE"),
        }
    }
}

/// Decoded result of a simulated swap
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapQuote {
    pub input_amount: u64,
    pub output_amount: u64,
}

impl SwapQuote {
    /// Sentinel for "no quote available"
    pub const UNKNOWN: SwapQuote = SwapQuote {
        input_amount: 0,
        output_amount: 0,
    };

    pub fn is_unknown(&self) -> bool {
        *self == Self::UNKNOWN
    }
}

/// Raw token account balance as reported by the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBalance {
    pub amount: u64,
    pub decimals: u8,
}

impl TokenBalance {
    /// True when the balance is at least `units` whole tokens.
    ///
    /// Compares raw amounts so fractional balances just under the bound stay below it.
    pub fn meets_whole_units(&self, units: u64) -> bool {
        let required = units as u128 * 10u128.pow(self.decimals as u32);
        self.amount as u128 >= required
    }

    /// Human-readable amount, for logs and API responses only.
    pub fn ui_amount(&self) -> f64 {
        self.amount as f64 / 10f64.powi(self.decimals as i32)
    }
}

/// Token program owning a mint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenProgram {
    /// Original SPL token program
    Legacy,
    /// Token-2022 (extensions)
    Extended,
}

pub const TOKEN_2022_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb");

impl TokenProgram {
    pub fn id(&self) -> Pubkey {
        match self {
            Self::Legacy => spl_token::id(),
            Self::Extended => TOKEN_2022_PROGRAM_ID,
        }
    }
}

/// Kinds of accounts the provisioner knows how to create
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    Config,
    QuoteTokenBadge,
    MarketStaking,
    StakePosition,
    AssociatedToken(TokenProgram),
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::QuoteTokenBadge => "quote_token_badge",
            Self::MarketStaking => "market_staking",
            Self::StakePosition => "stake_position",
            Self::AssociatedToken(TokenProgram::Legacy) => "associated_token",
            Self::AssociatedToken(TokenProgram::Extended) => "associated_token_2022",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_slippage_band() {
        assert_eq!(default_other_amount_threshold(SwapAction::Buy, 1000), 990);
        assert_eq!(default_other_amount_threshold(SwapAction::Sell, 1000), 1010);
        // floor, not round
        assert_eq!(default_other_amount_threshold(SwapAction::Buy, 999), 989);
        assert_eq!(default_other_amount_threshold(SwapAction::Sell, 999), 1008);
        assert_eq!(
            default_other_amount_threshold(SwapAction::Sell, u64::MAX),
            u64::MAX
        );
    }

    #[test]
    fn test_explicit_threshold_is_kept() {
        let params = SwapParams::new(SwapAction::Buy, TradeType::ExactInput, 1000, Some(5));
        assert_eq!(params.other_amount_threshold, 5);

        let params = SwapParams::new(SwapAction::Sell, TradeType::ExactInput, 1000, None);
        assert_eq!(params.other_amount_threshold, 1010);
    }

    #[test]
    fn test_swap_parameter_table() {
        let cases = [
            (
                SwapAction::Buy,
                TradeType::ExactInput,
                AmountRole::Spent(Asset::Quote),
                ThresholdRole::MinReceived(Asset::Base),
            ),
            (
                SwapAction::Buy,
                TradeType::ExactOutput,
                AmountRole::Received(Asset::Base),
                ThresholdRole::MaxSpent(Asset::Quote),
            ),
            (
                SwapAction::Sell,
                TradeType::ExactInput,
                AmountRole::Spent(Asset::Base),
                ThresholdRole::MinReceived(Asset::Quote),
            ),
            (
                SwapAction::Sell,
                TradeType::ExactOutput,
                AmountRole::Received(Asset::Quote),
                ThresholdRole::MaxSpent(Asset::Base),
            ),
        ];

        for (action, trade_type, amount_role, threshold_role) in cases {
            let params = SwapParams::new(action, trade_type, 10, Some(1));
            assert_eq!(params.semantics(), (amount_role, threshold_role));
        }
    }

    #[test]
    fn test_threshold_uses_raw_amounts() {
        let just_under = TokenBalance {
            amount: 68_999_999_999,
            decimals: 9,
        };
        assert!(!just_under.meets_whole_units(FREE_MARKET_THRESHOLD_UNITS));

        let exact = TokenBalance {
            amount: 69_000_000_000,
            decimals: 9,
        };
        assert!(exact.meets_whole_units(FREE_MARKET_THRESHOLD_UNITS));
    }

    #[test]
    fn test_serde_tags() {
        assert_eq!(serde_json::to_string(&SwapAction::Buy).unwrap(), "\"buy\"");
        assert_eq!(
            serde_json::to_string(&TradeType::ExactOutput).unwrap(),
            "\"exactOutput\""
        );
        assert_eq!(
            serde_json::to_string(&LifecycleState::Free).unwrap(),
            "\"FREE\""
        );
        let program: TokenProgram = serde_json::from_str("\"extended\"").unwrap();
        assert_eq!(program.id(), TOKEN_2022_PROGRAM_ID);
    }

    #[test]
    fn test_token_program_ids() {
        assert_eq!(
            TokenProgram::Legacy.id().to_string(),
            "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA"
        );
        assert_eq!(
            TokenProgram::Extended.id().to_string(),
            "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb"
        );
    }
}
