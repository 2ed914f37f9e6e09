//! Swap execution and quote endpoints

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::api::types::{
    deserialize_amount, deserialize_optional_amount, parse_address, ApiError, ApiJson, ApiResult,
};
use crate::api::AppState;
use crate::structured_logging::OperationContext;
use crate::types::{LifecycleState, SwapAction, SwapParams, TradeType};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SwapRequest {
    pub market: String,
    pub action: SwapAction,
    pub trade_type: TradeType,
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: u64,
    /// Defaults to a 1% band around `amount`
    #[serde(default, deserialize_with = "deserialize_optional_amount")]
    pub other_amount_threshold: Option<u64>,
}

impl SwapRequest {
    pub fn params(&self) -> SwapParams {
        SwapParams::new(
            self.action,
            self.trade_type,
            self.amount,
            self.other_amount_threshold,
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapResponse {
    pub signature: String,
    pub lifecycle: LifecycleState,
    pub other_amount_threshold: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_signature: Option<String>,
}

/// POST /api/swap
pub async fn execute_swap(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SwapRequest>,
) -> ApiResult<Json<SwapResponse>> {
    let ctx = OperationContext::new("swap");
    let market = parse_address("market", &req.market)?;
    let receipt = state
        .engine
        .swap(&market, req.params(), &ctx)
        .await
        .map_err(|e| ApiError::from_engine(&ctx, e))?;

    Ok(Json(SwapResponse {
        signature: receipt.signature.to_string(),
        lifecycle: receipt.lifecycle,
        other_amount_threshold: receipt.other_amount_threshold.to_string(),
        free_signature: receipt.free_signature.map(|s| s.to_string()),
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub input_amount: String,
    pub output_amount: String,
}

/// POST /api/swap/quote
pub async fn get_quote(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SwapRequest>,
) -> ApiResult<Json<QuoteResponse>> {
    let ctx = OperationContext::new("quote");
    let market = parse_address("market", &req.market)?;
    let quote = state
        .engine
        .quote(&market, req.params(), &ctx)
        .await
        .map_err(|e| ApiError::from_engine(&ctx, e))?;

    Ok(Json(QuoteResponse {
        input_amount: quote.input_amount.to_string(),
        output_amount: quote.output_amount.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_threshold_applied() {
        let body = r#"{
            "market": "11111111111111111111111111111111",
            "action": "buy",
            "tradeType": "exactInput",
            "amount": 1000
        }"#;
        let req: SwapRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.params().other_amount_threshold, 990);
    }

    #[test]
    fn test_explicit_threshold_kept() {
        let body = r#"{
            "market": "11111111111111111111111111111111",
            "action": "sell",
            "tradeType": "exactOutput",
            "amount": "1000",
            "otherAmountThreshold": "1200"
        }"#;
        let req: SwapRequest = serde_json::from_str(body).unwrap();
        let params = req.params();
        assert_eq!(params.action, SwapAction::Sell);
        assert_eq!(params.trade_type, TradeType::ExactOutput);
        assert_eq!(params.other_amount_threshold, 1200);
    }

    #[test]
    fn test_unknown_action_rejected() {
        let body = r#"{
            "market": "11111111111111111111111111111111",
            "action": "hold",
            "tradeType": "exactInput",
            "amount": 1
        }"#;
        assert!(serde_json::from_str::<SwapRequest>(body).is_err());
    }
}
