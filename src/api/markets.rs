//! Config and market endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::types::{deserialize_amount, parse_address, ApiError, ApiJson, ApiResult};
use crate::api::AppState;
use crate::engine::CreateConfigCommand;
use crate::lifecycle::FreeOutcome;
use crate::structured_logging::OperationContext;
use crate::tx_builder::CreateMarketArgs;
use crate::types::{LifecycleState, FREE_MARKET_THRESHOLD_UNITS};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateConfigRequest {
    pub authority: String,
    pub protocol_fee_recipient: String,
    pub protocol_fee_share: u16,
    pub referral_fee_share: u16,
}

impl CreateConfigRequest {
    pub fn validate(&self) -> ApiResult<CreateConfigCommand> {
        Ok(CreateConfigCommand {
            authority: parse_address("authority", &self.authority)?,
            protocol_fee_recipient: parse_address(
                "protocolFeeRecipient",
                &self.protocol_fee_recipient,
            )?,
            protocol_fee_share: self.protocol_fee_share,
            referral_fee_share: self.referral_fee_share,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConfigResponse {
    pub config_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// POST /api/config
pub async fn create_config(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateConfigRequest>,
) -> ApiResult<Json<CreateConfigResponse>> {
    let ctx = OperationContext::new("create_config");
    let cmd = req.validate()?;
    let created = state
        .engine
        .create_config(cmd, &ctx)
        .await
        .map_err(|e| ApiError::from_engine(&ctx, e))?;

    Ok(Json(CreateConfigResponse {
        config_address: created.config_address.to_string(),
        signature: created.signature.map(|s| s.to_string()),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateMarketRequest {
    pub name: String,
    pub symbol: String,
    pub uri: String,
    #[serde(deserialize_with = "deserialize_amount")]
    pub total_supply: u64,
    pub creator_fee_share: u16,
    pub staking_fee_share: u16,
}

impl CreateMarketRequest {
    pub fn into_args(self) -> CreateMarketArgs {
        CreateMarketArgs {
            name: self.name,
            symbol: self.symbol,
            uri: self.uri,
            total_supply: self.total_supply,
            creator_fee_share: self.creator_fee_share,
            staking_fee_share: self.staking_fee_share,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMarketResponse {
    pub market_address: String,
    pub base_token_mint: String,
    pub signature: String,
    pub lock_signature: String,
}

/// POST /api/markets
pub async fn create_market(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateMarketRequest>,
) -> ApiResult<Json<CreateMarketResponse>> {
    let ctx = OperationContext::new("create_market");
    let created = state
        .engine
        .create_market(req.into_args(), &ctx)
        .await
        .map_err(|e| ApiError::from_engine(&ctx, e))?;

    Ok(Json(CreateMarketResponse {
        market_address: created.market_address.to_string(),
        base_token_mint: created.base_token_mint.to_string(),
        signature: created.signature.to_string(),
        lock_signature: created.lock_signature.to_string(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FreeMarketRequest {
    pub market: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeMarketResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    pub already_free: bool,
}

/// POST /api/markets/free
pub async fn free_market(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<FreeMarketRequest>,
) -> ApiResult<Json<FreeMarketResponse>> {
    let ctx = OperationContext::new("free_market");
    let market = parse_address("market", &req.market)?;
    let outcome = state
        .engine
        .free_market(&market, &ctx)
        .await
        .map_err(|e| ApiError::from_engine(&ctx, e))?;

    Ok(Json(FreeMarketResponse {
        signature: outcome.signature().map(|s| s.to_string()),
        already_free: outcome == FreeOutcome::AlreadyFree,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleResponse {
    pub market: String,
    pub state: LifecycleState,
    pub quote_vault: String,
    /// Raw amount as a string
    pub quote_balance: String,
    pub quote_balance_ui: f64,
    pub threshold: u64,
}

/// GET /api/markets/:address/lifecycle
pub async fn get_lifecycle(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> ApiResult<Json<LifecycleResponse>> {
    let ctx = OperationContext::new("lifecycle");
    let market = parse_address("address", &address)?;
    let view = state
        .engine
        .lifecycle(&market, &ctx)
        .await
        .map_err(|e| ApiError::from_engine(&ctx, e))?;

    Ok(Json(LifecycleResponse {
        market: market.to_string(),
        state: view.state,
        quote_vault: view.quote_vault.to_string(),
        quote_balance: view.quote_balance.amount.to_string(),
        quote_balance_ui: view.quote_balance.ui_amount(),
        threshold: FREE_MARKET_THRESHOLD_UNITS,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_fields_rejected() {
        let body = r#"{"market": "11111111111111111111111111111111", "force": true}"#;
        assert!(serde_json::from_str::<FreeMarketRequest>(body).is_err());
    }

    #[test]
    fn test_create_market_request_shape() {
        let body = r#"{
            "name": "Token",
            "symbol": "TKN",
            "uri": "https://example.com/t.json",
            "totalSupply": "1000000000000000000",
            "creatorFeeShare": 100,
            "stakingFeeShare": 50
        }"#;
        let req: CreateMarketRequest = serde_json::from_str(body).unwrap();
        let args = req.into_args();
        assert_eq!(args.total_supply, 1_000_000_000_000_000_000);
        assert_eq!(args.staking_fee_share, 50);
    }

    #[test]
    fn test_create_config_validation() {
        let req = CreateConfigRequest {
            authority: "not-a-key".to_string(),
            protocol_fee_recipient: "11111111111111111111111111111111".to_string(),
            protocol_fee_share: 100,
            referral_fee_share: 0,
        };
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("authority"));
    }
}
