//! Vesting and staking endpoints

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::api::types::{deserialize_amount, parse_address, ApiError, ApiJson, ApiResult};
use crate::api::AppState;
use crate::engine::{CreateVestingCommand, ReleaseVestingCommand, StakeCommand};
use crate::structured_logging::OperationContext;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateVestingRequest {
    pub market_address: String,
    pub recipient: String,
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: u64,
    /// Seconds
    pub duration: i64,
    #[serde(default)]
    pub cliff_duration: Option<i64>,
}

impl CreateVestingRequest {
    pub fn validate(&self) -> ApiResult<CreateVestingCommand> {
        Ok(CreateVestingCommand {
            market: parse_address("marketAddress", &self.market_address)?,
            recipient: parse_address("recipient", &self.recipient)?,
            amount: self.amount,
            duration: self.duration,
            cliff_duration: self.cliff_duration,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVestingResponse {
    pub vesting_account: String,
    pub signature: String,
}

/// POST /api/vesting
pub async fn create_vesting(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateVestingRequest>,
) -> ApiResult<Json<CreateVestingResponse>> {
    let ctx = OperationContext::new("create_vesting");
    let cmd = req.validate()?;
    let created = state
        .engine
        .create_vesting(cmd, &ctx)
        .await
        .map_err(|e| ApiError::from_engine(&ctx, e))?;

    Ok(Json(CreateVestingResponse {
        vesting_account: created.vesting_account.to_string(),
        signature: created.signature.to_string(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReleaseVestingRequest {
    pub market_address: String,
    pub staking_address: String,
    pub stake_position_address: String,
    pub vesting_plan_address: String,
    pub base_token_mint: String,
}

impl ReleaseVestingRequest {
    pub fn validate(&self) -> ApiResult<ReleaseVestingCommand> {
        Ok(ReleaseVestingCommand {
            market: parse_address("marketAddress", &self.market_address)?,
            staking: parse_address("stakingAddress", &self.staking_address)?,
            stake_position: parse_address("stakePositionAddress", &self.stake_position_address)?,
            vesting_plan: parse_address("vestingPlanAddress", &self.vesting_plan_address)?,
            base_mint: parse_address("baseTokenMint", &self.base_token_mint)?,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureResponse {
    pub signature: String,
}

/// POST /api/vesting/release
pub async fn release_vesting(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ReleaseVestingRequest>,
) -> ApiResult<Json<SignatureResponse>> {
    let ctx = OperationContext::new("release_vesting");
    let cmd = req.validate()?;
    let signature = state
        .engine
        .release_vesting(cmd, &ctx)
        .await
        .map_err(|e| ApiError::from_engine(&ctx, e))?;

    Ok(Json(SignatureResponse {
        signature: signature.to_string(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StakeRequest {
    pub market_address: String,
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: u64,
    #[serde(default)]
    pub lockup_period: Option<i64>,
}

/// POST /api/stake
pub async fn stake(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<StakeRequest>,
) -> ApiResult<Json<SignatureResponse>> {
    let ctx = OperationContext::new("stake");
    let cmd = StakeCommand {
        market: parse_address("marketAddress", &req.market_address)?,
        amount: req.amount,
        lockup_period: req.lockup_period,
    };
    let signature = state
        .engine
        .stake(cmd, &ctx)
        .await
        .map_err(|e| ApiError::from_engine(&ctx, e))?;

    Ok(Json(SignatureResponse {
        signature: signature.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_cliff() {
        let body = r#"{
            "marketAddress": "11111111111111111111111111111111",
            "recipient": "11111111111111111111111111111111",
            "amount": 1000,
            "duration": 86400
        }"#;
        let req: CreateVestingRequest = serde_json::from_str(body).unwrap();
        let cmd = req.validate().unwrap();
        assert_eq!(cmd.cliff_duration, None);
        assert_eq!(cmd.duration, 86_400);
    }

    #[test]
    fn test_release_rejects_bad_address() {
        let req = ReleaseVestingRequest {
            market_address: "11111111111111111111111111111111".to_string(),
            staking_address: "11111111111111111111111111111111".to_string(),
            stake_position_address: "bogus".to_string(),
            vesting_plan_address: "11111111111111111111111111111111".to_string(),
            base_token_mint: "11111111111111111111111111111111".to_string(),
        };
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("stakePositionAddress"));
    }
}
