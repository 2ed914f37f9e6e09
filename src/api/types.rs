//! Shared API types and error handling

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

use crate::errors::OrchestratorError;
use crate::ledger::LedgerError;
use crate::structured_logging::OperationContext;

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// API error types
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("Ledger unavailable: {0}")]
    BadGateway(String),

    #[error("Timed out: {0}")]
    GatewayTimeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Map an engine error, logging it against the request.
    pub fn from_engine(ctx: &OperationContext, err: OrchestratorError) -> Self {
        let message = format!(
            "{} failed [{}] after {}ms: {}",
            ctx.operation,
            err.category(),
            ctx.elapsed_ms(),
            err
        );
        match err {
            OrchestratorError::AccountDecode { .. }
            | OrchestratorError::InstructionBuild { .. }
            | OrchestratorError::Signing(_) => ctx.logger.error(&message),
            _ => ctx.logger.warn(&message),
        }
        Self::from(err)
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        let message = err.to_string();
        match err {
            OrchestratorError::Validation(_) => ApiError::BadRequest(message),
            OrchestratorError::RemoteUnavailable(LedgerError::Timeout { .. }) => {
                ApiError::GatewayTimeout(message)
            }
            OrchestratorError::RemoteUnavailable(_) => ApiError::BadGateway(message),
            OrchestratorError::OnChainRejection { .. } => ApiError::Rejected(message),
            OrchestratorError::PreconditionUnmet { .. } => ApiError::PreconditionFailed(message),
            OrchestratorError::AccountNotFound { .. } => ApiError::NotFound(message),
            OrchestratorError::Timeout(_) => ApiError::GatewayTimeout(message),
            OrchestratorError::AccountDecode { .. }
            | OrchestratorError::InstructionBuild { .. }
            | OrchestratorError::Signing(_) => ApiError::Internal(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: String,
}

impl ApiError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::PreconditionFailed(_) => {
                (StatusCode::PRECONDITION_FAILED, "PRECONDITION_UNMET")
            }
            ApiError::Rejected(_) => (StatusCode::UNPROCESSABLE_ENTITY, "ON_CHAIN_REJECTION"),
            ApiError::BadGateway(_) => (StatusCode::BAD_GATEWAY, "REMOTE_UNAVAILABLE"),
            ApiError::GatewayTimeout(_) => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}

/// JSON body extractor whose rejections use the API error shape
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(Self(value))
    }
}

pub fn parse_address(field: &str, value: &str) -> ApiResult<Pubkey> {
    Pubkey::from_str(value.trim())
        .map_err(|_| ApiError::BadRequest(format!("{field} is not a valid address: {value}")))
}

/// Accept u64 amounts as JSON numbers or decimal strings
pub fn deserialize_amount<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Number(u64),
        Text(String),
    }

    match Amount::deserialize(deserializer)? {
        Amount::Number(n) => Ok(n),
        Amount::Text(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid amount: {s}"))),
    }
}

pub fn deserialize_optional_amount<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "deserialize_amount")] u64);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|Wrapper(v)| v))
}
