//! System-level endpoints.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::api::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub wallet: String,
    pub swap_authority: String,
    pub program_id: String,
    pub config_address: String,
    pub rpc_endpoint: String,
}

/// GET /health - Liveness plus the identities this instance signs with.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let engine = &state.engine;
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        wallet: engine.signing().wallet_pubkey().to_string(),
        swap_authority: engine.signing().swap_authority_pubkey().to_string(),
        program_id: engine.settings().program.program_id().to_string(),
        config_address: engine.settings().config_address.to_string(),
        rpc_endpoint: engine.ledger().endpoint().to_string(),
    })
}
