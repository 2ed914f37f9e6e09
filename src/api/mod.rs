//! HTTP API over the launchpad engine

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

mod markets;
mod swap;
mod system;
pub mod types;
mod vesting;

pub use types::{ApiError, ApiResult};

use crate::engine::Launchpad;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Launchpad>,
}

impl AppState {
    pub fn new(engine: Arc<Launchpad>) -> Self {
        Self { engine }
    }
}

/// Create the API router with all endpoints, mounted under `/api`
pub fn router(engine: Arc<Launchpad>) -> Router {
    let app_state = AppState::new(engine);

    let api = Router::new()
        // Launchpad config
        .route("/config", post(markets::create_config))
        // Markets
        .route("/markets", post(markets::create_market))
        .route("/markets/free", post(markets::free_market))
        .route("/markets/:address/lifecycle", get(markets::get_lifecycle))
        // Vesting and staking
        .route("/vesting", post(vesting::create_vesting))
        .route("/vesting/release", post(vesting::release_vesting))
        .route("/stake", post(vesting::stake))
        // Swaps
        .route("/swap", post(swap::execute_swap))
        .route("/swap/quote", post(swap::get_quote));

    Router::new()
        .route("/health", get(system::health))
        .nest("/api", api)
        .with_state(app_state)
}
