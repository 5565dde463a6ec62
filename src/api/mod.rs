pub mod campaigns;
pub mod health;
pub mod reports;
pub mod tracking;
pub mod wallet;

use crate::db::Repository;
use crate::engine::{SettlementEngine, WalletEngine};
use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub settlement: Arc<SettlementEngine>,
    pub wallet: Arc<WalletEngine>,
}

impl AppState {
    pub fn new(
        repo: Arc<Repository>,
        settlement: Arc<SettlementEngine>,
        wallet: Arc<WalletEngine>,
    ) -> Self {
        Self {
            repo,
            settlement,
            wallet,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/t/click/:campaign_code", get(tracking::track_click))
        .route("/t/register", post(tracking::track_register))
        .route("/t/deposit", post(tracking::track_deposit))
        .route("/t/loss", post(tracking::track_loss))
        .route(
            "/v1/owners/:owner_type/:owner_id/balance",
            get(wallet::get_balance),
        )
        .route(
            "/v1/owners/:owner_type/:owner_id/withdrawals",
            post(wallet::create_withdrawal).get(wallet::list_withdrawals),
        )
        .route(
            "/v1/withdrawals/:id",
            patch(wallet::transition_withdrawal),
        )
        .route(
            "/v1/owners/:owner_type/:owner_id/earnings",
            get(reports::get_earnings),
        )
        .route("/v1/reports/overview", get(reports::get_overview))
        .route("/v1/campaigns", post(campaigns::create_campaign))
        .layer(cors)
        .with_state(state)
}
