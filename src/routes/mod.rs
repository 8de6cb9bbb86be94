pub mod bids;
pub mod health;
pub mod tenders;

use axum::{
    routing::{get, patch, post, put},
    Router,
};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router; mounted under `/api`
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(health::ping))
        // Tenders
        .route("/tenders", get(tenders::list_tenders))
        .route("/tenders/new", post(tenders::create_tender))
        .route("/tenders/my", get(tenders::my_tenders))
        .route(
            "/tenders/:tender_id/status",
            get(tenders::get_tender_status).put(tenders::update_tender_status),
        )
        .route("/tenders/:tender_id/edit", patch(tenders::edit_tender))
        .route(
            "/tenders/:tender_id/rollback/:version",
            put(tenders::rollback_tender),
        )
        // Bids
        .route("/bids/new", post(bids::create_bid))
        .route("/bids/my", get(bids::my_bids))
        .route("/bids/list/:tender_id", get(bids::list_bids_for_tender))
        .route(
            "/bids/:bid_id/status",
            get(bids::get_bid_status).put(bids::update_bid_status),
        )
        .route("/bids/:bid_id/edit", patch(bids::edit_bid))
        .route(
            "/bids/:bid_id/submit_decision",
            put(bids::submit_decision),
        )
        .route("/bids/:bid_id/rollback/:version", put(bids::rollback_bid))
}
