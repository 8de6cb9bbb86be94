//! Bid routes
//!
//! Bid submission against tenders, bid versioning, and decisions made by the
//! tender's organization.

use axum::{extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{validation, JsonBody, PaginationParams, PathParams, QueryParams};
use crate::app::AppState;
use crate::auth::RequireUser;
use crate::domain::{Bid, BidDecision, BidPatch, BidStatus, NewBid};
use crate::error::ApiResult;

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: BidStatus,
}

#[derive(Debug, Deserialize)]
pub struct DecisionQuery {
    pub decision: BidDecision,
}

/// POST /api/bids/new
///
/// The author is named in the body by identity id.
pub async fn create_bid(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<NewBid>,
) -> ApiResult<Json<Bid>> {
    validation::name("bidName", &req.name)?;
    validation::description("bidDescription", &req.description)?;

    tracing::debug!(
        tender_id = %req.tender_id,
        author_id = %req.author_id,
        author_type = %req.author_type,
        "Creating bid"
    );

    let bid = state.services.bids.create(req).await?;
    Ok(Json(bid))
}

/// GET /api/bids/my
pub async fn my_bids(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    QueryParams(pagination): QueryParams<PaginationParams>,
) -> ApiResult<Json<Vec<Bid>>> {
    let page = pagination.page()?;
    let bids = state.services.bids.list_mine(user.user_id, page).await?;
    Ok(Json(bids))
}

/// GET /api/bids/list/:tender_id
///
/// Only members of the tender's organization; drafts are not listed.
pub async fn list_bids_for_tender(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    PathParams(tender_id): PathParams<Uuid>,
    QueryParams(pagination): QueryParams<PaginationParams>,
) -> ApiResult<Json<Vec<Bid>>> {
    let page = pagination.page()?;
    let bids = state
        .services
        .bids
        .list_for_tender(tender_id, user.user_id, page)
        .await?;
    Ok(Json(bids))
}

/// GET /api/bids/:bid_id/status
pub async fn get_bid_status(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    PathParams(bid_id): PathParams<Uuid>,
) -> ApiResult<Json<BidStatus>> {
    let status = state.services.bids.get_status(bid_id, user.user_id).await?;
    Ok(Json(status))
}

/// PUT /api/bids/:bid_id/status?status=
pub async fn update_bid_status(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    PathParams(bid_id): PathParams<Uuid>,
    QueryParams(query): QueryParams<StatusQuery>,
) -> ApiResult<Json<Bid>> {
    let bid = state
        .services
        .bids
        .update_status(bid_id, query.status, user.user_id)
        .await?;
    Ok(Json(bid))
}

/// PATCH /api/bids/:bid_id/edit
pub async fn edit_bid(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    PathParams(bid_id): PathParams<Uuid>,
    JsonBody(patch): JsonBody<BidPatch>,
) -> ApiResult<Json<Bid>> {
    if let Some(name) = &patch.name {
        validation::name("bidName", name)?;
    }
    if let Some(description) = &patch.description {
        validation::description("bidDescription", description)?;
    }

    let bid = state.services.bids.edit(bid_id, patch, user.user_id).await?;
    Ok(Json(bid))
}

/// PUT /api/bids/:bid_id/submit_decision?decision=
///
/// Made by a member of the tender's organization, not the bid's author.
pub async fn submit_decision(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    PathParams(bid_id): PathParams<Uuid>,
    QueryParams(query): QueryParams<DecisionQuery>,
) -> ApiResult<Json<Bid>> {
    let bid = state
        .services
        .bids
        .submit_decision(bid_id, query.decision, user.user_id)
        .await?;
    Ok(Json(bid))
}

/// PUT /api/bids/:bid_id/rollback/:version
pub async fn rollback_bid(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    PathParams((bid_id, version)): PathParams<(Uuid, i32)>,
) -> ApiResult<Json<Bid>> {
    validation::version(version)?;

    let bid = state
        .services
        .bids
        .rollback(bid_id, version, user.user_id)
        .await?;
    Ok(Json(bid))
}
