//! Tender routes
//!
//! Publishing, editing and versioning of tenders owned by organizations.

use axum::{extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{validation, JsonBody, PaginationParams, PathParams, QueryParams};
use crate::app::AppState;
use crate::auth::{OptionalUser, RequireUser};
use crate::domain::{NewTender, ServiceType, Tender, TenderPatch, TenderStatus};
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTenderRequest {
    pub name: String,
    pub description: String,
    pub service_type: ServiceType,
    pub organization_id: Uuid,
    pub creator_username: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: TenderStatus,
}

/// Collects every `service_type=` value from the query string
fn service_type_filter(pairs: &[(String, String)]) -> ApiResult<Vec<ServiceType>> {
    pairs
        .iter()
        .filter(|(key, _)| key == "service_type")
        .map(|(_, value)| {
            value.parse().map_err(|_| {
                ApiError::bad_request(
                    "invalid service_type, must be 'Construction'/'Delivery'/'Manufacture'",
                )
            })
        })
        .collect()
}

/// GET /api/tenders
///
/// Published tenders, public.
pub async fn list_tenders(
    State(state): State<Arc<AppState>>,
    QueryParams(pagination): QueryParams<PaginationParams>,
    QueryParams(pairs): QueryParams<Vec<(String, String)>>,
) -> ApiResult<Json<Vec<Tender>>> {
    let page = pagination.page()?;
    let service_types = service_type_filter(&pairs)?;

    let tenders = state
        .services
        .tenders
        .list_published(&service_types, page)
        .await?;
    Ok(Json(tenders))
}

/// POST /api/tenders/new
pub async fn create_tender(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<CreateTenderRequest>,
) -> ApiResult<Json<Tender>> {
    validation::name("tenderName", &req.name)?;
    validation::description("tenderDescription", &req.description)?;
    validation::username(&req.creator_username)?;

    tracing::debug!(
        organization_id = %req.organization_id,
        creator = %req.creator_username,
        "Creating tender"
    );

    let creator_id = state
        .services
        .identity
        .resolve_identity(&req.creator_username)
        .await?;

    let tender = state
        .services
        .tenders
        .create(
            creator_id,
            NewTender {
                name: req.name,
                description: req.description,
                service_type: req.service_type,
                organization_id: req.organization_id,
                creator_id,
            },
        )
        .await?;
    Ok(Json(tender))
}

/// GET /api/tenders/my
pub async fn my_tenders(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    QueryParams(pagination): QueryParams<PaginationParams>,
) -> ApiResult<Json<Vec<Tender>>> {
    let page = pagination.page()?;
    let tenders = state.services.tenders.list_mine(user.user_id, page).await?;
    Ok(Json(tenders))
}

/// GET /api/tenders/:tender_id/status
///
/// `username` is optional; published tenders are readable by anyone.
pub async fn get_tender_status(
    user: OptionalUser,
    State(state): State<Arc<AppState>>,
    PathParams(tender_id): PathParams<Uuid>,
) -> ApiResult<Json<TenderStatus>> {
    let status = state
        .services
        .tenders
        .get_status(tender_id, user.user_id())
        .await?;
    Ok(Json(status))
}

/// PUT /api/tenders/:tender_id/status?status=
pub async fn update_tender_status(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    PathParams(tender_id): PathParams<Uuid>,
    QueryParams(query): QueryParams<StatusQuery>,
) -> ApiResult<Json<Tender>> {
    let tender = state
        .services
        .tenders
        .update_status(tender_id, query.status, user.user_id)
        .await?;
    Ok(Json(tender))
}

/// PATCH /api/tenders/:tender_id/edit
pub async fn edit_tender(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    PathParams(tender_id): PathParams<Uuid>,
    JsonBody(patch): JsonBody<TenderPatch>,
) -> ApiResult<Json<Tender>> {
    if let Some(name) = &patch.name {
        validation::name("tenderName", name)?;
    }
    if let Some(description) = &patch.description {
        validation::description("tenderDescription", description)?;
    }

    let tender = state
        .services
        .tenders
        .edit(tender_id, patch, user.user_id)
        .await?;
    Ok(Json(tender))
}

/// PUT /api/tenders/:tender_id/rollback/:version
pub async fn rollback_tender(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    PathParams((tender_id, version)): PathParams<(Uuid, i32)>,
) -> ApiResult<Json<Tender>> {
    validation::version(version)?;

    let tender = state
        .services
        .tenders
        .rollback(tender_id, version, user.user_id)
        .await?;
    Ok(Json(tender))
}
