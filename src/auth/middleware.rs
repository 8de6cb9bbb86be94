use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::validation;
use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
struct UsernameQuery {
    username: Option<String>,
}

fn username_param(parts: &Parts) -> Result<Option<String>, ApiError> {
    let Query(query) = Query::<UsernameQuery>::try_from_uri(&parts.uri)?;
    Ok(query.username)
}

/// Extractor that requires `?username=` naming a known identity
///
/// Example:
/// ```ignore
/// async fn my_tenders(user: RequireUser) -> impl IntoResponse {
///     format!("Hello, {}", user.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireUser {
    pub user_id: Uuid,
    pub username: String,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let username = username_param(parts)?.unwrap_or_default();
        validation::username(&username)?;

        let user_id = state.services.identity.resolve_identity(&username).await?;
        Ok(RequireUser { user_id, username })
    }
}

/// Like [`RequireUser`], but an absent or empty `username` is allowed.
/// A username that is given must still resolve.
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<RequireUser>);

impl OptionalUser {
    pub fn user_id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|user| user.user_id)
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for OptionalUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match username_param(parts)? {
            Some(username) if !username.is_empty() => {
                let user_id = state.services.identity.resolve_identity(&username).await?;
                Ok(OptionalUser(Some(RequireUser { user_id, username })))
            }
            _ => Ok(OptionalUser(None)),
        }
    }
}
