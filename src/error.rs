//! HTTP error mapping
//!
//! Every failure leaves the API as `{"reason": .., "code": ..}` with a status
//! chosen from the service error kind.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::services::{Entity, ServiceError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Malformed request shape: bad query value, oversized field, bad JSON
    #[error("{0}")]
    BadRequest(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub reason: String,
    pub code: String,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Service(err) => match err {
                ServiceError::NotFound(Entity::User) => StatusCode::UNAUTHORIZED,
                ServiceError::NotFound(Entity::Organization) => StatusCode::BAD_REQUEST,
                ServiceError::NotFound(Entity::Tender | Entity::Bid) => StatusCode::NOT_FOUND,
                ServiceError::NotEnoughPermissions => StatusCode::FORBIDDEN,
                ServiceError::InvalidTransition(_)
                | ServiceError::InvalidRollbackTarget { .. }
                | ServiceError::VersionNotArchived(_)
                | ServiceError::NothingToEdit => StatusCode::BAD_REQUEST,
                ServiceError::Dependency(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Service(err) => match err {
                ServiceError::NotFound(Entity::User) => "UNAUTHORIZED",
                ServiceError::NotFound(Entity::Organization) => "ORGANIZATION_NOT_FOUND",
                ServiceError::NotFound(_) => "NOT_FOUND",
                ServiceError::NotEnoughPermissions => "FORBIDDEN",
                ServiceError::InvalidTransition(_) => "INVALID_TRANSITION",
                ServiceError::InvalidRollbackTarget { .. } | ServiceError::VersionNotArchived(_) => {
                    "INVALID_ROLLBACK_TARGET"
                }
                ServiceError::NothingToEdit => "NOTHING_TO_EDIT",
                ServiceError::Dependency(_) => "INTERNAL_ERROR",
            },
            Self::BadRequest(_) => "BAD_REQUEST",
        }
    }

    fn public_message(&self) -> String {
        match self {
            // Don't leak storage details
            Self::Service(ServiceError::Dependency(_)) => "an internal error occurred".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Service(ServiceError::Dependency(e)) => {
                tracing::error!(error = ?e, "Storage failure while serving request");
            }
            _ => {
                tracing::warn!(error = %self, "API error");
            }
        }

        let status = self.status_code();
        let body = ErrorResponse {
            reason: self.public_message(),
            code: self.error_code().to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
