use std::fmt;
use thiserror::Error;

use crate::domain::{ArchiveError, TransitionError};
use crate::store::StoreError;

/// Kind of record a lookup failed to find
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Tender,
    Bid,
    Organization,
    User,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tender => "tender",
            Self::Bid => "bid",
            Self::Organization => "organization",
            Self::User => "user",
        })
    }
}

/// Every failure a tender or bid operation can report
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(Entity),

    #[error("not enough permissions")]
    NotEnoughPermissions,

    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    #[error("cannot roll back to the current and higher version (requested {requested}, current {current})")]
    InvalidRollbackTarget { requested: i32, current: i32 },

    #[error("version {0} is not available for rollback")]
    VersionNotArchived(i32),

    #[error("no parameters for edit")]
    NothingToEdit,

    #[error("storage failure")]
    Dependency(#[source] StoreError),
}

impl ServiceError {
    /// Translates a store failure while working on `entity`
    pub(crate) fn from_store(entity: Entity, err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound(entity),
            StoreError::Archive(ArchiveError::NotBehindCurrent { requested, current }) => {
                Self::InvalidRollbackTarget { requested, current }
            }
            StoreError::Archive(ArchiveError::VersionNotArchived(version)) => {
                Self::VersionNotArchived(version)
            }
            other => {
                tracing::error!(error = %other, entity = %entity, "Store operation failed");
                Self::Dependency(other)
            }
        }
    }

    /// `map_err` adapter for store calls about `entity`
    pub(crate) fn store(entity: Entity) -> impl FnOnce(StoreError) -> Self {
        move |err| Self::from_store(entity, err)
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
