use std::sync::Arc;
use uuid::Uuid;

use super::{Entity, ServiceError, ServiceResult};
use crate::store::{IdentityStore, StoreError};

/// Lookups of identities and organizational affiliation
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn IdentityStore>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }

    pub async fn resolve_identity(&self, username: &str) -> ServiceResult<Uuid> {
        self.store
            .find_identity_id_by_username(username)
            .await
            .map_err(ServiceError::store(Entity::User))
    }

    /// Organization the identity is responsible for
    pub async fn organization_of(&self, identity_id: Uuid) -> ServiceResult<Uuid> {
        self.store
            .find_organization_id_for_identity(identity_id)
            .await
            .map_err(ServiceError::store(Entity::Organization))
    }

    /// Like [`organization_of`](Self::organization_of), but a missing
    /// affiliation is `None` rather than an error
    pub async fn affiliation(&self, identity_id: Uuid) -> ServiceResult<Option<Uuid>> {
        match self.store.find_organization_id_for_identity(identity_id).await {
            Ok(organization_id) => Ok(Some(organization_id)),
            Err(StoreError::NotFound) => Ok(None),
            Err(err) => Err(ServiceError::from_store(Entity::Organization, err)),
        }
    }

    pub async fn organization_exists(&self, organization_id: Uuid) -> ServiceResult<bool> {
        self.store
            .organization_exists(organization_id)
            .await
            .map_err(ServiceError::store(Entity::Organization))
    }

    pub async fn identity_exists(&self, identity_id: Uuid) -> ServiceResult<bool> {
        self.store
            .identity_exists(identity_id)
            .await
            .map_err(ServiceError::store(Entity::User))
    }
}
