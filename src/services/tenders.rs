//! Tender lifecycle
//!
//! `Created -> Published -> Closed`. Status updates leave the version alone;
//! field edits and rollbacks archive the current row and bump the version.

use std::sync::Arc;
use uuid::Uuid;

use super::{Authorizer, Entity, IdentityResolver, ServiceError, ServiceResult};
use crate::domain::{
    archive, NewTender, Ownership, Revision, ServiceType, Tender, TenderPatch, TenderStatus,
};
use crate::store::{Page, TenderStore};

#[derive(Clone)]
pub struct TenderService {
    store: Arc<dyn TenderStore>,
    identities: IdentityResolver,
    authorizer: Authorizer,
}

impl TenderService {
    pub fn new(
        store: Arc<dyn TenderStore>,
        identities: IdentityResolver,
        authorizer: Authorizer,
    ) -> Self {
        Self {
            store,
            identities,
            authorizer,
        }
    }

    /// Creates a tender on behalf of `actor`, who must be responsible for
    /// the target organization
    pub async fn create(&self, actor: Uuid, input: NewTender) -> ServiceResult<Tender> {
        if !self
            .identities
            .organization_exists(input.organization_id)
            .await?
        {
            return Err(ServiceError::NotFound(Entity::Organization));
        }
        self.authorizer
            .authorize(actor, Ownership::Organization(input.organization_id))
            .await?;

        let tender = self
            .store
            .create_tender(NewTender {
                creator_id: actor,
                ..input
            })
            .await
            .map_err(ServiceError::store(Entity::Tender))?;

        tracing::info!(
            tender_id = %tender.id,
            organization_id = %tender.organization_id,
            creator_id = %actor,
            "Tender created"
        );
        Ok(tender)
    }

    /// Published tenders, optionally restricted to some service types.
    /// Public: no authorization.
    pub async fn list_published(
        &self,
        service_types: &[ServiceType],
        page: Page,
    ) -> ServiceResult<Vec<Tender>> {
        self.store
            .list_published_tenders(service_types, page)
            .await
            .map_err(ServiceError::store(Entity::Tender))
    }

    /// Every tender `actor` created, whatever its status
    pub async fn list_mine(&self, actor: Uuid, page: Page) -> ServiceResult<Vec<Tender>> {
        self.store
            .list_tenders_by_creator(actor, page)
            .await
            .map_err(ServiceError::store(Entity::Tender))
    }

    pub async fn get(&self, tender_id: Uuid) -> ServiceResult<Tender> {
        self.store
            .get_tender_by_id(tender_id)
            .await
            .map_err(ServiceError::store(Entity::Tender))
    }

    /// Status of a tender. Published tenders are readable by anyone; any
    /// other status requires a member of the owning organization.
    pub async fn get_status(
        &self,
        tender_id: Uuid,
        actor: Option<Uuid>,
    ) -> ServiceResult<TenderStatus> {
        let tender = self.get(tender_id).await?;
        if tender.status == TenderStatus::Published {
            return Ok(tender.status);
        }

        let actor = actor.ok_or(ServiceError::NotEnoughPermissions)?;
        self.authorizer.authorize(actor, tender.owner()).await?;
        Ok(tender.status)
    }

    pub async fn update_status(
        &self,
        tender_id: Uuid,
        status: TenderStatus,
        actor: Uuid,
    ) -> ServiceResult<Tender> {
        let tender = self.get(tender_id).await?;
        tender.status.check_transition(status)?;
        self.authorizer.authorize(actor, tender.owner()).await?;

        let tender = self
            .store
            .set_tender_status(tender_id, status)
            .await
            .map_err(ServiceError::store(Entity::Tender))?;

        tracing::info!(tender_id = %tender.id, status = %tender.status, "Tender status updated");
        Ok(tender)
    }

    /// Edits name, description and/or service type
    pub async fn edit(
        &self,
        tender_id: Uuid,
        patch: TenderPatch,
        actor: Uuid,
    ) -> ServiceResult<Tender> {
        if patch.is_empty() {
            return Err(ServiceError::NothingToEdit);
        }
        let tender = self.get(tender_id).await?;
        tender.status.ensure_open()?;
        self.authorizer.authorize(actor, tender.owner()).await?;

        let tender = self
            .store
            .revise_tender(tender_id, Revision::Edit(patch))
            .await
            .map_err(ServiceError::store(Entity::Tender))?;

        tracing::info!(tender_id = %tender.id, version = tender.version, "Tender edited");
        Ok(tender)
    }

    /// Restores the fields archived at `version` as a new version
    pub async fn rollback(
        &self,
        tender_id: Uuid,
        version: i32,
        actor: Uuid,
    ) -> ServiceResult<Tender> {
        let tender = self.get(tender_id).await?;
        archive::ensure_rollback_target(version, tender.version)
            .map_err(|_| ServiceError::InvalidRollbackTarget {
                requested: version,
                current: tender.version,
            })?;
        tender.status.ensure_open()?;
        self.authorizer.authorize(actor, tender.owner()).await?;

        let tender = self
            .store
            .revise_tender(tender_id, Revision::Rollback(version))
            .await
            .map_err(ServiceError::store(Entity::Tender))?;

        tracing::info!(
            tender_id = %tender.id,
            restored_version = version,
            version = tender.version,
            "Tender rolled back"
        );
        Ok(tender)
    }
}
