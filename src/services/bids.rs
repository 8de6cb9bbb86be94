//! Bid lifecycle
//!
//! `Created -> Published -> Canceled`, plus an independent decision
//! (`Approved`/`Rejected`) recorded by the tender's organization. An approval
//! closes the tender in the same unit of work.

use std::sync::Arc;
use uuid::Uuid;

use super::{Authorizer, Entity, IdentityResolver, ServiceError, ServiceResult};
use crate::domain::{
    archive, AuthorType, Bid, BidDecision, BidPatch, BidStatus, NewBid, Ownership, Revision,
    TenderStatus, TransitionError,
};
use crate::store::{BidStore, Page, TenderStore};

#[derive(Clone)]
pub struct BidService {
    store: Arc<dyn BidStore>,
    tenders: Arc<dyn TenderStore>,
    identities: IdentityResolver,
    authorizer: Authorizer,
}

impl BidService {
    pub fn new(
        store: Arc<dyn BidStore>,
        tenders: Arc<dyn TenderStore>,
        identities: IdentityResolver,
        authorizer: Authorizer,
    ) -> Self {
        Self {
            store,
            tenders,
            identities,
            authorizer,
        }
    }

    /// Submits a bid against an open tender.
    ///
    /// An organization-authored bid requires the author to be responsible
    /// for some organization, not necessarily the tender's.
    pub async fn create(&self, input: NewBid) -> ServiceResult<Bid> {
        let tender = self
            .tenders
            .get_tender_by_id(input.tender_id)
            .await
            .map_err(ServiceError::store(Entity::Tender))?;
        tender.status.ensure_open()?;

        if !self.identities.identity_exists(input.author_id).await? {
            return Err(ServiceError::NotFound(Entity::User));
        }
        if input.author_type == AuthorType::Organization
            && self.identities.affiliation(input.author_id).await?.is_none()
        {
            return Err(ServiceError::NotEnoughPermissions);
        }

        let bid = self
            .store
            .create_bid(input)
            .await
            .map_err(ServiceError::store(Entity::Bid))?;

        tracing::info!(
            bid_id = %bid.id,
            tender_id = %bid.tender_id,
            author_id = %bid.author_id,
            author_type = %bid.author_type,
            "Bid created"
        );
        Ok(bid)
    }

    /// Bids visible to the tender's organization: published and canceled
    /// ones. Drafts stay private to their author.
    pub async fn list_for_tender(
        &self,
        tender_id: Uuid,
        actor: Uuid,
        page: Page,
    ) -> ServiceResult<Vec<Bid>> {
        let tender = self
            .tenders
            .get_tender_by_id(tender_id)
            .await
            .map_err(ServiceError::store(Entity::Tender))?;
        self.authorizer.authorize(actor, tender.owner()).await?;

        self.store
            .list_bids_for_tender(tender_id, page)
            .await
            .map_err(ServiceError::store(Entity::Bid))
    }

    pub async fn list_mine(&self, actor: Uuid, page: Page) -> ServiceResult<Vec<Bid>> {
        self.store
            .list_bids_by_author(actor, page)
            .await
            .map_err(ServiceError::store(Entity::Bid))
    }

    pub async fn get(&self, bid_id: Uuid) -> ServiceResult<Bid> {
        self.store
            .get_bid_by_id(bid_id)
            .await
            .map_err(ServiceError::store(Entity::Bid))
    }

    pub async fn get_status(&self, bid_id: Uuid, actor: Uuid) -> ServiceResult<BidStatus> {
        let bid = self.get(bid_id).await?;
        self.authorizer.authorize(actor, bid.owner()).await?;
        Ok(bid.status)
    }

    pub async fn update_status(
        &self,
        bid_id: Uuid,
        status: BidStatus,
        actor: Uuid,
    ) -> ServiceResult<Bid> {
        let bid = self.get(bid_id).await?;
        bid.status.check_transition(status)?;
        self.authorizer.authorize(actor, bid.owner()).await?;

        let bid = self
            .store
            .set_bid_status(bid_id, status)
            .await
            .map_err(ServiceError::store(Entity::Bid))?;

        tracing::info!(bid_id = %bid.id, status = %bid.status, "Bid status updated");
        Ok(bid)
    }

    pub async fn edit(&self, bid_id: Uuid, patch: BidPatch, actor: Uuid) -> ServiceResult<Bid> {
        if patch.is_empty() {
            return Err(ServiceError::NothingToEdit);
        }
        let bid = self.get(bid_id).await?;
        bid.status.ensure_active()?;
        self.authorizer.authorize(actor, bid.owner()).await?;

        let bid = self
            .store
            .revise_bid(bid_id, Revision::Edit(patch))
            .await
            .map_err(ServiceError::store(Entity::Bid))?;

        tracing::info!(bid_id = %bid.id, version = bid.version, "Bid edited");
        Ok(bid)
    }

    /// Records the tender organization's verdict on a published bid.
    ///
    /// Approving closes the tender if it is still open; the decision and the
    /// closure land together or not at all. A tender that is already closed
    /// does not block the decision.
    pub async fn submit_decision(
        &self,
        bid_id: Uuid,
        decision: BidDecision,
        actor: Uuid,
    ) -> ServiceResult<Bid> {
        let bid = self.get(bid_id).await?;
        match bid.status {
            BidStatus::Canceled => {
                return Err(ServiceError::InvalidTransition(TransitionError::BidCanceled))
            }
            BidStatus::Created => return Err(ServiceError::NotEnoughPermissions),
            BidStatus::Published => {}
        }

        let tender = self
            .tenders
            .get_tender_by_id(bid.tender_id)
            .await
            .map_err(ServiceError::store(Entity::Tender))?;
        self.authorizer
            .authorize(actor, Ownership::Organization(tender.organization_id))
            .await?;

        let close_tender = (decision == BidDecision::Approved
            && tender.status != TenderStatus::Closed)
            .then_some(tender.id);

        let bid = self
            .store
            .set_bid_decision(bid_id, decision, close_tender)
            .await
            .map_err(ServiceError::store(Entity::Bid))?;

        tracing::info!(
            bid_id = %bid.id,
            tender_id = %tender.id,
            decision = %decision,
            tender_closed = close_tender.is_some(),
            "Bid decision submitted"
        );
        Ok(bid)
    }

    /// Restores the fields archived at `version` as a new version
    pub async fn rollback(&self, bid_id: Uuid, version: i32, actor: Uuid) -> ServiceResult<Bid> {
        let bid = self.get(bid_id).await?;
        archive::ensure_rollback_target(version, bid.version).map_err(|_| {
            ServiceError::InvalidRollbackTarget {
                requested: version,
                current: bid.version,
            }
        })?;
        bid.status.ensure_active()?;
        self.authorizer.authorize(actor, bid.owner()).await?;

        let bid = self
            .store
            .revise_bid(bid_id, Revision::Rollback(version))
            .await
            .map_err(ServiceError::store(Entity::Bid))?;

        tracing::info!(
            bid_id = %bid.id,
            restored_version = version,
            version = bid.version,
            "Bid rolled back"
        );
        Ok(bid)
    }
}
