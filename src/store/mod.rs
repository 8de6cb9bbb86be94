//! Persistence collaborators
//!
//! The state machines only see these traits. Multi-step writes (archive +
//! update, decision + tender closure) are single trait methods so each
//! implementation can run them inside one transaction.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    ArchiveError, Bid, BidDecision, BidPatch, BidStatus, NewBid, NewTender, Revision, ServiceType,
    Tender, TenderPatch, TenderStatus,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Window into an ordered listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self { limit, offset }
    }

    /// Applies the window to an already sorted iterator
    pub(crate) fn slice<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset.max(0) as usize)
            .take(self.limit.max(0) as usize)
            .collect()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: 5,
            offset: 0,
        }
    }
}

/// Read-only lookups of identities and their organizations
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_identity_id_by_username(&self, username: &str) -> StoreResult<Uuid>;

    /// Organization the identity is responsible for
    async fn find_organization_id_for_identity(&self, identity_id: Uuid) -> StoreResult<Uuid>;

    async fn organization_exists(&self, organization_id: Uuid) -> StoreResult<bool>;

    async fn identity_exists(&self, identity_id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait TenderStore: Send + Sync {
    /// Inserts at version 1 with status `Created`; assigns id and timestamp
    async fn create_tender(&self, tender: NewTender) -> StoreResult<Tender>;

    async fn get_tender_by_id(&self, id: Uuid) -> StoreResult<Tender>;

    /// Published tenders ordered by name; an empty filter matches every type
    async fn list_published_tenders(
        &self,
        service_types: &[ServiceType],
        page: Page,
    ) -> StoreResult<Vec<Tender>>;

    async fn list_tenders_by_creator(&self, creator_id: Uuid, page: Page)
        -> StoreResult<Vec<Tender>>;

    /// Changes status only; the version is left alone
    async fn set_tender_status(&self, id: Uuid, status: TenderStatus) -> StoreResult<Tender>;

    /// Archives the current row and writes the revised one, atomically
    async fn revise_tender(&self, id: Uuid, revision: Revision<TenderPatch>)
        -> StoreResult<Tender>;
}

#[async_trait]
pub trait BidStore: Send + Sync {
    /// Inserts at version 1 with status `Created` and no decision
    async fn create_bid(&self, bid: NewBid) -> StoreResult<Bid>;

    async fn get_bid_by_id(&self, id: Uuid) -> StoreResult<Bid>;

    async fn list_bids_by_author(&self, author_id: Uuid, page: Page) -> StoreResult<Vec<Bid>>;

    /// Published and canceled bids on a tender, ordered by name
    async fn list_bids_for_tender(&self, tender_id: Uuid, page: Page) -> StoreResult<Vec<Bid>>;

    async fn set_bid_status(&self, id: Uuid, status: BidStatus) -> StoreResult<Bid>;

    async fn revise_bid(&self, id: Uuid, revision: Revision<BidPatch>) -> StoreResult<Bid>;

    /// Records a decision. When `close_tender` is set that tender is moved to
    /// `Closed` in the same transaction; if either write fails neither lands.
    async fn set_bid_decision(
        &self,
        id: Uuid,
        decision: BidDecision,
        close_tender: Option<Uuid>,
    ) -> StoreResult<Bid>;
}

/// Everything a backend has to provide
pub trait Store: IdentityStore + TenderStore + BidStore {}

impl<T: IdentityStore + TenderStore + BidStore> Store for T {}
