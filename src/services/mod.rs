//! Business services
//!
//! The tender and bid state machines, plus the identity lookups and
//! authorization checks they share. Services are cheap to clone and hold
//! their store behind trait objects.

pub mod authz;
pub mod bids;
pub mod error;
pub mod identity;
pub mod tenders;

pub use authz::Authorizer;
pub use bids::BidService;
pub use error::{Entity, ServiceError, ServiceResult};
pub use identity::IdentityResolver;
pub use tenders::TenderService;

use std::sync::Arc;

use crate::store::{BidStore, IdentityStore, Store, TenderStore};

#[derive(Clone)]
pub struct Services {
    pub identity: IdentityResolver,
    pub authorizer: Authorizer,
    pub tenders: TenderService,
    pub bids: BidService,
}

impl Services {
    /// Wires every service onto one backing store
    pub fn new<S: Store + 'static>(store: Arc<S>) -> Self {
        let identity_store: Arc<dyn IdentityStore> = store.clone();
        let tender_store: Arc<dyn TenderStore> = store.clone();
        let bid_store: Arc<dyn BidStore> = store;

        let identity = IdentityResolver::new(identity_store);
        let authorizer = Authorizer::new(identity.clone());
        let tenders =
            TenderService::new(tender_store.clone(), identity.clone(), authorizer.clone());
        let bids = BidService::new(
            bid_store,
            tender_store,
            identity.clone(),
            authorizer.clone(),
        );

        Self {
            identity,
            authorizer,
            tenders,
            bids,
        }
    }
}
