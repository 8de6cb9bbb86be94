#![allow(dead_code)]

use std::sync::Arc;
use uuid::Uuid;

use tender_service::domain::{
    AuthorType, Bid, BidStatus, NewBid, NewTender, ServiceType, Tender, TenderStatus,
};
use tender_service::services::Services;
use tender_service::store::MemoryStore;

/// Two organizations with their responsible employees, plus a freelancer
/// who belongs to none
pub struct World {
    pub store: Arc<MemoryStore>,
    pub services: Services,
    pub acme: Uuid,
    pub globex: Uuid,
    pub alice: Uuid,
    pub bob: Uuid,
    pub carol: Uuid,
    pub dave: Uuid,
    pub freelancer: Uuid,
}

impl World {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let acme = store.add_organization("Acme");
        let globex = store.add_organization("Globex");

        // alice and bob run Acme, carol and dave run Globex
        let alice = store.add_identity("alice");
        let bob = store.add_identity("bob");
        let carol = store.add_identity("carol");
        let dave = store.add_identity("dave");
        let freelancer = store.add_identity("freelancer");
        store.assign_responsible(alice, acme);
        store.assign_responsible(bob, acme);
        store.assign_responsible(carol, globex);
        store.assign_responsible(dave, globex);

        let services = Services::new(store.clone());
        Self {
            store,
            services,
            acme,
            globex,
            alice,
            bob,
            carol,
            dave,
            freelancer,
        }
    }

    pub fn tender_input(&self, name: &str, service_type: ServiceType) -> NewTender {
        NewTender {
            name: name.to_string(),
            description: format!("{name} description"),
            service_type,
            organization_id: self.acme,
            creator_id: self.alice,
        }
    }

    /// Acme tender created by alice
    pub async fn tender(&self, name: &str) -> Tender {
        self.services
            .tenders
            .create(self.alice, self.tender_input(name, ServiceType::Construction))
            .await
            .expect("create tender")
    }

    pub async fn published_tender(&self, name: &str) -> Tender {
        let tender = self.tender(name).await;
        self.services
            .tenders
            .update_status(tender.id, TenderStatus::Published, self.alice)
            .await
            .expect("publish tender")
    }

    pub fn bid_input(&self, tender_id: Uuid, author_type: AuthorType, author_id: Uuid) -> NewBid {
        NewBid {
            name: "Offer".to_string(),
            description: "We deliver on time".to_string(),
            tender_id,
            author_type,
            author_id,
        }
    }

    pub async fn bid(&self, tender_id: Uuid, author_type: AuthorType, author_id: Uuid) -> Bid {
        self.services
            .bids
            .create(self.bid_input(tender_id, author_type, author_id))
            .await
            .expect("create bid")
    }

    pub async fn published_bid(
        &self,
        tender_id: Uuid,
        author_type: AuthorType,
        author_id: Uuid,
    ) -> Bid {
        let bid = self.bid(tender_id, author_type, author_id).await;
        self.services
            .bids
            .update_status(bid.id, BidStatus::Published, author_id)
            .await
            .expect("publish bid")
    }
}
