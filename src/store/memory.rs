//! In-process store
//!
//! Backs the test suites. Writes that span several records run against a
//! staged copy of the state which only replaces the live state once the
//! whole closure succeeded; any early return drops the copy.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};
#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use super::{BidStore, IdentityStore, Page, StoreError, StoreResult, TenderStore};
use crate::domain::{
    archive, Bid, BidDecision, BidPatch, BidSnapshot, BidStatus, NewBid, NewTender, Revision,
    ServiceType, Tender, TenderPatch, TenderSnapshot, TenderStatus,
};

#[derive(Debug, Clone, Default)]
struct State {
    usernames: HashMap<String, Uuid>,
    identities: HashSet<Uuid>,
    organizations: HashMap<Uuid, String>,
    responsible: HashMap<Uuid, Uuid>,
    tenders: HashMap<Uuid, Tender>,
    tender_archive: BTreeMap<(Uuid, i32), TenderSnapshot>,
    bids: HashMap<Uuid, Bid>,
    bid_archive: BTreeMap<(Uuid, i32), BidSnapshot>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
    #[cfg(test)]
    fail_tender_closure: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_organization(&self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.state.write().organizations.insert(id, name.to_string());
        id
    }

    pub fn add_identity(&self, username: &str) -> Uuid {
        let id = Uuid::new_v4();
        let mut state = self.state.write();
        state.usernames.insert(username.to_string(), id);
        state.identities.insert(id);
        id
    }

    /// Makes `identity_id` responsible for `organization_id`
    pub fn assign_responsible(&self, identity_id: Uuid, organization_id: Uuid) {
        self.state
            .write()
            .responsible
            .insert(identity_id, organization_id);
    }

    /// Archived tender versions, oldest first
    pub fn tender_history(&self, tender_id: Uuid) -> Vec<TenderSnapshot> {
        self.state
            .read()
            .tender_archive
            .range((tender_id, i32::MIN)..=(tender_id, i32::MAX))
            .map(|(_, snapshot)| snapshot.clone())
            .collect()
    }

    /// Archived bid versions, oldest first
    pub fn bid_history(&self, bid_id: Uuid) -> Vec<BidSnapshot> {
        self.state
            .read()
            .bid_archive
            .range((bid_id, i32::MIN)..=(bid_id, i32::MAX))
            .map(|(_, snapshot)| snapshot.clone())
            .collect()
    }

    #[cfg(test)]
    fn fail_tender_closure(&self, fail: bool) {
        self.fail_tender_closure.store(fail, Ordering::SeqCst);
    }

    #[cfg(test)]
    fn closure_fault(&self) -> bool {
        self.fail_tender_closure.load(Ordering::SeqCst)
    }

    #[cfg(not(test))]
    fn closure_fault(&self) -> bool {
        false
    }

    fn transaction<T>(&self, f: impl FnOnce(&mut State) -> StoreResult<T>) -> StoreResult<T> {
        let mut live = self.state.write();
        let mut staged = live.clone();
        let out = f(&mut staged)?;
        *live = staged;
        Ok(out)
    }

    fn close_tender(&self, state: &mut State, tender_id: Uuid) -> StoreResult<()> {
        if self.closure_fault() {
            return Err(StoreError::Corrupt("injected tender closure failure".into()));
        }
        let tender = state
            .tenders
            .get_mut(&tender_id)
            .ok_or(StoreError::NotFound)?;
        tender.status = TenderStatus::Closed;
        Ok(())
    }
}

fn sorted_tenders<'a>(tenders: impl Iterator<Item = &'a Tender>) -> Vec<Tender> {
    let mut out: Vec<Tender> = tenders.cloned().collect();
    out.sort_by(|a, b| {
        a.name
            .cmp(&b.name)
            .then(a.created_at.cmp(&b.created_at))
            .then(a.id.cmp(&b.id))
    });
    out
}

fn sorted_bids<'a>(bids: impl Iterator<Item = &'a Bid>) -> Vec<Bid> {
    let mut out: Vec<Bid> = bids.cloned().collect();
    out.sort_by(|a, b| {
        a.name
            .cmp(&b.name)
            .then(a.created_at.cmp(&b.created_at))
            .then(a.id.cmp(&b.id))
    });
    out
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn find_identity_id_by_username(&self, username: &str) -> StoreResult<Uuid> {
        self.state
            .read()
            .usernames
            .get(username)
            .copied()
            .ok_or(StoreError::NotFound)
    }

    async fn find_organization_id_for_identity(&self, identity_id: Uuid) -> StoreResult<Uuid> {
        self.state
            .read()
            .responsible
            .get(&identity_id)
            .copied()
            .ok_or(StoreError::NotFound)
    }

    async fn organization_exists(&self, organization_id: Uuid) -> StoreResult<bool> {
        Ok(self.state.read().organizations.contains_key(&organization_id))
    }

    async fn identity_exists(&self, identity_id: Uuid) -> StoreResult<bool> {
        Ok(self.state.read().identities.contains(&identity_id))
    }
}

#[async_trait]
impl TenderStore for MemoryStore {
    async fn create_tender(&self, new: NewTender) -> StoreResult<Tender> {
        let tender = Tender {
            id: Uuid::new_v4(),
            name: new.name,
            description: new.description,
            service_type: new.service_type,
            status: TenderStatus::Created,
            organization_id: new.organization_id,
            version: 1,
            creator_id: new.creator_id,
            created_at: Utc::now(),
        };
        self.state
            .write()
            .tenders
            .insert(tender.id, tender.clone());
        Ok(tender)
    }

    async fn get_tender_by_id(&self, id: Uuid) -> StoreResult<Tender> {
        self.state
            .read()
            .tenders
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_published_tenders(
        &self,
        service_types: &[ServiceType],
        page: Page,
    ) -> StoreResult<Vec<Tender>> {
        let state = self.state.read();
        let matching = state.tenders.values().filter(|t| {
            t.status == TenderStatus::Published
                && (service_types.is_empty() || service_types.contains(&t.service_type))
        });
        Ok(page.slice(sorted_tenders(matching)))
    }

    async fn list_tenders_by_creator(
        &self,
        creator_id: Uuid,
        page: Page,
    ) -> StoreResult<Vec<Tender>> {
        let state = self.state.read();
        let matching = state.tenders.values().filter(|t| t.creator_id == creator_id);
        Ok(page.slice(sorted_tenders(matching)))
    }

    async fn set_tender_status(&self, id: Uuid, status: TenderStatus) -> StoreResult<Tender> {
        let mut state = self.state.write();
        let tender = state.tenders.get_mut(&id).ok_or(StoreError::NotFound)?;
        tender.status = status;
        Ok(tender.clone())
    }

    async fn revise_tender(
        &self,
        id: Uuid,
        revision: Revision<TenderPatch>,
    ) -> StoreResult<Tender> {
        self.transaction(|state| {
            let current = state.tenders.get(&id).ok_or(StoreError::NotFound)?;
            let target = revision
                .rollback_target()
                .and_then(|version| state.tender_archive.get(&(id, version)));
            let outcome = archive::revise(current, &revision, target)?;

            state
                .tender_archive
                .insert((id, outcome.archived.version), outcome.archived);
            state.tenders.insert(id, outcome.revised.clone());
            Ok(outcome.revised)
        })
    }
}

#[async_trait]
impl BidStore for MemoryStore {
    async fn create_bid(&self, new: NewBid) -> StoreResult<Bid> {
        let bid = Bid {
            id: Uuid::new_v4(),
            name: new.name,
            description: new.description,
            status: BidStatus::Created,
            decision: None,
            tender_id: new.tender_id,
            author_type: new.author_type,
            author_id: new.author_id,
            version: 1,
            created_at: Utc::now(),
        };
        self.state.write().bids.insert(bid.id, bid.clone());
        Ok(bid)
    }

    async fn get_bid_by_id(&self, id: Uuid) -> StoreResult<Bid> {
        self.state
            .read()
            .bids
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_bids_by_author(&self, author_id: Uuid, page: Page) -> StoreResult<Vec<Bid>> {
        let state = self.state.read();
        let matching = state.bids.values().filter(|b| b.author_id == author_id);
        Ok(page.slice(sorted_bids(matching)))
    }

    async fn list_bids_for_tender(&self, tender_id: Uuid, page: Page) -> StoreResult<Vec<Bid>> {
        let state = self.state.read();
        let matching = state
            .bids
            .values()
            .filter(|b| b.tender_id == tender_id && b.status.visible_to_tender_owner());
        Ok(page.slice(sorted_bids(matching)))
    }

    async fn set_bid_status(&self, id: Uuid, status: BidStatus) -> StoreResult<Bid> {
        let mut state = self.state.write();
        let bid = state.bids.get_mut(&id).ok_or(StoreError::NotFound)?;
        bid.status = status;
        Ok(bid.clone())
    }

    async fn revise_bid(&self, id: Uuid, revision: Revision<BidPatch>) -> StoreResult<Bid> {
        self.transaction(|state| {
            let current = state.bids.get(&id).ok_or(StoreError::NotFound)?;
            let target = revision
                .rollback_target()
                .and_then(|version| state.bid_archive.get(&(id, version)));
            let outcome = archive::revise(current, &revision, target)?;

            state
                .bid_archive
                .insert((id, outcome.archived.version), outcome.archived);
            state.bids.insert(id, outcome.revised.clone());
            Ok(outcome.revised)
        })
    }

    async fn set_bid_decision(
        &self,
        id: Uuid,
        decision: BidDecision,
        close_tender: Option<Uuid>,
    ) -> StoreResult<Bid> {
        self.transaction(|state| {
            if let Some(tender_id) = close_tender {
                self.close_tender(state, tender_id)?;
            }
            let bid = state.bids.get_mut(&id).ok_or(StoreError::NotFound)?;
            bid.decision = Some(decision);
            Ok(bid.clone())
        })
    }
}
