use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::archive::Versioned;
use super::{Ownership, TransitionError, UnknownLabel};

/// Bid status
///
/// Same shape as the tender lifecycle but with `Canceled` as the terminal
/// state instead of `Closed`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BidStatus {
    Created,
    Published,
    Canceled,
}

impl Default for BidStatus {
    fn default() -> Self {
        Self::Created
    }
}

impl BidStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "Created",
            Self::Published => "Published",
            Self::Canceled => "Canceled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Canceled)
    }

    pub fn ensure_active(&self) -> Result<(), TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError::BidCanceled);
        }
        Ok(())
    }

    pub fn check_transition(&self, next: BidStatus) -> Result<(), TransitionError> {
        self.ensure_active()?;
        if *self == next {
            return Err(TransitionError::SameStatus);
        }
        if *self == Self::Published && next == Self::Created {
            return Err(TransitionError::Backward);
        }
        Ok(())
    }

    /// Statuses a tender owner is allowed to see when listing bids
    pub fn visible_to_tender_owner(&self) -> bool {
        matches!(self, Self::Published | Self::Canceled)
    }
}

impl FromStr for BidStatus {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Created" => Ok(Self::Created),
            "Published" => Ok(Self::Published),
            "Canceled" => Ok(Self::Canceled),
            other => Err(UnknownLabel::new("bid status", other)),
        }
    }
}

impl fmt::Display for BidStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decision a tender owner submits on a published bid
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BidDecision {
    Approved,
    Rejected,
}

impl BidDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }
}

impl FromStr for BidDecision {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Approved" => Ok(Self::Approved),
            "Rejected" => Ok(Self::Rejected),
            other => Err(UnknownLabel::new("bid decision", other)),
        }
    }
}

impl fmt::Display for BidDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a bid was written by a person or on behalf of their organization
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AuthorType {
    User,
    Organization,
}

impl AuthorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Organization => "Organization",
        }
    }
}

impl FromStr for AuthorType {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "User" => Ok(Self::User),
            "Organization" => Ok(Self::Organization),
            other => Err(UnknownLabel::new("author type", other)),
        }
    }
}

impl fmt::Display for AuthorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bid entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub status: BidStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<BidDecision>,
    pub tender_id: Uuid,
    pub author_type: AuthorType,
    pub author_id: Uuid,
    pub version: i32,
    pub created_at: DateTime<Utc>,
}

impl Bid {
    /// Who controls this bid. The author id is an identity in both cases.
    pub fn owner(&self) -> Ownership {
        match self.author_type {
            AuthorType::User => Ownership::User(self.author_id),
            AuthorType::Organization => Ownership::AuthorOrganization(self.author_id),
        }
    }
}

/// Fields for a bid about to be inserted
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBid {
    pub name: String,
    pub description: String,
    pub tender_id: Uuid,
    pub author_type: AuthorType,
    pub author_id: Uuid,
}

/// Field edit for a bid; `None` keeps the current value
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BidPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl BidPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

/// Archived copy of a bid row at a given version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidSnapshot {
    pub bid_id: Uuid,
    pub name: String,
    pub description: String,
    pub status: BidStatus,
    pub tender_id: Uuid,
    pub author_type: AuthorType,
    pub author_id: Uuid,
    pub version: i32,
}

impl Versioned for Bid {
    type Patch = BidPatch;
    type Snapshot = BidSnapshot;

    fn version(&self) -> i32 {
        self.version
    }

    fn set_version(&mut self, version: i32) {
        self.version = version;
    }

    fn snapshot(&self) -> BidSnapshot {
        BidSnapshot {
            bid_id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            status: self.status,
            tender_id: self.tender_id,
            author_type: self.author_type,
            author_id: self.author_id,
            version: self.version,
        }
    }

    fn apply_patch(&mut self, patch: &BidPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
    }

    fn restore_fields(&mut self, snapshot: &BidSnapshot) {
        self.name = snapshot.name.clone();
        self.description = snapshot.description.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use BidStatus::*;

    #[test]
    fn transition_table() {
        assert_eq!(Created.check_transition(Published), Ok(()));
        assert_eq!(Created.check_transition(Canceled), Ok(()));
        assert_eq!(Published.check_transition(Canceled), Ok(()));
        assert_eq!(
            Published.check_transition(Created),
            Err(TransitionError::Backward)
        );
        assert_eq!(
            Created.check_transition(Created),
            Err(TransitionError::SameStatus)
        );
        for next in [Created, Published, Canceled] {
            assert_eq!(
                Canceled.check_transition(next),
                Err(TransitionError::BidCanceled)
            );
        }
    }

    #[test]
    fn only_published_and_canceled_are_listed_for_tender_owner() {
        assert!(!Created.visible_to_tender_owner());
        assert!(Published.visible_to_tender_owner());
        assert!(Canceled.visible_to_tender_owner());
    }

    #[test]
    fn owner_follows_author_type() {
        let author = Uuid::new_v4();
        let mut bid = Bid {
            id: Uuid::new_v4(),
            name: "Offer".into(),
            description: "Cheap and fast".into(),
            status: Created,
            decision: None,
            tender_id: Uuid::new_v4(),
            author_type: AuthorType::User,
            author_id: author,
            version: 1,
            created_at: Utc::now(),
        };
        assert_eq!(bid.owner(), Ownership::User(author));

        bid.author_type = AuthorType::Organization;
        assert_eq!(bid.owner(), Ownership::AuthorOrganization(author));
    }

    #[test]
    fn decision_is_omitted_until_submitted() {
        let bid = Bid {
            id: Uuid::nil(),
            name: "Offer".into(),
            description: "d".into(),
            status: Published,
            decision: None,
            tender_id: Uuid::nil(),
            author_type: AuthorType::User,
            author_id: Uuid::nil(),
            version: 1,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&bid).unwrap();
        assert!(value.get("decision").is_none());
        assert_eq!(value["authorType"], "User");
    }
}
