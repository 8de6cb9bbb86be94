use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::archive::Versioned;
use super::{Ownership, TransitionError, UnknownLabel};

/// Kind of service a tender procures
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ServiceType {
    Construction,
    Delivery,
    Manufacture,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Construction => "Construction",
            Self::Delivery => "Delivery",
            Self::Manufacture => "Manufacture",
        }
    }
}

impl FromStr for ServiceType {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Construction" => Ok(Self::Construction),
            "Delivery" => Ok(Self::Delivery),
            "Manufacture" => Ok(Self::Manufacture),
            other => Err(UnknownLabel::new("service type", other)),
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tender status
///
/// `Created -> Published -> Closed`, with `Created -> Closed` allowed as a
/// shortcut. `Closed` is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TenderStatus {
    Created,
    Published,
    Closed,
}

impl Default for TenderStatus {
    fn default() -> Self {
        Self::Created
    }
}

impl TenderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "Created",
            Self::Published => "Published",
            Self::Closed => "Closed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Fails when the tender is closed, i.e. no further activity is allowed
    pub fn ensure_open(&self) -> Result<(), TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError::TenderClosed);
        }
        Ok(())
    }

    /// Checks whether moving from `self` to `next` is a legal status update
    pub fn check_transition(&self, next: TenderStatus) -> Result<(), TransitionError> {
        self.ensure_open()?;
        if *self == next {
            return Err(TransitionError::SameStatus);
        }
        if *self == Self::Published && next == Self::Created {
            return Err(TransitionError::Backward);
        }
        Ok(())
    }
}

impl FromStr for TenderStatus {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Created" => Ok(Self::Created),
            "Published" => Ok(Self::Published),
            "Closed" => Ok(Self::Closed),
            other => Err(UnknownLabel::new("tender status", other)),
        }
    }
}

impl fmt::Display for TenderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tender entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Tender {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub service_type: ServiceType,
    pub status: TenderStatus,
    pub organization_id: Uuid,
    pub version: i32,
    pub creator_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Tender {
    /// Tenders always belong to an organization
    pub fn owner(&self) -> Ownership {
        Ownership::Organization(self.organization_id)
    }
}

/// Fields for a tender about to be inserted
#[derive(Debug, Clone)]
pub struct NewTender {
    pub name: String,
    pub description: String,
    pub service_type: ServiceType,
    pub organization_id: Uuid,
    pub creator_id: Uuid,
}

/// Field edit for a tender; `None` keeps the current value
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TenderPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub service_type: Option<ServiceType>,
}

impl TenderPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.service_type.is_none()
    }
}

/// Archived copy of a tender row at a given version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenderSnapshot {
    pub tender_id: Uuid,
    pub name: String,
    pub description: String,
    pub service_type: ServiceType,
    pub status: TenderStatus,
    pub organization_id: Uuid,
    pub creator_id: Uuid,
    pub version: i32,
}

impl Versioned for Tender {
    type Patch = TenderPatch;
    type Snapshot = TenderSnapshot;

    fn version(&self) -> i32 {
        self.version
    }

    fn set_version(&mut self, version: i32) {
        self.version = version;
    }

    fn snapshot(&self) -> TenderSnapshot {
        TenderSnapshot {
            tender_id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            service_type: self.service_type,
            status: self.status,
            organization_id: self.organization_id,
            creator_id: self.creator_id,
            version: self.version,
        }
    }

    fn apply_patch(&mut self, patch: &TenderPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(service_type) = patch.service_type {
            self.service_type = service_type;
        }
    }

    fn restore_fields(&mut self, snapshot: &TenderSnapshot) {
        self.name = snapshot.name.clone();
        self.description = snapshot.description.clone();
        self.service_type = snapshot.service_type;
    }
}
