//! Domain types for tenders and bids
//!
//! Entities, their status sets and the transition rules between them.
//! Nothing in here touches persistence or HTTP.

pub mod archive;
pub mod bids;
pub mod ownership;
pub mod tenders;

pub use archive::{ArchiveError, Revision, RevisionOutcome, Versioned};
pub use bids::*;
pub use ownership::Ownership;
pub use tenders::*;

use thiserror::Error;

/// Why a status change (or an edit guarded by status) was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("cannot edit closed tender")]
    TenderClosed,

    #[error("cannot edit canceled bid")]
    BidCanceled,

    #[error("impossible change the status to the same")]
    SameStatus,

    #[error("impossible change the status to the previous one")]
    Backward,
}

/// A label that did not match any variant of a domain enum
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind}: {value}")]
pub struct UnknownLabel {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownLabel {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
