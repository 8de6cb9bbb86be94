//! Version archive semantics
//!
//! Every accepted edit or rollback archives the current row under its
//! current version and writes a new row at `version + 1`. Rollback copies the
//! mutable fields back from an archived snapshot; it never rewinds the
//! counter. Stores call [`revise`] inside their transaction so the archive
//! insert and the row update land together.

use thiserror::Error;

/// An entity that carries a version counter and can be archived
pub trait Versioned: Clone {
    /// Partial field edit
    type Patch;
    /// Full archived copy of the row
    type Snapshot: Clone;

    fn version(&self) -> i32;
    fn set_version(&mut self, version: i32);
    fn snapshot(&self) -> Self::Snapshot;
    fn apply_patch(&mut self, patch: &Self::Patch);
    /// Copy the mutable fields back from an archived snapshot
    fn restore_fields(&mut self, snapshot: &Self::Snapshot);
}

/// A versioned change to an entity's mutable fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revision<P> {
    Edit(P),
    Rollback(i32),
}

impl<P> Revision<P> {
    /// Archived version needed to apply this revision, if any
    pub fn rollback_target(&self) -> Option<i32> {
        match self {
            Self::Edit(_) => None,
            Self::Rollback(version) => Some(*version),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArchiveError {
    #[error("cannot roll back to version {requested}: current version is {current}")]
    NotBehindCurrent { requested: i32, current: i32 },

    #[error("version {0} is not in the archive")]
    VersionNotArchived(i32),
}

/// The archive entry to insert and the row to write in its place
pub struct RevisionOutcome<T: Versioned> {
    pub archived: T::Snapshot,
    pub revised: T,
}

/// Fails unless `requested` names an earlier version than `current`
pub fn ensure_rollback_target(requested: i32, current: i32) -> Result<(), ArchiveError> {
    if requested < 1 || requested >= current {
        return Err(ArchiveError::NotBehindCurrent { requested, current });
    }
    Ok(())
}

/// Computes the result of applying `revision` to `current`.
///
/// `target` is the archived snapshot for a rollback's requested version, as
/// looked up by the caller; it is ignored for edits.
pub fn revise<T: Versioned>(
    current: &T,
    revision: &Revision<T::Patch>,
    target: Option<&T::Snapshot>,
) -> Result<RevisionOutcome<T>, ArchiveError> {
    let archived = current.snapshot();
    let mut revised = current.clone();

    match revision {
        Revision::Edit(patch) => revised.apply_patch(patch),
        Revision::Rollback(version) => {
            ensure_rollback_target(*version, current.version())?;
            let snapshot = target.ok_or(ArchiveError::VersionNotArchived(*version))?;
            revised.restore_fields(snapshot);
        }
    }
    revised.set_version(current.version() + 1);

    Ok(RevisionOutcome { archived, revised })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ServiceType, Tender, TenderPatch, TenderStatus};
    use chrono::Utc;
    use uuid::Uuid;

    fn tender(version: i32) -> Tender {
        Tender {
            id: Uuid::new_v4(),
            name: "Road works".into(),
            description: "Resurface the ring road".into(),
            service_type: ServiceType::Construction,
            status: TenderStatus::Published,
            organization_id: Uuid::new_v4(),
            version,
            creator_id: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn edit_archives_current_and_bumps_version() {
        let current = tender(1);
        let patch = TenderPatch {
            name: Some("Bridge works".into()),
            ..Default::default()
        };

        let outcome = revise(&current, &Revision::Edit(patch), None).unwrap();

        assert_eq!(outcome.archived, current.snapshot());
        assert_eq!(outcome.archived.version, 1);
        assert_eq!(outcome.revised.version, 2);
        assert_eq!(outcome.revised.name, "Bridge works");
        assert_eq!(outcome.revised.description, current.description);
        assert_eq!(outcome.revised.service_type, current.service_type);
    }

    #[test]
    fn rollback_restores_fields_but_not_status_or_owner() {
        let mut old = tender(1);
        old.name = "Original".into();
        old.service_type = ServiceType::Delivery;
        old.status = TenderStatus::Created;
        let snapshot = old.snapshot();

        let mut current = old.clone();
        current.name = "Renamed".into();
        current.service_type = ServiceType::Manufacture;
        current.status = TenderStatus::Published;
        current.version = 3;

        let outcome = revise(&current, &Revision::Rollback(1), Some(&snapshot)).unwrap();

        assert_eq!(outcome.revised.version, 4);
        assert_eq!(outcome.revised.name, "Original");
        assert_eq!(outcome.revised.service_type, ServiceType::Delivery);
        assert_eq!(outcome.revised.status, TenderStatus::Published);
        assert_eq!(outcome.revised.organization_id, current.organization_id);
        assert_eq!(outcome.archived.version, 3);
        assert_eq!(outcome.archived.name, "Renamed");
    }

    #[test]
    fn rollback_to_current_or_later_is_refused() {
        let current = tender(3);
        let snapshot = current.snapshot();
        for requested in [3, 4, 0] {
            let Err(err) = revise(&current, &Revision::Rollback(requested), Some(&snapshot)) else {
                panic!("rollback to {requested} should be refused");
            };
            assert_eq!(
                err,
                ArchiveError::NotBehindCurrent {
                    requested,
                    current: 3
                }
            );
        }
    }

    #[test]
    fn rollback_without_snapshot_is_refused() {
        let current = tender(2);
        let Err(err) = revise(&current, &Revision::Rollback(1), None) else {
            panic!("rollback without a snapshot should be refused");
        };
        assert_eq!(err, ArchiveError::VersionNotArchived(1));
    }
}
