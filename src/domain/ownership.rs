use uuid::Uuid;

/// Who an entity belongs to, for authorization purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// A single identity; only that identity may act on the entity.
    User(Uuid),
    /// Written by an identity on behalf of its organization. Anyone responsible
    /// for the same organization as the author may act on the entity.
    AuthorOrganization(Uuid),
    /// Owned by an organization directly.
    Organization(Uuid),
}
