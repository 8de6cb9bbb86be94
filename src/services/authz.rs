//! Authorization decisions shared by the tender and bid state machines
//!
//! A missing affiliation never surfaces as "not found" here: it is a
//! denial, reported as [`ServiceError::NotEnoughPermissions`].

use uuid::Uuid;

use super::{IdentityResolver, ServiceError, ServiceResult};
use crate::domain::Ownership;

#[derive(Clone)]
pub struct Authorizer {
    identities: IdentityResolver,
}

impl Authorizer {
    pub fn new(identities: IdentityResolver) -> Self {
        Self { identities }
    }

    /// Whether `actor` may act on something owned by `owner`
    pub async fn is_allowed(&self, actor: Uuid, owner: Ownership) -> ServiceResult<bool> {
        let allowed = match owner {
            Ownership::User(identity_id) => actor == identity_id,
            Ownership::Organization(organization_id) => {
                self.identities.affiliation(actor).await? == Some(organization_id)
            }
            Ownership::AuthorOrganization(author_id) => {
                match self.identities.affiliation(actor).await? {
                    Some(actor_org) => {
                        self.identities.affiliation(author_id).await? == Some(actor_org)
                    }
                    None => false,
                }
            }
        };
        Ok(allowed)
    }

    /// Fails with `NotEnoughPermissions` unless `actor` may act for `owner`
    pub async fn authorize(&self, actor: Uuid, owner: Ownership) -> ServiceResult<()> {
        if self.is_allowed(actor, owner).await? {
            return Ok(());
        }
        tracing::debug!(actor = %actor, owner = ?owner, "Authorization denied");
        Err(ServiceError::NotEnoughPermissions)
    }
}
