//! PostgreSQL store
//!
//! Revisions and decisions run inside a `sqlx::Transaction`; it rolls back
//! when dropped without `commit`, so every `?` between `begin` and `commit`
//! leaves the database untouched.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{BidStore, IdentityStore, Page, StoreError, StoreResult, TenderStore};
use crate::domain::{
    archive, Bid, BidDecision, BidPatch, BidSnapshot, BidStatus, NewBid, NewTender, Revision,
    ServiceType, Tender, TenderPatch, TenderSnapshot, TenderStatus,
};

const TENDER_COLUMNS: &str =
    "id, name, description, service_type, status, organization_id, version, creator_id, created_at";

const BID_COLUMNS: &str =
    "id, name, description, status, decision, tender_id, author_type, author_id, version, created_at";

/// Database row for tender
#[derive(Debug, sqlx::FromRow)]
struct TenderRow {
    id: Uuid,
    name: String,
    description: String,
    service_type: String,
    status: String,
    organization_id: Uuid,
    version: i32,
    creator_id: Uuid,
    created_at: DateTime<Utc>,
}

impl TryFrom<TenderRow> for Tender {
    type Error = StoreError;

    fn try_from(row: TenderRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            description: row.description,
            service_type: parse_label(&row.service_type)?,
            status: parse_label(&row.status)?,
            organization_id: row.organization_id,
            version: row.version,
            creator_id: row.creator_id,
            created_at: row.created_at,
        })
    }
}

/// Database row for archived tender
#[derive(Debug, sqlx::FromRow)]
struct TenderSnapshotRow {
    tender_id: Uuid,
    name: String,
    description: String,
    service_type: String,
    status: String,
    organization_id: Uuid,
    creator_id: Uuid,
    version: i32,
}

impl TryFrom<TenderSnapshotRow> for TenderSnapshot {
    type Error = StoreError;

    fn try_from(row: TenderSnapshotRow) -> Result<Self, Self::Error> {
        Ok(Self {
            tender_id: row.tender_id,
            name: row.name,
            description: row.description,
            service_type: parse_label(&row.service_type)?,
            status: parse_label(&row.status)?,
            organization_id: row.organization_id,
            creator_id: row.creator_id,
            version: row.version,
        })
    }
}

/// Database row for bid
#[derive(Debug, sqlx::FromRow)]
struct BidRow {
    id: Uuid,
    name: String,
    description: String,
    status: String,
    decision: Option<String>,
    tender_id: Uuid,
    author_type: String,
    author_id: Uuid,
    version: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<BidRow> for Bid {
    type Error = StoreError;

    fn try_from(row: BidRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            description: row.description,
            status: parse_label(&row.status)?,
            decision: row.decision.as_deref().map(parse_label).transpose()?,
            tender_id: row.tender_id,
            author_type: parse_label(&row.author_type)?,
            author_id: row.author_id,
            version: row.version,
            created_at: row.created_at,
        })
    }
}

/// Database row for archived bid
#[derive(Debug, sqlx::FromRow)]
struct BidSnapshotRow {
    bid_id: Uuid,
    name: String,
    description: String,
    status: String,
    tender_id: Uuid,
    author_type: String,
    author_id: Uuid,
    version: i32,
}

impl TryFrom<BidSnapshotRow> for BidSnapshot {
    type Error = StoreError;

    fn try_from(row: BidSnapshotRow) -> Result<Self, Self::Error> {
        Ok(Self {
            bid_id: row.bid_id,
            name: row.name,
            description: row.description,
            status: parse_label(&row.status)?,
            tender_id: row.tender_id,
            author_type: parse_label(&row.author_type)?,
            author_id: row.author_id,
            version: row.version,
        })
    }
}

fn parse_label<T>(value: &str) -> StoreResult<T>
where
    T: std::str::FromStr<Err = crate::domain::UnknownLabel>,
{
    value
        .parse()
        .map_err(|e: crate::domain::UnknownLabel| StoreError::Corrupt(e.to_string()))
}

fn tenders_from_rows(rows: Vec<TenderRow>) -> StoreResult<Vec<Tender>> {
    rows.into_iter().map(Tender::try_from).collect()
}

fn bids_from_rows(rows: Vec<BidRow>) -> StoreResult<Vec<Bid>> {
    rows.into_iter().map(Bid::try_from).collect()
}

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Reads and locks the live tender row for the rest of the transaction
    async fn lock_tender(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> StoreResult<Tender> {
        let row = sqlx::query_as::<_, TenderRow>(&format!(
            "SELECT {TENDER_COLUMNS} FROM tenders WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(StoreError::NotFound)?;
        row.try_into()
    }

    async fn lock_bid(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> StoreResult<Bid> {
        let row = sqlx::query_as::<_, BidRow>(&format!(
            "SELECT {BID_COLUMNS} FROM bids WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(StoreError::NotFound)?;
        row.try_into()
    }
}

#[async_trait]
impl IdentityStore for PgStore {
    async fn find_identity_id_by_username(&self, username: &str) -> StoreResult<Uuid> {
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM employee WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn find_organization_id_for_identity(&self, identity_id: Uuid) -> StoreResult<Uuid> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT organization_id FROM organization_responsible WHERE user_id = $1 LIMIT 1",
        )
        .bind(identity_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn organization_exists(&self, organization_id: Uuid) -> StoreResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM organization WHERE id = $1)",
        )
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn identity_exists(&self, identity_id: Uuid) -> StoreResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM employee WHERE id = $1)")
                .bind(identity_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}

#[async_trait]
impl TenderStore for PgStore {
    async fn create_tender(&self, new: NewTender) -> StoreResult<Tender> {
        let row = sqlx::query_as::<_, TenderRow>(&format!(
            r#"
            INSERT INTO tenders (name, description, service_type, status, organization_id, version, creator_id)
            VALUES ($1, $2, $3, $4, $5, 1, $6)
            RETURNING {TENDER_COLUMNS}
            "#
        ))
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.service_type.as_str())
        .bind(TenderStatus::Created.as_str())
        .bind(new.organization_id)
        .bind(new.creator_id)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn get_tender_by_id(&self, id: Uuid) -> StoreResult<Tender> {
        sqlx::query_as::<_, TenderRow>(&format!(
            "SELECT {TENDER_COLUMNS} FROM tenders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?
        .try_into()
    }

    async fn list_published_tenders(
        &self,
        service_types: &[ServiceType],
        page: Page,
    ) -> StoreResult<Vec<Tender>> {
        let service_types: Vec<String> = service_types
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();

        let rows = sqlx::query_as::<_, TenderRow>(&format!(
            r#"
            SELECT {TENDER_COLUMNS}
            FROM tenders
            WHERE status = $1
              AND (cardinality($2::text[]) = 0 OR service_type = ANY($2))
            ORDER BY name ASC, created_at ASC, id ASC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(TenderStatus::Published.as_str())
        .bind(service_types)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;
        tenders_from_rows(rows)
    }

    async fn list_tenders_by_creator(
        &self,
        creator_id: Uuid,
        page: Page,
    ) -> StoreResult<Vec<Tender>> {
        let rows = sqlx::query_as::<_, TenderRow>(&format!(
            r#"
            SELECT {TENDER_COLUMNS}
            FROM tenders
            WHERE creator_id = $1
            ORDER BY name ASC, created_at ASC, id ASC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(creator_id)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;
        tenders_from_rows(rows)
    }

    async fn set_tender_status(&self, id: Uuid, status: TenderStatus) -> StoreResult<Tender> {
        sqlx::query_as::<_, TenderRow>(&format!(
            "UPDATE tenders SET status = $2 WHERE id = $1 RETURNING {TENDER_COLUMNS}"
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?
        .try_into()
    }

    async fn revise_tender(
        &self,
        id: Uuid,
        revision: Revision<TenderPatch>,
    ) -> StoreResult<Tender> {
        let mut tx = self.pool.begin().await?;

        let current = Self::lock_tender(&mut tx, id).await?;

        let target = match revision.rollback_target() {
            Some(version) => sqlx::query_as::<_, TenderSnapshotRow>(
                r#"
                SELECT tender_id, name, description, service_type, status, organization_id, creator_id, version
                FROM tenders_old_version
                WHERE tender_id = $1 AND version = $2
                "#,
            )
            .bind(id)
            .bind(version)
            .fetch_optional(&mut *tx)
            .await?
            .map(TenderSnapshot::try_from)
            .transpose()?,
            None => None,
        };

        let outcome = archive::revise(&current, &revision, target.as_ref())?;
        let archived = &outcome.archived;

        sqlx::query(
            r#"
            INSERT INTO tenders_old_version
                (tender_id, name, description, service_type, status, organization_id, creator_id, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(archived.tender_id)
        .bind(&archived.name)
        .bind(&archived.description)
        .bind(archived.service_type.as_str())
        .bind(archived.status.as_str())
        .bind(archived.organization_id)
        .bind(archived.creator_id)
        .bind(archived.version)
        .execute(&mut *tx)
        .await?;

        let revised = &outcome.revised;
        sqlx::query(
            r#"
            UPDATE tenders
            SET name = $2, description = $3, service_type = $4, version = $5
            WHERE id = $1
            "#,
        )
        .bind(revised.id)
        .bind(&revised.name)
        .bind(&revised.description)
        .bind(revised.service_type.as_str())
        .bind(revised.version)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(outcome.revised)
    }
}

#[async_trait]
impl BidStore for PgStore {
    async fn create_bid(&self, new: NewBid) -> StoreResult<Bid> {
        let row = sqlx::query_as::<_, BidRow>(&format!(
            r#"
            INSERT INTO bids (name, description, status, tender_id, author_type, author_id, version)
            VALUES ($1, $2, $3, $4, $5, $6, 1)
            RETURNING {BID_COLUMNS}
            "#
        ))
        .bind(&new.name)
        .bind(&new.description)
        .bind(BidStatus::Created.as_str())
        .bind(new.tender_id)
        .bind(new.author_type.as_str())
        .bind(new.author_id)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn get_bid_by_id(&self, id: Uuid) -> StoreResult<Bid> {
        sqlx::query_as::<_, BidRow>(&format!("SELECT {BID_COLUMNS} FROM bids WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)?
            .try_into()
    }

    async fn list_bids_by_author(&self, author_id: Uuid, page: Page) -> StoreResult<Vec<Bid>> {
        let rows = sqlx::query_as::<_, BidRow>(&format!(
            r#"
            SELECT {BID_COLUMNS}
            FROM bids
            WHERE author_id = $1
            ORDER BY name ASC, created_at ASC, id ASC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(author_id)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;
        bids_from_rows(rows)
    }

    async fn list_bids_for_tender(&self, tender_id: Uuid, page: Page) -> StoreResult<Vec<Bid>> {
        let rows = sqlx::query_as::<_, BidRow>(&format!(
            r#"
            SELECT {BID_COLUMNS}
            FROM bids
            WHERE tender_id = $1 AND status = ANY($2)
            ORDER BY name ASC, created_at ASC, id ASC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(tender_id)
        .bind(vec![
            BidStatus::Published.as_str().to_string(),
            BidStatus::Canceled.as_str().to_string(),
        ])
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;
        bids_from_rows(rows)
    }

    async fn set_bid_status(&self, id: Uuid, status: BidStatus) -> StoreResult<Bid> {
        sqlx::query_as::<_, BidRow>(&format!(
            "UPDATE bids SET status = $2 WHERE id = $1 RETURNING {BID_COLUMNS}"
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?
        .try_into()
    }

    async fn revise_bid(&self, id: Uuid, revision: Revision<BidPatch>) -> StoreResult<Bid> {
        let mut tx = self.pool.begin().await?;

        let current = Self::lock_bid(&mut tx, id).await?;

        let target = match revision.rollback_target() {
            Some(version) => sqlx::query_as::<_, BidSnapshotRow>(
                r#"
                SELECT bid_id, name, description, status, tender_id, author_type, author_id, version
                FROM bids_old_version
                WHERE bid_id = $1 AND version = $2
                "#,
            )
            .bind(id)
            .bind(version)
            .fetch_optional(&mut *tx)
            .await?
            .map(BidSnapshot::try_from)
            .transpose()?,
            None => None,
        };

        let outcome = archive::revise(&current, &revision, target.as_ref())?;
        let archived = &outcome.archived;

        sqlx::query(
            r#"
            INSERT INTO bids_old_version
                (bid_id, name, description, status, tender_id, author_type, author_id, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(archived.bid_id)
        .bind(&archived.name)
        .bind(&archived.description)
        .bind(archived.status.as_str())
        .bind(archived.tender_id)
        .bind(archived.author_type.as_str())
        .bind(archived.author_id)
        .bind(archived.version)
        .execute(&mut *tx)
        .await?;

        let revised = &outcome.revised;
        sqlx::query("UPDATE bids SET name = $2, description = $3, version = $4 WHERE id = $1")
            .bind(revised.id)
            .bind(&revised.name)
            .bind(&revised.description)
            .bind(revised.version)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(outcome.revised)
    }

    async fn set_bid_decision(
        &self,
        id: Uuid,
        decision: BidDecision,
        close_tender: Option<Uuid>,
    ) -> StoreResult<Bid> {
        let mut tx = self.pool.begin().await?;

        if let Some(tender_id) = close_tender {
            sqlx::query_scalar::<_, Uuid>("UPDATE tenders SET status = $2 WHERE id = $1 RETURNING id")
                .bind(tender_id)
                .bind(TenderStatus::Closed.as_str())
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(StoreError::NotFound)?;
        }

        let bid: Bid = sqlx::query_as::<_, BidRow>(&format!(
            "UPDATE bids SET decision = $2 WHERE id = $1 RETURNING {BID_COLUMNS}"
        ))
        .bind(id)
        .bind(decision.as_str())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound)?
        .try_into()?;

        tx.commit().await?;

        Ok(bid)
    }
}
