//! Row mapping for the resource tables.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use jarvis_clients::{Client, ClientType};
use jarvis_core::{EntityId, TenantId, UserId};
use jarvis_followups::{Followup, FollowupStatus, FollowupType};
use jarvis_products::Product;
use jarvis_proposals::{Proposal, ProposalStatus};

use super::PgRecord;

pub(crate) fn parse<T>(row: &PgRow, column: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

pub(crate) fn entity_id(row: &PgRow, column: &str) -> Result<EntityId, sqlx::Error> {
    row.try_get::<Uuid, _>(column).map(EntityId::from_uuid)
}

pub(crate) fn opt_entity_id(row: &PgRow, column: &str) -> Result<Option<EntityId>, sqlx::Error> {
    Ok(row.try_get::<Option<Uuid>, _>(column)?.map(EntityId::from_uuid))
}

pub(crate) fn opt_user_id(row: &PgRow, column: &str) -> Result<Option<UserId>, sqlx::Error> {
    Ok(row.try_get::<Option<Uuid>, _>(column)?.map(UserId::from_uuid))
}

pub(crate) fn tenant_id(row: &PgRow) -> Result<TenantId, sqlx::Error> {
    row.try_get::<Uuid, _>("tenant_id").map(TenantId::from_uuid)
}

type Stamps = (DateTime<Utc>, DateTime<Utc>, Option<DateTime<Utc>>);

fn stamps(row: &PgRow) -> Result<Stamps, sqlx::Error> {
    Ok((
        row.try_get("created_at")?,
        row.try_get("updated_at")?,
        row.try_get("deleted_at")?,
    ))
}

impl PgRecord for Client {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let (created_at, updated_at, deleted_at) = stamps(row)?;
        Ok(Client {
            id: entity_id(row, "id")?,
            tenant_id: tenant_id(row)?,
            kind: parse::<ClientType>(row, "type")?,
            name: row.try_get("name")?,
            document: row.try_get("document")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            whatsapp: row.try_get("whatsapp")?,
            address: row.try_get("address")?,
            city: row.try_get("city")?,
            state: row.try_get("state")?,
            zipcode: row.try_get("zipcode")?,
            company_name: row.try_get("company_name")?,
            occupation: row.try_get("occupation")?,
            status: row.try_get("status")?,
            source: row.try_get("source")?,
            tags: row.try_get("tags")?,
            rating: row.try_get("rating")?,
            notes: row.try_get("notes")?,
            created_by: opt_user_id(row, "created_by")?,
            created_at,
            updated_at,
            deleted_at,
        })
    }
}

impl PgRecord for Product {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let (created_at, updated_at, deleted_at) = stamps(row)?;
        Ok(Product {
            id: entity_id(row, "id")?,
            tenant_id: tenant_id(row)?,
            name: row.try_get("name")?,
            category: row.try_get("category")?,
            description: row.try_get("description")?,
            commission_rate: row.try_get("commission_rate")?,
            active: row.try_get("active")?,
            created_at,
            updated_at,
            deleted_at,
        })
    }
}

impl PgRecord for Proposal {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let (created_at, updated_at, deleted_at) = stamps(row)?;
        Ok(Proposal {
            id: entity_id(row, "id")?,
            tenant_id: tenant_id(row)?,
            client_id: entity_id(row, "client_id")?,
            product_id: entity_id(row, "product_id")?,
            value: row.try_get("value")?,
            commission: row.try_get("commission")?,
            installments: row.try_get("installments")?,
            status: parse::<ProposalStatus>(row, "status")?,
            valid_until: row.try_get("valid_until")?,
            notes: row.try_get("notes")?,
            rejection_reason: row.try_get("rejection_reason")?,
            approved_at: row.try_get("approved_at")?,
            rejected_at: row.try_get("rejected_at")?,
            created_by: opt_user_id(row, "created_by")?,
            created_at,
            updated_at,
            deleted_at,
        })
    }
}

impl PgRecord for Followup {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let (created_at, updated_at, deleted_at) = stamps(row)?;
        Ok(Followup {
            id: entity_id(row, "id")?,
            tenant_id: tenant_id(row)?,
            client_id: entity_id(row, "client_id")?,
            proposal_id: opt_entity_id(row, "proposal_id")?,
            kind: parse::<FollowupType>(row, "type")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            due_date: row.try_get("due_date")?,
            status: parse::<FollowupStatus>(row, "status")?,
            result: row.try_get("result")?,
            assigned_to: opt_user_id(row, "assigned_to")?,
            completed_at: row.try_get("completed_at")?,
            created_by: opt_user_id(row, "created_by")?,
            created_at,
            updated_at,
            deleted_at,
        })
    }
}
