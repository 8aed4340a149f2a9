use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use jarvis_core::{DomainError, DomainResult, EntityId, EntityType, TenantContext, TenantId, UserId};
use jarvis_query::{
    ColumnSet, FilterBuilder, ListOptions, ListQuery, Record, Resource, SortOrder, SqlValue,
    split_list,
};

pub const DEFAULT_STATUS: &str = "lead";
pub const MAX_RATING: i64 = 5;

/// Individual (`PF`) or company (`PJ`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClientType {
    #[serde(rename = "PF")]
    Individual,
    #[serde(rename = "PJ")]
    Company,
}

impl ClientType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientType::Individual => "PF",
            ClientType::Company => "PJ",
        }
    }
}

impl FromStr for ClientType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PF" => Ok(ClientType::Individual),
            "PJ" => Ok(ClientType::Company),
            other => Err(DomainError::validation(format!("client type must be PF or PJ, got '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Client {
    pub id: EntityId,
    pub tenant_id: TenantId,
    #[serde(rename = "type")]
    pub kind: ClientType,
    pub name: String,
    /// CPF/CNPJ; unique among a tenant's live clients.
    pub document: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zipcode: Option<String>,
    pub company_name: Option<String>,
    pub occupation: Option<String>,
    pub status: String,
    pub source: Option<String>,
    pub tags: Vec<String>,
    pub rating: i64,
    pub notes: Option<String>,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewClient {
    #[serde(rename = "type")]
    pub kind: ClientType,
    pub name: String,
    pub document: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub whatsapp: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zipcode: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub rating: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ClientPatch {
    #[serde(rename = "type")]
    pub kind: Option<ClientType>,
    pub name: Option<String>,
    pub document: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zipcode: Option<String>,
    pub company_name: Option<String>,
    pub occupation: Option<String>,
    pub status: Option<String>,
    pub source: Option<String>,
    pub tags: Option<Vec<String>>,
    pub rating: Option<i64>,
    pub notes: Option<String>,
}

/// Recognised list options. Anything else in the query string is ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ClientFilter {
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<ClientType>,
    pub status: Option<String>,
    /// Comma-separated; matches clients carrying any of them.
    pub tags: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub order_by: Option<String>,
    pub order: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientSummary {
    pub id: EntityId,
    pub name: String,
    pub document: String,
}

const CLIENT_COLUMNS: &ColumnSet = &ColumnSet {
    table: "clients",
    search: &["name", "document", "email"],
    sortable: &["name", "created_at", "updated_at", "rating"],
    default_sort: "created_at",
    default_order: SortOrder::Desc,
    unique: &["document"],
};

fn require_text(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(())
}

fn check_rating(rating: Option<i64>) -> DomainResult<()> {
    match rating {
        Some(r) if !(0..=MAX_RATING).contains(&r) => Err(DomainError::validation(format!(
            "rating must be between 0 and {MAX_RATING}"
        ))),
        _ => Ok(()),
    }
}

fn check_email(email: Option<&str>) -> DomainResult<()> {
    match email {
        Some(e) if !e.contains('@') => Err(DomainError::validation("email is invalid")),
        _ => Ok(()),
    }
}

fn normalise_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl ListOptions for ClientFilter {
    fn to_query(&self, ctx: &TenantContext) -> ListQuery {
        FilterBuilder::new(ctx, CLIENT_COLUMNS)
            .search(self.search.as_deref())
            .eq("type", self.kind.map(|k| k.as_str()))
            .eq("status", self.status.as_deref())
            .overlaps("tags", &split_list(self.tags.as_deref()))
            .order(self.order_by.as_deref(), self.order.as_deref())
            .page(self.limit, self.offset)
            .build()
    }
}

impl Record for Client {
    fn id(&self) -> EntityId {
        self.id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn column(&self, name: &str) -> SqlValue {
        match name {
            "id" => self.id.into(),
            "tenant_id" => self.tenant_id.into(),
            "type" => self.kind.as_str().into(),
            "name" => self.name.as_str().into(),
            "document" => self.document.as_str().into(),
            "email" => self.email.clone().into(),
            "phone" => self.phone.clone().into(),
            "whatsapp" => self.whatsapp.clone().into(),
            "address" => self.address.clone().into(),
            "city" => self.city.clone().into(),
            "state" => self.state.clone().into(),
            "zipcode" => self.zipcode.clone().into(),
            "company_name" => self.company_name.clone().into(),
            "occupation" => self.occupation.clone().into(),
            "status" => self.status.as_str().into(),
            "source" => self.source.clone().into(),
            "tags" => self.tags.clone().into(),
            "rating" => self.rating.into(),
            "notes" => self.notes.clone().into(),
            "created_by" => self.created_by.into(),
            "created_at" => self.created_at.into(),
            "updated_at" => self.updated_at.into(),
            "deleted_at" => self.deleted_at.into(),
            _ => SqlValue::Text(None),
        }
    }
}

impl Resource for Client {
    const ENTITY: EntityType = EntityType::Client;
    const COLUMNS: &'static ColumnSet = CLIENT_COLUMNS;
    const INSERT_COLUMNS: &'static [&'static str] = &[
        "type",
        "name",
        "document",
        "email",
        "phone",
        "whatsapp",
        "address",
        "city",
        "state",
        "zipcode",
        "company_name",
        "occupation",
        "status",
        "source",
        "tags",
        "rating",
        "notes",
        "created_by",
        "created_at",
        "updated_at",
    ];

    type New = NewClient;
    type Patch = ClientPatch;
    type Filter = ClientFilter;
    type Summary = ClientSummary;

    fn validate_new(new: &NewClient) -> DomainResult<()> {
        require_text("name", &new.name)?;
        require_text("document", &new.document)?;
        check_email(new.email.as_deref())?;
        check_rating(new.rating)
    }

    fn validate_patch(patch: &ClientPatch) -> DomainResult<()> {
        if let Some(name) = &patch.name {
            require_text("name", name)?;
        }
        if let Some(document) = &patch.document {
            require_text("document", document)?;
        }
        check_email(patch.email.as_deref())?;
        check_rating(patch.rating)
    }

    fn create(id: EntityId, ctx: &TenantContext, actor: UserId, now: DateTime<Utc>, new: NewClient) -> Self {
        Client {
            id,
            tenant_id: ctx.tenant_id(),
            kind: new.kind,
            name: new.name.trim().to_string(),
            document: new.document.trim().to_string(),
            email: new.email.as_deref().map(normalise_email),
            phone: new.phone,
            whatsapp: new.whatsapp,
            address: new.address,
            city: new.city,
            state: new.state,
            zipcode: new.zipcode,
            company_name: new.company_name,
            occupation: new.occupation,
            status: new.status.unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            source: new.source,
            tags: new.tags,
            rating: new.rating.unwrap_or(0),
            notes: new.notes,
            created_by: Some(actor),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    fn changes(patch: &ClientPatch, _now: DateTime<Utc>) -> Vec<(&'static str, SqlValue)> {
        let mut out: Vec<(&'static str, SqlValue)> = Vec::new();
        if let Some(kind) = patch.kind {
            out.push(("type", kind.as_str().into()));
        }
        if let Some(name) = &patch.name {
            out.push(("name", name.trim().into()));
        }
        if let Some(document) = &patch.document {
            out.push(("document", document.trim().into()));
        }
        if let Some(email) = &patch.email {
            out.push(("email", normalise_email(email).into()));
        }
        let optional_text = [
            ("phone", &patch.phone),
            ("whatsapp", &patch.whatsapp),
            ("address", &patch.address),
            ("city", &patch.city),
            ("state", &patch.state),
            ("zipcode", &patch.zipcode),
            ("company_name", &patch.company_name),
            ("occupation", &patch.occupation),
            ("status", &patch.status),
            ("source", &patch.source),
            ("notes", &patch.notes),
        ];
        for (column, value) in optional_text {
            if let Some(v) = value {
                out.push((column, v.as_str().into()));
            }
        }
        if let Some(tags) = &patch.tags {
            out.push(("tags", tags.clone().into()));
        }
        if let Some(rating) = patch.rating {
            out.push(("rating", rating.into()));
        }
        out
    }

    fn apply(&mut self, patch: &ClientPatch, now: DateTime<Utc>) {
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(name) = &patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(document) = &patch.document {
            self.document = document.trim().to_string();
        }
        if let Some(email) = &patch.email {
            self.email = Some(normalise_email(email));
        }
        let optional_text = [
            (&mut self.phone, &patch.phone),
            (&mut self.whatsapp, &patch.whatsapp),
            (&mut self.address, &patch.address),
            (&mut self.city, &patch.city),
            (&mut self.state, &patch.state),
            (&mut self.zipcode, &patch.zipcode),
            (&mut self.company_name, &patch.company_name),
            (&mut self.occupation, &patch.occupation),
            (&mut self.source, &patch.source),
            (&mut self.notes, &patch.notes),
        ];
        for (field, value) in optional_text {
            if value.is_some() {
                field.clone_from(value);
            }
        }
        if let Some(status) = &patch.status {
            self.status = status.clone();
        }
        if let Some(tags) = &patch.tags {
            self.tags = tags.clone();
        }
        if let Some(rating) = patch.rating {
            self.rating = rating;
        }
        self.updated_at = now;
    }

    fn mark_deleted(&mut self, at: DateTime<Utc>) {
        self.deleted_at = Some(at);
    }

    fn summary(&self) -> ClientSummary {
        ClientSummary {
            id: self.id,
            name: self.name.clone(),
            document: self.document.clone(),
        }
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn reference(&self) -> Option<String> {
        Some(self.document.clone())
    }
}
