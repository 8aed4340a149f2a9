use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use jarvis_core::{DomainError, DomainResult, EntityId, EntityType, TenantContext, TenantId, UserId};
use jarvis_query::{ColumnSet, FilterBuilder, ListOptions, ListQuery, Record, Resource, SortOrder, SqlValue};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: EntityId,
    pub tenant_id: TenantId,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub commission_rate: f64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub commission_rate: Option<f64>,
    #[serde(default)]
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub commission_rate: Option<f64>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProductFilter {
    pub active: Option<bool>,
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub order_by: Option<String>,
    pub order: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSummary {
    pub id: EntityId,
    pub name: String,
}

const PRODUCT_COLUMNS: &ColumnSet = &ColumnSet {
    table: "products",
    search: &[],
    sortable: &["name", "category", "created_at"],
    default_sort: "name",
    default_order: SortOrder::Asc,
    unique: &[],
};

fn check_rate(rate: Option<f64>) -> DomainResult<()> {
    match rate {
        Some(r) if !(0.0..=100.0).contains(&r) => {
            Err(DomainError::validation("commission_rate must be between 0 and 100"))
        }
        _ => Ok(()),
    }
}

impl ListOptions for ProductFilter {
    fn to_query(&self, ctx: &TenantContext) -> ListQuery {
        FilterBuilder::new(ctx, PRODUCT_COLUMNS)
            .eq("active", self.active)
            .eq("category", self.category.as_deref())
            .order(self.order_by.as_deref(), self.order.as_deref())
            .page(self.limit, self.offset)
            .build()
    }
}

impl Record for Product {
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
            "name" => self.name.as_str().into(),
            "category" => self.category.as_str().into(),
            "description" => self.description.clone().into(),
            "commission_rate" => self.commission_rate.into(),
            "active" => self.active.into(),
            "created_at" => self.created_at.into(),
            "updated_at" => self.updated_at.into(),
            "deleted_at" => self.deleted_at.into(),
            _ => SqlValue::Text(None),
        }
    }
}

impl Resource for Product {
    const ENTITY: EntityType = EntityType::Product;
    const COLUMNS: &'static ColumnSet = PRODUCT_COLUMNS;
    const INSERT_COLUMNS: &'static [&'static str] = &[
        "name",
        "category",
        "description",
        "commission_rate",
        "active",
        "created_at",
        "updated_at",
    ];

    type New = NewProduct;
    type Patch = ProductPatch;
    type Filter = ProductFilter;
    type Summary = ProductSummary;

    fn validate_new(new: &NewProduct) -> DomainResult<()> {
        if new.name.trim().is_empty() {
            return Err(DomainError::validation("name is required"));
        }
        if new.category.trim().is_empty() {
            return Err(DomainError::validation("category is required"));
        }
        check_rate(new.commission_rate)
    }

    fn validate_patch(patch: &ProductPatch) -> DomainResult<()> {
        if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(DomainError::validation("name cannot be empty"));
        }
        check_rate(patch.commission_rate)
    }

    fn create(id: EntityId, ctx: &TenantContext, _actor: UserId, now: DateTime<Utc>, new: NewProduct) -> Self {
        Product {
            id,
            tenant_id: ctx.tenant_id(),
            name: new.name.trim().to_string(),
            category: new.category.trim().to_string(),
            description: new.description,
            commission_rate: new.commission_rate.unwrap_or(0.0),
            active: new.active.unwrap_or(true),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    fn changes(patch: &ProductPatch, _now: DateTime<Utc>) -> Vec<(&'static str, SqlValue)> {
        let mut out: Vec<(&'static str, SqlValue)> = Vec::new();
        if let Some(name) = &patch.name {
            out.push(("name", name.trim().into()));
        }
        if let Some(category) = &patch.category {
            out.push(("category", category.trim().into()));
        }
        if let Some(description) = &patch.description {
            out.push(("description", description.as_str().into()));
        }
        if let Some(rate) = patch.commission_rate {
            out.push(("commission_rate", rate.into()));
        }
        if let Some(active) = patch.active {
            out.push(("active", active.into()));
        }
        out
    }

    fn apply(&mut self, patch: &ProductPatch, now: DateTime<Utc>) {
        if let Some(name) = &patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(category) = &patch.category {
            self.category = category.trim().to_string();
        }
        if patch.description.is_some() {
            self.description.clone_from(&patch.description);
        }
        if let Some(rate) = patch.commission_rate {
            self.commission_rate = rate;
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
        self.updated_at = now;
    }

    fn mark_deleted(&mut self, at: DateTime<Utc>) {
        self.deleted_at = Some(at);
    }

    fn summary(&self) -> ProductSummary {
        ProductSummary {
            id: self.id,
            name: self.name.clone(),
        }
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn reference(&self) -> Option<String> {
        Some(self.category.clone())
    }
}
