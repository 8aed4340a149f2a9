use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use jarvis_core::{DomainError, DomainResult, EntityId, EntityType, TenantContext, TenantId, UserId};
use jarvis_query::{
    CmpOp, ColumnSet, FilterBuilder, ListOptions, ListQuery, Record, Reference, Resource, SortOrder,
    SqlValue,
};

/// Pipeline stage of a proposal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    #[default]
    Draft,
    Sent,
    Analyzing,
    Approved,
    Rejected,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Draft => "draft",
            ProposalStatus::Sent => "sent",
            ProposalStatus::Analyzing => "analyzing",
            ProposalStatus::Approved => "approved",
            ProposalStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for ProposalStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ProposalStatus::Draft),
            "sent" => Ok(ProposalStatus::Sent),
            "analyzing" => Ok(ProposalStatus::Analyzing),
            "approved" => Ok(ProposalStatus::Approved),
            "rejected" => Ok(ProposalStatus::Rejected),
            other => Err(DomainError::validation(format!("unknown proposal status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Proposal {
    pub id: EntityId,
    pub tenant_id: TenantId,
    pub client_id: EntityId,
    pub product_id: EntityId,
    pub value: f64,
    pub commission: Option<f64>,
    pub installments: i64,
    pub status: ProposalStatus,
    pub valid_until: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProposal {
    pub client_id: EntityId,
    pub product_id: EntityId,
    pub value: f64,
    #[serde(default)]
    pub commission: Option<f64>,
    #[serde(default)]
    pub installments: Option<i64>,
    #[serde(default)]
    pub status: Option<ProposalStatus>,
    #[serde(default)]
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProposalPatch {
    pub client_id: Option<EntityId>,
    pub product_id: Option<EntityId>,
    pub value: Option<f64>,
    pub commission: Option<f64>,
    pub installments: Option<i64>,
    pub status: Option<ProposalStatus>,
    pub valid_until: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProposalFilter {
    pub client_id: Option<EntityId>,
    pub product_id: Option<EntityId>,
    pub status: Option<ProposalStatus>,
    /// Inclusive bounds on `created_at`.
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub order_by: Option<String>,
    pub order: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProposalSummary {
    pub id: EntityId,
    pub value: f64,
    pub status: ProposalStatus,
}

const PROPOSAL_COLUMNS: &ColumnSet = &ColumnSet {
    table: "proposals",
    search: &[],
    sortable: &["created_at", "updated_at", "value", "status"],
    default_sort: "created_at",
    default_order: SortOrder::Desc,
    unique: &[],
};

fn check_amounts(value: Option<f64>, commission: Option<f64>, installments: Option<i64>) -> DomainResult<()> {
    if value.is_some_and(|v| !v.is_finite() || v < 0.0) {
        return Err(DomainError::validation("value must be positive"));
    }
    if commission.is_some_and(|c| !c.is_finite() || c < 0.0) {
        return Err(DomainError::validation("commission must be positive"));
    }
    if installments.is_some_and(|n| n < 1) {
        return Err(DomainError::validation("installments must be at least 1"));
    }
    Ok(())
}

/// Timestamp column stamped when a proposal enters `status`.
fn decision_stamp(status: ProposalStatus) -> Option<&'static str> {
    match status {
        ProposalStatus::Approved => Some("approved_at"),
        ProposalStatus::Rejected => Some("rejected_at"),
        _ => None,
    }
}

impl ListOptions for ProposalFilter {
    fn to_query(&self, ctx: &TenantContext) -> ListQuery {
        FilterBuilder::new(ctx, PROPOSAL_COLUMNS)
            .eq("client_id", self.client_id)
            .eq("product_id", self.product_id)
            .eq("status", self.status.map(|s| s.as_str()))
            .cmp("created_at", CmpOp::Gte, self.date_from)
            .cmp("created_at", CmpOp::Lte, self.date_to)
            .order(self.order_by.as_deref(), self.order.as_deref())
            .page(self.limit, self.offset)
            .build()
    }
}

impl Record for Proposal {
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
            "client_id" => self.client_id.into(),
            "product_id" => self.product_id.into(),
            "value" => self.value.into(),
            "commission" => self.commission.into(),
            "installments" => self.installments.into(),
            "status" => self.status.as_str().into(),
            "valid_until" => self.valid_until.into(),
            "notes" => self.notes.clone().into(),
            "rejection_reason" => self.rejection_reason.clone().into(),
            "approved_at" => self.approved_at.into(),
            "rejected_at" => self.rejected_at.into(),
            "created_by" => self.created_by.into(),
            "created_at" => self.created_at.into(),
            "updated_at" => self.updated_at.into(),
            "deleted_at" => self.deleted_at.into(),
            _ => SqlValue::Text(None),
        }
    }
}

impl Resource for Proposal {
    const ENTITY: EntityType = EntityType::Proposal;
    const COLUMNS: &'static ColumnSet = PROPOSAL_COLUMNS;
    const INSERT_COLUMNS: &'static [&'static str] = &[
        "client_id",
        "product_id",
        "value",
        "commission",
        "installments",
        "status",
        "valid_until",
        "notes",
        "approved_at",
        "rejected_at",
        "created_by",
        "created_at",
        "updated_at",
    ];

    type New = NewProposal;
    type Patch = ProposalPatch;
    type Filter = ProposalFilter;
    type Summary = ProposalSummary;

    fn validate_new(new: &NewProposal) -> DomainResult<()> {
        check_amounts(Some(new.value), new.commission, new.installments)
    }

    fn validate_patch(patch: &ProposalPatch) -> DomainResult<()> {
        check_amounts(patch.value, patch.commission, patch.installments)
    }

    fn references_of_new(new: &NewProposal) -> Vec<Reference> {
        vec![
            Reference::new(EntityType::Client, new.client_id),
            Reference::new(EntityType::Product, new.product_id),
        ]
    }

    fn references_of_patch(patch: &ProposalPatch) -> Vec<Reference> {
        let mut refs = Vec::new();
        if let Some(client_id) = patch.client_id {
            refs.push(Reference::new(EntityType::Client, client_id));
        }
        if let Some(product_id) = patch.product_id {
            refs.push(Reference::new(EntityType::Product, product_id));
        }
        refs
    }

    fn create(id: EntityId, ctx: &TenantContext, actor: UserId, now: DateTime<Utc>, new: NewProposal) -> Self {
        let status = new.status.unwrap_or_default();
        let stamp = decision_stamp(status);
        Proposal {
            id,
            tenant_id: ctx.tenant_id(),
            client_id: new.client_id,
            product_id: new.product_id,
            value: new.value,
            commission: new.commission,
            installments: new.installments.unwrap_or(1),
            status,
            valid_until: new.valid_until,
            notes: new.notes,
            rejection_reason: None,
            approved_at: (stamp == Some("approved_at")).then_some(now),
            rejected_at: (stamp == Some("rejected_at")).then_some(now),
            created_by: Some(actor),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    fn changes(patch: &ProposalPatch, now: DateTime<Utc>) -> Vec<(&'static str, SqlValue)> {
        let mut out: Vec<(&'static str, SqlValue)> = Vec::new();
        if let Some(client_id) = patch.client_id {
            out.push(("client_id", client_id.into()));
        }
        if let Some(product_id) = patch.product_id {
            out.push(("product_id", product_id.into()));
        }
        if let Some(value) = patch.value {
            out.push(("value", value.into()));
        }
        if let Some(commission) = patch.commission {
            out.push(("commission", commission.into()));
        }
        if let Some(installments) = patch.installments {
            out.push(("installments", installments.into()));
        }
        if let Some(status) = patch.status {
            out.push(("status", status.as_str().into()));
            if let Some(column) = decision_stamp(status) {
                out.push((column, now.into()));
            }
        }
        if let Some(valid_until) = patch.valid_until {
            out.push(("valid_until", valid_until.into()));
        }
        if let Some(notes) = &patch.notes {
            out.push(("notes", notes.as_str().into()));
        }
        if let Some(reason) = &patch.rejection_reason {
            out.push(("rejection_reason", reason.as_str().into()));
        }
        out
    }

    fn apply(&mut self, patch: &ProposalPatch, now: DateTime<Utc>) {
        if let Some(client_id) = patch.client_id {
            self.client_id = client_id;
        }
        if let Some(product_id) = patch.product_id {
            self.product_id = product_id;
        }
        if let Some(value) = patch.value {
            self.value = value;
        }
        if patch.commission.is_some() {
            self.commission = patch.commission;
        }
        if let Some(installments) = patch.installments {
            self.installments = installments;
        }
        if let Some(status) = patch.status {
            self.status = status;
            match decision_stamp(status) {
                Some("approved_at") => self.approved_at = Some(now),
                Some("rejected_at") => self.rejected_at = Some(now),
                _ => {}
            }
        }
        if patch.valid_until.is_some() {
            self.valid_until = patch.valid_until;
        }
        if patch.notes.is_some() {
            self.notes.clone_from(&patch.notes);
        }
        if patch.rejection_reason.is_some() {
            self.rejection_reason.clone_from(&patch.rejection_reason);
        }
        self.updated_at = now;
    }

    fn mark_deleted(&mut self, at: DateTime<Utc>) {
        self.deleted_at = Some(at);
    }

    fn summary(&self) -> ProposalSummary {
        ProposalSummary {
            id: self.id,
            value: self.value,
            status: self.status,
        }
    }

    fn display_name(&self) -> String {
        format!("proposal {:.2}", self.value)
    }

    fn reference(&self) -> Option<String> {
        Some(self.client_id.to_string())
    }
}
