use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use jarvis_core::{DomainError, DomainResult, EntityId, EntityType, TenantContext, TenantId, UserId};
use jarvis_query::{
    CmpOp, ColumnSet, FilterBuilder, ListOptions, ListQuery, Record, Reference, Resource, SortOrder,
    SqlValue,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowupType {
    Call,
    Email,
    Meeting,
    Visit,
    Whatsapp,
    Other,
}

impl FollowupType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FollowupType::Call => "call",
            FollowupType::Email => "email",
            FollowupType::Meeting => "meeting",
            FollowupType::Visit => "visit",
            FollowupType::Whatsapp => "whatsapp",
            FollowupType::Other => "other",
        }
    }
}

impl FromStr for FollowupType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "call" => Ok(FollowupType::Call),
            "email" => Ok(FollowupType::Email),
            "meeting" => Ok(FollowupType::Meeting),
            "visit" => Ok(FollowupType::Visit),
            "whatsapp" => Ok(FollowupType::Whatsapp),
            "other" => Ok(FollowupType::Other),
            other => Err(DomainError::validation(format!("unknown follow-up type '{other}'"))),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowupStatus {
    #[default]
    Pending,
    Completed,
    Cancelled,
}

impl FollowupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FollowupStatus::Pending => "pending",
            FollowupStatus::Completed => "completed",
            FollowupStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for FollowupStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(FollowupStatus::Pending),
            "completed" => Ok(FollowupStatus::Completed),
            "cancelled" => Ok(FollowupStatus::Cancelled),
            other => Err(DomainError::validation(format!("unknown follow-up status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Followup {
    pub id: EntityId,
    pub tenant_id: TenantId,
    pub client_id: EntityId,
    pub proposal_id: Option<EntityId>,
    #[serde(rename = "type")]
    pub kind: FollowupType,
    pub title: String,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    pub status: FollowupStatus,
    pub result: Option<String>,
    pub assigned_to: Option<UserId>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFollowup {
    pub client_id: EntityId,
    #[serde(default)]
    pub proposal_id: Option<EntityId>,
    #[serde(rename = "type")]
    pub kind: FollowupType,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub status: Option<FollowupStatus>,
    /// Defaults to the user creating the follow-up.
    #[serde(default)]
    pub assigned_to: Option<UserId>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FollowupPatch {
    pub client_id: Option<EntityId>,
    pub proposal_id: Option<EntityId>,
    #[serde(rename = "type")]
    pub kind: Option<FollowupType>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub status: Option<FollowupStatus>,
    pub result: Option<String>,
    pub assigned_to: Option<UserId>,
    /// Set only by [`FollowupPatch::completion`]: a missing result clears the
    /// stored one.
    #[serde(skip)]
    pub clear_result: bool,
}

impl FollowupPatch {
    /// The patch behind the `complete` operation. Always overwrites `result`.
    pub fn completion(result: Option<String>) -> Self {
        FollowupPatch {
            status: Some(FollowupStatus::Completed),
            clear_result: result.is_none(),
            result,
            ..FollowupPatch::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FollowupFilter {
    pub client_id: Option<EntityId>,
    pub proposal_id: Option<EntityId>,
    #[serde(rename = "type")]
    pub kind: Option<FollowupType>,
    pub status: Option<FollowupStatus>,
    pub assigned_to: Option<UserId>,
    /// Inclusive bounds on `due_date`.
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub order_by: Option<String>,
    pub order: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FollowupSummary {
    pub id: EntityId,
    pub title: String,
}

const FOLLOWUP_COLUMNS: &ColumnSet = &ColumnSet {
    table: "followups",
    search: &["title", "description"],
    sortable: &["due_date", "created_at", "title"],
    default_sort: "due_date",
    default_order: SortOrder::Asc,
    unique: &[],
};

impl ListOptions for FollowupFilter {
    fn to_query(&self, ctx: &TenantContext) -> ListQuery {
        FilterBuilder::new(ctx, FOLLOWUP_COLUMNS)
            .eq("client_id", self.client_id)
            .eq("proposal_id", self.proposal_id)
            .eq("type", self.kind.map(|k| k.as_str()))
            .eq("status", self.status.map(|s| s.as_str()))
            .eq("assigned_to", self.assigned_to)
            .cmp("due_date", CmpOp::Gte, self.date_from)
            .cmp("due_date", CmpOp::Lte, self.date_to)
            .order(self.order_by.as_deref(), self.order.as_deref())
            .page(self.limit, self.offset)
            .build()
    }
}

impl Record for Followup {
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
            "proposal_id" => self.proposal_id.into(),
            "type" => self.kind.as_str().into(),
            "title" => self.title.as_str().into(),
            "description" => self.description.clone().into(),
            "due_date" => self.due_date.into(),
            "status" => self.status.as_str().into(),
            "result" => self.result.clone().into(),
            "assigned_to" => self.assigned_to.into(),
            "completed_at" => self.completed_at.into(),
            "created_by" => self.created_by.into(),
            "created_at" => self.created_at.into(),
            "updated_at" => self.updated_at.into(),
            "deleted_at" => self.deleted_at.into(),
            _ => SqlValue::Text(None),
        }
    }
}

impl Resource for Followup {
    const ENTITY: EntityType = EntityType::Followup;
    const COLUMNS: &'static ColumnSet = FOLLOWUP_COLUMNS;
    const INSERT_COLUMNS: &'static [&'static str] = &[
        "client_id",
        "proposal_id",
        "type",
        "title",
        "description",
        "due_date",
        "status",
        "assigned_to",
        "completed_at",
        "created_by",
        "created_at",
        "updated_at",
    ];

    type New = NewFollowup;
    type Patch = FollowupPatch;
    type Filter = FollowupFilter;
    type Summary = FollowupSummary;

    fn validate_new(new: &NewFollowup) -> DomainResult<()> {
        if new.title.trim().is_empty() {
            return Err(DomainError::validation("title is required"));
        }
        Ok(())
    }

    fn validate_patch(patch: &FollowupPatch) -> DomainResult<()> {
        if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(DomainError::validation("title cannot be empty"));
        }
        Ok(())
    }

    fn references_of_new(new: &NewFollowup) -> Vec<Reference> {
        let mut refs = vec![Reference::new(EntityType::Client, new.client_id)];
        if let Some(proposal_id) = new.proposal_id {
            refs.push(Reference::new(EntityType::Proposal, proposal_id));
        }
        if let Some(assignee) = new.assigned_to {
            refs.push(Reference::new(EntityType::User, assignee));
        }
        refs
    }

    fn references_of_patch(patch: &FollowupPatch) -> Vec<Reference> {
        let mut refs = Vec::new();
        if let Some(client_id) = patch.client_id {
            refs.push(Reference::new(EntityType::Client, client_id));
        }
        if let Some(proposal_id) = patch.proposal_id {
            refs.push(Reference::new(EntityType::Proposal, proposal_id));
        }
        if let Some(assignee) = patch.assigned_to {
            refs.push(Reference::new(EntityType::User, assignee));
        }
        refs
    }

    fn create(id: EntityId, ctx: &TenantContext, actor: UserId, now: DateTime<Utc>, new: NewFollowup) -> Self {
        let status = new.status.unwrap_or_default();
        Followup {
            id,
            tenant_id: ctx.tenant_id(),
            client_id: new.client_id,
            proposal_id: new.proposal_id,
            kind: new.kind,
            title: new.title.trim().to_string(),
            description: new.description,
            due_date: new.due_date,
            status,
            result: None,
            assigned_to: Some(new.assigned_to.unwrap_or(actor)),
            completed_at: (status == FollowupStatus::Completed).then_some(now),
            created_by: Some(actor),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    fn changes(patch: &FollowupPatch, now: DateTime<Utc>) -> Vec<(&'static str, SqlValue)> {
        let mut out: Vec<(&'static str, SqlValue)> = Vec::new();
        if let Some(client_id) = patch.client_id {
            out.push(("client_id", client_id.into()));
        }
        if let Some(proposal_id) = patch.proposal_id {
            out.push(("proposal_id", proposal_id.into()));
        }
        if let Some(kind) = patch.kind {
            out.push(("type", kind.as_str().into()));
        }
        if let Some(title) = &patch.title {
            out.push(("title", title.trim().into()));
        }
        if let Some(description) = &patch.description {
            out.push(("description", description.as_str().into()));
        }
        if let Some(due_date) = patch.due_date {
            out.push(("due_date", due_date.into()));
        }
        if let Some(status) = patch.status {
            out.push(("status", status.as_str().into()));
            if status == FollowupStatus::Completed {
                out.push(("completed_at", now.into()));
            }
        }
        if let Some(result) = &patch.result {
            out.push(("result", result.as_str().into()));
        } else if patch.clear_result {
            out.push(("result", SqlValue::Text(None)));
        }
        if let Some(assignee) = patch.assigned_to {
            out.push(("assigned_to", assignee.into()));
        }
        out
    }

    fn apply(&mut self, patch: &FollowupPatch, now: DateTime<Utc>) {
        if let Some(client_id) = patch.client_id {
            self.client_id = client_id;
        }
        if patch.proposal_id.is_some() {
            self.proposal_id = patch.proposal_id;
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(title) = &patch.title {
            self.title = title.trim().to_string();
        }
        if patch.description.is_some() {
            self.description.clone_from(&patch.description);
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(status) = patch.status {
            self.status = status;
            if status == FollowupStatus::Completed {
                self.completed_at = Some(now);
            }
        }
        if patch.result.is_some() || patch.clear_result {
            self.result.clone_from(&patch.result);
        }
        if patch.assigned_to.is_some() {
            self.assigned_to = patch.assigned_to;
        }
        self.updated_at = now;
    }

    fn mark_deleted(&mut self, at: DateTime<Utc>) {
        self.deleted_at = Some(at);
    }

    fn summary(&self) -> FollowupSummary {
        FollowupSummary {
            id: self.id,
            title: self.title.clone(),
        }
    }

    fn display_name(&self) -> String {
        self.title.clone()
    }

    fn reference(&self) -> Option<String> {
        Some(self.kind.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_followup() -> NewFollowup {
        serde_json::from_value(serde_json::json!({
            "client_id": EntityId::new(),
            "type": "visit",
            "title": "Renewal visit",
            "due_date": "2024-05-10T14:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn assignee_defaults_to_creator() {
        let ctx = TenantContext::new(TenantId::new());
        let actor = UserId::new();
        let f = Followup::create(EntityId::new(), &ctx, actor, Utc::now(), new_followup());
        assert_eq!(f.assigned_to, Some(actor));
        assert_eq!(f.status, FollowupStatus::Pending);
        assert_eq!(f.kind, FollowupType::Visit);
    }

    #[test]
    fn completion_stamps_completed_at() {
        let ctx = TenantContext::new(TenantId::new());
        let now = Utc::now();
        let mut f = Followup::create(EntityId::new(), &ctx, UserId::new(), now, new_followup());
        let patch = FollowupPatch::completion(Some("signed".into()));

        let changes = Followup::changes(&patch, now);
        f.apply(&patch, now);

        assert_eq!(f.status, FollowupStatus::Completed);
        assert_eq!(f.completed_at, Some(now));
        assert_eq!(changes.len(), 3);
        for (column, value) in changes {
            assert_eq!(f.column(column), value);
        }
    }

    #[test]
    fn completion_without_result_clears_the_previous_one() {
        let ctx = TenantContext::new(TenantId::new());
        let now = Utc::now();
        let mut f = Followup::create(EntityId::new(), &ctx, UserId::new(), now, new_followup());
        f.result = Some("left a voicemail".into());
        let patch = FollowupPatch::completion(None);

        let changes = Followup::changes(&patch, now);
        f.apply(&patch, now);

        assert_eq!(f.result, None);
        assert!(changes.contains(&("result", SqlValue::Text(None))));
        for (column, value) in changes {
            assert_eq!(f.column(column), value);
        }
    }

    #[test]
    fn plain_patch_leaves_result_alone() {
        let ctx = TenantContext::new(TenantId::new());
        let now = Utc::now();
        let mut f = Followup::create(EntityId::new(), &ctx, UserId::new(), now, new_followup());
        f.result = Some("left a voicemail".into());
        let patch: FollowupPatch = serde_json::from_value(serde_json::json!({ "title": "Call back" })).unwrap();

        f.apply(&patch, now);
        assert_eq!(f.result.as_deref(), Some("left a voicemail"));
        assert_eq!(Followup::changes(&patch, now).len(), 1);
    }

    #[test]
    fn assignee_and_proposal_are_references() {
        let mut new = new_followup();
        new.proposal_id = Some(EntityId::new());
        new.assigned_to = Some(UserId::new());
        let kinds: Vec<_> = Followup::references_of_new(&new).iter().map(|r| r.entity).collect();
        assert_eq!(kinds, vec![EntityType::Client, EntityType::Proposal, EntityType::User]);
    }

    #[test]
    fn default_order_is_due_date_ascending() {
        let q = FollowupFilter::default().to_query(&TenantContext::new(TenantId::new()));
        assert_eq!(q.order_by(), "due_date");
        assert_eq!(q.order(), SortOrder::Asc);
    }
}
