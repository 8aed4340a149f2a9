use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// What happened, with a details shape specific to each kind.
///
/// Serialises adjacently tagged: `{"action": "updated", "details": {...}}`.
/// Storage keeps the tag and the details in separate columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "details", rename_all = "snake_case")]
pub enum Action {
    Created {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reference: Option<String>,
    },
    /// Only field names are kept, never before/after values.
    Updated { updated_fields: Vec<String> },
    Deleted {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reference: Option<String>,
    },
    Registered { email: String, company_name: String },
    Login { email: String },
    BulkImport { total: u64, success: u64, failed: u64 },
    Completed {
        #[serde(default)]
        result: Option<String>,
    },
    RoleChanged { role: String },
    Deactivated { email: String },
}

impl Action {
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Created { .. } => "created",
            Action::Updated { .. } => "updated",
            Action::Deleted { .. } => "deleted",
            Action::Registered { .. } => "registered",
            Action::Login { .. } => "login",
            Action::BulkImport { .. } => "bulk_import",
            Action::Completed { .. } => "completed",
            Action::RoleChanged { .. } => "role_changed",
            Action::Deactivated { .. } => "deactivated",
        }
    }

    /// Split into the `(action, details)` column pair.
    pub fn to_parts(&self) -> Result<(&'static str, JsonValue), serde_json::Error> {
        let mut value = serde_json::to_value(self)?;
        let details = value
            .get_mut("details")
            .map(JsonValue::take)
            .unwrap_or(JsonValue::Null);
        Ok((self.kind(), details))
    }

    pub fn from_parts(kind: &str, details: JsonValue) -> Result<Self, serde_json::Error> {
        serde_json::from_value(serde_json::json!({ "action": kind, "details": details }))
    }
}
