//! `jarvis-activity`: the append-only audit trail.
//!
//! Every mutation and security-relevant event lands here as an
//! [`ActivityRecord`] tied to the tenant of the request that caused it.
//! Records are never updated or deleted; [`ActivityLog`] has no method that
//! could do either.

pub mod action;
pub mod auditor;
pub mod log;
pub mod memory;
pub mod record;

pub use action::Action;
pub use auditor::{Audited, Auditor};
pub use log::{ActivityLog, AuditError, RECENT_DEFAULT_LIMIT};
pub use memory::InMemoryActivityLog;
pub use record::{ActivityRecord, NewActivity, RequestMeta};
