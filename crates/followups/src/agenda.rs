use chrono::{DateTime, Duration, Utc};

use jarvis_core::{TenantContext, UserId};
use jarvis_query::{CmpOp, FilterBuilder, ListQuery, MAX_LIMIT, Pagination, Resource};

use crate::{Followup, FollowupStatus};

/// Agenda pages hold a full page of work unless the caller asks for less.
pub const AGENDA_DEFAULT_LIMIT: i64 = MAX_LIMIT;

pub fn agenda_page(limit: Option<i64>, offset: Option<i64>) -> Pagination {
    Pagination::with_default(limit, offset, AGENDA_DEFAULT_LIMIT)
}

fn pending(ctx: &TenantContext, assigned_to: Option<UserId>) -> FilterBuilder {
    FilterBuilder::new(ctx, Followup::COLUMNS)
        .eq("status", Some(FollowupStatus::Pending.as_str()))
        .eq("assigned_to", assigned_to)
}

/// Pending follow-ups due on the UTC calendar day of `now`.
pub fn today(ctx: &TenantContext, assigned_to: Option<UserId>, page: Pagination, now: DateTime<Utc>) -> ListQuery {
    let start = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|t| t.and_utc())
        .unwrap_or(now);
    let end = start + Duration::days(1);

    pending(ctx, assigned_to)
        .cmp("due_date", CmpOp::Gte, Some(start))
        .cmp("due_date", CmpOp::Lt, Some(end))
        .order(Some("due_date"), Some("asc"))
        .page(Some(page.limit), Some(page.offset))
        .build()
}

/// Pending follow-ups whose due date has passed.
pub fn overdue(ctx: &TenantContext, assigned_to: Option<UserId>, page: Pagination, now: DateTime<Utc>) -> ListQuery {
    pending(ctx, assigned_to)
        .cmp("due_date", CmpOp::Lt, Some(now))
        .order(Some("due_date"), Some("asc"))
        .page(Some(page.limit), Some(page.offset))
        .build()
}
