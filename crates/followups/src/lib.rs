//! Follow-ups: scheduled contacts with a client (calls, meetings, visits).
//!
//! Besides the generic list, follow-ups have two agenda views built through
//! the same filter builder: [`agenda::today`] and [`agenda::overdue`].

pub mod agenda;
pub mod followup;

pub use followup::{
    Followup, FollowupFilter, FollowupPatch, FollowupStatus, FollowupSummary, FollowupType, NewFollowup,
};
