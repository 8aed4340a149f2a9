//! `jarvis-query`: tenant-scoped, filter-driven query construction.
//!
//! Every resource list goes through [`FilterBuilder`]: a fixed set of named
//! options becomes a [`ListQuery`] whose column names are compile-time
//! constants and whose values are positional parameters. A `ListQuery` can
//! only be built from a [`jarvis_core::TenantContext`], so every rendered
//! statement starts with the tenant predicate.
//!
//! The same `ListQuery` renders to parameterized Postgres SQL ([`sql`]) and
//! evaluates over in-memory rows ([`eval`]), so both backends agree on
//! membership, ordering and pagination.

pub mod builder;
pub mod columns;
pub mod eval;
pub mod predicate;
pub mod resource;
pub mod sql;
pub mod value;

pub use builder::{DEFAULT_LIMIT, FilterBuilder, ListQuery, MAX_LIMIT, Pagination, split_list};
pub use columns::{ColumnSet, SortOrder};
pub use predicate::{CmpOp, Predicate};
pub use resource::{ListOptions, Page, Record, Reference, Resource};
pub use sql::Statement;
pub use value::SqlValue;
