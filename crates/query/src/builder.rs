//! Options → [`ListQuery`].

use serde::Serialize;

use jarvis_core::{TenantContext, TenantId};

use crate::{CmpOp, ColumnSet, Predicate, SortOrder, SqlValue};

pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 100;

/// Clamped limit/offset pair.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Pagination {
    /// `limit` is clamped to `[1, MAX_LIMIT]` (default `DEFAULT_LIMIT`),
    /// `offset` to `>= 0` (default 0).
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        Self::with_default(limit, offset, DEFAULT_LIMIT)
    }

    pub fn with_default(limit: Option<i64>, offset: Option<i64>, default_limit: i64) -> Self {
        Self {
            limit: limit.unwrap_or(default_limit).clamp(1, MAX_LIMIT),
            offset: offset.unwrap_or(0).max(0),
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Split a comma-separated query-string value into trimmed, non-empty items.
pub fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// A fully validated, tenant-scoped read over one table.
///
/// Implicitly restricted to `tenant_id = <scope>` and `deleted_at IS NULL`.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub(crate) columns: &'static ColumnSet,
    pub(crate) tenant_id: TenantId,
    pub(crate) predicates: Vec<Predicate>,
    pub(crate) order_by: &'static str,
    pub(crate) order: SortOrder,
    pub(crate) page: Pagination,
}

impl ListQuery {
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn table(&self) -> &'static str {
        self.columns.table
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn order_by(&self) -> &'static str {
        self.order_by
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    pub fn page(&self) -> Pagination {
        self.page
    }
}

/// Builds a [`ListQuery`] from recognised options.
///
/// Every method takes `Option`s so callers can pass request fields straight
/// through; `None` (or an empty search/tag list) adds nothing.
#[derive(Debug)]
pub struct FilterBuilder {
    query: ListQuery,
}

impl FilterBuilder {
    pub fn new(ctx: &TenantContext, columns: &'static ColumnSet) -> Self {
        Self {
            query: ListQuery {
                columns,
                tenant_id: ctx.tenant_id(),
                predicates: Vec::new(),
                order_by: columns.default_sort,
                order: columns.default_order,
                page: Pagination::default(),
            },
        }
    }

    /// Free-text search over the column set's search columns.
    pub fn search(mut self, term: Option<&str>) -> Self {
        let term = term.map(str::trim).unwrap_or_default();
        if !term.is_empty() && !self.query.columns.search.is_empty() {
            self.query.predicates.push(Predicate::Search {
                columns: self.query.columns.search,
                term: term.to_string(),
            });
        }
        self
    }

    pub fn eq<V: Into<SqlValue>>(mut self, column: &'static str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.query.predicates.push(Predicate::Eq {
                column,
                value: value.into(),
            });
        }
        self
    }

    pub fn overlaps(mut self, column: &'static str, values: &[String]) -> Self {
        if !values.is_empty() {
            self.query.predicates.push(Predicate::Overlaps {
                column,
                values: values.to_vec(),
            });
        }
        self
    }

    pub fn cmp<V: Into<SqlValue>>(mut self, column: &'static str, op: CmpOp, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.query.predicates.push(Predicate::Cmp {
                column,
                op,
                value: value.into(),
            });
        }
        self
    }

    /// Sort column is checked against the allow-list; unknown values fall
    /// back to the default column silently.
    pub fn order(mut self, order_by: Option<&str>, order: Option<&str>) -> Self {
        self.query.order_by = self.query.columns.resolve_sort(order_by);
        self.query.order = SortOrder::parse_or(order, self.query.columns.default_order);
        self
    }

    pub fn page(mut self, limit: Option<i64>, offset: Option<i64>) -> Self {
        self.query.page = Pagination::new(limit, offset);
        self
    }

    pub fn build(self) -> ListQuery {
        self.query
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    static COLUMNS: ColumnSet = ColumnSet {
        table: "widgets",
        search: &["name", "code"],
        sortable: &["name", "created_at"],
        default_sort: "created_at",
        default_order: SortOrder::Desc,
        unique: &[],
    };

    fn ctx() -> TenantContext {
        TenantContext::new(TenantId::new())
    }

    #[test]
    fn absent_options_add_no_predicates() {
        let q = FilterBuilder::new(&ctx(), &COLUMNS)
            .search(Some("   "))
            .eq::<String>("status", None)
            .overlaps("tags", &[])
            .cmp::<i64>("rating", CmpOp::Gte, None)
            .order(None, None)
            .page(None, None)
            .build();

        assert!(q.predicates().is_empty());
        assert_eq!(q.order_by(), "created_at");
        assert_eq!(q.order(), SortOrder::Desc);
        assert_eq!(q.page(), Pagination { limit: 50, offset: 0 });
    }

    #[test]
    fn scope_comes_from_context() {
        let ctx = ctx();
        let q = FilterBuilder::new(&ctx, &COLUMNS).build();
        assert_eq!(q.tenant_id(), ctx.tenant_id());
    }

    #[test]
    fn search_is_trimmed() {
        let q = FilterBuilder::new(&ctx(), &COLUMNS).search(Some("  ana ")).build();
        assert_eq!(
            q.predicates(),
            &[Predicate::Search {
                columns: &["name", "code"],
                term: "ana".to_string()
            }]
        );
    }

    #[test]
    fn list_values_are_split_and_trimmed() {
        assert_eq!(split_list(Some(" vip, ,renewal ")), vec!["vip", "renewal"]);
        assert!(split_list(None).is_empty());
    }

    proptest! {
        #[test]
        fn pagination_is_always_clamped(limit in proptest::option::of(any::<i64>()), offset in proptest::option::of(any::<i64>())) {
            let p = Pagination::new(limit, offset);
            prop_assert!((1..=MAX_LIMIT).contains(&p.limit));
            prop_assert!(p.offset >= 0);
            if let Some(l) = limit {
                if (1..=MAX_LIMIT).contains(&l) {
                    prop_assert_eq!(p.limit, l);
                }
            }
        }

        #[test]
        fn sort_column_is_always_allow_listed(raw in ".*") {
            let q = FilterBuilder::new(&ctx(), &COLUMNS).order(Some(raw.as_str()), None).build();
            prop_assert!(COLUMNS.sortable.contains(&q.order_by()));
        }
    }
}
