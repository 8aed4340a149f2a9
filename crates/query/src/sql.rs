//! Parameterized Postgres rendering.
//!
//! Structural positions (table, column, direction) are only ever filled from
//! `&'static str` column sets; everything else is a `$n` placeholder.

use chrono::{DateTime, Utc};

use jarvis_core::{EntityId, TenantContext};

use crate::{ColumnSet, ListQuery, Predicate, SqlValue};

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

#[derive(Default)]
struct Params(Vec<SqlValue>);

impl Params {
    fn push(&mut self, value: impl Into<SqlValue>) -> String {
        self.0.push(value.into());
        format!("${}", self.0.len())
    }

    fn finish(self, sql: String) -> Statement {
        Statement { sql, params: self.0 }
    }
}

/// Escape LIKE metacharacters so a search term matches literally.
fn like_pattern(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

impl ListQuery {
    fn where_clause(&self, params: &mut Params) -> String {
        let mut clauses = vec![
            format!("tenant_id = {}", params.push(self.tenant_id)),
            "deleted_at IS NULL".to_string(),
        ];

        for predicate in &self.predicates {
            let clause = match predicate {
                Predicate::Search { columns, term } => {
                    let p = params.push(like_pattern(term));
                    let ors: Vec<String> = columns.iter().map(|c| format!("{c} ILIKE {p}")).collect();
                    format!("({})", ors.join(" OR "))
                }
                Predicate::Eq { column, value } => format!("{column} = {}", params.push(value.clone())),
                Predicate::Overlaps { column, values } => {
                    format!("{column} && {}", params.push(values.clone()))
                }
                Predicate::Cmp { column, op, value } => {
                    format!("{column} {} {}", op.as_sql(), params.push(value.clone()))
                }
            };
            clauses.push(clause);
        }

        clauses.join(" AND ")
    }

    /// `SELECT *` for the current page.
    pub fn select_sql(&self) -> Statement {
        let mut params = Params::default();
        let filter = self.where_clause(&mut params);
        let limit = params.push(self.page.limit);
        let offset = params.push(self.page.offset);
        let sql = format!(
            "SELECT * FROM {table} WHERE {filter} ORDER BY {col} {dir} NULLS LAST, id ASC LIMIT {limit} OFFSET {offset}",
            table = self.columns.table,
            col = self.order_by,
            dir = self.order.as_sql(),
        );
        params.finish(sql)
    }

    /// Count of every row the filter matches, ignoring pagination.
    pub fn count_sql(&self) -> Statement {
        let mut params = Params::default();
        let filter = self.where_clause(&mut params);
        let sql = format!("SELECT COUNT(*) FROM {} WHERE {filter}", self.columns.table);
        params.finish(sql)
    }
}

fn scoped_id(params: &mut Params, ctx: &TenantContext, id: EntityId) -> String {
    let id = params.push(id);
    let tenant = params.push(ctx.tenant_id());
    format!("id = {id} AND tenant_id = {tenant} AND deleted_at IS NULL")
}

pub fn find_by_id_sql(columns: &ColumnSet, ctx: &TenantContext, id: EntityId) -> Statement {
    let mut params = Params::default();
    let filter = scoped_id(&mut params, ctx, id);
    params.finish(format!("SELECT * FROM {} WHERE {filter}", columns.table))
}

pub fn exists_sql(columns: &ColumnSet, ctx: &TenantContext, id: EntityId) -> Statement {
    let mut params = Params::default();
    let filter = scoped_id(&mut params, ctx, id);
    params.finish(format!("SELECT EXISTS (SELECT 1 FROM {} WHERE {filter})", columns.table))
}

/// `INSERT` whose `tenant_id` always comes from the context.
pub fn insert_sql(
    columns: &ColumnSet,
    ctx: &TenantContext,
    id: EntityId,
    values: Vec<(&'static str, SqlValue)>,
) -> Statement {
    let mut params = Params::default();
    let mut names = vec!["id", "tenant_id"];
    let mut slots = vec![params.push(id), params.push(ctx.tenant_id())];
    for (name, value) in values {
        if name == "id" || name == "tenant_id" {
            continue;
        }
        names.push(name);
        slots.push(params.push(value));
    }
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
        columns.table,
        names.join(", "),
        slots.join(", ")
    );
    params.finish(sql)
}

/// `None` when `changes` is empty.
pub fn update_sql(
    columns: &ColumnSet,
    ctx: &TenantContext,
    id: EntityId,
    changes: Vec<(&'static str, SqlValue)>,
    now: DateTime<Utc>,
) -> Option<Statement> {
    if changes.is_empty() {
        return None;
    }
    let mut params = Params::default();
    let mut sets: Vec<String> = changes
        .into_iter()
        .filter(|(name, _)| !matches!(*name, "id" | "tenant_id" | "deleted_at"))
        .map(|(name, value)| format!("{name} = {}", params.push(value)))
        .collect();
    if sets.is_empty() {
        return None;
    }
    sets.push(format!("updated_at = {}", params.push(now)));
    let filter = scoped_id(&mut params, ctx, id);
    let sql = format!(
        "UPDATE {} SET {} WHERE {filter} RETURNING *",
        columns.table,
        sets.join(", ")
    );
    Some(params.finish(sql))
}

/// Stamps `deleted_at` on a live row; an already deleted row is untouched.
pub fn soft_delete_sql(columns: &ColumnSet, ctx: &TenantContext, id: EntityId, at: DateTime<Utc>) -> Statement {
    let mut params = Params::default();
    let stamp = params.push(at);
    let filter = scoped_id(&mut params, ctx, id);
    params.finish(format!(
        "UPDATE {} SET deleted_at = {stamp} WHERE {filter} RETURNING *",
        columns.table
    ))
}

#[cfg(test)]
mod tests {
    use jarvis_core::TenantId;

    use super::*;
    use crate::{CmpOp, FilterBuilder, SortOrder};

    static CLIENTS: ColumnSet = ColumnSet {
        table: "clients",
        search: &["name", "document", "email"],
        sortable: &["name", "created_at", "updated_at", "rating"],
        default_sort: "created_at",
        default_order: SortOrder::Desc,
        unique: &["document"],
    };

    #[test]
    fn bare_list_is_scoped_to_tenant_and_live_rows() {
        let ctx = TenantContext::new(TenantId::new());
        let stmt = FilterBuilder::new(&ctx, &CLIENTS).build().select_sql();

        assert_eq!(
            stmt.sql,
            "SELECT * FROM clients WHERE tenant_id = $1 AND deleted_at IS NULL \
             ORDER BY created_at DESC NULLS LAST, id ASC LIMIT $2 OFFSET $3"
        );
        assert_eq!(
            stmt.params,
            vec![SqlValue::from(ctx.tenant_id()), SqlValue::Int(Some(50)), SqlValue::Int(Some(0))]
        );
    }

    #[test]
    fn filters_are_bound_positionally() {
        let ctx = TenantContext::new(TenantId::new());
        let q = FilterBuilder::new(&ctx, &CLIENTS)
            .search(Some("50%_off"))
            .eq("type", Some("PJ"))
            .overlaps("tags", &["vip".to_string()])
            .cmp("rating", CmpOp::Gte, Some(3_i64))
            .order(Some("name"), Some("asc"))
            .page(Some(10), Some(20))
            .build();

        let stmt = q.select_sql();
        assert_eq!(
            stmt.sql,
            "SELECT * FROM clients WHERE tenant_id = $1 AND deleted_at IS NULL \
             AND (name ILIKE $2 OR document ILIKE $2 OR email ILIKE $2) \
             AND type = $3 AND tags && $4 AND rating >= $5 \
             ORDER BY name ASC NULLS LAST, id ASC LIMIT $6 OFFSET $7"
        );
        assert_eq!(stmt.params[1], SqlValue::text("%50\\%\\_off%"));
        assert_eq!(stmt.params[3], SqlValue::TextArray(vec!["vip".into()]));

        let count = q.count_sql();
        assert!(count.sql.starts_with("SELECT COUNT(*) FROM clients WHERE tenant_id = $1"));
        assert_eq!(count.params.len(), 5);
    }

    #[test]
    fn hostile_order_by_never_reaches_the_statement() {
        let ctx = TenantContext::new(TenantId::new());
        let stmt = FilterBuilder::new(&ctx, &CLIENTS)
            .order(Some("name; DROP TABLE clients; --"), Some("desc; --"))
            .build()
            .select_sql();

        assert!(!stmt.sql.contains("DROP"));
        assert!(stmt.sql.contains("ORDER BY created_at DESC"));
    }

    #[test]
    fn single_row_statements_carry_the_tenant() {
        let ctx = TenantContext::new(TenantId::new());
        let id = EntityId::new();

        let find = find_by_id_sql(&CLIENTS, &ctx, id);
        assert_eq!(
            find.sql,
            "SELECT * FROM clients WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL"
        );
        assert_eq!(find.params, vec![SqlValue::from(id), SqlValue::from(ctx.tenant_id())]);

        let delete = soft_delete_sql(&CLIENTS, &ctx, id, Utc::now());
        assert!(delete.sql.contains("WHERE id = $2 AND tenant_id = $3 AND deleted_at IS NULL"));
    }

    #[test]
    fn insert_ignores_caller_supplied_tenant() {
        let ctx = TenantContext::new(TenantId::new());
        let other = TenantId::new();
        let stmt = insert_sql(
            &CLIENTS,
            &ctx,
            EntityId::new(),
            vec![("tenant_id", other.into()), ("name", SqlValue::text("Ana"))],
        );

        assert_eq!(
            stmt.sql,
            "INSERT INTO clients (id, tenant_id, name) VALUES ($1, $2, $3) RETURNING *"
        );
        assert_eq!(stmt.params[1], SqlValue::from(ctx.tenant_id()));
    }

    #[test]
    fn empty_update_renders_nothing() {
        let ctx = TenantContext::new(TenantId::new());
        assert!(update_sql(&CLIENTS, &ctx, EntityId::new(), vec![], Utc::now()).is_none());

        let stmt = update_sql(
            &CLIENTS,
            &ctx,
            EntityId::new(),
            vec![("name", SqlValue::text("Bia"))],
            Utc::now(),
        )
        .expect("statement");
        assert_eq!(
            stmt.sql,
            "UPDATE clients SET name = $1, updated_at = $2 \
             WHERE id = $3 AND tenant_id = $4 AND deleted_at IS NULL RETURNING *"
        );
    }
}
