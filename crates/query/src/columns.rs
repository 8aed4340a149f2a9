use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// `"asc"` in any case is ascending, `"desc"` descending; anything else
    /// (including absence) keeps `default`.
    pub fn parse_or(raw: Option<&str>, default: SortOrder) -> SortOrder {
        match raw.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("asc") => SortOrder::Asc,
            Some(s) if s.eq_ignore_ascii_case("desc") => SortOrder::Desc,
            _ => default,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Static column map of one tenant-scoped table.
///
/// Only names listed here ever reach a structural position in a statement.
#[derive(Debug, PartialEq, Eq)]
pub struct ColumnSet {
    pub table: &'static str,
    /// Columns matched case-insensitively by free-text search (OR-ed).
    pub search: &'static [&'static str],
    /// Allow-list for `order_by`.
    pub sortable: &'static [&'static str],
    pub default_sort: &'static str,
    pub default_order: SortOrder,
    /// Columns unique per tenant among non-deleted rows.
    pub unique: &'static [&'static str],
}

impl ColumnSet {
    /// Map a requested sort column onto the allow-list, falling back to the
    /// default for anything unlisted.
    pub fn resolve_sort(&self, requested: Option<&str>) -> &'static str {
        requested
            .and_then(|r| self.sortable.iter().find(|c| **c == r).copied())
            .unwrap_or(self.default_sort)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static COLUMNS: ColumnSet = ColumnSet {
        table: "widgets",
        search: &["name"],
        sortable: &["name", "created_at"],
        default_sort: "created_at",
        default_order: SortOrder::Desc,
        unique: &[],
    };

    #[test]
    fn sort_column_outside_allow_list_falls_back() {
        assert_eq!(COLUMNS.resolve_sort(Some("name")), "name");
        assert_eq!(COLUMNS.resolve_sort(Some("name; DROP TABLE widgets")), "created_at");
        assert_eq!(COLUMNS.resolve_sort(Some("NAME")), "created_at");
        assert_eq!(COLUMNS.resolve_sort(None), "created_at");
    }

    #[test]
    fn sort_order_defaults_when_unrecognised() {
        assert_eq!(SortOrder::parse_or(Some("ASC"), SortOrder::Desc), SortOrder::Asc);
        assert_eq!(SortOrder::parse_or(Some("asc"), SortOrder::Desc), SortOrder::Asc);
        assert_eq!(SortOrder::parse_or(Some("sideways"), SortOrder::Desc), SortOrder::Desc);
        assert_eq!(SortOrder::parse_or(None, SortOrder::Asc), SortOrder::Asc);
    }
}
