use core::cmp::Ordering;

use crate::{Record, SqlValue};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CmpOp {
    Lt,
    Lte,
    Gte,
    Gt,
}

impl CmpOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            CmpOp::Lt => "<",
            CmpOp::Lte => "<=",
            CmpOp::Gte => ">=",
            CmpOp::Gt => ">",
        }
    }

    fn holds(&self, ord: Ordering) -> bool {
        match self {
            CmpOp::Lt => ord == Ordering::Less,
            CmpOp::Lte => ord != Ordering::Greater,
            CmpOp::Gte => ord != Ordering::Less,
            CmpOp::Gt => ord == Ordering::Greater,
        }
    }
}

/// One AND-ed condition of a list query.
///
/// Column names are `&'static str` supplied by resource code; user input only
/// ever lands in the value slots.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Case-insensitive substring match on any of `columns`.
    Search {
        columns: &'static [&'static str],
        term: String,
    },
    Eq {
        column: &'static str,
        value: SqlValue,
    },
    /// Array column shares at least one element with `values`.
    Overlaps {
        column: &'static str,
        values: Vec<String>,
    },
    Cmp {
        column: &'static str,
        op: CmpOp,
        value: SqlValue,
    },
}

impl Predicate {
    pub fn matches<R: Record + ?Sized>(&self, row: &R) -> bool {
        match self {
            Predicate::Search { columns, term } => {
                let needle = term.to_lowercase();
                columns.iter().any(|c| {
                    row.column(c)
                        .as_text()
                        .is_some_and(|hay| hay.to_lowercase().contains(&needle))
                })
            }
            Predicate::Eq { column, value } => {
                matches!(row.column(column).compare(value), Some(Ordering::Equal))
            }
            Predicate::Overlaps { column, values } => match row.column(column) {
                SqlValue::TextArray(have) => have.iter().any(|t| values.contains(t)),
                _ => false,
            },
            Predicate::Cmp { column, op, value } => row
                .column(column)
                .compare(value)
                .is_some_and(|ord| op.holds(ord)),
        }
    }
}
