//! In-memory evaluation of a [`ListQuery`].
//!
//! Mirrors the rendered SQL: tenant and `deleted_at IS NULL` first, then the
//! predicates, `NULLS LAST` ordering with an `id` tiebreak, then the page.

use core::cmp::Ordering;

use crate::{ListQuery, Page, Record, SortOrder};

impl ListQuery {
    /// Whether `row` belongs to the result set, ignoring pagination.
    pub fn matches<R: Record + ?Sized>(&self, row: &R) -> bool {
        row.tenant_id() == self.tenant_id
            && row.deleted_at().is_none()
            && self.predicates.iter().all(|p| p.matches(row))
    }

    fn compare_rows<R: Record>(&self, a: &R, b: &R) -> Ordering {
        let (va, vb) = (a.column(self.order_by), b.column(self.order_by));
        let primary = match (va.is_null(), vb.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                let ord = va.compare(&vb).unwrap_or(Ordering::Equal);
                match self.order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            }
        };
        primary.then_with(|| a.id().cmp(&b.id()))
    }

    pub fn run<'a, R, I>(&self, rows: I) -> Page<R>
    where
        R: Record + Clone + 'a,
        I: IntoIterator<Item = &'a R>,
    {
        let mut hits: Vec<&R> = rows.into_iter().filter(|r| self.matches(*r)).collect();
        let total = hits.len() as u64;
        hits.sort_by(|a, b| self.compare_rows(*a, *b));

        let data = hits
            .into_iter()
            .skip(self.page.offset as usize)
            .take(self.page.limit as usize)
            .cloned()
            .collect();

        Page {
            data,
            total,
            limit: self.page.limit,
            offset: self.page.offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use proptest::prelude::*;

    use jarvis_core::{EntityId, TenantContext, TenantId};

    use crate::{ColumnSet, FilterBuilder, SqlValue};

    use super::*;

    static WIDGETS: ColumnSet = ColumnSet {
        table: "widgets",
        search: &["name", "code"],
        sortable: &["name", "created_at", "rating"],
        default_sort: "created_at",
        default_order: SortOrder::Desc,
        unique: &[],
    };

    #[derive(Debug, Clone, PartialEq)]
    struct Widget {
        id: EntityId,
        tenant_id: TenantId,
        name: String,
        code: Option<String>,
        rating: Option<i64>,
        tags: Vec<String>,
        created_at: DateTime<Utc>,
        deleted_at: Option<DateTime<Utc>>,
    }

    impl Record for Widget {
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
                "name" => self.name.clone().into(),
                "code" => self.code.clone().into(),
                "rating" => self.rating.into(),
                "tags" => self.tags.clone().into(),
                "created_at" => self.created_at.into(),
                _ => SqlValue::Text(None),
            }
        }
    }

    fn widgets(tenant: TenantId, n: usize) -> Vec<Widget> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| Widget {
                id: EntityId::new(),
                tenant_id: tenant,
                name: format!("widget {i:02}"),
                code: (i % 2 == 0).then(|| format!("W-{i}")),
                rating: (i % 3 != 0).then_some(i as i64 % 5),
                tags: if i % 4 == 0 { vec!["vip".into()] } else { vec![] },
                created_at: base + Duration::minutes(i as i64),
                deleted_at: None,
            })
            .collect()
    }

    #[test]
    fn other_tenants_and_deleted_rows_are_invisible() {
        let a = TenantId::new();
        let mut rows = widgets(a, 5);
        rows.extend(widgets(TenantId::new(), 5));
        rows[0].deleted_at = Some(Utc::now());

        let page = FilterBuilder::new(&TenantContext::new(a), &WIDGETS).build().run(&rows);
        assert_eq!(page.total, 4);
        assert!(page.data.iter().all(|w| w.tenant_id == a && w.deleted_at.is_none()));
    }

    #[test]
    fn second_page_is_rows_eleven_to_twenty() {
        let a = TenantId::new();
        let rows = widgets(a, 35);
        let ctx = TenantContext::new(a);
        let q = FilterBuilder::new(&ctx, &WIDGETS).page(Some(10), Some(10)).build();

        let page = q.run(&rows);
        let mut expected = rows.clone();
        expected.sort_by(|x, y| y.created_at.cmp(&x.created_at));
        assert_eq!(page.data, expected[10..20].to_vec());
        assert_eq!(page.total, 35);
        assert_eq!(q.run(&rows), page);
    }

    #[test]
    fn search_is_case_insensitive_and_or_across_columns() {
        let a = TenantId::new();
        let rows = widgets(a, 10);
        let ctx = TenantContext::new(a);

        let by_name = FilterBuilder::new(&ctx, &WIDGETS).search(Some("WIDGET 03")).build().run(&rows);
        assert_eq!(by_name.total, 1);

        let by_code = FilterBuilder::new(&ctx, &WIDGETS).search(Some("w-4")).build().run(&rows);
        assert_eq!(by_code.data[0].name, "widget 04");
    }

    #[test]
    fn tag_filter_uses_overlap() {
        let a = TenantId::new();
        let rows = widgets(a, 10);
        let page = FilterBuilder::new(&TenantContext::new(a), &WIDGETS)
            .overlaps("tags", &["vip".to_string(), "gold".to_string()])
            .build()
            .run(&rows);
        assert_eq!(page.total, 3);
    }

    #[test]
    fn nulls_sort_last_in_both_directions() {
        let a = TenantId::new();
        let rows = widgets(a, 9);
        let ctx = TenantContext::new(a);

        for dir in ["asc", "desc"] {
            let page = FilterBuilder::new(&ctx, &WIDGETS)
                .order(Some("rating"), Some(dir))
                .build()
                .run(&rows);
            let first_null = page.data.iter().position(|w| w.rating.is_none()).unwrap();
            assert!(page.data[first_null..].iter().all(|w| w.rating.is_none()));
        }
    }

    proptest! {
        #[test]
        fn unknown_order_by_only_changes_order(raw in "[a-z_; -]{0,24}") {
            let a = TenantId::new();
            let rows = widgets(a, 12);
            let ctx = TenantContext::new(a);

            let fallback = FilterBuilder::new(&ctx, &WIDGETS).order(Some(raw.as_str()), None).page(Some(100), None).build().run(&rows);
            let default = FilterBuilder::new(&ctx, &WIDGETS).page(Some(100), None).build().run(&rows);

            let mut got: Vec<EntityId> = fallback.data.iter().map(|w| w.id).collect();
            let mut want: Vec<EntityId> = default.data.iter().map(|w| w.id).collect();
            got.sort();
            want.sort();
            prop_assert_eq!(got, want);
        }
    }
}
