use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    listing::{
        CategorySortBy, DEFAULT_PER_PAGE, ListView, MAX_PER_PAGE, ProductSortBy, Searchable,
        SortKey, SortOrder, paginate,
    },
    response::Meta,
};

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    /// Case-insensitive match on name or description.
    pub q: Option<String>,
    pub sort_by: Option<ProductSortBy>,
    pub sort_order: Option<SortOrder>,
    /// Page number; omit with `per_page` to get the whole collection.
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CategoryQuery {
    /// Case-insensitive match on name.
    pub q: Option<String>,
    /// Defaults to `priority`.
    pub sort_by: Option<CategorySortBy>,
    pub sort_order: Option<SortOrder>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Run a list view and slice the result when the caller asked for a page.
pub fn list_meta<T, K>(
    view: &ListView<K>,
    items: Vec<T>,
    page: Option<i64>,
    per_page: Option<i64>,
) -> (Vec<T>, Meta)
where
    T: Searchable,
    K: SortKey<T>,
{
    let filtered = view.apply(items);
    if page.is_none() && per_page.is_none() {
        let total = filtered.len() as i64;
        return (filtered, Meta::total(total));
    }

    let page = page.unwrap_or(1).max(1) as usize;
    let per_page = per_page
        .unwrap_or(DEFAULT_PER_PAGE as i64)
        .clamp(1, MAX_PER_PAGE as i64) as usize;
    let sliced = paginate(filtered, page, per_page);
    let meta = Meta::new(
        sliced.page as i64,
        sliced.per_page as i64,
        sliced.total as i64,
    );
    (sliced.items, meta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::Sort;

    #[derive(Debug, Clone, PartialEq)]
    struct Row(u32);

    impl Searchable for Row {
        fn matches(&self, needle: &str) -> bool {
            self.0.to_string().contains(needle)
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct ByValue;

    impl SortKey<Row> for ByValue {
        fn compare(self, a: &Row, b: &Row) -> std::cmp::Ordering {
            a.0.cmp(&b.0)
        }
    }

    fn rows() -> Vec<Row> {
        (1..=25).rev().map(Row).collect()
    }

    #[test]
    fn without_page_params_everything_is_returned() {
        let view = ListView::new(None, Some(Sort::asc(ByValue)));
        let (items, meta) = list_meta(&view, rows(), None, None);
        assert_eq!(items.len(), 25);
        assert_eq!(items[0], Row(1));
        assert_eq!(meta, Meta::total(25));
    }

    #[test]
    fn page_defaults_to_ten_rows() {
        let view = ListView::new(None, Some(Sort::asc(ByValue)));
        let (items, meta) = list_meta(&view, rows(), Some(2), None);
        assert_eq!(items.first(), Some(&Row(11)));
        assert_eq!(items.len(), 10);
        assert_eq!(meta, Meta::new(2, 10, 25));
    }

    #[test]
    fn bogus_page_params_are_clamped() {
        let view: ListView<ByValue> = ListView::default();
        let (items, meta) = list_meta(&view, rows(), Some(-3), Some(1000));
        assert_eq!(items.len(), 25);
        assert_eq!(meta, Meta::new(1, 100, 25));
    }

    #[test]
    fn search_applies_before_paging() {
        let view: ListView<ByValue> = ListView::new(Some("2".into()), Some(Sort::asc(ByValue)));
        let (items, meta) = list_meta(&view, rows(), Some(1), Some(3));
        assert_eq!(items, vec![Row(2), Row(12), Row(20)]);
        assert_eq!(meta.total, Some(8));
    }
}
