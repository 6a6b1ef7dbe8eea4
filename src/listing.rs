//! In-memory list views: search, single-column sort and fixed-size pages
//! over a collection that has already been loaded.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Category, Product};

pub const DEFAULT_PER_PAGE: usize = 10;
pub const MAX_PER_PAGE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn reverse(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

/// Case-insensitive substring matching over an entity's searchable text.
pub trait Searchable {
    /// `needle` is already lowercased and non-empty.
    fn matches(&self, needle: &str) -> bool;
}

/// A column an entity can be ordered by.
pub trait SortKey<T>: Copy + PartialEq {
    fn compare(self, a: &T, b: &T) -> Ordering;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort<K> {
    pub key: K,
    pub order: SortOrder,
}

impl<K: Copy + PartialEq> Sort<K> {
    pub fn asc(key: K) -> Self {
        Self {
            key,
            order: SortOrder::Asc,
        }
    }

    /// Clicking the active ascending column flips it to descending; any other
    /// click sorts ascending on the clicked column.
    pub fn toggle(self, key: K) -> Self {
        if self.key == key && self.order == SortOrder::Asc {
            Self {
                key,
                order: SortOrder::Desc,
            }
        } else {
            Self::asc(key)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.per_page)
    }

    /// 1-based index of the first row shown, 0 when the page is empty.
    pub fn first_item(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            (self.page - 1) * self.per_page + 1
        }
    }

    /// 1-based index of the last row shown, 0 when the page is empty.
    pub fn last_item(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            (self.page * self.per_page).min(self.total)
        }
    }
}

/// Slice a collection into its `page`-th chunk of `per_page` items.
pub fn paginate<T>(items: Vec<T>, page: usize, per_page: usize) -> Page<T> {
    let page = page.max(1);
    let per_page = per_page.clamp(1, MAX_PER_PAGE);
    let total = items.len();
    let start = (page - 1).saturating_mul(per_page);
    let items = items.into_iter().skip(start).take(per_page).collect();
    Page {
        items,
        page,
        per_page,
        total,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListView<K> {
    pub search: Option<String>,
    pub sort: Option<Sort<K>>,
}

impl<K> Default for ListView<K> {
    fn default() -> Self {
        Self {
            search: None,
            sort: None,
        }
    }
}

impl<K: Copy + PartialEq> ListView<K> {
    pub fn new(search: Option<String>, sort: Option<Sort<K>>) -> Self {
        Self { search, sort }
    }

    /// Filter then sort. The sort is stable: ties keep their input order.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T>
    where
        T: Searchable,
        K: SortKey<T>,
    {
        let needle = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut items: Vec<T> = match needle {
            Some(needle) => items.into_iter().filter(|i| i.matches(&needle)).collect(),
            None => items,
        };

        if let Some(sort) = self.sort {
            items.sort_by(|a, b| {
                let ord = sort.key.compare(a, b);
                match sort.order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            });
        }
        items
    }

    pub fn page<T>(&self, items: Vec<T>, page: usize, per_page: usize) -> Page<T>
    where
        T: Searchable,
        K: SortKey<T>,
    {
        paginate(self.apply(items), page, per_page)
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

impl Searchable for Product {
    fn matches(&self, needle: &str) -> bool {
        contains_ci(&self.name, needle)
            || self
                .description
                .as_deref()
                .is_some_and(|d| contains_ci(d, needle))
    }
}

impl Searchable for Category {
    fn matches(&self, needle: &str) -> bool {
        contains_ci(&self.name, needle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductSortBy {
    CreatedAt,
    Price,
    Name,
}

impl SortKey<Product> for ProductSortBy {
    fn compare(self, a: &Product, b: &Product) -> Ordering {
        match self {
            ProductSortBy::CreatedAt => a.created_at.cmp(&b.created_at),
            ProductSortBy::Price => a.price.cmp(&b.price),
            ProductSortBy::Name => a.name.cmp(&b.name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CategorySortBy {
    CreatedAt,
    Priority,
    Name,
}

impl SortKey<Category> for CategorySortBy {
    fn compare(self, a: &Category, b: &Category) -> Ordering {
        match self {
            CategorySortBy::CreatedAt => a.created_at.cmp(&b.created_at),
            CategorySortBy::Priority => a.priority.cmp(&b.priority),
            CategorySortBy::Name => a.name.cmp(&b.name),
        }
    }
}
