//! In-memory filtering and fixed-size paging over a fully fetched collection.
//!
//! Every list endpoint fetches the whole collection from its service and
//! narrows it here, so this only suits the small collections the services
//! return today.

use serde::Serialize;

/// Exposes the fields a collection item is searched and filtered on.
pub(crate) trait Listable {
    /// Text fields matched case-insensitively against the search string.
    fn search_fields(&self) -> Vec<&str>;

    fn category(&self) -> Option<&str> {
        None
    }

    fn status(&self) -> Option<&str> {
        None
    }

    /// `status` is already lowercased.
    fn has_status(&self, status: &str) -> bool {
        self.status().is_some_and(|value| value.to_lowercase() == status)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ListCriteria {
    search: Option<String>,
    category: Option<String>,
    status: Option<String>,
}

impl ListCriteria {
    pub(crate) fn new(
        search: Option<&str>,
        category: Option<&str>,
        status: Option<&str>,
    ) -> Self {
        Self {
            search: normalize(search),
            category: normalize(category),
            status: normalize(status),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.search.is_none() && self.category.is_none() && self.status.is_none()
    }

    pub(crate) fn matches<T: Listable + ?Sized>(&self, item: &T) -> bool {
        if let Some(search) = &self.search {
            let hit = item
                .search_fields()
                .into_iter()
                .any(|field| field.to_lowercase().contains(search.as_str()));
            if !hit {
                return false;
            }
        }

        if let Some(category) = &self.category {
            if !item.category().is_some_and(|value| value.to_lowercase() == *category) {
                return false;
            }
        }

        if let Some(status) = &self.status {
            if !item.has_status(status) {
                return false;
            }
        }

        true
    }
}

fn normalize(value: Option<&str>) -> Option<String> {
    value.map(|raw| raw.trim().to_lowercase()).filter(|raw| !raw.is_empty() && raw != "all")
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub(crate) struct Page<T> {
    pub(crate) items: Vec<T>,
    pub(crate) page: usize,
    pub(crate) page_size: usize,
    pub(crate) total_count: usize,
    pub(crate) total_pages: usize,
}

pub(crate) fn filter_items<T: Listable + Clone>(items: &[T], criteria: &ListCriteria) -> Vec<T> {
    if criteria.is_empty() {
        return items.to_vec();
    }

    items.iter().filter(|item| criteria.matches(*item)).cloned().collect()
}

pub(crate) fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

/// Slices `items` into the 1-based `page`; page 0 is read as page 1 and pages
/// past the end come back empty with the totals intact.
pub(crate) fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> Page<T> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let total_count = items.len();
    let total_pages = page_count(total_count, page_size);
    let start = (page - 1).saturating_mul(page_size);

    let items = items.into_iter().skip(start).take(page_size).collect();

    Page { items, page, page_size, total_count, total_pages }
}
