use serde::Deserialize;

use crate::core::config::Settings;
use crate::services::listing::{filter_items, paginate, ListCriteria, Listable, Page};

/// Query-string parameters shared by every list endpoint.
///
/// Synonyms are separate fields rather than serde aliases so a query naming
/// two of them is not rejected as a duplicate; the first one set wins.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    pub(crate) q: Option<String>,
    #[serde(default)]
    pub(crate) search: Option<String>,
    #[serde(default)]
    pub(crate) category: Option<String>,
    #[serde(default)]
    pub(crate) role: Option<String>,
    #[serde(default)]
    pub(crate) subject: Option<String>,
    #[serde(default)]
    pub(crate) status: Option<String>,
    #[serde(default)]
    pub(crate) page: Option<usize>,
    #[serde(default)]
    pub(crate) page_size: Option<usize>,
    #[serde(default, rename = "pageSize")]
    pub(crate) page_size_camel: Option<usize>,
    #[serde(default)]
    pub(crate) refresh: Option<bool>,
}

fn first_set<'a>(values: &[&'a Option<String>]) -> Option<&'a str> {
    values.iter().copied().filter_map(Option::as_deref).find(|value| !value.trim().is_empty())
}

impl ListQuery {
    pub(crate) fn criteria(&self) -> ListCriteria {
        ListCriteria::new(
            first_set(&[&self.q, &self.search]),
            first_set(&[&self.category, &self.role, &self.subject]),
            self.status.as_deref(),
        )
    }

    /// Narrowing the list without naming a page starts over at page 1.
    pub(crate) fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }

    pub(crate) fn page_size(&self, settings: &Settings) -> usize {
        let listing = settings.listing();
        self.page_size
            .or(self.page_size_camel)
            .unwrap_or(listing.page_size)
            .clamp(1, listing.max_page_size)
    }

    pub(crate) fn refresh(&self) -> bool {
        self.refresh.unwrap_or(false)
    }
}

pub(crate) fn list_page<T: Listable + Clone>(
    items: &[T],
    query: &ListQuery,
    settings: &Settings,
) -> Page<T> {
    let filtered = filter_items(items, &query.criteria());
    paginate(filtered, query.page(), query.page_size(settings))
}
