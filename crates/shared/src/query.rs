//! Shareable view state of the template list and its query-string form.

use std::ops::Range;

use url::form_urlencoded;

use crate::domain::{SortDirection, SortField};

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const PAGE_SIZE_OPTIONS: [usize; 3] = [10, 20, 50];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Page index, not an item offset.
    pub from: usize,
    pub size: usize,
    pub search: String,
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            from: 0,
            size: DEFAULT_PAGE_SIZE,
            search: String::new(),
            sort_field: SortField::Name,
            sort_direction: SortDirection::Desc,
        }
    }
}

/// The part of the query the operator filters with.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchFilter {
    pub search: String,
}

/// Parameters of the catalog call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogFilter {
    pub name_pattern: String,
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
}

impl CatalogFilter {
    /// Value of the catalog's `s` parameter, e.g. `name:desc`.
    pub fn sort_spec(&self) -> String {
        format!(
            "{}:{}",
            self.sort_field.as_str(),
            self.sort_direction.as_str()
        )
    }
}

impl ListQuery {
    /// Reads a query string, falling back to the default for every key that is
    /// missing or malformed.
    pub fn from_query_string(raw: &str) -> Self {
        let mut query = Self::default();
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            match key.as_ref() {
                "from" => {
                    if let Ok(parsed) = value.parse() {
                        query.from = parsed;
                    }
                }
                "size" => {
                    if let Ok(parsed) = value.parse::<usize>() {
                        if parsed > 0 {
                            query.size = parsed;
                        }
                    }
                }
                "search" => query.search = value.into_owned(),
                "sortField" => {
                    if let Some(field) = SortField::parse(&value) {
                        query.sort_field = field;
                    }
                }
                "sortDirection" => {
                    if let Some(direction) = SortDirection::parse(&value) {
                        query.sort_direction = direction;
                    }
                }
                _ => {}
            }
        }
        query
    }

    /// Keys are written in alphabetical order so the same state always produces the
    /// same link.
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair("from", &self.from.to_string())
            .append_pair("search", &self.search)
            .append_pair("size", &self.size.to_string())
            .append_pair("sortDirection", self.sort_direction.as_str())
            .append_pair("sortField", self.sort_field.as_str())
            .finish()
    }

    pub fn filter(&self) -> SearchFilter {
        SearchFilter {
            search: self.search.clone(),
        }
    }

    pub fn is_default_filter(&self) -> bool {
        self.filter() == SearchFilter::default()
    }

    pub fn catalog_filter(&self) -> CatalogFilter {
        CatalogFilter {
            name_pattern: format!("*{}*", self.search),
            sort_field: self.sort_field,
            sort_direction: self.sort_direction,
        }
    }

    pub fn page_range(&self, total: usize) -> Range<usize> {
        page_range(self.from, self.size, total)
    }
}

/// Bounds of page `from` of `size` items over `total` items; empty past the end.
pub fn page_range(from: usize, size: usize, total: usize) -> Range<usize> {
    let start = from.saturating_mul(size).min(total);
    let end = start.saturating_add(size).min(total);
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_string_round_trips_the_view() {
        let query = ListQuery {
            from: 2,
            size: 50,
            search: "logs app".into(),
            sort_field: SortField::Order,
            sort_direction: SortDirection::Asc,
        };
        let raw = query.to_query_string();
        assert_eq!(
            raw,
            "from=2&search=logs+app&size=50&sortDirection=asc&sortField=order"
        );
        assert_eq!(ListQuery::from_query_string(&raw), query);
        assert_eq!(ListQuery::from_query_string(&format!("?{raw}")), query);
    }

    #[test]
    fn malformed_keys_fall_back_to_defaults() {
        let query =
            ListQuery::from_query_string("from=x&size=0&sortField=bogus&sortDirection=up&extra=1");
        assert_eq!(query, ListQuery::default());
    }

    #[test]
    fn catalog_filter_wraps_search_in_wildcards() {
        let query = ListQuery {
            search: "web".into(),
            ..Default::default()
        };
        let filter = query.catalog_filter();
        assert_eq!(filter.name_pattern, "*web*");
        assert_eq!(filter.sort_spec(), "name:desc");
    }

    #[test]
    fn page_length_matches_remaining_items() {
        for total in 0usize..30 {
            for size in 1..7 {
                for from in 0..8 {
                    let expected = size.min(total.saturating_sub(from * size));
                    assert_eq!(page_range(from, size, total).len(), expected);
                }
            }
        }
    }

    #[test]
    fn default_filter_detection() {
        assert!(ListQuery::default().is_default_filter());
        let query = ListQuery {
            search: "x".into(),
            ..Default::default()
        };
        assert!(!query.is_default_filter());
    }
}
