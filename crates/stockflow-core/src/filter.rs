//! # Filter State
//!
//! The filters the controller owns: a date range and a category flag shared
//! by both resources, plus one search text per resource.
//!
//! ```text
//! ┌──────────────────────────── FilterState ────────────────────────────┐
//! │                                                                     │
//! │   shared ──► start_date, end_date, category  (both resources)       │
//! │                                                                     │
//! │   search_entries ──► entries only                                   │
//! │   search_exits   ──► exits only                                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Raw search text is stored exactly as typed; trimming happens only when a
//! query is built.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::pagination::PaginationState;
use crate::types::{MovementQuery, Resource};

// =============================================================================
// Category Filter
// =============================================================================

/// Shared category flag.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "tag", rename_all = "snake_case")]
pub enum CategoryFilter {
    /// No category filtering.
    #[default]
    All,
    /// Only movements tagged with this category.
    Only(String),
}

impl CategoryFilter {
    /// Creates a filter from an optional tag; blank tags mean unfiltered.
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag.map(str::trim) {
            Some(tag) if !tag.is_empty() => CategoryFilter::Only(tag.to_string()),
            _ => CategoryFilter::All,
        }
    }

    /// The tag sent to providers, if any.
    pub fn tag(&self) -> Option<&str> {
        match self {
            CategoryFilter::All => None,
            CategoryFilter::Only(tag) => Some(tag),
        }
    }
}

// =============================================================================
// Filter State
// =============================================================================

/// All filter inputs of the controller.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub category: CategoryFilter,
    pub search_entries: String,
    pub search_exits: String,
}

impl FilterState {
    /// Raw search text for a resource.
    pub fn search(&self, resource: Resource) -> &str {
        match resource {
            Resource::Entries => &self.search_entries,
            Resource::Exits => &self.search_exits,
        }
    }

    /// Replaces the raw search text for a resource.
    pub fn set_search(&mut self, resource: Resource, text: impl Into<String>) {
        let text = text.into();
        match resource {
            Resource::Entries => self.search_entries = text,
            Resource::Exits => self.search_exits = text,
        }
    }

    /// Search term to send, `None` when the text is blank.
    pub fn search_term(&self, resource: Resource) -> Option<String> {
        let term = self.search(resource).trim();
        (!term.is_empty()).then(|| term.to_string())
    }

    /// Builds the listing query for a resource from these filters and its
    /// pagination state.
    pub fn to_query(&self, resource: Resource, pagination: &PaginationState) -> MovementQuery {
        MovementQuery {
            start_date: self.start_date,
            end_date: self.end_date,
            page: pagination.page,
            limit: pagination.limit,
            category: self.category.tag().map(str::to_string),
            search: self.search_term(resource),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_unfiltered() {
        let filters = FilterState::default();
        assert_eq!(filters.start_date, None);
        assert_eq!(filters.end_date, None);
        assert_eq!(filters.category, CategoryFilter::All);
        assert_eq!(filters.search(Resource::Entries), "");
    }

    #[test]
    fn test_search_is_per_resource() {
        let mut filters = FilterState::default();
        filters.set_search(Resource::Exits, "cable");

        assert_eq!(filters.search(Resource::Exits), "cable");
        assert_eq!(filters.search(Resource::Entries), "");
        assert_eq!(filters.search_term(Resource::Entries), None);
    }

    #[test]
    fn test_raw_text_kept_but_query_trimmed() {
        let mut filters = FilterState::default();
        filters.set_search(Resource::Entries, "  nut ");

        assert_eq!(filters.search(Resource::Entries), "  nut ");
        let query = filters.to_query(Resource::Entries, &PaginationState::default());
        assert_eq!(query.search.as_deref(), Some("nut"));

        filters.set_search(Resource::Entries, "   ");
        let query = filters.to_query(Resource::Entries, &PaginationState::default());
        assert_eq!(query.search, None);
    }

    #[test]
    fn test_query_carries_shared_filters() {
        let filters = FilterState {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 31),
            category: CategoryFilter::Only("tools".to_string()),
            ..Default::default()
        };
        let pagination = PaginationState {
            page: 3,
            limit: 20,
            ..Default::default()
        };

        let query = filters.to_query(Resource::Exits, &pagination);
        assert_eq!(query.start_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(query.end_date, NaiveDate::from_ymd_opt(2024, 1, 31));
        assert_eq!(query.category.as_deref(), Some("tools"));
        assert_eq!(query.page, 3);
        assert_eq!(query.limit, 20);
    }

    #[test]
    fn test_category_from_tag() {
        assert_eq!(CategoryFilter::from_tag(None), CategoryFilter::All);
        assert_eq!(CategoryFilter::from_tag(Some("  ")), CategoryFilter::All);
        assert_eq!(
            CategoryFilter::from_tag(Some("paint")).tag(),
            Some("paint")
        );
    }
}
