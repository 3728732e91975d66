//! # Pagination State
//!
//! Per-resource page/limit chosen locally plus the totals last reported by
//! the provider.
//!
//! `total_pages` is copied from the server, never recomputed here. The page
//! number is not clamped either: after a limit or filter change `page` may
//! point past `total_pages`, in which case the provider answers with an
//! empty page.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::PageInfo;
use crate::validation::{validate_limit, validate_page, ValidationResult};
use crate::{DEFAULT_PAGE_LIMIT, FIRST_PAGE};

/// Pagination of one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationState {
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
    /// Matching rows across all pages, as reported by the provider.
    pub total_items: u64,
    /// Page count, as reported by the provider.
    pub total_pages: u32,
}

impl Default for PaginationState {
    fn default() -> Self {
        PaginationState::with_limit(DEFAULT_PAGE_LIMIT)
    }
}

impl PaginationState {
    /// First page with the given size and no totals yet.
    pub fn with_limit(limit: u32) -> Self {
        PaginationState {
            page: FIRST_PAGE,
            limit,
            total_items: 0,
            total_pages: 0,
        }
    }

    /// Moves to another page.
    pub fn set_page(&mut self, page: u32) -> ValidationResult<()> {
        validate_page(page)?;
        self.page = page;
        Ok(())
    }

    /// Changes the page size. The current page is kept as-is.
    pub fn set_limit(&mut self, limit: u32) -> ValidationResult<()> {
        validate_limit(limit)?;
        self.limit = limit;
        Ok(())
    }

    /// Copies server-reported totals. `page` and `limit` stay local.
    pub fn apply_server_totals(&mut self, info: &PageInfo) {
        self.total_items = info.total;
        self.total_pages = info.total_pages;
    }
}

impl TryFrom<(u32, u32)> for PaginationState {
    type Error = ValidationError;

    fn try_from((page, limit): (u32, u32)) -> Result<Self, Self::Error> {
        let mut state = PaginationState::with_limit(DEFAULT_PAGE_LIMIT);
        state.set_limit(limit)?;
        state.set_page(page)?;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = PaginationState::default();
        assert_eq!(state.page, 1);
        assert_eq!(state.limit, 100);
        assert_eq!(state.total_items, 0);
        assert_eq!(state.total_pages, 0);
    }

    #[test]
    fn test_set_limit_keeps_page() {
        let mut state = PaginationState::default();
        state.set_page(4).unwrap();
        state.set_limit(50).unwrap();

        assert_eq!(state.page, 4);
        assert_eq!(state.limit, 50);
    }

    #[test]
    fn test_rejects_zero_values() {
        let mut state = PaginationState::default();
        assert!(state.set_page(0).is_err());
        assert!(state.set_limit(0).is_err());
        assert!(state.set_limit(5000).is_err());
        assert_eq!(state, PaginationState::default());
    }

    #[test]
    fn test_server_totals_do_not_touch_page() {
        let mut state = PaginationState::try_from((2, 100)).unwrap();
        state.apply_server_totals(&PageInfo::from_total(2, 100, 50));

        assert_eq!(state.page, 2);
        assert_eq!(state.total_items, 50);
        assert_eq!(state.total_pages, 1);
    }
}
