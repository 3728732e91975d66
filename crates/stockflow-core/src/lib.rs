//! # stockflow-core: Pure Domain Model for Inventory Movements
//!
//! This crate holds everything the synchronization controller and the data
//! providers agree on: movement records, the query sent to a provider, the
//! filter and pagination state the controller owns, and the validation rules
//! a provider applies before writing.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockflow Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Consumers (tables, forms, exports)                 │   │
//! │  │       render ControllerSnapshot, call controller operations     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            stockflow-sync (MovementsController)                 │   │
//! │  │   debounce ──► fetch orchestrator ──► mutation coordinator      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ stockflow-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  filter   │  │ pagination │  │ validation│  │   │
//! │  │   │  Record   │  │  dates    │  │ page/limit │  │  payload  │  │   │
//! │  │   │  Query    │  │  search   │  │  totals    │  │  rules    │  │   │
//! │  │   └───────────┘  └───────────┘  └────────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO TIMERS • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                stockflow-db (SQLite provider)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Records, payloads, queries and pages
//! - [`filter`] - Shared date/category filter and per-resource search text
//! - [`pagination`] - Per-resource page/limit and server-reported totals
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Payload validation used by providers
//!
//! ## Example Usage
//!
//! ```rust
//! use stockflow_core::{FilterState, PaginationState, Resource};
//!
//! let mut filters = FilterState::default();
//! filters.set_search(Resource::Entries, "  bolt ");
//!
//! let query = filters.to_query(Resource::Entries, &PaginationState::default());
//! assert_eq!(query.search.as_deref(), Some("bolt"));
//! assert_eq!(query.limit, 100);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod filter;
pub mod money;
pub mod pagination;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use filter::{CategoryFilter, FilterState};
pub use money::Money;
pub use pagination::PaginationState;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// First page number. Pages are 1-based everywhere in the system.
pub const FIRST_PAGE: u32 = 1;

/// Page size used when nothing else is configured.
pub const DEFAULT_PAGE_LIMIT: u32 = 100;

/// Largest page size a caller may request.
///
/// ## Business Reason
/// Keeps a single listing request bounded; providers are free to serve less.
pub const MAX_PAGE_LIMIT: u32 = 1000;

/// Maximum length of free-text fields (description, responsible, area...).
pub const MAX_TEXT_LEN: usize = 200;

/// Maximum length of a product code.
pub const MAX_PRODUCT_CODE_LEN: usize = 50;
