//! # Domain Types
//!
//! Core domain types shared by the controller and the data providers.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ MovementRecord  │   │ MovementPayload │   │  MovementQuery  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  date           │   │  start/end date │       │
//! │  │  date           │   │  product_code   │   │  page, limit    │       │
//! │  │  product_code   │   │  unit_price     │   │  category       │       │
//! │  │  unit_price     │   │  quantity       │   │  search         │       │
//! │  │  quantity       │   │  project (exit) │   └─────────────────┘       │
//! │  │  kind ──────────┼─┐ └─────────────────┘                             │
//! │  └─────────────────┘ │ ┌─────────────────┐   ┌─────────────────┐       │
//! │                      └►│  MovementKind   │   │  MovementPage   │       │
//! │                        │  Entry          │   │  data: [Record] │       │
//! │                        │  Exit{project}  │   │  pagination     │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Records are immutable once fetched: the controller replaces a whole
//! collection with the next successful page, it never patches rows in place.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::money::Money;

// =============================================================================
// Resource
// =============================================================================

/// The two movement collections kept in sync by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    /// Inbound inventory movements.
    Entries,
    /// Outbound inventory movements.
    Exits,
}

impl Resource {
    /// Both resources, in the order the controller loads them.
    pub const ALL: [Resource; 2] = [Resource::Entries, Resource::Exits];

    /// Singular noun used in human-readable messages ("entry", "exit").
    pub fn singular(&self) -> &'static str {
        match self {
            Resource::Entries => "entry",
            Resource::Exits => "exit",
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resource::Entries => write!(f, "entries"),
            Resource::Exits => write!(f, "exits"),
        }
    }
}

impl std::str::FromStr for Resource {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "entries" | "entry" => Ok(Resource::Entries),
            "exits" | "exit" => Ok(Resource::Exits),
            other => Err(CoreError::UnknownResource(other.to_string())),
        }
    }
}

// =============================================================================
// Movement Record
// =============================================================================

/// Variant-specific part of a movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MovementKind {
    /// Inbound movement.
    Entry,
    /// Outbound movement, optionally charged to a project.
    Exit { project: Option<String> },
}

/// One inventory movement as returned by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRecord {
    /// Unique identifier (UUID v4), assigned by the provider.
    pub id: String,

    /// Day the movement happened.
    pub date: NaiveDate,

    /// Product code (business identifier of the moved item).
    pub product_code: String,

    /// Free-text description of the item.
    pub description: String,

    /// Price of one unit.
    pub unit_price: Money,

    /// Number of units moved.
    pub quantity: i64,

    /// Person responsible for the movement.
    pub responsible: Option<String>,

    /// Area the movement belongs to.
    pub area: Option<String>,

    /// Category tag matched by the shared category filter.
    pub category: Option<String>,

    /// Entry or exit specific data.
    #[serde(flatten)]
    pub kind: MovementKind,
}

impl MovementRecord {
    /// Returns which collection this record belongs to.
    pub fn resource(&self) -> Resource {
        match self.kind {
            MovementKind::Entry => Resource::Entries,
            MovementKind::Exit { .. } => Resource::Exits,
        }
    }

    /// Returns `unit_price × quantity`.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }

    /// Returns the project for exits, `None` for entries.
    pub fn project(&self) -> Option<&str> {
        match &self.kind {
            MovementKind::Entry => None,
            MovementKind::Exit { project } => project.as_deref(),
        }
    }
}

// =============================================================================
// Payloads
// =============================================================================

/// Writable fields of a movement, used by create and update.
///
/// `project` is only stored for exits; providers ignore it for entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementPayload {
    pub date: NaiveDate,
    pub product_code: String,
    pub description: String,
    pub unit_price: Money,
    pub quantity: i64,
    #[serde(default)]
    pub responsible: Option<String>,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
}

impl MovementPayload {
    /// Creates a payload with the required fields and no optional ones.
    pub fn new(
        date: NaiveDate,
        product_code: impl Into<String>,
        description: impl Into<String>,
        unit_price: Money,
        quantity: i64,
    ) -> Self {
        MovementPayload {
            date,
            product_code: product_code.into(),
            description: description.into(),
            unit_price,
            quantity,
            responsible: None,
            area: None,
            category: None,
            project: None,
        }
    }

    /// Builds the record a provider stores for this payload.
    pub fn into_record(self, id: impl Into<String>, resource: Resource) -> MovementRecord {
        let kind = match resource {
            Resource::Entries => MovementKind::Entry,
            Resource::Exits => MovementKind::Exit {
                project: self.project,
            },
        };

        MovementRecord {
            id: id.into(),
            date: self.date,
            product_code: self.product_code,
            description: self.description,
            unit_price: self.unit_price,
            quantity: self.quantity,
            responsible: self.responsible,
            area: self.area,
            category: self.category,
            kind,
        }
    }
}

/// Exit-only quantity correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityUpdate {
    pub quantity: i64,
}

// =============================================================================
// Query & Page
// =============================================================================

/// Parameters of a listing request (`getAll`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementQuery {
    /// Inclusive lower bound on `date`.
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound on `date`.
    pub end_date: Option<NaiveDate>,
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
    /// Category tag; `None` means unfiltered.
    pub category: Option<String>,
    /// Trimmed, non-empty search term; `None` means no search.
    pub search: Option<String>,
}

impl MovementQuery {
    /// Number of rows to skip for this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// Pagination metadata reported by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: u32,
    pub limit: u32,
    /// Total number of matching rows across all pages.
    pub total: u64,
    /// `ceil(total / limit)`, authoritative for consumers.
    pub total_pages: u32,
}

impl PageInfo {
    /// Computes page metadata the way a server does.
    ///
    /// ## Example
    /// ```rust
    /// use stockflow_core::PageInfo;
    ///
    /// let info = PageInfo::from_total(2, 100, 50);
    /// assert_eq!(info.total_pages, 1);
    /// ```
    pub fn from_total(page: u32, limit: u32, total: u64) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total.div_ceil(u64::from(limit))
        };

        PageInfo {
            page,
            limit,
            total,
            total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
        }
    }
}

/// One page of records plus its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementPage {
    pub data: Vec<MovementRecord>,
    pub pagination: PageInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payload() -> MovementPayload {
        MovementPayload::new(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            "BOLT-10",
            "Hex bolt 10mm",
            Money::from_cents(300),
            2,
        )
    }

    #[test]
    fn test_resource_parsing_and_display() {
        assert_eq!("entries".parse::<Resource>().unwrap(), Resource::Entries);
        assert_eq!("Exit".parse::<Resource>().unwrap(), Resource::Exits);
        assert!("returns".parse::<Resource>().is_err());
        assert_eq!(Resource::Exits.to_string(), "exits");
        assert_eq!(Resource::Entries.singular(), "entry");
    }

    #[test]
    fn test_payload_into_entry_drops_project() {
        let mut payload = sample_payload();
        payload.project = Some("P-1".to_string());

        let record = payload.into_record("id-1", Resource::Entries);
        assert_eq!(record.kind, MovementKind::Entry);
        assert_eq!(record.project(), None);
        assert_eq!(record.resource(), Resource::Entries);
    }

    #[test]
    fn test_payload_into_exit_keeps_project() {
        let mut payload = sample_payload();
        payload.project = Some("P-1".to_string());

        let record = payload.into_record("id-2", Resource::Exits);
        assert_eq!(record.project(), Some("P-1"));
        assert_eq!(record.resource(), Resource::Exits);
        assert_eq!(record.line_total().cents(), 600);
    }

    #[test]
    fn test_page_info_total_pages() {
        assert_eq!(PageInfo::from_total(1, 100, 0).total_pages, 0);
        assert_eq!(PageInfo::from_total(1, 100, 1).total_pages, 1);
        assert_eq!(PageInfo::from_total(1, 100, 100).total_pages, 1);
        assert_eq!(PageInfo::from_total(1, 100, 101).total_pages, 2);
        assert_eq!(PageInfo::from_total(1, 0, 10).total_pages, 0);
    }

    #[test]
    fn test_query_offset() {
        let query = MovementQuery {
            start_date: None,
            end_date: None,
            page: 3,
            limit: 25,
            category: None,
            search: None,
        };
        assert_eq!(query.offset(), 50);
    }

    #[test]
    fn test_exit_record_json_shape() {
        let record = sample_payload().into_record("id-3", Resource::Exits);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "exit");
        assert_eq!(json["unit_price"], 300);
        assert!(json.get("project").is_some());
    }
}
