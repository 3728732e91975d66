//! # Controller State
//!
//! Everything the controller owns, behind one lock.
//!
//! ```text
//! ┌──────────────────────────── ControllerState ────────────────────────────┐
//! │                                                                         │
//! │  filters ─────────── FilterState (dates, category, two search texts)    │
//! │                                                                         │
//! │  entries ─┐                                                             │
//! │  exits  ──┴──────── ResourceSlot { records, pagination }                │
//! │                                                                         │
//! │  loading, refreshing  (Blocking vs Silent fetches)                      │
//! │  error ───────────── Option<ControllerFault>  (single shared slot)      │
//! │                                                                         │
//! │  generations ─────── GenerationTracker                                  │
//! │                      counter: 7                                         │
//! │                      latest:  entries = 7, exits = 6                    │
//! │                                                                         │
//! │  mounted, torn_down                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Generations
//! Every fetch takes a fresh number from one counter and records it as the
//! latest for each resource it targets. A result may only be committed while
//! its number is still the latest for its resource. A combined fetch records
//! the same number for both resources, so a later single-resource fetch
//! supersedes only its own half.

use serde::{Deserialize, Serialize};

use stockflow_core::{FilterState, MovementQuery, MovementRecord, PaginationState, Resource};

// =============================================================================
// Fetch Mode
// =============================================================================

/// Which busy flag a fetch raises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    /// Raises `loading`, the primary indicator.
    Blocking,
    /// Raises `refreshing` only.
    Silent,
}

// =============================================================================
// Faults
// =============================================================================

/// Mutation operations exposed by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Create,
    Update,
    Delete,
    UpdateQuantity,
}

impl MutationKind {
    /// Verb used in messages ("Failed to delete entry: ...").
    pub fn verb(&self) -> &'static str {
        match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
            MutationKind::UpdateQuantity => "update quantity of",
        }
    }
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MutationKind::Create => write!(f, "create"),
            MutationKind::Update => write!(f, "update"),
            MutationKind::Delete => write!(f, "delete"),
            MutationKind::UpdateQuantity => write!(f, "update_quantity"),
        }
    }
}

/// What failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "operation", rename_all = "snake_case")]
pub enum FaultKind {
    /// A listing request.
    Fetch,
    /// A create/update/delete/quantity call.
    Mutation(MutationKind),
}

/// Content of the shared error slot.
///
/// Tagged with the resource it concerns so a consumer can tell which half
/// of a combined fetch failed. `Display` renders one sentence such as
/// `"Failed to load exits: timeout"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerFault {
    pub resource: Resource,
    pub kind: FaultKind,
    /// Message reported by the provider.
    pub message: String,
}

impl ControllerFault {
    pub fn fetch(resource: Resource, message: impl Into<String>) -> Self {
        ControllerFault {
            resource,
            kind: FaultKind::Fetch,
            message: message.into(),
        }
    }

    pub fn mutation(resource: Resource, operation: MutationKind, message: impl Into<String>) -> Self {
        ControllerFault {
            resource,
            kind: FaultKind::Mutation(operation),
            message: message.into(),
        }
    }

    /// Returns true if this is a read failure of `resource`.
    pub fn is_fetch_of(&self, resource: Resource) -> bool {
        self.kind == FaultKind::Fetch && self.resource == resource
    }
}

impl std::fmt::Display for ControllerFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            FaultKind::Fetch => write!(f, "Failed to load {}: {}", self.resource, self.message),
            FaultKind::Mutation(operation) => write!(
                f,
                "Failed to {} {}: {}",
                operation.verb(),
                self.resource.singular(),
                self.message
            ),
        }
    }
}

// =============================================================================
// Generation Tracker
// =============================================================================

/// Monotonic fetch numbering, one "latest" mark per resource.
#[derive(Debug, Clone, Default)]
pub struct GenerationTracker {
    counter: u64,
    latest_entries: u64,
    latest_exits: u64,
}

impl GenerationTracker {
    /// Issues a new generation and marks it latest for `resources`.
    pub fn issue(&mut self, resources: &[Resource]) -> u64 {
        self.counter += 1;
        for resource in resources {
            match resource {
                Resource::Entries => self.latest_entries = self.counter,
                Resource::Exits => self.latest_exits = self.counter,
            }
        }
        self.counter
    }

    /// Latest generation issued for `resource` (0 before the first fetch).
    pub fn latest(&self, resource: Resource) -> u64 {
        match resource {
            Resource::Entries => self.latest_entries,
            Resource::Exits => self.latest_exits,
        }
    }

    /// Returns true if `generation` may still commit to `resource`.
    pub fn is_current(&self, resource: Resource, generation: u64) -> bool {
        self.latest(resource) == generation
    }
}

// =============================================================================
// Resource Slot
// =============================================================================

/// Loaded rows and pagination of one resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSlot {
    pub records: Vec<MovementRecord>,
    pub pagination: PaginationState,
}

impl ResourceSlot {
    fn with_limit(limit: u32) -> Self {
        ResourceSlot {
            records: Vec::new(),
            pagination: PaginationState::with_limit(limit),
        }
    }
}

// =============================================================================
// Controller State
// =============================================================================

/// Mutable state of one controller instance.
#[derive(Debug, Clone)]
pub struct ControllerState {
    pub filters: FilterState,
    pub entries: ResourceSlot,
    pub exits: ResourceSlot,
    pub loading: bool,
    pub refreshing: bool,
    pub error: Option<ControllerFault>,
    pub generations: GenerationTracker,
    pub mounted: bool,
    pub torn_down: bool,
}

impl ControllerState {
    /// Default filters, page 1 of `limit` rows for both resources.
    pub fn new(limit: u32) -> Self {
        ControllerState {
            filters: FilterState::default(),
            entries: ResourceSlot::with_limit(limit),
            exits: ResourceSlot::with_limit(limit),
            loading: false,
            refreshing: false,
            error: None,
            generations: GenerationTracker::default(),
            mounted: false,
            torn_down: false,
        }
    }

    pub fn slot(&self, resource: Resource) -> &ResourceSlot {
        match resource {
            Resource::Entries => &self.entries,
            Resource::Exits => &self.exits,
        }
    }

    pub fn slot_mut(&mut self, resource: Resource) -> &mut ResourceSlot {
        match resource {
            Resource::Entries => &mut self.entries,
            Resource::Exits => &mut self.exits,
        }
    }

    /// Listing query for `resource` from the current filters and page.
    pub fn query(&self, resource: Resource) -> MovementQuery {
        self.filters.to_query(resource, &self.slot(resource).pagination)
    }

    /// Raises or lowers the flag belonging to `mode`.
    pub fn set_busy(&mut self, mode: FetchMode, busy: bool) {
        match mode {
            FetchMode::Blocking => self.loading = busy,
            FetchMode::Silent => self.refreshing = busy,
        }
    }

    /// Read-only copy handed to consumers.
    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            filters: self.filters.clone(),
            entries: self.entries.clone(),
            exits: self.exits.clone(),
            loading: self.loading,
            refreshing: self.refreshing,
            error: self.error.clone(),
            mounted: self.mounted,
        }
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// Everything a consumer renders, as of one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerSnapshot {
    pub filters: FilterState,
    pub entries: ResourceSlot,
    pub exits: ResourceSlot,
    pub loading: bool,
    pub refreshing: bool,
    pub error: Option<ControllerFault>,
    pub mounted: bool,
}

impl ControllerSnapshot {
    pub fn slot(&self, resource: Resource) -> &ResourceSlot {
        match resource {
            Resource::Entries => &self.entries,
            Resource::Exits => &self.exits,
        }
    }

    /// Human-readable error message, if any.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }
}
