//! # Fetch Orchestrator
//!
//! Issues listing requests and decides which results may be committed.
//!
//! ## Fetch Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      fetch_both(mode)                                   │
//! │                                                                         │
//! │  1. under the lock: issue generation G for entries AND exits,           │
//! │     raise loading/refreshing, build both queries                        │
//! │                                                                         │
//! │  2. without the lock:                                                   │
//! │        get_all(entries, q1) ──┐                                         │
//! │                               ├── race, no ordering between them        │
//! │        get_all(exits,   q2) ──┘                                         │
//! │                                                                         │
//! │  3. each result, under the lock:                                        │
//! │        G still latest for its resource?                                 │
//! │          yes ─► Ok   → replace rows, copy server totals                 │
//! │                 Err  → write error slot (unless cancellation)           │
//! │          no  ─► discard silently                                        │
//! │                                                                         │
//! │  4. both settled: lower the flag (BusyGuard drop)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each resource commits on its own, so one half of a combined fetch can
//! succeed while the other fails.

use tracing::{debug, warn};

use stockflow_core::{MovementPage, MovementQuery, Resource};

use crate::controller::ControllerInner;
use crate::error::ServiceResult;
use crate::state::{ControllerFault, FetchMode};

// =============================================================================
// Busy Guard
// =============================================================================

/// Lowers a busy flag when dropped.
///
/// Holding one across the awaited work clears the flag on every exit path,
/// including the caller dropping the future.
pub(crate) struct BusyGuard<'a> {
    inner: &'a ControllerInner,
    mode: FetchMode,
}

impl<'a> BusyGuard<'a> {
    /// Raises the flag of `mode` and returns its guard.
    pub(crate) fn engage(inner: &'a ControllerInner, mode: FetchMode) -> Self {
        inner.update_state(|state| state.set_busy(mode, true));
        BusyGuard::adopt(inner, mode)
    }

    /// Takes over a flag the caller already raised.
    fn adopt(inner: &'a ControllerInner, mode: FetchMode) -> Self {
        BusyGuard { inner, mode }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let mode = self.mode;
        self.inner.update_state(|state| state.set_busy(mode, false));
    }
}

// =============================================================================
// Orchestration
// =============================================================================

impl ControllerInner {
    /// Fetches both resources concurrently under one generation.
    pub(crate) async fn fetch_both(&self, mode: FetchMode) {
        let issued = self.update_state(|state| {
            if state.torn_down {
                return None;
            }
            let generation = state.generations.issue(&Resource::ALL);
            state.set_busy(mode, true);
            Some((
                generation,
                state.query(Resource::Entries),
                state.query(Resource::Exits),
            ))
        });

        let Some((generation, entries_query, exits_query)) = issued else {
            return;
        };
        let _busy = BusyGuard::adopt(self, mode);

        debug!(generation, ?mode, "Fetching entries and exits");

        tokio::join!(
            self.load_and_commit(Resource::Entries, generation, entries_query),
            self.load_and_commit(Resource::Exits, generation, exits_query),
        );
    }

    /// Fetches one resource, superseding any older fetch of it.
    pub(crate) async fn fetch_resource(&self, resource: Resource, mode: FetchMode) {
        let issued = self.update_state(|state| {
            if state.torn_down {
                return None;
            }
            let generation = state.generations.issue(&[resource]);
            state.set_busy(mode, true);
            Some((generation, state.query(resource)))
        });

        let Some((generation, query)) = issued else {
            return;
        };
        let _busy = BusyGuard::adopt(self, mode);

        self.load_and_commit(resource, generation, query).await;
    }

    async fn load_and_commit(&self, resource: Resource, generation: u64, query: MovementQuery) {
        debug!(
            resource = %resource,
            generation,
            page = query.page,
            limit = query.limit,
            search = ?query.search,
            category = ?query.category,
            "Issuing fetch"
        );

        let outcome = self.service.get_all(resource, &query).await;
        self.commit(resource, generation, outcome);
    }

    /// Applies a fetch result if its generation is still the latest.
    fn commit(&self, resource: Resource, generation: u64, outcome: ServiceResult<MovementPage>) {
        let fault = self.update_state(|state| {
            if state.torn_down || !state.generations.is_current(resource, generation) {
                debug!(
                    resource = %resource,
                    generation,
                    latest = state.generations.latest(resource),
                    "Discarding superseded result"
                );
                return None;
            }

            match outcome {
                Ok(page) => {
                    debug!(
                        resource = %resource,
                        generation,
                        rows = page.data.len(),
                        total = page.pagination.total,
                        "Committing page"
                    );
                    let slot = state.slot_mut(resource);
                    slot.records = page.data;
                    slot.pagination.apply_server_totals(&page.pagination);

                    if state.error.as_ref().is_some_and(|f| f.is_fetch_of(resource)) {
                        state.error = None;
                    }
                    None
                }
                Err(err) if err.is_cancellation() => {
                    debug!(resource = %resource, generation, "Fetch cancelled");
                    None
                }
                Err(err) => {
                    let fault = ControllerFault::fetch(resource, err.to_string());
                    state.error = Some(fault.clone());
                    Some(fault)
                }
            }
        });

        if let Some(fault) = fault {
            warn!(resource = %resource, error = %fault.message, "Fetch failed");
            self.emit_fault(&fault);
        }
    }
}
