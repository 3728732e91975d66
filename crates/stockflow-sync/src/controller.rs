//! # Movements Controller
//!
//! The public handle consumers hold. Owns the state, the debounce timers and
//! the provider, and exposes every operation on them.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   new() ──────► setters only record values, nothing is fetched          │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │   mount() ────► exactly one blocking fetch of both resources            │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │   live ───────► search edits   ── 700ms ──► silent fetch (one resource) │
//! │     │           date/category  ── 300ms ──► blocking fetch (both)       │
//! │     │           set_page/limit ───────────► blocking fetch (one)        │
//! │     │           mutations      ───────────► silent fetch (one)          │
//! │     ▼                                                                   │
//! │   teardown() ─► timers cancelled, late results dropped,                 │
//! │                 mutations return ControllerError::TornDown              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! let config = ControllerConfig::load_or_default(None);
//! let service = Arc::new(SqliteMovementService::open(&config).await?);
//! let controller = MovementsController::new(config, service);
//!
//! controller.mount().await;
//! controller.set_search(Resource::Exits, "cable");
//!
//! let snapshot = controller.snapshot();
//! ```
//!
//! ## Locking
//! State lives behind one `RwLock`. The lock is never held across an await;
//! every write goes through `ControllerInner::update_state`, which emits
//! the new snapshot after releasing it.
//!
//! Each committed write is numbered under the write lock. Emission runs
//! under a separate mutex and skips any snapshot older than the last one
//! delivered, so the emitter's latest snapshot is always the latest state.
//! Emitters may read from the controller but must not write to it.
//!
//! Debounce timers hold only a `Weak` reference to the controller. Dropping
//! the last handle cancels every pending timer.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard};
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, info};

use stockflow_core::{
    CategoryFilter, FilterState, MovementPayload, MovementRecord, QuantityUpdate, Resource,
};

use crate::config::ControllerConfig;
use crate::debounce::{DebounceChannel, DebounceScheduler};
use crate::error::{ControllerError, ControllerResult};
use crate::service::MovementService;
use crate::state::{ControllerFault, ControllerSnapshot, ControllerState, FetchMode};

// =============================================================================
// Event Emitter Trait
// =============================================================================

/// Receives controller notifications (implemented by the UI binding).
pub trait ControllerEventEmitter: Send + Sync {
    /// Called after every state change with the new snapshot.
    fn emit_state(&self, snapshot: &ControllerSnapshot);

    /// Called when a fault is written to the error slot.
    fn emit_error(&self, fault: &ControllerFault);
}

/// No-op event emitter.
pub struct NoOpEmitter;

impl ControllerEventEmitter for NoOpEmitter {
    fn emit_state(&self, _snapshot: &ControllerSnapshot) {}
    fn emit_error(&self, _fault: &ControllerFault) {}
}

// =============================================================================
// Shared Inner State
// =============================================================================

/// State shared between the handle and its spawned debounce fetches.
pub(crate) struct ControllerInner {
    pub(crate) config: ControllerConfig,
    pub(crate) service: Arc<dyn MovementService>,
    emitter: Arc<dyn ControllerEventEmitter>,
    state: RwLock<ControllerState>,
    debounce: Mutex<DebounceScheduler>,
    /// Number of the latest committed write.
    revision: AtomicU64,
    /// Number of the latest snapshot handed to the emitter.
    emitted: Mutex<u64>,
}

impl ControllerInner {
    fn read_state(&self) -> RwLockReadGuard<'_, ControllerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies `f` under the write lock, then notifies the emitter.
    pub(crate) fn update_state<R>(&self, f: impl FnOnce(&mut ControllerState) -> R) -> R {
        let (result, pending) = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            let result = f(&mut state);
            let pending = (!state.torn_down).then(|| {
                let revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
                (revision, state.snapshot())
            });
            (result, pending)
        };

        if let Some((revision, snapshot)) = pending {
            self.emit_state(revision, &snapshot);
        }
        result
    }

    /// Delivers `snapshot` unless a newer one already went out.
    fn emit_state(&self, revision: u64, snapshot: &ControllerSnapshot) {
        let mut emitted = self.emitted.lock().unwrap_or_else(PoisonError::into_inner);
        if revision <= *emitted {
            debug!(revision, latest = *emitted, "Superseded snapshot not emitted");
            return;
        }
        *emitted = revision;
        self.emitter.emit_state(snapshot);
    }

    pub(crate) fn ensure_live(&self) -> ControllerResult<()> {
        if self.read_state().torn_down {
            return Err(ControllerError::TornDown);
        }
        Ok(())
    }

    /// Writes `fault` to the error slot and reports it.
    pub(crate) fn record_fault(&self, fault: ControllerFault) {
        let live = self.update_state(|state| {
            if state.torn_down {
                return false;
            }
            state.error = Some(fault.clone());
            true
        });

        if live {
            self.emit_fault(&fault);
        }
    }

    pub(crate) fn emit_fault(&self, fault: &ControllerFault) {
        self.emitter.emit_error(fault);
    }

    /// Arms `channel` unless the controller is already torn down.
    fn schedule<F>(&self, channel: DebounceChannel, quiet: Duration, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut debounce = self.debounce.lock().unwrap_or_else(PoisonError::into_inner);
        if self.read_state().torn_down {
            return;
        }
        debounce.schedule(channel, quiet, action);
    }

    fn cancel_debounce(&self) {
        self.debounce
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel_all();
    }
}

// =============================================================================
// Controller Handle
// =============================================================================

/// Handle to one controller instance. Clones share the same state.
#[derive(Clone)]
pub struct MovementsController {
    inner: Arc<ControllerInner>,
}

impl MovementsController {
    /// Creates an unmounted controller.
    pub fn new(config: ControllerConfig, service: Arc<dyn MovementService>) -> Self {
        Self::with_emitter(config, service, Arc::new(NoOpEmitter))
    }

    /// Creates an unmounted controller with a custom event emitter.
    pub fn with_emitter(
        config: ControllerConfig,
        service: Arc<dyn MovementService>,
        emitter: Arc<dyn ControllerEventEmitter>,
    ) -> Self {
        let state = ControllerState::new(config.paging.default_limit);

        MovementsController {
            inner: Arc::new(ControllerInner {
                config,
                service,
                emitter,
                state: RwLock::new(state),
                debounce: Mutex::new(DebounceScheduler::new()),
                revision: AtomicU64::new(0),
                emitted: Mutex::new(0),
            }),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Performs the initial load. Later calls do nothing.
    pub async fn mount(&self) {
        let first = self.inner.update_state(|state| {
            if state.mounted || state.torn_down {
                return false;
            }
            state.mounted = true;
            true
        });

        if !first {
            debug!("Mount ignored");
            return;
        }

        info!("Mounting movements controller");
        self.inner.fetch_both(FetchMode::Blocking).await;
    }

    /// Cancels pending timers and detaches from in-flight results.
    pub fn teardown(&self) {
        let was_live = self
            .inner
            .update_state(|state| !std::mem::replace(&mut state.torn_down, true));
        self.inner.cancel_debounce();

        if was_live {
            info!("Movements controller torn down");
        }
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.read_state().torn_down
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn snapshot(&self) -> ControllerSnapshot {
        self.inner.read_state().snapshot()
    }

    /// Empties the error slot.
    pub fn clear_error(&self) {
        self.inner.update_state(|state| state.error = None);
    }

    // =========================================================================
    // Filter Setters
    // =========================================================================

    /// Records the search text of `resource` and re-arms its search channel.
    pub fn set_search(&self, resource: Resource, text: impl Into<String>) {
        let text = text.into();
        let armed = self.inner.update_state(|state| {
            if state.torn_down || state.filters.search(resource) == text {
                return false;
            }
            state.filters.set_search(resource, text);
            state.mounted
        });

        if armed {
            let inner = Arc::downgrade(&self.inner);
            self.inner.schedule(
                DebounceChannel::search(resource),
                self.inner.config.search_quiet(),
                async move {
                    if let Some(inner) = inner.upgrade() {
                        inner.fetch_resource(resource, FetchMode::Silent).await;
                    }
                },
            );
        }
    }

    pub fn set_start_date(&self, date: Option<NaiveDate>) {
        self.edit_shared_filter(|filters| filters.start_date = date);
    }

    pub fn set_end_date(&self, date: Option<NaiveDate>) {
        self.edit_shared_filter(|filters| filters.end_date = date);
    }

    /// Sets both ends of the date range as one edit.
    pub fn set_date_range(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) {
        self.edit_shared_filter(|filters| {
            filters.start_date = start;
            filters.end_date = end;
        });
    }

    pub fn set_category(&self, category: CategoryFilter) {
        self.edit_shared_filter(|filters| filters.category = category);
    }

    /// Applies an edit to the date/category filters and re-arms the shared
    /// channel if anything changed.
    fn edit_shared_filter(&self, edit: impl FnOnce(&mut FilterState)) {
        let armed = self.inner.update_state(|state| {
            if state.torn_down {
                return false;
            }
            let before = state.filters.clone();
            edit(&mut state.filters);
            state.mounted && state.filters != before
        });

        if armed {
            let inner = Arc::downgrade(&self.inner);
            self.inner.schedule(
                DebounceChannel::SharedFilter,
                self.inner.config.filter_quiet(),
                async move {
                    if let Some(inner) = inner.upgrade() {
                        inner.fetch_both(FetchMode::Blocking).await;
                    }
                },
            );
        }
    }

    // =========================================================================
    // Pagination
    // =========================================================================

    /// Moves `resource` to `page` and fetches it.
    ///
    /// The page is not corrected against the reported page count.
    pub async fn set_page(&self, resource: Resource, page: u32) -> ControllerResult<()> {
        let fetch = self.inner.update_state(|state| -> ControllerResult<bool> {
            if state.torn_down {
                return Ok(false);
            }
            state.slot_mut(resource).pagination.set_page(page)?;
            Ok(state.mounted)
        })?;

        if fetch {
            self.inner.fetch_resource(resource, FetchMode::Blocking).await;
        }
        Ok(())
    }

    /// Changes the page size of `resource` and fetches it. Keeps the page.
    pub async fn set_limit(&self, resource: Resource, limit: u32) -> ControllerResult<()> {
        let fetch = self.inner.update_state(|state| -> ControllerResult<bool> {
            if state.torn_down {
                return Ok(false);
            }
            state.slot_mut(resource).pagination.set_limit(limit)?;
            Ok(state.mounted)
        })?;

        if fetch {
            self.inner.fetch_resource(resource, FetchMode::Blocking).await;
        }
        Ok(())
    }

    // =========================================================================
    // Fetches
    // =========================================================================

    /// Fetches both resources, superseding every older fetch.
    pub async fn fetch_both(&self, mode: FetchMode) {
        self.inner.fetch_both(mode).await;
    }

    pub async fn fetch_entries(&self, mode: FetchMode) {
        self.inner.fetch_resource(Resource::Entries, mode).await;
    }

    pub async fn fetch_exits(&self, mode: FetchMode) {
        self.inner.fetch_resource(Resource::Exits, mode).await;
    }

    pub async fn fetch_resource(&self, resource: Resource, mode: FetchMode) {
        self.inner.fetch_resource(resource, mode).await;
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Creates a movement, then silently refetches `resource`.
    pub async fn create(
        &self,
        resource: Resource,
        payload: &MovementPayload,
    ) -> ControllerResult<MovementRecord> {
        self.inner.create(resource, payload).await
    }

    /// Replaces a movement, then silently refetches `resource`.
    pub async fn update(
        &self,
        resource: Resource,
        id: &str,
        payload: &MovementPayload,
    ) -> ControllerResult<MovementRecord> {
        self.inner.update(resource, id, payload).await
    }

    /// Deletes a movement, then silently refetches `resource`.
    pub async fn delete(&self, resource: Resource, id: &str) -> ControllerResult<()> {
        self.inner.delete(resource, id).await
    }

    /// Corrects the quantity of an exit, then silently refetches exits.
    pub async fn update_quantity(
        &self,
        id: &str,
        update: &QuantityUpdate,
    ) -> ControllerResult<MovementRecord> {
        self.inner.update_quantity(id, update).await
    }
}
