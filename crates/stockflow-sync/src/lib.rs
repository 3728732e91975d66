//! # stockflow-sync: Movement Synchronization Controller
//!
//! Keeps the entries and exits collections consistent with a data provider
//! while filters change, search text is typed, and rows are mutated.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Controller Architecture                            │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                 MovementsController (public handle)              │  │
//! │  │                                                                  │  │
//! │  │  mount / teardown, filter + pagination setters, mutations,      │  │
//! │  │  snapshot, clear_error                                           │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │   Debounce     │  │  Orchestrator  │  │  Mutation Coordinator  │    │
//! │  │                │  │                │  │                        │    │
//! │  │ entries 700ms  │─►│ generations    │◄─│ create/update/delete   │    │
//! │  │ exits   700ms  │  │ loading and    │  │ update_quantity        │    │
//! │  │ filter  300ms  │  │ refreshing     │  │ silent refetch         │    │
//! │  └────────────────┘  └───────┬────────┘  └────────────────────────┘    │
//! │                              │                                          │
//! │                              ▼                                          │
//! │                 MovementService (trait, injected)                       │
//! │                 └── SqliteMovementService (stockflow-db)                │
//! │                                                                         │
//! │  EVENTS (to the UI binding via ControllerEventEmitter):                 │
//! │  • emit_state - new snapshot after every change                         │
//! │  • emit_error - fault written to the error slot                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`controller`] - `MovementsController` and the event emitter trait
//! - `orchestrator` - Fetches, supersession and busy flags
//! - `mutation` - Mutations followed by a silent refetch
//! - [`debounce`] - Cancelable per-channel timers
//! - [`state`] - State, faults, generations and snapshots
//! - [`service`] - Provider contract and the SQLite provider
//! - [`config`] - Controller configuration
//! - [`error`] - Service and controller error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stockflow_core::Resource;
//! use stockflow_sync::{ControllerConfig, MovementsController, SqliteMovementService};
//!
//! let config = ControllerConfig::load_or_default(None);
//! let service = SqliteMovementService::open(&config).await?;
//! let controller = MovementsController::new(config, Arc::new(service));
//!
//! controller.mount().await;
//! controller.set_page(Resource::Entries, 2).await?;
//!
//! let snapshot = controller.snapshot();
//! println!("Entries: {}", snapshot.entries.pagination.total_items);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod controller;
pub mod debounce;
pub mod error;
mod mutation;
mod orchestrator;
pub mod service;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::ControllerConfig;
pub use controller::{ControllerEventEmitter, MovementsController, NoOpEmitter};
pub use debounce::{DebounceChannel, DebounceScheduler};
pub use error::{ControllerError, ControllerResult, ServiceError, ServiceResult};
pub use service::{MovementService, SqliteMovementService};
pub use state::{ControllerFault, ControllerSnapshot, FaultKind, FetchMode, MutationKind};
