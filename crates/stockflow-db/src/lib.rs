//! # stockflow-db: Database Layer for Stockflow
//!
//! This crate provides SQLite storage for inventory movements. It is the
//! concrete data provider behind the controller's `MovementService`
//! contract; the controller itself never sees SQL.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockflow Data Flow                              │
//! │                                                                         │
//! │  MovementsController ──► SqliteMovementService (stockflow-sync)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   stockflow-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (movement.rs)  │    │  (embedded)  │  │   │
//! │  │   │               │    │                │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ entries table  │    │ 001_movements│  │   │
//! │  │   │               │    │ exits table    │    │              │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Movement repository
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockflow_core::Resource;
//! use stockflow_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::in_memory()).await?;
//! let (rows, total) = db.movements(Resource::Entries).list(&query).await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::movement::MovementRepository;
