//! # Repository Module
//!
//! Database repository implementations for Stockflow.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  SqliteMovementService                                                 │
//! │       │                                                                 │
//! │       │  db.movements(Resource::Exits).list(&query)                     │
//! │       ▼                                                                 │
//! │  MovementRepository { resource: Exits }                                │
//! │  ├── list(&self, query)          → (rows, total)                       │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── insert(&self, payload)                                            │
//! │  ├── update(&self, id, payload)                                        │
//! │  ├── delete(&self, id)                                                 │
//! │  └── update_quantity(&self, id, qty)                                   │
//! │       │                                                                 │
//! │       │  SQL against the `exits` table                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Entries and exits share one repository type; the resource picks the
//! table and whether the `project` column exists.

pub mod movement;
