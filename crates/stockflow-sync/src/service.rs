//! # Movement Service
//!
//! The data contract the controller consumes, and the SQLite provider that
//! implements it.
//!
//! ## Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  MovementService (resource ∈ entries|exits)             │
//! │                                                                         │
//! │  get_all(resource, query)        → MovementPage { data, pagination }   │
//! │  create(resource, payload)       → MovementRecord                      │
//! │  update(resource, id, payload)   → MovementRecord                      │
//! │  delete(resource, id)            → ()                                  │
//! │  update_quantity(id, qty)        → MovementRecord      (exits only)    │
//! │                                                                         │
//! │  Every call may fail with a ServiceError whose Display is the          │
//! │  human-readable message. ServiceError::Cancelled marks a call the      │
//! │  transport gave up on because it was superseded.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The controller never looks behind this trait; tests swap in a scripted
//! in-memory implementation.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use stockflow_core::validation::{validate_id, validate_payload, validate_quantity};
use stockflow_core::{
    MovementPage, MovementPayload, MovementQuery, MovementRecord, PageInfo, QuantityUpdate,
    Resource,
};
use stockflow_db::Database;

use crate::config::ControllerConfig;
use crate::error::ServiceResult;

// =============================================================================
// Service Trait
// =============================================================================

/// Per-resource data provider consumed by the controller.
#[async_trait]
pub trait MovementService: Send + Sync {
    /// Lists one page of `resource` matching `query`.
    async fn get_all(&self, resource: Resource, query: &MovementQuery) -> ServiceResult<MovementPage>;

    /// Creates a movement.
    async fn create(&self, resource: Resource, payload: &MovementPayload) -> ServiceResult<MovementRecord>;

    /// Replaces a movement's writable fields.
    async fn update(
        &self,
        resource: Resource,
        id: &str,
        payload: &MovementPayload,
    ) -> ServiceResult<MovementRecord>;

    /// Deletes a movement.
    async fn delete(&self, resource: Resource, id: &str) -> ServiceResult<()>;

    /// Corrects the quantity of an exit.
    async fn update_quantity(&self, id: &str, update: &QuantityUpdate) -> ServiceResult<MovementRecord>;
}

// =============================================================================
// SQLite Provider
// =============================================================================

/// [`MovementService`] backed by `stockflow-db`.
///
/// ## Usage
/// ```rust,ignore
/// let config = ControllerConfig::load_or_default(None);
/// let service = SqliteMovementService::open(&config).await?;
/// let controller = MovementsController::new(config, Arc::new(service));
/// ```
#[derive(Debug, Clone)]
pub struct SqliteMovementService {
    db: Arc<Database>,
}

impl SqliteMovementService {
    /// Wraps an open database.
    pub fn new(db: Arc<Database>) -> Self {
        SqliteMovementService { db }
    }

    /// Opens (and migrates) the database described by `config`.
    pub async fn open(config: &ControllerConfig) -> ServiceResult<Self> {
        let db = Database::new(config.db_config()).await?;
        info!("SQLite movement service ready");
        Ok(SqliteMovementService::new(Arc::new(db)))
    }

    /// The underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl MovementService for SqliteMovementService {
    async fn get_all(&self, resource: Resource, query: &MovementQuery) -> ServiceResult<MovementPage> {
        let (data, total) = self.db.movements(resource).list(query).await?;

        Ok(MovementPage {
            data,
            pagination: PageInfo::from_total(query.page, query.limit, total),
        })
    }

    async fn create(&self, resource: Resource, payload: &MovementPayload) -> ServiceResult<MovementRecord> {
        validate_payload(payload)?;

        let record = self.db.movements(resource).insert(payload).await?;
        debug!(resource = %resource, id = %record.id, "Movement created");
        Ok(record)
    }

    async fn update(
        &self,
        resource: Resource,
        id: &str,
        payload: &MovementPayload,
    ) -> ServiceResult<MovementRecord> {
        validate_id(id)?;
        validate_payload(payload)?;

        Ok(self.db.movements(resource).update(id, payload).await?)
    }

    async fn delete(&self, resource: Resource, id: &str) -> ServiceResult<()> {
        validate_id(id)?;

        Ok(self.db.movements(resource).delete(id).await?)
    }

    async fn update_quantity(&self, id: &str, update: &QuantityUpdate) -> ServiceResult<MovementRecord> {
        validate_id(id)?;
        validate_quantity(update.quantity)?;

        Ok(self
            .db
            .movements(Resource::Exits)
            .update_quantity(id, update.quantity)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::MovementsController;
    use crate::error::{ControllerError, ServiceError};
    use chrono::NaiveDate;
    use stockflow_core::{Money, ValidationError};
    use stockflow_db::DbConfig;

    async fn service() -> SqliteMovementService {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        SqliteMovementService::new(Arc::new(db))
    }

    fn payload(quantity: i64) -> MovementPayload {
        MovementPayload::new(
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            "BOLT-10",
            "Hex bolt",
            Money::from_cents(300),
            quantity,
        )
    }

    fn first_page() -> MovementQuery {
        MovementQuery {
            start_date: None,
            end_date: None,
            page: 1,
            limit: 100,
            category: None,
            search: None,
        }
    }

    #[tokio::test]
    async fn test_get_all_reports_server_totals() {
        let service = service().await;
        for _ in 0..3 {
            service.create(Resource::Exits, &payload(1)).await.unwrap();
        }

        let mut query = first_page();
        query.limit = 2;
        let page = service.get_all(Resource::Exits, &query).await.unwrap();

        assert_eq!(page.data.len(), 2);
        assert_eq!(page.pagination.total, 3);
        assert_eq!(page.pagination.total_pages, 2);
        assert_eq!(page.pagination.page, 1);
    }

    #[tokio::test]
    async fn test_create_validates_payload() {
        let service = service().await;

        let err = service.create(Resource::Entries, &payload(0)).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::MustBePositive { .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_ids() {
        let service = service().await;

        let err = service.delete(Resource::Entries, "nope").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let err = service
            .delete(Resource::Entries, "550e8400-e29b-41d4-a716-446655440000")
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "entry not found: 550e8400-e29b-41d4-a716-446655440000"
        );
    }

    #[tokio::test]
    async fn test_update_quantity_targets_exits() {
        let service = service().await;
        let exit = service.create(Resource::Exits, &payload(5)).await.unwrap();
        let entry = service.create(Resource::Entries, &payload(5)).await.unwrap();

        let updated = service
            .update_quantity(&exit.id, &QuantityUpdate { quantity: 2 })
            .await
            .unwrap();
        assert_eq!(updated.quantity, 2);

        let err = service
            .update_quantity(&entry.id, &QuantityUpdate { quantity: 2 })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Database(_)));
    }

    #[tokio::test]
    async fn test_controller_over_sqlite() {
        let service = Arc::new(service().await);
        let controller = MovementsController::new(ControllerConfig::default(), service.clone());
        controller.mount().await;

        let created = controller
            .create(Resource::Entries, &payload(2))
            .await
            .unwrap();

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.entries.pagination.total_items, 1);
        assert_eq!(snapshot.entries.pagination.total_pages, 1);
        assert_eq!(snapshot.entries.records, vec![created.clone()]);
        assert_eq!(snapshot.exits.pagination.total_items, 0);

        let err = controller
            .update_quantity(&created.id, &QuantityUpdate { quantity: 4 })
            .await
            .unwrap_err();
        assert!(matches!(err, ControllerError::Mutation { .. }));
        assert_eq!(
            controller.snapshot().error_message(),
            Some(format!(
                "Failed to update quantity of exit: exit not found: {}",
                created.id
            ))
        );
    }
}
