//! # Mutation Coordinator
//!
//! Wraps create/update/delete/quantity calls.
//!
//! ```text
//!   create / update / delete / update_quantity
//!        │
//!        ▼
//!   MovementService ──── Err(msg) ──► error slot + Err(ControllerError::Mutation)
//!        │
//!        Ok
//!        ▼
//!   silent fetch of the affected resource only (page and filters unchanged)
//!        │
//!        ▼
//!   Ok(value)
//! ```
//!
//! Delete also holds the `refreshing` flag for its whole duration.

use tracing::{info, warn};

use stockflow_core::{MovementPayload, MovementRecord, QuantityUpdate, Resource};

use crate::controller::ControllerInner;
use crate::error::{ControllerError, ControllerResult, ServiceResult};
use crate::orchestrator::BusyGuard;
use crate::state::{ControllerFault, FetchMode, MutationKind};

impl ControllerInner {
    pub(crate) async fn create(
        &self,
        resource: Resource,
        payload: &MovementPayload,
    ) -> ControllerResult<MovementRecord> {
        self.ensure_live()?;

        let outcome = self.service.create(resource, payload).await;
        self.settle(resource, MutationKind::Create, outcome).await
    }

    pub(crate) async fn update(
        &self,
        resource: Resource,
        id: &str,
        payload: &MovementPayload,
    ) -> ControllerResult<MovementRecord> {
        self.ensure_live()?;

        let outcome = self.service.update(resource, id, payload).await;
        self.settle(resource, MutationKind::Update, outcome).await
    }

    pub(crate) async fn delete(&self, resource: Resource, id: &str) -> ControllerResult<()> {
        self.ensure_live()?;
        let _busy = BusyGuard::engage(self, FetchMode::Silent);

        let outcome = self.service.delete(resource, id).await;
        self.settle(resource, MutationKind::Delete, outcome).await
    }

    pub(crate) async fn update_quantity(
        &self,
        id: &str,
        update: &QuantityUpdate,
    ) -> ControllerResult<MovementRecord> {
        self.ensure_live()?;

        let outcome = self.service.update_quantity(id, update).await;
        self.settle(Resource::Exits, MutationKind::UpdateQuantity, outcome)
            .await
    }

    /// Refetches on success; records and re-raises on failure.
    async fn settle<T>(
        &self,
        resource: Resource,
        operation: MutationKind,
        outcome: ServiceResult<T>,
    ) -> ControllerResult<T> {
        match outcome {
            Ok(value) => {
                info!(resource = %resource, %operation, "Mutation succeeded");
                self.fetch_resource(resource, FetchMode::Silent).await;
                Ok(value)
            }
            Err(err) => {
                let message = err.to_string();
                warn!(resource = %resource, %operation, error = %message, "Mutation failed");

                self.record_fault(ControllerFault::mutation(resource, operation, message.clone()));
                Err(ControllerError::Mutation {
                    resource,
                    operation,
                    message,
                })
            }
        }
    }
}
