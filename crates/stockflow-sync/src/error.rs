//! # Controller Error Types
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Controller Error Categories                         │
//! │                                                                         │
//! │  ┌─────────────────────┐            ┌─────────────────────────────────┐ │
//! │  │   ServiceError      │            │        ControllerError          │ │
//! │  │   (provider side)   │            │        (caller side)            │ │
//! │  │                     │  mutation  │                                 │ │
//! │  │  Cancelled          │  ───────►  │  Mutation { resource, op, msg } │ │
//! │  │  Rejected(msg)      │            │  Validation                     │ │
//! │  │  Validation         │            │  InvalidConfig                  │ │
//! │  │  Database           │            │  ConfigLoadFailed / SaveFailed  │ │
//! │  └─────────┬───────────┘            │  TornDown                       │ │
//! │            │ fetch                  └─────────────────────────────────┘ │
//! │            ▼                                                            │
//! │  ControllerFault in the error slot (never returned to the caller)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Read failures stay inside the controller: they land in the error slot and
//! rendering continues with the data already loaded. Mutation failures land
//! in the error slot AND come back to the caller.

use thiserror::Error;

use stockflow_core::{Resource, ValidationError};
use stockflow_db::DbError;

use crate::state::MutationKind;

/// Result type alias for provider calls.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result type alias for controller operations.
pub type ControllerResult<T> = Result<T, ControllerError>;

// =============================================================================
// Service Error
// =============================================================================

/// Failure reported by a [`MovementService`](crate::service::MovementService).
///
/// The `Display` output of every variant is the human-readable message that
/// ends up in the error slot.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The call was superseded or aborted by the transport.
    ///
    /// Expected, never surfaced to the user.
    #[error("Request cancelled")]
    Cancelled,

    /// The provider refused the call.
    #[error("{0}")]
    Rejected(String),

    /// The payload or id failed validation before reaching storage.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The storage layer failed.
    #[error("{0}")]
    Database(#[from] DbError),
}

impl ServiceError {
    /// Shorthand for [`ServiceError::Rejected`].
    pub fn rejected(message: impl Into<String>) -> Self {
        ServiceError::Rejected(message.into())
    }

    /// Returns true for the well-known cancellation marker.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, ServiceError::Cancelled)
    }
}

// =============================================================================
// Controller Error
// =============================================================================

/// Error returned by controller operations that re-raise failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    /// A create/update/delete/quantity call was rejected.
    ///
    /// The same failure is also written to the error slot.
    #[error("Failed to {} {}: {message}", .operation.verb(), .resource.singular())]
    Mutation {
        resource: Resource,
        operation: MutationKind,
        message: String,
    },

    /// A page or limit value was rejected before any fetch.
    #[error("Invalid value: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration failed validation.
    #[error("Invalid controller configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    /// The controller has been torn down.
    #[error("Controller has been torn down")]
    TornDown,
}

impl ControllerError {
    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ControllerError::InvalidConfig(_)
                | ControllerError::ConfigLoadFailed(_)
                | ControllerError::ConfigSaveFailed(_)
        )
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<std::io::Error> for ControllerError {
    fn from(err: std::io::Error) -> Self {
        ControllerError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ControllerError {
    fn from(err: toml::de::Error) -> Self {
        ControllerError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ControllerError {
    fn from(err: toml::ser::Error) -> Self {
        ControllerError::ConfigSaveFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_messages_are_bare() {
        assert_eq!(ServiceError::rejected("network error").to_string(), "network error");

        let err: ServiceError = DbError::not_found("exit", "abc").into();
        assert_eq!(err.to_string(), "exit not found: abc");
    }

    #[test]
    fn test_cancellation_marker() {
        assert!(ServiceError::Cancelled.is_cancellation());
        assert!(!ServiceError::rejected("timeout").is_cancellation());
    }

    #[test]
    fn test_mutation_error_display() {
        let err = ControllerError::Mutation {
            resource: Resource::Entries,
            operation: MutationKind::Delete,
            message: "network error".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to delete entry: network error");
        assert!(!err.is_config_error());
    }

    #[test]
    fn test_config_errors() {
        let err: ControllerError = std::io::Error::other("denied").into();
        assert!(matches!(err, ControllerError::ConfigLoadFailed(_)));
        assert!(err.is_config_error());
    }
}
