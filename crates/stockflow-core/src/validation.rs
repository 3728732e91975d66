//! # Validation Module
//!
//! Input validation shared by the controller (pagination values) and the
//! data providers (movement payloads).
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Consumer forms                                               │
//! │  └── Immediate feedback, not trusted                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Provider (before any write)                                  │
//! │  └── THIS MODULE: validate_payload / validate_quantity                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  └── NOT NULL / CHECK constraints                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockflow_core::validation::{validate_product_code, validate_quantity};
//!
//! assert!(validate_product_code("BOLT-10").is_ok());
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::MovementPayload;
use crate::{FIRST_PAGE, MAX_PAGE_LIMIT, MAX_PRODUCT_CODE_LEN, MAX_TEXT_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product code.
///
/// ## Rules
/// - Must not be blank
/// - At most 50 characters
pub fn validate_product_code(code: &str) -> ValidationResult<()> {
    validate_required_text("product_code", code, MAX_PRODUCT_CODE_LEN)
}

/// Validates a movement description.
pub fn validate_description(description: &str) -> ValidationResult<()> {
    validate_required_text("description", description, MAX_TEXT_LEN)
}

fn validate_required_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    validate_max_len(field, value, max)
}

fn validate_optional_text(field: &str, value: Option<&str>) -> ValidationResult<()> {
    match value {
        Some(value) => validate_max_len(field, value.trim(), MAX_TEXT_LEN),
        None => Ok(()),
    }
}

fn validate_max_len(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a movement quantity.
///
/// ## Rules
/// - Must be positive (> 0); direction comes from entry vs exit, never sign
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a unit price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0); zero-cost movements are allowed
pub fn validate_unit_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "unit_price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a 1-based page number.
pub fn validate_page(page: u32) -> ValidationResult<()> {
    if page < FIRST_PAGE {
        return Err(ValidationError::MustBePositive {
            field: "page".to_string(),
        });
    }

    Ok(())
}

/// Validates a page size.
///
/// ## Rules
/// - Between 1 and MAX_PAGE_LIMIT (1000)
pub fn validate_limit(limit: u32) -> ValidationResult<()> {
    if limit == 0 || limit > MAX_PAGE_LIMIT {
        return Err(ValidationError::OutOfRange {
            field: "limit".to_string(),
            min: 1,
            max: i64::from(MAX_PAGE_LIMIT),
        });
    }

    Ok(())
}

// =============================================================================
// Payload Validators
// =============================================================================

/// Validates every field of a create/update payload.
pub fn validate_payload(payload: &MovementPayload) -> ValidationResult<()> {
    validate_product_code(&payload.product_code)?;
    validate_description(&payload.description)?;
    validate_quantity(payload.quantity)?;
    validate_unit_price_cents(payload.unit_price.cents())?;
    validate_optional_text("responsible", payload.responsible.as_deref())?;
    validate_optional_text("area", payload.area.as_deref())?;
    validate_optional_text("category", payload.category.as_deref())?;
    validate_optional_text("project", payload.project.as_deref())?;
    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a record identifier.
pub fn validate_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Money;
    use chrono::NaiveDate;

    fn payload() -> MovementPayload {
        MovementPayload::new(
            NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            "PIPE-20",
            "PVC pipe 20mm",
            Money::from_cents(450),
            3,
        )
    }

    #[test]
    fn test_validate_product_code() {
        assert!(validate_product_code("PIPE-20").is_ok());
        assert!(validate_product_code("").is_err());
        assert!(validate_product_code("   ").is_err());
        assert!(validate_product_code(&"A".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(10_000).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-2).is_err());
    }

    #[test]
    fn test_validate_pagination_values() {
        assert!(validate_page(1).is_ok());
        assert!(validate_page(0).is_err());
        assert!(validate_limit(1).is_ok());
        assert!(validate_limit(1000).is_ok());
        assert!(validate_limit(0).is_err());
        assert!(validate_limit(1001).is_err());
    }

    #[test]
    fn test_validate_payload() {
        assert!(validate_payload(&payload()).is_ok());

        let mut bad = payload();
        bad.unit_price = Money::from_cents(-1);
        assert!(matches!(
            validate_payload(&bad),
            Err(ValidationError::OutOfRange { .. })
        ));

        let mut bad = payload();
        bad.description = String::new();
        assert_eq!(
            validate_payload(&bad),
            Err(ValidationError::Required {
                field: "description".to_string()
            })
        );

        let mut bad = payload();
        bad.area = Some("x".repeat(300));
        assert!(validate_payload(&bad).is_err());
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_id("").is_err());
        assert!(validate_id("not-a-uuid").is_err());
    }
}
