//! # Validation Module
//!
//! Input validation for requests entering a unit of work.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Deserialization (serde)                                      │
//! │  ├── Types, required keys                                              │
//! │  └── deny_unknown_fields on partial updates                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Quantity bounds, payment method, courier allow-list               │
//! │  └── Runs before any transaction is opened                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints (quantity >= 0, status, courier)               │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use bazaar_core::validation::{validate_courier, validate_quantity};
//!
//! validate_quantity(3).unwrap();
//! assert!(validate_courier("Uthao").is_ok());
//! assert!(validate_courier("DHL").is_err());
//! ```

use crate::delivery::Courier;
use crate::error::ValidationError;
use crate::types::{NewProduct, ProductUpdate};
use crate::MAX_PURCHASE_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted payment method label.
pub const MAX_PAYMENT_METHOD_LEN: usize = 50;

/// Longest accepted tracking number.
pub const MAX_TRACKING_NUMBER_LEN: usize = 100;

/// Longest accepted product name.
pub const MAX_PRODUCT_NAME_LEN: usize = 200;

// =============================================================================
// Purchase
// =============================================================================

/// Validates a purchase quantity.
///
/// ## Rules
/// - At least 1
/// - At most [`MAX_PURCHASE_QUANTITY`] (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if !(1..=MAX_PURCHASE_QUANTITY).contains(&qty) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_PURCHASE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates an opaque payment method label and returns it trimmed.
pub fn validate_payment_method(method: &str) -> ValidationResult<String> {
    let method = method.trim();

    if method.is_empty() {
        return Err(ValidationError::Required {
            field: "payment_method".to_string(),
        });
    }

    if method.chars().count() > MAX_PAYMENT_METHOD_LEN {
        return Err(ValidationError::TooLong {
            field: "payment_method".to_string(),
            max: MAX_PAYMENT_METHOD_LEN,
        });
    }

    Ok(method.to_string())
}

// =============================================================================
// Shipping
// =============================================================================

/// Resolves a courier identifier against the allow-list (exact match).
pub fn validate_courier(name: &str) -> ValidationResult<Courier> {
    name.parse()
}

/// Normalizes an optional tracking number.
///
/// Surrounding whitespace is trimmed and blank values become `None`.
/// Anything else is stored as given, up to the length limit.
pub fn validate_tracking_number(tracking: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(tracking) = tracking.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };

    if tracking.chars().count() > MAX_TRACKING_NUMBER_LEN {
        return Err(ValidationError::TooLong {
            field: "tracking_number".to_string(),
            max: MAX_TRACKING_NUMBER_LEN,
        });
    }

    Ok(Some(tracking.to_string()))
}

// =============================================================================
// Products
// =============================================================================

/// Validates a product name.
///
/// ## Example
/// ```rust
/// use bazaar_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Nakshi Kantha").is_ok());
/// assert!(validate_product_name("  ").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_PRODUCT_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_PRODUCT_NAME_LEN,
        });
    }

    Ok(())
}

/// Prices may be zero, never negative.
pub fn validate_price(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "price_cents".to_string(),
        });
    }

    Ok(())
}

/// Stock levels may be zero, never negative.
pub fn validate_stock(quantity: i64) -> ValidationResult<()> {
    if quantity < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    validate_product_name(&product.name)?;
    validate_price(product.price_cents)?;
    validate_stock(product.quantity)
}

/// Validates only the fields that are present.
pub fn validate_product_update(update: &ProductUpdate) -> ValidationResult<()> {
    if let Some(name) = &update.name {
        validate_product_name(name)?;
    }
    if let Some(price) = update.price_cents {
        validate_price(price)?;
    }
    if let Some(quantity) = update.quantity {
        validate_stock(quantity)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_payment_method() {
        assert_eq!(validate_payment_method("  bkash ").unwrap(), "bkash");
        assert!(validate_payment_method("").is_err());
        assert!(validate_payment_method(&"x".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_courier() {
        assert_eq!(validate_courier("Abul and Co").unwrap(), Courier::AbulAndCo);

        let err = validate_courier("Pathao").unwrap_err();
        match err {
            ValidationError::NotAllowed { field, allowed } => {
                assert_eq!(field, "courier_service");
                assert_eq!(allowed.len(), 4);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_validate_tracking_number() {
        assert_eq!(validate_tracking_number(None).unwrap(), None);
        assert_eq!(validate_tracking_number(Some("   ")).unwrap(), None);
        assert_eq!(
            validate_tracking_number(Some(" UT-1234 ")).unwrap(),
            Some("UT-1234".to_string())
        );
        assert_eq!(
            validate_tracking_number(Some("RB 2024/01 #77")).unwrap(),
            Some("RB 2024/01 #77".to_string())
        );
        assert!(validate_tracking_number(Some(&"9".repeat(MAX_TRACKING_NUMBER_LEN + 1))).is_err());
    }

    #[test]
    fn test_validate_product_update() {
        let update = ProductUpdate {
            price_cents: Some(-1),
            ..Default::default()
        };
        assert!(validate_product_update(&update).is_err());

        let update = ProductUpdate {
            quantity: Some(0),
            ..Default::default()
        };
        assert!(validate_product_update(&update).is_ok());
    }
}
