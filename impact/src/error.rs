//! Error types for impact calculation and order checkout
//!
//! The calculators themselves never fail. Errors only come from validating
//! the inputs that surround them: order lines, stock, coefficient files.

use std::fmt;

use uuid::Uuid;

/// Error types for impact and checkout operations
#[derive(Debug, Clone, PartialEq)]
pub enum ImpactError {
    /// Referenced product does not exist in the catalog
    ProductNotFound {
        product_id: Uuid,
    },

    /// Product exists but has been withdrawn from sale
    ProductInactive {
        product_id: Uuid,
        name: String,
    },

    /// Requested quantity exceeds available stock
    InsufficientStock {
        product_id: Uuid,
        name: String,
        requested: u32,
        available: u32,
    },

    /// Line quantity must be at least one
    InvalidQuantity {
        quantity: u32,
    },

    /// Order contains no line items
    EmptyOrder,

    /// Packaging score outside 1..=5
    InvalidPackagingScore {
        score: u8,
    },

    /// Unknown order status string
    InvalidStatus {
        value: String,
    },

    /// Page number below one or page size out of range
    InvalidPage {
        page: u32,
        limit: u32,
    },

    /// Minimum price above maximum price
    InvalidPriceRange {
        min_cents: i64,
        max_cents: i64,
    },

    /// Coefficient table row is negative or not finite
    InvalidCoefficient {
        category: String,
        field: String,
        value: f64,
    },
}

impl fmt::Display for ImpactError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImpactError::ProductNotFound { product_id } => {
                write!(f, "Product not found: {}", product_id)
            }
            ImpactError::ProductInactive { name, .. } => {
                write!(f, "Product is no longer available: {}", name)
            }
            ImpactError::InsufficientStock {
                name,
                requested,
                available,
                ..
            } => {
                write!(
                    f,
                    "Insufficient stock for {}: {} requested, {} available",
                    name, requested, available
                )
            }
            ImpactError::InvalidQuantity { quantity } => {
                write!(f, "Quantity must be at least 1, got {}", quantity)
            }
            ImpactError::EmptyOrder => {
                write!(f, "Order must contain at least one item")
            }
            ImpactError::InvalidPackagingScore { score } => {
                write!(f, "Packaging score {} is outside 1..=5", score)
            }
            ImpactError::InvalidStatus { value } => {
                write!(f, "Invalid order status: {}", value)
            }
            ImpactError::InvalidPage { page, limit } => {
                write!(f, "Invalid page {} with page size {}", page, limit)
            }
            ImpactError::InvalidPriceRange {
                min_cents,
                max_cents,
            } => {
                write!(
                    f,
                    "Minimum price {} exceeds maximum price {}",
                    min_cents, max_cents
                )
            }
            ImpactError::InvalidCoefficient {
                category,
                field,
                value,
            } => {
                write!(
                    f,
                    "Invalid {} coefficient for {}: {}",
                    field, category, value
                )
            }
        }
    }
}

impl std::error::Error for ImpactError {}

/// Result type for impact operations
pub type ImpactResult<T> = Result<T, ImpactError>;

/// Input validation utilities
pub mod validation {
    use super::*;
    use crate::coefficients::ImpactRates;

    /// Lowest allowed packaging score
    pub const MIN_PACKAGING_SCORE: u8 = 1;

    /// Highest allowed packaging score
    pub const MAX_PACKAGING_SCORE: u8 = 5;

    /// Validate a single line quantity
    pub fn validate_quantity(quantity: u32) -> ImpactResult<()> {
        if quantity == 0 {
            return Err(ImpactError::InvalidQuantity { quantity });
        }
        Ok(())
    }

    /// Validate packaging score range
    pub fn validate_packaging_score(score: u8) -> ImpactResult<()> {
        if !(MIN_PACKAGING_SCORE..=MAX_PACKAGING_SCORE).contains(&score) {
            return Err(ImpactError::InvalidPackagingScore { score });
        }
        Ok(())
    }

    /// Validate that every rate in a coefficient row is usable
    pub fn validate_rates(category: &str, rates: &ImpactRates) -> ImpactResult<()> {
        let fields = [
            ("carbon", rates.carbon),
            ("water", rates.water),
            ("energy", rates.energy),
        ];

        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(ImpactError::InvalidCoefficient {
                    category: category.to_string(),
                    field: field.to_string(),
                    value,
                });
            }
        }

        Ok(())
    }
}
