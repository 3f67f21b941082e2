//! Stock reservation planning
//!
//! Every requested line is checked against a catalog snapshot before any
//! stock is touched. Only a plan that passes for all lines is handed to the
//! store, which applies it in a single transaction.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{validation, ImpactError, ImpactResult};
use crate::product::Product;

/// Requested order line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
    pub product_id: Uuid,
    pub quantity: u32,
}

/// Stock to take from one product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub product_id: Uuid,
    pub quantity: u32,
}

/// Validate all lines and return one reservation per product
///
/// Repeated products are merged so their combined demand is checked against
/// stock. Reservations come back in ascending product id order, which is also
/// the order the store locks rows in.
pub fn plan_reservations(
    catalog: &HashMap<Uuid, Product>,
    requests: &[LineRequest],
) -> ImpactResult<Vec<Reservation>> {
    if requests.is_empty() {
        return Err(ImpactError::EmptyOrder);
    }

    let mut demand: BTreeMap<Uuid, u32> = BTreeMap::new();
    for request in requests {
        validation::validate_quantity(request.quantity)?;
        let total = demand.entry(request.product_id).or_insert(0);
        *total = total.saturating_add(request.quantity);
    }

    demand
        .into_iter()
        .map(|(product_id, quantity)| {
            let product = catalog
                .get(&product_id)
                .ok_or(ImpactError::ProductNotFound { product_id })?;

            if !product.is_active {
                return Err(ImpactError::ProductInactive {
                    product_id,
                    name: product.name.clone(),
                });
            }

            if product.stock < quantity {
                return Err(ImpactError::InsufficientStock {
                    product_id,
                    name: product.name.clone(),
                    requested: quantity,
                    available: product.stock,
                });
            }

            Ok(Reservation {
                product_id,
                quantity,
            })
        })
        .collect()
}
