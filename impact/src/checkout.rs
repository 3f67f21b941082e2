//! Order drafting
//!
//! Builds everything an order needs before it is persisted: the stock plan,
//! per-line impact, the order total and the impact summary.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ImpactError, ImpactResult};
use crate::order::{aggregate_order_impact, OrderImpactSummary, OrderLine};
use crate::product::{ImpactCalculator, Product};
use crate::stock::{plan_reservations, LineRequest, Reservation};

/// A validated order, ready to be stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub user_id: Uuid,
    pub lines: Vec<OrderLine>,
    pub reservations: Vec<Reservation>,
    pub total_amount_cents: i64,
    pub impact: OrderImpactSummary,
}

impl OrderDraft {
    pub fn item_count(&self) -> u32 {
        self.lines.len() as u32
    }
}

/// Validate requests against the catalog and compute line and order impact
///
/// Nothing is mutated here. A draft is only produced when every line passes,
/// so a rejected order never leaves partial stock changes behind.
pub fn draft_order(
    calculator: &ImpactCalculator,
    user_id: Uuid,
    catalog: &HashMap<Uuid, Product>,
    requests: &[LineRequest],
) -> ImpactResult<OrderDraft> {
    let reservations = plan_reservations(catalog, requests)?;

    let lines = requests
        .iter()
        .map(|request| {
            let product = catalog.get(&request.product_id).ok_or(ImpactError::ProductNotFound {
                product_id: request.product_id,
            })?;

            Ok(OrderLine {
                product_id: product.id,
                quantity: request.quantity,
                unit_price_cents: product.price_cents,
                impact: Some(calculator.compute_product_impact(product, request.quantity)),
            })
        })
        .collect::<ImpactResult<Vec<_>>>()?;

    let total_amount_cents = lines.iter().map(OrderLine::line_total_cents).sum();
    let impact = aggregate_order_impact(&lines);

    Ok(OrderDraft {
        user_id,
        lines,
        reservations,
        total_amount_cents,
        impact,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coefficients::Category;
    use crate::product::SustainabilityFlags;

    fn shirt() -> Product {
        Product {
            id: Uuid::from_u128(7),
            name: "Organic Recycled Tee".to_string(),
            category: Category::Clothing,
            sustainability: SustainabilityFlags {
                is_organic: true,
                is_recycled: true,
                ..Default::default()
            },
            price_cents: 2_999,
            stock: 10,
            sales_count: 0,
            is_active: true,
        }
    }

    #[test]
    fn test_draft_computes_lines_and_summary() {
        let product = shirt();
        let catalog = HashMap::from([(product.id, product.clone())]);
        let requests = [LineRequest {
            product_id: product.id,
            quantity: 2,
        }];

        let draft = draft_order(&ImpactCalculator::default(), Uuid::nil(), &catalog, &requests).unwrap();

        assert_eq!(draft.item_count(), 1);
        assert_eq!(draft.total_amount_cents, 5_998);
        assert_eq!(draft.impact.total_carbon_footprint, 15.0);
        assert_eq!(draft.impact.total_water_saved, 4500.0);
        assert_eq!(draft.impact.total_energy_saved, 75.0);
        assert_eq!(draft.impact.trees_saved, 0.7);
        assert_eq!(draft.reservations[0].quantity, 2);
    }

    #[test]
    fn test_draft_rejects_overdraw() {
        let product = shirt();
        let catalog = HashMap::from([(product.id, product.clone())]);
        let requests = [LineRequest {
            product_id: product.id,
            quantity: 11,
        }];

        let result = draft_order(&ImpactCalculator::default(), Uuid::nil(), &catalog, &requests);
        assert!(matches!(result, Err(ImpactError::InsufficientStock { .. })));
    }
}
