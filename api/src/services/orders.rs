//! Order placement
//!
//! # Flow
//!
//! ```text
//! 1. load every referenced product (one query)
//! 2. draft_order: validate lines, plan stock, compute line + order impact
//! 3. store.place_order: apply reservations + insert order in one transaction
//! ```
//!
//! Nothing is written before step 3, and step 3 is all or nothing.

use std::collections::HashMap;

use eco_impact::{draft_order, ImpactCalculator, ImpactError, LineRequest, OrderStatus};
use uuid::Uuid;

use crate::db::{ImpactStore, StoredOrder};
use crate::error::ApiError;

/// Place an order for `user_id`
pub async fn place_order(
    store: &dyn ImpactStore,
    calculator: &ImpactCalculator,
    user_id: Uuid,
    requests: &[LineRequest],
) -> Result<StoredOrder, ApiError> {
    if requests.is_empty() {
        return Err(ImpactError::EmptyOrder.into());
    }

    if store.find_user(user_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("User {}", user_id)));
    }

    let mut ids: Vec<Uuid> = requests.iter().map(|r| r.product_id).collect();
    ids.sort_unstable();
    ids.dedup();

    let catalog: HashMap<Uuid, _> = store
        .find_products(&ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let draft = draft_order(calculator, user_id, &catalog, requests)?;
    let order = store.place_order(&draft).await?;

    tracing::info!(
        order_id = %order.id,
        user_id = %user_id,
        items = order.items.len(),
        total_cents = order.total_amount_cents,
        carbon_kg = order.sustainability_impact.total_carbon_footprint,
        "Order placed"
    );

    Ok(order)
}

/// Move an order to a new status
///
/// The stored impact summary is left untouched.
pub async fn update_status(
    store: &dyn ImpactStore,
    order_id: Uuid,
    status: OrderStatus,
) -> Result<StoredOrder, ApiError> {
    let order = store
        .update_order_status(order_id, status)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {}", order_id)))?;

    tracing::info!(order_id = %order_id, status = %status, "Order status updated");
    Ok(order)
}

/// Every order of one user, newest first
pub async fn order_history(
    store: &dyn ImpactStore,
    user_id: Uuid,
) -> Result<Vec<StoredOrder>, ApiError> {
    if store.find_user(user_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("User {}", user_id)));
    }

    Ok(store.orders_for_user(user_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::mock::MemoryStore;
    use eco_impact::{Category, Product, SustainabilityFlags};

    fn seeded_store() -> (MemoryStore, Uuid, Product) {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        store.add_user(user, "Grace");

        let product = Product {
            id: Uuid::new_v4(),
            name: "Linen Shirt".to_string(),
            category: Category::Clothing,
            sustainability: SustainabilityFlags {
                is_organic: true,
                is_recycled: true,
                ..Default::default()
            },
            price_cents: 4_500,
            stock: 3,
            sales_count: 0,
            is_active: true,
        };
        store.add_product(product.clone());
        (store, user, product)
    }

    #[tokio::test]
    async fn test_place_order_stores_impact() {
        let (store, user, product) = seeded_store();
        let requests = [LineRequest {
            product_id: product.id,
            quantity: 2,
        }];

        let order = place_order(&store, &ImpactCalculator::default(), user, &requests)
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_amount_cents, 9_000);
        assert_eq!(order.sustainability_impact.total_carbon_footprint, 15.0);
        assert_eq!(store.product(product.id).unwrap().stock, 1);
    }

    #[tokio::test]
    async fn test_overdraw_rejected_without_side_effects() {
        let (store, user, product) = seeded_store();
        let requests = [LineRequest {
            product_id: product.id,
            quantity: 4,
        }];

        let err = place_order(&store, &ImpactCalculator::default(), user, &requests)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::InsufficientStock(_)));
        assert_eq!(store.product(product.id).unwrap().stock, 3);
        assert_eq!(store.order_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let (store, _, product) = seeded_store();
        let requests = [LineRequest {
            product_id: product.id,
            quantity: 1,
        }];

        let err = place_order(&store, &ImpactCalculator::default(), Uuid::new_v4(), &requests)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_status_update_keeps_impact() {
        let (store, user, product) = seeded_store();
        let requests = [LineRequest {
            product_id: product.id,
            quantity: 1,
        }];
        let order = place_order(&store, &ImpactCalculator::default(), user, &requests)
            .await
            .unwrap();

        let delivered = update_status(&store, order.id, OrderStatus::Delivered).await.unwrap();
        assert_eq!(delivered.status, OrderStatus::Delivered);
        assert_eq!(delivered.sustainability_impact, order.sustainability_impact);

        let missing = update_status(&store, Uuid::new_v4(), OrderStatus::Shipped).await;
        assert!(matches!(missing, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_order_history_newest_first() {
        let (store, user, product) = seeded_store();
        let calculator = ImpactCalculator::default();

        let mut placed = Vec::new();
        for quantity in [1, 2] {
            let requests = [LineRequest {
                product_id: product.id,
                quantity,
            }];
            placed.push(place_order(&store, &calculator, user, &requests).await.unwrap().id);
        }

        let history = order_history(&store, user).await.unwrap();
        let ids: Vec<Uuid> = history.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![placed[1], placed[0]]);

        let stranger = order_history(&store, Uuid::new_v4()).await;
        assert!(matches!(stranger, Err(ApiError::NotFound(_))));
    }
}
