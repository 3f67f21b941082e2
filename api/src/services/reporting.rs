//! Impact reporting
//!
//! Lifetime impact, leaderboard and platform stats. The store sums delivered
//! orders (in SQL for Postgres) into `ImpactTotals`; rounding and ranking
//! happen here through the engine, so the three reports always agree. No
//! totals are cached.

use eco_impact::{
    attach_display, rank_totals, CatalogStats, LeaderboardEntry, UserLifetimeImpact,
};
use serde::Serialize;
use uuid::Uuid;

use crate::db::ImpactStore;
use crate::error::ApiError;

/// Platform-wide sustainability figures
#[derive(Debug, Clone, Serialize)]
pub struct PlatformStats {
    pub total_orders: u64,
    pub total_users: u64,
    pub total_products: u64,
    pub total_carbon_reduced: f64,
    pub total_water_saved: f64,
    pub total_energy_saved: f64,
    pub avg_packaging_score: f64,
    pub organic_products: u64,
    pub recycled_products: u64,
    pub fair_trade_products: u64,
}

/// Lifetime impact of one user, recomputed from their delivered orders
pub async fn user_impact(
    store: &dyn ImpactStore,
    user_id: Uuid,
) -> Result<UserLifetimeImpact, ApiError> {
    let totals = store.delivered_totals_for_user(user_id).await?;
    Ok(totals.into_lifetime())
}

/// Top users by carbon reduced, with display names attached
pub async fn leaderboard(
    store: &dyn ImpactStore,
    size: usize,
) -> Result<Vec<LeaderboardEntry>, ApiError> {
    let totals = store.delivered_totals_by_user().await?;
    let mut entries = rank_totals(totals, size);

    let ids: Vec<Uuid> = entries.iter().map(|e| e.user_id).collect();
    let users = store.find_users(&ids).await?;
    attach_display(&mut entries, |id| users.get(id).cloned());

    Ok(entries)
}

/// Delivered-order totals plus the active catalog breakdown
pub async fn platform_stats(store: &dyn ImpactStore) -> Result<PlatformStats, ApiError> {
    let impact = store.delivered_totals().await?.into_lifetime();

    let products = store.active_products().await?;
    let catalog = CatalogStats::from_products(&products);
    let total_users = store.count_active_users().await?;

    Ok(PlatformStats {
        total_orders: impact.total_orders,
        total_users,
        total_products: catalog.total_products,
        total_carbon_reduced: impact.total_carbon_reduced,
        total_water_saved: impact.total_water_saved,
        total_energy_saved: impact.total_energy_saved,
        avg_packaging_score: catalog.avg_packaging_score,
        organic_products: catalog.organic_products,
        recycled_products: catalog.recycled_products,
        fair_trade_products: catalog.fair_trade_products,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::mock::MemoryStore;
    use crate::services::orders::{place_order, update_status};
    use eco_impact::{Category, ImpactCalculator, LineRequest, OrderStatus, Product, SustainabilityFlags};

    struct Fixture {
        store: MemoryStore,
        product: Product,
    }

    impl Fixture {
        fn new() -> Self {
            let store = MemoryStore::new();
            let product = Product {
                id: Uuid::new_v4(),
                name: "Bamboo Cutlery".to_string(),
                category: Category::Home,
                sustainability: SustainabilityFlags {
                    is_recycled: true,
                    packaging_score: 4,
                    ..Default::default()
                },
                price_cents: 1_500,
                stock: 100,
                sales_count: 0,
                is_active: true,
            };
            store.add_product(product.clone());
            Self { store, product }
        }

        fn user(&self, name: &str) -> Uuid {
            let id = Uuid::new_v4();
            self.store.add_user(id, name);
            id
        }

        async fn order(&self, user: Uuid, quantity: u32, status: OrderStatus) {
            let requests = [LineRequest {
                product_id: self.product.id,
                quantity,
            }];
            let order = place_order(&self.store, &ImpactCalculator::default(), user, &requests)
                .await
                .unwrap();
            update_status(&self.store, order.id, status).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_user_without_deliveries() {
        let fx = Fixture::new();
        let user = fx.user("Nobody");
        fx.order(user, 1, OrderStatus::Shipped).await;

        let impact = user_impact(&fx.store, user).await.unwrap();
        assert_eq!(impact, UserLifetimeImpact::default());
    }

    #[tokio::test]
    async fn test_leaderboard_matches_user_impact() {
        let fx = Fixture::new();
        let ada = fx.user("Ada");
        let bob = fx.user("Bob");
        // home + recycled: 10 * 0.7 = 7 kg per unit
        fx.order(ada, 1, OrderStatus::Delivered).await;
        fx.order(bob, 2, OrderStatus::Delivered).await;
        fx.order(bob, 5, OrderStatus::Cancelled).await;

        let board = leaderboard(&fx.store, 10).await.unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].user_id, bob);
        assert_eq!(board[0].user.as_ref().unwrap().name, "Bob");
        assert_eq!(board[0].total_carbon_reduced, 14.0);

        for entry in &board {
            let own = user_impact(&fx.store, entry.user_id).await.unwrap();
            assert_eq!(entry.total_carbon_reduced, own.total_carbon_reduced);
        }
    }

    #[tokio::test]
    async fn test_platform_stats() {
        let fx = Fixture::new();
        let ada = fx.user("Ada");
        fx.order(ada, 3, OrderStatus::Delivered).await;
        fx.order(ada, 1, OrderStatus::Pending).await;

        let stats = platform_stats(&fx.store).await.unwrap();
        assert_eq!(stats.total_orders, 1);
        assert_eq!(stats.total_users, 1);
        assert_eq!(stats.total_products, 1);
        assert_eq!(stats.total_carbon_reduced, 21.0);
        assert_eq!(stats.avg_packaging_score, 4.0);
        assert_eq!(stats.recycled_products, 1);
    }
}
