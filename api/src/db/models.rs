//! Database Models
//!
//! Row types for the catalog and order tables, and their conversion into
//! the impact engine's domain types.

use chrono::{DateTime, Utc};
use eco_impact::{
    validation, Category, ImpactTotals, ImpactVector, OrderImpactSummary, OrderLine,
    OrderStatus, Product, SustainabilityFlags, UserDisplay,
};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Catalog product row
#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,

    /// Category slug, parsed into a stable `Category` on read
    pub category: String,

    pub price_cents: i64,
    pub stock: i32,
    pub sales_count: i64,

    pub is_organic: bool,
    pub is_recycled: bool,
    pub is_biodegradable: bool,
    pub is_fair_trade: bool,
    pub is_local: bool,
    pub packaging_score: i16,

    pub is_active: bool,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        let category = Category::from_slug(&row.category);
        if category == Category::Other && row.category != Category::Other.slug() {
            tracing::debug!(
                product_id = %row.id,
                category = %row.category,
                "Unmapped category slug, using default coefficients"
            );
        }

        let packaging_score = u8::try_from(row.packaging_score)
            .ok()
            .filter(|score| validation::validate_packaging_score(*score).is_ok())
            .unwrap_or_else(|| {
                tracing::warn!(
                    product_id = %row.id,
                    packaging_score = row.packaging_score,
                    "Packaging score out of range, using default"
                );
                SustainabilityFlags::default().packaging_score
            });

        Product {
            id: row.id,
            name: row.name,
            category,
            sustainability: SustainabilityFlags {
                is_organic: row.is_organic,
                is_recycled: row.is_recycled,
                is_biodegradable: row.is_biodegradable,
                is_fair_trade: row.is_fair_trade,
                is_local: row.is_local,
                packaging_score,
            },
            price_cents: row.price_cents,
            stock: u32::try_from(row.stock).unwrap_or(0),
            sales_count: u64::try_from(row.sales_count).unwrap_or(0),
            is_active: row.is_active,
        }
    }
}

/// Order header row
#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub total_amount_cents: i64,
    pub total_carbon_footprint: f64,
    pub total_water_saved: f64,
    pub total_energy_saved: f64,
    pub trees_saved: f64,
    pub item_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderRow {
    /// Stored status; unknown values are treated as pending
    pub fn status(&self) -> OrderStatus {
        self.status.parse().unwrap_or_else(|_| {
            tracing::warn!(order_id = %self.id, status = %self.status, "Unknown order status");
            OrderStatus::Pending
        })
    }

    pub fn impact(&self) -> OrderImpactSummary {
        OrderImpactSummary {
            total_carbon_footprint: self.total_carbon_footprint,
            total_water_saved: self.total_water_saved,
            total_energy_saved: self.total_energy_saved,
            trees_saved: self.trees_saved,
        }
    }
}

/// Order line row
#[derive(Debug, Clone, FromRow)]
pub struct OrderItemRow {
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price_cents: i64,
    pub carbon_footprint: Option<f64>,
    pub water_usage: Option<f64>,
    pub energy_consumption: Option<f64>,
}

impl From<OrderItemRow> for OrderLine {
    fn from(row: OrderItemRow) -> Self {
        // Absent fields count as zero; a line with none of them has no impact data
        let impact = match (row.carbon_footprint, row.water_usage, row.energy_consumption) {
            (None, None, None) => None,
            (carbon, water, energy) => Some(ImpactVector {
                carbon_footprint: carbon.unwrap_or(0.0),
                water_usage: water.unwrap_or(0.0),
                energy_consumption: energy.unwrap_or(0.0),
            }),
        };

        OrderLine {
            product_id: row.product_id,
            quantity: u32::try_from(row.quantity).unwrap_or(0),
            unit_price_cents: row.unit_price_cents,
            impact,
        }
    }
}

/// `SUM`/`COUNT` over delivered orders
///
/// Sums are `COALESCE`d in SQL so an empty set reads as zeros.
#[derive(Debug, Clone, FromRow)]
pub struct TotalsRow {
    pub carbon: f64,
    pub water: f64,
    pub energy: f64,
    pub trees: f64,
    pub orders: i64,
    pub items: i64,
}

impl From<TotalsRow> for ImpactTotals {
    fn from(row: TotalsRow) -> Self {
        ImpactTotals {
            carbon: row.carbon,
            water: row.water,
            energy: row.energy,
            trees: row.trees,
            orders: u64::try_from(row.orders).unwrap_or(0),
            items: u64::try_from(row.items).unwrap_or(0),
        }
    }
}

/// Delivered totals grouped by owner (leaderboard input)
#[derive(Debug, Clone, FromRow)]
pub struct UserTotalsRow {
    pub user_id: Uuid,
    pub carbon: f64,
    pub water: f64,
    pub energy: f64,
    pub trees: f64,
    pub orders: i64,
    pub items: i64,
}

impl UserTotalsRow {
    pub fn into_pair(self) -> (Uuid, ImpactTotals) {
        let totals = TotalsRow {
            carbon: self.carbon,
            water: self.water,
            energy: self.energy,
            trees: self.trees,
            orders: self.orders,
            items: self.items,
        };
        (self.user_id, totals.into())
    }
}

/// User display row
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
}

impl From<UserRow> for UserDisplay {
    fn from(row: UserRow) -> Self {
        UserDisplay { name: row.name }
    }
}

/// A persisted order with its lines
#[derive(Debug, Clone, Serialize)]
pub struct StoredOrder {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub total_amount_cents: i64,
    pub sustainability_impact: OrderImpactSummary,
    pub items: Vec<OrderLine>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredOrder {
    pub fn from_rows(order: OrderRow, items: Vec<OrderItemRow>) -> Self {
        StoredOrder {
            id: order.id,
            user_id: order.user_id,
            status: order.status(),
            total_amount_cents: order.total_amount_cents,
            sustainability_impact: order.impact(),
            items: items.into_iter().map(OrderLine::from).collect(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_row(category: &str) -> ProductRow {
        ProductRow {
            id: Uuid::new_v4(),
            name: "Beeswax Wrap".to_string(),
            category: category.to_string(),
            price_cents: 1_200,
            stock: 4,
            sales_count: 9,
            is_organic: true,
            is_recycled: false,
            is_biodegradable: true,
            is_fair_trade: false,
            is_local: true,
            packaging_score: 5,
            is_active: true,
        }
    }

    #[test]
    fn test_product_row_conversion() {
        let product: Product = product_row("home").into();
        assert_eq!(product.category, Category::Home);
        assert_eq!(product.stock, 4);
        assert_eq!(product.sustainability.packaging_score, 5);
        assert!(product.sustainability.is_local);
    }

    #[test]
    fn test_unmapped_category_row() {
        let product: Product = product_row("Kitchen & Dining").into();
        assert_eq!(product.category, Category::Other);
    }

    #[test]
    fn test_out_of_range_packaging_score() {
        let row = ProductRow {
            packaging_score: 9,
            ..product_row("food")
        };
        let product: Product = row.into();
        assert_eq!(product.sustainability.packaging_score, 3);
    }

    #[test]
    fn test_partial_line_impact_fills_zero() {
        let row = OrderItemRow {
            order_id: Uuid::nil(),
            product_id: Uuid::nil(),
            quantity: 2,
            unit_price_cents: 100,
            carbon_footprint: Some(3.0),
            water_usage: None,
            energy_consumption: Some(1.0),
        };
        let line: OrderLine = row.into();
        let impact = line.impact.unwrap();
        assert_eq!(impact.carbon_footprint, 3.0);
        assert_eq!(impact.water_usage, 0.0);
        assert_eq!(line.quantity, 2);
    }

    #[test]
    fn test_grouped_totals_row() {
        let row = UserTotalsRow {
            user_id: Uuid::from_u128(7),
            carbon: 30.4496,
            water: 120.0,
            energy: 8.0,
            trees: 1.45,
            orders: 2,
            items: 5,
        };
        let (user_id, totals) = row.into_pair();
        assert_eq!(user_id, Uuid::from_u128(7));
        assert_eq!(totals.orders, 2);
        assert_eq!(totals.items, 5);

        let impact = totals.into_lifetime();
        assert_eq!(impact.total_carbon_reduced, 30.45);
        assert_eq!(impact.trees_equivalent, 1.4);
    }
}
