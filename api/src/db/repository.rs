//! Store abstraction
//!
//! Route handlers and services talk to [`ImpactStore`] rather than to
//! Postgres directly. `Database` is the production implementation; tests use
//! the in-memory [`mock::MemoryStore`].
//!
//! Errors are `anyhow` like the rest of the data layer. Rejections that the
//! client should see (stock lost to a concurrent order, a product withdrawn
//! mid-checkout) are raised as [`eco_impact::ImpactError`] inside the anyhow
//! error so the API layer can recover them.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use eco_impact::{
    ImpactError, ImpactTotals, OrderDraft, OrderStatus, Page, PageRequest, Product, ProductFilter,
    ProductSort, UserDisplay,
};
use uuid::Uuid;

use super::models::StoredOrder;

#[async_trait]
pub trait ImpactStore: Send + Sync {
    /// Cheap round trip to the backing store
    async fn health_check(&self) -> Result<()>;

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>>;

    /// Products for the given ids; unknown ids are simply absent
    async fn find_products(&self, ids: &[Uuid]) -> Result<Vec<Product>>;

    async fn active_products(&self) -> Result<Vec<Product>>;

    /// One page of active products matching `filter`
    async fn search_products(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        page: PageRequest,
    ) -> Result<Page<Product>>;

    /// Apply every reservation and insert the order, all or nothing
    async fn place_order(&self, draft: &OrderDraft) -> Result<StoredOrder>;

    async fn find_order(&self, id: Uuid) -> Result<Option<StoredOrder>>;

    /// Every order of one user, newest first
    async fn orders_for_user(&self, user_id: Uuid) -> Result<Vec<StoredOrder>>;

    /// One page of all orders, newest first, optionally by status
    async fn list_orders(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Page<StoredOrder>>;

    async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> Result<Option<StoredOrder>>;

    async fn find_user(&self, id: Uuid) -> Result<Option<UserDisplay>>;

    async fn find_users(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, UserDisplay>>;

    async fn count_active_users(&self) -> Result<u64>;

    /// Summed delivered orders of one user
    async fn delivered_totals_for_user(&self, user_id: Uuid) -> Result<ImpactTotals>;

    /// Summed delivered orders, one row per user who has any
    async fn delivered_totals_by_user(&self) -> Result<Vec<(Uuid, ImpactTotals)>>;

    /// Summed delivered orders across the platform
    async fn delivered_totals(&self) -> Result<ImpactTotals>;
}

/// Product state read while applying a reservation
#[derive(Debug, Clone, Copy)]
pub struct StockState<'a> {
    pub name: &'a str,
    pub stock: u32,
    pub is_active: bool,
}

/// Check one reservation against the product as it is now
///
/// Both stores apply this rule at commit time, after the draft was planned
/// against an earlier read of the catalog.
pub fn check_reservation(
    product_id: Uuid,
    requested: u32,
    current: Option<StockState<'_>>,
) -> Result<(), ImpactError> {
    let Some(current) = current else {
        return Err(ImpactError::ProductNotFound { product_id });
    };

    if !current.is_active {
        return Err(ImpactError::ProductInactive {
            product_id,
            name: current.name.to_string(),
        });
    }

    if current.stock < requested {
        return Err(ImpactError::InsufficientStock {
            product_id,
            name: current.name.to_string(),
            requested,
            available: current.stock,
        });
    }

    Ok(())
}
