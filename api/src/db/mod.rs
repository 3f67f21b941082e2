//! Database Module
//!
//! PostgreSQL through SQLx. `Database` owns the connection pool and
//! implements [`ImpactStore`].
//!
//! Order placement runs in a single transaction: every reservation is
//! applied with a conditional decrement (`stock >= quantity`), then the
//! order and its lines are inserted. If any decrement matches no row the
//! transaction is rolled back, so a failed order never leaves stock
//! partially taken. Rows are updated in ascending product id order, which
//! keeps lock acquisition consistent between concurrent orders.

mod models;
mod repository;

pub use models::*;
pub use repository::{check_reservation, ImpactStore, StockState};

#[cfg(test)]
pub use repository::mock;

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use eco_impact::{
    Category, ImpactTotals, OrderDraft, OrderStatus, Page, PageRequest, Product, ProductFilter,
    ProductSort, UserDisplay,
};
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

const PRODUCT_COLUMNS: &str = r#"
    id, name, category, price_cents, stock, sales_count,
    is_organic, is_recycled, is_biodegradable, is_fair_trade, is_local,
    packaging_score, is_active
"#;

const ORDER_COLUMNS: &str = r#"
    id, user_id, status, total_amount_cents,
    total_carbon_footprint, total_water_saved, total_energy_saved, trees_saved,
    item_count, created_at, updated_at
"#;

/// Delivered-order aggregates, read into [`TotalsRow`] / [`UserTotalsRow`]
const TOTALS_COLUMNS: &str = r#"
    COALESCE(SUM(total_carbon_footprint), 0) AS carbon,
    COALESCE(SUM(total_water_saved), 0) AS water,
    COALESCE(SUM(total_energy_saved), 0) AS energy,
    COALESCE(SUM(trees_saved), 0) AS trees,
    COUNT(*) AS orders,
    COALESCE(SUM(item_count), 0) AS items
"#;

/// Connection pool and queries
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to the database
    ///
    /// # Connection Pool Settings
    ///
    /// - max_connections: 10
    /// - min_connections: 1
    /// - acquire_timeout: 3s
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .min_connections(1)
            .acquire_timeout(std::time::Duration::from_secs(3))
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Run embedded migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await?;
        Ok(())
    }

    /// Load the lines of every given order in one query
    async fn with_items(&self, orders: Vec<OrderRow>) -> Result<Vec<StoredOrder>> {
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let rows = sqlx::query_as::<_, OrderItemRow>(
            r#"
            SELECT order_id, product_id, quantity, unit_price_cents,
                   carbon_footprint, water_usage, energy_consumption
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, line_no
            "#,
        )
        .bind(&ids[..])
        .fetch_all(&self.pool)
        .await?;

        let mut by_order: HashMap<Uuid, Vec<OrderItemRow>> = HashMap::new();
        for row in rows {
            by_order.entry(row.order_id).or_default().push(row);
        }

        Ok(orders
            .into_iter()
            .map(|order| {
                let items = by_order.remove(&order.id).unwrap_or_default();
                StoredOrder::from_rows(order, items)
            })
            .collect())
    }

    /// Take stock for one reservation inside the order transaction
    async fn reserve(
        tx: &mut Transaction<'_, Postgres>,
        product_id: Uuid,
        requested: u32,
    ) -> Result<()> {
        let quantity = i32::try_from(requested)?;

        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - $1,
                sales_count = sales_count + $1,
                updated_at = NOW()
            WHERE id = $2 AND is_active AND stock >= $1
            "#,
        )
        .bind(quantity)
        .bind(product_id)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        // Lost a race with another order, or the product changed since drafting
        let current: Option<(String, i32, bool)> =
            sqlx::query_as("SELECT name, stock, is_active FROM products WHERE id = $1")
                .bind(product_id)
                .fetch_optional(&mut **tx)
                .await?;

        let state = current.as_ref().map(|(name, stock, is_active)| StockState {
            name,
            stock: u32::try_from(*stock).unwrap_or(0),
            is_active: *is_active,
        });
        check_reservation(product_id, requested, state)?;

        // The row changed again between the update and the read
        anyhow::bail!(
            "reservation for product {} conflicted with a concurrent update",
            product_id
        )
    }
}

/// Append the `WHERE` clause for a catalog filter
fn push_product_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    query.push(" WHERE is_active");

    match filter.category {
        // Unmapped slugs read back as Other, so match them here too
        Some(Category::Other) => {
            let mapped: Vec<String> = Category::ALL
                .iter()
                .filter(|c| **c != Category::Other)
                .map(|c| c.slug().to_string())
                .collect();
            query
                .push(" AND LOWER(TRIM(category)) <> ALL(")
                .push_bind(mapped)
                .push(")");
        }
        Some(category) => {
            query
                .push(" AND LOWER(TRIM(category)) = ")
                .push_bind(category.slug());
        }
        None => {}
    }

    let flags = [
        (filter.organic, "is_organic"),
        (filter.recycled, "is_recycled"),
        (filter.fair_trade, "is_fair_trade"),
        (filter.local, "is_local"),
        (filter.biodegradable, "is_biodegradable"),
    ];
    for (required, column) in flags {
        if required {
            query.push(" AND ").push(column);
        }
    }

    if let Some(min) = filter.min_price_cents {
        query.push(" AND price_cents >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price_cents {
        query.push(" AND price_cents <= ").push_bind(max);
    }

    if let Some(term) = filter.search_term() {
        let escaped = term
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        query
            .push(" AND name ILIKE ")
            .push_bind(format!("%{}%", escaped));
    }
}

fn product_order(sort: ProductSort) -> &'static str {
    match sort {
        ProductSort::Newest => "created_at DESC, id",
        ProductSort::PriceLow => "price_cents ASC, created_at DESC, id",
        ProductSort::PriceHigh => "price_cents DESC, created_at DESC, id",
        ProductSort::Sustainability => "packaging_score DESC, created_at DESC, id",
        ProductSort::Popular => "sales_count DESC, created_at DESC, id",
    }
}

fn push_page(query: &mut QueryBuilder<'_, Postgres>, page: PageRequest) -> Result<()> {
    query
        .push(" LIMIT ")
        .push_bind(i64::from(page.limit))
        .push(" OFFSET ")
        .push_bind(i64::try_from(page.offset())?);
    Ok(())
}

#[async_trait]
impl ImpactStore for Database {
    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products WHERE id = $1",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    async fn find_products(&self, ids: &[Uuid]) -> Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products WHERE id = ANY($1)",
            PRODUCT_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn active_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products WHERE is_active",
            PRODUCT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn search_products(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        page: PageRequest,
    ) -> Result<Page<Product>> {
        let mut query = QueryBuilder::new(format!("SELECT {} FROM products", PRODUCT_COLUMNS));
        push_product_filter(&mut query, filter);
        query.push(" ORDER BY ").push(product_order(sort));
        push_page(&mut query, page)?;

        let rows = query
            .build_query_as::<ProductRow>()
            .fetch_all(&self.pool)
            .await?;

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM products");
        push_product_filter(&mut count, filter);
        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;

        let products = rows.into_iter().map(Product::from).collect();
        Ok(Page::new(products, u64::try_from(total)?, page))
    }

    async fn place_order(&self, draft: &OrderDraft) -> Result<StoredOrder> {
        let mut tx = self.pool.begin().await?;

        for reservation in &draft.reservations {
            if let Err(err) = Self::reserve(&mut tx, reservation.product_id, reservation.quantity).await {
                tx.rollback().await?;
                return Err(err);
            }
        }

        let order_id = Uuid::new_v4();
        let order = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            INSERT INTO orders (
                id, user_id, status, total_amount_cents,
                total_carbon_footprint, total_water_saved, total_energy_saved, trees_saved,
                item_count, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW(), NOW())
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(order_id)
        .bind(draft.user_id)
        .bind(OrderStatus::Pending.as_str())
        .bind(draft.total_amount_cents)
        .bind(draft.impact.total_carbon_footprint)
        .bind(draft.impact.total_water_saved)
        .bind(draft.impact.total_energy_saved)
        .bind(draft.impact.trees_saved)
        .bind(i32::try_from(draft.item_count())?)
        .fetch_one(&mut *tx)
        .await?;

        for (line_no, line) in draft.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    order_id, line_no, product_id, quantity, unit_price_cents,
                    carbon_footprint, water_usage, energy_consumption
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(order_id)
            .bind(i32::try_from(line_no)?)
            .bind(line.product_id)
            .bind(i32::try_from(line.quantity)?)
            .bind(line.unit_price_cents)
            .bind(line.impact.map(|i| i.carbon_footprint))
            .bind(line.impact.map(|i| i.water_usage))
            .bind(line.impact.map(|i| i.energy_consumption))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(StoredOrder {
            id: order.id,
            user_id: order.user_id,
            status: order.status(),
            total_amount_cents: order.total_amount_cents,
            sustainability_impact: order.impact(),
            items: draft.lines.clone(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        })
    }

    async fn find_order(&self, id: Uuid) -> Result<Option<StoredOrder>> {
        let order = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE id = $1",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match order {
            Some(order) => Ok(self.with_items(vec![order]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn orders_for_user(&self, user_id: Uuid) -> Result<Vec<StoredOrder>> {
        let orders = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id",
            ORDER_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        self.with_items(orders).await
    }

    async fn list_orders(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Page<StoredOrder>> {
        let mut query = QueryBuilder::new(format!("SELECT {} FROM orders", ORDER_COLUMNS));
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM orders");
        if let Some(status) = status {
            query.push(" WHERE status = ").push_bind(status.as_str());
            count.push(" WHERE status = ").push_bind(status.as_str());
        }
        query.push(" ORDER BY created_at DESC, id");
        push_page(&mut query, page)?;

        let orders = query
            .build_query_as::<OrderRow>()
            .fetch_all(&self.pool)
            .await?;
        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;

        let orders = self.with_items(orders).await?;
        Ok(Page::new(orders, u64::try_from(total)?, page))
    }

    async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> Result<Option<StoredOrder>> {
        // Only the status moves; the stored impact summary is never recomputed
        let order = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            UPDATE orders
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match order {
            Some(order) => Ok(self.with_items(vec![order]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<UserDisplay>> {
        let user = sqlx::query_as::<_, UserRow>("SELECT id, name FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user.map(UserDisplay::from))
    }

    async fn find_users(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, UserDisplay>> {
        let users = sqlx::query_as::<_, UserRow>("SELECT id, name FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(users
            .into_iter()
            .map(|row| (row.id, UserDisplay::from(row)))
            .collect())
    }

    async fn count_active_users(&self) -> Result<u64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE is_active")
            .fetch_one(&self.pool)
            .await?;

        Ok(u64::try_from(count.0).unwrap_or(0))
    }

    async fn delivered_totals_for_user(&self, user_id: Uuid) -> Result<ImpactTotals> {
        let row = sqlx::query_as::<_, TotalsRow>(&format!(
            "SELECT {} FROM orders WHERE user_id = $1 AND status = $2",
            TOTALS_COLUMNS
        ))
        .bind(user_id)
        .bind(OrderStatus::Delivered.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn delivered_totals_by_user(&self) -> Result<Vec<(Uuid, ImpactTotals)>> {
        let rows = sqlx::query_as::<_, UserTotalsRow>(&format!(
            r#"
            SELECT user_id, {}
            FROM orders
            WHERE status = $1
            GROUP BY user_id
            "#,
            TOTALS_COLUMNS
        ))
        .bind(OrderStatus::Delivered.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(UserTotalsRow::into_pair).collect())
    }

    async fn delivered_totals(&self) -> Result<ImpactTotals> {
        let row = sqlx::query_as::<_, TotalsRow>(&format!(
            "SELECT {} FROM orders WHERE status = $1",
            TOTALS_COLUMNS
        ))
        .bind(OrderStatus::Delivered.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }
}
