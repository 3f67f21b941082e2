//! Product Endpoints
//!
//! Catalog browsing, per-product impact for a requested quantity, and the
//! sustainable picks shown on the storefront.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use eco_impact::{
    recommend, validation, Category, ImpactVector, Page, PageRequest, Product, ProductFilter,
    ProductSort, SustainabilityFlags, DEFAULT_PRODUCT_PAGE_SIZE, DEFAULT_RECOMMENDATION_LIMIT,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::ApiError,
    types::{format_cents, ApiResponse},
    AppState,
};

/// Upper bound on `limit` for recommendations
const MAX_RECOMMENDATION_LIMIT: usize = 50;

// ============ Request/Response Types ============

/// Catalog query. Flags left out (or `false`) do not filter.
#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    /// Category slug; `all` or blank lists every category
    pub category: Option<String>,
    pub organic: Option<bool>,
    pub recycled: Option<bool>,
    #[serde(alias = "fairTrade")]
    pub fair_trade: Option<bool>,
    pub local: Option<bool>,
    pub biodegradable: Option<bool>,
    #[serde(alias = "minPriceCents")]
    pub min_price_cents: Option<i64>,
    #[serde(alias = "maxPriceCents")]
    pub max_price_cents: Option<i64>,
    pub search: Option<String>,
    /// newest | price-low | price-high | sustainability | popular
    #[serde(alias = "sortBy")]
    pub sort_by: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ProductListQuery {
    fn filter(&self) -> Result<ProductFilter, ApiError> {
        let category = match self.category.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) if raw.eq_ignore_ascii_case("all") => None,
            Some(raw) => {
                let category = Category::from_slug(raw);
                if category == Category::Other && !raw.eq_ignore_ascii_case(Category::Other.slug()) {
                    return Err(ApiError::BadRequest(format!("Unknown category '{}'", raw)));
                }
                Some(category)
            }
        };

        let filter = ProductFilter {
            category,
            organic: self.organic.unwrap_or(false),
            recycled: self.recycled.unwrap_or(false),
            fair_trade: self.fair_trade.unwrap_or(false),
            local: self.local.unwrap_or(false),
            biodegradable: self.biodegradable.unwrap_or(false),
            min_price_cents: self.min_price_cents,
            max_price_cents: self.max_price_cents,
            search: self.search.clone(),
        };
        filter.validate()?;
        Ok(filter)
    }
}

#[derive(Debug, Deserialize)]
pub struct ImpactQuery {
    /// Units to evaluate (default 1)
    pub quantity: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ProductImpactResponse {
    pub product_id: Uuid,
    pub name: String,
    pub category: Category,
    pub quantity: u32,
    pub impact: ImpactVector,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ProductSummary {
    pub id: Uuid,
    pub name: String,
    pub category: Category,
    pub price: String,
    pub sustainability: SustainabilityFlags,
    pub sales_count: u64,
}

impl From<Product> for ProductSummary {
    fn from(product: Product) -> Self {
        ProductSummary {
            id: product.id,
            name: product.name,
            category: product.category,
            price: format_cents(product.price_cents),
            sustainability: product.sustainability,
            sales_count: product.sales_count,
        }
    }
}

// ============ Handlers ============

/// GET /api/products
///
/// Active products only, filtered by category, sustainability flags, price
/// range (cents) and a name search, then sorted and paged.
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "items": [{ "id": "…", "name": "Organic Tee", "price": "$20.00", … }],
///     "total": 14,
///     "total_pages": 2,
///     "current_page": 1
///   }
/// }
/// ```
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<ApiResponse<Page<ProductSummary>>>, ApiError> {
    let filter = query.filter()?;
    let sort = query
        .sort_by
        .as_deref()
        .map(ProductSort::from_param)
        .unwrap_or_default();
    let page = PageRequest::new(query.page, query.limit, DEFAULT_PRODUCT_PAGE_SIZE)?;

    let products = state.store.search_products(&filter, sort, page).await?;

    Ok(Json(ApiResponse::success(products.map(ProductSummary::from))))
}

/// GET /api/products/:id/impact?quantity=
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "product_id": "…",
///     "name": "Organic Tee",
///     "category": "clothing",
///     "quantity": 2,
///     "impact": { "carbon_footprint": 15.0, "water_usage": 4500.0, "energy_consumption": 75.0 }
///   }
/// }
/// ```
pub async fn get_product_impact(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ImpactQuery>,
) -> Result<Json<ApiResponse<ProductImpactResponse>>, ApiError> {
    let quantity = query.quantity.unwrap_or(1);
    validation::validate_quantity(quantity)?;

    let product = state
        .store
        .find_product(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product {}", id)))?;

    let impact = state.calculator.compute_product_impact(&product, quantity);

    Ok(Json(ApiResponse::success(ProductImpactResponse {
        product_id: product.id,
        name: product.name,
        category: product.category,
        quantity,
        impact,
    })))
}

/// GET /api/products/recommendations?limit=
pub async fn get_recommendations(
    State(state): State<AppState>,
    Query(query): Query<RecommendationQuery>,
) -> Result<Json<ApiResponse<Vec<ProductSummary>>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_RECOMMENDATION_LIMIT);
    if limit == 0 || limit > MAX_RECOMMENDATION_LIMIT {
        return Err(ApiError::BadRequest(format!(
            "limit must be between 1 and {}",
            MAX_RECOMMENDATION_LIMIT
        )));
    }

    let products = state.store.active_products().await?;
    let picks = recommend(products, limit)
        .into_iter()
        .map(ProductSummary::from)
        .collect();

    Ok(Json(ApiResponse::success(picks)))
}
