//! Order Endpoints
//!
//! Placement computes every line's impact and the order summary once, at
//! creation. Status changes never touch the stored impact. Listings return
//! stored orders as they are, newest first.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use eco_impact::{LineRequest, OrderStatus, Page, PageRequest, DEFAULT_ORDER_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::StoredOrder,
    error::ApiError,
    services::orders,
    types::{format_cents, ApiResponse},
    AppState,
};

// ============ Request/Response Types ============

/// Order creation request
///
/// Authentication is handled upstream; the caller names the user.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub user_id: Uuid,
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    /// pending | processing | shipped | delivered | cancelled
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct MyOrdersQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    /// A status name, or `all` / absent for every order
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListOrdersQuery {
    fn status(&self) -> Result<Option<OrderStatus>, ApiError> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) if raw.eq_ignore_ascii_case("all") => Ok(None),
            Some(raw) => Ok(Some(raw.parse()?)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MyOrdersResponse {
    pub count: usize,
    pub orders: Vec<OrderResponse>,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    #[serde(flatten)]
    pub order: StoredOrder,
    /// Human readable total, e.g. "$42.50"
    pub total: String,
}

impl From<StoredOrder> for OrderResponse {
    fn from(order: StoredOrder) -> Self {
        let total = format_cents(order.total_amount_cents);
        OrderResponse { order, total }
    }
}

// ============ Handlers ============

/// POST /api/orders
///
/// # Request
///
/// ```json
/// {
///   "user_id": "…",
///   "items": [{ "product_id": "…", "quantity": 2 }]
/// }
/// ```
///
/// Responds 201 with the stored order, including per-line impact and the
/// order's `sustainability_impact`. Any failing line rejects the whole order
/// and no stock is touched.
pub async fn create_order(
    State(state): State<AppState>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderResponse>>), ApiError> {
    let requests: Vec<LineRequest> = req
        .items
        .iter()
        .map(|item| LineRequest {
            product_id: item.product_id,
            quantity: item.quantity,
        })
        .collect();

    let order =
        orders::place_order(state.store.as_ref(), &state.calculator, req.user_id, &requests).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(order.into()))))
}

/// GET /api/orders?status=&page=&limit=
///
/// Admin listing of every order, newest first. `total` and `total_pages`
/// describe the whole filtered set.
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<ApiResponse<Page<OrderResponse>>>, ApiError> {
    let status = query.status()?;
    let page = PageRequest::new(query.page, query.limit, DEFAULT_ORDER_PAGE_SIZE)?;

    let orders = state.store.list_orders(status, page).await?;

    Ok(Json(ApiResponse::success(orders.map(OrderResponse::from))))
}

/// GET /api/orders/myorders?user_id=
///
/// Order history of one user, newest first.
pub async fn get_my_orders(
    State(state): State<AppState>,
    Query(query): Query<MyOrdersQuery>,
) -> Result<Json<ApiResponse<MyOrdersResponse>>, ApiError> {
    let orders: Vec<OrderResponse> = orders::order_history(state.store.as_ref(), query.user_id)
        .await?
        .into_iter()
        .map(OrderResponse::from)
        .collect();

    Ok(Json(ApiResponse::success(MyOrdersResponse {
        count: orders.len(),
        orders,
    })))
}

/// GET /api/orders/:id
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrderResponse>>, ApiError> {
    let order = state
        .store
        .find_order(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {}", id)))?;

    Ok(Json(ApiResponse::success(order.into())))
}

/// PUT /api/orders/:id/status
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<OrderResponse>>, ApiError> {
    let status: OrderStatus = req.status.parse()?;
    let order = orders::update_status(state.store.as_ref(), id, status).await?;

    Ok(Json(ApiResponse::success(order.into())))
}
