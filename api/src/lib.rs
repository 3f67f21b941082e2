//! Sustainable Storefront API Library
//!
//! # Overview
//!
//! HTTP backend for catalog impact, order placement and sustainability
//! reporting. The arithmetic lives in the `eco_impact` crate; this crate
//! wires it to PostgreSQL and Axum.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                         API                              │
//! │                                                          │
//! │  ┌─────────┐  ┌─────────┐  ┌─────────┐  ┌─────────┐    │
//! │  │ Routes  │  │Services │  │   DB    │  │  Types  │    │
//! │  └────┬────┘  └────┬────┘  └────┬────┘  └────┬────┘    │
//! │       │            │            │            │          │
//! │       └────────────┴────────────┴────────────┘          │
//! │                         │                                │
//! └─────────────────────────┼────────────────────────────────┘
//!                           │
//!                           ▼
//!                  ┌────────────────┐
//!                  │   eco_impact   │
//!                  └────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config`: environment configuration
//! - `error`: error type and HTTP mapping
//! - `routes`: HTTP handlers
//! - `services`: order placement and reporting
//! - `db`: PostgreSQL store
//! - `types`: shared response types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use eco_impact_api::{create_router, AppState, Config, Database};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let db = Database::connect(&config.database_url).await?;
//!     let state = AppState::new(Arc::new(db), config.load_coefficients()?, config);
//!     let app = create_router(state);
//!     // ... serve
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use axum::{
    http::{header, Method, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use eco_impact::{CoefficientTable, ImpactCalculator};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod services;
pub mod types;

// Re-exports for convenience
pub use config::Config;
pub use db::{Database, ImpactStore};
pub use error::ApiError;

use types::ApiResponse;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ImpactStore>,
    pub calculator: Arc<ImpactCalculator>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn ImpactStore>, table: CoefficientTable, config: Config) -> Self {
        Self {
            store,
            calculator: Arc::new(ImpactCalculator::new(table)),
            config: Arc::new(config),
        }
    }
}

/// Build the router
///
/// # Route Structure
///
/// ```text
/// GET  /health                                 - server status
///
/// GET  /api/products                           - browse (filters, sort, pages)
/// GET  /api/products/recommendations           - sustainable picks
/// GET  /api/products/:id/impact                - impact for a quantity
///
/// POST /api/orders                             - place an order
/// GET  /api/orders?status=&page=&limit=        - admin listing
/// GET  /api/orders/myorders?user_id=           - one user's history
/// GET  /api/orders/:id                         - order with impact summary
/// PUT  /api/orders/:id/status                  - status change
///
/// GET  /api/sustainability/impact/:user_id     - lifetime impact
/// GET  /api/sustainability/leaderboard         - top users
/// GET  /api/sustainability/stats               - platform totals
/// ```
pub fn create_router(state: AppState) -> Router {
    let cors = if state.config.is_production() {
        let origins: Vec<_> = state
            .config
            .allowed_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::PUT])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        // Health check
        .route("/health", get(routes::health::health_check))

        // Catalog
        .route("/api/products", get(routes::products::list_products))
        .route("/api/products/recommendations", get(routes::products::get_recommendations))
        .route("/api/products/:id/impact", get(routes::products::get_product_impact))

        // Orders
        .route("/api/orders", post(routes::orders::create_order).get(routes::orders::list_orders))
        .route("/api/orders/myorders", get(routes::orders::get_my_orders))
        .route("/api/orders/:id", get(routes::orders::get_order))
        .route("/api/orders/:id/status", put(routes::orders::update_order_status))

        // Sustainability reporting
        .route("/api/sustainability/impact/:user_id", get(routes::sustainability::get_user_impact))
        .route("/api/sustainability/leaderboard", get(routes::sustainability::get_leaderboard))
        .route("/api/sustainability/stats", get(routes::sustainability::get_platform_stats))

        .fallback(not_found)

        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)

        .with_state(state)
}

async fn not_found() -> (StatusCode, Json<ApiResponse<()>>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::error("Route not found".to_string())),
    )
}
