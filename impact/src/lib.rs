//! Environmental impact engine for a sustainable storefront
//!
//! Pure, synchronous computation. No I/O happens in this crate; the API
//! service feeds it catalog snapshots and stored orders.
//!
//! # Components
//! - `coefficients`: per-category base rates, keyed by [`Category`]
//! - `product`: [`ImpactCalculator`] turning a product + quantity into an [`ImpactVector`]
//! - `order`: [`aggregate_order_impact`] for the summary stored on each order
//! - `lifetime`: [`aggregate_user_lifetime_impact`] over delivered orders
//! - `leaderboard`: [`rank_leaderboard`] / [`rank_totals`] sharing the lifetime accumulator
//! - `stock` / `checkout`: all-or-nothing stock planning and order drafting
//! - `stats`: catalog breakdown and recommendations
//! - `catalog`: product filters, sort orders and pagination
//!
//! # Example
//! ```
//! use eco_impact::{Category, ImpactCalculator, SustainabilityFlags};
//!
//! let calculator = ImpactCalculator::default();
//! let flags = SustainabilityFlags { is_organic: true, is_recycled: true, ..Default::default() };
//! let impact = calculator.compute(Category::Clothing, &flags, 2);
//!
//! assert!((impact.carbon_footprint - 15.0).abs() < 1e-9);
//! ```

pub mod catalog;
pub mod checkout;
pub mod coefficients;
pub mod error;
pub mod leaderboard;
pub mod lifetime;
pub mod order;
pub mod product;
pub mod stats;
pub mod stock;


pub use catalog::{
    Page, PageRequest, ProductFilter, ProductSort, DEFAULT_ORDER_PAGE_SIZE,
    DEFAULT_PRODUCT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use checkout::{draft_order, OrderDraft};
pub use coefficients::{Category, CoefficientTable, ImpactRates};
pub use error::{validation, ImpactError, ImpactResult};
pub use leaderboard::{
    attach_display, rank_leaderboard, rank_totals, LeaderboardEntry, UserDisplay, DEFAULT_LEADERBOARD_SIZE,
};
pub use lifetime::{aggregate_user_lifetime_impact, ImpactTotals, OrderSnapshot, UserLifetimeImpact};
pub use order::{aggregate_order_impact, OrderImpactSummary, OrderLine, OrderStatus};
pub use product::{ImpactCalculator, ImpactVector, Product, SustainabilityFlags};
pub use stats::{recommend, CatalogStats, DEFAULT_RECOMMENDATION_LIMIT};
pub use stock::{plan_reservations, LineRequest, Reservation};
