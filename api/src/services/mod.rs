//! Services Module
//!
//! Business logic between the routes and the store
//!
//! # Services
//! - `orders`: order placement and status changes
//! - `reporting`: lifetime impact, leaderboard, platform stats

pub mod orders;
pub mod reporting;

pub use reporting::PlatformStats;
