//! API Routes Module
//!
//! # Routes
//! - `/health`: health check
//! - `/api/products/*`: product impact and recommendations
//! - `/api/orders/*`: order placement and status
//! - `/api/sustainability/*`: lifetime impact, leaderboard, platform stats

pub mod health;
pub mod orders;
pub mod products;
pub mod sustainability;
