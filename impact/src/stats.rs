//! Catalog statistics and sustainable recommendations

use serde::{Deserialize, Serialize};

use crate::order::round_to;
use crate::product::Product;

/// Default number of recommended products
pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 6;

/// Sustainability breakdown of the active catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogStats {
    pub total_products: u64,
    /// Mean packaging score, one decimal; 0 for an empty catalog
    pub avg_packaging_score: f64,
    pub organic_products: u64,
    pub recycled_products: u64,
    pub fair_trade_products: u64,
}

impl CatalogStats {
    /// Summarise active products; inactive ones are skipped
    pub fn from_products<'a, I>(products: I) -> Self
    where
        I: IntoIterator<Item = &'a Product>,
    {
        let mut stats = CatalogStats::default();
        let mut packaging_sum = 0u64;

        for product in products.into_iter().filter(|p| p.is_active) {
            let flags = &product.sustainability;
            stats.total_products += 1;
            packaging_sum += u64::from(flags.packaging_score);
            stats.organic_products += u64::from(flags.is_organic);
            stats.recycled_products += u64::from(flags.is_recycled);
            stats.fair_trade_products += u64::from(flags.is_fair_trade);
        }

        if stats.total_products > 0 {
            stats.avg_packaging_score =
                round_to(packaging_sum as f64 / stats.total_products as f64, 1);
        }

        stats
    }
}

/// Pick the most sustainable active products
///
/// Qualifying products have packaging score ≥ 4 or an organic, recycled or
/// fair-trade flag. Sorted by packaging score, then sales, both descending.
pub fn recommend(products: Vec<Product>, limit: usize) -> Vec<Product> {
    let mut picks: Vec<Product> = products
        .into_iter()
        .filter(|p| p.is_active && p.sustainability.is_recommendable())
        .collect();

    picks.sort_by(|a, b| {
        b.sustainability
            .packaging_score
            .cmp(&a.sustainability.packaging_score)
            .then(b.sales_count.cmp(&a.sales_count))
    });
    picks.truncate(limit);
    picks
}
