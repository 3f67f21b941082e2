//! User Lifetime Aggregator
//!
//! Recomputes a user's cumulative impact from every delivered order on each
//! request. There is no cached or incremental path.
//!
//! [`ImpactTotals`] is the single accumulator behind both the per-user view
//! and the [leaderboard](crate::leaderboard), so the two figures cannot drift.

use serde::{Deserialize, Serialize};

use crate::order::{
    round_to, OrderImpactSummary, OrderStatus, TOTAL_PRECISION, TREES_PRECISION,
    TREE_CO2_KG_PER_YEAR,
};

/// The part of a stored order the aggregators read
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub status: OrderStatus,
    pub impact: OrderImpactSummary,
    /// Number of line items on the order
    pub item_count: u32,
}

/// Lifetime impact of one user
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UserLifetimeImpact {
    pub total_carbon_reduced: f64,
    pub total_water_saved: f64,
    pub total_energy_saved: f64,
    /// Sum of the per-order tree figures
    pub total_trees_saved: f64,
    /// Line items across delivered orders (every line counts)
    pub sustainable_purchases: u64,
    pub total_orders: u64,
    /// Summed carbon divided by the per-tree absorption rate
    pub trees_equivalent: f64,
}

/// Running, unrounded totals over a set of orders
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ImpactTotals {
    pub carbon: f64,
    pub water: f64,
    pub energy: f64,
    pub trees: f64,
    pub orders: u64,
    pub items: u64,
}

impl ImpactTotals {
    /// Fold one order in. Orders that are not delivered are ignored.
    pub fn add(&mut self, order: &OrderSnapshot) {
        if !order.status.counts_towards_impact() {
            return;
        }

        self.carbon += order.impact.total_carbon_footprint;
        self.water += order.impact.total_water_saved;
        self.energy += order.impact.total_energy_saved;
        self.trees += order.impact.trees_saved;
        self.orders += 1;
        self.items += u64::from(order.item_count);
    }

    /// Carbon total as displayed to users
    pub fn carbon_reduced(&self) -> f64 {
        round_to(self.carbon, TOTAL_PRECISION)
    }

    pub fn into_lifetime(self) -> UserLifetimeImpact {
        UserLifetimeImpact {
            total_carbon_reduced: self.carbon_reduced(),
            total_water_saved: round_to(self.water, TOTAL_PRECISION),
            total_energy_saved: round_to(self.energy, TOTAL_PRECISION),
            total_trees_saved: round_to(self.trees, TREES_PRECISION),
            sustainable_purchases: self.items,
            total_orders: self.orders,
            trees_equivalent: round_to(self.carbon / TREE_CO2_KG_PER_YEAR, TREES_PRECISION),
        }
    }
}

impl<'a> FromIterator<&'a OrderSnapshot> for ImpactTotals {
    fn from_iter<I: IntoIterator<Item = &'a OrderSnapshot>>(iter: I) -> Self {
        let mut totals = ImpactTotals::default();
        for order in iter {
            totals.add(order);
        }
        totals
    }
}

/// Sum a user's delivered orders into lifetime impact
pub fn aggregate_user_lifetime_impact(orders: &[OrderSnapshot]) -> UserLifetimeImpact {
    orders.iter().collect::<ImpactTotals>().into_lifetime()
}
