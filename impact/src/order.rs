//! Order Impact Aggregator
//!
//! Sums the impact vectors stored on each order line into the order-level
//! [`OrderImpactSummary`]. The summary is computed once when the order is
//! placed and persisted with it; it is never recomputed afterwards.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ImpactError;
use crate::product::ImpactVector;

/// kg CO2 absorbed by one mature tree per year
pub const TREE_CO2_KG_PER_YEAR: f64 = 21.0;

/// Decimal places for carbon / water / energy totals
pub const TOTAL_PRECISION: i32 = 2;

/// Decimal places for tree equivalents
pub const TREES_PRECISION: i32 = 1;

/// Round half away from zero to `places` decimals
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Order lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Only delivered orders count towards lifetime impact and rankings
    pub fn counts_towards_impact(&self) -> bool {
        *self == OrderStatus::Delivered
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ImpactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(ImpactError::InvalidStatus {
                value: s.to_string(),
            }),
        }
    }
}

/// One line of an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub quantity: u32,
    /// Unit price at the time of purchase, in cents
    pub unit_price_cents: i64,
    /// Impact already scaled by `quantity`; `None` counts as zero
    pub impact: Option<ImpactVector>,
}

impl OrderLine {
    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * i64::from(self.quantity)
    }
}

/// Order-level impact totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderImpactSummary {
    pub total_carbon_footprint: f64,
    pub total_water_saved: f64,
    pub total_energy_saved: f64,
    pub trees_saved: f64,
}

/// Sum line impacts into an order summary
///
/// Lines without impact data contribute zero. Totals are rounded to two
/// decimals and trees to one.
pub fn aggregate_order_impact(lines: &[OrderLine]) -> OrderImpactSummary {
    let mut carbon = 0.0;
    let mut water = 0.0;
    let mut energy = 0.0;

    for impact in lines.iter().filter_map(|line| line.impact.as_ref()) {
        carbon += impact.carbon_footprint;
        water += impact.water_usage;
        energy += impact.energy_consumption;
    }

    let trees = carbon / TREE_CO2_KG_PER_YEAR;

    OrderImpactSummary {
        total_carbon_footprint: round_to(carbon, TOTAL_PRECISION),
        total_water_saved: round_to(water, TOTAL_PRECISION),
        total_energy_saved: round_to(energy, TOTAL_PRECISION),
        trees_saved: round_to(trees, TREES_PRECISION),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(carbon: f64, water: f64, energy: f64) -> OrderLine {
        OrderLine {
            product_id: Uuid::new_v4(),
            quantity: 1,
            unit_price_cents: 1_000,
            impact: Some(ImpactVector {
                carbon_footprint: carbon,
                water_usage: water,
                energy_consumption: energy,
            }),
        }
    }

    #[test]
    fn test_empty_order() {
        let summary = aggregate_order_impact(&[]);
        assert_eq!(summary, OrderImpactSummary::default());
        assert_eq!(summary.trees_saved, 0.0);
    }

    #[test]
    fn test_sums_and_trees() {
        let summary = aggregate_order_impact(&[line(15.0, 4500.0, 75.0), line(27.0, 500.0, 25.0)]);

        assert_eq!(summary.total_carbon_footprint, 42.0);
        assert_eq!(summary.total_water_saved, 5000.0);
        assert_eq!(summary.total_energy_saved, 100.0);
        assert_eq!(summary.trees_saved, 2.0);
    }

    #[test]
    fn test_missing_impact_counts_as_zero() {
        let mut bare = line(0.0, 0.0, 0.0);
        bare.impact = None;

        let summary = aggregate_order_impact(&[bare, line(10.0, 20.0, 30.0)]);
        assert_eq!(summary.total_carbon_footprint, 10.0);
        assert_eq!(summary.total_water_saved, 20.0);
        assert_eq!(summary.total_energy_saved, 30.0);
    }

    #[test]
    fn test_rounding() {
        let summary = aggregate_order_impact(&[line(1.234, 10.005, 1.0 / 3.0)]);
        assert_eq!(summary.total_carbon_footprint, 1.23);
        assert_eq!(summary.total_energy_saved, 0.33);
        // 1.234 / 21 = 0.0587...
        assert_eq!(summary.trees_saved, 0.1);
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("delivered".parse::<OrderStatus>().unwrap(), OrderStatus::Delivered);
        assert_eq!("Shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert!("lost".parse::<OrderStatus>().is_err());
        assert!(OrderStatus::Delivered.counts_towards_impact());
        assert!(!OrderStatus::Pending.counts_towards_impact());
    }

    #[test]
    fn test_line_total() {
        let mut l = line(1.0, 1.0, 1.0);
        l.quantity = 3;
        l.unit_price_cents = 1_299;
        assert_eq!(l.line_total_cents(), 3_897);
    }
}
