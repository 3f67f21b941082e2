//! Product Impact Calculator
//!
//! Turns one catalog product and a quantity into an [`ImpactVector`].
//!
//! # Algorithm
//!
//! ```text
//! raw        = rate(category) * quantity
//! discount   = Σ flag contributions          (per resource)
//! clamped    = min(discount, cap)             carbon 0.60 / water 0.40 / energy 0.50
//! final      = max(raw * (1 - clamped), floor) carbon 0.1 / water 10 / energy 1
//! ```
//!
//! | flag        | carbon | water | energy |
//! |-------------|-------:|------:|-------:|
//! | organic     | 0.20   | 0.10  |   -    |
//! | recycled    | 0.30   |   -   | 0.25   |
//! | local       | 0.15   |   -   |   -    |

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::coefficients::{Category, CoefficientTable, ImpactRates};

/// Discount contributed by organic production
pub const ORGANIC_DISCOUNT: ImpactRates = ImpactRates::new(0.20, 0.10, 0.0);

/// Discount contributed by recycled materials
pub const RECYCLED_DISCOUNT: ImpactRates = ImpactRates::new(0.30, 0.0, 0.25);

/// Discount contributed by local production
pub const LOCAL_DISCOUNT: ImpactRates = ImpactRates::new(0.15, 0.0, 0.0);

/// Upper bound on each accumulated discount
pub const DISCOUNT_CAPS: ImpactRates = ImpactRates::new(0.60, 0.40, 0.50);

/// Lower bound on each final impact value
pub const IMPACT_FLOORS: ImpactRates = ImpactRates::new(0.1, 10.0, 1.0);

/// Sustainability attributes of a product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SustainabilityFlags {
    pub is_organic: bool,
    pub is_recycled: bool,
    pub is_biodegradable: bool,
    pub is_fair_trade: bool,
    pub is_local: bool,
    /// 1 (worst) ..= 5 (best)
    pub packaging_score: u8,
}

impl Default for SustainabilityFlags {
    fn default() -> Self {
        Self {
            is_organic: false,
            is_recycled: false,
            is_biodegradable: false,
            is_fair_trade: false,
            is_local: false,
            packaging_score: 3,
        }
    }
}

impl SustainabilityFlags {
    /// Whether the product qualifies as a sustainable recommendation
    pub fn is_recommendable(&self) -> bool {
        self.packaging_score >= 4 || self.is_organic || self.is_recycled || self.is_fair_trade
    }
}

/// Catalog product as seen by the impact engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub category: Category,
    pub sustainability: SustainabilityFlags,
    /// Unit price in cents
    pub price_cents: i64,
    pub stock: u32,
    pub sales_count: u64,
    pub is_active: bool,
}

/// Environmental impact of one product line
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpactVector {
    /// kg CO2
    pub carbon_footprint: f64,
    /// liters
    pub water_usage: f64,
    /// kWh
    pub energy_consumption: f64,
}

/// Per-resource discount fractions accumulated from flags
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Discounts {
    pub carbon: f64,
    pub water: f64,
    pub energy: f64,
}

impl Discounts {
    /// Sum the contributions of every set flag (unclamped)
    pub fn from_flags(flags: &SustainabilityFlags) -> Self {
        let mut discounts = Discounts::default();

        if flags.is_organic {
            discounts.add(ORGANIC_DISCOUNT);
        }
        if flags.is_recycled {
            discounts.add(RECYCLED_DISCOUNT);
        }
        if flags.is_local {
            discounts.add(LOCAL_DISCOUNT);
        }

        discounts
    }

    fn add(&mut self, contribution: ImpactRates) {
        self.carbon += contribution.carbon;
        self.water += contribution.water;
        self.energy += contribution.energy;
    }

    /// Clamp each fraction to its cap
    pub fn clamped(self) -> Self {
        Self {
            carbon: self.carbon.min(DISCOUNT_CAPS.carbon),
            water: self.water.min(DISCOUNT_CAPS.water),
            energy: self.energy.min(DISCOUNT_CAPS.energy),
        }
    }
}

/// Product impact calculator with an injected coefficient table
#[derive(Debug, Clone, Default)]
pub struct ImpactCalculator {
    table: CoefficientTable,
}

impl ImpactCalculator {
    pub fn new(table: CoefficientTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &CoefficientTable {
        &self.table
    }

    /// Impact of `quantity` units of `product`
    ///
    /// Pure and infallible. Categories without a row use the default rates,
    /// and every output field is floored, so discounts never zero out impact.
    pub fn compute_product_impact(&self, product: &Product, quantity: u32) -> ImpactVector {
        self.compute(product.category, &product.sustainability, quantity)
    }

    /// Same as [`compute_product_impact`](Self::compute_product_impact) without a full product
    pub fn compute(
        &self,
        category: Category,
        flags: &SustainabilityFlags,
        quantity: u32,
    ) -> ImpactVector {
        let rates = self.table.rates_for(category);
        let quantity = f64::from(quantity);

        let raw_carbon = rates.carbon * quantity;
        let raw_water = rates.water * quantity;
        let raw_energy = rates.energy * quantity;

        let discounts = Discounts::from_flags(flags).clamped();

        ImpactVector {
            carbon_footprint: (raw_carbon * (1.0 - discounts.carbon)).max(IMPACT_FLOORS.carbon),
            water_usage: (raw_water * (1.0 - discounts.water)).max(IMPACT_FLOORS.water),
            energy_consumption: (raw_energy * (1.0 - discounts.energy)).max(IMPACT_FLOORS.energy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(organic: bool, recycled: bool, local: bool) -> SustainabilityFlags {
        SustainabilityFlags {
            is_organic: organic,
            is_recycled: recycled,
            is_local: local,
            ..Default::default()
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_clothing_organic_recycled() {
        let calc = ImpactCalculator::default();
        let impact = calc.compute(Category::Clothing, &flags(true, true, false), 2);

        assert!(approx(impact.carbon_footprint, 15.0));
        assert!(approx(impact.water_usage, 4500.0));
        assert!(approx(impact.energy_consumption, 75.0));
    }

    #[test]
    fn test_no_flags_is_raw() {
        let calc = ImpactCalculator::default();
        let impact = calc.compute(Category::Electronics, &SustainabilityFlags::default(), 3);

        assert!(approx(impact.carbon_footprint, 150.0));
        assert!(approx(impact.water_usage, 300.0));
        assert!(approx(impact.energy_consumption, 300.0));
    }

    #[test]
    fn test_carbon_discount_capped() {
        let raw = Discounts::from_flags(&flags(true, true, true));
        assert!(approx(raw.carbon, 0.65));

        let clamped = raw.clamped();
        assert!(approx(clamped.carbon, 0.60));
        assert!(approx(clamped.water, 0.10));
        assert!(approx(clamped.energy, 0.25));

        let calc = ImpactCalculator::default();
        let impact = calc.compute(Category::Home, &flags(true, true, true), 1);
        assert!(approx(impact.carbon_footprint, 4.0));
    }

    #[test]
    fn test_floors_apply() {
        // A zero-rate table exposes the floors directly
        let table = CoefficientTable::new([], ImpactRates::new(0.0, 0.0, 0.0)).unwrap();
        let calc = ImpactCalculator::new(table);
        let impact = calc.compute(Category::Food, &flags(true, true, true), 1);

        assert!(approx(impact.carbon_footprint, 0.1));
        assert!(approx(impact.water_usage, 10.0));
        assert!(approx(impact.energy_consumption, 1.0));
    }

    #[test]
    fn test_floor_for_small_food_portion() {
        // food organic+recycled+local: 2.5 * 0.4 = 1.0 kg, water 1000 * 0.9
        let calc = ImpactCalculator::default();
        let impact = calc.compute(Category::Food, &flags(true, true, true), 1);
        assert!(approx(impact.carbon_footprint, 1.0));
        assert!(approx(impact.water_usage, 900.0));
        assert!(approx(impact.energy_consumption, 7.5));
    }

    #[test]
    fn test_unknown_category_uses_default_rates() {
        let calc = ImpactCalculator::default();
        let impact = calc.compute(Category::from_slug("garden"), &SustainabilityFlags::default(), 1);

        assert!(approx(impact.carbon_footprint, 5.0));
        assert!(approx(impact.water_usage, 300.0));
        assert!(approx(impact.energy_consumption, 20.0));
    }

    #[test]
    fn test_recommendable() {
        assert!(!SustainabilityFlags::default().is_recommendable());
        assert!(flags(true, false, false).is_recommendable());
        // local alone is not a recommendation criterion
        assert!(!flags(false, false, true).is_recommendable());

        let packaged = SustainabilityFlags {
            packaging_score: 4,
            ..Default::default()
        };
        assert!(packaged.is_recommendable());
    }
}
