//! Impact Coefficient Table
//!
//! Base carbon / water / energy rates per unit of product, keyed by a stable
//! [`Category`] rather than by the category's display name. Renaming a
//! category in the catalog therefore cannot silently move its products onto
//! the fallback row.
//!
//! ```text
//! category        carbon (kg)   water (L)   energy (kWh)
//! clothing             15         2500          50
//! food                  2.5       1000          10
//! electronics          50          100         100
//! home                 10          500          25
//! personal-care         3          200          15
//! default               5          300          20
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{validation, ImpactResult};

/// Product category used for coefficient lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Clothing,
    Food,
    Electronics,
    Home,
    PersonalCare,
    /// Anything without its own row; reads the table's default rates
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Clothing,
        Category::Food,
        Category::Electronics,
        Category::Home,
        Category::PersonalCare,
        Category::Other,
    ];

    /// Parse a catalog slug. Unknown slugs become [`Category::Other`].
    pub fn from_slug(slug: &str) -> Self {
        match slug.trim().to_ascii_lowercase().as_str() {
            "clothing" => Category::Clothing,
            "food" => Category::Food,
            "electronics" => Category::Electronics,
            "home" => Category::Home,
            "personal-care" => Category::PersonalCare,
            _ => Category::Other,
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Category::Clothing => "clothing",
            Category::Food => "food",
            Category::Electronics => "electronics",
            Category::Home => "home",
            Category::PersonalCare => "personal-care",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Base impact per unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactRates {
    /// kg CO2 per unit
    pub carbon: f64,
    /// liters per unit
    pub water: f64,
    /// kWh per unit
    pub energy: f64,
}

impl ImpactRates {
    pub const fn new(carbon: f64, water: f64, energy: f64) -> Self {
        Self {
            carbon,
            water,
            energy,
        }
    }
}

/// Immutable per-category coefficient table
///
/// Constructed once (standard values or a JSON file) and handed to
/// [`ImpactCalculator`](crate::product::ImpactCalculator). There is no
/// mutation path after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoefficientTable {
    rates: BTreeMap<Category, ImpactRates>,
    default: ImpactRates,
}

impl CoefficientTable {
    /// Default row used for [`Category::Other`] and missing rows
    pub const DEFAULT_RATES: ImpactRates = ImpactRates::new(5.0, 300.0, 20.0);

    /// The published per-category rates
    pub fn standard() -> Self {
        let rates = BTreeMap::from([
            (Category::Clothing, ImpactRates::new(15.0, 2500.0, 50.0)),
            (Category::Food, ImpactRates::new(2.5, 1000.0, 10.0)),
            (Category::Electronics, ImpactRates::new(50.0, 100.0, 100.0)),
            (Category::Home, ImpactRates::new(10.0, 500.0, 25.0)),
            (Category::PersonalCare, ImpactRates::new(3.0, 200.0, 15.0)),
        ]);

        Self {
            rates,
            default: Self::DEFAULT_RATES,
        }
    }

    /// Build a table from explicit rows, validating every rate
    pub fn new(
        rates: impl IntoIterator<Item = (Category, ImpactRates)>,
        default: ImpactRates,
    ) -> ImpactResult<Self> {
        let table = Self {
            rates: rates.into_iter().collect(),
            default,
        };
        table.validate()?;
        Ok(table)
    }

    /// Parse and validate a table from JSON
    ///
    /// ```json
    /// {
    ///   "rates": { "clothing": { "carbon": 15, "water": 2500, "energy": 50 } },
    ///   "default": { "carbon": 5, "water": 300, "energy": 20 }
    /// }
    /// ```
    pub fn from_json(json: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let table: CoefficientTable = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    /// Check that no row carries a negative or non-finite rate
    pub fn validate(&self) -> ImpactResult<()> {
        for (category, rates) in &self.rates {
            validation::validate_rates(category.slug(), rates)?;
        }
        validation::validate_rates("default", &self.default)
    }

    /// Rates for a category, falling back to the default row
    pub fn rates_for(&self, category: Category) -> ImpactRates {
        self.rates.get(&category).copied().unwrap_or(self.default)
    }

    /// Whether the category has its own row
    pub fn has_row(&self, category: Category) -> bool {
        self.rates.contains_key(&category)
    }

    pub fn default_rates(&self) -> ImpactRates {
        self.default
    }
}

impl Default for CoefficientTable {
    fn default() -> Self {
        Self::standard()
    }
}
