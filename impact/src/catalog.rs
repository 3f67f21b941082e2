//! Catalog browsing and pagination
//!
//! Filters, sort orders and page arithmetic shared by every store. The
//! Postgres store translates a [`ProductFilter`] into SQL; the in-memory
//! store applies [`ProductFilter::matches`] and [`ProductSort::compare`]
//! directly, so both agree on what a page contains.

use std::cmp::Ordering;

use serde::Serialize;

use crate::coefficients::Category;
use crate::error::{ImpactError, ImpactResult};
use crate::product::Product;

/// Default page size when browsing products
pub const DEFAULT_PRODUCT_PAGE_SIZE: u32 = 12;

/// Default page size when listing orders
pub const DEFAULT_ORDER_PAGE_SIZE: u32 = 10;

/// Largest page a client may request
pub const MAX_PAGE_SIZE: u32 = 100;

/// A validated, 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Build from optional query values, falling back to page 1 and `default_limit`
    pub fn new(page: Option<u32>, limit: Option<u32>, default_limit: u32) -> ImpactResult<Self> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(default_limit);

        if page == 0 || limit == 0 || limit > MAX_PAGE_SIZE {
            return Err(ImpactError::InvalidPage { page, limit });
        }

        Ok(Self { page, limit })
    }

    /// Rows to skip before this page
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

/// One page of results plus the size of the whole result set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub total_pages: u64,
    pub current_page: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            total_pages: total.div_ceil(u64::from(request.limit)),
            current_page: request.page,
        }
    }

    /// Slice an already filtered and ordered result set
    pub fn from_all(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(usize::try_from(request.offset()).unwrap_or(usize::MAX))
            .take(request.limit as usize)
            .collect();
        Self::new(items, total, request)
    }

    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            total_pages: self.total_pages,
            current_page: self.current_page,
        }
    }
}

/// Product listing order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProductSort {
    /// Most recently added first
    #[default]
    Newest,
    PriceLow,
    PriceHigh,
    /// Best packaging score first
    Sustainability,
    /// Most sold first
    Popular,
}

impl ProductSort {
    /// Parse a `sort_by` value. Unknown values list newest first.
    pub fn from_param(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "price-low" => ProductSort::PriceLow,
            "price-high" => ProductSort::PriceHigh,
            "sustainability" => ProductSort::Sustainability,
            "popular" => ProductSort::Popular,
            _ => ProductSort::Newest,
        }
    }

    /// Ordering between two products. `Newest` leaves recency to the store.
    pub fn compare(&self, a: &Product, b: &Product) -> Ordering {
        match self {
            ProductSort::Newest => Ordering::Equal,
            ProductSort::PriceLow => a.price_cents.cmp(&b.price_cents),
            ProductSort::PriceHigh => b.price_cents.cmp(&a.price_cents),
            ProductSort::Sustainability => b
                .sustainability
                .packaging_score
                .cmp(&a.sustainability.packaging_score),
            ProductSort::Popular => b.sales_count.cmp(&a.sales_count),
        }
    }
}

/// Catalog filter. Only active products ever match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub category: Option<Category>,
    pub organic: bool,
    pub recycled: bool,
    pub fair_trade: bool,
    pub local: bool,
    pub biodegradable: bool,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
    /// Case-insensitive substring of the product name
    pub search: Option<String>,
}

impl ProductFilter {
    pub fn validate(&self) -> ImpactResult<()> {
        if let (Some(min_cents), Some(max_cents)) = (self.min_price_cents, self.max_price_cents) {
            if min_cents > max_cents {
                return Err(ImpactError::InvalidPriceRange {
                    min_cents,
                    max_cents,
                });
            }
        }
        Ok(())
    }

    /// Trimmed search term, `None` when blank
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }

    pub fn matches(&self, product: &Product) -> bool {
        let flags = &product.sustainability;

        product.is_active
            && self.category.map_or(true, |c| c == product.category)
            && (!self.organic || flags.is_organic)
            && (!self.recycled || flags.is_recycled)
            && (!self.fair_trade || flags.is_fair_trade)
            && (!self.local || flags.is_local)
            && (!self.biodegradable || flags.is_biodegradable)
            && self.min_price_cents.map_or(true, |min| product.price_cents >= min)
            && self.max_price_cents.map_or(true, |max| product.price_cents <= max)
            && self.search_term().map_or(true, |term| {
                product.name.to_lowercase().contains(&term.to_lowercase())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::SustainabilityFlags;
    use uuid::Uuid;

    fn product(name: &str, price_cents: i64, flags: SustainabilityFlags) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: name.to_string(),
            category: Category::Home,
            sustainability: flags,
            price_cents,
            stock: 5,
            sales_count: 0,
            is_active: true,
        }
    }

    #[test]
    fn test_page_request_defaults_and_bounds() {
        let request = PageRequest::new(None, None, DEFAULT_PRODUCT_PAGE_SIZE).unwrap();
        assert_eq!(request, PageRequest { page: 1, limit: 12 });
        assert_eq!(request.offset(), 0);

        assert_eq!(PageRequest::new(Some(3), Some(10), 12).unwrap().offset(), 20);
        assert!(PageRequest::new(Some(0), None, 12).is_err());
        assert!(PageRequest::new(None, Some(0), 12).is_err());
        assert!(PageRequest::new(None, Some(MAX_PAGE_SIZE + 1), 12).is_err());
    }

    #[test]
    fn test_page_slicing() {
        let request = PageRequest::new(Some(2), Some(2), 10).unwrap();
        let page = Page::from_all(vec![1, 2, 3, 4, 5], request);
        assert_eq!(page.items, vec![3, 4]);
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.current_page, 2);

        let past_end = Page::from_all(vec![1, 2], PageRequest::new(Some(4), Some(2), 10).unwrap());
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.total_pages, 1);
    }

    #[test]
    fn test_filter_flags_price_and_search() {
        let jar = product(
            "Glass Storage Jar",
            1_500,
            SustainabilityFlags {
                is_recycled: true,
                ..Default::default()
            },
        );
        let mat = product("Cork Yoga Mat", 4_000, SustainabilityFlags::default());

        let recycled = ProductFilter {
            recycled: true,
            ..Default::default()
        };
        assert!(recycled.matches(&jar));
        assert!(!recycled.matches(&mat));

        let cheap = ProductFilter {
            max_price_cents: Some(2_000),
            ..Default::default()
        };
        assert!(cheap.matches(&jar));
        assert!(!cheap.matches(&mat));

        let search = ProductFilter {
            search: Some("  yoga ".to_string()),
            ..Default::default()
        };
        assert!(search.matches(&mat));
        assert!(!search.matches(&jar));
    }

    #[test]
    fn test_inactive_never_matches() {
        let mut jar = product("Glass Storage Jar", 1_500, SustainabilityFlags::default());
        jar.is_active = false;
        assert!(!ProductFilter::default().matches(&jar));
    }

    #[test]
    fn test_price_range_validation() {
        let filter = ProductFilter {
            min_price_cents: Some(500),
            max_price_cents: Some(100),
            ..Default::default()
        };
        assert!(matches!(
            filter.validate(),
            Err(ImpactError::InvalidPriceRange { .. })
        ));
        assert!(ProductFilter::default().validate().is_ok());
    }

    #[test]
    fn test_sort_params() {
        assert_eq!(ProductSort::from_param("price-low"), ProductSort::PriceLow);
        assert_eq!(ProductSort::from_param("Popular"), ProductSort::Popular);
        assert_eq!(ProductSort::from_param("whatever"), ProductSort::Newest);

        let cheap = product("A", 100, SustainabilityFlags::default());
        let dear = product("B", 900, SustainabilityFlags::default());
        assert_eq!(ProductSort::PriceHigh.compare(&dear, &cheap), Ordering::Less);
        assert_eq!(ProductSort::Newest.compare(&dear, &cheap), Ordering::Equal);
    }
}
