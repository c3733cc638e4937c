use marketstack_model::{Price, ProductRecord, SellerRecord};
use marketstack_types::Category;

/// Product filters. Every set filter must match; an empty criteria matches
/// every product.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    /// Exact product name, ignoring case.
    pub name: Option<String>,
    /// Exact price, to the cent.
    pub price: Option<Price>,
    /// Store name, ignoring case.
    pub store: Option<String>,
    /// Exact description, ignoring case.
    pub description: Option<String>,
    pub category: Option<Category>,
    /// Only products with a positive quantity.
    pub in_stock: bool,
}

impl SearchCriteria {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn price(mut self, price: Price) -> Self {
        self.price = Some(price);
        self
    }

    #[must_use]
    pub fn store(mut self, store: impl Into<String>) -> Self {
        self.store = Some(store.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    #[must_use]
    pub fn in_stock(mut self) -> Self {
        self.in_stock = true;
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    #[must_use]
    pub fn matches(&self, product: &ProductRecord) -> bool {
        fn same(filter: Option<&String>, value: &str) -> bool {
            filter.is_none_or(|f| f.trim().eq_ignore_ascii_case(value))
        }

        same(self.name.as_ref(), &product.name)
            && self.price.is_none_or(|p| p == product.price)
            && same(self.store.as_ref(), &product.store_name)
            && same(self.description.as_ref(), &product.description)
            && self.category.is_none_or(|c| c == product.category)
            && (!self.in_stock || product.in_stock())
    }
}

/// Products across `sellers` matching `criteria`, in catalog order.
/// Sentinel sellers are skipped.
#[must_use]
pub fn search<'a>(
    sellers: &'a [SellerRecord],
    criteria: &SearchCriteria,
) -> Vec<&'a ProductRecord> {
    sellers
        .iter()
        .filter(|s| !s.is_sentinel())
        .flat_map(|s| s.stores())
        .flat_map(|store| store.products())
        .filter(|p| criteria.matches(p))
        .collect()
}
