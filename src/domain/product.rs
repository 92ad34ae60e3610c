use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Amount;

/// Listing state. A listing is single-unit inventory: a successful order
/// flips it to sold. Inactive only by seller action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Active,
    Sold,
    Inactive,
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductStatus::Active => write!(f, "active"),
            ProductStatus::Sold => write!(f, "sold"),
            ProductStatus::Inactive => write!(f, "inactive"),
        }
    }
}

/// An upcycled-goods listing on the marketplace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub seller_id: String,
    pub title: String,
    pub price: Amount,
    pub category: String,
    pub status: ProductStatus,
    pub views: u32,
    pub likes: u32,
    pub created_at: DateTime<Utc>,
}

/// Payload for listing a new product.
#[derive(Debug, Clone)]
pub struct ProductCreate {
    pub seller_id: String,
    pub title: String,
    pub price: Amount,
    pub category: String,
}

impl ProductCreate {
    pub fn new(
        seller_id: impl Into<String>,
        title: impl Into<String>,
        price: Amount,
        category: impl Into<String>,
    ) -> Self {
        Self {
            seller_id: seller_id.into(),
            title: title.into(),
            price,
            category: category.into(),
        }
    }
}

/// Filter for product listings. `None` fields match everything; `search` is a
/// case-insensitive substring match on the title.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub status: Option<ProductStatus>,
    pub search: Option<String>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = &self.category {
            if &product.category != category {
                return false;
            }
        }
        if let Some(status) = self.status {
            if product.status != status {
                return false;
            }
        }
        if let Some(search) = &self.search {
            if !product
                .title
                .to_lowercase()
                .contains(&search.to_lowercase())
            {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(title: &str, category: &str, status: ProductStatus) -> Product {
        Product {
            id: "product_1".to_string(),
            seller_id: "user_1".to_string(),
            title: title.to_string(),
            price: 250,
            category: category.to_string(),
            status,
            views: 0,
            likes: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn filter_matches_category_status_and_search() {
        let lamp = product("Bottle Lamp", "decor", ProductStatus::Active);
        let bag = product("Tyre Bag", "accessories", ProductStatus::Sold);

        let decor = ProductFilter {
            category: Some("decor".to_string()),
            ..Default::default()
        };
        assert!(decor.matches(&lamp));
        assert!(!decor.matches(&bag));

        let active = ProductFilter {
            status: Some(ProductStatus::Active),
            ..Default::default()
        };
        assert!(!active.matches(&bag));

        let search = ProductFilter {
            search: Some("lamp".to_string()),
            ..Default::default()
        };
        assert!(search.matches(&lamp));
        assert!(!search.matches(&bag));
    }
}
