use serde::Deserialize;
use utoipa::ToSchema;

use crate::store::{PageRequest, ProductSort, ProductSortKey};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    /// Returns `(page, per_page)` clamped to sane bounds.
    pub fn normalize(&self, default_per_page: i64) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(default_per_page).clamp(1, 100);
        (page, per_page)
    }

    pub fn to_request(&self, default_per_page: i64) -> PageRequest {
        let (page, per_page) = self.normalize(default_per_page);
        PageRequest::page(page as u64, per_page as u64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductSortBy {
    CreatedAt,
    Price,
    Name,
}

impl From<ProductSortBy> for ProductSortKey {
    fn from(value: ProductSortBy) -> Self {
        match value {
            ProductSortBy::CreatedAt => ProductSortKey::CreatedAt,
            ProductSortBy::Price => ProductSortKey::Price,
            ProductSortBy::Name => ProductSortKey::Name,
        }
    }
}

// Paging fields are inlined: `serde(flatten)` loses numeric types in
// query strings.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProductQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub q: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub sort_by: Option<ProductSortBy>,
    pub sort_order: Option<SortOrder>,
}

impl ProductQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }

    pub fn sort(&self) -> ProductSort {
        ProductSort {
            key: self.sort_by.map(Into::into).unwrap_or(ProductSortKey::CreatedAt),
            order: self.sort_order.unwrap_or(SortOrder::Desc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_clamps_and_defaults() {
        let p = Pagination::default();
        assert_eq!(p.normalize(12), (1, 12));

        let p = Pagination {
            page: Some(-3),
            per_page: Some(1000),
        };
        assert_eq!(p.normalize(12), (1, 100));

        let req = Pagination {
            page: Some(3),
            per_page: Some(5),
        }
        .to_request(12);
        assert_eq!(req.limit, Some(5));
        assert_eq!(req.offset, 10);
    }
}
