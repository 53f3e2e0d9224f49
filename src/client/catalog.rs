//! Product catalog lookups. The backend never stores products; the storefront
//! reads them from an external catalog API and joins them with cart and
//! wishlist ids on the device.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::ClientError;
use crate::models::ProductId;

/// How many products the landing listing shows.
pub const FEATURED_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    /// Minor units. The catalog speaks decimal major units on the wire.
    #[serde(with = "major_units")]
    pub price: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image: String,
}

mod major_units {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(*value as f64 / 100.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let major = f64::deserialize(deserializer)?;
        Ok((major * 100.0).round() as i64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSort {
    PriceAsc,
    PriceDesc,
    Title,
}

#[async_trait]
pub trait Catalog: Send + Sync {
    /// The featured listing, at most [`FEATURED_LIMIT`] products.
    async fn products(&self) -> Result<Vec<Product>, ClientError>;

    async fn product(&self, id: ProductId) -> Result<Product, ClientError>;
}

pub struct HttpCatalog {
    http: reqwest::Client,
    base_url: String,
}

impl HttpCatalog {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Catalog for HttpCatalog {
    async fn products(&self) -> Result<Vec<Product>, ClientError> {
        let mut products: Vec<Product> = self
            .http
            .get(format!("{}/products", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        products.truncate(FEATURED_LIMIT);
        Ok(products)
    }

    async fn product(&self, id: ProductId) -> Result<Product, ClientError> {
        let product = self
            .http
            .get(format!("{}/products/{id}", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(product)
    }
}

/// Case-insensitive match on title or description. A blank query keeps everything.
pub fn filter_products(products: &[Product], query: &str) -> Vec<Product> {
    let query = query.trim().to_lowercase();
    products
        .iter()
        .filter(|p| {
            query.is_empty()
                || p.title.to_lowercase().contains(&query)
                || p.description.to_lowercase().contains(&query)
        })
        .cloned()
        .collect()
}

pub fn sort_products(products: &mut [Product], sort: ProductSort) {
    match sort {
        ProductSort::PriceAsc => products.sort_by_key(|p| p.price),
        ProductSort::PriceDesc => products.sort_by_key(|p| std::cmp::Reverse(p.price)),
        ProductSort::Title => products.sort_by_key(|p| p.title.to_lowercase()),
    }
}
