//! Typed readers for the file-backed account data behind the built-in
//! tools.
//!
//! Every load re-reads the backing file fresh; there is no caching layer.
//! Parse and I/O failures surface as [`DataError`] so the tool layer can
//! collapse them into user-readable strings.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("could not read data file `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("data file `{path}` is not valid JSON: {source}")]
    Decode { path: PathBuf, source: serde_json::Error },
}

#[derive(Clone, Debug, Deserialize)]
pub struct OrderTracking {
    pub order_id: String,
    pub status: String,
    pub estimated_delivery: String,
    pub tracking_url: String,
    pub product: OrderedProduct,
    pub delivery_agent: DeliveryAgent,
}

#[derive(Clone, Debug, Deserialize)]
pub struct OrderedProduct {
    pub brand: String,
    pub model: String,
    pub price: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DeliveryAgent {
    pub name: String,
    pub contact: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Profile {
    pub name: String,
    pub email: String,
    pub credit_balance: u64,
    #[serde(default)]
    pub gift_cards: Vec<GiftCard>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GiftCard {
    pub vendor: String,
    pub value: u64,
    pub expiry: String,
    pub status: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Purchases {
    pub last_purchases: Vec<Purchase>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Purchase {
    pub product_type: String,
    pub brand: String,
    pub model: String,
    pub amount: u64,
    pub purchase_date: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TrendingProducts {
    #[serde(default)]
    pub phones: Vec<Phone>,
    #[serde(default)]
    pub laptops: Vec<Laptop>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Phone {
    pub brand: String,
    pub model: String,
    pub storage: String,
    pub price: u64,
    pub available: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Laptop {
    pub brand: String,
    pub model: String,
    pub ram: String,
    pub storage: String,
    pub price: u64,
    pub available: bool,
}

impl OrderTracking {
    pub async fn load(path: &Path) -> Result<Self, DataError> {
        load_json(path).await
    }
}

impl Profile {
    pub async fn load(path: &Path) -> Result<Self, DataError> {
        load_json(path).await
    }
}

impl Purchases {
    pub async fn load(path: &Path) -> Result<Self, DataError> {
        load_json(path).await
    }
}

impl TrendingProducts {
    pub async fn load(path: &Path) -> Result<Self, DataError> {
        load_json(path).await
    }
}

/// Company blurb; plain text rather than JSON.
pub async fn load_about(path: &Path) -> Result<String, DataError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| DataError::Read { path: path.to_path_buf(), source })
}

async fn load_json<T>(path: &Path) -> Result<T, DataError>
where
    T: serde::de::DeserializeOwned,
{
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| DataError::Read { path: path.to_path_buf(), source })?;

    serde_json::from_str(&raw)
        .map_err(|source| DataError::Decode { path: path.to_path_buf(), source })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::{DataError, OrderTracking, TrendingProducts};

    #[tokio::test]
    async fn order_tracking_parses_the_backing_record() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("order_tracking.json");
        fs::write(
            &path,
            r#"{
                "order_id": "SWP-20931",
                "status": "Out for delivery",
                "estimated_delivery": "2025-03-14",
                "tracking_url": "https://track.swapdesk.example/SWP-20931",
                "product": { "brand": "Apple", "model": "iPhone 13", "price": 41999 },
                "delivery_agent": { "name": "Dana Reyes", "contact": "+1-555-0117" }
            }"#,
        )
        .expect("write fixture");

        let order = OrderTracking::load(&path).await.expect("load should succeed");
        assert_eq!(order.order_id, "SWP-20931");
        assert_eq!(order.product.model, "iPhone 13");
        assert_eq!(order.delivery_agent.name, "Dana Reyes");
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let dir = TempDir::new().expect("temp dir");
        let result = OrderTracking::load(&dir.path().join("nope.json")).await;
        assert!(matches!(result, Err(DataError::Read { .. })));
    }

    #[tokio::test]
    async fn malformed_json_is_a_decode_error() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("trending_products.json");
        fs::write(&path, "{ not json").expect("write fixture");

        let result = TrendingProducts::load(&path).await;
        assert!(matches!(result, Err(DataError::Decode { .. })));
    }

    #[tokio::test]
    async fn trending_sections_default_to_empty() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("trending_products.json");
        fs::write(&path, r#"{ "phones": [] }"#).expect("write fixture");

        let trending = TrendingProducts::load(&path).await.expect("load should succeed");
        assert!(trending.phones.is_empty());
        assert!(trending.laptops.is_empty());
    }
}
