//! File-backed account lookups.
//!
//! Each tool re-reads its backing file on every invocation and formats the
//! record into the text the oracle sees as a tool result. Formatting is the
//! only logic here; parsing lives in `swapdesk-store`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use swapdesk_core::config::DataConfig;
use swapdesk_store::records::{self, OrderTracking, Profile, Purchases, TrendingProducts};

use crate::oracle::ToolSpec;

use super::{Tool, ToolError};

pub struct OrderTrackingTool {
    data: DataConfig,
}

impl OrderTrackingTool {
    pub fn new(data: DataConfig) -> Self {
        Self { data }
    }
}

#[async_trait]
impl Tool for OrderTrackingTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("get_order_tracking", "order status, delivery agent, and tracking link")
    }

    async fn run(&self, _arguments: &BTreeMap<String, String>) -> Result<String, ToolError> {
        let order = OrderTracking::load(&self.data.order_tracking_path()).await?;
        Ok(format!(
            "Order {}: {} {} (${}) - Status: {}. Delivery Agent: {} ({}). \
             Estimated Delivery: {}. Track: {}",
            order.order_id,
            order.product.brand,
            order.product.model,
            order.product.price,
            order.status,
            order.delivery_agent.name,
            order.delivery_agent.contact,
            order.estimated_delivery,
            order.tracking_url,
        ))
    }
}

pub struct ProfileTool {
    data: DataConfig,
}

impl ProfileTool {
    pub fn new(data: DataConfig) -> Self {
        Self { data }
    }
}

#[async_trait]
impl Tool for ProfileTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("get_personal_profile", "user profile, credit balance, and gift cards")
    }

    async fn run(&self, _arguments: &BTreeMap<String, String>) -> Result<String, ToolError> {
        let profile = Profile::load(&self.data.profile_path()).await?;

        let mut output = format!(
            "Profile: {} ({})\nCredit Balance: {}\nGift Cards:\n",
            profile.name, profile.email, profile.credit_balance
        );
        if profile.gift_cards.is_empty() {
            output.push_str("  - none\n");
        }
        for card in &profile.gift_cards {
            output.push_str(&format!(
                "  - {}: ${} (Expires: {}, Status: {})\n",
                card.vendor, card.value, card.expiry, card.status
            ));
        }

        Ok(output)
    }
}

pub struct PurchasesTool {
    data: DataConfig,
}

impl PurchasesTool {
    pub fn new(data: DataConfig) -> Self {
        Self { data }
    }
}

#[async_trait]
impl Tool for PurchasesTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("get_last_purchases", "recent purchase history")
    }

    async fn run(&self, _arguments: &BTreeMap<String, String>) -> Result<String, ToolError> {
        let purchases = Purchases::load(&self.data.purchases_path()).await?;

        let mut output = String::from("Recent Purchases:\n");
        for purchase in &purchases.last_purchases {
            output.push_str(&format!(
                "- {}: {} {} - ${} on {}\n",
                purchase.product_type,
                purchase.brand,
                purchase.model,
                purchase.amount,
                purchase.purchase_date
            ));
        }

        Ok(output)
    }
}

pub struct TrendingProductsTool {
    data: DataConfig,
}

impl TrendingProductsTool {
    pub fn new(data: DataConfig) -> Self {
        Self { data }
    }
}

#[async_trait]
impl Tool for TrendingProductsTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("get_trending_products", "products currently listed on Swapdesk")
    }

    async fn run(&self, _arguments: &BTreeMap<String, String>) -> Result<String, ToolError> {
        let trending = TrendingProducts::load(&self.data.trending_path()).await?;

        let mut output = String::from("Available Products:\n\nPHONES:\n");
        for phone in &trending.phones {
            output.push_str(&format!(
                "- {} {} ({}) - ${} [{}]\n",
                phone.brand,
                phone.model,
                phone.storage,
                phone.price,
                availability(phone.available)
            ));
        }

        output.push_str("\nLAPTOPS:\n");
        for laptop in &trending.laptops {
            output.push_str(&format!(
                "- {} {} ({}, {}) - ${} [{}]\n",
                laptop.brand,
                laptop.model,
                laptop.ram,
                laptop.storage,
                laptop.price,
                availability(laptop.available)
            ));
        }

        Ok(output)
    }
}

fn availability(available: bool) -> &'static str {
    if available {
        "available"
    } else {
        "out of stock"
    }
}

pub struct AboutTool {
    data: DataConfig,
}

impl AboutTool {
    pub fn new(data: DataConfig) -> Self {
        Self { data }
    }
}

#[async_trait]
impl Tool for AboutTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("about_swapdesk", "company information")
    }

    async fn run(&self, _arguments: &BTreeMap<String, String>) -> Result<String, ToolError> {
        Ok(records::load_about(&self.data.about_path()).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::Path;

    use swapdesk_core::config::{AppConfig, DataConfig};
    use tempfile::TempDir;

    use crate::tools::Tool;

    use super::{OrderTrackingTool, ProfileTool, TrendingProductsTool};

    fn data_config(dir: &Path) -> DataConfig {
        DataConfig { dir: dir.to_path_buf(), ..AppConfig::default().data }
    }

    fn write_order_fixture(dir: &Path) {
        fs::write(
            dir.join("order_tracking.json"),
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
    }

    #[tokio::test]
    async fn order_tracking_formats_status_and_tracking_url() {
        let dir = TempDir::new().expect("temp dir");
        write_order_fixture(dir.path());
        let tool = OrderTrackingTool::new(data_config(dir.path()));

        let output = tool.run(&BTreeMap::new()).await.expect("tool should succeed");
        assert!(output.contains("Order SWP-20931"));
        assert!(output.contains("Status: Out for delivery"));
        assert!(output.contains("https://track.swapdesk.example/SWP-20931"));
    }

    #[tokio::test]
    async fn repeated_invocations_over_unchanged_data_are_identical() {
        let dir = TempDir::new().expect("temp dir");
        write_order_fixture(dir.path());
        let tool = OrderTrackingTool::new(data_config(dir.path()));

        let first = tool.run(&BTreeMap::new()).await.expect("first call");
        let second = tool.run(&BTreeMap::new()).await.expect("second call");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn missing_backing_file_surfaces_as_a_tool_error() {
        let dir = TempDir::new().expect("temp dir");
        let tool = ProfileTool::new(data_config(dir.path()));

        let result = tool.run(&BTreeMap::new()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn trending_products_marks_out_of_stock_items() {
        let dir = TempDir::new().expect("temp dir");
        fs::write(
            dir.path().join("trending_products.json"),
            r#"{
                "phones": [
                    { "brand": "Google", "model": "Pixel 7", "storage": "128GB",
                      "price": 29999, "available": false }
                ],
                "laptops": []
            }"#,
        )
        .expect("write fixture");
        let tool = TrendingProductsTool::new(data_config(dir.path()));

        let output = tool.run(&BTreeMap::new()).await.expect("tool should succeed");
        assert!(output.contains("Pixel 7"));
        assert!(output.contains("[out of stock]"));
    }
}
