use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::InventoryApiConfig;
use crate::error::Result;

/// Authoritative inventory size for one platform account. Queried once per
/// agent at session establishment to seed the capacity counter.
#[async_trait]
pub trait InventoryProvider: Send + Sync {
    async fn total_count(&self, platform_id: &str) -> Result<u32>;
}

#[derive(Debug, Deserialize)]
struct InventorySummary {
    #[serde(default)]
    total_inventory_count: u32,
}

/// REST implementation against the platform's inventory API.
pub struct HttpInventoryApi {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    app_id: u32,
}

impl HttpInventoryApi {
    pub fn new(config: &InventoryApiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            app_id: config.app_id,
        }
    }

    fn request_url(&self, platform_id: &str) -> String {
        format!(
            "{}/inventory/{}/{}/2?api_key={}",
            self.base_url, platform_id, self.app_id, self.api_key
        )
    }
}

#[async_trait]
impl InventoryProvider for HttpInventoryApi {
    async fn total_count(&self, platform_id: &str) -> Result<u32> {
        let summary: InventorySummary = self
            .http
            .get(self.request_url(platform_id))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!(
            platform_id,
            count = summary.total_inventory_count,
            "fetched inventory count"
        );
        Ok(summary.total_inventory_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_url_is_keyed_and_versioned() {
        let api = HttpInventoryApi::new(&InventoryApiConfig {
            base_url: "https://inventory.example.com/api/".into(),
            api_key: "k123".into(),
            app_id: 730,
        });
        assert_eq!(
            api.request_url("7656119000"),
            "https://inventory.example.com/api/inventory/7656119000/730/2?api_key=k123"
        );
    }

    #[test]
    fn missing_count_field_defaults_to_zero() {
        let summary: InventorySummary = serde_json::from_str("{}").expect("parse");
        assert_eq!(summary.total_inventory_count, 0);

        let summary: InventorySummary =
            serde_json::from_str(r#"{"total_inventory_count": 412}"#).expect("parse");
        assert_eq!(summary.total_inventory_count, 412);
    }
}
