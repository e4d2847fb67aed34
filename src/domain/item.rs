use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One category/name pair from the platform's item metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemTag {
    pub category: String,
    pub name: String,
}

/// One description block attached to an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDescription {
    pub kind: String,
    pub value: String,
}

/// One tradable item as reported by the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeItem {
    pub asset_id: String,
    /// Assigned by the platform after settlement. Differs from `asset_id`
    /// when the platform re-mints the asset during the exchange.
    #[serde(default)]
    pub new_asset_id: Option<String>,
    pub class_id: String,
    pub name: String,
    pub market_hash_name: String,
    #[serde(default)]
    pub icon_url: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub tags: Vec<ItemTag>,
    #[serde(default)]
    pub descriptions: Vec<ItemDescription>,
    #[serde(default)]
    pub inspect_links: Vec<String>,
    /// Requester-specified sell terms, carried on deposit requests.
    #[serde(default)]
    pub sell_price: Option<Decimal>,
    #[serde(default)]
    pub commission: Option<Decimal>,
}

impl TradeItem {
    /// The asset id the item carries after settlement.
    pub fn settled_asset_id(&self) -> &str {
        self.new_asset_id.as_deref().unwrap_or(&self.asset_id)
    }
}

/// Post-settlement truth for an accepted offer, as reported by the platform.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExchangeDetails {
    pub sent: Vec<TradeItem>,
    pub received: Vec<TradeItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settled_asset_id_prefers_the_reminted_id() {
        let mut item = TradeItem {
            asset_id: "100".into(),
            new_asset_id: None,
            class_id: "c1".into(),
            name: "Test Item".into(),
            market_hash_name: "Test Item".into(),
            icon_url: String::new(),
            kind: String::new(),
            tags: Vec::new(),
            descriptions: Vec::new(),
            inspect_links: Vec::new(),
            sell_price: None,
            commission: None,
        };
        assert_eq!(item.settled_asset_id(), "100");

        item.new_asset_id = Some("200".into());
        assert_eq!(item.settled_asset_id(), "200");
    }
}
