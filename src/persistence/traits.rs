use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::{ActivityEntry, MarketplaceListing, TradeRecord};
use crate::error::Result;

/// Capability boundary to the marketplace's stores: trade records,
/// listings, price feed, activity history.
///
/// Status updates are compare-and-set on the record's current status so two
/// concurrent terminal-event deliveries can never double-apply settlement;
/// the `bool` return reports whether this call performed the transition.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    async fn record_by_offer(&self, offer_id: &str) -> Result<Option<TradeRecord>>;

    /// `Pending -> Declined`. Returns false when the record is absent or
    /// already terminal.
    async fn mark_record_declined(&self, offer_id: &str) -> Result<bool>;

    /// `Pending -> Confirm` and sets the accepted flag. Returns false when
    /// the record is absent or already terminal.
    async fn mark_record_confirmed(&self, offer_id: &str) -> Result<bool>;

    async fn insert_listing(&self, listing: &MarketplaceListing) -> Result<()>;

    /// Soft-deletes the listing matching (user, asset). Returns whether a
    /// live listing matched.
    async fn delist_item(&self, user_id: &str, asset_id: &str) -> Result<bool>;

    /// Reference price from the ingested price feed.
    async fn reference_price(&self, market_hash_name: &str) -> Result<Option<Decimal>>;

    /// Most recent live market price.
    async fn live_price(&self, market_hash_name: &str) -> Result<Option<Decimal>>;

    async fn append_activity(&self, entry: &ActivityEntry) -> Result<()>;
}
