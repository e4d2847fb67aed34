use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use std::str::FromStr;
use tracing::info;

use crate::domain::{
    ActivityEntry, MarketplaceListing, RecordStatus, RequestedItem, TradeRecord, TradeType,
};
use crate::error::{PoolError, Result};

use super::PersistenceGateway;

/// PostgreSQL gateway implementation.
#[derive(Clone)]
pub struct PostgresGateway {
    pool: PgPool,
}

impl PostgresGateway {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Reuse an existing connection pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations completed");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn record_from_row(row: &sqlx::postgres::PgRow) -> Result<TradeRecord> {
        let trade_type: String = row.try_get("trade_type")?;
        let status: String = row.try_get("status")?;
        let items: serde_json::Value = row.try_get("items")?;
        Ok(TradeRecord {
            id: row.try_get("id")?,
            offer_id: row.try_get("offer_id")?,
            trade_type: TradeType::from_str(&trade_type)
                .map_err(|e| PoolError::Validation(e.to_string()))?,
            user_id: row.try_get("user_id")?,
            items: serde_json::from_value::<Vec<RequestedItem>>(items)?,
            sell_price: row.try_get("sell_price")?,
            commission: row.try_get("commission")?,
            status: RecordStatus::from_str(&status)
                .map_err(|e| PoolError::Validation(e.to_string()))?,
            accepted: row.try_get("accepted")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl PersistenceGateway for PostgresGateway {
    async fn record_by_offer(&self, offer_id: &str) -> Result<Option<TradeRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, offer_id, trade_type, user_id, items, sell_price, commission,
                   status, accepted, created_at
            FROM trade_records WHERE offer_id = $1
            "#,
        )
        .bind(offer_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| Self::record_from_row(&r)).transpose()
    }

    async fn mark_record_declined(&self, offer_id: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE trade_records SET status = 'Declined' WHERE offer_id = $1 AND status = 'Pending'",
        )
        .bind(offer_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_record_confirmed(&self, offer_id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE trade_records SET status = 'Confirm', accepted = TRUE
            WHERE offer_id = $1 AND status = 'Pending'
            "#,
        )
        .bind(offer_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_listing(&self, listing: &MarketplaceListing) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO marketplace_listings (
                id, user_id, owner_id, asset_id, class_id, name, market_hash_name,
                sold, listing, price, sell_price, commission, icon_url, kind,
                tradable, bargain, tags, descriptions, wear_value, inspect_links,
                agent_name, agent_id, stickers, unique_points, deleted, created_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26
            )
            "#,
        )
        .bind(listing.id)
        .bind(&listing.user_id)
        .bind(&listing.owner_id)
        .bind(&listing.asset_id)
        .bind(&listing.class_id)
        .bind(&listing.name)
        .bind(&listing.market_hash_name)
        .bind(listing.sold)
        .bind(listing.listing)
        .bind(listing.price)
        .bind(listing.sell_price)
        .bind(listing.commission)
        .bind(&listing.icon_url)
        .bind(&listing.kind)
        .bind(listing.tradable)
        .bind(listing.bargain)
        .bind(serde_json::to_value(&listing.tags)?)
        .bind(serde_json::to_value(&listing.descriptions)?)
        .bind(listing.wear_value)
        .bind(serde_json::to_value(&listing.inspect_links)?)
        .bind(&listing.agent_name)
        .bind(&listing.agent_id)
        .bind(serde_json::to_value(&listing.stickers)?)
        .bind(listing.unique_points)
        .bind(listing.deleted)
        .bind(listing.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delist_item(&self, user_id: &str, asset_id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE marketplace_listings SET deleted = TRUE
            WHERE user_id = $1 AND asset_id = $2 AND deleted = FALSE
            "#,
        )
        .bind(user_id)
        .bind(asset_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn reference_price(&self, market_hash_name: &str) -> Result<Option<Decimal>> {
        let row = sqlx::query(
            "SELECT avg_price, max_price, unstable FROM price_feed WHERE market_hash_name = $1",
        )
        .bind(market_hash_name)
        .fetch_optional(&self.pool)
        .await?;

        // Unstable quotes lean on the observed maximum instead of the average.
        Ok(row
            .map(|r| {
                let unstable: bool = r.try_get("unstable")?;
                if unstable {
                    r.try_get::<Decimal, _>("max_price")
                } else {
                    r.try_get::<Decimal, _>("avg_price")
                }
            })
            .transpose()?)
    }

    async fn live_price(&self, market_hash_name: &str) -> Result<Option<Decimal>> {
        let row =
            sqlx::query("SELECT lowest_price FROM price_feed WHERE market_hash_name = $1")
                .bind(market_hash_name)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row
            .map(|r| r.try_get::<Option<Decimal>, _>("lowest_price"))
            .transpose()?
            .flatten())
    }

    async fn append_activity(&self, entry: &ActivityEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO activity_log (
                kind, user_id, asset_id, name, market_hash_name, icon_url,
                price, sell_price, commission, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(entry.kind.as_str())
        .bind(&entry.user_id)
        .bind(&entry.asset_id)
        .bind(&entry.name)
        .bind(&entry.market_hash_name)
        .bind(&entry.icon_url)
        .bind(entry.price)
        .bind(entry.sell_price)
        .bind(entry.commission)
        .bind(entry.at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
