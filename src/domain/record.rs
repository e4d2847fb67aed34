use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::{ItemDescription, ItemTag};

/// Flow a trade record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeType {
    /// User sends items to an agent; items become marketplace inventory.
    Deposit,
    /// An agent sends items back to a user; items leave the marketplace.
    Withdraw,
    /// Items received into the user's site inventory without being listed.
    InventoryImport,
}

impl TradeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "Deposit",
            Self::Withdraw => "Withdraw",
            Self::InventoryImport => "InventoryImport",
        }
    }

    /// Flows that settle by receiving items from the counterpart.
    pub fn is_deposit_class(&self) -> bool {
        matches!(self, Self::Deposit | Self::InventoryImport)
    }
}

impl std::fmt::Display for TradeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TradeType {
    type Err = &'static str;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw {
            "Deposit" => Ok(Self::Deposit),
            "Withdraw" => Ok(Self::Withdraw),
            "InventoryImport" => Ok(Self::InventoryImport),
            _ => Err("invalid trade type; expected Deposit|Withdraw|InventoryImport"),
        }
    }
}

/// Trade record status. Transitions only move forward:
/// `Pending -> Confirm` or `Pending -> Declined`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordStatus {
    Pending,
    Confirm,
    Declined,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Confirm => "Confirm",
            Self::Declined => "Declined",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirm | Self::Declined)
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RecordStatus {
    type Err = &'static str;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw {
            "Pending" => Ok(Self::Pending),
            "Confirm" => Ok(Self::Confirm),
            "Declined" => Ok(Self::Declined),
            _ => Err("invalid record status; expected Pending|Confirm|Declined"),
        }
    }
}

/// One item requested in a trade, with the requester's sell terms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestedItem {
    pub asset_id: String,
    #[serde(default)]
    pub sell_price: Option<Decimal>,
    #[serde(default)]
    pub commission: Option<Decimal>,
}

/// Persisted record of a requested trade. Created by the request layer;
/// this crate only moves its status forward and reads its sell terms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: Uuid,
    /// Assigned once an offer has been sent for this record.
    pub offer_id: Option<String>,
    pub trade_type: TradeType,
    pub user_id: String,
    pub items: Vec<RequestedItem>,
    /// Record-level fallback sell terms (inventory-import flow).
    #[serde(default)]
    pub sell_price: Option<Decimal>,
    #[serde(default)]
    pub commission: Option<Decimal>,
    pub status: RecordStatus,
    pub accepted: bool,
    pub created_at: DateTime<Utc>,
}

impl TradeRecord {
    pub fn requested_item(&self, asset_id: &str) -> Option<&RequestedItem> {
        self.items.iter().find(|item| item.asset_id == asset_id)
    }
}

/// A user-owned item available on the marketplace. Created on deposit
/// settlement, soft-deleted on withdraw settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketplaceListing {
    pub id: Uuid,
    pub user_id: String,
    pub owner_id: String,
    pub asset_id: String,
    pub class_id: String,
    pub name: String,
    pub market_hash_name: String,
    pub sold: bool,
    /// True when visible on the marketplace; false for plain inventory rows.
    pub listing: bool,
    pub price: Decimal,
    pub sell_price: Decimal,
    pub commission: Decimal,
    pub icon_url: String,
    pub kind: String,
    pub tradable: bool,
    pub bargain: bool,
    pub tags: Vec<ItemTag>,
    pub descriptions: Vec<ItemDescription>,
    pub wear_value: Option<f64>,
    pub inspect_links: Vec<String>,
    pub agent_name: String,
    pub agent_id: String,
    pub stickers: Vec<String>,
    pub unique_points: Option<i64>,
    /// Soft-delete flag; rows are never removed.
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
}

/// Kinds of settlement activity recorded for the user-facing history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// Deposit settled into a visible marketplace listing.
    MarketListing,
    /// Deposit settled into unlisted site inventory.
    InventoryImport,
    /// Withdraw settled back to the user's platform inventory.
    Withdrawal,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MarketListing => "market_listing",
            Self::InventoryImport => "inventory_import",
            Self::Withdrawal => "withdrawal",
        }
    }
}

/// One append-only activity-log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub kind: ActivityKind,
    pub user_id: String,
    pub asset_id: String,
    pub name: String,
    pub market_hash_name: String,
    pub icon_url: String,
    pub price: Decimal,
    pub sell_price: Decimal,
    pub commission: Decimal,
    pub at: DateTime<Utc>,
}
