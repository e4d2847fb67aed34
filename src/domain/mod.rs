//! Shared data model: items, offers, trade records, listings.

mod item;
mod offer;
mod record;

pub use item::{ExchangeDetails, ItemDescription, ItemTag, TradeItem};
pub use offer::{
    DispatchDetail, DispatchResponse, DispatchStatus, OfferCategory, OfferState, OfferStateChange,
    SendStatus,
};
pub use record::{
    ActivityEntry, ActivityKind, MarketplaceListing, RecordStatus, RequestedItem, TradeRecord,
    TradeType,
};
