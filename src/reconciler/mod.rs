//! Offer Reconciler
//!
//! Maps external offer-state transitions onto persisted marketplace
//! records: deposits become listings, withdrawals soft-delete them, and
//! everything else is logged as an anomaly.

pub mod inspect;
pub mod reconciler;
pub mod settlement;

pub use inspect::{ItemInspector, TagInspector};
pub use reconciler::OfferReconciler;
pub use settlement::{SettlementPlan, PLACEHOLDER_COMMISSION, PLACEHOLDER_SELL_PRICE};
