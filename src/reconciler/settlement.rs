//! Settlement classification: (exchange direction, trade type) pairs map to
//! an explicit plan instead of nested conditionals, so every combination is
//! enumerable and testable on its own.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::{ExchangeDetails, TradeItem, TradeType};

/// Placeholder sell terms recorded when a deposit carries none. The price is
/// an explicit sentinel the marketplace replaces before sale, not a real
/// quote.
pub const PLACEHOLDER_SELL_PRICE: Decimal = dec!(6666);
pub const PLACEHOLDER_COMMISSION: Decimal = dec!(1);

/// What an accepted offer settles into.
#[derive(Debug)]
pub enum SettlementPlan<'a> {
    /// Deposit: every received item becomes a visible marketplace listing.
    MarketListing { items: &'a [TradeItem] },
    /// Inventory import: received items become unlisted inventory rows.
    InventoryImport { items: &'a [TradeItem] },
    /// Withdraw: every sent item's listing is soft-deleted.
    Delist { items: &'a [TradeItem] },
    /// Unsupported pattern; logged, never silently processed.
    Anomaly(String),
}

pub fn classify<'a>(details: &'a ExchangeDetails, trade_type: TradeType) -> SettlementPlan<'a> {
    let received = !details.received.is_empty();
    let sent = !details.sent.is_empty();

    match (received, sent, trade_type) {
        (true, true, _) => {
            SettlementPlan::Anomaly("offer exchanged items in both directions".to_string())
        }
        (false, false, _) => {
            SettlementPlan::Anomaly("accepted offer reported no exchanged items".to_string())
        }
        (true, false, TradeType::Deposit) => SettlementPlan::MarketListing {
            items: &details.received,
        },
        (true, false, TradeType::InventoryImport) => SettlementPlan::InventoryImport {
            items: &details.received,
        },
        (false, true, TradeType::Withdraw) => SettlementPlan::Delist {
            items: &details.sent,
        },
        (true, false, TradeType::Withdraw) => {
            SettlementPlan::Anomaly("items received on a Withdraw trade".to_string())
        }
        (false, true, trade_type) => {
            SettlementPlan::Anomaly(format!("items sent on a {trade_type} trade"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::item;

    fn details(sent: usize, received: usize) -> ExchangeDetails {
        ExchangeDetails {
            sent: (0..sent).map(|i| item(&format!("s{i}"), "Sent Item")).collect(),
            received: (0..received)
                .map(|i| item(&format!("r{i}"), "Received Item"))
                .collect(),
        }
    }

    #[test]
    fn received_only_deposit_lists_on_the_market() {
        let details = details(0, 2);
        match classify(&details, TradeType::Deposit) {
            SettlementPlan::MarketListing { items } => assert_eq!(items.len(), 2),
            other => panic!("unexpected plan: {other:?}"),
        }
    }

    #[test]
    fn received_only_import_stays_off_the_market() {
        let details = details(0, 1);
        match classify(&details, TradeType::InventoryImport) {
            SettlementPlan::InventoryImport { items } => assert_eq!(items.len(), 1),
            other => panic!("unexpected plan: {other:?}"),
        }
    }

    #[test]
    fn sent_only_withdraw_delists() {
        let details = details(3, 0);
        match classify(&details, TradeType::Withdraw) {
            SettlementPlan::Delist { items } => assert_eq!(items.len(), 3),
            other => panic!("unexpected plan: {other:?}"),
        }
    }

    #[test]
    fn mixed_directions_are_never_settled() {
        let details = details(1, 1);
        for trade_type in [
            TradeType::Deposit,
            TradeType::Withdraw,
            TradeType::InventoryImport,
        ] {
            assert!(matches!(
                classify(&details, trade_type),
                SettlementPlan::Anomaly(_)
            ));
        }
    }

    #[test]
    fn direction_and_type_mismatches_are_anomalies() {
        // Withdraw that only received items.
        assert!(matches!(
            classify(&details(0, 1), TradeType::Withdraw),
            SettlementPlan::Anomaly(_)
        ));
        // Deposit-class trades that only sent items.
        assert!(matches!(
            classify(&details(1, 0), TradeType::Deposit),
            SettlementPlan::Anomaly(_)
        ));
        assert!(matches!(
            classify(&details(1, 0), TradeType::InventoryImport),
            SettlementPlan::Anomaly(_)
        ));
    }

    #[test]
    fn empty_exchanges_are_anomalies() {
        assert!(matches!(
            classify(&details(0, 0), TradeType::Deposit),
            SettlementPlan::Anomaly(_)
        ));
    }
}
