pub mod agent;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod persistence;
pub mod platform;
pub mod pool;
pub mod reconciler;
pub mod testkit;

pub use agent::{AgentIdentity, TradingAgent};
pub use config::{AccountConfig, AppConfig};
pub use domain::{
    DispatchResponse, DispatchStatus, ExchangeDetails, MarketplaceListing, OfferState,
    OfferStateChange, TradeItem, TradeRecord, TradeType,
};
pub use error::{PoolError, Result};
pub use persistence::{InMemoryGateway, PersistenceGateway, PostgresGateway};
pub use platform::{HttpInventoryApi, InventoryProvider, PlatformClient};
pub use pool::{AgentPool, PoolConfig, WithdrawGroup, WithdrawGroupResult};
pub use reconciler::{ItemInspector, OfferReconciler, TagInspector};
