//! One managed account: session lifecycle plus offer-send primitives.

mod trading_agent;

pub use trading_agent::{AgentIdentity, TradingAgent};
