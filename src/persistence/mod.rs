//! Persistence gateway: trade records, listings, prices, activity history.

mod memory;
mod postgres;
mod traits;

pub use memory::InMemoryGateway;
pub use postgres::PostgresGateway;
pub use traits::PersistenceGateway;
