use thiserror::Error;

/// Main error type for the agent pool
#[derive(Error, Debug)]
pub enum PoolError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Dispatch errors
    #[error("No agent available after {waited_ms}ms")]
    NoAgentAvailable { waited_ms: u64 },

    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    // Platform session errors (recovered locally, never surfaced per-request)
    #[error("Session failure: {0}")]
    SessionFailure(String),

    #[error("Offer send failed: {0}")]
    OfferSendFailure(String),

    #[error("Confirmation failed for offer {offer_id}: {reason}")]
    ConfirmationFailure { offer_id: String, reason: String },

    // Settlement errors (logged, not fatal)
    #[error("Reconciliation anomaly: {0}")]
    ReconciliationAnomaly(String),

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for PoolError
pub type Result<T> = std::result::Result<T, PoolError>;
