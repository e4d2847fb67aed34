use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::platform::AccountCredentials;
use crate::pool::PoolConfig;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Managed platform accounts.
    pub accounts: Vec<AccountConfig>,
    #[serde(default)]
    pub pool: PoolConfig,
    pub database: DatabaseConfig,
    pub inventory: InventoryApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// One managed account, as configured by operations.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    /// Stable marketplace-side identifier for this agent.
    pub id: String,
    pub account_name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub password: String,
    /// TOTP seed for login codes.
    pub shared_secret: String,
    /// Secret used to sign mobile confirmations for outgoing items.
    pub identity_secret: String,
    /// Platform-side account id (inventory lookups are keyed by it).
    pub platform_id: String,
    /// Inactive accounts are skipped at activation.
    #[serde(default = "default_true")]
    pub active: bool,
}

impl AccountConfig {
    pub fn credentials(&self) -> AccountCredentials {
        AccountCredentials {
            account_name: self.account_name.clone(),
            password: self.password.clone(),
            two_factor_secret: self.shared_secret.clone(),
        }
    }

    pub fn display(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.account_name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// Inventory-count REST API settings.
#[derive(Debug, Clone, Deserialize)]
pub struct InventoryApiConfig {
    pub base_url: String,
    pub api_key: String,
    #[serde(default = "default_app_id")]
    pub app_id: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_connections() -> u32 {
    5
}

fn default_app_id() -> u32 {
    730
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .set_default("logging.level", "info")?
            .set_default("database.max_connections", 5)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(
                File::from(config_dir.join(
                    std::env::var("OFFERPOOL_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (OFFERPOOL_DATABASE__URL, etc.)
            .add_source(
                Environment::with_prefix("OFFERPOOL")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    const SAMPLE: &str = r#"
        [[accounts]]
        id = "bot-1"
        account_name = "marketbot01"
        password = "hunter2"
        shared_secret = "c2hhcmVk"
        identity_secret = "aWRlbnRpdHk="
        platform_id = "7656119000"

        [[accounts]]
        id = "bot-2"
        account_name = "marketbot02"
        display_name = "Backup Bot"
        password = "hunter3"
        shared_secret = "c2hhcmVkMg=="
        identity_secret = "aWRlbnRpdHky"
        platform_id = "7656119001"
        active = false

        [database]
        url = "postgres://localhost/marketplace"

        [inventory]
        base_url = "https://inventory.example.com/api"
        api_key = "k123"
    "#;

    fn parse_sample() -> AppConfig {
        Config::builder()
            .add_source(File::from_str(SAMPLE, FileFormat::Toml))
            .build()
            .expect("build config")
            .try_deserialize()
            .expect("deserialize config")
    }

    #[test]
    fn sample_config_parses_with_defaults() {
        let cfg = parse_sample();
        assert_eq!(cfg.accounts.len(), 2);
        assert!(cfg.accounts[0].active);
        assert!(!cfg.accounts[1].active);
        assert_eq!(cfg.accounts[1].display(), "Backup Bot");
        assert_eq!(cfg.accounts[0].display(), "marketbot01");
        assert_eq!(cfg.database.max_connections, 5);
        assert_eq!(cfg.inventory.app_id, 730);
        assert_eq!(cfg.pool.capacity_ceiling, 1000);
        assert_eq!(cfg.pool.activation_delay_secs, 5);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn credentials_carry_the_totp_seed() {
        let cfg = parse_sample();
        let credentials = cfg.accounts[0].credentials();
        assert_eq!(credentials.account_name, "marketbot01");
        assert_eq!(credentials.two_factor_secret, "c2hhcmVk");
    }
}
