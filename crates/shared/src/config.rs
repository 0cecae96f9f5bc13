//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Ledger policy knobs.
    #[serde(default)]
    pub ledger: LedgerPolicyConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT validation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key the identity service signs tokens with.
    pub secret: String,
    /// Access token lifetime in seconds (used by test token helpers).
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    900 // 15 minutes
}

/// How grant-time SoD conflicts are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SodEnforcement {
    /// Refuse the grant.
    #[default]
    Block,
    /// Write the grant and report the conflicts.
    Warn,
}

/// Ledger policy configuration.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LedgerPolicyConfig {
    /// Whether every checklist item must be complete before a period closes.
    #[serde(default = "default_require_close_checklist")]
    pub require_close_checklist: bool,
    /// Grant-time SoD behaviour. Action-time checks always block.
    #[serde(default)]
    pub sod_enforcement: SodEnforcement,
}

fn default_require_close_checklist() -> bool {
    true
}

impl Default for LedgerPolicyConfig {
    fn default() -> Self {
        Self {
            require_close_checklist: default_require_close_checklist(),
            sod_enforcement: SodEnforcement::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("KONTOR").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("KONTOR__DATABASE__URL", Some("postgres://localhost/kontor_test")),
                ("KONTOR__JWT__SECRET", Some("secret")),
                ("KONTOR__SERVER__PORT", Some("9090")),
                ("KONTOR__LEDGER__SOD_ENFORCEMENT", Some("warn")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/kontor_test");
                assert_eq!(config.server.port, 9090);
                assert_eq!(config.server.host, "0.0.0.0");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.ledger.sod_enforcement, SodEnforcement::Warn);
                assert!(config.ledger.require_close_checklist);
            },
        );
    }

    #[test]
    fn test_ledger_defaults() {
        let policy = LedgerPolicyConfig::default();
        assert!(policy.require_close_checklist);
        assert_eq!(policy.sod_enforcement, SodEnforcement::Block);
    }
}
