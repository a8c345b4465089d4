//! Application configuration management.

use serde::Deserialize;

use crate::types::Tolerance;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Ledger posting rules.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Ledger posting rules.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Maximum debit/credit difference still treated as balanced.
    #[serde(default)]
    pub balance_tolerance: Tolerance,
    /// How many times a write that lost an optimistic concurrency race is
    /// reloaded, revalidated and retried before the conflict is surfaced.
    #[serde(default = "default_max_conflict_retries")]
    pub max_conflict_retries: u32,
    /// Closing a period also requires its trial balance to balance.
    #[serde(default = "default_true")]
    pub require_balanced_trial_balance_on_close: bool,
    /// Count current net income (revenue - expenses) on the equity side of
    /// the accounting equation when finalizing a trial balance.
    #[serde(default)]
    pub include_net_income_in_equity: bool,
}

fn default_max_conflict_retries() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            balance_tolerance: Tolerance::default(),
            max_conflict_retries: default_max_conflict_retries(),
            require_balanced_trial_balance_on_close: true,
            include_net_income_in_equity: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Fallback `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_filter() -> String {
    "tally=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            json: false,
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
            .add_source(config::Environment::with_prefix("TALLY").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.ledger.balance_tolerance.value(), dec!(0.01));
        assert_eq!(config.ledger.max_conflict_retries, 1);
        assert!(config.ledger.require_balanced_trial_balance_on_close);
        assert!(!config.ledger.include_net_income_in_equity);
        assert_eq!(config.logging.filter, "tally=info");
        assert!(!config.logging.json);
    }

    #[test]
    fn test_load_with_empty_environment() {
        temp_env::with_vars_unset(
            [
                "TALLY__LEDGER__MAX_CONFLICT_RETRIES",
                "TALLY__LEDGER__BALANCE_TOLERANCE",
                "TALLY__LOGGING__JSON",
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.ledger.max_conflict_retries, 1);
                assert_eq!(config.ledger.balance_tolerance.value(), dec!(0.01));
            },
        );
    }

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("TALLY__LEDGER__MAX_CONFLICT_RETRIES", Some("3")),
                ("TALLY__LEDGER__BALANCE_TOLERANCE", Some("0.05")),
                ("TALLY__LOGGING__JSON", Some("true")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.ledger.max_conflict_retries, 3);
                assert_eq!(config.ledger.balance_tolerance.value(), dec!(0.05));
                assert!(config.logging.json);
            },
        );
    }

    #[test]
    fn test_load_rejects_non_positive_tolerance() {
        temp_env::with_var("TALLY__LEDGER__BALANCE_TOLERANCE", Some("0"), || {
            assert!(AppConfig::load().is_err());
        });
    }
}
