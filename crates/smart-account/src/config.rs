//! # Account Configuration
//!
//! Runtime knobs with sane defaults and environment overrides.

use crate::errors::ConfigError;
use std::env;

/// Default EIP-3860 init code limit (2 * 24 KB).
pub const DEFAULT_MAX_INIT_CODE_SIZE: usize = 49_152;

/// Default capacity of the event broadcast channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Account configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountConfig {
    /// Reject gated operations entered while `execute` is in progress.
    pub reentrancy_guard: bool,
    /// Reject high-S signatures (EIP-2).
    pub strict_low_s: bool,
    /// Largest init code the in-memory substrate accepts.
    pub max_init_code_size: usize,
    /// Buffered events per subscriber before lagging.
    pub event_capacity: usize,
    /// Log filter directive (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            reentrancy_guard: true,
            strict_low_s: true,
            max_init_code_size: DEFAULT_MAX_INIT_CODE_SIZE,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            log_level: "info".to_string(),
        }
    }
}

impl AccountConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SA_REENTRANCY_GUARD`: Enable the reentrancy lock (default: true)
    /// - `SA_STRICT_LOW_S`: Reject high-S signatures (default: true)
    /// - `SA_MAX_INIT_CODE_SIZE`: Init code limit in bytes (default: 49152)
    /// - `SA_EVENT_CAPACITY`: Event channel capacity (default: 1024)
    /// - `SA_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`AccountConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            reentrancy_guard: parse_or(
                &lookup,
                "SA_REENTRANCY_GUARD",
                defaults.reentrancy_guard,
                parse_bool,
            )?,
            strict_low_s: parse_or(
                &lookup,
                "SA_STRICT_LOW_S",
                defaults.strict_low_s,
                parse_bool,
            )?,
            max_init_code_size: parse_or(
                &lookup,
                "SA_MAX_INIT_CODE_SIZE",
                defaults.max_init_code_size,
                |v| v.parse().ok(),
            )?,
            event_capacity: parse_or(
                &lookup,
                "SA_EVENT_CAPACITY",
                defaults.event_capacity,
                |v| v.parse().ok(),
            )?,
            log_level: lookup("SA_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),
        };

        config.validate()?;
        Ok(config)
    }

    /// Rejects values the account cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.event_capacity == 0 {
            return Err(ConfigError::ZeroEventCapacity);
        }
        if self.max_init_code_size == 0 {
            return Err(ConfigError::ZeroInitCodeLimit);
        }
        Ok(())
    }
}

fn parse_or<F, T, P>(lookup: &F, key: &str, default: T, parse: P) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    P: Fn(&str) -> Option<T>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => parse(raw.trim()).ok_or(ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        }),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AccountConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AccountConfig::default());
        assert!(config.reentrancy_guard);
        assert!(config.strict_low_s);
        assert_eq!(config.max_init_code_size, 49_152);
    }

    #[test]
    fn test_overrides() {
        let config = AccountConfig::from_lookup(lookup(&[
            ("SA_REENTRANCY_GUARD", "off"),
            ("SA_STRICT_LOW_S", "FALSE"),
            ("SA_MAX_INIT_CODE_SIZE", "1024"),
            ("SA_EVENT_CAPACITY", " 16 "),
            ("RUST_LOG", "debug"),
        ]))
        .unwrap();
        assert!(!config.reentrancy_guard);
        assert!(!config.strict_low_s);
        assert_eq!(config.max_init_code_size, 1024);
        assert_eq!(config.event_capacity, 16);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_sa_log_level_wins_over_rust_log() {
        let config =
            AccountConfig::from_lookup(lookup(&[("SA_LOG_LEVEL", "warn"), ("RUST_LOG", "trace")]))
                .unwrap();
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = AccountConfig::from_lookup(lookup(&[("SA_REENTRANCY_GUARD", "maybe")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "SA_REENTRANCY_GUARD".to_string(),
                value: "maybe".to_string(),
            }
        );

        assert!(AccountConfig::from_lookup(lookup(&[("SA_EVENT_CAPACITY", "-1")])).is_err());
    }

    #[test]
    fn test_zero_limits_rejected() {
        assert_eq!(
            AccountConfig::from_lookup(lookup(&[("SA_EVENT_CAPACITY", "0")])),
            Err(ConfigError::ZeroEventCapacity)
        );
        assert_eq!(
            AccountConfig::from_lookup(lookup(&[("SA_MAX_INIT_CODE_SIZE", "0")])),
            Err(ConfigError::ZeroInitCodeLimit)
        );
    }
}
