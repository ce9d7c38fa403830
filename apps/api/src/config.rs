use std::str::FromStr;

use anyhow::{Context, Result};

use crate::nesting::sheet::DEFAULT_DPI;

/// Application configuration loaded from environment variables.
/// Every variable is optional; invalid values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Resolution applied when a request does not carry its own `dpi`.
    pub default_dpi: f64,
    pub default_tolerance: f64,
    pub default_offset: f64,
    pub default_rotations: u32,
    /// Allocation deadline in seconds. 0 disables the deadline.
    pub pack_timeout_secs: u64,
    /// Forwarded to the oracle as `persist` on every attempt.
    pub oracle_persist: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            rust_log: "info".to_string(),
            default_dpi: DEFAULT_DPI,
            default_tolerance: 0.1,
            default_offset: 0.1,
            default_rotations: 4,
            pack_timeout_secs: 30,
            oracle_persist: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();

        let config = Config {
            port: parse_env("PORT", defaults.port)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or(defaults.rust_log),
            default_dpi: parse_env("DEFAULT_DPI", defaults.default_dpi)?,
            default_tolerance: parse_env("DEFAULT_TOLERANCE", defaults.default_tolerance)?,
            default_offset: parse_env("DEFAULT_OFFSET", defaults.default_offset)?,
            default_rotations: parse_env("DEFAULT_ROTATIONS", defaults.default_rotations)?,
            pack_timeout_secs: parse_env("PACK_TIMEOUT_SECS", defaults.pack_timeout_secs)?,
            oracle_persist: parse_env("ORACLE_PERSIST", defaults.oracle_persist)?,
        };

        if !(config.default_dpi.is_finite() && config.default_dpi > 0.0) {
            anyhow::bail!("DEFAULT_DPI must be a positive number");
        }

        Ok(config)
    }

    /// Deadline duration for one allocation run, if any.
    pub fn pack_timeout(&self) -> Option<std::time::Duration> {
        (self.pack_timeout_secs > 0).then(|| std::time::Duration::from_secs(self.pack_timeout_secs))
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_service_constants() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.default_dpi, 96.0);
        assert_eq!(config.default_rotations, 4);
        assert!(!config.oracle_persist);
    }

    #[test]
    fn test_pack_timeout_zero_disables_deadline() {
        let config = Config {
            pack_timeout_secs: 0,
            ..Config::default()
        };
        assert!(config.pack_timeout().is_none());
    }

    #[test]
    fn test_pack_timeout_seconds() {
        let config = Config {
            pack_timeout_secs: 5,
            ..Config::default()
        };
        assert_eq!(config.pack_timeout(), Some(std::time::Duration::from_secs(5)));
    }

    #[test]
    fn test_parse_env_missing_uses_default() {
        let value: u32 = parse_env("NESTING_API_TEST_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
    }
}
