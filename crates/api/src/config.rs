//! Application configuration loaded from environment variables.

use std::str::FromStr;

use common::Money;
use domain::PricingPolicy;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Which store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Memory,
    Postgres,
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `pretty` or `json` (default: `pretty`)
/// - `STORAGE_BACKEND`: `memory` or `postgres` (default: `memory`)
/// - `DATABASE_URL`: connection string, required for `postgres`
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: `5`)
/// - `SHIPPING_CENTS`: flat shipping charge (default: `1000`)
/// - `VAT_BASIS_POINTS`: VAT rate, 1300 = 13 % (default: `1300`)
///
/// Unparseable values fall back to the default.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub storage: StorageBackend,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub shipping_cents: i64,
    pub vat_basis_points: u32,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parsed(&lookup, "PORT").unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: match lookup("LOG_FORMAT").as_deref() {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
            storage: match lookup("STORAGE_BACKEND").as_deref() {
                Some("postgres") => StorageBackend::Postgres,
                _ => StorageBackend::Memory,
            },
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            database_max_connections: parsed(&lookup, "DATABASE_MAX_CONNECTIONS")
                .unwrap_or(defaults.database_max_connections),
            shipping_cents: parsed(&lookup, "SHIPPING_CENTS")
                .unwrap_or(defaults.shipping_cents),
            vat_basis_points: parsed(&lookup, "VAT_BASIS_POINTS")
                .unwrap_or(defaults.vat_basis_points),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the pricing policy applied to cart summaries.
    pub fn pricing(&self) -> PricingPolicy {
        PricingPolicy {
            shipping: Money::from_cents(self.shipping_cents),
            vat_basis_points: self.vat_basis_points,
        }
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        let pricing = PricingPolicy::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            storage: StorageBackend::Memory,
            database_url: None,
            database_max_connections: 5,
            shipping_cents: pricing.shipping.cents(),
            vat_basis_points: pricing.vat_basis_points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.pricing(), PricingPolicy::default());
    }

    #[test]
    fn test_empty_lookup_matches_defaults() {
        let config = from_pairs(&[]);
        assert_eq!(config.addr(), "0.0.0.0:3000");
        assert!(config.database_url.is_none());
        assert_eq!(config.shipping_cents, 1000);
        assert_eq!(config.vat_basis_points, 1300);
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("LOG_FORMAT", "json"),
            ("STORAGE_BACKEND", "postgres"),
            ("DATABASE_URL", "postgres://localhost/shop"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
            ("SHIPPING_CENTS", "0"),
            ("VAT_BASIS_POINTS", "2000"),
        ]);
        assert_eq!(config.addr(), "127.0.0.1:8080");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.storage, StorageBackend::Postgres);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/shop")
        );
        assert_eq!(config.database_max_connections, 12);

        let pricing = config.pricing();
        assert!(pricing.shipping.is_zero());
        assert_eq!(pricing.vat_basis_points, 2000);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = from_pairs(&[
            ("PORT", "not-a-port"),
            ("LOG_FORMAT", "xml"),
            ("STORAGE_BACKEND", "redis"),
            ("VAT_BASIS_POINTS", "-5"),
        ]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.vat_basis_points, 1300);
    }
}
