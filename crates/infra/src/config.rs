//! Configuration loading and representation.
//!
//! Everything comes from environment variables; unset variables fall back to
//! dev-friendly defaults (in-memory store and cache on port 8080).

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::cache::PRODUCTS_TTL;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Where products are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    InMemory,
    Postgres {
        database_url: String,
        max_connections: u32,
    },
}

/// Where the product listing is cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheBackend {
    InMemory,
    Redis { url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub store: StoreBackend,
    pub cache: CacheBackend,
    pub products_cache_ttl: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            store: StoreBackend::InMemory,
            cache: CacheBackend::InMemory,
            products_cache_ttl: PRODUCTS_TTL,
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    ///
    /// Recognised keys: `BIND_ADDR`, `USE_PERSISTENT_STORES`, `DATABASE_URL`,
    /// `DATABASE_MAX_CONNECTIONS`, `CACHE_DRIVER`, `REDIS_URL`,
    /// `PRODUCTS_CACHE_TTL_SECS`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup("BIND_ADDR") {
            config.bind_addr = raw.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                key: "BIND_ADDR",
                value: raw.clone(),
                reason: e.to_string(),
            })?;
        }

        let use_persistent = match lookup("USE_PERSISTENT_STORES") {
            Some(raw) => parse_bool("USE_PERSISTENT_STORES", &raw)?,
            None => false,
        };
        if use_persistent {
            let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
            let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
                Some(raw) => parse_number("DATABASE_MAX_CONNECTIONS", &raw)?,
                None => 10,
            };
            config.store = StoreBackend::Postgres {
                database_url,
                max_connections,
            };
        }

        config.cache = match lookup("CACHE_DRIVER").as_deref().map(str::trim) {
            None | Some("") | Some("memory") => CacheBackend::InMemory,
            Some("redis") => CacheBackend::Redis {
                url: lookup("REDIS_URL").unwrap_or_else(|| "redis://localhost:6379".to_string()),
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "CACHE_DRIVER",
                    value: other.to_string(),
                    reason: "expected one of: memory, redis".to_string(),
                });
            }
        };

        if let Some(raw) = lookup("PRODUCTS_CACHE_TTL_SECS") {
            let secs: u64 = parse_number("PRODUCTS_CACHE_TTL_SECS", &raw)?;
            config.products_cache_ttl = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

fn parse_number<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_are_in_memory_with_ten_minute_ttl() {
        let config = load(&[]).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.products_cache_ttl, Duration::from_secs(600));
        assert_eq!(config.bind_addr.port(), 8080);
    }

    #[test]
    fn persistent_stores_require_database_url() {
        let err = load(&[("USE_PERSISTENT_STORES", "true")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABASE_URL"));

        let config = load(&[
            ("USE_PERSISTENT_STORES", "true"),
            ("DATABASE_URL", "postgres://localhost/stockroom"),
        ])
        .unwrap();
        assert_eq!(
            config.store,
            StoreBackend::Postgres {
                database_url: "postgres://localhost/stockroom".to_string(),
                max_connections: 10,
            }
        );
    }

    #[test]
    fn redis_driver_uses_default_url() {
        let config = load(&[("CACHE_DRIVER", "redis")]).unwrap();
        assert_eq!(
            config.cache,
            CacheBackend::Redis {
                url: "redis://localhost:6379".to_string()
            }
        );
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(matches!(
            load(&[("CACHE_DRIVER", "memcached")]),
            Err(ConfigError::Invalid { key: "CACHE_DRIVER", .. })
        ));
        assert!(matches!(
            load(&[("PRODUCTS_CACHE_TTL_SECS", "ten")]),
            Err(ConfigError::Invalid { key: "PRODUCTS_CACHE_TTL_SECS", .. })
        ));
        assert!(matches!(
            load(&[("BIND_ADDR", "nowhere")]),
            Err(ConfigError::Invalid { key: "BIND_ADDR", .. })
        ));
        assert!(matches!(
            load(&[("USE_PERSISTENT_STORES", "maybe")]),
            Err(ConfigError::Invalid { key: "USE_PERSISTENT_STORES", .. })
        ));
    }

    #[test]
    fn ttl_override_is_applied() {
        let config = load(&[("PRODUCTS_CACHE_TTL_SECS", "30")]).unwrap();
        assert_eq!(config.products_cache_ttl, Duration::from_secs(30));
    }
}
