use std::{env, str::FromStr, time::Duration};

use thiserror::Error;
use url::Url;

use crate::aggregator::{AggregationPolicy, AggregatorSettings};
use crate::upstream::EntityTtls;

const DEFAULT_UPSTREAM_BASE_URL: &str = "http://localhost:4000";

/// Errors raised while reading configuration from the environment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the upstream provider (default: "http://localhost:4000")
    pub upstream_base_url: Url,
    /// Upstream request timeout in seconds (default: 10)
    pub upstream_timeout_seconds: u64,
    /// Maximum number of in-memory cache entries (default: 10,000)
    pub cache_max_entries: usize,
    /// Redis connection URL (default: "redis://localhost:6379")
    /// Note: Only used when the `redis` feature is enabled.
    #[cfg_attr(not(feature = "redis"), allow(dead_code))]
    pub redis_url: String,
    /// Club list TTL in seconds (default: 3600)
    pub clubs_ttl_seconds: u64,
    /// Court list TTL in seconds (default: 3600)
    pub courts_ttl_seconds: u64,
    /// Slot list TTL in seconds (default: 300)
    pub slots_ttl_seconds: u64,
    /// Composed query result TTL in seconds (default: 300)
    pub query_ttl_seconds: u64,
    /// Upstream fetches allowed in flight at once (default: 32)
    pub max_concurrent_fetches: usize,
    /// Partial failure policy (default: fail_fast)
    pub aggregation_policy: AggregationPolicy,
    /// Coalesce concurrent misses of the same query (default: true)
    pub single_flight: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `UPSTREAM_BASE_URL` - Upstream provider base URL (default: "http://localhost:4000")
    /// - `UPSTREAM_TIMEOUT_SECS` - Upstream request timeout (default: 10)
    /// - `CACHE_MAX_ENTRIES` - Maximum in-memory cache entries (default: 10,000)
    /// - `REDIS_URL` - Redis connection URL (default: "redis://localhost:6379")
    /// - `CLUBS_TTL_SECONDS` / `COURTS_TTL_SECONDS` - Entity TTLs (default: 3600)
    /// - `SLOTS_TTL_SECONDS` / `QUERY_TTL_SECONDS` - Slot and query TTLs (default: 300)
    /// - `MAX_CONCURRENT_FETCHES` - Upstream concurrency limit (default: 32)
    /// - `AGGREGATION_POLICY` - `fail_fast` or `best_effort` (default: fail_fast)
    /// - `SINGLE_FLIGHT` - `true` or `false` (default: true)
    ///
    /// Unset variables take their default; set but unparsable ones are an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            upstream_base_url: parse_var(&lookup, "UPSTREAM_BASE_URL", defaults.upstream_base_url)?,
            upstream_timeout_seconds: parse_var(
                &lookup,
                "UPSTREAM_TIMEOUT_SECS",
                defaults.upstream_timeout_seconds,
            )?,
            cache_max_entries: positive(
                "CACHE_MAX_ENTRIES",
                parse_var(&lookup, "CACHE_MAX_ENTRIES", defaults.cache_max_entries)?,
            )?,
            redis_url: lookup("REDIS_URL").unwrap_or(defaults.redis_url),
            clubs_ttl_seconds: parse_var(&lookup, "CLUBS_TTL_SECONDS", defaults.clubs_ttl_seconds)?,
            courts_ttl_seconds: parse_var(
                &lookup,
                "COURTS_TTL_SECONDS",
                defaults.courts_ttl_seconds,
            )?,
            slots_ttl_seconds: parse_var(&lookup, "SLOTS_TTL_SECONDS", defaults.slots_ttl_seconds)?,
            query_ttl_seconds: parse_var(&lookup, "QUERY_TTL_SECONDS", defaults.query_ttl_seconds)?,
            max_concurrent_fetches: positive(
                "MAX_CONCURRENT_FETCHES",
                parse_var(
                    &lookup,
                    "MAX_CONCURRENT_FETCHES",
                    defaults.max_concurrent_fetches,
                )?,
            )?,
            aggregation_policy: parse_var(
                &lookup,
                "AGGREGATION_POLICY",
                defaults.aggregation_policy,
            )?,
            single_flight: match lookup("SINGLE_FLIGHT") {
                None => defaults.single_flight,
                Some(value) => parse_bool("SINGLE_FLIGHT", value)?,
            },
        })
    }

    /// Get the upstream request timeout as a Duration.
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_seconds)
    }

    /// Get the entity cache TTLs.
    pub fn entity_ttls(&self) -> EntityTtls {
        EntityTtls {
            clubs: Duration::from_secs(self.clubs_ttl_seconds),
            courts: Duration::from_secs(self.courts_ttl_seconds),
            slots: Duration::from_secs(self.slots_ttl_seconds),
        }
    }

    /// Get the aggregator settings.
    pub fn aggregator_settings(&self) -> AggregatorSettings {
        AggregatorSettings {
            query_ttl: Duration::from_secs(self.query_ttl_seconds),
            max_concurrent_fetches: self.max_concurrent_fetches,
            policy: self.aggregation_policy,
            single_flight: self.single_flight,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let ttls = EntityTtls::default();
        let settings = AggregatorSettings::default();
        Self {
            upstream_base_url: Url::parse(DEFAULT_UPSTREAM_BASE_URL)
                .expect("default upstream URL is valid"),
            upstream_timeout_seconds: 10,
            cache_max_entries: 10_000,
            redis_url: "redis://localhost:6379".to_string(),
            clubs_ttl_seconds: ttls.clubs.as_secs(),
            courts_ttl_seconds: ttls.courts.as_secs(),
            slots_ttl_seconds: ttls.slots.as_secs(),
            query_ttl_seconds: settings.query_ttl.as_secs(),
            max_concurrent_fetches: settings.max_concurrent_fetches,
            aggregation_policy: settings.policy,
            single_flight: settings.single_flight,
        }
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value,
        }),
    }
}

fn parse_bool(name: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value,
            reason: "expected true or false".to_string(),
        }),
    }
}

fn positive(name: &'static str, value: usize) -> Result<usize, ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}
