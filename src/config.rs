//! Configuration Module
//!
//! Cache creation options and the demo server's environment configuration.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{CacheError, Result};

// == Store Mode ==
/// How entries sharing a key are stored. Fixed at cache creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreMode {
    /// One entry per key, `put` overwrites
    #[default]
    Single,
    /// Ordered sequence of entries per key, `put` appends
    Multi,
}

impl FromStr for StoreMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" | "single-value" | "set" => Ok(StoreMode::Single),
            "multi" | "multi-value" | "bag" => Ok(StoreMode::Multi),
            other => Err(format!("unknown store mode '{}'", other)),
        }
    }
}

// == Size Limit ==
/// Upper bound on physical entries and how much to reclaim once exceeded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeLimit {
    /// Maximum number of entries before a reclaim is requested
    pub max_size: usize,
    /// Fraction of `max_size` removed per reclaim, in (0, 1]
    pub reclaim_fraction: f64,
}

impl SizeLimit {
    pub fn new(max_size: usize, reclaim_fraction: f64) -> Self {
        Self {
            max_size,
            reclaim_fraction,
        }
    }

    /// Number of oldest entries removed by one reclaim pass.
    pub fn reclaim_count(&self) -> usize {
        (self.max_size as f64 * self.reclaim_fraction).ceil() as usize
    }

    fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(CacheError::InvalidLimit);
        }
        // NaN fails both comparisons and is rejected here too
        if !(self.reclaim_fraction > 0.0 && self.reclaim_fraction <= 1.0) {
            return Err(CacheError::InvalidReclaimFraction(self.reclaim_fraction));
        }
        Ok(())
    }
}

// == Backend Options ==
/// Options forwarded to the underlying concurrent map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendOptions {
    /// Number of map shards; `None` lets the map pick from the CPU count
    pub shard_amount: Option<usize>,
    /// Capacity reserved up front
    pub initial_capacity: usize,
}

// == Cache Config ==
/// Options recognized at cache creation.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Cache identity used in events and logs
    pub name: String,
    /// Single- or multi-value storage
    pub mode: StoreMode,
    /// TTL for entries put without one, `None` = never expire
    pub default_ttl: Option<Duration>,
    /// Period between expiration sweeps
    pub sweep_interval: Option<Duration>,
    /// Optional size bound
    pub limit: Option<SizeLimit>,
    /// Throttle window between two reclaim passes
    pub min_reclaim_interval: Duration,
    /// Pass-through options for the concurrent map
    pub backend: BackendOptions,
}

impl CacheConfig {
    /// Creates a config with the given name and every other option at its default.
    ///
    /// The sweep interval has no default and must be set before validation.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: StoreMode::Single,
            default_ttl: None,
            sweep_interval: None,
            limit: None,
            min_reclaim_interval: Duration::ZERO,
            backend: BackendOptions::default(),
        }
    }

    /// Checks the options, failing fast on anything the cache cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CacheError::MissingName);
        }

        match self.sweep_interval {
            Some(interval) if !interval.is_zero() => {}
            _ => return Err(CacheError::MissingSweepInterval),
        }

        if let Some(limit) = &self.limit {
            limit.validate()?;
        }

        if let Some(shards) = self.backend.shard_amount {
            if shards < 2 || !shards.is_power_of_two() {
                return Err(CacheError::InvalidShardAmount(shards));
            }
        }

        Ok(())
    }
}

// == Server Config ==
/// Demo server configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Name of the served cache
    pub cache_name: String,
    /// Storage mode of the served cache
    pub mode: StoreMode,
    /// Maximum entries, 0 disables the size limit
    pub max_entries: usize,
    /// Fraction of `max_entries` reclaimed on overflow
    pub reclaim_fraction: f64,
    /// Default TTL in milliseconds, 0 = never expire
    pub default_ttl_ms: u64,
    /// Expiration sweep interval in milliseconds
    pub sweep_interval_ms: u64,
    /// Reclaim throttle window in milliseconds
    pub min_reclaim_interval_ms: u64,
    /// Shard amount for the concurrent map, 0 = automatic
    pub shard_amount: usize,
    /// HTTP server port
    pub server_port: u16,
}

impl ServerConfig {
    /// Creates a new ServerConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_NAME` - Cache identity (default: "default")
    /// - `CACHE_MODE` - `single` or `multi` (default: single)
    /// - `MAX_ENTRIES` - Size limit, 0 disables it (default: 1000)
    /// - `RECLAIM_FRACTION` - Reclaim fraction (default: 0.1)
    /// - `DEFAULT_TTL_MS` - Default TTL, 0 = infinite (default: 300000)
    /// - `SWEEP_INTERVAL_MS` - Sweep period (default: 1000)
    /// - `MIN_RECLAIM_INTERVAL_MS` - Reclaim throttle (default: 0)
    /// - `SHARD_AMOUNT` - Map shards, 0 = automatic (default: 0)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_name: env::var("CACHE_NAME").unwrap_or(defaults.cache_name),
            mode: env_parse("CACHE_MODE").unwrap_or(defaults.mode),
            max_entries: env_parse("MAX_ENTRIES").unwrap_or(defaults.max_entries),
            reclaim_fraction: env_parse("RECLAIM_FRACTION").unwrap_or(defaults.reclaim_fraction),
            default_ttl_ms: env_parse("DEFAULT_TTL_MS").unwrap_or(defaults.default_ttl_ms),
            sweep_interval_ms: env_parse("SWEEP_INTERVAL_MS")
                .unwrap_or(defaults.sweep_interval_ms),
            min_reclaim_interval_ms: env_parse("MIN_RECLAIM_INTERVAL_MS")
                .unwrap_or(defaults.min_reclaim_interval_ms),
            shard_amount: env_parse("SHARD_AMOUNT").unwrap_or(defaults.shard_amount),
            server_port: env_parse("SERVER_PORT").unwrap_or(defaults.server_port),
        }
    }

    /// Translates the flat environment settings into cache options.
    pub fn cache_config(&self) -> CacheConfig {
        let mut config = CacheConfig::new(self.cache_name.clone());
        config.mode = self.mode;
        config.default_ttl =
            (self.default_ttl_ms > 0).then(|| Duration::from_millis(self.default_ttl_ms));
        config.sweep_interval = Some(Duration::from_millis(self.sweep_interval_ms));
        config.limit = (self.max_entries > 0)
            .then(|| SizeLimit::new(self.max_entries, self.reclaim_fraction));
        config.min_reclaim_interval = Duration::from_millis(self.min_reclaim_interval_ms);
        config.backend.shard_amount = (self.shard_amount > 0).then_some(self.shard_amount);
        config
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            cache_name: "default".to_string(),
            mode: StoreMode::Single,
            max_entries: 1000,
            reclaim_fraction: 0.1,
            default_ttl_ms: 300_000,
            sweep_interval_ms: 1000,
            min_reclaim_interval_ms: 0,
            shard_amount: 0,
            server_port: 3000,
        }
    }
}

fn env_parse<T: FromStr>(var: &str) -> Option<T> {
    env::var(var).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> CacheConfig {
        let mut config = CacheConfig::new("test");
        config.sweep_interval = Some(Duration::from_millis(100));
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut config = valid_config();
        config.name = "  ".to_string();
        assert_eq!(config.validate(), Err(CacheError::MissingName));
    }

    #[test]
    fn test_missing_sweep_interval_rejected() {
        let mut config = valid_config();
        config.sweep_interval = None;
        assert_eq!(config.validate(), Err(CacheError::MissingSweepInterval));

        config.sweep_interval = Some(Duration::ZERO);
        assert_eq!(config.validate(), Err(CacheError::MissingSweepInterval));
    }

    #[test]
    fn test_reclaim_fraction_bounds() {
        let mut config = valid_config();

        config.limit = Some(SizeLimit::new(10, 1.0));
        assert!(config.validate().is_ok());

        config.limit = Some(SizeLimit::new(10, 0.0));
        assert_eq!(
            config.validate(),
            Err(CacheError::InvalidReclaimFraction(0.0))
        );

        config.limit = Some(SizeLimit::new(10, 1.01));
        assert!(matches!(
            config.validate(),
            Err(CacheError::InvalidReclaimFraction(_))
        ));

        config.limit = Some(SizeLimit::new(10, f64::NAN));
        assert!(matches!(
            config.validate(),
            Err(CacheError::InvalidReclaimFraction(_))
        ));
    }

    #[test]
    fn test_zero_max_size_rejected() {
        let mut config = valid_config();
        config.limit = Some(SizeLimit::new(0, 0.5));
        assert_eq!(config.validate(), Err(CacheError::InvalidLimit));
    }

    #[test]
    fn test_shard_amount_must_be_power_of_two() {
        let mut config = valid_config();
        config.backend.shard_amount = Some(6);
        assert_eq!(config.validate(), Err(CacheError::InvalidShardAmount(6)));

        config.backend.shard_amount = Some(1);
        assert_eq!(config.validate(), Err(CacheError::InvalidShardAmount(1)));

        config.backend.shard_amount = Some(16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_reclaim_count_rounds_up() {
        assert_eq!(SizeLimit::new(10, 0.5).reclaim_count(), 5);
        assert_eq!(SizeLimit::new(10, 0.25).reclaim_count(), 3);
        assert_eq!(SizeLimit::new(3, 1.0).reclaim_count(), 3);
        assert_eq!(SizeLimit::new(1, 0.01).reclaim_count(), 1);
    }

    #[test]
    fn test_store_mode_from_str() {
        assert_eq!("single".parse::<StoreMode>(), Ok(StoreMode::Single));
        assert_eq!("Multi-Value".parse::<StoreMode>(), Ok(StoreMode::Multi));
        assert_eq!("bag".parse::<StoreMode>(), Ok(StoreMode::Multi));
        assert!("lru".parse::<StoreMode>().is_err());
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.max_entries, 1000);
        assert_eq!(config.sweep_interval_ms, 1000);
        assert_eq!(config.server_port, 3000);
        assert!(config.cache_config().validate().is_ok());
    }

    #[test]
    fn test_server_config_to_cache_config() {
        let config = ServerConfig {
            max_entries: 0,
            default_ttl_ms: 0,
            shard_amount: 8,
            ..ServerConfig::default()
        };
        let cache_config = config.cache_config();
        assert!(cache_config.limit.is_none());
        assert!(cache_config.default_ttl.is_none());
        assert_eq!(cache_config.backend.shard_amount, Some(8));
        assert_eq!(cache_config.sweep_interval, Some(Duration::from_secs(1)));
    }
}
