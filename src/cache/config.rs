//! Construction-time cache settings.

use std::time::Duration;

use serde::Deserialize;

use super::ConfigError;

/// Settings fixed for the lifetime of a [`CacheProxy`](super::CacheProxy).
///
/// `ttl` is both the width of the cache-key time bucket and the lifetime
/// advertised to clients through `Cache-Control: max-age` and `Expires`.
/// `capacity` bounds the number of distinct keys retained.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use cacheproxy::cache::CacheConfig;
///
/// let config = CacheConfig::from_json(r#"{ "ttl": "1m", "capacity": 512 }"#).unwrap();
/// assert_eq!(config.ttl(), Duration::from_secs(60));
/// assert_eq!(config.capacity(), 512);
///
/// assert!(CacheConfig::new(Duration::ZERO, 10).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CacheConfig {
    #[serde(with = "humantime_serde")]
    ttl: Duration,
    capacity: usize,
}

impl CacheConfig {
    /// Validates and builds a configuration.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ZeroTtl`] or [`ConfigError::ZeroCapacity`] when either
    /// value is not positive.
    pub fn new(ttl: Duration, capacity: usize) -> Result<Self, ConfigError> {
        let config = Self { ttl, capacity };
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a JSON document such as `{"ttl": "30s", "capacity": 1024}`.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks both settings are positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ttl.is_zero() {
            return Err(ConfigError::ZeroTtl);
        }
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The `max-age` value in whole seconds, truncating any fractional part.
    pub fn max_age_secs(&self) -> u64 {
        self.ttl.as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_ttl() {
        assert!(matches!(
            CacheConfig::new(Duration::ZERO, 8),
            Err(ConfigError::ZeroTtl)
        ));
    }

    #[test]
    fn rejects_zero_capacity() {
        assert!(matches!(
            CacheConfig::new(Duration::from_secs(1), 0),
            Err(ConfigError::ZeroCapacity)
        ));
    }

    #[test]
    fn parses_human_durations() {
        let config = CacheConfig::from_json(r#"{"ttl": "1500ms", "capacity": 3}"#).unwrap();
        assert_eq!(config.ttl(), Duration::from_millis(1500));
        assert_eq!(config.max_age_secs(), 1);
    }

    #[test]
    fn json_is_validated() {
        assert!(matches!(
            CacheConfig::from_json(r#"{"ttl": "10s", "capacity": 0}"#),
            Err(ConfigError::ZeroCapacity)
        ));
        assert!(matches!(
            CacheConfig::from_json(r#"{"ttl": "soon", "capacity": 1}"#),
            Err(ConfigError::Parse(_))
        ));
    }
}
