//! # Core Configuration Module
//!
//! Provides configuration management for the cache-or-fetch coordinator.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance. It enforces fail-fast validation so that a misconfigured service
//! is rejected before any state is created.
//!
//! ## Settings
//!
//! - `event_buffer_size` - Capacity of the event bus channel (default: 100)
//! - `fetch_timeout` - Deadline applied to every origin fetch (default: none)
//! - `default_max_age` - Age after which cached content needs a refresh when
//!   the integration uses the time-based freshness policy (default: none)
//! - `logging` - Logging configuration
//!
//! ## Usage
//!
//! ```
//! use core_runtime::config::CoreConfig;
//! use std::time::Duration;
//!
//! let config = CoreConfig::builder()
//!     .fetch_timeout(Duration::from_secs(10))
//!     .default_max_age(Duration::from_secs(300))
//!     .build()
//!     .expect("Failed to build config");
//!
//! assert_eq!(config.event_buffer_size, 100);
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! let config = CoreConfig::builder()
//!     .event_buffer_size(0)
//!     .build()
//!     .expect("Should fail - empty event buffer");
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use crate::logging::LoggingConfig;
use std::time::Duration;

/// Core configuration.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Capacity of the event bus broadcast channel
    pub event_buffer_size: usize,

    /// Deadline for a single origin fetch. `None` lets fetches run to completion.
    pub fetch_timeout: Option<Duration>,

    /// Maximum age of cached content for the time-based freshness policy
    pub default_max_age: Option<Duration>,

    /// Logging configuration used by `CoreService::bootstrap`
    pub logging: LoggingConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            fetch_timeout: None,
            default_max_age: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - The event buffer holds at least one event
    /// - A configured fetch timeout is non-zero
    /// - A configured max age is non-zero
    pub fn validate(&self) -> Result<()> {
        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.fetch_timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(Error::Config(
                "Fetch timeout must be greater than 0. Omit it to disable the deadline."
                    .to_string(),
            ));
        }

        if self.default_max_age.is_some_and(|age| age.is_zero()) {
            return Err(Error::Config(
                "Default max age must be greater than 0. Use an always-refresh policy instead."
                    .to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Call [`build()`](CoreConfigBuilder::build) to validate and create the
/// final config.
#[derive(Debug, Default)]
pub struct CoreConfigBuilder {
    event_buffer_size: Option<usize>,
    fetch_timeout: Option<Duration>,
    default_max_age: Option<Duration>,
    logging: Option<LoggingConfig>,
}

impl CoreConfigBuilder {
    /// Sets the event bus capacity.
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Sets the deadline applied to every origin fetch.
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Sets the maximum cache age for the time-based freshness policy.
    pub fn default_max_age(mut self, max_age: Duration) -> Self {
        self.default_max_age = Some(max_age);
        self
    }

    /// Sets the logging configuration.
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` when a setting is out of range.
    pub fn build(self) -> Result<CoreConfig> {
        let config = CoreConfig {
            event_buffer_size: self
                .event_buffer_size
                .unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            fetch_timeout: self.fetch_timeout,
            default_max_age: self.default_max_age,
            logging: self.logging.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}
