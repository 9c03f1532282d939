//! Runtime configuration for the push orchestrator.
//!
//! Timeouts default to the values the platform documents for staging and
//! startup, and can be overridden from the environment with humantime
//! durations such as `90s` or `20m`.

use std::time::Duration;

use thiserror::Error;
use tracing::debug;

pub const STAGING_TIMEOUT_ENV: &str = "DECKHAND_STAGING_TIMEOUT";
pub const STARTUP_TIMEOUT_ENV: &str = "DECKHAND_STARTUP_TIMEOUT";

pub const DEFAULT_STAGING_TIMEOUT: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Events buffered between the push worker and its consumer.
pub const DEFAULT_EVENT_BUFFER: usize = 1;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
  #[error("invalid duration '{value}' in {var}: {message}")]
  InvalidDuration {
    var: String,
    value: String,
    message: String,
  },
}

/// Knobs for a push run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushConfig {
  /// Upper bound on waiting for a package to stage.
  pub staging_timeout: Duration,
  /// Upper bound on waiting for instances to start or a deployment to finish.
  pub startup_timeout: Duration,
  /// Capacity of the event channel; at least 1.
  pub event_buffer: usize,
}

impl Default for PushConfig {
  fn default() -> Self {
    Self {
      staging_timeout: DEFAULT_STAGING_TIMEOUT,
      startup_timeout: DEFAULT_STARTUP_TIMEOUT,
      event_buffer: DEFAULT_EVENT_BUFFER,
    }
  }
}

impl PushConfig {
  /// Defaults, overridden by `DECKHAND_STAGING_TIMEOUT` and
  /// `DECKHAND_STARTUP_TIMEOUT` when set.
  pub fn from_env() -> Result<Self, ConfigError> {
    let mut config = Self::default();

    if let Some(timeout) = duration_from_env(STAGING_TIMEOUT_ENV)? {
      config.staging_timeout = timeout;
    }
    if let Some(timeout) = duration_from_env(STARTUP_TIMEOUT_ENV)? {
      config.startup_timeout = timeout;
    }

    debug!(
      staging_timeout = %humantime::format_duration(config.staging_timeout),
      startup_timeout = %humantime::format_duration(config.startup_timeout),
      "loaded push config"
    );
    Ok(config)
  }

  pub fn with_staging_timeout(mut self, timeout: Duration) -> Self {
    self.staging_timeout = timeout;
    self
  }

  pub fn with_startup_timeout(mut self, timeout: Duration) -> Self {
    self.startup_timeout = timeout;
    self
  }
}

/// Parse a humantime duration, naming `var` in the error.
pub fn parse_duration(var: &str, value: &str) -> Result<Duration, ConfigError> {
  humantime::parse_duration(value.trim()).map_err(|e| ConfigError::InvalidDuration {
    var: var.to_string(),
    value: value.to_string(),
    message: e.to_string(),
  })
}

fn duration_from_env(var: &str) -> Result<Option<Duration>, ConfigError> {
  match std::env::var(var) {
    Ok(value) if !value.trim().is_empty() => parse_duration(var, &value).map(Some),
    _ => Ok(None),
  }
}
