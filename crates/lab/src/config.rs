//! Lab configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `PULSE_STATE_DIR` - Directory holding the persisted key-value entries (default: .pulse)
//! - `PULSE_TICK_MS` - Scan progress tick interval in milliseconds (default: 80)
//! - `PULSE_SETTLE_MS` - Delay between the last phase and completion (default: 1000)
//! - `PULSE_SYNTHESIS_DELAY_MS` - Simulated synthesis latency (default: 2500)
//! - `PULSE_VISION_DELAY_MS` - Simulated bottle recognition latency (default: 1800)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::scan::ScanTiming;

const DEFAULT_STATE_DIR: &str = ".pulse";
const DEFAULT_SYNTHESIS_DELAY_MS: u64 = 2500;
const DEFAULT_VISION_DELAY_MS: u64 = 1800;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Lab configuration.
#[derive(Debug, Clone)]
pub struct LabConfig {
    /// Directory for the file-backed key-value store
    pub state_dir: PathBuf,
    /// Tick interval and settle delay for the scan flow
    pub scan: ScanTiming,
    /// Simulated latency of scent-DNA synthesis
    pub synthesis_delay: Duration,
    /// Simulated latency of bottle recognition
    pub vision_delay: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            scan: ScanTiming::default(),
            synthesis_delay: Duration::from_millis(DEFAULT_SYNTHESIS_DELAY_MS),
            vision_delay: Duration::from_millis(DEFAULT_VISION_DELAY_MS),
            sentry_dsn: None,
        }
    }
}

impl LabConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a duration variable is not a whole number of
    /// milliseconds or the tick interval is zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let defaults = Self::default();

        let state_dir = get_optional_env("PULSE_STATE_DIR").map_or(defaults.state_dir, PathBuf::from);
        let tick = get_duration_ms("PULSE_TICK_MS", defaults.scan.tick)?;
        if tick.is_zero() {
            return Err(ConfigError::InvalidEnvVar(
                "PULSE_TICK_MS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let settle = get_duration_ms("PULSE_SETTLE_MS", defaults.scan.settle)?;

        Ok(Self {
            state_dir,
            scan: ScanTiming { tick, settle },
            synthesis_delay: get_duration_ms("PULSE_SYNTHESIS_DELAY_MS", defaults.synthesis_delay)?,
            vision_delay: get_duration_ms("PULSE_VISION_DELAY_MS", defaults.vision_delay)?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
        })
    }

    /// Configuration with every simulated delay removed.
    ///
    /// The tick interval stays at one millisecond so that interval-based
    /// drivers remain well-formed.
    #[must_use]
    pub fn instant(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
            scan: ScanTiming {
                tick: Duration::from_millis(1),
                settle: Duration::ZERO,
            },
            synthesis_delay: Duration::ZERO,
            vision_delay: Duration::ZERO,
            sentry_dsn: None,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Parse a millisecond duration variable, falling back to `default`.
fn get_duration_ms(key: &str, default: Duration) -> Result<Duration, ConfigError> {
    get_optional_env(key).map_or(Ok(default), |raw| parse_millis(key, &raw))
}

fn parse_millis(key: &str, raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_flow_timings() {
        let config = LabConfig::default();
        assert_eq!(config.scan.tick, Duration::from_millis(80));
        assert_eq!(config.scan.settle, Duration::from_millis(1000));
        assert_eq!(config.synthesis_delay, Duration::from_millis(2500));
        assert_eq!(config.vision_delay, Duration::from_millis(1800));
        assert_eq!(config.state_dir, PathBuf::from(".pulse"));
    }

    #[test]
    fn test_parse_millis() {
        assert_eq!(
            parse_millis("PULSE_TICK_MS", " 40 ").unwrap(),
            Duration::from_millis(40)
        );
        let err = parse_millis("PULSE_TICK_MS", "fast").unwrap_err();
        assert!(err.to_string().contains("PULSE_TICK_MS"));
    }

    #[test]
    fn test_instant_has_no_delays() {
        let config = LabConfig::instant("/tmp/pulse");
        assert!(config.synthesis_delay.is_zero());
        assert!(config.scan.settle.is_zero());
        assert!(!config.scan.tick.is_zero());
    }
}
