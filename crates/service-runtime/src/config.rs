//! # Service Configuration
//!
//! Unified configuration for the signing core, loaded from environment
//! variables with sane defaults.
//!
//! ## Security Requirements
//!
//! - `session_key` MUST NOT be empty or all-zero in production

use identity_telemetry::TelemetryConfig;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Complete service configuration.
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    /// Gateway configuration.
    pub gateway: GatewaySettings,
    /// Identifier lifecycle configuration.
    pub lifecycle: LifecycleSettings,
    /// Security configuration.
    pub security: SecuritySettings,
    /// UBCH provider configuration.
    pub ubch: UbchSettings,
    /// Telemetry configuration.
    pub telemetry: TelemetryConfig,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            gateway: GatewaySettings::from_env(),
            lifecycle: LifecycleSettings::from_env(),
            security: SecuritySettings::from_env(),
            ubch: UbchSettings::from_env(),
            telemetry: TelemetryConfig::from_env(),
        }
    }

    /// Validate configuration for production readiness.
    ///
    /// # Errors
    ///
    /// `ConfigError::InsecureSessionKey` when the session key is empty
    /// or all-zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.session_key.is_empty()
            || self.security.session_key.iter().all(|b| *b == 0)
        {
            return Err(ConfigError::InsecureSessionKey);
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Session key missing or zeroed.
    #[error(
        "session key is empty or all-zero; set DIIA_SESSION_KEY to a hex-encoded secret"
    )]
    InsecureSessionKey,
}

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    /// Default timeout for sync sends, in seconds.
    pub sync_timeout_secs: u64,
    /// Interval between pending-request expiry sweeps, in seconds.
    pub pending_sweep_secs: u64,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            sync_timeout_secs: 30,
            pending_sweep_secs: 10,
        }
    }
}

impl GatewaySettings {
    fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            sync_timeout_secs: env_u64("DIIA_SYNC_TIMEOUT_SECS", defaults.sync_timeout_secs),
            pending_sweep_secs: env_u64("DIIA_PENDING_SWEEP_SECS", defaults.pending_sweep_secs),
        }
    }

    /// Sync timeout as a duration.
    #[must_use]
    pub fn sync_timeout(&self) -> Duration {
        Duration::from_secs(self.sync_timeout_secs)
    }

    /// Sweep interval as a duration.
    #[must_use]
    pub fn pending_sweep(&self) -> Duration {
        Duration::from_secs(self.pending_sweep_secs)
    }
}

/// Identifier lifecycle configuration.
#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    /// Seconds a Pending identifier may wait for confirmation.
    pub pending_ttl_secs: u64,
    /// Timeout for the sync hashed-file signing call, in seconds.
    pub sign_timeout_secs: u64,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            pending_ttl_secs: 30 * 60,
            sign_timeout_secs: 30,
        }
    }
}

impl LifecycleSettings {
    fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            pending_ttl_secs: env_u64("DIIA_PENDING_TTL_SECS", defaults.pending_ttl_secs),
            sign_timeout_secs: env_u64("DIIA_SIGN_TIMEOUT_SECS", defaults.sign_timeout_secs),
        }
    }

    /// Pending TTL as a duration.
    #[must_use]
    pub fn pending_ttl(&self) -> Duration {
        Duration::from_secs(self.pending_ttl_secs)
    }

    /// Sign timeout as a duration.
    #[must_use]
    pub fn sign_timeout(&self) -> Duration {
        Duration::from_secs(self.sign_timeout_secs)
    }
}

/// Security configuration.
#[derive(Debug, Clone, Default)]
pub struct SecuritySettings {
    /// Key for session-id derivation. MUST be overridden in production.
    pub session_key: Vec<u8>,
}

impl SecuritySettings {
    fn from_env() -> Self {
        let session_key = env::var("DIIA_SESSION_KEY")
            .ok()
            .and_then(|v| hex::decode(v).ok())
            .unwrap_or_default();
        Self { session_key }
    }
}

/// UBCH provider configuration.
#[derive(Debug, Clone)]
pub struct UbchSettings {
    /// Session value placed in every provider envelope.
    pub session: String,
    /// Language value placed in every provider envelope.
    pub language: String,
    /// Use the in-process mock instead of the gateway-backed provider.
    pub use_mock: bool,
}

impl Default for UbchSettings {
    fn default() -> Self {
        Self {
            session: "diia".to_string(),
            language: "ua".to_string(),
            use_mock: true,
        }
    }
}

impl UbchSettings {
    fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            session: env::var("DIIA_UBCH_SESSION").unwrap_or(defaults.session),
            language: env::var("DIIA_UBCH_LANGUAGE").unwrap_or(defaults.language),
            use_mock: env::var("DIIA_UBCH_MOCK")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(defaults.use_mock),
        }
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_fails_validation() {
        let config = ServiceConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InsecureSessionKey)
        ));
    }

    #[test]
    fn test_nonzero_key_passes_validation() {
        let config = ServiceConfig {
            security: SecuritySettings {
                session_key: vec![7u8; 32],
            },
            ..ServiceConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_durations() {
        let settings = LifecycleSettings::default();
        assert_eq!(settings.pending_ttl(), Duration::from_secs(1800));
        assert_eq!(settings.sign_timeout(), Duration::from_secs(30));
    }
}
