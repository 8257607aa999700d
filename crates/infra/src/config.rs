//! Service configuration.
//!
//! Built once at startup and passed explicitly into the components that need
//! it; there is no process-wide config singleton.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Settings for outbound callback delivery.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CallbackSettings {
    pub verify_certs: bool,
    pub timeout: Duration,
}

impl Default for CallbackSettings {
    fn default() -> Self {
        Self {
            verify_certs: true,
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Clone)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    /// Verify TLS certificates on outgoing requests.
    pub verify_certs: bool,
    /// Upper bound for outgoing callback requests.
    pub external_request_timeout: Duration,
    /// Attach the process id to every execution outcome.
    pub advanced_performance_measurement_active: bool,
    pub runtime_engine_url: Url,
    /// Shared HS256 secret; `None` disables incoming auth.
    pub jwt_secret: Option<String>,
    /// Pre-issued bearer token for outgoing calls.
    pub service_token: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            verify_certs: true,
            external_request_timeout: Duration::from_secs(10),
            advanced_performance_measurement_active: false,
            runtime_engine_url: Url::parse("http://localhost:8090/").expect("static url is valid"),
            jwt_secret: None,
            service_token: None,
        }
    }
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("bind_addr", &self.bind_addr)
            .field("verify_certs", &self.verify_certs)
            .field("external_request_timeout", &self.external_request_timeout)
            .field(
                "advanced_performance_measurement_active",
                &self.advanced_performance_measurement_active,
            )
            .field("runtime_engine_url", &self.runtime_engine_url.as_str())
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("service_token", &self.service_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ServiceConfig {
    /// Load from process environment; unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (used by `from_env` and tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();

        if let Some(v) = lookup("TRAFO_BIND_ADDR") {
            cfg.bind_addr = v.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                var: "TRAFO_BIND_ADDR",
                reason: e.to_string(),
            })?;
        }
        if let Some(v) = lookup("HD_BACKEND_VERIFY_CERTS") {
            cfg.verify_certs = parse_flag("HD_BACKEND_VERIFY_CERTS", &v)?;
        }
        if let Some(v) = lookup("EXTERNAL_REQUEST_TIMEOUT_SECS") {
            let secs: f64 = v.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "EXTERNAL_REQUEST_TIMEOUT_SECS",
                reason: format!("expected seconds, got {v:?}"),
            })?;
            let timeout = Duration::try_from_secs_f64(secs).map_err(|e| ConfigError::Invalid {
                var: "EXTERNAL_REQUEST_TIMEOUT_SECS",
                reason: e.to_string(),
            })?;
            if timeout.is_zero() {
                return Err(ConfigError::Invalid {
                    var: "EXTERNAL_REQUEST_TIMEOUT_SECS",
                    reason: "timeout must be positive".to_string(),
                });
            }
            cfg.external_request_timeout = timeout;
        }
        if let Some(v) = lookup("ADVANCED_PERFORMANCE_MEASUREMENT_ACTIVE") {
            cfg.advanced_performance_measurement_active =
                parse_flag("ADVANCED_PERFORMANCE_MEASUREMENT_ACTIVE", &v)?;
        }
        if let Some(v) = lookup("HD_RUNTIME_ENGINE_URL") {
            cfg.runtime_engine_url = Url::parse(&v).map_err(|e| ConfigError::Invalid {
                var: "HD_RUNTIME_ENGINE_URL",
                reason: e.to_string(),
            })?;
        }
        cfg.jwt_secret = lookup("JWT_SECRET").filter(|s| !s.is_empty());
        cfg.service_token = lookup("HD_SERVICE_TOKEN").filter(|s| !s.is_empty());

        Ok(cfg)
    }

    pub fn callback_settings(&self) -> CallbackSettings {
        CallbackSettings {
            verify_certs: self.verify_certs,
            timeout: self.external_request_timeout,
        }
    }
}

fn parse_flag(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid {
            var,
            reason: format!("expected a boolean, got {other:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let cfg = ServiceConfig::from_lookup(lookup(&[])).unwrap();
        assert!(cfg.verify_certs);
        assert_eq!(cfg.external_request_timeout, Duration::from_secs(10));
        assert!(!cfg.advanced_performance_measurement_active);
        assert!(cfg.jwt_secret.is_none());
    }

    #[test]
    fn values_are_parsed_from_lookup() {
        let cfg = ServiceConfig::from_lookup(lookup(&[
            ("HD_BACKEND_VERIFY_CERTS", "false"),
            ("EXTERNAL_REQUEST_TIMEOUT_SECS", "2.5"),
            ("ADVANCED_PERFORMANCE_MEASUREMENT_ACTIVE", "YES"),
            ("HD_RUNTIME_ENGINE_URL", "http://runtime:8090/engine/"),
            ("JWT_SECRET", "s3cret"),
        ]))
        .unwrap();

        assert_eq!(
            cfg.callback_settings(),
            CallbackSettings {
                verify_certs: false,
                timeout: Duration::from_millis(2500),
            }
        );
        assert!(cfg.advanced_performance_measurement_active);
        assert_eq!(cfg.runtime_engine_url.as_str(), "http://runtime:8090/engine/");
        assert_eq!(cfg.jwt_secret.as_deref(), Some("s3cret"));
    }

    #[test]
    fn malformed_values_name_the_variable() {
        let err = ServiceConfig::from_lookup(lookup(&[("HD_BACKEND_VERIFY_CERTS", "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "HD_BACKEND_VERIFY_CERTS", .. }));

        let err = ServiceConfig::from_lookup(lookup(&[("EXTERNAL_REQUEST_TIMEOUT_SECS", "-1")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "EXTERNAL_REQUEST_TIMEOUT_SECS", .. }));
    }

    #[test]
    fn out_of_range_timeouts_are_rejected() {
        for raw in ["1e20", "inf", "NaN", "0"] {
            let err = ServiceConfig::from_lookup(lookup(&[("EXTERNAL_REQUEST_TIMEOUT_SECS", raw)])).unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { var: "EXTERNAL_REQUEST_TIMEOUT_SECS", .. }),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let cfg = ServiceConfig::from_lookup(lookup(&[("JWT_SECRET", "s3cret")])).unwrap();
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("<redacted>"));
    }
}
