//! Runtime configuration for context scoping and loader resolution.

use serde::{Deserialize, Serialize};

use crate::error::HostRefError;

pub const DEFAULT_PARALLEL_RESOLVE_THRESHOLD: usize = 32;

const ENV_HANDLE_TRACKING: &str = "HOSTREF_HANDLE_TRACKING";
const ENV_PARALLEL_RESOLVE_THRESHOLD: &str = "HOSTREF_PARALLEL_RESOLVE_THRESHOLD";
const ENV_LOG_HANDLE_TRAFFIC: &str = "HOSTREF_LOG_HANDLE_TRAFFIC";

/// Knobs shared by the context manager and the weak loader set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    /// When `false`, the manager acts as if the host had no handle tracking
    /// and every enter/open returns `None`.
    pub handle_tracking: bool,
    /// Live loader count at which `resolve` fans out over the rayon pool.
    pub parallel_resolve_threshold: usize,
    /// Emit a `trace!` record per handle create and release.
    pub log_handle_traffic: bool,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            handle_tracking: true,
            parallel_resolve_threshold: DEFAULT_PARALLEL_RESOLVE_THRESHOLD,
            log_handle_traffic: false,
        }
    }
}

impl ScopeConfig {
    /// Parses a JSON object; missing fields take their defaults.
    pub fn from_json_str(input: &str) -> Result<Self, HostRefError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Reads overrides from the process environment.
    pub fn from_env() -> Result<Self, HostRefError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    ///
    /// Unset variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, HostRefError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_HANDLE_TRACKING) {
            config.handle_tracking = parse_flag(ENV_HANDLE_TRACKING, &value)?;
        }
        if let Some(value) = lookup(ENV_PARALLEL_RESOLVE_THRESHOLD) {
            config.parallel_resolve_threshold =
                value.trim().parse().map_err(|_| HostRefError::InvalidEnv {
                    var: ENV_PARALLEL_RESOLVE_THRESHOLD,
                    value: value.clone(),
                    expected: "a non-negative integer",
                })?;
        }
        if let Some(value) = lookup(ENV_LOG_HANDLE_TRAFFIC) {
            config.log_handle_traffic = parse_flag(ENV_LOG_HANDLE_TRAFFIC, &value)?;
        }

        Ok(config)
    }
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, HostRefError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(HostRefError::InvalidEnv {
            var,
            value: value.to_string(),
            expected: "a boolean (1/0, true/false, yes/no, on/off)",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let config = ScopeConfig::from_json_str(r#"{"handle_tracking": false}"#).unwrap();
        assert!(!config.handle_tracking);
        assert_eq!(
            config.parallel_resolve_threshold,
            DEFAULT_PARALLEL_RESOLVE_THRESHOLD
        );
        assert!(!config.log_handle_traffic);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = ScopeConfig::from_json_str("{handle_tracking").unwrap_err();
        assert!(matches!(err, HostRefError::Config(_)));
    }

    #[test]
    fn lookup_overrides_defaults() {
        let config = ScopeConfig::from_lookup(|var| match var {
            "HOSTREF_HANDLE_TRACKING" => Some("off".to_string()),
            "HOSTREF_PARALLEL_RESOLVE_THRESHOLD" => Some(" 4 ".to_string()),
            "HOSTREF_LOG_HANDLE_TRAFFIC" => Some("YES".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(
            config,
            ScopeConfig {
                handle_tracking: false,
                parallel_resolve_threshold: 4,
                log_handle_traffic: true,
            }
        );
    }

    #[test]
    fn empty_lookup_yields_defaults() {
        let config = ScopeConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ScopeConfig::default());
    }

    #[test]
    fn bad_flag_names_the_variable() {
        let err = ScopeConfig::from_lookup(|var| {
            (var == "HOSTREF_HANDLE_TRACKING").then(|| "maybe".to_string())
        })
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "invalid value `maybe` for HOSTREF_HANDLE_TRACKING: expected a boolean (1/0, true/false, yes/no, on/off)"
        );
    }

    #[test]
    fn bad_threshold_is_rejected() {
        let err = ScopeConfig::from_lookup(|var| {
            (var == "HOSTREF_PARALLEL_RESOLVE_THRESHOLD").then(|| "-3".to_string())
        })
        .unwrap_err();

        assert!(matches!(
            err,
            HostRefError::InvalidEnv {
                var: "HOSTREF_PARALLEL_RESOLVE_THRESHOLD",
                ..
            }
        ));
    }
}
