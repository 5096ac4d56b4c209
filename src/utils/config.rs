use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::api::aggregator::AggregatorClient;
use crate::services::poll_service::OverlapPolicy;

pub const DEFAULT_INTERVAL_MS: u64 = 5000;
pub const DEFAULT_OUTPUT: &str = "chart.png";
pub const DEFAULT_WIDTH: u32 = 1024;
pub const DEFAULT_HEIGHT: u32 = 576;

/// Configuration errors, reported once at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime settings for the dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub base_url: String,
    pub endpoint: String,
    pub interval: Duration,
    pub padding_ms: i64,
    pub overlap: OverlapPolicy,
    pub request_timeout: Option<Duration>,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl Config {
    /// Read settings from the process environment (after `.env` is loaded)
    pub fn from_env() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = std::env::vars()
            .filter(|(k, _)| k.starts_with("DASHBOARD_"))
            .collect();
        Self::from_vars(&vars)
    }

    /// Build settings from a variable map; missing keys take their defaults
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        let interval_ms: u64 = parse_or(
            get("DASHBOARD_INTERVAL_MS"),
            "DASHBOARD_INTERVAL_MS",
            DEFAULT_INTERVAL_MS,
        )?;
        if interval_ms == 0 {
            return Err(invalid("DASHBOARD_INTERVAL_MS", "0", "must be greater than zero"));
        }

        let padding_ms: i64 = parse_or(get("DASHBOARD_PADDING_MS"), "DASHBOARD_PADDING_MS", 0)?;
        if padding_ms < 0 {
            return Err(invalid(
                "DASHBOARD_PADDING_MS",
                &padding_ms.to_string(),
                "must not be negative",
            ));
        }

        let overlap = match get("DASHBOARD_OVERLAP") {
            Some(raw) => raw
                .parse::<OverlapPolicy>()
                .map_err(|reason| invalid("DASHBOARD_OVERLAP", raw, &reason))?,
            None => OverlapPolicy::default(),
        };

        let request_timeout = match get("DASHBOARD_REQUEST_TIMEOUT_MS") {
            Some(raw) => {
                let ms: u64 = parse_or(Some(raw), "DASHBOARD_REQUEST_TIMEOUT_MS", 0)?;
                if ms == 0 {
                    return Err(invalid(
                        "DASHBOARD_REQUEST_TIMEOUT_MS",
                        raw,
                        "must be greater than zero",
                    ));
                }
                Some(Duration::from_millis(ms))
            }
            None => None,
        };

        let width: u32 = parse_or(get("DASHBOARD_WIDTH"), "DASHBOARD_WIDTH", DEFAULT_WIDTH)?;
        let height: u32 = parse_or(get("DASHBOARD_HEIGHT"), "DASHBOARD_HEIGHT", DEFAULT_HEIGHT)?;
        if width == 0 || height == 0 {
            return Err(invalid(
                "DASHBOARD_WIDTH/DASHBOARD_HEIGHT",
                &format!("{}x{}", width, height),
                "image size must be non-zero",
            ));
        }

        let base_url = get("DASHBOARD_BASE_URL")
            .unwrap_or(AggregatorClient::DEFAULT_BASE_URL)
            .to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(invalid(
                "DASHBOARD_BASE_URL",
                &base_url,
                "expected an http:// or https:// URL",
            ));
        }

        Ok(Self {
            base_url,
            endpoint: get("DASHBOARD_ENDPOINT")
                .unwrap_or(AggregatorClient::DEFAULT_ENDPOINT)
                .to_string(),
            interval: Duration::from_millis(interval_ms),
            padding_ms,
            overlap,
            request_timeout,
            output: PathBuf::from(get("DASHBOARD_OUTPUT").unwrap_or(DEFAULT_OUTPUT)),
            width,
            height,
        })
    }
}

fn invalid(key: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_or<T>(raw: Option<&str>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value
            .parse::<T>()
            .map_err(|e| invalid(key, value, &e.to_string())),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(&HashMap::new()).unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.endpoint, "/api");
        assert_eq!(config.interval, Duration::from_millis(5000));
        assert_eq!(config.padding_ms, 0);
        assert_eq!(config.overlap, OverlapPolicy::Overlap);
        assert_eq!(config.request_timeout, None);
        assert_eq!(config.output, PathBuf::from("chart.png"));
        assert_eq!((config.width, config.height), (1024, 576));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_vars(&vars(&[
            ("DASHBOARD_BASE_URL", "http://aggregator:9996"),
            ("DASHBOARD_ENDPOINT", "/api/data"),
            ("DASHBOARD_INTERVAL_MS", "1000"),
            ("DASHBOARD_PADDING_MS", "60000"),
            ("DASHBOARD_OVERLAP", "single-flight"),
            ("DASHBOARD_REQUEST_TIMEOUT_MS", "2500"),
            ("DASHBOARD_OUTPUT", "/var/lib/dashboard/live.png"),
            ("DASHBOARD_WIDTH", "800"),
            ("DASHBOARD_HEIGHT", "400"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "http://aggregator:9996");
        assert_eq!(config.endpoint, "/api/data");
        assert_eq!(config.interval, Duration::from_secs(1));
        assert_eq!(config.padding_ms, 60_000);
        assert_eq!(config.overlap, OverlapPolicy::SingleFlight);
        assert_eq!(config.request_timeout, Some(Duration::from_millis(2500)));
        assert_eq!(config.output, PathBuf::from("/var/lib/dashboard/live.png"));
        assert_eq!((config.width, config.height), (800, 400));
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = Config::from_vars(&vars(&[("DASHBOARD_ENDPOINT", "  ")])).unwrap();
        assert_eq!(config.endpoint, "/api");
    }

    #[test]
    fn test_rejects_bad_numbers() {
        let err = Config::from_vars(&vars(&[("DASHBOARD_INTERVAL_MS", "soon")])).unwrap_err();
        assert!(err.to_string().contains("DASHBOARD_INTERVAL_MS"));

        assert!(Config::from_vars(&vars(&[("DASHBOARD_INTERVAL_MS", "0")])).is_err());
        assert!(Config::from_vars(&vars(&[("DASHBOARD_PADDING_MS", "-5")])).is_err());
        assert!(Config::from_vars(&vars(&[("DASHBOARD_REQUEST_TIMEOUT_MS", "0")])).is_err());
        assert!(Config::from_vars(&vars(&[("DASHBOARD_WIDTH", "0")])).is_err());
    }

    #[test]
    fn test_rejects_unknown_policy_and_bad_url() {
        assert!(Config::from_vars(&vars(&[("DASHBOARD_OVERLAP", "queue")])).is_err());
        assert!(Config::from_vars(&vars(&[("DASHBOARD_BASE_URL", "localhost:8080")])).is_err());
    }
}
