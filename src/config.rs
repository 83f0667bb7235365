use std::path::PathBuf;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "Wardflow";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable overriding the REST backend base URL.
pub const API_URL_ENV: &str = "WARDFLOW_API_URL";

/// Environment variable overriding the backend request timeout (seconds).
pub const API_TIMEOUT_ENV: &str = "WARDFLOW_API_TIMEOUT_SECS";

/// Backend the dashboards talk to when nothing is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Requests that take longer than this fail with a timeout instead of hanging.
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 15;

/// Default tracing filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "wardflow_lib=info,warn"
}

/// Get the application data directory.
///
/// Falls back to the working directory when no home directory exists
/// (containers, CI runners).
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Wardflow")
}

/// Path of the local key/value store (browser local-storage equivalent).
pub fn local_store_path() -> PathBuf {
    app_data_dir().join("local_store.db")
}

// ═══════════════════════════════════════════════════════════
// Backend client configuration
// ═══════════════════════════════════════════════════════════

/// Where and how the dashboards reach the REST backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    /// Read `WARDFLOW_API_URL` / `WARDFLOW_API_TIMEOUT_SECS`, with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base_url = lookup(API_URL_ENV)
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let timeout_secs = match lookup(API_TIMEOUT_ENV) {
            Some(raw) => raw.trim().parse::<u64>().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "Ignoring invalid backend timeout");
                DEFAULT_API_TIMEOUT_SECS
            }),
            None => DEFAULT_API_TIMEOUT_SECS,
        };

        Self::new(&base_url, Duration::from_secs(timeout_secs))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL, Duration::from_secs(DEFAULT_API_TIMEOUT_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn app_data_dir_ends_with_app_folder() {
        assert!(app_data_dir().ends_with("Wardflow"));
    }

    #[test]
    fn local_store_under_app_data() {
        assert!(local_store_path().starts_with(app_data_dir()));
    }

    #[test]
    fn app_name_is_wardflow() {
        assert_eq!(APP_NAME, "Wardflow");
    }

    #[test]
    fn client_config_defaults_without_env() {
        let config = ClientConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.base_url, DEFAULT_API_URL);
    }

    #[test]
    fn client_config_reads_overrides_and_trims_slash() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            (API_URL_ENV, "http://10.0.0.5:8080/api/"),
            (API_TIMEOUT_ENV, "3"),
        ]));
        assert_eq!(config.base_url, "http://10.0.0.5:8080/api");
        assert_eq!(config.timeout, Duration::from_secs(3));
    }

    #[test]
    fn invalid_timeout_falls_back_to_default() {
        let config = ClientConfig::from_lookup(lookup_from(&[(API_TIMEOUT_ENV, "soon")]));
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_API_TIMEOUT_SECS));
    }
}
