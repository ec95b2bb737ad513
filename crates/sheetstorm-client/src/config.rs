use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Connection settings for the incident backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
    /// Extra attempts after the first one, for transport errors and 5xx only.
    pub max_retries: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Reads `SHEETSTORM_API_URL`, `SHEETSTORM_API_TOKEN`, `HTTP_TIMEOUT` and
    /// `HTTP_MAX_RETRIES`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let timeout = match non_empty("HTTP_TIMEOUT").map(|v| v.trim().parse::<u64>()) {
            Some(Ok(secs)) => Duration::from_secs(secs),
            Some(Err(_)) => {
                tracing::warn!("Ignoring invalid HTTP_TIMEOUT, using {DEFAULT_TIMEOUT_SECS}s");
                defaults.timeout
            }
            None => defaults.timeout,
        };
        let max_retries = match non_empty("HTTP_MAX_RETRIES").map(|v| v.trim().parse::<u32>()) {
            Some(Ok(n)) => n,
            Some(Err(_)) => {
                tracing::warn!("Ignoring invalid HTTP_MAX_RETRIES, using {DEFAULT_MAX_RETRIES}");
                defaults.max_retries
            }
            None => defaults.max_retries,
        };

        Self {
            base_url: non_empty("SHEETSTORM_API_URL").unwrap_or(defaults.base_url),
            token: non_empty("SHEETSTORM_API_TOKEN"),
            timeout,
            max_retries,
        }
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
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
    fn defaults_when_nothing_is_set() {
        let config = ClientConfig::from_lookup(lookup(&[]));
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.base_url, "http://localhost:5000/api/v1");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 2);
    }

    #[test]
    fn reads_overrides_and_skips_garbage() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("SHEETSTORM_API_URL", "https://ir.example.org/api/v1/"),
            ("SHEETSTORM_API_TOKEN", "tok"),
            ("HTTP_TIMEOUT", "5"),
            ("HTTP_MAX_RETRIES", "lots"),
        ]));
        assert_eq!(config.token.as_deref(), Some("tok"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_retries, 2);
        assert_eq!(
            config.url("/incidents/1/attack-graph"),
            "https://ir.example.org/api/v1/incidents/1/attack-graph"
        );
    }

    #[test]
    fn blank_token_is_treated_as_missing() {
        let config = ClientConfig::from_lookup(lookup(&[("SHEETSTORM_API_TOKEN", "  ")]));
        assert!(config.token.is_none());
    }
}
