//! Configuration types.

use std::time::Duration;

use secrecy::SecretString;

/// Default backend base URL.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Client configuration shared by the backend adapter and the controllers.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the document/answer backend (no trailing slash).
    pub api_url: String,
    /// Per-request timeout for backend calls.
    pub request_timeout: Duration,
    /// Concept maps deeper than this are truncated during synthesis.
    pub map_max_depth: usize,
    /// Session cookie forwarded to the backend, if the host is logged in.
    pub session_cookie: Option<SecretString>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(60),
            map_max_depth: 32,
            session_cookie: None,
        }
    }
}

impl ClientConfig {
    /// Build from `STUDY_*` environment variables, falling back to defaults
    /// for anything missing or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_url = std::env::var("STUDY_API_URL")
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.api_url);

        let request_timeout = std::env::var("STUDY_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        let map_max_depth = std::env::var("STUDY_MAP_MAX_DEPTH")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|depth| *depth > 0)
            .unwrap_or(defaults.map_max_depth);

        let session_cookie = std::env::var("STUDY_SESSION_COOKIE")
            .ok()
            .filter(|s| !s.is_empty())
            .map(SecretString::from);

        Self {
            api_url,
            request_timeout,
            map_max_depth,
            session_cookie,
        }
    }

    /// Join a path onto the API base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.map_max_depth, 32);
        assert!(config.session_cookie.is_none());
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let config = ClientConfig {
            api_url: "http://localhost:9000".into(),
            ..Default::default()
        };
        assert_eq!(
            config.endpoint("/api/chats/7"),
            "http://localhost:9000/api/chats/7"
        );
        assert_eq!(
            config.endpoint("api/chats/7"),
            "http://localhost:9000/api/chats/7"
        );
    }
}
