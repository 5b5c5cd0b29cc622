//! Server configuration resolved from CLI flags and environment variables

use std::env;

use thiserror::Error;

/// Default base URL of the Obsidian Local REST API (self-signed HTTPS).
pub const DEFAULT_BASE_URL: &str = "https://127.0.0.1:27124";

/// Default listen port for the SSE transport.
pub const DEFAULT_PORT: u16 = 3000;

/// Environment variable naming the transport to serve on (`stdio` or `sse`).
pub const SERVER_TYPE_VAR: &str = "SERVER_TYPE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("OBSIDIAN_API_KEY environment variable is required")]
    MissingApiKey,
    #[error("invalid OBSIDIAN_BASE_URL: {0}")]
    InvalidBaseUrl(String),
}

/// Resolved process configuration.
///
/// Constructed once at startup and passed to each component; nothing reads
/// the environment after this point.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Base URL of the Obsidian Local REST API, without a trailing slash.
    pub base_url: String,
    /// Static bearer credential for the REST API.
    pub api_key: String,
    /// Listen port for the SSE transport.
    pub port: u16,
}

impl ServerConfig {
    /// Resolve configuration from explicit values (CLI flags) with
    /// environment fallbacks. A missing or empty API key is a startup
    /// error, matching the original server.
    pub fn resolve(
        base_url: Option<String>,
        api_key: Option<String>,
        port: Option<u16>,
    ) -> Result<Self, ConfigError> {
        Self::resolve_with(base_url, api_key, port, |name| {
            env::var(name).ok().filter(|v| !v.is_empty())
        })
    }

    fn resolve_with(
        base_url: Option<String>,
        api_key: Option<String>,
        port: Option<u16>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let base_url = base_url
            .filter(|u| !u.is_empty())
            .or_else(|| lookup("OBSIDIAN_BASE_URL"))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let api_key = api_key
            .filter(|k| !k.is_empty())
            .or_else(|| lookup("OBSIDIAN_API_KEY"))
            .ok_or(ConfigError::MissingApiKey)?;

        let port = port
            .or_else(|| lookup("PORT").and_then(|p| p.parse().ok()))
            .unwrap_or(DEFAULT_PORT);

        // Validate eagerly so a typo fails at startup, not on the first call.
        reqwest::Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidBaseUrl(format!("{base_url}: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn missing_api_key_is_an_error() {
        let err = ServerConfig::resolve_with(None, None, None, no_env).unwrap_err();
        assert!(err.to_string().contains("OBSIDIAN_API_KEY"));
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config =
            ServerConfig::resolve_with(None, Some("secret".into()), None, no_env).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn environment_fallback_is_used() {
        let config = ServerConfig::resolve_with(None, None, None, |name| match name {
            "OBSIDIAN_BASE_URL" => Some("https://vault.local:27124".into()),
            "OBSIDIAN_API_KEY" => Some("from-env".into()),
            "PORT" => Some("4100".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.base_url, "https://vault.local:27124");
        assert_eq!(config.api_key, "from-env");
        assert_eq!(config.port, 4100);
    }

    #[test]
    fn explicit_values_win_and_trailing_slash_is_trimmed() {
        let config = ServerConfig::resolve_with(
            Some("https://vault.local:27124/".into()),
            Some("secret".into()),
            Some(4000),
            |_| Some("ignored".into()),
        )
        .unwrap();
        assert_eq!(config.base_url, "https://vault.local:27124");
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.port, 4000);
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = ServerConfig::resolve_with(
            Some("not a url".into()),
            Some("secret".into()),
            None,
            no_env,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl(_)));
    }
}
