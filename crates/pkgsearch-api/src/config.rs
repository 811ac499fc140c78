//! API server configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use pkgsearch_solr::client::SolrConfig;
use thiserror::Error;
use url::Url;

/// Errors during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    Missing(String),
    /// A variable is set but cannot be parsed.
    #[error("invalid value for {name}: {value}")]
    Invalid {
        /// Variable name.
        name: String,
        /// Offending value.
        value: String,
    },
}

/// API server runtime configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Search engine core and request timeout.
    pub solr: SolrConfig,
    /// TCP address to bind (e.g. `0.0.0.0:8080`).
    pub bind_addr: String,
    /// Absolute base for package, provider and next-page URLs.
    pub public_base_url: String,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] if `SOLR_URL` is not set, and
    /// [`ConfigError::Invalid`] if `SOLR_TIMEOUT_SECS` is not a number or
    /// `PUBLIC_BASE_URL` is not an absolute URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        let public_base_url =
            env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_owned());
        Ok(Self {
            solr: SolrConfig {
                url: env::var("SOLR_URL").map_err(|_| ConfigError::Missing("SOLR_URL".to_owned()))?,
                timeout: timeout_from_env()?,
            },
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_owned()),
            public_base_url: validate_base_url(public_base_url)?,
        })
    }
}

fn timeout_from_env() -> Result<Duration, ConfigError> {
    match env::var("SOLR_TIMEOUT_SECS") {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::Invalid {
                name: "SOLR_TIMEOUT_SECS".to_owned(),
                value: raw,
            }),
        Err(_) => Ok(Duration::from_secs(10)),
    }
}

/// Check that `raw` is an absolute http(s) URL and drop any trailing slash.
fn validate_base_url(raw: String) -> Result<String, ConfigError> {
    match Url::parse(&raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            Ok(raw.trim_end_matches('/').to_owned())
        }
        _ => Err(ConfigError::Invalid {
            name: "PUBLIC_BASE_URL".to_owned(),
            value: raw,
        }),
    }
}
