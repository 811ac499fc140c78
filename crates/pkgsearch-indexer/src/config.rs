//! Indexer configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use pkgsearch_solr::client::SolrConfig;
use thiserror::Error;

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

/// Indexer runtime configuration.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// `PostgreSQL` connection URL.
    pub database_url: String,
    /// Search engine core and request timeout.
    pub solr: SolrConfig,
    /// Redis URL for download and favorite counters.
    pub redis_url: String,
    /// Directory holding the deploy-freeze marker.
    pub cache_dir: PathBuf,
    /// Name of the run lock.
    pub lock_name: String,
}

impl IndexerConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] if `DATABASE_URL` or `SOLR_URL` is not
    /// set, and [`ConfigError::Invalid`] if `SOLR_TIMEOUT_SECS` is not a number.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            solr: SolrConfig {
                url: required("SOLR_URL")?,
                timeout: timeout_from_env()?,
            },
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_owned()),
            cache_dir: env::var("CACHE_DIR")
                .map_or_else(|_| PathBuf::from("var/cache"), PathBuf::from),
            lock_name: env::var("INDEXER_LOCK_NAME")
                .unwrap_or_else(|_| "pkgsearch:index".to_owned()),
        })
    }

    /// Path whose existence means a deploy is in progress.
    #[must_use]
    pub fn deploy_lock_path(&self) -> PathBuf {
        self.cache_dir.join("deploy.globallock")
    }
}

fn required(name: &str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name.to_owned()))
}

/// Read `SOLR_TIMEOUT_SECS`, defaulting to ten seconds.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] if the variable is not a whole number.
pub fn timeout_from_env() -> Result<Duration, ConfigError> {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deploy_lock_lives_in_cache_dir() {
        let config = IndexerConfig {
            database_url: "postgres://localhost/registry".to_owned(),
            solr: SolrConfig {
                url: "http://localhost:8983/solr/packages".to_owned(),
                timeout: Duration::from_secs(10),
            },
            redis_url: "redis://127.0.0.1/".to_owned(),
            cache_dir: PathBuf::from("/srv/registry/cache"),
            lock_name: "pkgsearch:index".to_owned(),
        };
        assert_eq!(
            config.deploy_lock_path(),
            PathBuf::from("/srv/registry/cache/deploy.globallock")
        );
    }
}
