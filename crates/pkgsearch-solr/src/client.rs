//! Engine trait and `reqwest`-backed Solr implementation.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use log::debug;

use crate::error::EngineError;
use crate::select::{SelectQuery, SelectResponse, SelectResult};
use crate::update::UpdateBatch;

/// Boxed future returned by dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

const MAX_ERROR_BODY: usize = 512;

/// Executes queries and document updates against the search index.
pub trait SearchEngine: Send + Sync {
    /// Run a select and return one page of typed hits.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the engine is unreachable or answers badly.
    fn select<'a>(&'a self, query: &'a SelectQuery)
        -> BoxFuture<'a, Result<SelectResult, EngineError>>;

    /// Apply an update batch.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the engine rejects or never receives the batch.
    fn update<'a>(&'a self, batch: &'a UpdateBatch) -> BoxFuture<'a, Result<(), EngineError>>;
}

/// Connection settings for a Solr core.
#[derive(Debug, Clone)]
pub struct SolrConfig {
    /// Core URL, e.g. `http://localhost:8983/solr/packages`.
    pub url: String,
    /// Upper bound for each HTTP request.
    pub timeout: Duration,
}

/// Solr implementation of [`SearchEngine`].
#[derive(Debug, Clone)]
pub struct SolrClient {
    core_url: String,
    http: reqwest::Client,
}

impl SolrClient {
    /// Create a client for the core in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &SolrConfig) -> Result<Self, EngineError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            core_url: config.url.trim_end_matches('/').to_owned(),
            http,
        })
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, EngineError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut end = MAX_ERROR_BODY;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            body.truncate(end);
        }
        Err(EngineError::UnexpectedStatus {
            status: status.as_u16(),
            body,
        })
    }
}

impl SearchEngine for SolrClient {
    fn select<'a>(
        &'a self,
        query: &'a SelectQuery,
    ) -> BoxFuture<'a, Result<SelectResult, EngineError>> {
        Box::pin(async move {
            let url = format!("{}/select", self.core_url);
            debug!("select {url} q={}", query.q);

            let response = self.http.get(&url).query(&query.to_params()).send().await?;
            let raw: SelectResponse = Self::check(response)
                .await?
                .json()
                .await
                .map_err(|e| EngineError::Parse(e.to_string()))?;
            Ok(raw.into())
        })
    }

    fn update<'a>(&'a self, batch: &'a UpdateBatch) -> BoxFuture<'a, Result<(), EngineError>> {
        Box::pin(async move {
            let url = format!("{}/update", self.core_url);
            let body = batch.to_json().map_err(|e| EngineError::Parse(e.to_string()))?;
            debug!("update {url} with {} commands", batch.commands().len());

            let response = self
                .http
                .post(&url)
                .query(&[("wt", "json")])
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body)
                .send()
                .await?;
            Self::check(response).await?;
            Ok(())
        })
    }
}
