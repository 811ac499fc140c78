//! Search execution shared by the single-query and batch forms.

pub mod facet_filters;
pub mod transform;
pub mod translate;

use std::time::Instant;

use axum::http::StatusCode;
use log::error;
use pkgsearch_core::query::Query;
use pkgsearch_solr::client::SearchEngine;
use pkgsearch_solr::error::EngineError;
use serde::Serialize;
use thiserror::Error;

use self::transform::{PagedResult, ResultTransformer, SearchResult};
use self::translate::translate;

/// Errors that end a search request.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The engine could not be reached or answered badly.
    #[error("search engine request failed: {0}")]
    Engine(#[from] EngineError),
    /// `per_page` is missing its integer form or out of range.
    #[error("per_page must be an integer between 1 and 100")]
    InvalidPerPage,
    /// None of `q`, `tags` or `type` was given.
    #[error("missing search query")]
    MissingQuery,
    /// The batch body is not the expected JSON envelope.
    #[error("invalid request body: {0}")]
    InvalidBody(String),
    /// The JSONP callback is not a safe identifier path.
    #[error("invalid JSONP callback")]
    InvalidCallback,
}

/// JSON body sent for a [`SearchError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ErrorBody {
    /// `{"status":"error","message":...}`.
    Status {
        /// Always `"error"`.
        status: &'static str,
        /// Human-readable reason.
        message: &'static str,
    },
    /// `{"error":...}`.
    Bare {
        /// Human-readable reason.
        error: &'static str,
    },
}

impl SearchError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Stable response body for this error.
    #[must_use]
    pub fn body(&self) -> ErrorBody {
        let message = match self {
            Self::Engine(_) => "Could not connect to the search server",
            Self::InvalidPerPage => {
                "The optional packages per_page parameter must be an integer between 1 and 100 (default: 15)"
            }
            Self::MissingQuery => {
                return ErrorBody::Bare {
                    error: "Missing search query, example: ?q=example",
                }
            }
            Self::InvalidBody(_) => "Invalid request body",
            Self::InvalidCallback => "Invalid JSONP callback",
        };
        ErrorBody::Status {
            status: "error",
            message,
        }
    }
}

/// Translate `query`, run it and reshape the page of hits.
///
/// # Errors
///
/// Returns [`SearchError::Engine`] if the select fails.
pub async fn execute(
    engine: &dyn SearchEngine,
    transformer: &ResultTransformer,
    query: &Query,
) -> Result<SearchResult, SearchError> {
    let started = Instant::now();
    let select = translate(query);
    let found = engine
        .select(&select)
        .await
        .inspect_err(|e| error!("search for {:?} failed: {e}", query.query))?;

    let page = PagedResult {
        hits: found.docs,
        nb_hits: found.num_found,
        current_page: select.page,
        per_page: select.rows,
    };
    let mut result = transformer.transform(query, &page);
    result.processing_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    Ok(result)
}
