//! Request and response bodies of the batch and health endpoints.

use serde::{Deserialize, Serialize};

use crate::search::transform::SearchResult;

/// Body of a batch search request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchRequest {
    /// Sub-requests, answered in order.
    #[serde(default)]
    pub requests: Vec<SubRequest>,
}

/// One query inside a [`BatchRequest`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubRequest {
    /// Opaque index name, echoed back.
    #[serde(rename = "indexName", default)]
    pub index_name: String,
    /// Form-encoded parameters, echoed back verbatim.
    #[serde(default)]
    pub params: String,
}

/// Body of a batch search response.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResponse {
    /// One result per sub-request, in request order.
    pub results: Vec<SearchResult>,
}

/// Response body for the health endpoint.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"`.
    pub status: &'static str,
}
