//! `POST /search/queries` and `POST /1/indexes/:index/queries`, the batch form.

use axum::body::Bytes;
use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::response::Response;
use log::warn;
use pkgsearch_core::query::{OrderBy, Query};

use super::{error_response, jsonp_callback, respond};
use crate::models::{BatchRequest, BatchResponse, SubRequest};
use crate::params::Params;
use crate::router::AppState;
use crate::search::{execute, facet_filters, SearchError};

/// Page size when a sub-request gives neither `hitsPerPage` nor
/// `maxValuesPerFacet`.
pub const DEFAULT_BATCH_PER_PAGE: u32 = 100;

/// Largest page size a sub-request may ask for; larger values are clamped.
pub const MAX_BATCH_PER_PAGE: u32 = 1000;

/// Handle a batch of hosted-search style queries.
///
/// Sub-requests run one after another; each result echoes its `indexName`
/// and raw `params`. Sort clauses come from the URL's `orderBys`, or from
/// each sub-request's params when the URL has none.
///
/// # Errors
///
/// Responds `400` for a malformed body or a bad JSONP callback, and `500` if
/// any sub-request's search fails.
pub async fn batch_handler(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
    body: Bytes,
) -> Response {
    let url_params = Params::parse(raw.as_deref().unwrap_or_default());
    let callback = match jsonp_callback(&url_params) {
        Ok(callback) => callback,
        Err(e) => return error_response(&e, None),
    };
    let request: BatchRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!("rejecting batch request: {e}");
            return error_response(&SearchError::InvalidBody(e.to_string()), callback);
        }
    };

    let url_order_bys = url_params.order_bys();
    let mut results = Vec::with_capacity(request.requests.len());
    for sub in &request.requests {
        let query = query_from_sub_request(sub, &url_order_bys);
        match execute(state.engine.as_ref(), &state.transformer, &query).await {
            Ok(mut result) => {
                result.index.clone_from(&sub.index_name);
                result.params.clone_from(&sub.params);
                results.push(result);
            }
            Err(e) => return error_response(&e, callback),
        }
    }

    respond(StatusCode::OK, &BatchResponse { results }, callback)
}

/// Build a [`Query`] from one sub-request's `params` blob.
#[must_use]
pub fn query_from_sub_request(sub: &SubRequest, url_order_bys: &[OrderBy]) -> Query {
    let params = Params::parse(&sub.params);
    let filters = facet_filters::parse(params.get("facetFilters").unwrap_or_default());
    let per_page = ["hitsPerPage", "maxValuesPerFacet"]
        .iter()
        .find_map(|key| params.get(key)?.trim().parse::<u32>().ok())
        .unwrap_or(DEFAULT_BATCH_PER_PAGE)
        .clamp(1, MAX_BATCH_PER_PAGE);
    let page = params
        .get("page")
        .and_then(|p| p.trim().parse::<u32>().ok())
        .unwrap_or(0);
    let order_bys = if url_order_bys.is_empty() {
        params.order_bys()
    } else {
        url_order_bys.to_vec()
    };

    Query::new(params.get("query").unwrap_or_default())
        .with_type(filters.type_filter())
        .with_tags(filters.tags)
        .with_per_page(per_page)
        .with_page(page)
        .with_order_bys(order_bys)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(params: &str) -> SubRequest {
        SubRequest {
            index_name: "packages".to_owned(),
            params: params.to_owned(),
        }
    }

    #[test]
    fn params_blob_is_decoded() {
        let query = query_from_sub_request(
            &sub("query=http%20client&page=2&hitsPerPage=20\
                  &facetFilters=%5B%5B%22type%3Alibrary%22%5D%2C%5B%22tags%3Apsr-18%22%5D%5D"),
            &[],
        );
        assert_eq!(query.query, "http client");
        assert_eq!(query.page, 2);
        assert_eq!(query.per_page, 20);
        assert_eq!(query.type_filter, "library");
        assert_eq!(query.tags, ["psr-18"]);
    }

    #[test]
    fn page_size_falls_back_to_max_values_then_default() {
        assert_eq!(query_from_sub_request(&sub("maxValuesPerFacet=30"), &[]).per_page, 30);
        assert_eq!(
            query_from_sub_request(&sub("query=x"), &[]).per_page,
            DEFAULT_BATCH_PER_PAGE
        );
        assert_eq!(query_from_sub_request(&sub("hitsPerPage=5&maxValuesPerFacet=30"), &[]).per_page, 5);
    }

    #[test]
    fn page_size_is_clamped() {
        assert_eq!(
            query_from_sub_request(&sub("query=a&hitsPerPage=4000000000"), &[]).per_page,
            MAX_BATCH_PER_PAGE
        );
        assert_eq!(query_from_sub_request(&sub("maxValuesPerFacet=1001"), &[]).per_page, 1000);
        assert_eq!(query_from_sub_request(&sub("hitsPerPage=0"), &[]).per_page, 1);
    }

    #[test]
    fn url_order_bys_take_precedence() {
        let from_url = [OrderBy::parse("favers", "desc").unwrap()];
        let blob = sub("orderBys[0][sort]=downloads&orderBys[0][order]=asc");
        assert_eq!(query_from_sub_request(&blob, &from_url).order_bys, from_url);
        assert_eq!(
            query_from_sub_request(&blob, &[]).order_bys,
            [OrderBy::parse("downloads", "asc").unwrap()]
        );
    }
}
