//! `GET /search.json`, the single-query form.

use axum::extract::{RawQuery, State};
use axum::http::header::CACHE_CONTROL;
use axum::http::{HeaderValue, StatusCode};
use axum::response::Response;
use pkgsearch_core::query::{Query, DEFAULT_PER_PAGE, MAX_PER_PAGE};

use super::{error_response, jsonp_callback, respond};
use crate::params::Params;
use crate::router::AppState;
use crate::search::{execute, SearchError};

/// Shared caches may keep a search response for five minutes.
pub const CACHE_POLICY: &str = "public, s-maxage=300";

/// Placeholder some clients send in place of an empty type.
const TYPE_PLACEHOLDER: &str = "%type%";

/// Handle `GET /search.json?q=&tags[]=&type=&per_page=&page=`.
///
/// `page` is 1-based here; the result's `page` field is 0-based.
///
/// # Errors
///
/// Responds `400` for a bad `per_page`, a missing query or a bad JSONP
/// callback, and `500` if the search engine fails.
pub async fn search_handler(State(state): State<AppState>, RawQuery(raw): RawQuery) -> Response {
    let params = Params::parse(raw.as_deref().unwrap_or_default());
    let callback = match jsonp_callback(&params) {
        Ok(callback) => callback,
        Err(e) => return error_response(&e, None),
    };
    let query = match query_from_params(&params) {
        Ok(query) => query,
        Err(e) => return error_response(&e, callback),
    };

    match execute(state.engine.as_ref(), &state.transformer, &query).await {
        Ok(result) => {
            let mut response = respond(StatusCode::OK, &result, callback);
            response
                .headers_mut()
                .insert(CACHE_CONTROL, HeaderValue::from_static(CACHE_POLICY));
            response
        }
        Err(e) => error_response(&e, callback),
    }
}

/// Build a [`Query`] from single-query parameters.
///
/// # Errors
///
/// Returns [`SearchError::InvalidPerPage`] unless `per_page` is absent or an
/// integer in `1..=100`, and [`SearchError::MissingQuery`] if `q` is absent
/// and there is no tag or type filter.
pub fn query_from_params(params: &Params) -> Result<Query, SearchError> {
    let tags: Vec<String> = params
        .get_list("tags")
        .into_iter()
        .filter(|tag| !tag.is_empty())
        .collect();
    let type_filter = params
        .get("type")
        .unwrap_or_default()
        .replace(TYPE_PLACEHOLDER, "");

    if !params.contains("q") && tags.is_empty() && type_filter.is_empty() {
        return Err(SearchError::MissingQuery);
    }

    let per_page = match params.get("per_page") {
        None => DEFAULT_PER_PAGE,
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|n| (1..=MAX_PER_PAGE).contains(n))
            .ok_or(SearchError::InvalidPerPage)?,
    };
    let page = params
        .get("page")
        .and_then(|p| p.trim().parse::<u32>().ok())
        .unwrap_or(1)
        .max(1);

    Ok(Query::new(params.get("q").unwrap_or_default())
        .with_tags(tags)
        .with_type(type_filter)
        .with_per_page(per_page)
        .with_page(page - 1)
        .with_order_bys(params.order_bys()))
}
