//! Response helpers shared by the search handlers.

pub mod batch;
pub mod search;

use std::sync::LazyLock;

use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::error;
use regex::Regex;
use serde::Serialize;

use crate::params::Params;
use crate::search::SearchError;

static CALLBACK_PART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[$_\p{L}][$_\p{L}\p{Mn}\p{Mc}\p{Nd}\p{Pc}\x{200C}\x{200D}]*$")
        .expect("callback pattern is valid")
});

/// Whether `name` is a dotted path of JavaScript identifiers.
#[must_use]
pub fn is_valid_callback(name: &str) -> bool {
    name.split('.').all(|part| CALLBACK_PART.is_match(part))
}

/// The `callback` parameter, if present and non-empty.
///
/// # Errors
///
/// Returns [`SearchError::InvalidCallback`] if it is not a safe identifier path.
pub(crate) fn jsonp_callback(params: &Params) -> Result<Option<&str>, SearchError> {
    match params.get("callback") {
        None | Some("") => Ok(None),
        Some(name) if is_valid_callback(name) => Ok(Some(name)),
        Some(_) => Err(SearchError::InvalidCallback),
    }
}

/// Serialize `body` as JSON, or as a JSONP call when `callback` is set.
pub(crate) fn respond<T: Serialize>(status: StatusCode, body: &T, callback: Option<&str>) -> Response {
    let json = match serde_json::to_string(body) {
        Ok(json) => json,
        Err(e) => {
            error!("failed to encode response body: {e}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    match callback {
        Some(name) => (
            status,
            [(CONTENT_TYPE, "text/javascript")],
            format!("/**/{name}({});", escape_line_separators(&json)),
        )
            .into_response(),
        None => (status, [(CONTENT_TYPE, "application/json")], json).into_response(),
    }
}

/// JSON allows raw U+2028 and U+2029 in strings; pre-ES2019 script parsers do not.
fn escape_line_separators(json: &str) -> String {
    json.replace('\u{2028}', "\\u2028").replace('\u{2029}', "\\u2029")
}

pub(crate) fn error_response(err: &SearchError, callback: Option<&str>) -> Response {
    respond(err.status(), &err.body(), callback)
}
