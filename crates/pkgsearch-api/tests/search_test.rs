mod common;

use std::sync::Arc;

use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::StatusCode;
use common::{log_implementation, monolog, server, FakeEngine};
use serde_json::{json, Value};

#[tokio::test]
async fn search_returns_contract_shape() {
    let engine = Arc::new(FakeEngine::answering(2, vec![monolog(), log_implementation()]));
    let response = server(engine.clone())
        .get("/search.json")
        .add_query_param("q", "log")
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        response.headers().get(CACHE_CONTROL).unwrap(),
        "public, s-maxage=300"
    );
    let body = response.json::<Value>();
    assert_eq!(body["nbHits"], json!(2));
    assert_eq!(body["nbPages"], json!(1));
    assert_eq!(body["page"], json!(0));
    assert_eq!(body["hitsPerPage"], json!(15));
    assert_eq!(body["query"], "log");
    assert_eq!(body["index"], "");
    assert!(body.get("next").is_none());

    let hits = body["hits"].as_array().unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0]["id"], json!(42));
    assert_eq!(hits[0]["url"], "http://search.test/packages/monolog/monolog");
    assert_eq!(hits[0]["meta"]["downloads_formatted"], "512 000 000");
    assert_eq!(hits[0]["language"], "PHP");
    assert_eq!(hits[1]["virtual"], json!(true));
    assert_eq!(hits[1]["url"], "http://search.test/providers/psr/log-implementation");
    assert!(hits[1].get("downloads").is_none());
    assert!(hits[1].get("favers").is_none());
    assert_eq!(body["facets"]["type"], json!({"library": 1, "virtual-package": 1}));

    let seen = engine.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].q, "\"log\"");
    assert_eq!(seen[0].page, 1);
    assert_eq!(seen[0].rows, 15);
    assert!(seen[0].filter_queries.is_empty());
}

#[tokio::test]
async fn type_and_tag_filters_reach_the_engine() {
    let engine = Arc::new(FakeEngine::default());
    let response = server(engine.clone())
        .get("/search.json")
        .add_query_param("type", "library")
        .add_query_param("tags[]", "cli")
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        engine.filter_clauses(0),
        [r#"type:("library")"#, r#"tags:("cli")"#]
    );
}

#[tokio::test]
async fn operators_and_quotes_survive_escaping() {
    let engine = Arc::new(FakeEngine::default());
    server(engine.clone())
        .get("/search.json")
        .add_query_param("q", r#"-foo +bar "baz""#)
        .await;

    assert_eq!(engine.seen()[0].q, r#""-foo +bar "baz"""#);
}

#[tokio::test]
async fn next_link_points_at_following_page() {
    let engine = Arc::new(FakeEngine::answering(40, vec![monolog()]));
    let body = server(engine.clone())
        .get("/search.json")
        .add_query_param("q", "log")
        .add_query_param("tags[]", "psr-3")
        .add_query_param("per_page", "10")
        .add_query_param("page", "2")
        .await
        .json::<Value>();

    assert_eq!(body["page"], json!(1));
    assert_eq!(body["nbPages"], json!(4));
    assert_eq!(
        body["next"],
        "http://search.test/search.json?q=log&page=3&tags%5B%5D=psr-3&per_page=10"
    );
    assert_eq!(engine.seen()[0].start(), 10);
}

#[tokio::test]
async fn page_past_the_end_is_empty() {
    let engine = Arc::new(FakeEngine::answering(3, Vec::new()));
    let body = server(engine)
        .get("/search.json")
        .add_query_param("q", "log")
        .add_query_param("page", "9")
        .await
        .json::<Value>();

    assert_eq!(body["hits"], json!([]));
    assert_eq!(body["nbHits"], json!(3));
    assert!(body.get("next").is_none());
}

#[tokio::test]
async fn sort_clauses_are_forwarded() {
    let engine = Arc::new(FakeEngine::default());
    server(engine.clone())
        .get("/search.json")
        .add_query_param("q", "log")
        .add_query_param("orderBys[0][sort]", "downloads")
        .add_query_param("orderBys[0][order]", "desc")
        .add_query_param("orderBys[1][sort]", "stars")
        .add_query_param("orderBys[1][order]", "desc")
        .await;

    assert_eq!(engine.seen()[0].sorts, ["downloads desc"]);
}

#[tokio::test]
async fn missing_query_is_rejected() {
    let engine = Arc::new(FakeEngine::default());
    let response = server(engine.clone()).get("/search.json").await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>(),
        json!({"error": "Missing search query, example: ?q=example"})
    );
    assert!(engine.seen().is_empty());
}

#[tokio::test]
async fn per_page_out_of_range_is_rejected() {
    let response = server(Arc::new(FakeEngine::default()))
        .get("/search.json")
        .add_query_param("q", "log")
        .add_query_param("per_page", "500")
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.text(),
        r#"{"status":"error","message":"The optional packages per_page parameter must be an integer between 1 and 100 (default: 15)"}"#
    );
}

#[tokio::test]
async fn unreachable_engine_gives_structured_500() {
    let response = server(Arc::new(FakeEngine::unreachable()))
        .get("/search.json")
        .add_query_param("q", "log")
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.text(),
        r#"{"status":"error","message":"Could not connect to the search server"}"#
    );
    assert!(response.headers().get(CACHE_CONTROL).is_none());
}

#[tokio::test]
async fn callback_wraps_body_as_jsonp() {
    let response = server(Arc::new(FakeEngine::answering(1, vec![monolog()])))
        .get("/search.json")
        .add_query_param("q", "log")
        .add_query_param("callback", "app.render")
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "text/javascript");
    let text = response.text();
    let json = text
        .strip_prefix("/**/app.render(")
        .and_then(|rest| rest.strip_suffix(");"))
        .unwrap();
    assert_eq!(serde_json::from_str::<Value>(json).unwrap()["nbHits"], json!(1));
}

#[tokio::test]
async fn errors_are_wrapped_too() {
    let response = server(Arc::new(FakeEngine::unreachable()))
        .get("/search.json")
        .add_query_param("q", "log")
        .add_query_param("callback", "cb")
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.text(),
        r#"/**/cb({"status":"error","message":"Could not connect to the search server"});"#
    );
}

#[tokio::test]
async fn unsafe_callback_is_rejected() {
    let engine = Arc::new(FakeEngine::default());
    let response = server(engine.clone())
        .get("/search.json")
        .add_query_param("q", "log")
        .add_query_param("callback", "alert(document.cookie)//")
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>(),
        json!({"status": "error", "message": "Invalid JSONP callback"})
    );
    assert!(engine.seen().is_empty());
}
