#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum_test::TestServer;
use pkgsearch_api::router::{build_router, AppState};
use pkgsearch_api::search::transform::ResultTransformer;
use pkgsearch_solr::client::{BoxFuture, SearchEngine};
use pkgsearch_solr::error::EngineError;
use pkgsearch_solr::select::{NativeHit, SelectQuery, SelectResult};
use pkgsearch_solr::update::UpdateBatch;
use serde_json::json;

pub const BASE_URL: &str = "http://search.test";

/// Engine that answers every select with a canned page and records queries.
#[derive(Default)]
pub struct FakeEngine {
    pub result: SelectResult,
    pub unreachable: bool,
    pub seen: Mutex<Vec<SelectQuery>>,
}

impl FakeEngine {
    pub fn answering(num_found: u64, docs: Vec<NativeHit>) -> Self {
        Self {
            result: SelectResult { num_found, docs },
            ..Self::default()
        }
    }

    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    pub fn seen(&self) -> Vec<SelectQuery> {
        self.seen.lock().unwrap().clone()
    }

    pub fn filter_clauses(&self, call: usize) -> Vec<String> {
        self.seen()[call]
            .filter_queries
            .iter()
            .map(|fq| fq.query.clone())
            .collect()
    }
}

impl SearchEngine for FakeEngine {
    fn select<'a>(
        &'a self,
        query: &'a SelectQuery,
    ) -> BoxFuture<'a, Result<SelectResult, EngineError>> {
        Box::pin(async move {
            self.seen.lock().unwrap().push(query.clone());
            if self.unreachable {
                return Err(EngineError::UnexpectedStatus {
                    status: 503,
                    body: "Service Unavailable".to_owned(),
                });
            }
            Ok(self.result.clone())
        })
    }

    fn update<'a>(&'a self, _batch: &'a UpdateBatch) -> BoxFuture<'a, Result<(), EngineError>> {
        Box::pin(async { Ok(()) })
    }
}

pub fn server(engine: Arc<FakeEngine>) -> TestServer {
    let state = AppState {
        engine,
        transformer: Arc::new(ResultTransformer::new(BASE_URL)),
    };
    TestServer::new(build_router(state)).unwrap()
}

pub fn monolog() -> NativeHit {
    serde_json::from_value(json!({
        "id": 42,
        "name": "monolog/monolog",
        "package_name": "monolog",
        "description": "Sends your logs to files, sockets, inboxes, databases and various web services",
        "type": "library",
        "repository": "https://github.com/Seldaek/monolog",
        "language": "PHP",
        "tags": ["log", "logging", "psr-3"],
        "abandoned": 0,
        "replacementPackage": "",
        "downloads": 512_000_000,
        "favers": 20_500,
        "popularity": 9,
        "trendiness": 3.2
    }))
    .unwrap()
}

pub fn log_implementation() -> NativeHit {
    serde_json::from_value(json!({
        "id": "virtual:psr/log-implementation",
        "name": "psr/log-implementation",
        "package_name": "log-implementation",
        "description": "",
        "type": "virtual-package",
        "repository": "",
        "abandoned": 0,
        "replacementPackage": "",
        "trendiness": 100.0
    }))
    .unwrap()
}
