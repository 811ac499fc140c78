use std::time::Duration;

use pkgsearch_core::document::build_virtual;
use pkgsearch_solr::client::{SearchEngine, SolrClient, SolrConfig};
use pkgsearch_solr::error::EngineError;
use pkgsearch_solr::select::SelectQuery;
use pkgsearch_solr::update::UpdateBatch;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serve one canned HTTP response and hand back the request head.
async fn respond_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/solr/packages", listener.local_addr().unwrap());
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        request
    });
    (url, handle)
}

/// Read the head and, if announced, the whole body.
async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut raw = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        raw.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&raw).into_owned();
        let Some(head_end) = text.find("\r\n\r\n") else {
            if n == 0 {
                return text;
            }
            continue;
        };
        let content_length = text[..head_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        if n == 0 || raw.len() >= head_end + 4 + content_length {
            return text;
        }
    }
}

fn client(url: String) -> SolrClient {
    SolrClient::new(&SolrConfig {
        url,
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

fn query() -> SelectQuery {
    SelectQuery {
        q: "\"log\"".to_owned(),
        def_type: "edismax".to_owned(),
        query_fields: vec!["name^4".to_owned()],
        phrase_fields: vec!["description".to_owned()],
        boost_functions: vec!["log(trendiness)^10".to_owned()],
        minimum_match: "1".to_owned(),
        filter_queries: Vec::new(),
        sorts: Vec::new(),
        page: 2,
        rows: 10,
    }
}

#[tokio::test]
async fn select_parses_hits_with_numeric_and_text_ids() {
    let (url, server) = respond_once(
        "200 OK",
        r#"{"responseHeader":{"status":0},"response":{"numFound":12,"start":10,"docs":[
            {"id":42,"name":"monolog/monolog","type":"library","tags":["log"],"abandoned":0},
            {"id":"virtual:psr/log-implementation","name":"psr/log-implementation","type":"virtual-package"}
        ]}}"#,
    )
    .await;

    let result = client(url).select(&query()).await.unwrap();
    let request = server.await.unwrap();

    assert!(request.starts_with("GET /solr/packages/select?"));
    assert!(request.contains("start=10"));
    assert!(request.contains("rows=10"));
    assert!(request.contains("defType=edismax"));
    assert_eq!(result.num_found, 12);
    assert_eq!(result.docs.len(), 2);
    assert_eq!(result.docs[0].id, "42");
    assert!(result.docs[0].is_package());
    assert_eq!(result.docs[1].id, "virtual:psr/log-implementation");
    assert!(!result.docs[1].is_package());
    assert!(result.docs[1].tags.is_empty());
}

#[tokio::test]
async fn update_posts_json_commands() {
    let (url, server) = respond_once("200 OK", r#"{"responseHeader":{"status":0}}"#).await;
    let mut batch = UpdateBatch::new();
    batch.add(build_virtual("psr/log-implementation").unwrap());
    batch.commit();

    client(url).update(&batch).await.unwrap();
    let request = server.await.unwrap();

    assert!(request.starts_with("POST /solr/packages/update?wt=json"));
    assert!(request.contains("\"commit\":{}"));
}

#[tokio::test]
async fn error_status_is_reported_with_body() {
    let (url, server) = respond_once("500 Internal Server Error", r#"{"error":"core down"}"#).await;

    let err = client(url).select(&query()).await.unwrap_err();
    server.await.unwrap();

    match err {
        EngineError::UnexpectedStatus { status, body } => {
            assert_eq!(status, 500);
            assert!(body.contains("core down"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unreachable_engine_is_an_http_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/solr/packages", listener.local_addr().unwrap());
    drop(listener);

    let err = client(url).select(&query()).await.unwrap_err();
    assert!(matches!(err, EngineError::Http(_)));
}
