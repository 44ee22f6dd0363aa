//! HTTP contract of the Elasticsearch sink, checked against a mock server.

use elasticsearch_sink::{BulkOutcome, ElasticsearchSink, IndexSink, IndexStatus};
use sync_core::RetryPolicy;
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sink_for(server: &MockServer) -> ElasticsearchSink {
    ElasticsearchSink::new(server.uri(), "movies", RetryPolicy::new("Elasticsearch")).unwrap()
}

#[tokio::test]
async fn test_ensure_index_created() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/movies"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "acknowledged": true,
            "index": "movies"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let status = sink_for(&server).ensure_index().await.unwrap();
    assert_eq!(status, IndexStatus::Created);

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["mappings"]["properties"]["title"]["type"], "text");
}

#[tokio::test]
async fn test_ensure_index_already_exists() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/movies"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": { "type": "resource_already_exists_exception" },
            "status": 400
        })))
        .expect(1)
        .mount(&server)
        .await;

    let status = sink_for(&server).ensure_index().await.unwrap();
    assert_eq!(status, IndexStatus::AlreadyExists);
}

#[tokio::test]
async fn test_load_bulk_sends_ndjson() {
    let payload = "{\"index\":{\"_id\":\"1\",\"_index\":\"movies\"}}\n{\"title\":\"Star Wars\"}\n";

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/movies/_bulk"))
        .and(header("content-type", "application/x-ndjson"))
        .and(body_string(payload))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errors": false,
            "items": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = sink_for(&server).load_bulk(payload).await.unwrap();
    assert_eq!(outcome, BulkOutcome::Loaded);
}

#[tokio::test]
async fn test_load_bulk_rejection_is_reported_not_raised() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/movies/_bulk"))
        .respond_with(ResponseTemplate::new(413))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = sink_for(&server).load_bulk("{}\n{}\n").await.unwrap();
    assert_eq!(outcome, BulkOutcome::Rejected { status: 413 });
}

#[tokio::test]
async fn test_load_bulk_item_errors_are_not_inspected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/movies/_bulk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errors": true,
            "items": [{ "index": { "status": 400, "error": { "type": "mapper_parsing_exception" } } }]
        })))
        .mount(&server)
        .await;

    let outcome = sink_for(&server).load_bulk("{}\n{}\n").await.unwrap();
    assert_eq!(outcome, BulkOutcome::Loaded);
}

#[tokio::test]
async fn test_empty_payload_is_not_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let outcome = sink_for(&server).load_bulk("").await.unwrap();
    assert_eq!(outcome, BulkOutcome::Skipped);
}
