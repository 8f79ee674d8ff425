use process_tracker::{
    ErrorRecord, HttpTransport, MemoryStore, Process, ProcessDriver, WebhookEndpoints,
    load_process,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn expect_post(server: &MockServer, route: &str, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(route))
        .and(header("X-Process-Id", "import-42"))
        .and(body_json(body))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn lifecycle_is_mirrored_to_webhooks() {
    let server = MockServer::start().await;
    expect_post(&server, "/hooks/init", json!({"count": 100})).await;
    expect_post(&server, "/hooks/handle", json!({"count": 2})).await;
    expect_post(&server, "/hooks/skip", json!({"count": 3})).await;
    expect_post(
        &server,
        "/hooks/error",
        json!({"errors": [{"message": "price missing", "entityId": "sku-1"}]}),
    )
    .await;
    expect_post(&server, "/hooks/result", json!({"type": "value", "value": true})).await;

    let transport = HttpTransport::new("integration/1".into()).unwrap();
    let endpoints = WebhookEndpoints::under(&format!("{}/hooks", server.uri()));
    let mut driver = ProcessDriver::attach(
        Process::with_id("import-42", 1, 7),
        MemoryStore::new(),
        Some((endpoints, transport)),
    );

    driver.initialize(Some(100)).await.unwrap();
    driver.handle(2).await.unwrap();
    driver.skip(3).await.unwrap();
    driver.handle(0).await.unwrap();
    driver
        .add_errors(vec![ErrorRecord::with_entity("price missing", "sku-1")])
        .await
        .unwrap();
    driver.finish(true).await.unwrap();

    let stored = load_process(driver.store(), 1, "import-42").unwrap();
    assert_eq!(stored.handled_count(), 2);
    assert_eq!(stored.skipped_count(), 97);
    assert_eq!(stored.failed_count(), 1);
}

#[tokio::test]
async fn failing_endpoint_does_not_roll_back_state() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hooks/init"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hooks/result"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new("integration/1".into()).unwrap();
    let endpoints = WebhookEndpoints::under(&format!("{}/hooks", server.uri()));
    let mut driver = ProcessDriver::attach(
        Process::with_id("import-42", 1, 7),
        MemoryStore::new(),
        Some((endpoints, transport)),
    );

    driver.initialize(Some(10)).await.unwrap();
    let err = driver.finish("report.csv").await.unwrap_err();
    assert!(err.is_delivery());

    let stored = load_process(driver.store(), 1, "import-42").unwrap();
    assert!(stored.is_finished());
    assert_eq!(stored.skipped_count(), 10);
}
