use std::sync::Arc;

use postlens_client::{
    AnalyzeOptions, AnalyzeRequest, ApiClient, ApiRequest, ClientConfig, ReqwestTransport,
    RequestError, RequestOptions, Transport,
};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn get_returns_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new();
    let res = transport
        .send(ApiRequest::get(format!("{}/health", server.uri())))
        .await
        .unwrap();
    assert_eq!(res.status, 200);
    let body: Value = res.json().unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn error_status_is_a_response_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let res = ReqwestTransport::new()
        .send(ApiRequest::get(format!("{}/missing", server.uri())))
        .await
        .unwrap();
    assert_eq!(res.status, 404);
    assert!(!res.is_success());
}

#[tokio::test]
async fn post_sends_json_body_and_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/grammar-check"))
        .and(header("X-Queue", "1"))
        .and(body_json(json!({"texts": ["teh"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"mistakes": ["teh"]})))
        .expect(1)
        .mount(&server)
        .await;

    let res = ReqwestTransport::new()
        .send(
            ApiRequest::post(format!("{}/grammar-check", server.uri()), json!({"texts": ["teh"]}))
                .with_header("X-Queue", "1"),
        )
        .await
        .unwrap();
    assert_eq!(res.status, 200);
}

#[tokio::test]
async fn unreachable_host_is_transport_error() {
    // Bind then drop a listener so the port is known to be closed.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = ReqwestTransport::new()
        .send(ApiRequest::get(format!("http://{addr}/health")))
        .await
        .unwrap_err();
    assert!(matches!(err, RequestError::Transport(_)));
}

#[tokio::test]
async fn client_posts_through_real_transport() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/echo"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"echo": true})))
        .mount(&server)
        .await;

    let client = ApiClient::new(ClientConfig::single(server.uri()), Arc::new(ReqwestTransport::new()));
    let reply: Value = client
        .post("/echo", &json!({"x": 1}), RequestOptions::default())
        .await
        .unwrap();
    assert_eq!(reply, json!({"echo": true}));
}

#[tokio::test]
async fn analyze_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(
            ResponseTemplate::new(202).set_body_json(json!({"request_id": "job 1", "status": "queued"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/queue/status"))
        .and(query_param("request_id", "job 1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "ready", "result": {"posts": []}})),
        )
        .mount(&server)
        .await;

    let client = ApiClient::from_config(ClientConfig::single(server.uri()));
    let options = AnalyzeOptions {
        poll_interval: std::time::Duration::from_millis(10),
        ..Default::default()
    };
    let mut polls = 0;
    let analysis = client
        .analyze(&AnalyzeRequest::new("someone"), &options, |_| polls += 1)
        .await
        .unwrap();
    assert_eq!(analysis, json!({"posts": []}));
    assert_eq!(polls, 2);
}
