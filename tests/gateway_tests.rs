use api_connector::config::{GatewayConfig, RetryHeaders};
use api_connector::connectors::{
    ApiHeadersHook, ApiRequestHook, Hook, OverrideRegistry, RefreshApiTokenHook,
};
use api_connector::gateway::{
    ApiErrorInfo, ApiGateway, ApiRequest, ApiResponse, ConnectionError, FailureKind, StringMap,
};
use api_connector::models::api_credential::ApiCredential;
use api_connector::models::http_request_log;
use api_connector::models::http_request_log_source::LogSourceSettings;
use api_connector::repositories::LogSourceRepository;
use api_connector::request_log::LogSourceOwner;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path, query_param},
};
mod test_utils;
use test_utils::{create_credential, gateway_with_config, setup_test_db_arc, test_gateway};

const CREDENTIAL: &str = "Test Credential";

async fn logs_of(gateway: &ApiGateway, credential: &ApiCredential) -> Vec<http_request_log::Model> {
    gateway
        .logs()
        .list_for_source(credential.log_source_id(), 50)
        .await
        .unwrap()
}

fn unused_local_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

/// Sends a stale token first and a fresh one once asked to renew
struct TokenHeaders;

#[async_trait]
impl ApiHeadersHook for TokenHeaders {
    async fn api_headers(&self, _credential: &ApiCredential, renew_token: bool) -> StringMap {
        let token = if renew_token { "fresh" } else { "stale" };
        StringMap::from([("Authorization".to_string(), format!("Bearer {token}"))])
    }
}

struct CountingRefresh {
    calls: Arc<AtomicUsize>,
    succeeds: bool,
}

#[async_trait]
impl RefreshApiTokenHook for CountingRefresh {
    async fn refresh_api_token(&self, _credential: &ApiCredential) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.succeeds
    }
}

fn refresh_on_401(_: &ApiCredential, response: &ApiResponse, body: &Value) -> ApiErrorInfo {
    let message = body["message"].as_str().unwrap_or_default();
    if response.status == 401 {
        ApiErrorInfo::refresh_needed(message)
    } else {
        ApiErrorInfo::new(message)
    }
}

/// Registry for connector "tokens": token headers, 401 triggers refresh
fn token_registry(refresh_succeeds: bool) -> (OverrideRegistry, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = OverrideRegistry::new();
    registry.register("tokens", Hook::api_headers(TokenHeaders));
    registry.register("tokens", Hook::parse_api_error(refresh_on_401));
    registry.register(
        "tokens",
        Hook::refresh_api_token(CountingRefresh {
            calls: calls.clone(),
            succeeds: refresh_succeeds,
        }),
    );
    (registry, calls)
}

async fn mount_token_api(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "token expired"})),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_successful_get_returns_body_and_logs_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/items"))
        .and(query_param("page", "2"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": [1, 2]})))
        .expect(1)
        .mount(&server)
        .await;

    let db = setup_test_db_arc().await.unwrap();
    let credential = create_credential(&db, CREDENTIAL, "acme", &server.uri())
        .await
        .unwrap();
    let gateway = test_gateway(&db, OverrideRegistry::new());

    let result = gateway
        .api_request(
            &credential,
            ApiRequest::get("/v1/items/").with_params([("page", "2")]),
        )
        .await
        .unwrap();

    assert_eq!(result, Some(json!({"items": [1, 2]})));

    let logs = logs_of(&gateway, &credential).await;
    assert_eq!(logs.len(), 1);
    let log = &logs[0];
    assert_eq!(log.name, format!("{}/v1/items", server.uri()));
    assert_eq!(log.method.as_deref(), Some("GET"));
    assert_eq!(log.code.as_deref(), Some("200"));
    assert_eq!(
        log.response_body.as_deref(),
        Some("{\n  \"items\": [\n    1,\n    2\n  ]\n}")
    );
    assert!(log.error.is_none());
    assert!(log.headers.as_deref().unwrap().contains("application/json"));
    assert!(log.params.as_deref().unwrap().contains("\"page\""));
    assert!(log.processed_at.is_some());
    assert!(log.delete_by_date.is_none());
}

#[tokio::test]
async fn test_post_sends_json_body_and_logs_it_pretty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/orders"))
        .and(body_json(json!({"sku": "A-1", "qty": 3})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "o-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let db = setup_test_db_arc().await.unwrap();
    let credential = create_credential(&db, CREDENTIAL, "acme", &server.uri())
        .await
        .unwrap();
    let gateway = test_gateway(&db, OverrideRegistry::new());

    let result = gateway
        .api_request(
            &credential,
            ApiRequest::post("v1/orders", json!({"sku": "A-1", "qty": 3})).raising(),
        )
        .await
        .unwrap();

    assert_eq!(result, Some(json!({"id": "o-1"})));
    let logs = logs_of(&gateway, &credential).await;
    assert_eq!(logs.len(), 1);
    assert_eq!(
        logs[0].request_body.as_deref(),
        Some("{\n  \"sku\": \"A-1\",\n  \"qty\": 3\n}")
    );
    assert_eq!(logs[0].code.as_deref(), Some("201"));
}

#[tokio::test]
async fn test_plain_text_400_is_silent_by_default() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/items"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Bad Request"))
        .mount(&server)
        .await;

    let db = setup_test_db_arc().await.unwrap();
    let credential = create_credential(&db, CREDENTIAL, "acme", &server.uri())
        .await
        .unwrap();
    let gateway = test_gateway(&db, OverrideRegistry::new());

    let result = gateway
        .api_request(&credential, ApiRequest::get("/v1/items"))
        .await
        .unwrap();

    assert_eq!(result, None);
    let logs = logs_of(&gateway, &credential).await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].code.as_deref(), Some("400"));
    assert_eq!(logs[0].error.as_deref(), Some("Bad Request"));
    assert_eq!(logs[0].response_body.as_deref(), Some("Bad Request"));
}

#[tokio::test]
async fn test_plain_text_400_raises_with_credential_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/items"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Bad Request"))
        .mount(&server)
        .await;

    let db = setup_test_db_arc().await.unwrap();
    let credential = create_credential(&db, CREDENTIAL, "acme", &server.uri())
        .await
        .unwrap();
    let gateway = test_gateway(&db, OverrideRegistry::new());

    let error = gateway
        .api_request(&credential, ApiRequest::get("/v1/items").raising())
        .await
        .unwrap_err();

    assert_eq!(error.kind, FailureKind::Api { status: 400 });
    assert_eq!(error.status(), Some(400));
    assert_eq!(
        error.to_string(),
        "Connector \"Test Credential\" connection error: \"Bad Request\""
    );
}

#[tokio::test]
async fn test_html_error_page_raises_readable_text_and_logs_first_line() {
    let server = MockServer::start().await;
    let page = "<html><head><title>500</title></head>\
                <body><h1>Server Error</h1><p>Try again later</p></body></html>";
    Mock::given(method("GET"))
        .and(path("/v1/items"))
        .respond_with(ResponseTemplate::new(500).set_body_string(page))
        .mount(&server)
        .await;

    let db = setup_test_db_arc().await.unwrap();
    let credential = create_credential(&db, CREDENTIAL, "acme", &server.uri())
        .await
        .unwrap();
    let gateway = test_gateway(&db, OverrideRegistry::new());

    let error = gateway
        .api_request(&credential, ApiRequest::get("/v1/items").raising())
        .await
        .unwrap_err();

    assert_eq!(error.message, "Server Error\nTry again later");
    let logs = logs_of(&gateway, &credential).await;
    assert_eq!(logs[0].code.as_deref(), Some("500"));
    assert_eq!(logs[0].error.as_deref(), Some("Server Error"));
}

#[tokio::test]
async fn test_json_error_uses_raw_text_by_default() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/items"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({"error": "invalid"})))
        .mount(&server)
        .await;

    let db = setup_test_db_arc().await.unwrap();
    let credential = create_credential(&db, CREDENTIAL, "acme", &server.uri())
        .await
        .unwrap();
    let gateway = test_gateway(&db, OverrideRegistry::new());

    let error = gateway
        .api_request(&credential, ApiRequest::get("/v1/items").raising())
        .await
        .unwrap_err();

    assert_eq!(error.message, r#"{"error":"invalid"}"#);
    let logs = logs_of(&gateway, &credential).await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].code.as_deref(), Some("422"));
    assert_eq!(
        logs[0].error.as_deref(),
        Some("{\n  \"error\": \"invalid\"\n}")
    );
}

#[tokio::test]
async fn test_transport_error_silent_and_raising() {
    let db = setup_test_db_arc().await.unwrap();
    let credential = create_credential(&db, CREDENTIAL, "acme", &unused_local_url())
        .await
        .unwrap();
    let gateway = test_gateway(&db, OverrideRegistry::new());

    let silent = gateway
        .api_request(&credential, ApiRequest::get("/v1/items"))
        .await
        .unwrap();
    assert_eq!(silent, None);

    let error: ConnectionError = gateway
        .api_request(&credential, ApiRequest::get("/v1/items").raising())
        .await
        .unwrap_err();
    assert_eq!(error.kind, FailureKind::Transport);
    assert_eq!(error.status(), None);
    assert!(error.to_string().contains("Test Credential"));
    assert!(!error.message.is_empty());

    let logs = logs_of(&gateway, &credential).await;
    assert_eq!(logs.len(), 2);
    for log in logs {
        assert!(log.code.is_none());
        assert!(log.error.is_some_and(|error| !error.is_empty()));
    }
}

#[tokio::test]
async fn test_invalid_json_success_returns_none_even_when_raising() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/items"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let db = setup_test_db_arc().await.unwrap();
    let credential = create_credential(&db, CREDENTIAL, "acme", &server.uri())
        .await
        .unwrap();
    let gateway = test_gateway(&db, OverrideRegistry::new());

    let result = gateway
        .api_request(&credential, ApiRequest::get("/v1/items").raising())
        .await
        .unwrap();

    assert_eq!(result, None);
    let logs = logs_of(&gateway, &credential).await;
    assert_eq!(logs[0].code.as_deref(), Some("200"));
    assert_eq!(logs[0].response_body.as_deref(), Some("not json"));
    assert!(logs[0].error.is_some());
}

#[tokio::test]
async fn test_token_refresh_retries_once_with_fresh_headers() {
    let server = MockServer::start().await;
    mount_token_api(&server).await;

    let db = setup_test_db_arc().await.unwrap();
    let credential = create_credential(&db, CREDENTIAL, "tokens", &server.uri())
        .await
        .unwrap();
    let (registry, refresh_calls) = token_registry(true);
    let gateway = test_gateway(&db, registry);

    let result = gateway
        .api_request(&credential, ApiRequest::get("/v1/me").raising())
        .await
        .unwrap();

    assert_eq!(result, Some(json!({"id": 7})));
    assert_eq!(refresh_calls.load(Ordering::SeqCst), 1);

    let logs = logs_of(&gateway, &credential).await;
    assert_eq!(logs.len(), 2);
    let mut codes: Vec<_> = logs.iter().filter_map(|log| log.code.clone()).collect();
    codes.sort();
    assert_eq!(codes, vec!["200".to_string(), "401".to_string()]);

    let failed = logs.iter().find(|log| log.code.as_deref() == Some("401")).unwrap();
    assert_eq!(failed.error.as_deref(), Some("token expired"));
    assert!(failed.headers.as_deref().unwrap().contains("Bearer stale"));
}

#[tokio::test]
async fn test_refresh_failure_does_not_retry() {
    let server = MockServer::start().await;
    mount_token_api(&server).await;

    let db = setup_test_db_arc().await.unwrap();
    let credential = create_credential(&db, CREDENTIAL, "tokens", &server.uri())
        .await
        .unwrap();
    let (registry, refresh_calls) = token_registry(false);
    let gateway = test_gateway(&db, registry);

    let silent = gateway
        .api_request(&credential, ApiRequest::get("/v1/me"))
        .await
        .unwrap();
    assert_eq!(silent, None);

    let error = gateway
        .api_request(&credential, ApiRequest::get("/v1/me").raising())
        .await
        .unwrap_err();
    assert_eq!(error.kind, FailureKind::TokenRefresh { status: 401 });
    assert_eq!(
        error.to_string(),
        "Connector \"Test Credential\" connection error: \"token expired\""
    );

    assert_eq!(refresh_calls.load(Ordering::SeqCst), 2);
    assert_eq!(logs_of(&gateway, &credential).await.len(), 2);
}

#[tokio::test]
async fn test_retry_is_attempted_at_most_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "token expired"})),
        )
        .expect(2)
        .mount(&server)
        .await;

    let db = setup_test_db_arc().await.unwrap();
    let credential = create_credential(&db, CREDENTIAL, "tokens", &server.uri())
        .await
        .unwrap();
    let (registry, refresh_calls) = token_registry(true);
    let gateway = test_gateway(&db, registry);

    let error = gateway
        .api_request(&credential, ApiRequest::get("/v1/me").raising())
        .await
        .unwrap_err();

    assert_eq!(error.kind, FailureKind::TokenRefresh { status: 401 });
    assert_eq!(
        error.to_string(),
        "Connector \"Test Credential\" connection error: \"token expired\""
    );
    assert_eq!(refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(logs_of(&gateway, &credential).await.len(), 2);
}

#[tokio::test]
async fn test_retry_headers_reuse_resends_caller_headers() {
    let server = MockServer::start().await;
    mount_token_api(&server).await;

    let db = setup_test_db_arc().await.unwrap();
    let credential = create_credential(&db, CREDENTIAL, "tokens", &server.uri())
        .await
        .unwrap();
    let (registry, refresh_calls) = token_registry(true);
    let gateway = gateway_with_config(
        &db,
        registry,
        GatewayConfig {
            retry_headers: RetryHeaders::Reuse,
        },
    );

    let result = gateway
        .api_request(
            &credential,
            ApiRequest::get("/v1/me").with_headers([("Authorization", "Bearer stale")]),
        )
        .await
        .unwrap();

    assert_eq!(result, None);
    assert_eq!(refresh_calls.load(Ordering::SeqCst), 1);
    let logs = logs_of(&gateway, &credential).await;
    assert_eq!(logs.len(), 2);
    assert!(
        logs.iter()
            .all(|log| log.headers.as_deref().unwrap().contains("Bearer stale"))
    );
}

#[tokio::test]
async fn test_retry_headers_recompute_replaces_caller_headers() {
    let server = MockServer::start().await;
    mount_token_api(&server).await;

    let db = setup_test_db_arc().await.unwrap();
    let credential = create_credential(&db, CREDENTIAL, "tokens", &server.uri())
        .await
        .unwrap();
    let (registry, _) = token_registry(true);
    let gateway = test_gateway(&db, registry);

    let result = gateway
        .api_request(
            &credential,
            ApiRequest::get("/v1/me").with_headers([("Authorization", "Bearer stale")]),
        )
        .await
        .unwrap();

    assert_eq!(result, Some(json!({"id": 7})));
}

struct Canned;

#[async_trait]
impl ApiRequestHook for Canned {
    async fn api_request(
        &self,
        _gateway: &ApiGateway,
        _credential: &ApiCredential,
        _request: ApiRequest,
    ) -> Result<Option<Value>, ConnectionError> {
        Ok(Some(json!({"overridden": true})))
    }
}

/// Prefixes every path with the API version, then runs the default pipeline
struct Versioned;

#[async_trait]
impl ApiRequestHook for Versioned {
    async fn api_request(
        &self,
        gateway: &ApiGateway,
        credential: &ApiCredential,
        request: ApiRequest,
    ) -> Result<Option<Value>, ConnectionError> {
        let path = format!("/v2/{}", request.path.trim_start_matches('/'));
        gateway
            .dispatch(credential, ApiRequest { path, ..request })
            .await
    }
}

#[tokio::test]
async fn test_api_request_override_replaces_pipeline() {
    let db = setup_test_db_arc().await.unwrap();
    let credential = create_credential(&db, CREDENTIAL, "canned", &unused_local_url())
        .await
        .unwrap();
    let mut registry = OverrideRegistry::new();
    registry.register("canned", Hook::api_request(Canned));
    let gateway = test_gateway(&db, registry);

    let result = gateway
        .api_request(&credential, ApiRequest::get("/anything").raising())
        .await
        .unwrap();

    assert_eq!(result, Some(json!({"overridden": true})));
    assert!(logs_of(&gateway, &credential).await.is_empty());
}

#[tokio::test]
async fn test_api_request_override_can_delegate_to_default_pipeline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let db = setup_test_db_arc().await.unwrap();
    let credential = create_credential(&db, CREDENTIAL, "versioned", &server.uri())
        .await
        .unwrap();
    let mut registry = OverrideRegistry::new();
    registry.register("versioned", Hook::api_request(Versioned));
    let gateway = test_gateway(&db, registry);

    let result = gateway
        .api_request(&credential, ApiRequest::get("/items"))
        .await
        .unwrap();

    assert_eq!(result, Some(json!([])));
    assert_eq!(logs_of(&gateway, &credential).await.len(), 1);
}

#[tokio::test]
async fn test_url_and_success_overrides() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/items.json"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"items": []})))
        .mount(&server)
        .await;

    let db = setup_test_db_arc().await.unwrap();
    let credential = create_credential(&db, CREDENTIAL, "legacy", &server.uri())
        .await
        .unwrap();
    let mut registry = OverrideRegistry::new();
    registry.register(
        "legacy",
        Hook::api_url(|credential: &ApiCredential, path: &str| {
            format!("{}/api/{}.json", credential.api_url(), path.trim_matches('/'))
        }),
    );
    registry.register(
        "legacy",
        Hook::is_api_success(|_: &ApiCredential, response: &ApiResponse| {
            response.status < 500
        }),
    );
    let gateway = test_gateway(&db, registry);

    let result = gateway
        .api_request(&credential, ApiRequest::get("items").raising())
        .await
        .unwrap();

    assert_eq!(result, Some(json!({"items": []})));
    let logs = logs_of(&gateway, &credential).await;
    assert_eq!(logs[0].name, format!("{}/api/items.json", server.uri()));
    assert_eq!(logs[0].code.as_deref(), Some("404"));
}

#[tokio::test]
async fn test_disabled_or_inactive_log_source_does_not_block_calls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let db = setup_test_db_arc().await.unwrap();
    let credential = create_credential(&db, CREDENTIAL, "acme", &server.uri())
        .await
        .unwrap();
    let sources = LogSourceRepository::new(db.clone());
    let gateway = test_gateway(&db, OverrideRegistry::new());

    sources
        .update_settings(
            credential.log_source_id(),
            LogSourceSettings {
                is_log_enabled: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let result = gateway
        .api_request(&credential, ApiRequest::get("/v1/items").raising())
        .await
        .unwrap();
    assert_eq!(result, Some(json!({"ok": true})));

    sources
        .update_settings(
            credential.log_source_id(),
            LogSourceSettings {
                is_log_enabled: Some(true),
                active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let result = gateway
        .api_request(&credential, ApiRequest::get("/v1/items").raising())
        .await
        .unwrap();
    assert_eq!(result, Some(json!({"ok": true})));

    assert!(logs_of(&gateway, &credential).await.is_empty());
}
