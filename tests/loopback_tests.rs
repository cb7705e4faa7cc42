use api_connector::config::AppConfig;
use api_connector::connectors::{LOOPBACK_CODE, LOOPBACK_ECHO_PATH, OverrideRegistry};
use api_connector::gateway::ApiRequest;
use api_connector::request_log::LogSourceOwner;
use api_connector::server::{AppState, create_app};
use reqwest::Method;
use serde_json::json;
use std::sync::Arc;
mod test_utils;
use test_utils::{create_credential, setup_file_db};

#[tokio::test]
async fn test_loopback_connector_calls_this_service() {
    let dir = tempfile::TempDir::new().unwrap();
    let db = setup_file_db(&dir).await.unwrap();

    let config = Arc::new(AppConfig::default());
    let registry = Arc::new(OverrideRegistry::initialize(&config));
    let state = AppState::new(config, db.clone(), registry).unwrap();
    let gateway = state.gateway.clone();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        axum::serve(listener, create_app(state)).await.unwrap();
    });

    let credential = create_credential(&db, "Test Credential", LOOPBACK_CODE, &format!("http://{addr}"))
        .await
        .unwrap();

    let result = gateway
        .api_request(
            &credential,
            ApiRequest::new(Method::GET, LOOPBACK_ECHO_PATH).raising(),
        )
        .await
        .unwrap();
    assert_eq!(result, Some(json!({"a": 1})));

    let logs = gateway
        .logs()
        .list_for_source(credential.log_source_id(), 10)
        .await
        .unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].name, format!("http://{addr}/test/echo"));
    assert_eq!(logs[0].code.as_deref(), Some("200"));
    assert!(logs[0].headers.as_deref().unwrap().contains("text/plain"));
    assert_eq!(logs[0].response_body.as_deref(), Some("{\n  \"a\": 1\n}"));

    server.abort();
}
