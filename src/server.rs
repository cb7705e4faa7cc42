//! # Server Configuration
//!
//! Router, shared state and OpenAPI document of the operator API, plus the
//! service run loop that hosts the retention sweeper next to the server.

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, patch, post},
};
use sea_orm::DatabaseConnection;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::connectors::OverrideRegistry;
use crate::gateway::ApiGateway;
use crate::handlers;
use crate::retention::LogRetentionSweeper;
use crate::telemetry;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Arc<DatabaseConnection>,
    pub gateway: ApiGateway,
}

impl AppState {
    /// Builds the state with a gateway using the standard HTTP client
    pub fn new(
        config: Arc<AppConfig>,
        db: Arc<DatabaseConnection>,
        registry: Arc<OverrideRegistry>,
    ) -> Result<Self, reqwest::Error> {
        let gateway = ApiGateway::new(db.clone(), registry, config.gateway.clone())?;
        Ok(Self {
            config,
            db,
            gateway,
        })
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/test/echo", get(handlers::test_echo))
        .route("/connectors", get(handlers::connectors::list_connectors))
        .route(
            "/connectors/{id}",
            patch(handlers::connectors::update_connector),
        )
        .route(
            "/credentials",
            get(handlers::credentials::list_credentials),
        )
        .route(
            "/credentials/{name}",
            patch(handlers::credentials::update_credential),
        )
        .route(
            "/credentials/{name}/logs",
            get(handlers::credentials::list_credential_logs),
        )
        .route(
            "/credentials/{name}/requests",
            post(handlers::credentials::call_credential),
        )
        .route(
            "/log-sources",
            get(handlers::log_sources::list_log_sources),
        )
        .route(
            "/log-sources/{id}",
            patch(handlers::log_sources::update_log_source),
        )
        .route("/logs/purge", post(handlers::logs::purge_logs))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(telemetry::trace_id_middleware))
}

/// Starts the server and the retention sweeper; returns after Ctrl-C.
pub async fn run_server(
    config: AppConfig,
    db: DatabaseConnection,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Arc::new(config);
    let db = Arc::new(db);
    let registry = Arc::new(OverrideRegistry::initialize(&config));
    let state = AppState::new(config.clone(), db.clone(), registry)?;

    let shutdown = CancellationToken::new();
    let sweeper = if config.log_retention.enabled {
        let sweeper = LogRetentionSweeper::new(
            state.gateway.logs().clone(),
            config.log_retention.clone(),
        );
        Some(tokio::spawn(sweeper.run(shutdown.clone())))
    } else {
        tracing::info!("request log retention sweeper disabled");
        None
    };

    let app = create_app(state);

    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, profile = %config.profile, "server listening");

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "failed to listen for shutdown signal");
        }
        signal_token.cancel();
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .await?;

    shutdown.cancel();
    if let Some(handle) = sweeper
        && let Err(error) = handle.await
    {
        tracing::error!(%error, "retention sweeper task failed");
    }

    Ok(())
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::test_echo,
        crate::handlers::connectors::list_connectors,
        crate::handlers::connectors::update_connector,
        crate::handlers::credentials::list_credentials,
        crate::handlers::credentials::update_credential,
        crate::handlers::credentials::list_credential_logs,
        crate::handlers::credentials::call_credential,
        crate::handlers::log_sources::list_log_sources,
        crate::handlers::log_sources::update_log_source,
        crate::handlers::logs::purge_logs,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::error::ApiError,
            crate::handlers::HealthResponse,
            crate::connectors::Operation,
            crate::handlers::connectors::ConnectorInfo,
            crate::handlers::connectors::ConnectorsResponse,
            crate::handlers::connectors::UpdateConnectorRequest,
            crate::handlers::credentials::CredentialInfo,
            crate::handlers::credentials::CredentialsResponse,
            crate::handlers::credentials::UpdateCredentialRequest,
            crate::handlers::credentials::LogEntryInfo,
            crate::handlers::credentials::LogEntriesResponse,
            crate::handlers::credentials::CallRequest,
            crate::handlers::credentials::CallResponse,
            crate::handlers::log_sources::LogSourceInfo,
            crate::handlers::log_sources::LogSourcesResponse,
            crate::models::http_request_log_source::LogSourceSettings,
            crate::models::http_request_log_source::LogContentType,
            crate::handlers::logs::PurgeResponse,
        )
    ),
    tags(
        (name = "root", description = "Service information and probes"),
        (name = "connectors", description = "Outbound API connectors"),
        (name = "credentials", description = "Credentials, their request logs and gateway calls"),
        (name = "log-sources", description = "Request log source settings"),
        (name = "logs", description = "Request log maintenance")
    ),
    info(
        title = "API Connector",
        description = "Outbound API gateway with request logging",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
