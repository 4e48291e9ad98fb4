//! Application startup and lifecycle management.

use crate::config::MentorConfig;
use crate::handlers;
use crate::services::providers::{mock::MockChatProvider, relay, ChatProvider};
use crate::services::{MentorDb, MeteredChat};
use axum::middleware::from_fn;
use axum::{
    routing::{get, post},
    Router,
};
use service_core::clients::{CreditsApi, CreditsClient};
use service_core::error::AppError;
use service_core::middleware::{metrics::metrics_middleware, tracing::request_id_middleware};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: MentorConfig,
    pub db: MentorDb,
    pub gate: MeteredChat,
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: MentorConfig) -> Result<Self, AppError> {
        let db = MentorDb::connect(&config.mongodb.uri, &config.mongodb.database).await?;
        db.initialize_indexes().await?;

        let provider = build_provider(&config)?;
        let credits: Arc<dyn CreditsApi> = Arc::new(CreditsClient::new(&config.credits.base_url));
        let gate = MeteredChat::new(credits, provider);

        let state = AppState {
            config: config.clone(),
            db,
            gate,
        };

        let router = Router::new()
            .route("/health", get(handlers::health_check))
            .route("/ready", get(handlers::readiness_check))
            .route("/metrics", get(handlers::metrics_endpoint))
            .route("/mentor/ask", post(handlers::mentor::ask))
            .route("/jobs/match", post(handlers::jobs::match_jobs))
            .route("/jobs", post(handlers::jobs::create_job))
            .route("/jobs", get(handlers::jobs::list_jobs))
            .layer(from_fn(metrics_middleware))
            .layer(from_fn(request_id_middleware))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or("-");

                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        uri = %request.uri(),
                        account_id = tracing::field::Empty,
                    )
                }),
            )
            .with_state(state);

        // Bind listener (port 0 = random port for testing)
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    /// Run the HTTP server until it is stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        tracing::info!("Listening on {}", self.listener.local_addr()?);
        axum::serve(self.listener, self.router).await
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

/// Select the chat provider: the real relay when a key is configured,
/// the mock otherwise.
fn build_provider(config: &MentorConfig) -> Result<Arc<dyn ChatProvider>, AppError> {
    match &config.relay.api_key {
        Some(api_key) => {
            let provider = relay::RelayChatProvider::new(relay::RelayConfig {
                base_url: config.relay.base_url.clone(),
                api_key: api_key.clone(),
                timeout_secs: config.relay.timeout_secs,
            })
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e.to_string())))?;
            Ok(Arc::new(provider))
        }
        None => {
            tracing::warn!("No relay API key configured, using the mock chat provider");
            Ok(Arc::new(MockChatProvider::new(true)))
        }
    }
}
