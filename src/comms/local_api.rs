use anyhow::{Context, Result};
use axum::{
    extract::Request,
    http::{StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tracing::{error, info};

use crate::comms::correlation_id::{request_id, request_id_layers};
use crate::comms::{access_token, todo};
use crate::config::Config;
use crate::protocol::Message;
use crate::security::audit_log::AuditLogger;
use crate::security::{ClientIdentity, KeyStore, TokenIssuer, TokenVerifier};
use crate::todos::TodoRepository;

pub type SharedState = Arc<AppState>;

/// Everything the handlers need, built once at startup.
pub struct AppState {
    pub config: Arc<Config>,
    pub client: Arc<ClientIdentity>,
    pub issuer: TokenIssuer,
    pub verifier: TokenVerifier,
    pub todos: Arc<dyn TodoRepository>,
    pub audit: AuditLogger,
}

impl AppState {
    pub fn new(config: Arc<Config>, keys: KeyStore, todos: Arc<dyn TodoRepository>) -> Self {
        let issuer = TokenIssuer::new(
            config.token.issuer.clone(),
            config.token.expire,
            keys.client.clone(),
            keys.server.clone(),
        );
        let verifier = TokenVerifier::new(&config.token.issuer, keys.server.clone());
        Self {
            config,
            client: keys.client,
            issuer,
            verifier,
            todos,
            audit: AuditLogger::new(),
        }
    }
}

// Liveness probe
async fn halo() -> impl IntoResponse {
    Json(Message {
        response_code: "00".to_string(),
        response_message: "Halo".to_string(),
    })
}

/// Path and query string as logged for a request; the query is empty when absent.
fn request_target(uri: &Uri) -> (String, String) {
    (
        uri.path().to_string(),
        uri.query().unwrap_or_default().to_string(),
    )
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let (path, query) = request_target(request.uri());
    let request_id = request_id(request.headers()).unwrap_or_default().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    info!(
        %method,
        path,
        query,
        status = response.status().as_u16(),
        latency_ms = started.elapsed().as_millis() as u64,
        request_id,
        "request completed"
    );
    response
}

pub fn create_router(state: SharedState) -> Router {
    let (set_request_id, propagate_request_id) = request_id_layers();
    let timeout = state.config.timeout();

    Router::new()
        .route("/halo", get(halo))
        .route("/v1.0/access-token", post(access_token::issue_token))
        .route("/v1.0/todo", post(todo::add_todo).get(todo::list_todos))
        .route("/v1.0/todo/{id}", get(todo::get_todo))
        .layer(middleware::from_fn(log_requests))
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout))
        .layer(CorsLayer::permissive())
        .layer(propagate_request_id)
        .layer(set_request_id)
        .with_state(state)
}

pub async fn serve(state: SharedState, port: u16) -> Result<()> {
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(address = %addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    info!("HTTP server stopped");
    Ok(())
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown signal received, draining connections");
}
