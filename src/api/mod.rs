use crate::{
    api::handlers::{auth, root},
    store::PgTokenStore,
};
use anyhow::{Context, Result};
use axum::{
    Extension, Router,
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    routing::get,
};
use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer,
    timeout::TimeoutLayer, trace::TraceLayer,
};
use tracing::{Span, info, info_span};
use ulid::Ulid;
use utoipa_axum::router::OpenApiRouter;

pub mod handlers;
// OpenAPI router wiring and route registration live in openapi.rs.
mod openapi;

pub use openapi::openapi;

/// Build the API router with all documented routes registered.
#[must_use]
pub fn router() -> OpenApiRouter {
    openapi::api_router()
}

/// Connection pool and request limits for the server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    db_max_connections: u32,
    db_acquire_timeout: Duration,
    request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_max_connections: 5,
            db_acquire_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_db_max_connections(mut self, connections: u32) -> Self {
        self.db_max_connections = connections;
        self
    }

    #[must_use]
    pub fn with_db_acquire_timeout_seconds(mut self, seconds: u64) -> Self {
        self.db_acquire_timeout = Duration::from_secs(seconds);
        self
    }

    #[must_use]
    pub fn with_request_timeout_seconds(mut self, seconds: u64) -> Self {
        self.request_timeout = Duration::from_secs(seconds);
        self
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(
    port: u16,
    dsn: SecretString,
    server_config: ServerConfig,
    auth_config: auth::AuthConfig,
) -> Result<()> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(server_config.db_max_connections)
        .acquire_timeout(server_config.db_acquire_timeout)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(dsn.expose_secret())
        .await
        .context("Failed to connect to database")?;

    info!(
        invalidate_scope = %auth_config.invalidate_scope(),
        max_connections = server_config.db_max_connections,
        "Connected to database"
    );

    let store = Arc::new(PgTokenStore::new(pool));
    let auth_state = Arc::new(auth::AuthState::new(auth_config, store));

    let app = app(auth_state, server_config.request_timeout());

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {err}");
            }
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

/// Build the full application: documented routes, `/`, and the middleware stack.
///
/// Every request gets an `x-request-id` (a ULID unless the caller sent one),
/// an `http.request` span and a deadline after which it is answered with 408
/// and its handler future is dropped.
pub fn app(auth_state: Arc<auth::AuthState>, request_timeout: Duration) -> Router {
    let (router, _openapi) = router().split_for_parts();
    router.route("/", get(root::root)).layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static("x-request-id"),
                |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                "x-request-id",
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(TimeoutLayer::new(request_timeout))
            .layer(Extension(auth_state)),
    )
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
