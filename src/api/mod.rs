use crate::{api::handlers::health, session::SessionScope, store::Store};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::{Extension, MatchedPath},
    http::{HeaderName, HeaderValue, Request},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, info_span, Span};
use ulid::Ulid;

pub mod error;
pub mod handlers;
mod openapi;

pub use openapi::openapi;

use handlers::adv;

const REQUEST_ID: &str = "x-request-id";

/// Build the application router around a session scope.
#[must_use]
pub fn router(scope: SessionScope) -> Router {
    Router::new()
        .route(
            "/adv/",
            post(adv::create_advertisement).fallback(error::method_not_allowed),
        )
        .route(
            "/adv/:id/",
            get(adv::get_advertisement)
                .delete(adv::delete_advertisement)
                .fallback(error::method_not_allowed),
        )
        .route(
            "/health",
            get(health::health).fallback(error::method_not_allowed),
        )
        .route(
            "/api-docs/openapi.json",
            get(openapi::serve).fallback(error::method_not_allowed),
        )
        .fallback(error::fallback)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static(REQUEST_ID),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    REQUEST_ID,
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(scope)),
        )
}

/// Start the server and block until a shutdown signal has drained it.
/// # Errors
/// Return error if the listener cannot be bound or the server fails
pub async fn serve(listen: &str, port: u16, store: Arc<dyn Store>) -> Result<()> {
    let app = router(SessionScope::new(store));

    let listener = TcpListener::bind((listen, port))
        .await
        .with_context(|| format!("Failed to bind {listen}:{port}"))?;

    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gracefully shutdown");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!("Failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID)
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
