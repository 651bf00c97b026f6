//! HTTP API server
//!
//! | Route | Action |
//! |---|---|
//! | `GET /predict` | score the data table, append to the prediction log |
//! | `GET /deploy-auto` | run the deployment workflow |
//! | `GET /health` | liveness |
//!
//! Every route answers `200 OK` with a JSON body; failures are reported in
//! the body, never through the status code.

mod handlers;

pub use handlers::{deploy_auto, health, predict, HealthResponse};

use std::net::SocketAddr;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::context::ServiceContext;
use crate::Result;

/// Build the router over a service context.
pub fn router(context: ServiceContext) -> Router {
    Router::new()
        .route("/predict", get(predict))
        .route("/deploy-auto", get(deploy_auto))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(context)
}

/// Bind `addr` and serve until the process stops.
///
/// # Errors
///
/// Returns error if the address cannot be bound.
pub async fn serve(context: ServiceContext, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");
    axum::serve(listener, router(context)).await?;
    Ok(())
}
