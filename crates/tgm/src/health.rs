//! Liveness endpoint for container platforms.

use std::{net::SocketAddr, time::Instant};

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde_json::{json, Value};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use tgm_core::dispatcher::DispatcherState;

const SERVICE_NAME: &str = "tgmirror";

#[derive(Clone)]
struct HealthState {
    dispatcher: watch::Receiver<DispatcherState>,
    started: Instant,
}

pub fn router(dispatcher: watch::Receiver<DispatcherState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(HealthState {
            dispatcher,
            started: Instant::now(),
        })
}

async fn health(State(s): State<HealthState>) -> Json<Value> {
    let state = *s.dispatcher.borrow();
    Json(json!({
        "status": "UP",
        "service": SERVICE_NAME,
        "state": state,
        "timestamp": Utc::now().to_rfc3339(),
        "uptime": s.started.elapsed().as_secs_f64(),
    }))
}

/// Serve until `shutdown` fires. A bind failure only disables the endpoint.
pub async fn serve(
    addr: SocketAddr,
    dispatcher: watch::Receiver<DispatcherState>,
    shutdown: CancellationToken,
) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            warn!("Health endpoint disabled, cannot bind {addr}: {e}");
            return;
        }
    };
    info!("Health check server running on {addr}");

    if let Err(e) = axum::serve(listener, router(dispatcher))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
    {
        warn!("Health server error: {e}");
    }
}
