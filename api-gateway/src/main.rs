// api-gateway/src/main.rs

//! API gateway binary.
//!
//! This binary exposes a small HTTP API on top of the `node-verifier`
//! crate:
//!
//! - `GET /health`
//! - `POST /nodes/verify`
//! - `POST /nodes/metrics`
//! - `POST /nodes/location`
//!
//! The verification pipeline is synchronous on purpose (two timed fetches
//! with a fixed pause between them), so the handlers bridge onto tokio's
//! blocking thread pool instead of making the library async.

mod config;
mod routes;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::signal;

use node_verifier::VerifierConfig;

use config::ApiConfig;
use routes::{health, nodes};
use state::{AppState, SharedState};

#[tokio::main]
async fn main() {
    // Basic tracing setup.
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "api_gateway=info,node_verifier=info".to_string()),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let api_cfg = ApiConfig::from_env();
    let verifier_cfg = VerifierConfig::from_env();

    if verifier_cfg.maxmind.is_none() {
        tracing::warn!(
            "MAXMIND_ACCOUNT_ID / MAXMIND_LICENSE_KEY not set; /nodes/location will report failures"
        );
    }

    let app_state: SharedState = Arc::new(AppState {
        verifier: verifier_cfg,
    });

    let app = Router::new()
        .route("/health", get(health::health))
        .route("/nodes/verify", post(nodes::verify))
        .route("/nodes/metrics", post(nodes::metrics))
        .route("/nodes/location", post(nodes::location))
        .with_state(app_state);

    tracing::info!("API gateway listening on http://{}", api_cfg.listen_addr);

    let listener = tokio::net::TcpListener::bind(api_cfg.listen_addr)
        .await
        .map_err(|e| format!("failed to bind {}: {e}", api_cfg.listen_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("API server error: {e}"))?;

    Ok(())
}

/// Waits for Ctrl-C and returns, used for graceful shutdown.
async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
