//! Shared application state.

use std::sync::Arc;

use node_verifier::VerifierConfig;

/// Shared state held by the request handlers.
///
/// Verifiers are built per request, because each one captures per-node
/// state (the normalized hostname and its resolution result). The shared
/// state therefore only carries the configuration they are built from.
/// This is wrapped in an [`Arc`] and passed to handlers via Axum's
/// `State` extractor.
pub struct AppState {
    /// Configuration handed to every verifier the handlers construct.
    pub verifier: VerifierConfig,
}

/// Thread-safe alias for `AppState`.
pub type SharedState = Arc<AppState>;
