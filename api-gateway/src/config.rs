//! API gateway configuration.
//!
//! Only the HTTP listen address lives here. Everything the checks need
//! (timeouts, recheck delay, MaxMind credentials) is carried by
//! `node_verifier::VerifierConfig`.

use std::net::SocketAddr;

/// Configuration for the API gateway HTTP server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP server to.
    pub listen_addr: SocketAddr,
}

impl Default for ApiConfig {
    fn default() -> Self {
        // Safe to unwrap: fixed, valid address literal.
        // Bind to all interfaces so a container port mapping is reachable
        // from the host.
        let addr: SocketAddr = "0.0.0.0:8090"
            .parse()
            .expect("hard-coded API listen address should parse");
        Self { listen_addr: addr }
    }
}

impl ApiConfig {
    /// Default configuration, with the listen address overridable through
    /// `API_LISTEN_ADDR`.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(raw) = std::env::var("API_LISTEN_ADDR") {
            match raw.parse() {
                Ok(addr) => cfg.listen_addr = addr,
                Err(e) => tracing::warn!("ignoring invalid API_LISTEN_ADDR `{raw}`: {e}"),
            }
        }
        cfg
    }
}
