//! Node verification library.
//!
//! Building blocks for checking that a blockchain node is alive and
//! making consensus progress:
//!
//! - hostname normalization ([`hostname`]),
//! - Prometheus text exposition parsing ([`metrics`]),
//! - DNS resolution with a bounded lookup time ([`resolve`]),
//! - metrics scraping over HTTP ([`scrape`]),
//! - geolocation of resolved addresses ([`geo`]),
//! - the verification pipeline itself ([`node`]),
//! - aggregated configuration ([`config`]).
//!
//! The pipeline is deliberately synchronous: a check is two timed fetches
//! with a fixed pause in between, and callers on an async runtime should
//! run it on their blocking thread pool (the `api-gateway` crate does
//! exactly that). This crate's own binary runs a one-shot check from the
//! command line.

pub mod config;
pub mod geo;
pub mod hostname;
pub mod metrics;
pub mod node;
pub mod resolve;
pub mod scrape;

// Re-export configuration types.
pub use config::{DnsConfig, HttpConfig, MaxMindConfig, VerifierConfig};

// Re-export the verifier and its outcome types.
pub use node::{
    COMMITTED_VERSION_COUNTER, CheckError, CheckOutcome, DEFAULT_API_PORT, DEFAULT_METRICS_PORT,
    NodeVerifier,
};

// Re-export the parser surface.
pub use metrics::{MetricSample, ParseError, extract_counter, parse_samples};

// Re-export collaborator traits and their production implementations.
pub use geo::{GeoError, GeoProvider, MaxMindClient};
pub use resolve::{HostResolver, ResolveError, SystemResolver};
pub use scrape::{FetchError, HttpMetricsSource, MetricsSource};

/// Verifier wired with the production collaborator stack:
///
/// - [`SystemResolver`] for bounded DNS lookups,
/// - [`HttpMetricsSource`] for `/metrics` scraping,
/// - [`MaxMindClient`] for geolocation.
pub type DefaultNodeVerifier = NodeVerifier<SystemResolver, HttpMetricsSource, MaxMindClient>;
