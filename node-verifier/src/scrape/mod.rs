//! Fetching raw metrics text from a node.
//!
//! The verifier talks to nodes through the [`MetricsSource`] trait so the
//! pipeline can run against scripted responses in tests. The production
//! implementation, [`HttpMetricsSource`], scrapes
//! `http://{hostname}:{port}/metrics` over a blocking HTTP client with
//! fixed connect/read timeouts.

pub mod http;

pub use http::HttpMetricsSource;

use std::fmt;

/// Errors from a metrics fetch.
///
/// The two timeout variants stay distinguishable so a caller can tell "the
/// machine is unreachable" apart from "the machine accepted the connection
/// but the metrics endpoint is not answering".
#[derive(Clone, Debug)]
pub enum FetchError {
    /// The TCP connection did not come up within the connect budget.
    ConnectTimeout(String),
    /// The node accepted the connection but did not answer in time.
    ReadTimeout(String),
    /// Any other transport or protocol failure.
    Other(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::ConnectTimeout(msg) => write!(f, "Open timeout: {msg}"),
            FetchError::ReadTimeout(msg) => write!(f, "Read timeout: {msg}"),
            FetchError::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Retrieves the raw metrics document for a node.
pub trait MetricsSource {
    fn fetch(&self, hostname: &str, port: u16) -> Result<String, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_keep_distinct_prefixes() {
        let connect = FetchError::ConnectTimeout("no route to host".to_string());
        let read = FetchError::ReadTimeout("deadline elapsed".to_string());
        let other = FetchError::Other("connection refused".to_string());

        assert_eq!(connect.to_string(), "Open timeout: no route to host");
        assert_eq!(read.to_string(), "Read timeout: deadline elapsed");
        assert_eq!(other.to_string(), "Error: connection refused");
    }
}
