//! Hostname resolution with a bounded lookup time.
//!
//! Verification targets are user-supplied hostnames, and a slow or broken
//! DNS server must not hang an interactive check. `ToSocketAddrs` has no
//! timeout of its own, so lookups run on a helper thread and the caller
//! waits at most the configured budget for an answer. The [`HostResolver`]
//! trait keeps everything above this module testable without a network.

use std::fmt;
use std::net::{IpAddr, ToSocketAddrs};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Errors that can occur while resolving a hostname.
#[derive(Clone, Debug, PartialEq)]
pub enum ResolveError {
    /// The lookup did not finish within the configured budget.
    Timeout(Duration),
    /// The system resolver reported an error.
    Lookup(String),
    /// The lookup succeeded but returned no addresses.
    NoAddress,
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::Timeout(limit) => {
                write!(f, "DNS error: lookup timed out after {limit:?}")
            }
            ResolveError::Lookup(msg) => write!(f, "DNS error: {msg}"),
            ResolveError::NoAddress => write!(f, "DNS error: no addresses returned"),
        }
    }
}

impl std::error::Error for ResolveError {}

/// Resolves hostnames to IP addresses.
pub trait HostResolver {
    fn resolve(&self, hostname: &str) -> Result<IpAddr, ResolveError>;
}

/// [`HostResolver`] backed by the operating system's resolver.
///
/// The first address returned wins. A lookup that outlives the budget is
/// abandoned; its helper thread finishes in the background and the send
/// into the dropped channel is discarded.
#[derive(Clone, Debug)]
pub struct SystemResolver {
    timeout: Duration,
}

impl SystemResolver {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl HostResolver for SystemResolver {
    fn resolve(&self, hostname: &str) -> Result<IpAddr, ResolveError> {
        let (tx, rx) = mpsc::channel();
        let host = hostname.to_string();
        thread::spawn(move || {
            // Port 0 only satisfies the ToSocketAddrs shape; it is unused.
            let result = (host.as_str(), 0u16)
                .to_socket_addrs()
                .map(|mut addrs| addrs.next().map(|addr| addr.ip()));
            let _ = tx.send(result);
        });

        match rx.recv_timeout(self.timeout) {
            Ok(Ok(Some(ip))) => Ok(ip),
            Ok(Ok(None)) => Err(ResolveError::NoAddress),
            Ok(Err(e)) => Err(ResolveError::Lookup(e.to_string())),
            Err(_) => Err(ResolveError::Timeout(self.timeout)),
        }
    }
}
