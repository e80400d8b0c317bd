//! Top-level configuration for node verification.
//!
//! This module aggregates configuration for:
//!
//! - the HTTP client used to scrape `/metrics` (connect/read timeouts),
//! - DNS resolution (lookup budget),
//! - the pause between the two fetches of the progress check,
//! - optional MaxMind credentials for geolocation.
//!
//! The idea is that binaries (the command-line check, the API gateway) can
//! build a [`VerifierConfig`] once, through defaults or [`VerifierConfig::from_env`],
//! and hand it to every verifier they construct.

use std::time::Duration;

/// Configuration for the metrics HTTP client.
#[derive(Clone, Debug)]
pub struct HttpConfig {
    /// Budget for establishing the TCP connection.
    pub connect_timeout: Duration,
    /// Budget for receiving the response, applied as the client's
    /// whole-request deadline.
    pub read_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(2),
            read_timeout: Duration::from_secs(3),
        }
    }
}

/// Configuration for hostname resolution.
#[derive(Clone, Debug)]
pub struct DnsConfig {
    /// Upper bound on how long a lookup may take.
    pub timeout: Duration,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(500),
        }
    }
}

/// Credentials for the MaxMind GeoIP2 web service.
#[derive(Clone, Debug)]
pub struct MaxMindConfig {
    /// MaxMind account identifier.
    pub account_id: String,
    /// License key paired with the account.
    pub license_key: String,
}

impl MaxMindConfig {
    /// Reads credentials from `MAXMIND_ACCOUNT_ID` and `MAXMIND_LICENSE_KEY`.
    ///
    /// Returns `None` when either variable is unset. Geolocation is an
    /// optional check, so absent credentials are not an error here; lookups
    /// simply report the missing configuration when attempted.
    pub fn from_env() -> Option<Self> {
        let account_id = std::env::var("MAXMIND_ACCOUNT_ID").ok()?;
        let license_key = std::env::var("MAXMIND_LICENSE_KEY").ok()?;
        Some(Self {
            account_id,
            license_key,
        })
    }
}

/// Top-level configuration for a node verifier.
#[derive(Clone, Debug)]
pub struct VerifierConfig {
    /// Metrics HTTP client settings.
    pub http: HttpConfig,
    /// DNS resolution settings.
    pub dns: DnsConfig,
    /// Pause between the two metrics fetches of the progress check, giving
    /// the node time to commit new versions.
    pub recheck_delay: Duration,
    /// MaxMind credentials; `None` disables geolocation lookups.
    pub maxmind: Option<MaxMindConfig>,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            dns: DnsConfig::default(),
            recheck_delay: Duration::from_secs(1),
            maxmind: None,
        }
    }
}

impl VerifierConfig {
    /// Default configuration, with MaxMind credentials picked up from the
    /// environment when present.
    pub fn from_env() -> Self {
        Self {
            maxmind: MaxMindConfig::from_env(),
            ..Self::default()
        }
    }
}
