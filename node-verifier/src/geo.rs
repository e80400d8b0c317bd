//! Geolocation of resolved node addresses.
//!
//! Operators occasionally register a DNS name that points at the wrong
//! machine entirely; showing where the resolved address actually lives
//! makes that easy to spot. Lookups go to the MaxMind GeoIP2 Insights web
//! service, and the provider's record comes back untouched as raw JSON so
//! callers are insulated from MaxMind's response schema.

use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;

use crate::config::MaxMindConfig;

/// Base URL of the GeoIP2 Insights endpoint.
const INSIGHTS_URL: &str = "https://geoip.maxmind.com/geoip/v2.1/insights";

/// Budget for one geolocation request. Generous compared to the metrics
/// fetches; this path is informational and never inside the progress check.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from a geolocation lookup.
#[derive(Clone, Debug)]
pub enum GeoError {
    /// No credentials were configured.
    MissingCredentials,
    /// The caller has no resolved address to look up.
    Unresolved(String),
    /// The provider rejected the request or could not be reached.
    Provider(String),
}

impl fmt::Display for GeoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoError::MissingCredentials => {
                write!(f, "MaxMind credentials are not configured")
            }
            GeoError::Unresolved(msg) => {
                write!(f, "Can not fetch location with no IP: {msg}")
            }
            GeoError::Provider(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for GeoError {}

/// Looks up a provider-defined geolocation record for an address.
pub trait GeoProvider {
    fn lookup(&self, ip: IpAddr) -> Result<Value, GeoError>;
}

/// [`GeoProvider`] backed by the MaxMind GeoIP2 Insights web service.
pub struct MaxMindClient {
    credentials: Option<MaxMindConfig>,
    client: Client,
}

impl MaxMindClient {
    /// Builds a client. `credentials` may be absent, in which case every
    /// lookup fails with [`GeoError::MissingCredentials`].
    pub fn new(credentials: Option<MaxMindConfig>) -> Result<Self, GeoError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GeoError::Provider(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            credentials,
            client,
        })
    }
}

impl GeoProvider for MaxMindClient {
    fn lookup(&self, ip: IpAddr) -> Result<Value, GeoError> {
        let creds = self
            .credentials
            .as_ref()
            .ok_or(GeoError::MissingCredentials)?;

        let url = format!("{INSIGHTS_URL}/{ip}");
        let response = self
            .client
            .get(&url)
            .basic_auth(&creds.account_id, Some(&creds.license_key))
            .send()
            .map_err(|e| GeoError::Provider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeoError::Provider(format!(
                "geolocation service returned HTTP status {status}"
            )));
        }

        response
            .json::<Value>()
            .map_err(|e| GeoError::Provider(format!("failed to parse geolocation response: {e}")))
    }
}
