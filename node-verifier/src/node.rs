//! Node verification pipeline.
//!
//! A [`NodeVerifier`] checks that a blockchain node is alive and making
//! consensus progress: it fetches the node's `/metrics` page twice with a
//! pause in between and requires the last-committed-version counter to
//! strictly increase. The verifier is generic over its collaborators (DNS
//! resolution, metrics fetching, geolocation) so the pipeline can run
//! against stubs in tests; `DefaultNodeVerifier` at the crate root wires
//! up the production implementations.
//!
//! Checks never panic and never propagate collaborator errors upward as
//! anything other than values: [`NodeVerifier::verify`] returns one
//! [`CheckOutcome`] per check, failed or passed, with a human-readable
//! message either way.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::thread;
use std::time::Duration;

use serde::Serialize;

use crate::config::VerifierConfig;
use crate::geo::{GeoError, GeoProvider, MaxMindClient};
use crate::hostname;
use crate::metrics::{self, MetricSample, ParseError};
use crate::resolve::{HostResolver, ResolveError, SystemResolver};
use crate::scrape::{FetchError, HttpMetricsSource, MetricsSource};

/// Counter consulted by the progress check.
///
/// Aptos-lineage nodes expose the version of the last transaction batch
/// committed by consensus under this name; a node that is alive and
/// participating moves it forward continuously.
pub const COMMITTED_VERSION_COUNTER: &str = "aptos_consensus_last_committed_version";

/// Metrics port Aptos-lineage nodes listen on by default.
pub const DEFAULT_METRICS_PORT: u16 = 9101;

/// HTTP API port Aptos-lineage nodes listen on by default.
pub const DEFAULT_API_PORT: u16 = 8080;

/// Result of one verification check.
#[derive(Clone, Debug, Serialize)]
pub struct CheckOutcome {
    /// Whether the check passed.
    pub passed: bool,
    /// Human-readable explanation, set on success and failure alike.
    pub message: Option<String>,
}

impl CheckOutcome {
    fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: Some(message.into()),
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: Some(message.into()),
        }
    }
}

/// Errors surfaced by the individual operations and by construction.
#[derive(Clone, Debug)]
pub enum CheckError {
    /// The HTTP fetch failed.
    Fetch(FetchError),
    /// The response body could not be parsed.
    Parse(ParseError),
    /// The geolocation client could not be built.
    Geo(GeoError),
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckError::Fetch(e) => write!(f, "{e}"),
            CheckError::Parse(e) => write!(f, "{e}"),
            CheckError::Geo(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CheckError {}

impl From<FetchError> for CheckError {
    fn from(e: FetchError) -> Self {
        CheckError::Fetch(e)
    }
}

impl From<ParseError> for CheckError {
    fn from(e: ParseError) -> Self {
        CheckError::Parse(e)
    }
}

impl From<GeoError> for CheckError {
    fn from(e: GeoError) -> Self {
        CheckError::Geo(e)
    }
}

/// Verifier for a single node.
///
/// Construction normalizes the hostname and eagerly resolves it. A failed
/// resolution is stored rather than returned: the fetches dial the
/// hostname, not the resolved address, so a broken DNS setup surfaces
/// from [`location`](NodeVerifier::location) and from the fetches
/// themselves rather than blocking construction.
pub struct NodeVerifier<R, M, G> {
    hostname: String,
    metrics_port: u16,
    http_api_port: u16,
    recheck_delay: Duration,
    resolved: Result<IpAddr, ResolveError>,
    resolver: R,
    source: M,
    geo: G,
}

impl<R, M, G> NodeVerifier<R, M, G>
where
    R: HostResolver,
    M: MetricsSource,
    G: GeoProvider,
{
    /// Builds a verifier from explicit collaborators.
    ///
    /// Normalizes `hostname` and performs the eager resolution described
    /// on [`NodeVerifier`].
    pub fn with_collaborators(
        hostname: &str,
        metrics_port: u16,
        http_api_port: u16,
        recheck_delay: Duration,
        resolver: R,
        source: M,
        geo: G,
    ) -> Self {
        let hostname = hostname::normalize(hostname);
        let resolved = resolve_with(&resolver, &hostname);
        Self {
            hostname,
            metrics_port,
            http_api_port,
            recheck_delay,
            resolved,
            resolver,
            source,
            geo,
        }
    }

    /// Normalized hostname this verifier targets.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Port serving the Prometheus metrics page.
    pub fn metrics_port(&self) -> u16 {
        self.metrics_port
    }

    /// Port serving the node's HTTP API.
    ///
    /// Not consulted by the current checks; recorded so API-level checks
    /// can join [`verify`](Self::verify) without changing callers.
    pub fn http_api_port(&self) -> u16 {
        self.http_api_port
    }

    /// Resolution result captured at construction time.
    pub fn ip(&self) -> &Result<IpAddr, ResolveError> {
        &self.resolved
    }

    /// Re-resolves the hostname.
    ///
    /// IPv4 literals come back as-is without consulting the resolver,
    /// exactly as at construction time.
    pub fn resolve_ip(&self) -> Result<IpAddr, ResolveError> {
        resolve_with(&self.resolver, &self.hostname)
    }

    /// Looks up the provider's geolocation record for the resolved address.
    ///
    /// Fails with the stored resolution error when the hostname never
    /// resolved, and with whatever the provider reported otherwise.
    pub fn location(&self) -> Result<serde_json::Value, GeoError> {
        let ip = match &self.resolved {
            Ok(ip) => *ip,
            Err(e) => return Err(GeoError::Unresolved(e.to_string())),
        };
        self.geo.lookup(ip).map_err(|e| {
            tracing::warn!("geolocation lookup for {ip} failed: {e}");
            e
        })
    }

    /// Fetches the metrics page once and extracts the committed-version
    /// counter.
    pub fn fetch_metrics(&self) -> Result<u64, CheckError> {
        let body = self.source.fetch(&self.hostname, self.metrics_port)?;
        Ok(metrics::extract_counter(&body, COMMITTED_VERSION_COUNTER)?)
    }

    /// Fetches the metrics page once and parses every sample on it.
    pub fn fetch_json_metrics(&self) -> Result<Vec<MetricSample>, CheckError> {
        let body = self.source.fetch(&self.hostname, self.metrics_port)?;
        Ok(metrics::parse_samples(&body)?)
    }

    /// Runs the progress check: two fetches separated by the recheck
    /// delay, requiring the committed version to strictly increase.
    ///
    /// A failed first fetch short-circuits; the second fetch is never
    /// attempted.
    pub fn verify_metrics(&self) -> CheckOutcome {
        let first = match self.fetch_metrics() {
            Ok(version) => version,
            Err(e) => return CheckOutcome::fail(format!("Could not verify metrics; {e}")),
        };

        // Give the node time to commit more versions.
        thread::sleep(self.recheck_delay);

        let second = match self.fetch_metrics() {
            Ok(version) => version,
            Err(e) => return CheckOutcome::fail(format!("Could not verify metrics; {e}")),
        };

        if second <= first {
            return CheckOutcome::fail(
                "Metrics last synced version did not increase. Ensure your node is running, and retry.",
            );
        }

        CheckOutcome::pass("Metrics verified successfully!")
    }

    /// Runs every check against the node.
    ///
    /// The result is a list so further checks (API liveness, state sync)
    /// can join without changing the contract; today it holds the metrics
    /// progress check alone.
    pub fn verify(&self) -> Vec<CheckOutcome> {
        vec![self.verify_metrics()]
    }
}

impl NodeVerifier<SystemResolver, HttpMetricsSource, MaxMindClient> {
    /// Builds a verifier wired with the production collaborators from
    /// `config`.
    ///
    /// Fails only when an HTTP client cannot be constructed. An
    /// unresolvable hostname is not an error here; the failure is stored
    /// and reported by the individual operations.
    pub fn new(
        hostname: &str,
        metrics_port: u16,
        http_api_port: u16,
        config: &VerifierConfig,
    ) -> Result<Self, CheckError> {
        let resolver = SystemResolver::new(config.dns.timeout);
        let source = HttpMetricsSource::new(&config.http)?;
        let geo = MaxMindClient::new(config.maxmind.clone())?;
        Ok(Self::with_collaborators(
            hostname,
            metrics_port,
            http_api_port,
            config.recheck_delay,
            resolver,
            source,
            geo,
        ))
    }
}

/// Resolution with the IPv4-literal short-circuit.
fn resolve_with<R: HostResolver>(resolver: &R, hostname: &str) -> Result<IpAddr, ResolveError> {
    if let Ok(v4) = hostname.parse::<Ipv4Addr>() {
        return Ok(IpAddr::V4(v4));
    }
    resolver.resolve(hostname)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    /// Metrics source that replays a scripted list of responses and counts
    /// how many fetches were attempted.
    struct ScriptedSource {
        responses: RefCell<Vec<Result<String, FetchError>>>,
        calls: Cell<usize>,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<String, FetchError>>) -> Self {
            Self {
                responses: RefCell::new(responses),
                calls: Cell::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.get()
        }
    }

    impl MetricsSource for &ScriptedSource {
        fn fetch(&self, _hostname: &str, _port: u16) -> Result<String, FetchError> {
            self.calls.set(self.calls.get() + 1);
            self.responses.borrow_mut().remove(0)
        }
    }

    struct StaticResolver(Result<IpAddr, ResolveError>);

    impl HostResolver for StaticResolver {
        fn resolve(&self, _hostname: &str) -> Result<IpAddr, ResolveError> {
            self.0.clone()
        }
    }

    struct PanickingResolver;

    impl HostResolver for PanickingResolver {
        fn resolve(&self, hostname: &str) -> Result<IpAddr, ResolveError> {
            panic!("resolver must not be consulted for `{hostname}`");
        }
    }

    struct NoGeo;

    impl GeoProvider for NoGeo {
        fn lookup(&self, _ip: IpAddr) -> Result<serde_json::Value, GeoError> {
            Err(GeoError::MissingCredentials)
        }
    }

    fn counter_body(version: u64) -> String {
        format!(
            "# TYPE aptos_consensus_last_committed_version gauge\n\
             aptos_consensus_last_committed_version {version}\n"
        )
    }

    fn verifier_for(
        source: &ScriptedSource,
    ) -> NodeVerifier<StaticResolver, &ScriptedSource, NoGeo> {
        NodeVerifier::with_collaborators(
            "127.0.0.1",
            9101,
            8080,
            Duration::ZERO,
            StaticResolver(Ok(IpAddr::V4(Ipv4Addr::LOCALHOST))),
            source,
            NoGeo,
        )
    }

    #[test]
    fn verify_passes_when_version_increases() {
        let source = ScriptedSource::new(vec![Ok(counter_body(100)), Ok(counter_body(105))]);
        let verifier = verifier_for(&source);
        let outcomes = verifier.verify();
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].passed);
        assert_eq!(
            outcomes[0].message.as_deref(),
            Some("Metrics verified successfully!")
        );
        assert_eq!(source.calls(), 2);
    }

    #[test]
    fn verify_fails_when_version_stalls() {
        let source = ScriptedSource::new(vec![Ok(counter_body(100)), Ok(counter_body(100))]);
        let verifier = verifier_for(&source);
        let outcome = verifier.verify_metrics();
        assert!(!outcome.passed);
        assert!(outcome.message.unwrap().contains("did not increase"));
    }

    #[test]
    fn verify_fails_when_version_regresses() {
        let source = ScriptedSource::new(vec![Ok(counter_body(100)), Ok(counter_body(99))]);
        let verifier = verifier_for(&source);
        assert!(!verifier.verify_metrics().passed);
    }

    #[test]
    fn first_fetch_failure_short_circuits() {
        // One scripted response only: a second fetch would panic.
        let source = ScriptedSource::new(vec![Err(FetchError::Other(
            "connection refused".to_string(),
        ))]);
        let verifier = verifier_for(&source);
        let outcome = verifier.verify_metrics();
        assert!(!outcome.passed);
        let message = outcome.message.unwrap();
        assert!(message.starts_with("Could not verify metrics;"));
        assert!(message.contains("connection refused"));
        assert_eq!(source.calls(), 1);
    }

    #[test]
    fn second_fetch_failure_is_reported() {
        let source = ScriptedSource::new(vec![
            Ok(counter_body(100)),
            Err(FetchError::ReadTimeout("execution expired".to_string())),
        ]);
        let verifier = verifier_for(&source);
        let outcome = verifier.verify_metrics();
        assert!(!outcome.passed);
        assert!(outcome.message.unwrap().contains("Read timeout"));
        assert_eq!(source.calls(), 2);
    }

    #[test]
    fn connect_timeouts_fail_verification() {
        let source = ScriptedSource::new(vec![Err(FetchError::ConnectTimeout(
            "operation timed out".to_string(),
        ))]);
        let verifier = verifier_for(&source);
        let outcome = verifier.verify_metrics();
        assert!(!outcome.passed);
        let message = outcome.message.unwrap();
        assert!(message.contains("Could not verify metrics; Open timeout:"));
        assert_eq!(source.calls(), 1);
    }

    #[test]
    fn check_errors_delegate_display_to_the_cause() {
        let err = CheckError::from(GeoError::Provider(
            "failed to build HTTP client: oops".to_string(),
        ));
        assert_eq!(err.to_string(), "Error: failed to build HTTP client: oops");
    }

    #[test]
    fn missing_counter_fails_the_check() {
        let source = ScriptedSource::new(vec![Ok("other_counter 5\n".to_string())]);
        let verifier = verifier_for(&source);
        let outcome = verifier.verify_metrics();
        assert!(!outcome.passed);
        assert!(
            outcome
                .message
                .unwrap()
                .contains("could not find `aptos_consensus_last_committed_version` metric")
        );
        assert_eq!(source.calls(), 1);
    }

    #[test]
    fn ipv4_literals_skip_the_resolver() {
        let source = ScriptedSource::new(vec![]);
        let verifier = NodeVerifier::with_collaborators(
            "203.0.113.9",
            9101,
            8080,
            Duration::ZERO,
            PanickingResolver,
            &source,
            NoGeo,
        );
        assert_eq!(verifier.ip(), &Ok("203.0.113.9".parse().unwrap()));
        assert_eq!(verifier.resolve_ip(), Ok("203.0.113.9".parse().unwrap()));
    }

    #[test]
    fn hostname_is_normalized_at_construction() {
        let source = ScriptedSource::new(vec![]);
        let verifier = NodeVerifier::with_collaborators(
            " HTTPS://Node.Example/ ",
            9101,
            8080,
            Duration::ZERO,
            StaticResolver(Ok(IpAddr::V4(Ipv4Addr::LOCALHOST))),
            &source,
            NoGeo,
        );
        assert_eq!(verifier.hostname(), "node.example");
        assert_eq!(verifier.metrics_port(), 9101);
        assert_eq!(verifier.http_api_port(), 8080);
    }

    #[test]
    fn resolution_failures_are_stored_not_raised() {
        let source = ScriptedSource::new(vec![]);
        let verifier = NodeVerifier::with_collaborators(
            "node.example",
            9101,
            8080,
            Duration::ZERO,
            StaticResolver(Err(ResolveError::Lookup("boom".to_string()))),
            &source,
            NoGeo,
        );
        assert!(verifier.ip().is_err());

        let err = verifier.location().unwrap_err();
        match err {
            GeoError::Unresolved(msg) => assert!(msg.contains("boom")),
            other => panic!("expected Unresolved, got: {other:?}"),
        }
    }

    #[test]
    fn location_without_credentials_reports_the_provider_error() {
        let source = ScriptedSource::new(vec![]);
        let verifier = verifier_for(&source);
        let err = verifier.location().unwrap_err();
        assert!(matches!(err, GeoError::MissingCredentials));
    }

    #[test]
    fn fetch_json_metrics_propagates_parse_failures() {
        let source = ScriptedSource::new(vec![Ok("m NaN\n".to_string())]);
        let verifier = verifier_for(&source);
        let err = verifier.fetch_json_metrics().unwrap_err();
        assert!(matches!(err, CheckError::Parse(_)));
    }

    #[test]
    fn fetch_json_metrics_returns_parsed_samples() {
        let source = ScriptedSource::new(vec![Ok(counter_body(8299))]);
        let verifier = verifier_for(&source);
        let samples = verifier.fetch_json_metrics().unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].name, COMMITTED_VERSION_COUNTER);
    }
}
