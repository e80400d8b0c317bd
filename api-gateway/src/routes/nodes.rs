use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use node_verifier::{
    CheckOutcome, DEFAULT_API_PORT, DEFAULT_METRICS_PORT, DefaultNodeVerifier, GeoError,
    MetricSample,
};

use crate::state::SharedState;

/// Request body shared by the node endpoints.
///
/// The client names the target node; ports fall back to the conventional
/// defaults when omitted. Hostnames may carry a scheme, mixed case, or
/// trailing slashes; they are normalized before use.
#[derive(Debug, Deserialize)]
pub struct NodeRequest {
    /// Hostname or IPv4 literal of the node.
    pub hostname: String,
    /// Port serving the Prometheus metrics page.
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
    /// Port serving the node's HTTP API.
    #[serde(default = "default_api_port")]
    pub http_api_port: u16,
}

fn default_metrics_port() -> u16 {
    DEFAULT_METRICS_PORT
}

fn default_api_port() -> u16 {
    DEFAULT_API_PORT
}

/// Response body for `POST /nodes/verify`.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    /// Normalized hostname the checks ran against.
    pub hostname: String,
    /// Metrics port used by the checks.
    pub metrics_port: u16,
    /// HTTP API port recorded for the node.
    pub http_api_port: u16,
    /// Resolved address, when resolution succeeded.
    pub ip: Option<String>,
    /// Resolution failure, when it did not.
    pub resolve_error: Option<String>,
    /// One entry per executed check.
    pub outcomes: Vec<CheckOutcome>,
}

/// `POST /nodes/verify`
///
/// Runs the full verification pipeline against the requested node. A node
/// that fails its checks still yields `200 OK`; the failure lives in the
/// outcome entries, not the HTTP status.
pub async fn verify(
    State(state): State<SharedState>,
    Json(body): Json<NodeRequest>,
) -> Result<Json<VerifyResponse>, (StatusCode, String)> {
    let config = state.verifier.clone();
    let response = tokio::task::spawn_blocking(move || {
        let verifier = DefaultNodeVerifier::new(
            &body.hostname,
            body.metrics_port,
            body.http_api_port,
            &config,
        )
        .map_err(|e| internal(e.to_string()))?;

        let (ip, resolve_error) = match verifier.ip() {
            Ok(ip) => (Some(ip.to_string()), None),
            Err(e) => (None, Some(e.to_string())),
        };

        Ok(VerifyResponse {
            hostname: verifier.hostname().to_string(),
            metrics_port: verifier.metrics_port(),
            http_api_port: verifier.http_api_port(),
            ip,
            resolve_error,
            outcomes: verifier.verify(),
        })
    })
    .await
    .map_err(|e| internal(format!("verification task failed: {e}")))??;

    Ok(Json(response))
}

/// Response body for `POST /nodes/metrics`.
#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    /// Normalized hostname the fetch ran against.
    pub hostname: String,
    /// Parsed samples in their original exposition order.
    pub samples: Vec<MetricSample>,
}

/// `POST /nodes/metrics`
///
/// Fetches the node's metrics page once and returns every parsed sample.
pub async fn metrics(
    State(state): State<SharedState>,
    Json(body): Json<NodeRequest>,
) -> Result<Json<MetricsResponse>, (StatusCode, String)> {
    let config = state.verifier.clone();
    let response = tokio::task::spawn_blocking(move || {
        let verifier = DefaultNodeVerifier::new(
            &body.hostname,
            body.metrics_port,
            body.http_api_port,
            &config,
        )
        .map_err(|e| internal(e.to_string()))?;

        let samples = verifier
            .fetch_json_metrics()
            .map_err(|e| (StatusCode::BAD_GATEWAY, e.to_string()))?;

        Ok(MetricsResponse {
            hostname: verifier.hostname().to_string(),
            samples,
        })
    })
    .await
    .map_err(|e| internal(format!("metrics task failed: {e}")))??;

    Ok(Json(response))
}

/// Response body for `POST /nodes/location`.
#[derive(Debug, Serialize)]
pub struct LocationResponse {
    /// Normalized hostname the lookup ran against.
    pub hostname: String,
    /// Resolved address the record describes.
    pub ip: String,
    /// Provider record, passed through unmodified.
    pub record: serde_json::Value,
}

/// `POST /nodes/location`
///
/// Geolocates the node's resolved address through the configured provider.
pub async fn location(
    State(state): State<SharedState>,
    Json(body): Json<NodeRequest>,
) -> Result<Json<LocationResponse>, (StatusCode, String)> {
    let config = state.verifier.clone();
    let response = tokio::task::spawn_blocking(move || {
        let verifier = DefaultNodeVerifier::new(
            &body.hostname,
            body.metrics_port,
            body.http_api_port,
            &config,
        )
        .map_err(|e| internal(e.to_string()))?;

        let record = verifier.location().map_err(|e| match e {
            GeoError::MissingCredentials => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
            _ => (StatusCode::BAD_GATEWAY, e.to_string()),
        })?;

        let ip = match verifier.ip() {
            Ok(ip) => ip.to_string(),
            // location() only succeeds with a resolved address.
            Err(e) => return Err(internal(format!("missing resolved address: {e}"))),
        };

        Ok(LocationResponse {
            hostname: verifier.hostname().to_string(),
            ip,
            record,
        })
    })
    .await
    .map_err(|e| internal(format!("location task failed: {e}")))??;

    Ok(Json(response))
}

fn internal(msg: String) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_request_fills_default_ports() {
        let req: NodeRequest = serde_json::from_str(r#"{"hostname": "node.example"}"#).unwrap();
        assert_eq!(req.metrics_port, 9101);
        assert_eq!(req.http_api_port, 8080);
    }

    #[test]
    fn node_request_accepts_explicit_ports() {
        let req: NodeRequest = serde_json::from_str(
            r#"{"hostname": "node.example", "metrics_port": 9200, "http_api_port": 8082}"#,
        )
        .unwrap();
        assert_eq!(req.metrics_port, 9200);
        assert_eq!(req.http_api_port, 8082);
    }

    #[test]
    fn node_request_rejects_missing_hostname() {
        assert!(serde_json::from_str::<NodeRequest>("{}").is_err());
    }
}
