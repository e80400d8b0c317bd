//! HTTP implementation of the metrics source.
//!
//! Timeouts are deliberately tight. The caller is an interactive
//! verification flow, and a node that cannot serve its metrics page
//! within a few seconds fails the check rather than stalling it.

use reqwest::blocking::Client;

use crate::config::HttpConfig;

use super::{FetchError, MetricsSource};

/// [`MetricsSource`] backed by a blocking HTTP client.
///
/// Requests are never retried; the only repeat traffic the verifier
/// generates is the progress check's own second fetch.
pub struct HttpMetricsSource {
    client: Client,
}

impl HttpMetricsSource {
    /// Builds the underlying client with the configured timeouts.
    pub fn new(config: &HttpConfig) -> Result<Self, FetchError> {
        // The blocking client takes one whole-request deadline; the
        // shorter connect budget still fires first on unreachable hosts.
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout)
            .build()
            .map_err(|e| FetchError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    fn classify(e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            if e.is_connect() {
                FetchError::ConnectTimeout(e.to_string())
            } else {
                FetchError::ReadTimeout(e.to_string())
            }
        } else {
            tracing::warn!("metrics fetch failed: {e}");
            FetchError::Other(e.to_string())
        }
    }
}

impl MetricsSource for HttpMetricsSource {
    fn fetch(&self, hostname: &str, port: u16) -> Result<String, FetchError> {
        let url = format!("http://{hostname}:{port}/metrics");

        let response = self.client.get(&url).send().map_err(Self::classify)?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %url, status = %status, "metrics endpoint returned non-success status");
            return Err(FetchError::Other(format!(
                "metrics endpoint returned HTTP status {status}"
            )));
        }

        let body = response.text().map_err(Self::classify)?;
        tracing::debug!(url = %url, bytes = body.len(), "fetched metrics page");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    fn test_config() -> HttpConfig {
        HttpConfig {
            connect_timeout: Duration::from_millis(500),
            read_timeout: Duration::from_millis(500),
        }
    }

    /// Serves one canned HTTP response on an ephemeral localhost port.
    fn spawn_one_shot_server(status_line: &'static str, body: &'static str) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test listener");
        let port = listener.local_addr().expect("listener addr").port();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut request = [0u8; 1024];
                let _ = stream.read(&mut request);
                let response = format!(
                    "HTTP/1.1 {status_line}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len(),
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        port
    }

    #[test]
    fn fetches_metrics_text() {
        let port = spawn_one_shot_server("200 OK", "aptos_consensus_last_committed_version 42\n");
        let source = HttpMetricsSource::new(&test_config()).unwrap();
        let body = source.fetch("127.0.0.1", port).unwrap();
        assert!(body.contains("aptos_consensus_last_committed_version 42"));
    }

    #[test]
    fn non_success_statuses_are_errors() {
        let port = spawn_one_shot_server("500 Internal Server Error", "");
        let source = HttpMetricsSource::new(&test_config()).unwrap();
        let err = source.fetch("127.0.0.1", port).unwrap_err();
        assert!(matches!(err, FetchError::Other(_)), "got: {err:?}");
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn refused_connections_are_reported() {
        // Bind-then-drop guarantees nothing is listening on the port.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let source = HttpMetricsSource::new(&test_config()).unwrap();
        let err = source.fetch("127.0.0.1", port).unwrap_err();
        assert!(matches!(err, FetchError::Other(_)), "got: {err:?}");
    }

    #[test]
    fn silent_servers_hit_the_read_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        thread::spawn(move || {
            // Accept and hold the connection open without answering.
            if let Ok((stream, _)) = listener.accept() {
                thread::sleep(Duration::from_secs(1));
                drop(stream);
            }
        });
        let source = HttpMetricsSource::new(&test_config()).unwrap();
        let err = source.fetch("127.0.0.1", port).unwrap_err();
        assert!(matches!(err, FetchError::ReadTimeout(_)), "got: {err:?}");
    }
}
