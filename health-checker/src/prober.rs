use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::debug;

use crate::error::{HttpClientError, ProbeError};
use crate::http_client::{HttpClient, ProbeMethod};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    Timeout { after_ms: u64 },
    Transport(String),
}

/// What one probe observed, before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// 0 when no response was received.
    pub status_code: u16,
    pub elapsed_ms: u64,
    pub failure: Option<ProbeFailure>,
}

impl ProbeOutcome {
    pub fn is_network_failure(&self) -> bool {
        self.failure.is_some()
    }
}

/// Parse `target` as an absolute http(s) URL.
pub fn parse_target(target: &str) -> Result<Url, ProbeError> {
    let invalid = |reason: String| ProbeError::InvalidTarget {
        url: target.to_string(),
        reason,
    };

    let url = Url::parse(target).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme '{other}'"))),
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }

    Ok(url)
}

/// Sends exactly one logical probe per call: a HEAD, and a single GET
/// fallback when the HEAD fails at the transport level.
#[derive(Clone)]
pub struct Prober {
    client: Arc<dyn HttpClient>,
    default_timeout: Duration,
}

impl Prober {
    pub fn new(client: Arc<dyn HttpClient>, default_timeout: Duration) -> Self {
        Self {
            client,
            default_timeout,
        }
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    pub async fn probe(&self, target: &str, timeout: Option<Duration>) -> Result<ProbeOutcome, ProbeError> {
        let url = parse_target(target)?;
        let timeout = timeout.unwrap_or(self.default_timeout);

        let start = Instant::now();
        let deadline = start + timeout;
        let elapsed_ms = || start.elapsed().as_millis() as u64;

        let mut attempt = self.attempt(ProbeMethod::Head, &url, deadline).await;
        if let Err(HttpClientError::Connect(_) | HttpClientError::Other(_)) = &attempt {
            debug!(%url, error = ?attempt.as_ref().err(), "HEAD failed, retrying with GET");
            attempt = self.attempt(ProbeMethod::Get, &url, deadline).await;
        }

        let outcome = match attempt {
            Ok(status_code) => ProbeOutcome {
                status_code,
                elapsed_ms: elapsed_ms(),
                failure: None,
            },
            Err(HttpClientError::Timeout) => ProbeOutcome {
                status_code: 0,
                elapsed_ms: elapsed_ms(),
                failure: Some(ProbeFailure::Timeout {
                    after_ms: timeout.as_millis() as u64,
                }),
            },
            Err(err) => ProbeOutcome {
                status_code: 0,
                elapsed_ms: elapsed_ms(),
                failure: Some(ProbeFailure::Transport(err.to_string())),
            },
        };

        Ok(outcome)
    }

    async fn attempt(&self, method: ProbeMethod, url: &Url, deadline: Instant) -> Result<u16, HttpClientError> {
        match timeout_at(deadline, self.client.send(method, url)).await {
            Ok(response) => response.map(|r| r.status_code),
            Err(_) => Err(HttpClientError::Timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::{MockBehavior, MockHttpClient, ReqwestHttpClient};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn prober(client: MockHttpClient) -> (Prober, Arc<MockHttpClient>) {
        let client = Arc::new(client);
        (Prober::new(client.clone(), Duration::from_secs(10)), client)
    }

    #[test]
    fn test_parse_target_rejects_bad_urls() {
        assert!(parse_target("https://api.example.com/v1").is_ok());
        assert!(parse_target("http://localhost:8080").is_ok());

        assert!(matches!(parse_target("not a url"), Err(ProbeError::InvalidTarget { .. })));
        assert!(parse_target("ftp://files.example.com").is_err());
        assert!(parse_target("/relative/path").is_err());
        assert!(parse_target("").is_err());
    }

    #[tokio::test]
    async fn test_invalid_target_makes_no_request() {
        let (prober, client) = prober(MockHttpClient::new());

        let result = prober.probe("example.com", None).await;

        assert!(matches!(result, Err(ProbeError::InvalidTarget { .. })));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_any_http_response_is_a_successful_probe() {
        let (prober, client) = prober(MockHttpClient::new().with_response("https://api.example.com", 503));

        let outcome = prober.probe("https://api.example.com", None).await.unwrap();

        assert_eq!(outcome.status_code, 503);
        assert!(outcome.failure.is_none());
        assert_eq!(client.calls().len(), 1);
        assert_eq!(client.calls()[0].0, ProbeMethod::Head);
    }

    #[tokio::test]
    async fn test_head_transport_failure_falls_back_to_get() {
        let (prober, client) = prober(
            MockHttpClient::new()
                .with_response("https://api.example.com", 200)
                .with_behavior(
                    "https://api.example.com",
                    ProbeMethod::Head,
                    MockBehavior::Fail(HttpClientError::Other("connection reset".into())),
                ),
        );

        let outcome = prober.probe("https://api.example.com", None).await.unwrap();

        assert_eq!(outcome.status_code, 200);
        let methods: Vec<_> = client.calls().into_iter().map(|(m, _)| m).collect();
        assert_eq!(methods, vec![ProbeMethod::Head, ProbeMethod::Get]);
    }

    #[tokio::test]
    async fn test_get_fallback_failure_is_reported() {
        let (prober, client) = prober(MockHttpClient::new().with_default_behavior(MockBehavior::Fail(
            HttpClientError::Connect("dns error: no such host".into()),
        )));

        let outcome = prober.probe("https://gone.example.com", None).await.unwrap();

        assert_eq!(outcome.status_code, 0);
        assert!(matches!(outcome.failure, Some(ProbeFailure::Transport(ref m)) if m.contains("no such host")));
        assert_eq!(client.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_non_2xx_head_does_not_retry() {
        let (prober, client) = prober(MockHttpClient::new().with_response("https://api.example.com", 405));

        let outcome = prober.probe("https://api.example.com", None).await.unwrap();

        assert_eq!(outcome.status_code, 405);
        assert_eq!(client.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_distinguished() {
        let (prober, client) = prober(MockHttpClient::new().with_default_behavior(MockBehavior::Hang));

        let outcome = prober
            .probe("https://slow.example.com", Some(Duration::from_millis(10_000)))
            .await
            .unwrap();

        assert_eq!(outcome.status_code, 0);
        assert_eq!(outcome.failure, Some(ProbeFailure::Timeout { after_ms: 10_000 }));
        assert!(outcome.elapsed_ms >= 10_000 && outcome.elapsed_ms < 10_100);
        // The deadline is shared, so an expired HEAD leaves nothing for GET.
        assert_eq!(client.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_real_server_rejecting_head_is_retried_with_get() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else { break };
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    if buf[..n].starts_with(b"HEAD") {
                        // Drop the connection without answering.
                        return;
                    }
                    let _ = socket
                        .write_all(b"HTTP/1.1 204 No Content\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
                        .await;
                });
            }
        });

        let client = ReqwestHttpClient::new("PublicAPIs-HealthChecker/1.0", Duration::from_secs(5)).unwrap();
        let prober = Prober::new(Arc::new(client), Duration::from_secs(5));

        let outcome = prober.probe(&format!("http://{addr}/"), None).await.unwrap();

        assert_eq!(outcome.status_code, 204);
        assert!(outcome.failure.is_none());
    }

    #[tokio::test]
    async fn test_real_server_that_never_answers_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let client = ReqwestHttpClient::new("PublicAPIs-HealthChecker/1.0", Duration::from_secs(30)).unwrap();
        let prober = Prober::new(Arc::new(client), Duration::from_millis(300));

        let outcome = prober.probe(&format!("http://{addr}/"), None).await.unwrap();

        assert_eq!(outcome.failure, Some(ProbeFailure::Timeout { after_ms: 300 }));
        assert!(outcome.elapsed_ms >= 300);
        assert!(outcome.elapsed_ms < 2_000);
    }
}
