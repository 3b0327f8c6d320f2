use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::HttpClientError;

/// Request methods a probe may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeMethod {
    Head,
    Get,
}

impl From<ProbeMethod> for Method {
    fn from(method: ProbeMethod) -> Self {
        match method {
            ProbeMethod::Head => Method::HEAD,
            ProbeMethod::Get => Method::GET,
        }
    }
}

#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn send(&self, method: ProbeMethod, url: &Url) -> Result<HttpResponse, HttpClientError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status_code: u16,
}

impl HttpResponse {
    pub fn new(status_code: u16) -> Self {
        Self { status_code }
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }
}

pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// `timeout` is a backstop only; the prober enforces the real deadline.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn send(&self, method: ProbeMethod, url: &Url) -> Result<HttpResponse, HttpClientError> {
        let response = self
            .client
            .request(method.into(), url.clone())
            .header(reqwest::header::CACHE_CONTROL, "no-store")
            .send()
            .await?;

        Ok(HttpResponse::new(response.status().as_u16()))
    }
}

#[derive(Debug, Clone)]
pub enum MockBehavior {
    Respond { status_code: u16, delay: Duration },
    Fail(HttpClientError),
    Hang,
    Panic,
}

/// Scriptable [`HttpClient`] keyed by URL and method.
pub struct MockHttpClient {
    responses: HashMap<(String, ProbeMethod), MockBehavior>,
    default_behavior: MockBehavior,
    calls: Mutex<Vec<(ProbeMethod, String)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            default_behavior: MockBehavior::Respond {
                status_code: 404,
                delay: Duration::ZERO,
            },
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Answer both HEAD and GET for `url` with `status_code`.
    pub fn with_response(self, url: &str, status_code: u16) -> Self {
        self.with_delayed_response(url, status_code, Duration::ZERO)
    }

    pub fn with_delayed_response(self, url: &str, status_code: u16, delay: Duration) -> Self {
        let behavior = MockBehavior::Respond { status_code, delay };
        self.with_behavior(url, ProbeMethod::Head, behavior.clone())
            .with_behavior(url, ProbeMethod::Get, behavior)
    }

    pub fn with_behavior(mut self, url: &str, method: ProbeMethod, behavior: MockBehavior) -> Self {
        self.responses.insert((normalize(url), method), behavior);
        self
    }

    pub fn with_default_behavior(mut self, behavior: MockBehavior) -> Self {
        self.default_behavior = behavior;
        self
    }

    pub fn calls(&self) -> Vec<(ProbeMethod, String)> {
        self.calls.lock().unwrap().clone()
    }

    /// Highest number of requests that were ever pending at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Default for MockHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(url: &str) -> String {
    Url::parse(url)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| url.to_string())
}

struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn send(&self, method: ProbeMethod, url: &Url) -> Result<HttpResponse, HttpClientError> {
        self.calls.lock().unwrap().push((method, url.to_string()));

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.in_flight);

        let behavior = self
            .responses
            .get(&(url.to_string(), method))
            .unwrap_or(&self.default_behavior)
            .clone();

        match behavior {
            MockBehavior::Respond { status_code, delay } => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(HttpResponse::new(status_code))
            }
            MockBehavior::Fail(err) => Err(err),
            MockBehavior::Hang => std::future::pending().await,
            MockBehavior::Panic => panic!("mock client panicked for {url}"),
        }
    }
}
