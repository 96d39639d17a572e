//! Remote lookup services queried once per URL.

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};
use urlinfo_core::{LoaderStatus, NormalizedUrl, ThreatInfo, ThreatType};

use crate::{SourceError, SourceLoader, SourceResult};

/// Ceiling for any single request, including the startup probe
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Lowest status code counted as the endpoint being down
const SERVER_ERROR: u16 = 500;

/// How lookups are sent to the endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// Lookup fields as query parameters
    #[default]
    Get,
    /// Lookup fields as a JSON body
    Post,
}

impl FromStr for HttpMethod {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            other => Err(SourceError::Parse(format!("unsupported HTTP method: {other}"))),
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
        }
    }
}

/// Threat source backed by a remote lookup endpoint
#[derive(Debug, Clone)]
pub struct HttpLoader {
    inner: Arc<LoaderInner>,
}

#[derive(Debug)]
struct LoaderInner {
    id: String,
    http: HttpClient,
    endpoint: String,
    method: HttpMethod,
    initialized: AtomicBool,
    reachability: Mutex<Reachability>,
}

/// Last-known state of the endpoint, refreshed by the probe and every query
#[derive(Debug, Default)]
struct Reachability {
    reachable: bool,
    last_error: Option<String>,
}

/// Fields sent for each lookup
#[derive(Debug, Serialize)]
struct LookupParams<'a> {
    hostname: &'a str,
    port: u16,
    path: String,
    url: &'a str,
}

/// Accepted response shapes from lookup endpoints
#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default, alias = "malicious", alias = "threat_detected")]
    is_malicious: bool,
    #[serde(default, alias = "type")]
    threat_type: Option<String>,
    #[serde(default, alias = "confidence")]
    confidence_score: Option<f64>,
}

impl LookupResponse {
    fn into_threat(self, source_id: &str) -> Option<ThreatInfo> {
        if !self.is_malicious {
            return None;
        }

        let threat_type = self
            .threat_type
            .as_deref()
            .map(ThreatType::from_label)
            .filter(|t| *t != ThreatType::None)
            .unwrap_or_default();

        Some(ThreatInfo::malicious(
            source_id,
            threat_type,
            self.confidence_score.unwrap_or(1.0),
        ))
    }
}

impl HttpLoader {
    /// Create a loader with default settings
    pub fn new(id: impl Into<String>, endpoint: impl Into<String>) -> SourceResult<Self> {
        HttpLoaderBuilder::new(id, endpoint).build()
    }

    /// Create a builder for custom configuration
    #[must_use]
    pub fn builder(id: impl Into<String>, endpoint: impl Into<String>) -> HttpLoaderBuilder {
        HttpLoaderBuilder::new(id, endpoint)
    }

    /// The lookup endpoint
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    fn request(&self, url: &NormalizedUrl) -> reqwest::RequestBuilder {
        let params = LookupParams {
            hostname: url.host(),
            port: url.port(),
            path: url.path_and_query(),
            url: url.as_str(),
        };

        match self.inner.method {
            HttpMethod::Get => self.inner.http.get(&self.inner.endpoint).query(&params),
            HttpMethod::Post => self.inner.http.post(&self.inner.endpoint).json(&params),
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> SourceResult<Option<ThreatInfo>> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            warn!(source = %self.inner.id, status = status.as_u16(), "lookup endpoint returned an error");
            return Err(SourceError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let parsed: LookupResponse =
            serde_json::from_str(&body).map_err(|e| SourceError::Parse(e.to_string()))?;

        Ok(parsed.into_threat(&self.inner.id))
    }

    fn record(&self, result: &SourceResult<Option<ThreatInfo>>) {
        let mut state = self.inner.reachability.lock();
        match result {
            Ok(_) => {
                state.reachable = true;
                state.last_error = None;
            }
            Err(err) => {
                // The endpoint answered unless the request itself failed.
                state.reachable = match err {
                    SourceError::Status(code) => *code < SERVER_ERROR,
                    SourceError::Parse(_) => true,
                    _ => false,
                };
                state.last_error = Some(err.to_string());
            }
        }
    }
}

#[async_trait]
impl SourceLoader for HttpLoader {
    fn id(&self) -> &str {
        &self.inner.id
    }

    async fn initialize(&self) -> SourceResult<()> {
        let probe = self.inner.http.head(&self.inner.endpoint).send().await;

        {
            let mut state = self.inner.reachability.lock();
            match probe {
                Ok(response) if response.status().as_u16() < SERVER_ERROR => {
                    info!(source = %self.inner.id, endpoint = %self.inner.endpoint, "lookup endpoint reachable");
                    state.reachable = true;
                    state.last_error = None;
                }
                Ok(response) => {
                    warn!(
                        source = %self.inner.id,
                        status = response.status().as_u16(),
                        "lookup endpoint probe returned a server error"
                    );
                    state.reachable = false;
                    state.last_error = Some(format!("probe returned status {}", response.status().as_u16()));
                }
                Err(e) => {
                    // Still usable later; the endpoint may only be down temporarily.
                    warn!(source = %self.inner.id, error = %e, "lookup endpoint probe failed");
                    state.reachable = false;
                    state.last_error = Some(SourceError::from(e).to_string());
                }
            }
        }

        self.inner.initialized.store(true, Ordering::Release);
        Ok(())
    }

    #[instrument(skip(self, url, deadline), fields(source = %self.inner.id, url = %url))]
    async fn query(&self, url: &NormalizedUrl, deadline: Instant) -> SourceResult<Option<ThreatInfo>> {
        if !self.inner.initialized.load(Ordering::Acquire) {
            return Err(SourceError::NotReady);
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(SourceError::Timeout);
        }

        let result = self.send(self.request(url).timeout(remaining)).await;
        self.record(&result);

        debug!(matched = matches!(result, Ok(Some(_))), ok = result.is_ok(), "http lookup");
        result
    }

    fn status(&self) -> LoaderStatus {
        if !self.inner.initialized.load(Ordering::Acquire) {
            return LoaderStatus::unavailable("not initialized");
        }

        let state = self.inner.reachability.lock();
        LoaderStatus {
            ready: state.reachable,
            detail: Some(
                state
                    .last_error
                    .clone()
                    .unwrap_or_else(|| self.inner.endpoint.clone()),
            ),
            items_loaded: None,
        }
    }
}

/// Builder for configuring an [`HttpLoader`]
#[derive(Debug)]
pub struct HttpLoaderBuilder {
    id: String,
    endpoint: String,
    method: HttpMethod,
    timeout: Duration,
    user_agent: String,
    headers: Vec<(String, String)>,
}

impl HttpLoaderBuilder {
    /// Create a new builder for `endpoint`
    #[must_use]
    pub fn new(id: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            endpoint: endpoint.into(),
            method: HttpMethod::default(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("urlinfo/{}", env!("CARGO_PKG_VERSION")),
            headers: Vec::new(),
        }
    }

    /// Set the HTTP method used for lookups
    #[must_use]
    pub const fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// Set the per-request ceiling (the check deadline may cut it shorter)
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the User-Agent header
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Add a header sent with every request
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Build the loader
    pub fn build(self) -> SourceResult<HttpLoader> {
        reqwest::Url::parse(&self.endpoint)
            .map_err(|e| SourceError::Parse(format!("invalid endpoint '{}': {e}", self.endpoint)))?;

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| SourceError::Parse(format!("invalid header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| SourceError::Parse(format!("invalid header value: {e}")))?;
            headers.insert(name, value);
        }

        let http = HttpClient::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .default_headers(headers)
            .gzip(true)
            .build()
            .map_err(|e| SourceError::Http(e.to_string()))?;

        Ok(HttpLoader {
            inner: Arc::new(LoaderInner {
                id: self.id,
                http,
                endpoint: self.endpoint,
                method: self.method,
                initialized: AtomicBool::new(false),
                reachability: Mutex::new(Reachability::default()),
            }),
        })
    }
}
