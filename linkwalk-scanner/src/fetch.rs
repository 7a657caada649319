use crate::error::{Result, ScanError};
use reqwest::Client;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const DEFAULT_USER_AGENT: &str = "linkwalk/0.1 (https://github.com/trapdoorsec/linkwalk)";

/// A fetched document body and what the server said about it.
#[derive(Debug, Clone)]
pub struct Document {
    pub url: String,
    pub final_url: String,
    pub status_code: u16,
    pub content_type: Option<String>,
    pub response_time: Duration,
    pub body: String,
    /// Set when the body stopped arriving part way through.
    pub truncated: Option<String>,
}

impl Document {
    pub fn new(url: impl Into<String>, body: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            final_url: url.clone(),
            url,
            status_code: 200,
            content_type: Some("text/html".to_string()),
            response_time: Duration::from_secs(0),
            body: body.into(),
            truncated: None,
        }
    }

    pub fn truncated(mut self, error: impl Into<String>) -> Self {
        self.truncated = Some(error.into());
        self
    }

    pub fn is_html(&self) -> bool {
        self.content_type
            .as_ref()
            .map(|ct| ct.contains("text/html"))
            .unwrap_or(false)
    }
}

/// Anything that can turn a URL into a document body.
pub trait Fetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Document>> + Send;
}

/// Fetches pages over HTTP(S) with a shared `reqwest` client.
pub struct HttpFetcher {
    client: Client,
    timeout_secs: u64,
    user_agent: String,
    max_redirects: usize,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(10)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        Self::build(timeout_secs, DEFAULT_USER_AGENT.to_string(), 5)
    }

    pub fn with_user_agent(self, user_agent: impl Into<String>) -> Result<Self> {
        Self::build(self.timeout_secs, user_agent.into(), self.max_redirects)
    }

    pub fn with_max_redirects(self, max_redirects: usize) -> Result<Self> {
        Self::build(self.timeout_secs, self.user_agent, max_redirects)
    }

    fn build(timeout_secs: u64, user_agent: String, max_redirects: usize) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent.as_str())
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(max_redirects))
            .build()?;

        Ok(Self {
            client,
            timeout_secs,
            user_agent,
            max_redirects,
        })
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn max_redirects(&self) -> usize {
        self.max_redirects
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Document> {
        debug!("Fetching {}", url);

        let start = Instant::now();
        let mut response = self.client.get(url).send().await?;
        let response_time = start.elapsed();

        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let mut bytes = Vec::new();
        let mut truncated = None;
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => bytes.extend_from_slice(&chunk),
                Ok(None) => break,
                Err(e) => {
                    warn!("Body of {} cut off after {} bytes: {}", url, bytes.len(), e);
                    truncated = Some(e.to_string());
                    break;
                }
            }
        }

        let body = String::from_utf8_lossy(&bytes).into_owned();
        info!(
            "Fetched {} ({} bytes, {} ms)",
            url,
            body.len(),
            response_time.as_millis()
        );

        Ok(Document {
            url: url.to_string(),
            final_url,
            status_code: status.as_u16(),
            content_type,
            response_time,
            body,
            truncated,
        })
    }
}
