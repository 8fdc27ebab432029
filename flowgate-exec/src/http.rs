use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;

/// A fully resolved outbound request.
#[derive(Debug, Clone)]
pub struct HttpRequestParts {
    pub method: String,
    pub url: url::Url,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct HttpResponseParts {
    pub status: u16,
    /// Header names are lower-case.
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponseParts {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HttpError {
    #[error("downstream request timed out")]
    Timeout,
    #[error("could not reach downstream service: {0}")]
    Network(String),
    #[error("downstream response exceeds {max_bytes} bytes")]
    ResponseTooLarge { max_bytes: usize },
    #[error("downstream request failed: {0}")]
    Other(String),
}

/// Outbound transport seam. The engine only ever talks to downstream services
/// through this trait, so tests substitute recording fakes.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn send(
        &self,
        req: HttpRequestParts,
        timeout: Duration,
        max_response_bytes: usize,
    ) -> Result<HttpResponseParts, HttpError>;
}

/// Pooled client shared by every call in the process.
#[derive(Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn try_new() -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(concat!("flowgate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HttpError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn send(
        &self,
        req: HttpRequestParts,
        timeout: Duration,
        max_response_bytes: usize,
    ) -> Result<HttpResponseParts, HttpError> {
        let method = reqwest::Method::from_bytes(req.method.as_bytes())
            .map_err(|e| HttpError::Other(e.to_string()))?;
        let builder = req
            .headers
            .into_iter()
            .fold(self.client.request(method, req.url).timeout(timeout), |b, (name, value)| {
                b.header(name, value)
            });
        let builder = if req.body.is_empty() { builder } else { builder.body(req.body) };

        let mut resp = builder.send().await.map_err(map_reqwest_error)?;
        let status = resp.status().as_u16();

        if resp
            .content_length()
            .is_some_and(|len| len > max_response_bytes as u64)
        {
            return Err(HttpError::ResponseTooLarge {
                max_bytes: max_response_bytes,
            });
        }

        let headers: BTreeMap<String, String> = resp
            .headers()
            .iter()
            .filter_map(|(name, value)| Some((name.as_str().to_ascii_lowercase(), value.to_str().ok()?.to_string())))
            .collect();

        // Stream with a cap so an unbounded body never lands in memory.
        let mut body = Vec::new();
        while let Some(chunk) = resp.chunk().await.map_err(map_reqwest_error)? {
            if body.len() + chunk.len() > max_response_bytes {
                return Err(HttpError::ResponseTooLarge {
                    max_bytes: max_response_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(HttpResponseParts {
            status,
            headers,
            body,
        })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> HttpError {
    if e.is_timeout() {
        HttpError::Timeout
    } else if e.is_connect() || e.is_request() {
        HttpError::Network(e.to_string())
    } else {
        HttpError::Other(e.to_string())
    }
}
