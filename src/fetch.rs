//! Remote image fetching.
//!
//! The pipeline only needs "GET this URL with these headers, tell me the
//! declared size, let me read the body". That is the [`HttpFetch`] trait.
//! [`ReqwestFetcher`] implements it with `reqwest::blocking` and the timeouts
//! from [`FetchConfig`]. There are no retries; a failed fetch is final for
//! that call.
//!
//! Size limits are enforced by the caller: it inspects
//! [`FetchResponse::declared_size`] before buffering and caps how much of
//! [`FetchResponse::body`] it reads.

use crate::config::FetchConfig;
use reqwest::Url;
use reqwest::header::{HeaderName, USER_AGENT};
use std::io::Read;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("HTTP status {0}")]
    Status(u16),
}

/// An open response whose body has not been read yet.
pub struct FetchResponse {
    /// `Content-Length`, when the server sent one.
    pub declared_size: Option<u64>,
    pub body: Box<dyn Read + Send>,
}

pub trait HttpFetch: Send + Sync {
    fn fetch(&self, url: &Url, headers: &[(HeaderName, String)])
    -> Result<FetchResponse, FetchError>;
}

/// Blocking `reqwest` client.
pub struct ReqwestFetcher {
    client: reqwest::blocking::Client,
}

impl ReqwestFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpFetch for ReqwestFetcher {
    fn fetch(
        &self,
        url: &Url,
        headers: &[(HeaderName, String)],
    ) -> Result<FetchResponse, FetchError> {
        let mut request = self.client.get(url.clone());
        for (name, value) in headers {
            request = request.header(name.clone(), value.as_str());
        }

        let response = request
            .send()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(FetchResponse {
            declared_size: response.content_length(),
            body: Box::new(response),
        })
    }
}

/// Header set for a remote image request: a `Referer` pointing at the
/// URL's own origin, plus the configured user agent.
pub fn request_headers(url: &Url, user_agent: &str) -> Vec<(HeaderName, String)> {
    let mut headers = vec![(reqwest::header::REFERER, referer_for(url))];
    if !user_agent.is_empty() {
        headers.push((USER_AGENT, user_agent.to_string()));
    }
    headers
}

/// `{scheme}://{host}/` of the URL.
pub fn referer_for(url: &Url) -> String {
    format!("{}://{}/", url.scheme(), url.host_str().unwrap_or_default())
}
