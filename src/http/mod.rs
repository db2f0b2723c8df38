//! Blocking HTTP helpers shared by the service clients.
//!
//! All outbound calls go through a `ureq::Agent` with a global timeout and are
//! issued exactly once. Async callers hop onto the blocking pool with
//! [`run_blocking`] so the executor is never stalled by network I/O.

#[cfg(test)]
mod tests;

use std::time::Duration;

use anyhow::anyhow;
use thiserror::Error;
use tracing::debug;
use ureq::Agent;
use url::Url;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Header name/value pairs attached to a request
pub type Headers = Vec<(&'static str, String)>;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("HTTP error {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to make HTTP request to {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: ureq::Error,
    },

    #[error("Failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: ureq::Error,
    },
}

impl HttpError {
    /// HTTP status code, if the server answered at all
    #[inline]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport { .. } | Self::Body { .. } => None,
        }
    }
}

/// Build an agent whose requests all share one global timeout
#[inline]
pub fn build_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .user_agent(concat!("smartspidy-rag/", env!("CARGO_PKG_VERSION")))
        .build()
        .into()
}

/// Standard `Authorization: Bearer` header, omitted when no key is configured
#[inline]
pub fn bearer_auth(api_key: &str) -> Headers {
    if api_key.is_empty() {
        Vec::new()
    } else {
        vec![("Authorization", format!("Bearer {}", api_key))]
    }
}

/// Perform a GET request and return the response body
#[inline]
pub fn get_text(agent: &Agent, url: &Url, headers: &Headers) -> Result<String, HttpError> {
    debug!("Making HTTP GET request to: {}", url);

    let mut request = agent.get(url.as_str());
    for (name, value) in headers {
        request = request.header(*name, value.as_str());
    }

    read_response(url, request.call())
}

/// POST a JSON document and return the response body
#[inline]
pub fn post_json(
    agent: &Agent,
    url: &Url,
    headers: &Headers,
    body: &str,
) -> Result<String, HttpError> {
    debug!("Making HTTP POST request to: {} ({} bytes)", url, body.len());

    let mut request = agent
        .post(url.as_str())
        .header("Content-Type", "application/json");
    for (name, value) in headers {
        request = request.header(*name, value.as_str());
    }

    read_response(url, request.send(body))
}

fn read_response(
    url: &Url,
    response: Result<ureq::http::Response<ureq::Body>, ureq::Error>,
) -> Result<String, HttpError> {
    match response {
        Ok(mut response) => {
            let text = response
                .body_mut()
                .read_to_string()
                .map_err(|source| HttpError::Body {
                    url: url.to_string(),
                    source,
                })?;
            debug!("Read {} bytes from {}", text.len(), url);
            Ok(text)
        }
        Err(ureq::Error::StatusCode(status)) => {
            debug!("HTTP request failed with status {}: {}", status, url);
            Err(HttpError::Status {
                url: url.to_string(),
                status,
            })
        }
        Err(source) => {
            debug!("HTTP request failed with transport error: {}", source);
            Err(HttpError::Transport {
                url: url.to_string(),
                source,
            })
        }
    }
}

/// Run a blocking closure on the blocking thread pool and wait for it
/// without holding up the async executor.
#[inline]
pub async fn run_blocking<T, F>(operation: &'static str, task: F) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| anyhow!("{} task failed: {}", operation, e))?
}
