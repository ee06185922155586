//! Blocking HTTP helpers shared by the embedding and generation clients.
//!
//! Every call reads the whole response body before returning, so the
//! underlying connection goes back to the agent on success and on error.
//! Nothing here retries; callers decide how a failure surfaces.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("server responded with HTTP {0}")]
    Status(u16),
    #[error("request timed out")]
    Timeout,
    #[error("could not reach {0}")]
    Unreachable(String),
    #[error("{0}")]
    Transport(String),
}

impl HttpError {
    /// Rate limits, server errors and network failures may succeed if tried later
    #[inline]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Status(status) => *status == 429 || *status >= 500,
            Self::Timeout | Self::Unreachable(_) => true,
            Self::Transport(_) => false,
        }
    }
}

impl From<ureq::Error> for HttpError {
    fn from(error: ureq::Error) -> Self {
        match error {
            ureq::Error::StatusCode(status) => Self::Status(status),
            ureq::Error::Timeout(_) => Self::Timeout,
            ureq::Error::ConnectionFailed | ureq::Error::HostNotFound => {
                Self::Unreachable(error.to_string())
            }
            other => Self::Transport(other.to_string()),
        }
    }
}

#[inline]
pub fn agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .into()
}

#[inline]
pub fn get_text(agent: &ureq::Agent, url: &Url) -> Result<String, HttpError> {
    debug!("GET {}", url);
    agent
        .get(url.as_str())
        .call()
        .and_then(|mut resp| resp.body_mut().read_to_string())
        .map_err(|e| log_failure(url, e.into()))
}

/// POST a JSON body, optionally with a bearer token, and return the response text
#[inline]
pub fn post_json(
    agent: &ureq::Agent,
    url: &Url,
    body: &str,
    bearer: Option<&str>,
) -> Result<String, HttpError> {
    debug!("POST {} ({} bytes)", url, body.len());

    let mut request = agent
        .post(url.as_str())
        .header("Content-Type", "application/json");
    if let Some(token) = bearer {
        request = request.header("Authorization", format!("Bearer {}", token));
    }

    request
        .send(body)
        .and_then(|mut resp| resp.body_mut().read_to_string())
        .map_err(|e| log_failure(url, e.into()))
}

fn log_failure(url: &Url, error: HttpError) -> HttpError {
    if error.is_transient() {
        warn!("Transient failure calling {}: {}", url, error);
    } else {
        warn!("Request to {} failed: {}", url, error);
    }
    error
}
