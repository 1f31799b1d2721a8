// Remote snapshot fetch: one GET against {target}/varz per poll

use std::time::Duration;

use thiserror::Error;
use tracing::instrument;

use crate::models::{FailureKind, Varz};
use crate::version;

/// One failed fetch, classified. Timeouts are kept apart from the other
/// transport outcomes so the halt reason survives to the display layer.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("server returned {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed varz payload: {0}")]
    Payload(#[source] reqwest::Error),
}

impl FetchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::Timeout(_) => FailureKind::Timeout,
            FetchError::Transport(_) | FetchError::Status(_) | FetchError::Payload(_) => {
                FailureKind::Fetch
            }
        }
    }
}

/// Fetches monitoring snapshots from a server's HTTP monitoring port.
/// Stateless per call; holds nothing but the client and the deadline.
pub struct VarzRepo {
    client: reqwest::Client,
    timeout: Duration,
}

impl VarzRepo {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!("{}/{}", version::NAME, version::VERSION))
            .build()?;
        Ok(Self { client, timeout })
    }

    /// Issue a single request. No internal retry; exceeding the deadline
    /// abandons the request and reports a timeout.
    #[instrument(skip_all, fields(repo = "varz", operation = "fetch_varz", url = %target))]
    pub async fn fetch_varz(&self, target: &str) -> Result<Varz, FetchError> {
        let url = varz_url(target);
        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.classify(e, FetchError::Transport))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        // The deadline covers the body read too; a stall here is still a timeout.
        response
            .json::<Varz>()
            .await
            .map_err(|e| self.classify(e, FetchError::Payload))
    }

    fn classify(&self, e: reqwest::Error, otherwise: fn(reqwest::Error) -> FetchError) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            otherwise(e)
        }
    }
}

/// Monitoring endpoint URL for a target base URL (tolerates trailing slashes).
pub fn varz_url(target: &str) -> String {
    format!("{}/varz", target.trim_end_matches('/'))
}
