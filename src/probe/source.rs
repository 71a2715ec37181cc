//! Page sources for the monitor.

use std::time::Duration;

use async_trait::async_trait;
use tracing::instrument;

use crate::error::FetchError;

/// Supplies the current HTML of the monitored page.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch a fresh copy of the page.
    async fn fetch(&self) -> Result<String, FetchError>;
}

/// Fetches the page over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: reqwest::Client,
    url: String,
}

impl HttpPageSource {
    /// Builds a source for `url` whose requests give up after `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("slotwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport {
                message: e.to_string(),
            })?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> Result<String, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        // Decodes using the charset the server declares.
        response.text().await.map_err(|e| FetchError::Body {
            message: e.to_string(),
        })
    }
}
