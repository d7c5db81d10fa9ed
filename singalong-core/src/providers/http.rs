use crate::error::FetchError;
use crate::provider::DocumentSource;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const LOG_TARGET: &str = "singalong::provider::http";

/// Default timeout for HTTP requests (10 seconds)
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Timing document served over HTTP(S). Requests are not retried.
pub struct HttpDocumentSource {
    client: reqwest::Client,
    url: Url,
}

impl HttpDocumentSource {
    /// Create a new HTTP source with a 10-second timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(url: Url) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("singalong/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, url })
    }
}

#[async_trait]
impl DocumentSource for HttpDocumentSource {
    fn describe(&self) -> String {
        self.url.to_string()
    }

    async fn fetch(&self) -> Result<String, FetchError> {
        info!(target: LOG_TARGET, "Fetching timing document from {}", self.url);

        let response = self.client.get(self.url.clone()).send().await?;
        let status = response.status();
        debug!(target: LOG_TARGET, "Response status: {}", status);

        if !status.is_success() {
            warn!(target: LOG_TARGET, "{} returned status: {}", self.url, status);
            return Err(FetchError::Status {
                url: self.url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        debug!(target: LOG_TARGET, "Received {} bytes", body.len());
        Ok(body)
    }
}
