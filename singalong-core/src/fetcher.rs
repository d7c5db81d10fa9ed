//! One-shot lyrics loading.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::error::{CoreError, Result};
use crate::provider::DocumentSource;
use crate::sync::SyncEngine;
use crate::timing::{Granularity, TimingDocument};

/// Fetches and parses the timing document once, then publishes the outcome
pub struct LyricsFetcher {
    sync_engine: Arc<SyncEngine>,
    source: Box<dyn DocumentSource>,
    cancel_token: CancellationToken,
}

impl LyricsFetcher {
    /// Create a new lyrics fetcher
    ///
    /// # Arguments
    /// * `sync_engine` - Sync engine to publish the document to
    /// * `source` - Where the timing document lives
    /// * `cancel_token` - Optional external cancellation token for graceful shutdown
    pub fn new(
        sync_engine: Arc<SyncEngine>,
        source: Box<dyn DocumentSource>,
        cancel_token: Option<CancellationToken>,
    ) -> Self {
        Self {
            sync_engine,
            source,
            cancel_token: cancel_token.unwrap_or_default(),
        }
    }

    /// Get a clone of the cancellation token
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Start the lyrics fetcher in a background task
    #[must_use]
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Fetch and parse the document without publishing it
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Fetch`] if the document cannot be retrieved,
    /// [`CoreError::Parse`] if it is not a valid timing document, or
    /// [`CoreError::Cancelled`] if the cancellation token fires first.
    pub async fn load(&self) -> Result<TimingDocument> {
        let body = tokio::select! {
            () = self.cancel_token.cancelled() => return Err(CoreError::Cancelled),
            body = self.source.fetch() => body?,
        };
        Ok(TimingDocument::parse(&body)?)
    }

    /// Load the document and publish it to the sync engine.
    ///
    /// Failures are logged and published as "no lyrics available"; they are
    /// terminal for the session.
    pub async fn run(&self) {
        info!("Loading lyrics from {}", self.source.describe());

        match self.load().await {
            Ok(document) => {
                if self.cancel_token.is_cancelled() {
                    info!("Discarding lyrics loaded after shutdown");
                    return;
                }
                info!(
                    "Loaded lyrics: {} lines, {} words",
                    document.token_count(Granularity::Line),
                    document.token_count(Granularity::Word)
                );
                self.sync_engine.set_lyrics(document).await;
            }
            Err(CoreError::Cancelled) => {
                info!("Lyrics fetch cancelled");
            }
            Err(e) => {
                error!("Error loading lyrics: {}", e);
                self.sync_engine.set_no_lyrics(e.to_string()).await;
            }
        }
    }
}
