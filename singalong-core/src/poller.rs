//! Player position polling.

use crate::error::Result;
use crate::player::Player;
use crate::playback::PlaybackState;
use crate::sync::SyncEngine;
use crate::time::DurationExt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, trace, warn};

const LOG_TARGET: &str = "singalong::poller";

/// Samples a player's position at a fixed interval and feeds the sync engine.
pub struct PositionPoller {
    player: Arc<dyn Player>,
    sync_engine: Arc<SyncEngine>,
    poll_interval: Duration,
    cancel_token: CancellationToken,
}

impl PositionPoller {
    /// Create a new position poller
    ///
    /// # Arguments
    /// * `player` - Player to read the position from
    /// * `sync_engine` - Sync engine to update with playback state
    /// * `poll_interval` - Time between samples
    /// * `cancel_token` - Optional external cancellation token for graceful shutdown
    pub fn new(
        player: Arc<dyn Player>,
        sync_engine: Arc<SyncEngine>,
        poll_interval: Duration,
        cancel_token: Option<CancellationToken>,
    ) -> Self {
        Self {
            player,
            sync_engine,
            poll_interval,
            cancel_token: cancel_token.unwrap_or_default(),
        }
    }

    /// Get a clone of the cancellation token
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Start polling in a background task
    #[must_use]
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Sample the player once and update the sync engine
    ///
    /// # Errors
    ///
    /// Returns an error if the player cannot report its progress.
    pub async fn poll_once(&self) -> Result<()> {
        let progress = self.player.progress().await?;
        let is_playing = self.player.is_playing().await;

        let state = PlaybackState::new(is_playing, progress.position, progress.duration);
        trace!(
            target: LOG_TARGET,
            "Polled {}: playing={}, position={:?}",
            self.player.name(),
            state.is_playing,
            state.position
        );

        self.sync_engine.update_state(state).await;
        Ok(())
    }

    /// Poll until cancelled
    pub async fn run(&self) {
        info!(
            target: LOG_TARGET,
            "Starting position poller for {} (interval: {}ms)",
            self.player.name(),
            self.poll_interval.as_millis_u64()
        );

        let mut consecutive_errors: u32 = 0;
        let max_backoff = Duration::from_secs(30);

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!(target: LOG_TARGET, "Poller shutting down gracefully");
                    break;
                }
                () = tokio::time::sleep(self.poll_interval) => {
                    match self.poll_once().await {
                        Ok(()) => {
                            consecutive_errors = 0;
                        }
                        Err(e) => {
                            consecutive_errors = consecutive_errors.saturating_add(1);
                            warn!(target: LOG_TARGET, "Poll error (attempt {}): {}", consecutive_errors, e);
                            self.sync_engine.emit_error(e.to_string());

                            // Exponential backoff: 100ms * 2^errors, capped at max_backoff
                            let backoff_ms = 100_u64
                                .saturating_mul(2_u64.saturating_pow(consecutive_errors.min(10)));
                            let backoff = Duration::from_millis(backoff_ms.min(max_backoff.as_millis_u64()));

                            if consecutive_errors >= 5 {
                                error!(target: LOG_TARGET, "Too many consecutive errors, waiting {} seconds", backoff.as_secs());
                            }

                            tokio::select! {
                                () = self.cancel_token.cancelled() => break,
                                () = tokio::time::sleep(backoff) => {}
                            }
                        }
                    }
                }
            }
        }
    }
}
