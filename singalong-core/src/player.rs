//! Player control surface and track description.

use crate::error::{CoreError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{error, info};

const LOG_TARGET: &str = "singalong::player";

/// Audio track registered with a player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// Stable identifier of the track within the player
    pub id: String,
    /// Location of the audio resource
    pub url: String,
    /// Known length, if the caller has it
    pub duration: Option<Duration>,
}

impl Track {
    /// Create a new track
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            duration: None,
        }
    }

    /// Set the known duration
    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// Position readout polled from a player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub position: Duration,
    /// Zero while unknown
    pub duration: Duration,
}

/// Trait for audio players driving the lyric display.
///
/// The sync engine only treats a player as a position oracle plus a command
/// sink; decoding and output are the implementation's business.
#[async_trait]
pub trait Player: Send + Sync {
    /// Returns a human-readable name for this player.
    fn name(&self) -> &'static str;

    /// Prepare the playback engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot be initialized.
    async fn setup(&self) -> Result<()>;

    /// Register the track to play.
    ///
    /// # Errors
    ///
    /// Returns an error if the track cannot be registered.
    async fn add(&self, track: Track) -> Result<()>;

    /// Start or resume playback.
    ///
    /// # Errors
    ///
    /// Returns an error if no track is ready.
    async fn play(&self) -> Result<()>;

    /// Pause playback.
    ///
    /// # Errors
    ///
    /// Returns an error if no track is ready.
    async fn pause(&self) -> Result<()>;

    /// Jump to a position.
    ///
    /// # Errors
    ///
    /// Returns an error if no track is ready.
    async fn seek_to(&self, position: Duration) -> Result<()>;

    /// Current position and duration.
    ///
    /// # Errors
    ///
    /// Returns an error if the player cannot report its position.
    async fn progress(&self) -> Result<Progress>;

    /// Whether audio is currently playing.
    async fn is_playing(&self) -> bool;

    /// Toggle between playing and paused, returning the new playing state.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying play or pause command fails.
    async fn toggle(&self) -> Result<bool> {
        if self.is_playing().await {
            self.pause().await?;
            Ok(false)
        } else {
            self.play().await?;
            Ok(true)
        }
    }
}

/// Set up `player` and register `track`.
///
/// Failures are logged and reported as [`CoreError::PlayerInit`]; callers keep
/// running with controls that no-op.
///
/// # Errors
///
/// Returns [`CoreError::PlayerInit`] if setup or track registration fails.
pub async fn initialize_player(player: &dyn Player, track: Track) -> Result<()> {
    let track_id = track.id.clone();
    let result = match player.setup().await {
        Ok(()) => player.add(track).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            info!(target: LOG_TARGET, "Player {} ready with track {}", player.name(), track_id);
            Ok(())
        }
        Err(e) => {
            error!(target: LOG_TARGET, "Player {} failed to initialize: {}", player.name(), e);
            Err(match e {
                CoreError::PlayerInit { .. } => e,
                other => CoreError::PlayerInit {
                    player: player.name(),
                    reason: other.to_string(),
                },
            })
        }
    }
}
