//! Wall-clock player.
//!
//! Advances a virtual playhead with real time instead of decoding audio. It
//! backs the console app and tests; a real audio backend plugs in through the
//! same [`Player`] trait.

use crate::error::{CoreError, Result};
use crate::player::{Player, Progress, Track};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

const LOG_TARGET: &str = "singalong::player::clock";
const PLAYER_NAME: &str = "clock";

#[derive(Default)]
struct ClockInner {
    ready: bool,
    track: Option<Track>,
    /// Position at the moment `started_at` was taken, or while paused
    offset: Duration,
    /// Set while playing
    started_at: Option<Instant>,
}

impl ClockInner {
    fn duration(&self) -> Duration {
        self.track
            .as_ref()
            .and_then(|track| track.duration)
            .unwrap_or(Duration::ZERO)
    }

    fn position(&self) -> Duration {
        let position = self
            .started_at
            .map_or(self.offset, |started| self.offset + started.elapsed());
        let duration = self.duration();
        if duration.is_zero() {
            position
        } else {
            position.min(duration)
        }
    }

    fn finished(&self) -> bool {
        let duration = self.duration();
        !duration.is_zero() && self.position() >= duration
    }

    fn ensure_track(&self) -> Result<()> {
        if self.track.is_some() {
            Ok(())
        } else {
            Err(CoreError::PlayerNotReady {
                player: PLAYER_NAME,
            })
        }
    }
}

/// Player that keeps time without producing sound.
#[derive(Default)]
pub struct ClockPlayer {
    inner: Mutex<ClockInner>,
}

impl ClockPlayer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Player for ClockPlayer {
    fn name(&self) -> &'static str {
        PLAYER_NAME
    }

    async fn setup(&self) -> Result<()> {
        self.inner.lock().await.ready = true;
        debug!(target: LOG_TARGET, "Clock player set up");
        Ok(())
    }

    async fn add(&self, track: Track) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if !inner.ready {
            return Err(CoreError::PlayerInit {
                player: PLAYER_NAME,
                reason: "setup() must be called before add()".to_string(),
            });
        }
        info!(target: LOG_TARGET, "Loaded track {} from {}", track.id, track.url);
        inner.track = Some(track);
        inner.offset = Duration::ZERO;
        inner.started_at = None;
        Ok(())
    }

    async fn play(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.ensure_track()?;
        if inner.finished() {
            // Replay from the top once the end was reached
            inner.offset = Duration::ZERO;
            inner.started_at = None;
        }
        if inner.started_at.is_none() {
            inner.started_at = Some(Instant::now());
        }
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.ensure_track()?;
        inner.offset = inner.position();
        inner.started_at = None;
        Ok(())
    }

    async fn seek_to(&self, position: Duration) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.ensure_track()?;
        let duration = inner.duration();
        inner.offset = if duration.is_zero() {
            position
        } else {
            position.min(duration)
        };
        if inner.started_at.is_some() {
            inner.started_at = Some(Instant::now());
        }
        debug!(target: LOG_TARGET, "Seeked to {:?}", inner.offset);
        Ok(())
    }

    async fn progress(&self) -> Result<Progress> {
        let inner = self.inner.lock().await;
        Ok(Progress {
            position: inner.position(),
            duration: inner.duration(),
        })
    }

    async fn is_playing(&self) -> bool {
        let inner = self.inner.lock().await;
        inner.started_at.is_some() && !inner.finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn ready_player(duration: Option<Duration>) -> ClockPlayer {
        let player = ClockPlayer::new();
        player.setup().await.unwrap();
        let mut track = Track::new("main", "memory://beat");
        track.duration = duration;
        player.add(track).await.unwrap();
        player
    }

    #[tokio::test]
    async fn test_commands_before_add_fail() {
        let player = ClockPlayer::new();
        assert!(matches!(player.play().await, Err(CoreError::PlayerNotReady { .. })));
        assert!(matches!(
            player.seek_to(Duration::from_secs(1)).await,
            Err(CoreError::PlayerNotReady { .. })
        ));
        assert!(matches!(
            player.add(Track::new("main", "x")).await,
            Err(CoreError::PlayerInit { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_position_advances_while_playing() {
        let player = ready_player(None).await;
        assert_eq!(player.progress().await.unwrap().position, Duration::ZERO);

        player.play().await.unwrap();
        tokio::time::advance(Duration::from_millis(1500)).await;
        assert!(player.is_playing().await);
        assert_eq!(player.progress().await.unwrap().position, Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_freezes_position() {
        let player = ready_player(None).await;
        player.play().await.unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;
        player.pause().await.unwrap();
        tokio::time::advance(Duration::from_secs(5)).await;

        assert!(!player.is_playing().await);
        assert_eq!(player.progress().await.unwrap().position, Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_seek_while_playing() {
        let player = ready_player(Some(Duration::from_secs(60))).await;
        player.play().await.unwrap();
        tokio::time::advance(Duration::from_secs(10)).await;
        player.seek_to(Duration::from_secs(3)).await.unwrap();
        tokio::time::advance(Duration::from_secs(1)).await;

        let progress = player.progress().await.unwrap();
        assert_eq!(progress.position, Duration::from_secs(4));
        assert_eq!(progress.duration, Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_at_end_and_replays() {
        let player = ready_player(Some(Duration::from_secs(5))).await;
        player.play().await.unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;

        assert!(!player.is_playing().await);
        assert_eq!(player.progress().await.unwrap().position, Duration::from_secs(5));

        player.pause().await.unwrap();
        player.play().await.unwrap();
        assert_eq!(player.progress().await.unwrap().position, Duration::ZERO);
        assert!(player.is_playing().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle() {
        let player = ready_player(None).await;
        assert!(player.toggle().await.unwrap());
        assert!(!player.toggle().await.unwrap());
    }
}
