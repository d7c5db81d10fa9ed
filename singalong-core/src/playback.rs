use std::time::Duration;
use tokio::time::Instant;

/// Current playback state observed from the player
#[derive(Debug, Clone)]
pub struct PlaybackState {
    /// Whether audio is currently playing
    pub is_playing: bool,
    /// Current playback position
    pub position: Duration,
    /// Total track duration (zero while unknown)
    pub duration: Duration,
    /// When this state was sampled (for seek detection)
    pub updated_at: Instant,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            is_playing: false,
            position: Duration::ZERO,
            duration: Duration::ZERO,
            updated_at: Instant::now(),
        }
    }
}

impl PlaybackState {
    /// Create a new playback state
    #[must_use]
    pub fn new(is_playing: bool, position: Duration, duration: Duration) -> Self {
        Self {
            is_playing,
            position,
            duration,
            updated_at: Instant::now(),
        }
    }

    /// Position in seconds
    #[must_use]
    pub fn position_secs(&self) -> f64 {
        self.position.as_secs_f64()
    }

    /// Check if playback state changed (playing <-> paused)
    #[must_use]
    pub const fn playback_state_changed(&self, other: &Self) -> bool {
        self.is_playing != other.is_playing
    }

    /// Check if a seek occurred (position jumped unexpectedly)
    #[must_use]
    pub fn seek_occurred(&self, other: &Self, threshold: Duration) -> bool {
        // Expected position at the time `other` was sampled
        let expected = if self.is_playing {
            let elapsed = other.updated_at.saturating_duration_since(self.updated_at);
            self.position + elapsed
        } else {
            self.position
        };
        let actual = other.position;

        if actual > expected {
            actual - expected > threshold
        } else {
            expected - actual > threshold
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playback_state_default() {
        let state = PlaybackState::default();
        assert!(!state.is_playing);
        assert_eq!(state.position, Duration::ZERO);
        assert_eq!(state.duration, Duration::ZERO);
    }

    #[test]
    fn test_position_secs() {
        let state = PlaybackState::new(true, Duration::from_millis(4900), Duration::from_secs(180));
        assert!((state.position_secs() - 4.9).abs() < 1e-9);
    }

    #[test]
    fn test_playback_state_changed() {
        let state1 = PlaybackState {
            is_playing: true,
            ..Default::default()
        };
        let state2 = PlaybackState {
            is_playing: false,
            ..Default::default()
        };

        assert!(state1.playback_state_changed(&state2));
        assert!(!state1.playback_state_changed(&state1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_seek_detection() {
        let threshold = Duration::from_secs(2);
        let before = PlaybackState::new(true, Duration::from_secs(10), Duration::from_secs(180));
        tokio::time::advance(Duration::from_secs(1)).await;

        let natural = PlaybackState::new(true, Duration::from_secs(11), Duration::from_secs(180));
        assert!(!before.seek_occurred(&natural, threshold));

        let forward = PlaybackState::new(true, Duration::from_secs(60), Duration::from_secs(180));
        assert!(before.seek_occurred(&forward, threshold));

        let backward = PlaybackState::new(true, Duration::from_secs(2), Duration::from_secs(180));
        assert!(before.seek_occurred(&backward, threshold));
    }
}
