use crate::playback::PlaybackState;
use crate::timing::{Granularity, TimingDocument};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

const LOG_TARGET: &str = "singalong::sync";

/// Default jump that counts as a seek rather than natural progress
pub const DEFAULT_SEEK_THRESHOLD: Duration = Duration::from_secs(2);

/// Resolve a playback position to the index of the token to highlight.
///
/// Returns the last index whose start time is `<= position`. Positions before
/// the first token, and empty sequences, resolve to `0`; positions past the
/// last token resolve to the last index. When several tokens share a start
/// time the last of them wins.
///
/// `timestamps` must be non-decreasing.
#[must_use]
pub fn resolve(position: f64, timestamps: &[f64]) -> usize {
    // First index whose start lies strictly after the position
    let next = timestamps.partition_point(|&start| start <= position);
    next.saturating_sub(1)
}

/// Highlight state derived from a position; recomputed on every update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncState {
    /// Token to highlight, `None` before the first update or without lyrics
    pub current_index: Option<usize>,
}

impl SyncState {
    /// Compute the state for `position` over `timestamps`.
    #[must_use]
    pub fn at(position: f64, timestamps: &[f64]) -> Self {
        let current_index = if timestamps.is_empty() {
            None
        } else {
            Some(resolve(position, timestamps))
        };
        Self { current_index }
    }
}

/// Events emitted by the sync engine
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// First time playback was observed running
    PlaybackStarted { position: Duration },
    /// Playback was paused
    PlaybackPaused { position: Duration },
    /// Playback was resumed
    PlaybackResumed { position: Duration },
    /// Regular position sync update
    PositionSync {
        position: Duration,
        duration: Duration,
    },
    /// Position jumped (user seek)
    SeekOccurred { position: Duration },
    /// The highlighted token changed
    HighlightChanged { index: Option<usize> },
    /// Lyrics document became available
    LyricsLoaded { document: Arc<TimingDocument> },
    /// Lyrics could not be loaded for this session
    LyricsUnavailable { reason: String },
    /// Error occurred
    Error { message: String },
}

/// What the engine knows about the lyrics
#[derive(Debug, Clone, Default)]
pub enum LyricsState {
    /// Fetch still in flight
    #[default]
    Pending,
    Loaded(Arc<TimingDocument>),
    /// Fetch or parse failed; terminal for the session
    Unavailable { reason: String },
}

impl LyricsState {
    #[must_use]
    pub fn document(&self) -> Option<&Arc<TimingDocument>> {
        match self {
            Self::Loaded(document) => Some(document),
            _ => None,
        }
    }
}

/// Sync engine state
struct SyncEngineInner {
    state: PlaybackState,
    lyrics: LyricsState,
    sync: SyncState,
    has_played: bool,
}

/// Engine that synchronizes playback state and lyrics
pub struct SyncEngine {
    inner: RwLock<SyncEngineInner>,
    granularity: Granularity,
    seek_threshold: Duration,
    event_tx: broadcast::Sender<SyncEvent>,
}

impl SyncEngine {
    /// Create a new sync engine highlighting tokens of the given granularity
    #[must_use]
    pub fn new(granularity: Granularity) -> Arc<Self> {
        Arc::new(Self::with_seek_threshold(granularity, DEFAULT_SEEK_THRESHOLD))
    }

    /// Create a sync engine with a custom seek detection threshold
    #[must_use]
    pub fn with_seek_threshold(granularity: Granularity, seek_threshold: Duration) -> Self {
        let (event_tx, _) = broadcast::channel(64);

        Self {
            inner: RwLock::new(SyncEngineInner {
                state: PlaybackState::default(),
                lyrics: LyricsState::Pending,
                sync: SyncState::default(),
                has_played: false,
            }),
            granularity,
            seek_threshold,
            event_tx,
        }
    }

    /// Subscribe to sync events
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.event_tx.subscribe()
    }

    /// Granularity used for highlighting
    #[must_use]
    pub const fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Update playback state and emit appropriate events
    pub async fn update_state(&self, new_state: PlaybackState) {
        let mut inner = self.inner.write().await;
        let old_state = &inner.state;

        let playback_changed = old_state.playback_state_changed(&new_state);
        let seek_occurred = old_state.seek_occurred(&new_state, self.seek_threshold);

        if playback_changed {
            if new_state.is_playing {
                if inner.has_played {
                    self.emit(SyncEvent::PlaybackResumed {
                        position: new_state.position,
                    });
                } else {
                    self.emit(SyncEvent::PlaybackStarted {
                        position: new_state.position,
                    });
                }
            } else {
                self.emit(SyncEvent::PlaybackPaused {
                    position: new_state.position,
                });
            }
        } else if seek_occurred {
            self.emit(SyncEvent::SeekOccurred {
                position: new_state.position,
            });
        } else {
            self.emit(SyncEvent::PositionSync {
                position: new_state.position,
                duration: new_state.duration,
            });
        }

        if new_state.is_playing {
            inner.has_played = true;
        }

        let sync = Self::sync_for(&inner.lyrics, self.granularity, new_state.position_secs());
        inner.state = new_state;
        self.apply_sync(&mut inner, sync);
    }

    /// Set lyrics for the session and highlight at the current position
    pub async fn set_lyrics(&self, document: TimingDocument) {
        let document = Arc::new(document);
        let mut inner = self.inner.write().await;
        inner.lyrics = LyricsState::Loaded(Arc::clone(&document));
        self.emit(SyncEvent::LyricsLoaded { document });

        let sync = Self::sync_for(&inner.lyrics, self.granularity, inner.state.position_secs());
        self.apply_sync(&mut inner, sync);
    }

    /// Mark that no lyrics are available for this session
    pub async fn set_no_lyrics(&self, reason: impl Into<String>) {
        let reason = reason.into();
        let mut inner = self.inner.write().await;
        inner.lyrics = LyricsState::Unavailable {
            reason: reason.clone(),
        };
        self.emit(SyncEvent::LyricsUnavailable { reason });
        self.apply_sync(&mut inner, SyncState::default());
    }

    /// Emit an error event
    pub fn emit_error(&self, message: String) {
        self.emit(SyncEvent::Error { message });
    }

    /// Get current playback state
    pub async fn state(&self) -> PlaybackState {
        self.inner.read().await.state.clone()
    }

    /// Get current lyrics state
    pub async fn lyrics(&self) -> LyricsState {
        self.inner.read().await.lyrics.clone()
    }

    /// Get the loaded document, if any
    pub async fn document(&self) -> Option<Arc<TimingDocument>> {
        self.inner.read().await.lyrics.document().cloned()
    }

    /// Get current highlight state
    pub async fn sync_state(&self) -> SyncState {
        self.inner.read().await.sync
    }

    /// Get the highlighted token index
    pub async fn current_index(&self) -> Option<usize> {
        self.inner.read().await.sync.current_index
    }

    /// Check if currently playing
    pub async fn is_playing(&self) -> bool {
        self.inner.read().await.state.is_playing
    }

    fn sync_for(lyrics: &LyricsState, granularity: Granularity, position: f64) -> SyncState {
        lyrics.document().map_or_else(SyncState::default, |document| {
            SyncState::at(position, document.timestamps(granularity))
        })
    }

    fn apply_sync(&self, inner: &mut SyncEngineInner, sync: SyncState) {
        if inner.sync != sync {
            debug!(
                target: LOG_TARGET,
                "Highlight moved from {:?} to {:?}",
                inner.sync.current_index,
                sync.current_index
            );
            inner.sync = sync;
            self.emit(SyncEvent::HighlightChanged {
                index: sync.current_index,
            });
        }
    }

    fn emit(&self, event: SyncEvent) {
        // No subscribers is fine; events are advisory
        let _ = self.event_tx.send(event);
    }
}
