use crate::state::KaraokeState;
use singalong_core::{LyricsState, SyncEngine, SyncEvent};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const LOG_TARGET: &str = "singalong::bridge";

/// Bridge `SyncEngine` events to the console.
///
/// `events` should be subscribed before the fetcher and poller start. The
/// state is also seeded from the engine, so lyrics published before the
/// bridge runs still show up. Listens until the channel closes or
/// `cancel_token` fires, printing the status line whenever something visible
/// changes, and returns the final state.
pub async fn run_sync_bridge(
    sync_engine: Arc<SyncEngine>,
    mut events: broadcast::Receiver<SyncEvent>,
    mut karaoke: KaraokeState,
    cancel_token: CancellationToken,
) -> KaraokeState {
    seed_from_engine(&sync_engine, &mut karaoke).await;
    println!("{}", karaoke.render());

    loop {
        let received = tokio::select! {
            () = cancel_token.cancelled() => break,
            received = events.recv() => received,
        };

        match received {
            Ok(event) => {
                if handle_sync_event(event, &mut karaoke) {
                    println!("{}", karaoke.render());
                }
            }
            Err(RecvError::Closed) => {
                info!(target: LOG_TARGET, "Sync event channel closed");
                break;
            }
            Err(RecvError::Lagged(n)) => {
                warn!(target: LOG_TARGET, "Missed {} sync events", n);
            }
        }
    }

    karaoke
}

/// Copy whatever the engine already knows into the console state
async fn seed_from_engine(sync_engine: &SyncEngine, karaoke: &mut KaraokeState) {
    match sync_engine.lyrics().await {
        LyricsState::Loaded(document) => karaoke.set_lyrics(document),
        LyricsState::Unavailable { .. } => karaoke.clear_lyrics(),
        LyricsState::Pending => {}
    }
    karaoke.set_current_index(sync_engine.sync_state().await.current_index);

    let state = sync_engine.state().await;
    karaoke.sync_position(state.position);
    karaoke.set_duration(state.duration);
    karaoke.set_playing(state.is_playing);
}

/// Apply an event to the state; returns whether the status line changed.
fn handle_sync_event(event: SyncEvent, karaoke: &mut KaraokeState) -> bool {
    match event {
        SyncEvent::LyricsLoaded { document } => {
            info!(
                target: LOG_TARGET,
                "Lyrics ready: {} lines",
                document.lines().len()
            );
            karaoke.set_lyrics(document);
            true
        }
        SyncEvent::LyricsUnavailable { reason } => {
            warn!(target: LOG_TARGET, "No lyrics available: {}", reason);
            karaoke.clear_lyrics();
            true
        }
        SyncEvent::HighlightChanged { index } => {
            karaoke.set_current_index(index);
            true
        }
        SyncEvent::PositionSync { position, duration } => {
            // Clock ticks alone do not redraw
            karaoke.sync_position(position);
            karaoke.set_duration(duration);
            false
        }
        SyncEvent::SeekOccurred { position } => {
            info!(target: LOG_TARGET, "Seek to {:?}", position);
            karaoke.sync_position(position);
            true
        }
        SyncEvent::PlaybackStarted { position } | SyncEvent::PlaybackResumed { position } => {
            karaoke.sync_position(position);
            karaoke.set_playing(true);
            true
        }
        SyncEvent::PlaybackPaused { position } => {
            karaoke.sync_position(position);
            karaoke.set_playing(false);
            true
        }
        SyncEvent::Error { message } => {
            error!(target: LOG_TARGET, "Sync error: {}", message);
            false
        }
    }
}
