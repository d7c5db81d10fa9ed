pub mod clock;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod paths;
pub mod playback;
pub mod player;
pub mod poller;
pub mod presentation;
pub mod provider;
pub mod providers;
pub mod sync;
pub mod time;
pub mod timing;

pub use clock::ClockPlayer;
pub use config::{
    DisplayConfig, LoggingConfig, SingalongConfig, SourcesConfig, SyncConfig, CONFIG_TEMPLATE,
};

/// Re-export toml error type for config parsing error handling
pub use toml::de::Error as TomlParseError;
pub use error::{CoreError, FetchError, ParseError};
pub use fetcher::LyricsFetcher;
pub use paths::{config_dir, config_path, log_file_path, CONFIG_DIR_NAME, CONFIG_FILE_NAME};
pub use playback::PlaybackState;
pub use player::{initialize_player, Player, Progress, Track};
pub use poller::PositionPoller;
pub use presentation::{DisplayStyle, LineView, LyricsView, TokenView};
pub use provider::{document_source_for, DocumentSource};
pub use sync::{resolve, LyricsState, SyncEngine, SyncEvent, SyncState};
pub use time::{format_clock, format_duration, parse_clock, DurationExt};
pub use timing::{Granularity, LyricLine, TimedToken, TimingDocument, WordLocation};
