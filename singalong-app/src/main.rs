mod bridge;
mod controls;
mod state;

use crate::bridge::run_sync_bridge;
use crate::controls::{execute, run_controls, Command, HELP};
use crate::state::KaraokeState;
use singalong_core::{
    document_source_for, initialize_player, ClockPlayer, CoreError, DisplayStyle, LyricsFetcher,
    Player, PositionPoller, SingalongConfig, SyncEngine, CONFIG_TEMPLATE,
};
use std::fs::File;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(500);

fn main() {
    if std::env::args().skip(1).any(|arg| arg == "--print-config") {
        print!("{CONFIG_TEMPLATE}");
        return;
    }

    // Check config for logging.enabled before full config load
    let file_logging_enabled = check_file_logging_enabled();
    init_tracing(file_logging_enabled);

    let config = match SingalongConfig::load_or_default() {
        Ok(config) => config,
        Err(CoreError::ConfigParseError(parse_error)) => {
            error!(
                "Config file {} has a syntax error: {parse_error}",
                SingalongConfig::config_path().display()
            );
            std::process::exit(1);
        }
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    let cancel_token = CancellationToken::new();

    // Set up Ctrl+C handler to trigger graceful shutdown
    let ctrlc_token = cancel_token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C, shutting down gracefully...");
        ctrlc_token.cancel();
    }) {
        error!("Failed to set Ctrl+C handler: {}", e);
    }

    runtime.block_on(run(config, cancel_token));

    // The stdin reader may still be parked in a blocking read
    runtime.shutdown_timeout(SHUTDOWN_TIMEOUT);
}

/// Wire the engine, player, fetcher, poller and console together, then wait
/// for shutdown.
async fn run(config: SingalongConfig, cancel_token: CancellationToken) {
    let granularity = config.sync.granularity;
    let sync_engine = Arc::new(SyncEngine::with_seek_threshold(
        granularity,
        config.sync.seek_threshold(),
    ));
    let player: Arc<dyn Player> = Arc::new(ClockPlayer::new());

    // Subscribe before anything can publish so no event is missed
    let events = sync_engine.subscribe();
    let karaoke = KaraokeState::new(
        granularity,
        DisplayStyle::from_config(&config.display, granularity),
    );
    let bridge = tokio::spawn(run_sync_bridge(
        sync_engine.clone(),
        events,
        karaoke,
        cancel_token.clone(),
    ));

    // Player setup and lyrics fetch are independent; neither waits on the other
    tokio::spawn(start_player(
        player.clone(),
        config.clone(),
        cancel_token.clone(),
    ));
    tokio::spawn(start_lyrics_fetcher(
        config.sources.lyrics_url.clone(),
        sync_engine.clone(),
        cancel_token.clone(),
    ));

    let poller = Arc::new(PositionPoller::new(
        player.clone(),
        sync_engine,
        config.sync.poll_interval(),
        Some(cancel_token.clone()),
    ));
    info!(
        "Starting position poller (interval: {:?}, granularity: {:?})",
        config.sync.poll_interval(),
        granularity
    );
    let poller_handle = poller.start();

    println!("{HELP}");
    tokio::spawn(run_controls(player, cancel_token.clone()));

    cancel_token.cancelled().await;
    if let Err(e) = poller_handle.await {
        error!("Position poller task failed: {e}");
    }
    if let Err(e) = bridge.await {
        error!("Display task failed: {e}");
    }
    info!("Shut down");
}

/// Set up the player with the configured track, then autoplay if enabled
async fn start_player(
    player: Arc<dyn Player>,
    config: SingalongConfig,
    cancel_token: CancellationToken,
) {
    if initialize_player(player.as_ref(), config.sources.track())
        .await
        .is_err()
    {
        // Already logged; controls stay available but no-op
        return;
    }

    if config.display.autoplay && !cancel_token.is_cancelled() {
        execute(player.as_ref(), Command::Play).await;
    }
}

/// Start the lyrics fetcher for the configured document location
async fn start_lyrics_fetcher(
    location: String,
    sync_engine: Arc<SyncEngine>,
    cancel_token: CancellationToken,
) {
    let source = match document_source_for(&location) {
        Ok(source) => source,
        Err(e) => {
            error!("Cannot load lyrics from {location}: {e}");
            sync_engine.set_no_lyrics(e.to_string()).await;
            return;
        }
    };

    info!("Starting lyrics fetcher...");
    let fetcher = Arc::new(LyricsFetcher::new(sync_engine, source, Some(cancel_token)));
    if let Err(e) = fetcher.start().await {
        error!("Lyrics fetcher task failed: {e}");
    }
}

/// Check if file logging is enabled by reading the config file.
/// This is done before full config loading to set up tracing first.
/// Returns `false` if config doesn't exist or can't be parsed.
fn check_file_logging_enabled() -> bool {
    // Minimal structs to parse just the logging.enabled field
    #[derive(serde::Deserialize)]
    struct PartialConfig {
        #[serde(default)]
        logging: PartialLoggingConfig,
    }
    #[derive(serde::Deserialize, Default)]
    struct PartialLoggingConfig {
        #[serde(default)]
        enabled: bool,
    }

    let config_path = SingalongConfig::config_path();
    let Ok(content) = std::fs::read_to_string(&config_path) else {
        return false;
    };

    toml::from_str::<PartialConfig>(&content)
        .map(|c| c.logging.enabled)
        .unwrap_or(false)
}

/// Initialize tracing with stderr output and optional file logging.
///
/// Logs go to stderr so the lyric display on stdout stays readable.
fn init_tracing(file_logging_enabled: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper_util=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if file_logging_enabled {
        let log_path = singalong_core::paths::log_file_path();

        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        match File::create(&log_path) {
            Ok(file) => {
                let file_layer = tracing_subscriber::fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt_layer)
                    .with(file_layer)
                    .init();

                return;
            }
            Err(e) => {
                eprintln!("Failed to create log file at {}: {e}", log_path.display());
            }
        }
    }

    // Fallback: console only
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
