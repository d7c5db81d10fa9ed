//! Line-oriented playback controls read from stdin.

use singalong_core::{parse_clock, Player};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const LOG_TARGET: &str = "singalong::controls";

pub const HELP: &str = "commands: play | pause | toggle (or Enter) | seek <M:SS|seconds> | quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Play,
    Pause,
    Toggle,
    Seek(Duration),
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("seek needs a position, e.g. \"seek 1:30\"")]
    MissingPosition,

    #[error("Invalid position: {0}")]
    InvalidPosition(String),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut parts = input.split_whitespace();
        let Some(name) = parts.next() else {
            return Ok(Self::Toggle);
        };

        match name.to_ascii_lowercase().as_str() {
            "play" | "p" => Ok(Self::Play),
            "pause" => Ok(Self::Pause),
            "toggle" | "t" => Ok(Self::Toggle),
            "quit" | "q" | "exit" => Ok(Self::Quit),
            "seek" | "s" => {
                let position = parts.next().ok_or(CommandError::MissingPosition)?;
                parse_clock(position)
                    .map(Self::Seek)
                    .ok_or_else(|| CommandError::InvalidPosition(position.to_string()))
            }
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/// Run `command` against the player. Returns `false` once the user quits.
///
/// Player failures are logged and otherwise ignored.
pub async fn execute(player: &dyn Player, command: Command) -> bool {
    let result = match command {
        Command::Play => player.play().await,
        Command::Pause => player.pause().await,
        Command::Toggle => player.toggle().await.map(|_| ()),
        Command::Seek(position) => player.seek_to(position).await,
        Command::Quit => return false,
    };

    if let Err(e) = result {
        warn!(target: LOG_TARGET, "{:?} ignored: {}", command, e);
    }
    true
}

/// Read commands from stdin until EOF, `quit`, or cancellation.
///
/// Quitting cancels `cancel_token` so the rest of the app shuts down too.
pub async fn run_controls(player: Arc<dyn Player>, cancel_token: CancellationToken) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            () = cancel_token.cancelled() => break,
            line = lines.next_line() => line,
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!(target: LOG_TARGET, "Input closed, controls disabled");
                break;
            }
            Err(e) => {
                warn!(target: LOG_TARGET, "Failed to read input: {}", e);
                break;
            }
        };

        match line.parse::<Command>() {
            Ok(command) => {
                if !execute(player.as_ref(), command).await {
                    info!(target: LOG_TARGET, "Quit requested");
                    cancel_token.cancel();
                    break;
                }
            }
            Err(e) => {
                println!("{e}");
                println!("{HELP}");
            }
        }
    }
}
