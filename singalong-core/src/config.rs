use crate::error::{CoreError, Result};
use crate::player::Track;
use crate::timing::Granularity;
use const_format::concatcp;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use url::Url;

const LOG_TARGET: &str = "singalong::config";

/// Default location of the timing document
pub const DEFAULT_LYRICS_URL: &str = "https://storage.googleapis.com/ikara-storage/ikara/lyrics.xml";

/// Default location of the backing track
pub const DEFAULT_AUDIO_URL: &str = "https://storage.googleapis.com/ikara-storage/tmp/beat.mp3";

/// Default track identifier handed to the player
pub const DEFAULT_TRACK_ID: &str = "trackId";

/// Accepted range for the poll interval in milliseconds
pub const POLL_INTERVAL_RANGE_MS: std::ops::RangeInclusive<u64> = 10..=10_000;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SingalongConfig {
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the lyrics and audio come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// URL or local path of the timing document
    #[serde(default = "default_lyrics_url")]
    pub lyrics_url: String,
    /// URL of the backing track
    #[serde(default = "default_audio_url")]
    pub audio_url: String,
    #[serde(default = "default_track_id")]
    pub track_id: String,
    /// Track length in seconds, if known ahead of playback
    #[serde(default)]
    pub track_duration_secs: Option<f64>,
}

fn default_lyrics_url() -> String {
    DEFAULT_LYRICS_URL.to_string()
}

fn default_audio_url() -> String {
    DEFAULT_AUDIO_URL.to_string()
}

fn default_track_id() -> String {
    DEFAULT_TRACK_ID.to_string()
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            lyrics_url: default_lyrics_url(),
            audio_url: default_audio_url(),
            track_id: default_track_id(),
            track_duration_secs: None,
        }
    }
}

impl SourcesConfig {
    /// The track to load into the player
    #[must_use]
    pub fn track(&self) -> Track {
        let track = Track::new(self.track_id.clone(), self.audio_url.clone());
        match self
            .track_duration_secs
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        {
            Some(duration) => track.with_duration(duration),
            None => track,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub granularity: Granularity,
    /// Position polling interval; defaults depend on granularity
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,
    /// Position jump that counts as a seek
    #[serde(default = "default_seek_threshold_ms")]
    pub seek_threshold_ms: u64,
}

const fn default_seek_threshold_ms() -> u64 {
    2000
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            granularity: Granularity::default(),
            poll_interval_ms: None,
            seek_threshold_ms: default_seek_threshold_ms(),
        }
    }
}

impl SyncConfig {
    /// Effective poll interval: 100ms for word highlighting, 1s for lines
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        let millis = self.poll_interval_ms.unwrap_or(match self.granularity {
            Granularity::Word => 100,
            Granularity::Line => 1000,
        });
        Duration::from_millis(millis)
    }

    #[must_use]
    pub const fn seek_threshold(&self) -> Duration {
        Duration::from_millis(self.seek_threshold_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_highlight_color")]
    pub highlight_color: String,
    #[serde(default = "default_base_color")]
    pub base_color: String,
    /// Opacity of tokens not yet reached, 0.0 to 1.0
    #[serde(default = "default_dimmed_opacity")]
    pub dimmed_opacity: f32,
    /// Scroll distance per token; defaults depend on granularity
    #[serde(default)]
    pub scroll_step: Option<f64>,
    /// Start playback as soon as the player is ready
    #[serde(default = "default_true")]
    pub autoplay: bool,
}

fn default_highlight_color() -> String {
    "red".to_string()
}

fn default_base_color() -> String {
    "white".to_string()
}

const fn default_dimmed_opacity() -> f32 {
    0.2
}

const fn default_true() -> bool {
    true
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            highlight_color: default_highlight_color(),
            base_color: default_base_color(),
            dimmed_opacity: default_dimmed_opacity(),
            scroll_step: None,
            autoplay: true,
        }
    }
}

impl DisplayConfig {
    /// Effective scroll step: 2 per word, 20 per line
    #[must_use]
    pub fn scroll_step_for(&self, granularity: Granularity) -> f64 {
        self.scroll_step.unwrap_or(match granularity {
            Granularity::Word => 2.0,
            Granularity::Line => 20.0,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write logs to ~/.config/singalong/singalong.log
    #[serde(default)]
    pub enabled: bool,
}

impl SingalongConfig {
    /// Get the configuration directory path (~/.config/singalong/)
    #[must_use]
    pub fn config_dir() -> PathBuf {
        crate::paths::config_dir()
    }

    /// Get the config file path (~/.config/singalong/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load config from the default path, falling back to defaults when the
    /// file does not exist. Nothing is written to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, parsed, or
    /// fails validation.
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::config_path();
        if !config_path.exists() {
            info!(target: LOG_TARGET, "No config at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }
        Self::load_from(&config_path)
    }

    /// Load and validate config from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn load_from(path: &Path) -> Result<Self> {
        info!(target: LOG_TARGET, "Loading config from {}", path.display());
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigParseError`] for TOML errors and
    /// [`CoreError::ConfigInvalid`] for values out of range.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigInvalid`] describing the first bad field.
    pub fn validate(&self) -> Result<()> {
        validate_location("sources.lyrics_url", &self.sources.lyrics_url)?;
        Url::parse(&self.sources.audio_url).map_err(|e| CoreError::ConfigInvalid {
            message: format!("sources.audio_url {:?}: {e}", self.sources.audio_url),
        })?;

        if let Some(secs) = self.sources.track_duration_secs {
            if !secs.is_finite() || secs <= 0.0 {
                return Err(CoreError::ConfigInvalid {
                    message: format!("sources.track_duration_secs must be positive, got {secs}"),
                });
            }
        }

        if let Some(millis) = self.sync.poll_interval_ms {
            if !POLL_INTERVAL_RANGE_MS.contains(&millis) {
                return Err(CoreError::ConfigInvalid {
                    message: format!(
                        "sync.poll_interval_ms must be between {} and {}, got {millis}",
                        POLL_INTERVAL_RANGE_MS.start(),
                        POLL_INTERVAL_RANGE_MS.end()
                    ),
                });
            }
        }

        if !(0.0..=1.0).contains(&self.display.dimmed_opacity) {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "display.dimmed_opacity must be between 0 and 1, got {}",
                    self.display.dimmed_opacity
                ),
            });
        }

        if let Some(step) = self.display.scroll_step {
            if !step.is_finite() || step < 0.0 {
                return Err(CoreError::ConfigInvalid {
                    message: format!("display.scroll_step must be non-negative, got {step}"),
                });
            }
        }

        Ok(())
    }
}

/// Lyrics may also come from a local file, so bare paths are accepted
fn validate_location(field: &str, location: &str) -> Result<()> {
    if location.trim().is_empty() {
        return Err(CoreError::ConfigInvalid {
            message: format!("{field} must not be empty"),
        });
    }
    if location.contains("://") {
        Url::parse(location).map_err(|e| CoreError::ConfigInvalid {
            message: format!("{field} {location:?}: {e}"),
        })?;
    }
    Ok(())
}

/// Commented config file matching the built-in defaults
pub const CONFIG_TEMPLATE: &str = concatcp!(
    r#"# Singalong Configuration
# ~/.config/singalong/config.toml

[sources]
# Timing document: http(s) URL, file:// URL or local path
lyrics_url = ""#,
    DEFAULT_LYRICS_URL,
    r#""
audio_url = ""#,
    DEFAULT_AUDIO_URL,
    r#""
track_id = ""#,
    DEFAULT_TRACK_ID,
    r#""
# Optional: track length in seconds, playback stops there
# track_duration_secs = 180.0

[sync]
# "word" or "line"
granularity = "word"
# Optional: defaults to 100 for word and 1000 for line
# poll_interval_ms = 100
seek_threshold_ms = 2000

[display]
highlight_color = "red"
base_color = "white"
dimmed_opacity = 0.2
# Optional: defaults to 2 for word and 20 for line
# scroll_step = 2.0
autoplay = true

[logging]
# Also write logs to ~/.config/singalong/singalong.log
enabled = false
"#
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = SingalongConfig::from_toml_str("").unwrap();
        assert_eq!(config, SingalongConfig::default());
        assert_eq!(config.sources.lyrics_url, DEFAULT_LYRICS_URL);
        assert_eq!(config.sync.granularity, Granularity::Word);
        assert_eq!(config.sync.poll_interval(), Duration::from_millis(100));
        assert!((config.display.scroll_step_for(Granularity::Word) - 2.0).abs() < f64::EPSILON);
        assert!(!config.logging.enabled);
    }

    #[test]
    fn test_template_matches_defaults() {
        let config = SingalongConfig::from_toml_str(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config, SingalongConfig::default());
    }

    #[test]
    fn test_line_granularity_defaults() {
        let config = SingalongConfig::from_toml_str(
            r#"
            [sync]
            granularity = "line"
            "#,
        )
        .unwrap();
        assert_eq!(config.sync.poll_interval(), Duration::from_secs(1));
        assert!((config.display.scroll_step_for(Granularity::Line) - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_explicit_values_override_defaults() {
        let config = SingalongConfig::from_toml_str(
            r#"
            [sources]
            lyrics_url = "/tmp/lyrics.xml"
            track_duration_secs = 90.5

            [sync]
            poll_interval_ms = 250
            seek_threshold_ms = 500

            [display]
            scroll_step = 4.0
            autoplay = false
            "#,
        )
        .unwrap();
        assert_eq!(config.sync.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.sync.seek_threshold(), Duration::from_millis(500));
        assert!((config.display.scroll_step_for(Granularity::Line) - 4.0).abs() < f64::EPSILON);
        assert!(!config.display.autoplay);

        let track = config.sources.track();
        assert_eq!(track.duration, Some(Duration::from_secs_f64(90.5)));
        assert_eq!(track.url, DEFAULT_AUDIO_URL);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let cases = [
            "[sources]\naudio_url = \"not a url\"",
            "[sources]\nlyrics_url = \"http://\"",
            "[sources]\nlyrics_url = \"\"",
            "[sources]\ntrack_duration_secs = -1.0",
            "[sync]\npoll_interval_ms = 5",
            "[sync]\npoll_interval_ms = 20000",
            "[display]\ndimmed_opacity = 1.5",
            "[display]\nscroll_step = -2.0",
        ];
        for case in cases {
            assert!(
                matches!(
                    SingalongConfig::from_toml_str(case),
                    Err(CoreError::ConfigInvalid { .. })
                ),
                "expected {case:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        assert!(matches!(
            SingalongConfig::from_toml_str("[sync\ngranularity = "),
            Err(CoreError::ConfigParseError(_))
        ));
        assert!(matches!(
            SingalongConfig::from_toml_str("[sync]\ngranularity = \"syllable\""),
            Err(CoreError::ConfigParseError(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("singalong-config-{}.toml", std::process::id()));
        fs::write(&path, "[logging]\nenabled = true\n").unwrap();

        let config = SingalongConfig::load_from(&path).unwrap();
        assert!(config.logging.enabled);

        let _ = fs::remove_file(&path);
    }
}
