//! Time and duration conversion utilities.
//!
//! Safe conversions with explicit saturation, plus the `M:SS` clock format
//! used for elapsed and total time.

use std::time::Duration;

/// Extension trait for safe Duration conversions.
pub trait DurationExt {
    /// Convert duration to milliseconds as u64, saturating at `u64::MAX`.
    fn as_millis_u64(&self) -> u64;
}

impl DurationExt for Duration {
    fn as_millis_u64(&self) -> u64 {
        u64::try_from(self.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Format seconds as `M:SS`.
///
/// Seconds are zero-padded, minutes are not. Negative, NaN and infinite
/// inputs render as `0:00`.
#[must_use]
pub fn format_clock(seconds: f64) -> String {
    let whole = Duration::try_from_secs_f64(seconds)
        .unwrap_or(Duration::ZERO)
        .as_secs();
    format!("{}:{:02}", whole / 60, whole % 60)
}

/// Format a duration as `M:SS`.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    format_clock(duration.as_secs_f64())
}

/// Parse `M:SS` (or `M:SS.fff`) or plain seconds into a duration.
///
/// Returns `None` for empty, negative or otherwise malformed input.
#[must_use]
pub fn parse_clock(input: &str) -> Option<Duration> {
    let input = input.trim();
    let seconds = match input.split_once(':') {
        Some((minutes, seconds)) => {
            let minutes: u32 = minutes.parse().ok()?;
            let seconds: f64 = seconds.parse().ok()?;
            if !(0.0..60.0).contains(&seconds) {
                return None;
            }
            f64::from(minutes) * 60.0 + seconds
        }
        None => input.parse().ok()?,
    };
    Duration::try_from_secs_f64(seconds).ok()
}
