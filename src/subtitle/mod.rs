pub mod grouper;
pub mod srt;

use std::time::Duration;

/// One timed caption entry, 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleBlock {
    pub index: usize,
    pub start: Duration,
    pub end: Duration,
    pub content: String,
}

impl SubtitleBlock {
    pub fn new(index: usize, start: Duration, end: Duration, content: impl Into<String>) -> Self {
        Self {
            index,
            start,
            end,
            content: content.into(),
        }
    }
}

/// Seconds from the transcriber to a `Duration`, rounded to the microsecond.
/// Negative or non-finite values become zero.
pub fn seconds_to_duration(seconds: f64) -> Duration {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_micros((seconds * 1_000_000.0).round() as u64)
}
