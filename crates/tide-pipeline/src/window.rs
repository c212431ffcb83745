//! Delta window resolution.
//!
//! A window is exclusive at `start` and inclusive at `end`. Resolution order,
//! first applicable wins: explicit `start`/`end`, then `window_hours` before
//! now, then the stored cursor (max `time_window_end`), then a fixed lookback.

use std::fmt;

use chrono::{DateTime, Duration, Utc};

use crate::error::PipelineError;

/// Caller overrides for a single run. Everything left `None` falls back to
/// the pipeline's settings or the stored cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Explicit window start; must be given together with `window_end`.
    pub window_start: Option<DateTime<Utc>>,
    pub window_end: Option<DateTime<Utc>>,
    /// Process the last `window_hours` hours, ending now.
    pub window_hours: Option<u32>,
    pub max_emails: Option<u32>,
    pub map_batch_size: Option<u32>,
}

impl RunOptions {
    /// Reject option combinations that can never resolve.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidOptions`] for a lone `window_start` or
    /// `window_end`, a non-positive explicit window, or zero-valued counts.
    pub fn validate(&self) -> Result<(), PipelineError> {
        match (self.window_start, self.window_end) {
            (Some(start), Some(end)) if start >= end => {
                return Err(PipelineError::InvalidOptions(format!(
                    "window start {start} must be before window end {end}"
                )));
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(PipelineError::InvalidOptions(
                    "window start and window end must be given together".into(),
                ));
            }
            _ => {}
        }
        if self.window_hours == Some(0) {
            return Err(PipelineError::InvalidOptions(
                "window hours must be positive".into(),
            ));
        }
        if self.max_emails == Some(0) {
            return Err(PipelineError::InvalidOptions(
                "max emails must be positive".into(),
            ));
        }
        if self.map_batch_size == Some(0) {
            return Err(PipelineError::InvalidOptions(
                "map batch size must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Whether resolution will consult the stored cursor.
    #[must_use]
    pub const fn uses_cursor(&self) -> bool {
        self.window_start.is_none() && self.window_hours.is_none()
    }
}

/// Which rule produced a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSource {
    Explicit,
    Hours,
    Delta,
    Fallback,
}

impl fmt::Display for WindowSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Explicit => "explicit",
            Self::Hours => "hours",
            Self::Delta => "delta",
            Self::Fallback => "fallback",
        })
    }
}

/// The interval `(start, end]` one run processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub source: WindowSource,
}

/// Resolve the processing window.
///
/// `cursor` is the maximum stored `time_window_end`; it is ignored unless
/// neither explicit bounds nor `window_hours` were given.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidOptions`] if the options are invalid or
/// the resolved window is empty (cursor at or after `now`).
pub fn resolve_window(
    options: &RunOptions,
    now: DateTime<Utc>,
    cursor: Option<DateTime<Utc>>,
    fallback_lookback: Duration,
) -> Result<TimeWindow, PipelineError> {
    options.validate()?;

    let window = if let (Some(start), Some(end)) = (options.window_start, options.window_end) {
        TimeWindow {
            start,
            end,
            source: WindowSource::Explicit,
        }
    } else if let Some(hours) = options.window_hours {
        TimeWindow {
            start: now - Duration::hours(i64::from(hours)),
            end: now,
            source: WindowSource::Hours,
        }
    } else if let Some(cursor) = cursor {
        TimeWindow {
            start: cursor,
            end: now,
            source: WindowSource::Delta,
        }
    } else {
        TimeWindow {
            start: now - fallback_lookback,
            end: now,
            source: WindowSource::Fallback,
        }
    };

    if window.start >= window.end {
        return Err(PipelineError::InvalidOptions(format!(
            "{} window is empty: start {} is not before end {}",
            window.source, window.start, window.end
        )));
    }

    tracing::debug!(
        source = %window.source,
        start = %window.start,
        end = %window.end,
        "resolved briefing window"
    );
    Ok(window)
}
