use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Local};

use crate::error::{FanoutError, Result};
use crate::record::TimeSnapshot;

/// `yyyy-MM-dd HH:mm:ss`
pub const STANDARD_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// `yyyy-MM-dd HH:mm:ss.SSS`
pub const PRECISE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

// ---------------------------------------------------------------------------
// TimeFormat
// ---------------------------------------------------------------------------

/// A strftime pattern that has already been checked to render.
///
/// Validation happens once here, which is what lets [`Clock::now`] be
/// infallible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeFormat(String);

impl TimeFormat {
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        if pattern.is_empty()
            || StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error))
        {
            return Err(FanoutError::InvalidTimeFormat(pattern));
        }
        Ok(Self(pattern))
    }

    pub fn standard() -> Self {
        Self(STANDARD_FORMAT.to_string())
    }

    pub fn precise() -> Self {
        Self(PRECISE_FORMAT.to_string())
    }

    pub fn render(&self, instant: &DateTime<FixedOffset>) -> String {
        instant.format(&self.0).to_string()
    }
}

impl Default for TimeFormat {
    fn default() -> Self {
        Self::standard()
    }
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Source of wall-clock time.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn instant(&self) -> DateTime<FixedOffset>;

    /// Read the clock once and derive both snapshot fields from that reading.
    fn now(&self, format: &TimeFormat) -> TimeSnapshot {
        let instant = self.instant();
        TimeSnapshot {
            formatted_time: format.render(&instant),
            epoch_millis: instant.timestamp_millis(),
        }
    }
}

/// The local system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn instant(&self) -> DateTime<FixedOffset> {
        Local::now().into()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn instant(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed() -> FixedClock {
        FixedClock(DateTime::parse_from_rfc3339("2026-03-14T09:26:53.589+00:00").unwrap())
    }

    #[test]
    fn standard_format_renders_seconds() {
        let snap = fixed().now(&TimeFormat::standard());
        assert_eq!(snap.formatted_time, "2026-03-14 09:26:53");
        assert_eq!(snap.epoch_millis, 1_773_480_413_589);
    }

    #[test]
    fn precise_format_renders_millis() {
        let snap = fixed().now(&TimeFormat::precise());
        assert_eq!(snap.formatted_time, "2026-03-14 09:26:53.589");
    }

    #[test]
    fn system_clock_is_non_decreasing() {
        let clock = SystemClock;
        let first = clock.now(&TimeFormat::precise());
        let second = clock.now(&TimeFormat::precise());
        assert!(second.epoch_millis >= first.epoch_millis);
        assert_eq!(first.formatted_time.len(), "yyyy-MM-dd HH:mm:ss.SSS".len());
    }

    #[test]
    fn custom_format_is_accepted() {
        let format = TimeFormat::new("%H:%M").unwrap();
        assert_eq!(fixed().now(&format).formatted_time, "09:26");
    }

    #[test]
    fn broken_format_is_rejected() {
        assert!(matches!(
            TimeFormat::new("%Y-%"),
            Err(FanoutError::InvalidTimeFormat(_))
        ));
        assert!(TimeFormat::new("").is_err());
    }
}
