//! Timestamp and duration formatting.

use std::fmt;

use jiff::{tz::TimeZone, Timestamp};

/// Renders a UTC timestamp in the system timezone as
/// `YYYY-MM-DD HH:MM:SS TZ`.
pub struct LocalDateTime<'a>(pub &'a Timestamp);

impl fmt::Display for LocalDateTime<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let zoned = self.0.to_zoned(TimeZone::system());
        write!(f, "{}", zoned.strftime("%Y-%m-%d %H:%M:%S %Z"))
    }
}

/// Compact rendering of a step duration in seconds: `45s`, `3m 05s`,
/// `2h 10m`.
///
/// # Examples
///
/// ```rust
/// use irflow_core::display::Elapsed;
///
/// assert_eq!(Elapsed(42).to_string(), "42s");
/// assert_eq!(Elapsed(185).to_string(), "3m 05s");
/// assert_eq!(Elapsed(7800).to_string(), "2h 10m");
/// ```
pub struct Elapsed(pub i64);

impl fmt::Display for Elapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seconds = self.0.max(0);
        match seconds {
            s if s < 60 => write!(f, "{s}s"),
            s if s < 3600 => write!(f, "{}m {:02}s", s / 60, s % 60),
            s => write!(f, "{}h {:02}m", s / 3600, (s % 3600) / 60),
        }
    }
}
