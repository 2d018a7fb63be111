//! Quiet-hours gate for outbound customer communication.
//!
//! A [`QuietHours`] window is a half-open local-time interval
//! `[start, end)` evaluated in an IANA time zone. Windows may wrap midnight
//! (the usual evening-to-morning configuration). When an instant falls inside
//! the window, [`QuietHours::next_allowed`] returns the nearest future instant
//! whose local wall-clock time equals `end`, with the UTC offset resolved for
//! the target date rather than reused from the current one.

use std::fmt;

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Default start of the quiet window (local time, inclusive).
pub const DEFAULT_QUIET_START: (u32, u32) = (21, 0);
/// Default end of the quiet window (local time, exclusive).
pub const DEFAULT_QUIET_END: (u32, u32) = (8, 0);

/// Upper bound when stepping over a daylight-saving gap.
const MAX_GAP_MINUTES: i64 = 24 * 60;

/// Validation errors raised while building a quiet-hours window.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuietHoursError {
    /// `start` and `end` are equal, which would describe an empty window.
    #[error("quiet hours start and end must differ")]
    EmptyWindow,
    /// A clock value could not be parsed as `HH:MM`.
    #[error("invalid quiet hours time '{value}'; expected HH:MM")]
    InvalidTime {
        /// Raw input.
        value: String,
    },
    /// The time zone name is not part of the IANA database.
    #[error("unknown time zone '{value}'")]
    UnknownZone {
        /// Raw input.
        value: String,
    },
}

/// Outcome of gating a send at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendDecision {
    /// The message may be delivered immediately.
    SendNow,
    /// Delivery must wait until the contained instant.
    DeferUntil(DateTime<Utc>),
}

/// Local-time window during which outbound messages are deferred.
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use crm_backend::domain::QuietHours;
///
/// let quiet = QuietHours::evening_to_morning(chrono_tz::America::New_York);
/// // 02:00 UTC is 22:00 the previous evening in New York (EDT).
/// let late = Utc.with_ymd_and_hms(2026, 6, 2, 2, 0, 0).single().expect("valid instant");
/// assert!(quiet.is_quiet(late));
/// let resume = quiet.next_allowed(late).expect("quiet instants have a resume time");
/// assert_eq!(resume, Utc.with_ymd_and_hms(2026, 6, 2, 12, 0, 0).single().expect("valid"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuietHours {
    start: NaiveTime,
    end: NaiveTime,
    zone: Tz,
}

impl QuietHours {
    /// Build a window from explicit bounds.
    pub fn new(start: NaiveTime, end: NaiveTime, zone: Tz) -> Result<Self, QuietHoursError> {
        if start == end {
            return Err(QuietHoursError::EmptyWindow);
        }
        Ok(Self { start, end, zone })
    }

    /// Parse `HH:MM` bounds and an IANA zone name.
    pub fn parse(start: &str, end: &str, zone: &str) -> Result<Self, QuietHoursError> {
        Self::new(parse_clock(start)?, parse_clock(end)?, parse_zone(zone)?)
    }

    /// The standard `[21:00, 08:00)` window in `zone`.
    #[must_use]
    pub fn evening_to_morning(zone: Tz) -> Self {
        let (start_h, start_m) = DEFAULT_QUIET_START;
        let (end_h, end_m) = DEFAULT_QUIET_END;
        Self {
            start: NaiveTime::from_hms_opt(start_h, start_m, 0).unwrap_or(NaiveTime::MIN),
            end: NaiveTime::from_hms_opt(end_h, end_m, 0).unwrap_or(NaiveTime::MIN),
            zone,
        }
    }

    /// Same window evaluated in another zone (per-customer override).
    #[must_use]
    pub fn in_zone(self, zone: Tz) -> Self {
        Self { zone, ..self }
    }

    /// Inclusive local start of the window.
    pub fn start(&self) -> NaiveTime {
        self.start
    }

    /// Exclusive local end of the window.
    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// Zone the window is evaluated in.
    pub fn zone(&self) -> Tz {
        self.zone
    }

    fn wraps_midnight(&self) -> bool {
        self.start > self.end
    }

    fn contains(&self, local: NaiveTime) -> bool {
        if self.wraps_midnight() {
            local >= self.start || local < self.end
        } else {
            local >= self.start && local < self.end
        }
    }

    /// Whether `now` falls inside the quiet window.
    pub fn is_quiet(&self, now: DateTime<Utc>) -> bool {
        self.contains(now.with_timezone(&self.zone).time())
    }

    /// Next instant at which sending is permitted, or `None` when `now` is
    /// already outside the window.
    pub fn next_allowed(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let local = now.with_timezone(&self.zone);
        let time = local.time();
        if !self.contains(time) {
            return None;
        }

        let today = local.date_naive();
        // Inside a wrapping window the evening half resumes tomorrow morning.
        let target_date = if self.wraps_midnight() && time >= self.start {
            today.succ_opt()?
        } else {
            today
        };
        resolve_local(self.zone, target_date.and_time(self.end), now)
    }

    /// Gate a send at `now`.
    pub fn decide(&self, now: DateTime<Utc>) -> SendDecision {
        match self.next_allowed(now) {
            Some(resume) => SendDecision::DeferUntil(resume),
            None => SendDecision::SendNow,
        }
    }
}

impl fmt::Display for QuietHours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{} {}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M"),
            self.zone.name()
        )
    }
}

/// Map a local wall-clock value to UTC using the offset in force on that
/// date. Ambiguous values (fall back) take the earlier instant unless it is
/// not after `now`, in which case the repeated occurrence is used; values
/// inside a spring-forward gap move to the first representable minute after
/// it.
fn resolve_local(zone: Tz, naive: NaiveDateTime, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let mut candidate = naive;
    for _ in 0..=MAX_GAP_MINUTES {
        match zone.from_local_datetime(&candidate) {
            LocalResult::Single(instant) => return Some(instant.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, latest) => {
                let earliest = earliest.with_timezone(&Utc);
                return Some(if earliest > now {
                    earliest
                } else {
                    latest.with_timezone(&Utc)
                });
            }
            LocalResult::None => candidate += Duration::minutes(1),
        }
    }
    None
}

fn parse_clock(value: &str) -> Result<NaiveTime, QuietHoursError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|_| QuietHoursError::InvalidTime {
        value: value.to_owned(),
    })
}

/// Parse an IANA zone name.
pub fn parse_zone(value: &str) -> Result<Tz, QuietHoursError> {
    value
        .trim()
        .parse::<Tz>()
        .map_err(|_| QuietHoursError::UnknownZone {
            value: value.to_owned(),
        })
}

#[cfg(test)]
#[path = "quiet_hours_tests.rs"]
mod tests;
