use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DigestError;

/// Longest window a caller may select.
pub const MAX_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub username: String,
}

/// One chat post as returned by `GET /channels/{id}/messages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Snowflake id. Unique and increasing with creation time.
    pub id: String,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default)]
    pub content: String,
    /// Authoritative for window membership.
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub name: Option<String>,
    pub guild_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuildInfo {
    pub name: Option<String>,
}

/// Inclusive `[from, to]` window selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageWindow {
    pub from: DateTime<Utc>,
    pub to: Option<DateTime<Utc>>,
}

impl MessageWindow {
    /// Validate a selection coming from the host.
    ///
    /// `end` defaults to now. The span may not exceed [`MAX_WINDOW_DAYS`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidWindow` if `start` is after `end` or the span is too long.
    pub fn from_selection(
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Self, DigestError> {
        let effective_end = end.unwrap_or_else(Utc::now);
        if start > effective_end {
            return Err(DigestError::InvalidWindow(
                "start date is after end date".to_string(),
            ));
        }
        if effective_end - start > Duration::days(MAX_WINDOW_DAYS) {
            return Err(DigestError::InvalidWindow(format!(
                "date range cannot exceed {MAX_WINDOW_DAYS} days"
            )));
        }
        Ok(Self { from: start, to: end })
    }

    /// `to`, or the current time when the window is open-ended.
    #[must_use]
    pub fn effective_to(&self) -> DateTime<Utc> {
        self.to.unwrap_or_else(Utc::now)
    }
}

/// Which end of a day a bare `YYYY-MM-DD` date should snap to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayBound {
    Start,
    End,
}

/// Parse either an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (UTC).
///
/// # Errors
///
/// Returns `InvalidWindow` when the input matches neither format.
pub fn parse_window_date(input: &str, bound: DayBound) -> Result<DateTime<Utc>, DigestError> {
    let trimmed = input.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts.with_timezone(&Utc));
    }

    let day = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|_| DigestError::InvalidWindow(format!("unrecognised date '{trimmed}'")))?;
    let time = match bound {
        DayBound::Start => NaiveTime::MIN,
        DayBound::End => NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN),
    };
    Ok(Utc.from_utc_datetime(&day.and_time(time)))
}
