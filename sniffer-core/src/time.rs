//! Time utilities: every date is a civil `NaiveDate`; timezones only decide
//! which civil day "now" is.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Civil date of `instant` in an IANA tz like "Pacific/Auckland".
pub fn civil_date(instant: DateTime<Utc>, tz: &str) -> Result<NaiveDate> {
    let tz: Tz = tz
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))?;
    Ok(instant.with_timezone(&tz).date_naive())
}

/// Today's civil date in `tz`.
pub fn today_in(tz: &str) -> Result<NaiveDate> {
    civil_date(Utc::now(), tz)
}

/// Parse `YYYY-MM-DD`, dropping any trailing time part ("2024-03-04T00:00:00Z").
///
/// The date is taken as written; no offset is applied.
pub fn parse_calendar_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let date_part = text.split(['T', ' ']).next()?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}
