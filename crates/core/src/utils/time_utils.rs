use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc, Weekday};

use crate::constants::MARKET_CLOSE_CUTOFF_HOUR_UTC;

/// Resolves the trading day whose closing prices are authoritative at `now`.
///
/// Before the market-close cutoff the previous calendar day is used; weekends
/// roll back to the preceding Friday. The result is always a weekday on or
/// before `now`'s UTC calendar date.
pub fn resolve_as_of(now: DateTime<Utc>) -> NaiveDate {
    resolve_as_of_with_cutoff(now, MARKET_CLOSE_CUTOFF_HOUR_UTC)
}

/// Same as [`resolve_as_of`] with an explicit cutoff hour (UTC, clamped to 0..=23).
pub fn resolve_as_of_with_cutoff(now: DateTime<Utc>, cutoff_hour_utc: u32) -> NaiveDate {
    let cutoff = NaiveTime::from_hms_opt(cutoff_hour_utc.min(23), 0, 0).unwrap_or(NaiveTime::MIN);
    let today = now.date_naive();

    let mut candidate = if now.time() < cutoff {
        today.pred_opt().unwrap_or(today)
    } else {
        today
    };

    while is_weekend(candidate) {
        match candidate.pred_opt() {
            Some(previous) => candidate = previous,
            None => break,
        }
    }
    candidate
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
