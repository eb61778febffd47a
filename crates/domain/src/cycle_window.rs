// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Cycle window calculation for scheduled nomination cycles.
//!
//! This module derives the concrete UTC boundaries of a cycle from:
//! - The administrator-chosen start date
//! - The nomination period (monthly or bi-monthly)
//! - The program's declared timezone
//!
//! ## Invariants
//!
//! - The end date is `start + period months - 1 day`, clamped to the last
//!   day of the month when the start day does not exist in the end month
//! - The validation window closes [`VALIDATION_WINDOW_DAYS`] days after
//!   the end date
//! - Boundaries are wall-clock times in the declared timezone, stored as
//!   UTC instants
//! - DST transitions that make a wall-clock time ambiguous or nonexistent
//!   are surfaced as errors, never guessed

use crate::error::DomainError;
use crate::types::NominationPeriod;
use chrono::{Datelike, Days, Months, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;
use time::OffsetDateTime;

/// Days between a cycle's end date and the close of its validation window.
pub const VALIDATION_WINDOW_DAYS: u64 = 7;

/// Wall-clock opening time of a cycle on its start date.
const WINDOW_OPEN_HMS: (u32, u32, u32) = (0, 1, 0);

/// Wall-clock closing time of a cycle on its end date.
const WINDOW_CLOSE_HMS: (u32, u32, u32) = (23, 59, 59);

/// The resolved UTC boundaries of a scheduled cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleWindow {
    /// When the nomination window opens.
    pub start: OffsetDateTime,
    /// When the nomination window closes.
    pub end: OffsetDateTime,
    /// When the validation window closes.
    pub validation_end: OffsetDateTime,
}

/// Derives a cycle's end date from its start date and period.
///
/// The end date is `start + 1 or 2 calendar months - 1 day`. When the
/// start day does not exist in the target month, the addition clamps to
/// the last day of that month before the day is subtracted.
///
/// # Errors
///
/// Returns an error if the date arithmetic overflows the calendar range.
pub fn derive_end_date(
    start_date: time::Date,
    period: NominationPeriod,
) -> Result<time::Date, DomainError> {
    let start: NaiveDate = to_naive_date(start_date)?;

    let shifted: NaiveDate = start
        .checked_add_months(Months::new(period.months()))
        .ok_or_else(|| DomainError::DateArithmeticOverflow {
            operation: format!("adding {} month(s) to {start}", period.months()),
        })?;

    let end: NaiveDate = shifted
        .pred_opt()
        .ok_or_else(|| DomainError::DateArithmeticOverflow {
            operation: format!("subtracting one day from {shifted}"),
        })?;

    to_time_date(end)
}

/// Resolves the full UTC window of a cycle starting on `start_date`.
///
/// The nomination window opens one minute past local midnight on the
/// start date and closes at the last second of the end date; the
/// validation window closes [`VALIDATION_WINDOW_DAYS`] days later, at the
/// same wall-clock time.
///
/// # Arguments
///
/// * `start_date` - The administrator-chosen start date
/// * `period` - The nomination period length
/// * `timezone` - The program's declared IANA timezone name
///
/// # Errors
///
/// Returns an error if:
/// - The timezone name is invalid
/// - Date arithmetic overflows
/// - A boundary wall-clock time cannot be resolved to a single UTC
///   instant (DST gap or overlap)
pub fn resolve_cycle_window(
    start_date: time::Date,
    period: NominationPeriod,
    timezone: &str,
) -> Result<CycleWindow, DomainError> {
    let tz: Tz = timezone
        .parse()
        .map_err(|_| DomainError::InvalidTimezone(timezone.to_owned()))?;

    let end_date: time::Date = derive_end_date(start_date, period)?;
    let validation_end_date: NaiveDate = to_naive_date(end_date)?
        .checked_add_days(Days::new(VALIDATION_WINDOW_DAYS))
        .ok_or_else(|| DomainError::DateArithmeticOverflow {
            operation: format!("adding {VALIDATION_WINDOW_DAYS} days to {end_date}"),
        })?;

    let start: OffsetDateTime = local_instant(to_naive_date(start_date)?, WINDOW_OPEN_HMS, tz)?;
    let end: OffsetDateTime = local_instant(to_naive_date(end_date)?, WINDOW_CLOSE_HMS, tz)?;
    let validation_end: OffsetDateTime = local_instant(validation_end_date, WINDOW_CLOSE_HMS, tz)?;

    Ok(CycleWindow {
        start,
        end,
        validation_end,
    })
}

/// Resolves a wall-clock time in `tz` to a UTC instant.
fn local_instant(
    date: NaiveDate,
    (hour, minute, second): (u32, u32, u32),
    tz: Tz,
) -> Result<OffsetDateTime, DomainError> {
    let wall_time: NaiveTime = NaiveTime::from_hms_opt(hour, minute, second).ok_or_else(|| {
        DomainError::DateArithmeticOverflow {
            operation: format!("constructing wall-clock time {hour:02}:{minute:02}:{second:02}"),
        }
    })?;

    let local = tz
        .from_local_datetime(&date.and_time(wall_time))
        .single()
        .ok_or_else(|| DomainError::AmbiguousLocalTime {
            date: date.to_string(),
            reason: format!(
                "{hour:02}:{minute:02}:{second:02} is ambiguous or nonexistent due to DST"
            ),
        })?;

    OffsetDateTime::from_unix_timestamp(local.timestamp()).map_err(|_| {
        DomainError::DateArithmeticOverflow {
            operation: format!("converting {date} to a UTC timestamp"),
        }
    })
}

/// Converts a `time::Date` to a `chrono::NaiveDate`.
fn to_naive_date(date: time::Date) -> Result<NaiveDate, DomainError> {
    NaiveDate::from_ymd_opt(date.year(), date.month() as u32, u32::from(date.day())).ok_or_else(
        || DomainError::DateArithmeticOverflow {
            operation: format!("converting {date} to a calendar date"),
        },
    )
}

/// Converts a `chrono::NaiveDate` back to a `time::Date`.
#[allow(clippy::cast_possible_truncation)]
fn to_time_date(date: NaiveDate) -> Result<time::Date, DomainError> {
    let month: time::Month =
        time::Month::try_from(date.month() as u8).map_err(|_| DomainError::DateArithmeticOverflow {
            operation: format!("converting month of {date}"),
        })?;

    time::Date::from_calendar_date(date.year(), month, date.day() as u8).map_err(|_| {
        DomainError::DateArithmeticOverflow {
            operation: format!("converting {date} back to a calendar date"),
        }
    })
}
