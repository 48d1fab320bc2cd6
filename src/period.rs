//! Calendar windows used for bucketing and comparisons.
//!
//! Every window is trailing: it ends on the reference date (inclusive) and
//! reaches back a fixed number of days. "Week" is therefore the last seven
//! days, not the calendar Monday to Sunday, which keeps the current and the
//! previous window the same length for every kind.

use crate::errors::AnalyticsError;
use crate::models::GoalType;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    Day,
    Week,
    Month,
    Year,
}

impl PeriodKind {
    /// Window length in days.
    pub const fn days(self) -> i64 {
        match self {
            Self::Day => 1,
            Self::Week => 7,
            Self::Month => 30,
            Self::Year => 365,
        }
    }

    /// The goal type a goal must carry to apply to this window.
    pub const fn goal_type(self) -> GoalType {
        match self {
            Self::Day => GoalType::Daily,
            Self::Week => GoalType::Weekly,
            Self::Month => GoalType::Monthly,
            Self::Year => GoalType::Yearly,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

impl fmt::Display for PeriodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PeriodKind {
    type Err = AnalyticsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "day" | "daily" => Ok(Self::Day),
            "week" | "weekly" => Ok(Self::Week),
            "month" | "monthly" => Ok(Self::Month),
            "year" | "yearly" => Ok(Self::Year),
            other => Err(AnalyticsError::invalid_period(format!(
                "unknown period kind '{other}'"
            ))),
        }
    }
}

/// Inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AnalyticsError> {
        if end < start {
            return Err(AnalyticsError::invalid_period(format!(
                "range ends ({end}) before it starts ({start})"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn single(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// Number of calendar days covered. Zero or negative only for a range
    /// built by hand with `end` before `start`.
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Every date of the range in increasing order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |date| *date <= end)
    }

    /// The range of identical length immediately before this one.
    pub fn previous(&self) -> Result<Self, AnalyticsError> {
        shift_back(*self, self.num_days())
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Resolve a window of `kind` ending at `reference`.
///
/// `offset` 0 is the current window; `offset` n is the window of the same
/// length n windows earlier.
pub fn resolve(reference: NaiveDate, kind: PeriodKind, offset: i64) -> Result<DateRange, AnalyticsError> {
    if offset < 0 {
        return Err(AnalyticsError::invalid_period(format!(
            "offset must not be negative, got {offset}"
        )));
    }

    let current = trailing(reference, kind.days())?;
    let back = kind
        .days()
        .checked_mul(offset)
        .ok_or_else(|| AnalyticsError::invalid_period("offset too large"))?;
    shift_back(current, back)
}

/// The current window and the one immediately preceding it.
pub fn resolve_pair(reference: NaiveDate, kind: PeriodKind) -> Result<(DateRange, DateRange), AnalyticsError> {
    Ok((resolve(reference, kind, 0)?, resolve(reference, kind, 1)?))
}

fn trailing(end: NaiveDate, days: i64) -> Result<DateRange, AnalyticsError> {
    let start = Duration::try_days(days - 1)
        .and_then(|span| end.checked_sub_signed(span))
        .ok_or_else(|| AnalyticsError::invalid_period("window starts before the supported calendar"))?;
    Ok(DateRange { start, end })
}

fn shift_back(range: DateRange, days: i64) -> Result<DateRange, AnalyticsError> {
    let span = Duration::try_days(days)
        .ok_or_else(|| AnalyticsError::invalid_period("offset too large"))?;
    match (
        range.start.checked_sub_signed(span),
        range.end.checked_sub_signed(span),
    ) {
        (Some(start), Some(end)) => Ok(DateRange { start, end }),
        _ => Err(AnalyticsError::invalid_period(
            "window starts before the supported calendar",
        )),
    }
}
