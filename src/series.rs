use crate::errors::AnalyticsError;
use crate::models::{Aggregation, Metric, UserId};
use crate::period::{DateRange, PeriodKind};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub user_id: UserId,
    pub metric: Metric,
    pub aggregation: Aggregation,
    pub period: PeriodKind,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub points: Vec<SeriesPoint>,
}

impl Series {
    pub fn total(&self) -> f64 {
        self.points.iter().map(|p| p.value).sum()
    }
}

/// Fold `samples` into one bucket per calendar day of `range`.
///
/// Every day of the range yields a point, zero when nothing was logged.
/// Samples outside the range are ignored.
pub fn build_series(
    range: DateRange,
    samples: &[(NaiveDate, f64)],
    aggregation: Aggregation,
) -> Result<Vec<SeriesPoint>, AnalyticsError> {
    let days = range.num_days();
    if days <= 0 {
        return Err(AnalyticsError::invalid_period(format!(
            "series range {range} covers {days} days"
        )));
    }

    let mut buckets: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for (date, value) in samples.iter().filter(|(date, _)| range.contains(*date)) {
        buckets.entry(*date).or_default().push(*value);
    }

    Ok(range
        .days()
        .map(|date| SeriesPoint {
            date,
            label: label_for(days, date),
            value: buckets
                .get(&date)
                .map(|values| aggregation.apply(values))
                .unwrap_or(0.0),
        })
        .collect())
}

/// Short weekday for ranges of up to a week, otherwise the ISO date.
fn label_for(range_days: i64, date: NaiveDate) -> String {
    if range_days <= 7 {
        date.format("%a").to_string()
    } else {
        date.format("%Y-%m-%d").to_string()
    }
}
