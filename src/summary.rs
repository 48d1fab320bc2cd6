//! Derived, never-persisted views: per-period summaries, goal progress and
//! period-over-period deltas.

use crate::models::{Category, Metric, UserId};
use crate::period::{DateRange, PeriodKind};
use chrono::NaiveDate;
use serde::Serialize;

pub const DEFAULT_WATER_GOAL_ML: f64 = 3000.0;
pub const DEFAULT_CALORIE_GOAL: f64 = 2000.0;
pub const DEFAULT_WORKOUT_GOAL_MINUTES: f64 = 60.0;
pub const DEFAULT_SLEEP_GOAL_HOURS: f64 = 8.0;

/// Daily target used when neither a goal nor the profile sets one. Weight
/// has no meaningful default, so its progress reads 0.
pub const fn system_default(category: Category) -> f64 {
    match category {
        Category::Water => DEFAULT_WATER_GOAL_ML,
        Category::Calories => DEFAULT_CALORIE_GOAL,
        Category::Workout => DEFAULT_WORKOUT_GOAL_MINUTES,
        Category::Sleep => DEFAULT_SLEEP_GOAL_HOURS,
        Category::Weight => 0.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalSource {
    Goal,
    Profile,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProgress {
    pub target: f64,
    pub unit: String,
    pub source: GoalSource,
    /// Unclamped value / target; 0 when the target is 0.
    pub ratio: f64,
    /// Ratio as a whole percentage, not clamped.
    pub percentage: i64,
    /// Percentage clamped to 0..=100 for progress bars.
    pub display_percentage: i64,
}

impl GoalProgress {
    pub fn new(value: f64, target: f64, unit: impl Into<String>, source: GoalSource) -> Self {
        let ratio = if target.is_finite() && target > 0.0 {
            value / target
        } else {
            0.0
        };
        let percentage = (ratio * 100.0).round() as i64;
        Self {
            target,
            unit: unit.into(),
            source,
            ratio,
            percentage,
            display_percentage: percentage.clamp(0, 100),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricValue {
    pub metric: Metric,
    pub value: f64,
    pub unit: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub user_id: UserId,
    pub category: Category,
    pub period: PeriodKind,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub entry_count: usize,
    /// Value of the category's primary metric.
    pub value: f64,
    pub metrics: Vec<MetricValue>,
    pub goal: GoalProgress,
}

impl PeriodSummary {
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        self.metrics.iter().find(|m| m.metric == metric).map(|m| m.value)
    }
}

/// Relative change between two periods.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Change {
    /// current / previous × 100 − 100, one decimal.
    Percent { value: f64 },
    /// Neither period has anything to compare.
    NoPreviousData,
    /// Previous period was zero, current is not.
    New,
}

impl Change {
    pub fn between(current: f64, previous: f64) -> Self {
        if previous == 0.0 {
            if current == 0.0 {
                Self::NoPreviousData
            } else {
                Self::New
            }
        } else {
            Self::Percent {
                value: round_to(current / previous * 100.0 - 100.0, 1),
            }
        }
    }

    pub fn percent(&self) -> Option<f64> {
        match self {
            Self::Percent { value } => Some(*value),
            Self::NoPreviousData | Self::New => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodValue {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub value: f64,
}

impl PeriodValue {
    pub fn new(range: DateRange, value: f64) -> Self {
        Self {
            start_date: range.start,
            end_date: range.end,
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonDelta {
    pub user_id: UserId,
    pub metric: Metric,
    pub period: PeriodKind,
    pub current: PeriodValue,
    pub previous: PeriodValue,
    pub delta: f64,
    pub change: Change,
}

impl ComparisonDelta {
    pub fn new(
        user_id: UserId,
        metric: Metric,
        period: PeriodKind,
        current: PeriodValue,
        previous: PeriodValue,
    ) -> Self {
        Self {
            user_id,
            metric,
            period,
            delta: round_to(current.value - previous.value, 1),
            change: Change::between(current.value, previous.value),
            current,
            previous,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub user_id: UserId,
    pub period: PeriodKind,
    pub reference_date: NaiveDate,
    pub summaries: Vec<PeriodSummary>,
    pub comparisons: Vec<ComparisonDelta>,
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
