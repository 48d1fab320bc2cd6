//! Turns raw per-entry logs into period summaries, comparisons and chart
//! series.
//!
//! The aggregator keeps no state of its own: every call resolves its
//! period, reads the entries it needs and computes the result fresh, so a
//! write or delete is visible on the very next call.

use crate::breakdown::{self, DistributionKind, HeatmapCell, MacroBreakdown, Slice, WeightTrend};
use crate::errors::{AnalyticsError, StoreError};
use crate::models::{Aggregation, Category, Entries, Metric, UserId};
use crate::period::{self, DateRange, PeriodKind};
use crate::series::{self, Series};
use crate::store::{EntryStore, GoalStore, ProfileStore};
use crate::summary::{
    self, ComparisonDelta, Dashboard, GoalProgress, GoalSource, MetricValue, PeriodSummary,
    PeriodValue,
};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Metrics compared period over period on the dashboard.
pub const DASHBOARD_COMPARISONS: [Metric; 4] = [
    Metric::CaloriesBurned,
    Metric::WorkoutSessions,
    Metric::SleepHours,
    Metric::WaterMl,
];

pub struct Aggregator<S> {
    store: Arc<S>,
}

impl<S> Clone for Aggregator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

/// A goal target and where it came from.
#[derive(Debug, Clone, PartialEq)]
struct Target {
    value: f64,
    unit: String,
    source: GoalSource,
}

impl<S> Aggregator<S>
where
    S: EntryStore + GoalStore + ProfileStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Summary of one category over the period of `kind` ending at
    /// `reference`. Always returns a summary; with no entries every value is
    /// zero.
    #[instrument(level = "debug", skip(self))]
    pub async fn period_summary(
        &self,
        user_id: UserId,
        category: Category,
        kind: PeriodKind,
        reference: NaiveDate,
    ) -> Result<PeriodSummary, AnalyticsError> {
        let range = period::resolve(reference, kind, 0)?;
        let entries = self.read(user_id, category, range).await?;

        let metrics: Vec<MetricValue> = category
            .metrics()
            .iter()
            .map(|&metric| MetricValue {
                metric,
                value: measure(&entries, metric, metric.aggregation()),
                unit: metric.unit(),
            })
            .collect();
        let value = metrics
            .iter()
            .find(|m| m.metric == category.primary_metric())
            .map(|m| m.value)
            .unwrap_or(0.0);

        let target = self.target(user_id, category, kind, range, reference).await?;
        let goal = GoalProgress::new(value, target.value, target.unit, target.source);
        debug!(%range, entries = entries.len(), value, percentage = goal.percentage, "period summary");

        Ok(PeriodSummary {
            user_id,
            category,
            period: kind,
            start_date: range.start,
            end_date: range.end,
            entry_count: entries.len(),
            value,
            metrics,
            goal,
        })
    }

    /// `metric` over the current period against the immediately preceding
    /// period of the same length.
    #[instrument(level = "debug", skip(self))]
    pub async fn comparison_delta(
        &self,
        user_id: UserId,
        metric: Metric,
        kind: PeriodKind,
        reference: NaiveDate,
    ) -> Result<ComparisonDelta, AnalyticsError> {
        let (current_range, previous_range) = period::resolve_pair(reference, kind)?;
        let category = metric.category();

        let current = self.read(user_id, category, current_range).await?;
        let previous = self.read(user_id, category, previous_range).await?;

        let delta = ComparisonDelta::new(
            user_id,
            metric,
            kind,
            PeriodValue::new(current_range, measure(&current, metric, metric.aggregation())),
            PeriodValue::new(previous_range, measure(&previous, metric, metric.aggregation())),
        );
        debug!(delta = delta.delta, change = ?delta.change, "comparison");
        Ok(delta)
    }

    /// One point per day of the period. `aggregation` overrides how entries
    /// of the same day are combined; by default the metric's own rule.
    #[instrument(level = "debug", skip(self))]
    pub async fn series(
        &self,
        user_id: UserId,
        metric: Metric,
        kind: PeriodKind,
        reference: NaiveDate,
        aggregation: Option<Aggregation>,
    ) -> Result<Series, AnalyticsError> {
        let range = period::resolve(reference, kind, 0)?;
        let aggregation = aggregation.unwrap_or(metric.aggregation());
        let entries = self.read(user_id, metric.category(), range).await?;
        let points = series::build_series(range, &entries.samples(metric), aggregation)?;

        Ok(Series {
            user_id,
            metric,
            aggregation,
            period: kind,
            start_date: range.start,
            end_date: range.end,
            points,
        })
    }

    /// Summaries of every category plus the standard comparisons.
    #[instrument(level = "debug", skip(self))]
    pub async fn dashboard(
        &self,
        user_id: UserId,
        kind: PeriodKind,
        reference: NaiveDate,
    ) -> Result<Dashboard, AnalyticsError> {
        let mut summaries = Vec::with_capacity(Category::ALL.len());
        for category in Category::ALL {
            summaries.push(self.period_summary(user_id, category, kind, reference).await?);
        }

        let mut comparisons = Vec::with_capacity(DASHBOARD_COMPARISONS.len());
        for metric in DASHBOARD_COMPARISONS {
            comparisons.push(self.comparison_delta(user_id, metric, kind, reference).await?);
        }

        Ok(Dashboard {
            user_id,
            period: kind,
            reference_date: reference,
            summaries,
            comparisons,
        })
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn macronutrients(
        &self,
        user_id: UserId,
        kind: PeriodKind,
        reference: NaiveDate,
    ) -> Result<MacroBreakdown, AnalyticsError> {
        let range = period::resolve(reference, kind, 0)?;
        let meals = self.read_as(user_id, Category::Calories, range, Entries::into_meals).await?;
        Ok(breakdown::macronutrients(range, &meals))
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn distribution(
        &self,
        user_id: UserId,
        distribution: DistributionKind,
        kind: PeriodKind,
        reference: NaiveDate,
    ) -> Result<Vec<Slice>, AnalyticsError> {
        let range = period::resolve(reference, kind, 0)?;
        let slices = match distribution {
            DistributionKind::WorkoutTypes => {
                let workouts = self
                    .read_as(user_id, Category::Workout, range, Entries::into_workouts)
                    .await?;
                breakdown::workout_type_minutes(&workouts)
            }
            DistributionKind::MealTypes => {
                let meals = self.read_as(user_id, Category::Calories, range, Entries::into_meals).await?;
                breakdown::meal_type_calories(&meals)
            }
        };
        Ok(slices)
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn weight_trend(
        &self,
        user_id: UserId,
        kind: PeriodKind,
        reference: NaiveDate,
    ) -> Result<WeightTrend, AnalyticsError> {
        let range = period::resolve(reference, kind, 0)?;
        let weights = self.read_as(user_id, Category::Weight, range, Entries::into_weights).await?;
        Ok(breakdown::weight_trend(range, &weights))
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn activity_heatmap(
        &self,
        user_id: UserId,
        kind: PeriodKind,
        reference: NaiveDate,
    ) -> Result<Vec<HeatmapCell>, AnalyticsError> {
        let range = period::resolve(reference, kind, 0)?;
        let workouts = self
            .read_as(user_id, Category::Workout, range, Entries::into_workouts)
            .await?;
        let meals = self.read_as(user_id, Category::Calories, range, Entries::into_meals).await?;
        let sleep = self.read_as(user_id, Category::Sleep, range, Entries::into_sleep).await?;
        Ok(breakdown::activity_heatmap(&workouts, &meals, &sleep))
    }

    async fn read(
        &self,
        user_id: UserId,
        category: Category,
        range: DateRange,
    ) -> Result<Entries, AnalyticsError> {
        let entries = self
            .store
            .read_entries(user_id, category, range)
            .await
            .map_err(|err| {
                warn!(user_id, %category, %range, error = %err, "entry store read failed");
                AnalyticsError::DataUnavailable(err)
            })?;
        if entries.category() != category {
            warn!(user_id, %category, returned = %entries.category(), "entry store returned another category");
            return Err(mismatch(category));
        }
        Ok(entries)
    }

    async fn read_as<T>(
        &self,
        user_id: UserId,
        category: Category,
        range: DateRange,
        pick: fn(Entries) -> Option<Vec<T>>,
    ) -> Result<Vec<T>, AnalyticsError> {
        let entries = self.read(user_id, category, range).await?;
        pick(entries).ok_or_else(|| mismatch(category))
    }

    /// Goal lookup order: an active goal whose type matches the period, the
    /// profile's daily default, the system daily default. Daily defaults
    /// are multiplied by the period length for summed metrics.
    async fn target(
        &self,
        user_id: UserId,
        category: Category,
        kind: PeriodKind,
        range: DateRange,
        reference: NaiveDate,
    ) -> Result<Target, AnalyticsError> {
        let goal = self
            .store
            .active_goal(user_id, category, kind.goal_type(), reference)
            .await
            .map_err(AnalyticsError::DataUnavailable)?;
        if let Some(goal) = goal {
            return Ok(Target {
                value: goal.target_value,
                unit: goal.unit.unwrap_or_else(|| category.default_unit().to_string()),
                source: GoalSource::Goal,
            });
        }

        let profile = self
            .store
            .defaults(user_id)
            .await
            .map_err(AnalyticsError::DataUnavailable)?
            .and_then(|defaults| defaults.for_category(category));
        let (daily, source) = match profile {
            Some(value) => (value, GoalSource::Profile),
            None => (summary::system_default(category), GoalSource::System),
        };

        let value = match category.primary_metric().aggregation() {
            Aggregation::Sum | Aggregation::Count => daily * range.num_days() as f64,
            Aggregation::Average => daily,
        };
        Ok(Target {
            value,
            unit: category.default_unit().to_string(),
            source,
        })
    }
}

fn mismatch(category: Category) -> AnalyticsError {
    AnalyticsError::DataUnavailable(StoreError::Unavailable(format!(
        "store did not return {category} entries"
    )))
}

fn measure(entries: &Entries, metric: Metric, aggregation: Aggregation) -> f64 {
    let values: Vec<f64> = entries.samples(metric).into_iter().map(|(_, v)| v).collect();
    aggregation.apply(&values)
}
