use crate::errors::{AnalyticsError, EntryError};
use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

pub type UserId = u64;
pub type EntryId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Water,
    Calories,
    Workout,
    Sleep,
    Weight,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Water,
        Category::Calories,
        Category::Workout,
        Category::Sleep,
        Category::Weight,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Water => "water",
            Self::Calories => "calories",
            Self::Workout => "workout",
            Self::Sleep => "sleep",
            Self::Weight => "weight",
        }
    }

    /// The metric a goal of this category is measured against.
    pub const fn primary_metric(self) -> Metric {
        match self {
            Self::Water => Metric::WaterMl,
            Self::Calories => Metric::CaloriesConsumed,
            Self::Workout => Metric::WorkoutMinutes,
            Self::Sleep => Metric::SleepHours,
            Self::Weight => Metric::WeightKg,
        }
    }

    pub const fn metrics(self) -> &'static [Metric] {
        match self {
            Self::Water => &[Metric::WaterMl],
            Self::Calories => &[Metric::CaloriesConsumed],
            Self::Workout => &[
                Metric::WorkoutMinutes,
                Metric::WorkoutSessions,
                Metric::CaloriesBurned,
            ],
            Self::Sleep => &[Metric::SleepHours],
            Self::Weight => &[Metric::WeightKg],
        }
    }

    pub const fn default_unit(self) -> &'static str {
        self.primary_metric().unit()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownName {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for Category {
    type Err = UnknownName;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "water" => Ok(Self::Water),
            "calories" | "nutrition" | "meal" | "meals" => Ok(Self::Calories),
            "workout" | "workouts" => Ok(Self::Workout),
            "sleep" => Ok(Self::Sleep),
            "weight" => Ok(Self::Weight),
            other => Err(UnknownName {
                kind: "category",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalType {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// How the per-day or per-period values of a metric are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Sum,
    Average,
    Count,
}

impl Aggregation {
    /// Combine `values`. The average of nothing is 0.
    pub fn apply(self, values: &[f64]) -> f64 {
        match self {
            Self::Sum => values.iter().sum(),
            Self::Count => values.len() as f64,
            Self::Average if values.is_empty() => 0.0,
            Self::Average => values.iter().sum::<f64>() / values.len() as f64,
        }
    }
}

impl FromStr for Aggregation {
    type Err = UnknownName;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(Self::Sum),
            "avg" | "average" | "mean" => Ok(Self::Average),
            "count" => Ok(Self::Count),
            other => Err(UnknownName {
                kind: "aggregation",
                value: other.to_string(),
            }),
        }
    }
}

/// One measurable quantity of a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    WaterMl,
    SleepHours,
    WorkoutMinutes,
    WorkoutSessions,
    CaloriesBurned,
    CaloriesConsumed,
    WeightKg,
}

impl Metric {
    pub const fn category(self) -> Category {
        match self {
            Self::WaterMl => Category::Water,
            Self::SleepHours => Category::Sleep,
            Self::WorkoutMinutes | Self::WorkoutSessions | Self::CaloriesBurned => Category::Workout,
            Self::CaloriesConsumed => Category::Calories,
            Self::WeightKg => Category::Weight,
        }
    }

    pub const fn aggregation(self) -> Aggregation {
        match self {
            Self::WaterMl | Self::WorkoutMinutes | Self::CaloriesBurned | Self::CaloriesConsumed => {
                Aggregation::Sum
            }
            Self::WorkoutSessions => Aggregation::Count,
            Self::SleepHours | Self::WeightKg => Aggregation::Average,
        }
    }

    pub const fn unit(self) -> &'static str {
        match self {
            Self::WaterMl => "ml",
            Self::SleepHours => "hours",
            Self::WorkoutMinutes => "min",
            Self::WorkoutSessions => "sessions",
            Self::CaloriesBurned | Self::CaloriesConsumed => "kcal",
            Self::WeightKg => "kg",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WaterMl => "water_ml",
            Self::SleepHours => "sleep_hours",
            Self::WorkoutMinutes => "workout_minutes",
            Self::WorkoutSessions => "workout_sessions",
            Self::CaloriesBurned => "calories_burned",
            Self::CaloriesConsumed => "calories_consumed",
            Self::WeightKg => "weight_kg",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = UnknownName;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let name = value.trim().to_ascii_lowercase().replace('-', "_");
        match name.as_str() {
            "water_ml" => Ok(Self::WaterMl),
            "sleep_hours" => Ok(Self::SleepHours),
            "workout_minutes" => Ok(Self::WorkoutMinutes),
            "workout_sessions" | "sessions" => Ok(Self::WorkoutSessions),
            "calories_burned" => Ok(Self::CaloriesBurned),
            "calories_consumed" => Ok(Self::CaloriesConsumed),
            "weight_kg" => Ok(Self::WeightKg),
            // A bare category name selects its primary metric.
            _ => name
                .parse::<Category>()
                .map(Category::primary_metric)
                .map_err(|_| UnknownName {
                    kind: "metric",
                    value: value.trim().to_string(),
                }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutEntry {
    #[serde(default)]
    pub id: EntryId,
    #[serde(default)]
    pub user_id: UserId,
    pub date: NaiveDate,
    pub workout_type: String,
    #[serde(default)]
    pub name: String,
    pub duration_minutes: u32,
    #[serde(default)]
    pub calories_burned: f64,
    #[serde(default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub intensity: Option<Intensity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Snack => "snack",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealEntry {
    #[serde(default)]
    pub id: EntryId,
    #[serde(default)]
    pub user_id: UserId,
    pub date: NaiveDate,
    #[serde(default)]
    pub time: Option<NaiveTime>,
    pub meal_type: MealType,
    #[serde(default)]
    pub name: String,
    pub calories: f64,
    #[serde(default)]
    pub protein_g: f64,
    #[serde(default)]
    pub carbs_g: f64,
    #[serde(default)]
    pub fat_g: f64,
    #[serde(default)]
    pub fiber_g: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepEntry {
    #[serde(default)]
    pub id: EntryId,
    #[serde(default)]
    pub user_id: UserId,
    pub date: NaiveDate,
    pub bed_time: NaiveTime,
    pub wake_time: NaiveTime,
    pub total_hours: f64,
    #[serde(default)]
    pub quality: Option<u8>,
}

/// Hours from `bed` to `wake`, wrapping past midnight when `wake` is
/// earlier in the day than `bed`.
pub fn hours_between(bed: NaiveTime, wake: NaiveTime) -> f64 {
    let bed = f64::from(bed.num_seconds_from_midnight());
    let wake = f64::from(wake.num_seconds_from_midnight());
    let seconds = if wake >= bed { wake - bed } else { wake + 86_400.0 - bed };
    (seconds / 3600.0 * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterEntry {
    #[serde(default)]
    pub id: EntryId,
    #[serde(default)]
    pub user_id: UserId,
    pub date: NaiveDate,
    #[serde(default)]
    pub time: Option<NaiveTime>,
    pub amount_ml: u32,
    #[serde(default = "default_beverage")]
    pub beverage_type: String,
}

fn default_beverage() -> String {
    "water".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    #[serde(default)]
    pub id: EntryId,
    #[serde(default)]
    pub user_id: UserId,
    pub date: NaiveDate,
    pub weight_kg: f64,
    #[serde(default)]
    pub body_fat_percentage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    #[serde(default)]
    pub id: EntryId,
    #[serde(default)]
    pub user_id: UserId,
    pub category: Category,
    pub goal_type: GoalType,
    pub target_value: f64,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

fn default_active() -> bool {
    true
}

impl Goal {
    /// True when the goal is switched on and its window covers `date`.
    pub fn applies_on(&self, date: NaiveDate) -> bool {
        self.is_active && self.start_date <= date && self.end_date.is_none_or(|end| date <= end)
    }

    pub fn validate(&self) -> Result<(), EntryError> {
        non_negative("target_value", self.target_value)?;
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(EntryError::EndsBeforeStart);
            }
        }
        Ok(())
    }
}

/// Partial change to a stored goal. Absent fields keep their value; an
/// explicit `"end_date": null` makes the goal open-ended again.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoalUpdate {
    #[serde(default)]
    pub target_value: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "present")]
    pub end_date: Option<Option<NaiveDate>>,
}

impl GoalUpdate {
    /// The goal with this update applied, validated as a whole.
    pub fn apply(&self, goal: &Goal) -> Result<Goal, EntryError> {
        let updated = Goal {
            target_value: self.target_value.unwrap_or(goal.target_value),
            unit: self.unit.clone().or_else(|| goal.unit.clone()),
            is_active: self.is_active.unwrap_or(goal.is_active),
            start_date: self.start_date.unwrap_or(goal.start_date),
            end_date: self.end_date.unwrap_or(goal.end_date),
            ..goal.clone()
        };
        updated.validate()?;
        Ok(updated)
    }
}

// Distinguishes a field set to null from a missing one.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Filters for listing goals.
#[derive(Debug, Default, Deserialize)]
pub struct GoalQuery {
    pub category: Option<String>,
    pub is_active: Option<bool>,
}

/// Profile-level daily targets. Unset or non-positive values fall back to
/// the system defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserDefaults {
    #[serde(default)]
    pub daily_water_goal_ml: Option<f64>,
    #[serde(default)]
    pub daily_calorie_goal: Option<f64>,
    #[serde(default)]
    pub daily_workout_goal_minutes: Option<f64>,
    #[serde(default)]
    pub sleep_goal_hours: Option<f64>,
}

impl UserDefaults {
    pub fn for_category(&self, category: Category) -> Option<f64> {
        let value = match category {
            Category::Water => self.daily_water_goal_ml,
            Category::Calories => self.daily_calorie_goal,
            Category::Workout => self.daily_workout_goal_minutes,
            Category::Sleep => self.sleep_goal_hours,
            Category::Weight => None,
        };
        value.filter(|v| v.is_finite() && *v > 0.0)
    }
}

/// A single logged entry, tagged by category on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "lowercase")]
pub enum Entry {
    Water(WaterEntry),
    #[serde(alias = "meal", alias = "nutrition")]
    Calories(MealEntry),
    Workout(WorkoutEntry),
    Sleep(SleepEntry),
    Weight(WeightEntry),
}

impl Entry {
    pub fn category(&self) -> Category {
        match self {
            Self::Water(_) => Category::Water,
            Self::Calories(_) => Category::Calories,
            Self::Workout(_) => Category::Workout,
            Self::Sleep(_) => Category::Sleep,
            Self::Weight(_) => Category::Weight,
        }
    }

    pub fn id(&self) -> EntryId {
        match self {
            Self::Water(e) => e.id,
            Self::Calories(e) => e.id,
            Self::Workout(e) => e.id,
            Self::Sleep(e) => e.id,
            Self::Weight(e) => e.id,
        }
    }

    pub fn validate(&self) -> Result<(), EntryError> {
        match self {
            Self::Water(e) => {
                if e.amount_ml == 0 {
                    return Err(EntryError::NotPositive { field: "amount_ml" });
                }
                Ok(())
            }
            Self::Calories(e) => {
                non_negative("calories", e.calories)?;
                non_negative("protein_g", e.protein_g)?;
                non_negative("carbs_g", e.carbs_g)?;
                non_negative("fat_g", e.fat_g)?;
                non_negative("fiber_g", e.fiber_g)
            }
            Self::Workout(e) => {
                non_negative("calories_burned", e.calories_burned)?;
                if let Some(distance) = e.distance_km {
                    non_negative("distance_km", distance)?;
                }
                Ok(())
            }
            Self::Sleep(e) => {
                non_negative("total_hours", e.total_hours)?;
                within("total_hours", e.total_hours, 0.0, 24.0)?;
                if let Some(quality) = e.quality {
                    within("quality", f64::from(quality), 1.0, 10.0)?;
                }
                Ok(())
            }
            Self::Weight(e) => {
                positive("weight_kg", e.weight_kg)?;
                if let Some(fat) = e.body_fat_percentage {
                    within("body_fat_percentage", fat, 0.0, 100.0)?;
                }
                Ok(())
            }
        }
    }
}

/// Sleep as logged by a client; `total_hours` is derived from the bed and
/// wake times when omitted.
#[derive(Debug, Clone, Deserialize)]
pub struct SleepLog {
    pub date: NaiveDate,
    pub bed_time: NaiveTime,
    pub wake_time: NaiveTime,
    #[serde(default)]
    pub total_hours: Option<f64>,
    #[serde(default)]
    pub quality: Option<u8>,
}

/// Body of a log request.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "category", rename_all = "lowercase")]
pub enum NewEntry {
    Water(WaterEntry),
    #[serde(alias = "meal", alias = "nutrition")]
    Calories(MealEntry),
    Workout(WorkoutEntry),
    Sleep(SleepLog),
    Weight(WeightEntry),
}

impl NewEntry {
    /// Attach the entry to `user_id` and check its invariants. The id is
    /// assigned by the store.
    pub fn into_entry(self, user_id: UserId) -> Result<Entry, EntryError> {
        let entry = match self {
            Self::Water(e) => Entry::Water(WaterEntry { id: 0, user_id, ..e }),
            Self::Calories(e) => Entry::Calories(MealEntry { id: 0, user_id, ..e }),
            Self::Workout(e) => Entry::Workout(WorkoutEntry { id: 0, user_id, ..e }),
            Self::Weight(e) => Entry::Weight(WeightEntry { id: 0, user_id, ..e }),
            Self::Sleep(log) => Entry::Sleep(SleepEntry {
                id: 0,
                user_id,
                date: log.date,
                bed_time: log.bed_time,
                wake_time: log.wake_time,
                total_hours: log
                    .total_hours
                    .unwrap_or_else(|| hours_between(log.bed_time, log.wake_time)),
                quality: log.quality,
            }),
        };
        entry.validate()?;
        Ok(entry)
    }
}

/// Entries of one category read for a range, in date order.
#[derive(Debug, Clone, PartialEq)]
pub enum Entries {
    Water(Vec<WaterEntry>),
    Calories(Vec<MealEntry>),
    Workout(Vec<WorkoutEntry>),
    Sleep(Vec<SleepEntry>),
    Weight(Vec<WeightEntry>),
}

impl Entries {
    pub fn category(&self) -> Category {
        match self {
            Self::Water(_) => Category::Water,
            Self::Calories(_) => Category::Calories,
            Self::Workout(_) => Category::Workout,
            Self::Sleep(_) => Category::Sleep,
            Self::Weight(_) => Category::Weight,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Water(v) => v.len(),
            Self::Calories(v) => v.len(),
            Self::Workout(v) => v.len(),
            Self::Sleep(v) => v.len(),
            Self::Weight(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_meals(self) -> Option<Vec<MealEntry>> {
        match self {
            Self::Calories(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_workouts(self) -> Option<Vec<WorkoutEntry>> {
        match self {
            Self::Workout(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_sleep(self) -> Option<Vec<SleepEntry>> {
        match self {
            Self::Sleep(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_weights(self) -> Option<Vec<WeightEntry>> {
        match self {
            Self::Weight(v) => Some(v),
            _ => None,
        }
    }

    /// Flatten back into tagged entries, keeping date order.
    pub fn into_entries(self) -> Vec<Entry> {
        match self {
            Self::Water(v) => v.into_iter().map(Entry::Water).collect(),
            Self::Calories(v) => v.into_iter().map(Entry::Calories).collect(),
            Self::Workout(v) => v.into_iter().map(Entry::Workout).collect(),
            Self::Sleep(v) => v.into_iter().map(Entry::Sleep).collect(),
            Self::Weight(v) => v.into_iter().map(Entry::Weight).collect(),
        }
    }

    /// (date, value) pairs of `metric`, one per entry.
    ///
    /// Entries of another category yield nothing.
    pub fn samples(&self, metric: Metric) -> Vec<(NaiveDate, f64)> {
        match (self, metric) {
            (Self::Water(v), Metric::WaterMl) => {
                v.iter().map(|e| (e.date, f64::from(e.amount_ml))).collect()
            }
            (Self::Sleep(v), Metric::SleepHours) => v.iter().map(|e| (e.date, e.total_hours)).collect(),
            (Self::Workout(v), Metric::WorkoutMinutes) => v
                .iter()
                .map(|e| (e.date, f64::from(e.duration_minutes)))
                .collect(),
            (Self::Workout(v), Metric::WorkoutSessions) => v.iter().map(|e| (e.date, 1.0)).collect(),
            (Self::Workout(v), Metric::CaloriesBurned) => {
                v.iter().map(|e| (e.date, e.calories_burned)).collect()
            }
            (Self::Calories(v), Metric::CaloriesConsumed) => v.iter().map(|e| (e.date, e.calories)).collect(),
            (Self::Weight(v), Metric::WeightKg) => v.iter().map(|e| (e.date, e.weight_kg)).collect(),
            _ => Vec::new(),
        }
    }
}

/// The whole persisted document of the JSON entry store.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    #[serde(default)]
    pub next_id: EntryId,
    #[serde(default)]
    pub water: Vec<WaterEntry>,
    #[serde(default)]
    pub meals: Vec<MealEntry>,
    #[serde(default)]
    pub workouts: Vec<WorkoutEntry>,
    #[serde(default)]
    pub sleep: Vec<SleepEntry>,
    #[serde(default)]
    pub weights: Vec<WeightEntry>,
    #[serde(default)]
    pub goals: Vec<Goal>,
    #[serde(default)]
    pub profiles: BTreeMap<UserId, UserDefaults>,
}

impl AppData {
    pub fn allocate_id(&mut self) -> EntryId {
        self.next_id = self.next_id.saturating_add(1);
        self.next_id
    }
}

/// Inclusive date filter for listing entries; an open end is unbounded.
#[derive(Debug, Default, Deserialize)]
pub struct EntryRangeQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl EntryRangeQuery {
    pub fn range(&self) -> Result<crate::period::DateRange, AnalyticsError> {
        crate::period::DateRange::new(
            self.start_date.unwrap_or(NaiveDate::MIN),
            self.end_date.unwrap_or(NaiveDate::MAX),
        )
    }
}

/// Query parameters shared by the dashboard endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    pub period: Option<String>,
    pub date: Option<NaiveDate>,
    pub agg: Option<String>,
}

impl PeriodQuery {
    pub fn kind(&self) -> Result<crate::period::PeriodKind, AnalyticsError> {
        self.period.as_deref().unwrap_or("week").parse()
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), EntryError> {
    if !value.is_finite() {
        return Err(EntryError::NotFinite { field });
    }
    if value < 0.0 {
        return Err(EntryError::Negative { field });
    }
    Ok(())
}

fn positive(field: &'static str, value: f64) -> Result<(), EntryError> {
    non_negative(field, value)?;
    if value == 0.0 {
        return Err(EntryError::NotPositive { field });
    }
    Ok(())
}

fn within(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), EntryError> {
    if !value.is_finite() {
        return Err(EntryError::NotFinite { field });
    }
    if value < min || value > max {
        return Err(EntryError::OutOfRange { field, min, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn sleep_hours_cross_midnight() {
        assert_eq!(hours_between(time(23, 0), time(7, 0)), 8.0);
        assert_eq!(hours_between(time(1, 30), time(9, 0)), 7.5);
        assert_eq!(hours_between(time(22, 0), time(22, 0)), 0.0);
    }

    #[test]
    fn metric_names_accept_category_aliases() {
        assert_eq!("water".parse::<Metric>().unwrap(), Metric::WaterMl);
        assert_eq!("workout".parse::<Metric>().unwrap(), Metric::WorkoutMinutes);
        assert_eq!("calories-burned".parse::<Metric>().unwrap(), Metric::CaloriesBurned);
        assert_eq!("nutrition".parse::<Metric>().unwrap(), Metric::CaloriesConsumed);
        assert!("steps".parse::<Metric>().is_err());
    }

    #[test]
    fn average_of_nothing_is_zero() {
        assert_eq!(Aggregation::Average.apply(&[]), 0.0);
        assert_eq!(Aggregation::Average.apply(&[7.0, 8.0]), 7.5);
        assert_eq!(Aggregation::Count.apply(&[3.0, 0.0]), 2.0);
    }

    #[test]
    fn new_sleep_derives_total_hours() {
        let body = serde_json::json!({
            "category": "sleep",
            "date": "2026-01-05",
            "bed_time": "23:30:00",
            "wake_time": "07:00:00",
            "quality": 8
        });
        let entry: NewEntry = serde_json::from_value(body).unwrap();
        let Entry::Sleep(sleep) = entry.into_entry(7).unwrap() else {
            panic!("expected sleep entry");
        };
        assert_eq!(sleep.user_id, 7);
        assert_eq!(sleep.total_hours, 7.5);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let water: NewEntry = serde_json::from_value(serde_json::json!({
            "category": "water", "date": "2026-01-05", "amount_ml": 0
        }))
        .unwrap();
        assert_eq!(
            water.into_entry(1).unwrap_err(),
            EntryError::NotPositive { field: "amount_ml" }
        );

        let meal: NewEntry = serde_json::from_value(serde_json::json!({
            "category": "meal", "date": "2026-01-05", "meal_type": "lunch", "calories": -5.0
        }))
        .unwrap();
        assert_eq!(
            meal.into_entry(1).unwrap_err(),
            EntryError::Negative { field: "calories" }
        );

        let sleep: NewEntry = serde_json::from_value(serde_json::json!({
            "category": "sleep", "date": "2026-01-05",
            "bed_time": "23:00:00", "wake_time": "07:00:00", "quality": 11
        }))
        .unwrap();
        assert!(matches!(
            sleep.into_entry(1).unwrap_err(),
            EntryError::OutOfRange { field: "quality", .. }
        ));
    }

    #[test]
    fn goal_window_and_profile_fallback() {
        let goal = Goal {
            id: 1,
            user_id: 1,
            category: Category::Water,
            goal_type: GoalType::Daily,
            target_value: 2500.0,
            unit: None,
            is_active: true,
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 1, 31),
        };
        assert!(goal.applies_on(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()));
        assert!(!goal.applies_on(NaiveDate::from_ymd_opt(2026, 2, 1).unwrap()));

        let defaults = UserDefaults {
            daily_water_goal_ml: Some(0.0),
            daily_calorie_goal: Some(1800.0),
            ..UserDefaults::default()
        };
        assert_eq!(defaults.for_category(Category::Water), None);
        assert_eq!(defaults.for_category(Category::Calories), Some(1800.0));
    }

    #[test]
    fn goal_update_distinguishes_null_from_missing() {
        let goal = Goal {
            id: 3,
            user_id: 1,
            category: Category::Sleep,
            goal_type: GoalType::Weekly,
            target_value: 8.0,
            unit: None,
            is_active: true,
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 3, 1),
        };

        let keep: GoalUpdate = serde_json::from_value(serde_json::json!({ "target_value": 7.5 })).unwrap();
        let kept = keep.apply(&goal).unwrap();
        assert_eq!(kept.target_value, 7.5);
        assert_eq!(kept.end_date, goal.end_date);
        assert_eq!(kept.id, 3);

        let clear: GoalUpdate = serde_json::from_value(serde_json::json!({ "end_date": null })).unwrap();
        assert_eq!(clear.apply(&goal).unwrap().end_date, None);

        let negative = GoalUpdate {
            target_value: Some(-1.0),
            ..GoalUpdate::default()
        };
        assert_eq!(
            negative.apply(&goal).unwrap_err(),
            EntryError::Negative { field: "target_value" }
        );
    }

    #[test]
    fn typed_accessors_reject_other_categories() {
        let entries = Entries::Weight(Vec::new());
        assert!(entries.clone().into_weights().is_some());
        assert!(entries.into_meals().is_none());
    }
}
