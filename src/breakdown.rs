//! Chart data beyond per-day series: macro split, distributions, weight
//! trend statistics and the weekday/hour activity heatmap.

use crate::models::{MealEntry, SleepEntry, UnknownName, WeightEntry, WorkoutEntry};
use crate::period::DateRange;
use crate::summary::round_to;
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use serde::Serialize;
use std::{collections::BTreeMap, str::FromStr};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacroShares {
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacroBreakdown {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_meals: usize,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub fiber_g: f64,
    /// Share of protein/carbs/fat grams, in percent.
    pub percentages: MacroShares,
    pub chart: Vec<Slice>,
}

pub fn macronutrients(range: DateRange, meals: &[MealEntry]) -> MacroBreakdown {
    let total = |f: fn(&MealEntry) -> f64| round_to(meals.iter().map(f).sum(), 1);
    let protein_g = total(|m| m.protein_g);
    let carbs_g = total(|m| m.carbs_g);
    let fat_g = total(|m| m.fat_g);

    let grams = protein_g + carbs_g + fat_g;
    let share = |part: f64| {
        if grams > 0.0 {
            round_to(part / grams * 100.0, 1)
        } else {
            0.0
        }
    };

    MacroBreakdown {
        start_date: range.start,
        end_date: range.end,
        total_meals: meals.len(),
        calories: total(|m| m.calories),
        protein_g,
        carbs_g,
        fat_g,
        fiber_g: total(|m| m.fiber_g),
        percentages: MacroShares {
            protein: share(protein_g),
            carbs: share(carbs_g),
            fat: share(fat_g),
        },
        chart: vec![
            Slice { name: "Protein".into(), value: protein_g },
            Slice { name: "Carbs".into(), value: carbs_g },
            Slice { name: "Fat".into(), value: fat_g },
        ],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DistributionKind {
    /// Workout minutes per workout type.
    WorkoutTypes,
    /// Calories per meal type.
    MealTypes,
}

impl FromStr for DistributionKind {
    type Err = UnknownName;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "workout-types" | "workouts" => Ok(Self::WorkoutTypes),
            "meal-types" | "meals" => Ok(Self::MealTypes),
            other => Err(UnknownName {
                kind: "distribution",
                value: other.to_string(),
            }),
        }
    }
}

pub fn workout_type_minutes(workouts: &[WorkoutEntry]) -> Vec<Slice> {
    let mut by_type: BTreeMap<String, f64> = BTreeMap::new();
    for workout in workouts {
        let name = workout.workout_type.trim().to_lowercase();
        *by_type.entry(name).or_default() += f64::from(workout.duration_minutes);
    }
    into_slices(by_type)
}

pub fn meal_type_calories(meals: &[MealEntry]) -> Vec<Slice> {
    let mut by_type: BTreeMap<String, f64> = BTreeMap::new();
    for meal in meals {
        *by_type.entry(meal.meal_type.as_str().to_string()).or_default() += meal.calories;
    }
    into_slices(by_type)
}

fn into_slices(map: BTreeMap<String, f64>) -> Vec<Slice> {
    map.into_iter()
        .map(|(name, value)| Slice {
            name,
            value: round_to(value, 1),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightPoint {
    pub date: NaiveDate,
    pub weight_kg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightStats {
    pub first_weight_kg: f64,
    pub last_weight_kg: f64,
    pub weight_change_kg: f64,
    pub min_weight_kg: f64,
    pub max_weight_kg: f64,
    pub average_weight_kg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightTrend {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_records: usize,
    pub statistics: Option<WeightStats>,
    pub points: Vec<WeightPoint>,
}

/// `weights` must already be in date order.
pub fn weight_trend(range: DateRange, weights: &[WeightEntry]) -> WeightTrend {
    let points: Vec<WeightPoint> = weights
        .iter()
        .map(|w| WeightPoint {
            date: w.date,
            weight_kg: w.weight_kg,
        })
        .collect();

    let statistics = match (points.first(), points.last()) {
        (Some(first), Some(last)) => {
            let values = points.iter().map(|p| p.weight_kg);
            Some(WeightStats {
                first_weight_kg: first.weight_kg,
                last_weight_kg: last.weight_kg,
                weight_change_kg: round_to(last.weight_kg - first.weight_kg, 1),
                min_weight_kg: values.clone().fold(f64::INFINITY, f64::min),
                max_weight_kg: values.clone().fold(f64::NEG_INFINITY, f64::max),
                average_weight_kg: round_to(values.sum::<f64>() / points.len() as f64, 1),
            })
        }
        _ => None,
    };

    WeightTrend {
        start_date: range.start,
        end_date: range.end,
        total_records: points.len(),
        statistics,
        points,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapCell {
    pub day: &'static str,
    pub hour: String,
    pub value: u32,
}

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

const BUCKET_HOURS: u32 = 3;

/// Count logged activity per weekday and three-hour slot.
///
/// Workouts count at their start time, meals at their meal time and sleep
/// at bed time. Entries without a time of day are left out. The result
/// always has 7 × 8 cells, Monday first, then by hour.
pub fn activity_heatmap(
    workouts: &[WorkoutEntry],
    meals: &[MealEntry],
    sleep: &[SleepEntry],
) -> Vec<HeatmapCell> {
    let slots = (24 / BUCKET_HOURS) as usize;
    let mut grid = [[0u32; 8]; 7];

    let stamps = workouts
        .iter()
        .filter_map(|w| w.start_time.map(|t| (w.date, t)))
        .chain(meals.iter().filter_map(|m| m.time.map(|t| (m.date, t))))
        .chain(sleep.iter().map(|s| (s.date, s.bed_time)));

    for (date, time) in stamps {
        let (day, slot) = cell_of(date, time);
        grid[day][slot] = grid[day][slot].saturating_add(1);
    }

    let mut cells = Vec::with_capacity(7 * slots);
    for (day, row) in WEEK.iter().zip(grid.iter()) {
        for (slot, value) in row.iter().enumerate() {
            cells.push(HeatmapCell {
                day: weekday_label(*day),
                hour: format!("{:02}:00", slot as u32 * BUCKET_HOURS),
                value: *value,
            });
        }
    }
    cells
}

fn cell_of(date: NaiveDate, time: NaiveTime) -> (usize, usize) {
    (
        date.weekday().num_days_from_monday() as usize,
        (time.hour() / BUCKET_HOURS) as usize,
    )
}

fn weekday_label(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}
