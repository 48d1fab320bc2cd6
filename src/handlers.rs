use crate::breakdown::{DistributionKind, HeatmapCell, MacroBreakdown, Slice, WeightTrend};
use crate::errors::AppError;
use crate::models::{
    Aggregation, Category, Entry, EntryId, EntryRangeQuery, Goal, GoalQuery, GoalUpdate, Metric,
    NewEntry, PeriodQuery, UserDefaults, UserId,
};
use crate::store::EntryStore;
use crate::series::Series;
use crate::state::AppState;
use crate::summary::{ComparisonDelta, Dashboard, PeriodSummary};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Local, NaiveDate};
use tracing::info;

pub async fn health() -> &'static str {
    "ok"
}

pub async fn get_summary(
    State(state): State<AppState>,
    Path((user_id, category)): Path<(UserId, String)>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<PeriodSummary>, AppError> {
    let category: Category = category.parse()?;
    let summary = state
        .aggregator
        .period_summary(user_id, category, query.kind()?, reference_date(&query))
        .await?;
    Ok(Json(summary))
}

pub async fn get_comparison(
    State(state): State<AppState>,
    Path((user_id, metric)): Path<(UserId, String)>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<ComparisonDelta>, AppError> {
    let metric: Metric = metric.parse()?;
    let delta = state
        .aggregator
        .comparison_delta(user_id, metric, query.kind()?, reference_date(&query))
        .await?;
    Ok(Json(delta))
}

pub async fn get_series(
    State(state): State<AppState>,
    Path((user_id, metric)): Path<(UserId, String)>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<Series>, AppError> {
    let metric: Metric = metric.parse()?;
    let aggregation = query.agg.as_deref().map(str::parse::<Aggregation>).transpose()?;
    let series = state
        .aggregator
        .series(user_id, metric, query.kind()?, reference_date(&query), aggregation)
        .await?;
    Ok(Json(series))
}

pub async fn get_dashboard(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<Dashboard>, AppError> {
    let dashboard = state
        .aggregator
        .dashboard(user_id, query.kind()?, reference_date(&query))
        .await?;
    Ok(Json(dashboard))
}

pub async fn get_macros(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<MacroBreakdown>, AppError> {
    let breakdown = state
        .aggregator
        .macronutrients(user_id, query.kind()?, reference_date(&query))
        .await?;
    Ok(Json(breakdown))
}

pub async fn get_distribution(
    State(state): State<AppState>,
    Path((user_id, kind)): Path<(UserId, String)>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<Vec<Slice>>, AppError> {
    let distribution: DistributionKind = kind.parse()?;
    let slices = state
        .aggregator
        .distribution(user_id, distribution, query.kind()?, reference_date(&query))
        .await?;
    Ok(Json(slices))
}

pub async fn get_weight_trend(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<WeightTrend>, AppError> {
    let trend = state
        .aggregator
        .weight_trend(user_id, query.kind()?, reference_date(&query))
        .await?;
    Ok(Json(trend))
}

pub async fn get_heatmap(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<Vec<HeatmapCell>>, AppError> {
    let cells = state
        .aggregator
        .activity_heatmap(user_id, query.kind()?, reference_date(&query))
        .await?;
    Ok(Json(cells))
}

pub async fn list_entries(
    State(state): State<AppState>,
    Path((user_id, category)): Path<(UserId, String)>,
    Query(query): Query<EntryRangeQuery>,
) -> Result<Json<Vec<Entry>>, AppError> {
    let category: Category = category.parse()?;
    let entries = state
        .store
        .read_entries(user_id, category, query.range()?)
        .await?;
    Ok(Json(entries.into_entries()))
}

pub async fn create_entry(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    payload: Result<Json<NewEntry>, JsonRejection>,
) -> Result<(StatusCode, Json<Entry>), AppError> {
    let Json(payload) = payload?;
    let entry = payload.into_entry(user_id)?;
    let stored = state.store.insert_entry(entry).await?;
    info!(user_id, category = %stored.category(), id = stored.id(), "entry logged");
    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Path((user_id, category, id)): Path<(UserId, String, EntryId)>,
) -> Result<StatusCode, AppError> {
    let category: Category = category.parse()?;
    if !state.store.delete_entry(user_id, category, id).await? {
        return Err(AppError::not_found(format!("no {category} entry {id}")));
    }
    info!(user_id, %category, id, "entry deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_goals(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Query(query): Query<GoalQuery>,
) -> Result<Json<Vec<Goal>>, AppError> {
    let category = query.category.as_deref().map(str::parse::<Category>).transpose()?;
    Ok(Json(state.store.goals(user_id, category, query.is_active).await))
}

pub async fn create_goal(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    payload: Result<Json<Goal>, JsonRejection>,
) -> Result<(StatusCode, Json<Goal>), AppError> {
    let Json(goal) = payload?;
    let goal = Goal { user_id, ..goal };
    goal.validate()?;
    let stored = state.store.insert_goal(goal).await?;
    info!(user_id, category = %stored.category, id = stored.id, "goal created");
    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn update_goal(
    State(state): State<AppState>,
    Path((user_id, id)): Path<(UserId, EntryId)>,
    payload: Result<Json<GoalUpdate>, JsonRejection>,
) -> Result<Json<Goal>, AppError> {
    let Json(patch) = payload?;
    let Some(goal) = state.store.update_goal(user_id, id, &patch).await? else {
        return Err(AppError::not_found(format!("no goal {id}")));
    };
    info!(user_id, id, is_active = goal.is_active, "goal updated");
    Ok(Json(goal))
}

pub async fn delete_goal(
    State(state): State<AppState>,
    Path((user_id, id)): Path<(UserId, EntryId)>,
) -> Result<StatusCode, AppError> {
    if !state.store.delete_goal(user_id, id).await? {
        return Err(AppError::not_found(format!("no goal {id}")));
    }
    info!(user_id, id, "goal deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn put_profile(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    payload: Result<Json<UserDefaults>, JsonRejection>,
) -> Result<Json<UserDefaults>, AppError> {
    let Json(defaults) = payload?;
    let stored = state.store.put_defaults(user_id, defaults).await?;
    Ok(Json(stored))
}

/// Explicit `date` from the query, otherwise the local calendar day.
fn reference_date(query: &PeriodQuery) -> NaiveDate {
    query.date.unwrap_or_else(|| Local::now().date_naive())
}
