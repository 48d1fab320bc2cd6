use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

pub fn router(state: AppState) -> Router {
    let user_routes = Router::new()
        .route("/summary/:category", get(handlers::get_summary))
        .route("/comparison/:metric", get(handlers::get_comparison))
        .route("/series/:metric", get(handlers::get_series))
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/macros", get(handlers::get_macros))
        .route("/distribution/:kind", get(handlers::get_distribution))
        .route("/weight-trend", get(handlers::get_weight_trend))
        .route("/heatmap", get(handlers::get_heatmap))
        .route("/entries", post(handlers::create_entry))
        .route("/entries/:category", get(handlers::list_entries))
        .route("/entries/:category/:id", delete(handlers::delete_entry))
        .route("/goals", get(handlers::list_goals).post(handlers::create_goal))
        .route(
            "/goals/:id",
            put(handlers::update_goal).delete(handlers::delete_goal),
        )
        .route("/profile", put(handlers::put_profile));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/users/:user_id", user_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
