//! Health and fitness analytics: turns logged workouts, meals, sleep,
//! water and weight into goal progress, period comparisons and chart
//! series, served over a small JSON API.

pub mod aggregator;
pub mod app;
pub mod breakdown;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod period;
pub mod series;
pub mod state;
pub mod storage;
pub mod store;
pub mod summary;

pub use aggregator::Aggregator;
pub use app::router;
pub use config::Config;
pub use errors::{AnalyticsError, StoreError};
pub use state::AppState;
pub use storage::JsonStore;
