use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct GoalProgress {
    target: f64,
    percentage: i64,
    source: String,
}

#[derive(Debug, Deserialize)]
struct PeriodSummary {
    value: f64,
    entry_count: usize,
    goal: GoalProgress,
}

#[derive(Debug, Deserialize)]
struct SeriesPoint {
    label: String,
    value: f64,
}

#[derive(Debug, Deserialize)]
struct Series {
    points: Vec<SeriesPoint>,
}

#[derive(Debug, Deserialize)]
struct Change {
    status: String,
    value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ComparisonDelta {
    delta: f64,
    change: Change,
}

#[derive(Debug, Deserialize)]
struct StoredEntry {
    id: u64,
    category: String,
}

#[derive(Debug, Deserialize)]
struct StoredGoal {
    id: u64,
    is_active: bool,
    target_value: f64,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

// Each test logs under its own user so they can share one server.
static NEXT_USER: AtomicU64 = AtomicU64::new(100);

const DAY: &str = "2026-01-05";

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("health_dashboard_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

fn next_user() -> u64 {
    NEXT_USER.fetch_add(1, Ordering::SeqCst)
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/health")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let data_path = unique_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_health_dashboard"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", data_path)
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn log_entry(client: &Client, server: &TestServer, user: u64, body: serde_json::Value) -> StoredEntry {
    let response = client
        .post(format!("{}/api/users/{user}/entries", server.base_url))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.unwrap()
}

async fn summary(client: &Client, server: &TestServer, user: u64, query: &str) -> PeriodSummary {
    client
        .get(format!("{}/api/users/{user}/summary/{query}", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn get_json(client: &Client, url: String) -> serde_json::Value {
    let response = client.get(url).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    response.json().await.unwrap()
}

#[tokio::test]
async fn http_water_entries_roll_up_into_day_summary() {
    let server = shared_server().await;
    let client = Client::new();
    let user = next_user();

    for amount in [250, 500] {
        let stored = log_entry(
            &client,
            &server,
            user,
            json!({ "category": "water", "date": DAY, "amount_ml": amount }),
        )
        .await;
        assert_eq!(stored.category, "water");
    }

    let day = summary(&client, &server, user, &format!("water?period=day&date={DAY}")).await;
    assert_eq!(day.value, 750.0);
    assert_eq!(day.entry_count, 2);
    assert_eq!(day.goal.target, 3000.0);
    assert_eq!(day.goal.percentage, 25);
}

#[tokio::test]
async fn http_empty_sleep_week_series_has_seven_zero_points() {
    let server = shared_server().await;
    let client = Client::new();
    let user = next_user();

    let series: Series = client
        .get(format!(
            "{}/api/users/{user}/series/sleep?period=week&date={DAY}",
            server.base_url
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let labels: Vec<_> = series.points.iter().map(|p| p.label.as_str()).collect();
    assert_eq!(labels, ["Tue", "Wed", "Thu", "Fri", "Sat", "Sun", "Mon"]);
    assert!(series.points.iter().all(|p| p.value == 0.0));
}

#[tokio::test]
async fn http_week_over_week_workout_minutes() {
    let server = shared_server().await;
    let client = Client::new();
    let user = next_user();

    for (date, minutes) in [
        ("2026-01-05", 90),
        ("2026-01-01", 90),
        ("2025-12-29", 60),
        ("2025-12-23", 60),
    ] {
        log_entry(
            &client,
            &server,
            user,
            json!({
                "category": "workout",
                "date": date,
                "workout_type": "cardio",
                "duration_minutes": minutes,
                "calories_burned": 300.0
            }),
        )
        .await;
    }

    let delta: ComparisonDelta = client
        .get(format!(
            "{}/api/users/{user}/comparison/workout_minutes?period=week&date={DAY}",
            server.base_url
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(delta.delta, 60.0);
    assert_eq!(delta.change.status, "percent");
    assert_eq!(delta.change.value, Some(50.0));

    let fresh: ComparisonDelta = client
        .get(format!(
            "{}/api/users/{}/comparison/water?period=week&date={DAY}",
            server.base_url,
            next_user()
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fresh.change.status, "no_previous_data");
    assert_eq!(fresh.change.value, None);
}

#[tokio::test]
async fn http_deleted_entry_no_longer_counts() {
    let server = shared_server().await;
    let client = Client::new();
    let user = next_user();

    log_entry(
        &client,
        &server,
        user,
        json!({ "category": "meal", "date": DAY, "meal_type": "lunch", "calories": 700.0 }),
    )
    .await;
    let extra = log_entry(
        &client,
        &server,
        user,
        json!({ "category": "calories", "date": DAY, "meal_type": "snack", "calories": 300.0 }),
    )
    .await;

    let before = summary(&client, &server, user, &format!("calories?period=day&date={DAY}")).await;
    assert_eq!(before.value, 1000.0);
    assert_eq!(before.goal.percentage, 50);

    let url = format!("{}/api/users/{user}/entries/calories/{}", server.base_url, extra.id);
    let response = client.delete(&url).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let after = summary(&client, &server, user, &format!("calories?period=day&date={DAY}")).await;
    assert_eq!(after.value, 700.0);

    let again = client.delete(&url).send().await.unwrap();
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn http_rejects_bad_requests() {
    let server = shared_server().await;
    let client = Client::new();
    let user = next_user();

    let bad_period = client
        .get(format!(
            "{}/api/users/{user}/summary/water?period=fortnight",
            server.base_url
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_period.status(), StatusCode::BAD_REQUEST);

    let bad_category = client
        .get(format!("{}/api/users/{user}/summary/steps", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_category.status(), StatusCode::BAD_REQUEST);

    let bad_entry = client
        .post(format!("{}/api/users/{user}/entries", server.base_url))
        .json(&json!({ "category": "weight", "date": DAY, "weight_kg": 0.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_entry.status(), StatusCode::BAD_REQUEST);

    let negative_amount = client
        .post(format!("{}/api/users/{user}/entries", server.base_url))
        .json(&json!({ "category": "water", "date": DAY, "amount_ml": -250 }))
        .send()
        .await
        .unwrap();
    assert_eq!(negative_amount.status(), StatusCode::BAD_REQUEST);

    let bad_range = client
        .get(format!(
            "{}/api/users/{user}/entries/water?start_date=2026-01-05&end_date=2026-01-01",
            server.base_url
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_range.status(), StatusCode::BAD_REQUEST);

    let bad_distribution = client
        .get(format!("{}/api/users/{user}/distribution/sleep-stages", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_distribution.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn http_goal_and_profile_set_the_target() {
    let server = shared_server().await;
    let client = Client::new();
    let user = next_user();
    let base = format!("{}/api/users/{user}", server.base_url);
    let query = format!("water?period=day&date={DAY}");

    log_entry(
        &client,
        &server,
        user,
        json!({ "category": "water", "date": DAY, "amount_ml": 1000 }),
    )
    .await;
    let system = summary(&client, &server, user, &query).await;
    assert_eq!(system.goal.source, "system");
    assert_eq!(system.goal.target, 3000.0);

    let response = client
        .put(format!("{base}/profile"))
        .json(&json!({ "daily_water_goal_ml": 2000.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let profile = summary(&client, &server, user, &query).await;
    assert_eq!(profile.goal.source, "profile");
    assert_eq!(profile.goal.percentage, 50);

    let response = client
        .post(format!("{base}/goals"))
        .json(&json!({
            "category": "water",
            "goal_type": "daily",
            "target_value": 4000.0,
            "start_date": "2026-01-01"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let goal: StoredGoal = response.json().await.unwrap();
    let explicit = summary(&client, &server, user, &query).await;
    assert_eq!(explicit.goal.source, "goal");
    assert_eq!(explicit.goal.target, 4000.0);
    assert_eq!(explicit.goal.percentage, 25);

    let response = client
        .put(format!("{base}/goals/{}", goal.id))
        .json(&json!({ "is_active": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let paused: StoredGoal = response.json().await.unwrap();
    assert!(!paused.is_active);
    assert_eq!(paused.target_value, 4000.0);
    let fallback = summary(&client, &server, user, &query).await;
    assert_eq!(fallback.goal.source, "profile");

    let listed: Vec<StoredGoal> = client
        .get(format!("{base}/goals?category=water&is_active=false"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, goal.id);

    let url = format!("{base}/goals/{}", goal.id);
    assert_eq!(client.delete(&url).send().await.unwrap().status(), StatusCode::NO_CONTENT);
    assert_eq!(client.delete(&url).send().await.unwrap().status(), StatusCode::NOT_FOUND);
    let missing = client
        .put(&url)
        .json(&json!({ "target_value": 1.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn http_lists_entries_within_dates() {
    let server = shared_server().await;
    let client = Client::new();
    let user = next_user();

    let mut ids = Vec::new();
    for date in ["2026-01-02", "2026-01-04", "2026-01-09"] {
        let stored = log_entry(
            &client,
            &server,
            user,
            json!({ "category": "weight", "date": date, "weight_kg": 80.0 }),
        )
        .await;
        ids.push(stored.id);
    }

    let listed: Vec<StoredEntry> = client
        .get(format!(
            "{}/api/users/{user}/entries/weight?start_date=2026-01-01&end_date=2026-01-05",
            server.base_url
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let listed_ids: Vec<_> = listed.iter().map(|e| e.id).collect();
    assert_eq!(listed_ids, &ids[..2]);
    assert!(listed.iter().all(|e| e.category == "weight"));

    let all: Vec<StoredEntry> = client
        .get(format!("{}/api/users/{user}/entries/weight", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn http_breakdown_routes_read_logged_entries() {
    let server = shared_server().await;
    let client = Client::new();
    let user = next_user();
    let base = format!("{}/api/users/{user}", server.base_url);

    for body in [
        json!({
            "category": "meal", "date": DAY, "time": "12:30:00", "meal_type": "lunch",
            "calories": 600.0, "protein_g": 30.0, "carbs_g": 60.0, "fat_g": 10.0
        }),
        json!({
            "category": "workout", "date": DAY, "workout_type": "strength",
            "duration_minutes": 45, "start_time": "07:00:00"
        }),
        json!({ "category": "weight", "date": "2026-01-01", "weight_kg": 82.0 }),
        json!({ "category": "weight", "date": DAY, "weight_kg": 81.0 }),
    ] {
        log_entry(&client, &server, user, body).await;
    }

    let dashboard = get_json(&client, format!("{base}/dashboard?period=week&date={DAY}")).await;
    assert_eq!(dashboard["summaries"].as_array().unwrap().len(), 5);
    assert_eq!(dashboard["comparisons"].as_array().unwrap().len(), 4);

    let macros = get_json(&client, format!("{base}/macros?period=week&date={DAY}")).await;
    assert_eq!(macros["total_meals"], 1);
    assert_eq!(macros["percentages"]["carbs"], 60.0);

    let meals = get_json(&client, format!("{base}/distribution/meal-types?period=week&date={DAY}")).await;
    assert_eq!(meals, json!([{ "name": "lunch", "value": 600.0 }]));
    let workouts =
        get_json(&client, format!("{base}/distribution/workout-types?period=week&date={DAY}")).await;
    assert_eq!(workouts, json!([{ "name": "strength", "value": 45.0 }]));

    let trend = get_json(&client, format!("{base}/weight-trend?period=week&date={DAY}")).await;
    assert_eq!(trend["total_records"], 2);
    assert_eq!(trend["statistics"]["weight_change_kg"], -1.0);

    let heatmap = get_json(&client, format!("{base}/heatmap?period=week&date={DAY}")).await;
    let cells = heatmap.as_array().unwrap();
    assert_eq!(cells.len(), 56);
    let total: u64 = cells.iter().map(|c| c["value"].as_u64().unwrap()).sum();
    assert_eq!(total, 2);
}
