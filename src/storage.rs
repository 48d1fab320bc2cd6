use crate::errors::StoreError;
use crate::models::{
    AppData, Category, Entries, Entry, EntryId, Goal, GoalType, GoalUpdate, UserDefaults, UserId,
};
use crate::period::DateRange;
use crate::store::{EntryStore, GoalStore, ProfileStore};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{fs, sync::Mutex};
use tracing::{debug, error};

pub async fn load_data(path: &Path) -> AppData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse data file: {err}");
                AppData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => AppData::default(),
        Err(err) => {
            error!("failed to read data file: {err}");
            AppData::default()
        }
    }
}

pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), StoreError> {
    let payload = serde_json::to_vec_pretty(data)?;
    fs::write(path, payload).await?;
    Ok(())
}

/// Entry store backed by a single JSON document.
///
/// The document lives in memory behind a mutex; every write is persisted
/// before it becomes visible to readers. Without a path the store is
/// memory-only.
#[derive(Clone)]
pub struct JsonStore {
    path: Option<PathBuf>,
    data: Arc<Mutex<AppData>>,
}

impl JsonStore {
    pub async fn open(path: PathBuf) -> Self {
        let data = load_data(&path).await;
        debug!(path = %path.display(), next_id = data.next_id, "opened data file");
        Self {
            path: Some(path),
            data: Arc::new(Mutex::new(data)),
        }
    }

    pub fn in_memory(data: AppData) -> Self {
        Self {
            path: None,
            data: Arc::new(Mutex::new(data)),
        }
    }

    pub async fn snapshot(&self) -> AppData {
        self.data.lock().await.clone()
    }

    /// Store `entry` under a fresh id and return it as stored.
    pub async fn insert_entry(&self, entry: Entry) -> Result<Entry, StoreError> {
        self.update(|data| {
            let id = data.allocate_id();
            Ok(match entry {
                Entry::Water(mut e) => {
                    e.id = id;
                    data.water.push(e.clone());
                    Entry::Water(e)
                }
                Entry::Calories(mut e) => {
                    e.id = id;
                    data.meals.push(e.clone());
                    Entry::Calories(e)
                }
                Entry::Workout(mut e) => {
                    e.id = id;
                    data.workouts.push(e.clone());
                    Entry::Workout(e)
                }
                Entry::Sleep(mut e) => {
                    e.id = id;
                    data.sleep.push(e.clone());
                    Entry::Sleep(e)
                }
                Entry::Weight(mut e) => {
                    e.id = id;
                    data.weights.push(e.clone());
                    Entry::Weight(e)
                }
            })
        })
        .await
    }

    /// Remove the entry; `false` when the user has no such entry.
    pub async fn delete_entry(
        &self,
        user_id: UserId,
        category: Category,
        id: EntryId,
    ) -> Result<bool, StoreError> {
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        let before = total_entries(&next);
        let keep = |entry_user: UserId, entry_id: EntryId| !(entry_user == user_id && entry_id == id);
        match category {
            Category::Water => next.water.retain(|e| keep(e.user_id, e.id)),
            Category::Calories => next.meals.retain(|e| keep(e.user_id, e.id)),
            Category::Workout => next.workouts.retain(|e| keep(e.user_id, e.id)),
            Category::Sleep => next.sleep.retain(|e| keep(e.user_id, e.id)),
            Category::Weight => next.weights.retain(|e| keep(e.user_id, e.id)),
        }
        if total_entries(&next) == before {
            return Ok(false);
        }

        if let Some(path) = &self.path {
            persist_data(path, &next).await?;
        }
        *data = next;
        Ok(true)
    }

    pub async fn insert_goal(&self, goal: Goal) -> Result<Goal, StoreError> {
        self.update(|data| {
            let goal = Goal {
                id: data.allocate_id(),
                ..goal
            };
            data.goals.push(goal.clone());
            Ok(goal)
        })
        .await
    }

    /// Goals of `user_id` in creation order, optionally narrowed by category
    /// and active flag.
    pub async fn goals(
        &self,
        user_id: UserId,
        category: Option<Category>,
        is_active: Option<bool>,
    ) -> Vec<Goal> {
        let data = self.data.lock().await;
        let mut goals: Vec<Goal> = data
            .goals
            .iter()
            .filter(|g| g.user_id == user_id)
            .filter(|g| category.is_none_or(|c| g.category == c))
            .filter(|g| is_active.is_none_or(|active| g.is_active == active))
            .cloned()
            .collect();
        goals.sort_by_key(|g| g.id);
        goals
    }

    /// Apply `patch` to the user's goal `id`. `None` when there is no such
    /// goal; an update that leaves the goal invalid is rejected unsaved.
    pub async fn update_goal(
        &self,
        user_id: UserId,
        id: EntryId,
        patch: &GoalUpdate,
    ) -> Result<Option<Goal>, StoreError> {
        self.update(|data| {
            let Some(goal) = data
                .goals
                .iter_mut()
                .find(|g| g.user_id == user_id && g.id == id)
            else {
                return Ok(None);
            };
            *goal = patch.apply(goal)?;
            Ok(Some(goal.clone()))
        })
        .await
    }

    /// Remove the goal; `false` when the user has no such goal.
    pub async fn delete_goal(&self, user_id: UserId, id: EntryId) -> Result<bool, StoreError> {
        self.update(|data| {
            let before = data.goals.len();
            data.goals.retain(|g| !(g.user_id == user_id && g.id == id));
            Ok(data.goals.len() != before)
        })
        .await
    }

    pub async fn put_defaults(
        &self,
        user_id: UserId,
        defaults: UserDefaults,
    ) -> Result<UserDefaults, StoreError> {
        self.update(|data| {
            data.profiles.insert(user_id, defaults.clone());
            Ok(defaults)
        })
        .await
    }

    /// Apply `change` to a copy of the document, persist the copy, then
    /// publish it. A failed change or write leaves the in-memory state
    /// untouched.
    async fn update<T>(
        &self,
        change: impl FnOnce(&mut AppData) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        let out = change(&mut next)?;
        if let Some(path) = &self.path {
            persist_data(path, &next).await?;
        }
        *data = next;
        Ok(out)
    }
}

fn total_entries(data: &AppData) -> usize {
    data.water.len() + data.meals.len() + data.workouts.len() + data.sleep.len() + data.weights.len()
}

fn select<T: Clone>(
    items: &[T],
    user_id: UserId,
    range: DateRange,
    key: impl Fn(&T) -> (UserId, NaiveDate),
) -> Vec<T> {
    let mut out: Vec<T> = items
        .iter()
        .filter(|item| {
            let (owner, date) = key(item);
            owner == user_id && range.contains(date)
        })
        .cloned()
        .collect();
    out.sort_by_key(|item| key(item).1);
    out
}

#[async_trait]
impl EntryStore for JsonStore {
    async fn read_entries(
        &self,
        user_id: UserId,
        category: Category,
        range: DateRange,
    ) -> Result<Entries, StoreError> {
        let data = self.data.lock().await;
        let entries = match category {
            Category::Water => Entries::Water(select(&data.water, user_id, range, |e| (e.user_id, e.date))),
            Category::Calories => Entries::Calories(select(&data.meals, user_id, range, |e| (e.user_id, e.date))),
            Category::Workout => {
                Entries::Workout(select(&data.workouts, user_id, range, |e| (e.user_id, e.date)))
            }
            Category::Sleep => Entries::Sleep(select(&data.sleep, user_id, range, |e| (e.user_id, e.date))),
            Category::Weight => Entries::Weight(select(&data.weights, user_id, range, |e| (e.user_id, e.date))),
        };
        Ok(entries)
    }
}

#[async_trait]
impl GoalStore for JsonStore {
    async fn active_goal(
        &self,
        user_id: UserId,
        category: Category,
        goal_type: GoalType,
        on: NaiveDate,
    ) -> Result<Option<Goal>, StoreError> {
        let data = self.data.lock().await;
        Ok(data
            .goals
            .iter()
            .filter(|g| g.user_id == user_id && g.category == category && g.goal_type == goal_type)
            .filter(|g| g.applies_on(on))
            .max_by_key(|g| (g.start_date, g.id))
            .cloned())
    }
}

#[async_trait]
impl ProfileStore for JsonStore {
    async fn defaults(&self, user_id: UserId) -> Result<Option<UserDefaults>, StoreError> {
        Ok(self.data.lock().await.profiles.get(&user_id).cloned())
    }
}
