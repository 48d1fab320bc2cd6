//! Read interfaces the aggregation core depends on.

use crate::errors::StoreError;
use crate::models::{Category, Entries, Goal, GoalType, UserDefaults, UserId};
use crate::period::DateRange;
use async_trait::async_trait;
use chrono::NaiveDate;

#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Entries of `category` logged by `user_id` with a date inside
    /// `range`, ordered by date.
    async fn read_entries(
        &self,
        user_id: UserId,
        category: Category,
        range: DateRange,
    ) -> Result<Entries, StoreError>;
}

#[async_trait]
pub trait GoalStore: Send + Sync {
    /// The goal of `category` and `goal_type` that is active on `on`, if
    /// any. When several qualify the most recently started one wins.
    async fn active_goal(
        &self,
        user_id: UserId,
        category: Category,
        goal_type: GoalType,
        on: NaiveDate,
    ) -> Result<Option<Goal>, StoreError>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn defaults(&self, user_id: UserId) -> Result<Option<UserDefaults>, StoreError>;
}
