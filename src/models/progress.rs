//! A learner's cumulative standing: points, level and daily streak.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const POINTS_PER_LEVEL: u32 = 100;

/// Level is always derived from points, never tracked on its own.
pub fn level_for_points(points: u32) -> u32 {
    points / POINTS_PER_LEVEL + 1
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProgressState {
    pub points: u32,
    pub level: u32,
    pub streak: u32,
    pub last_streak_date: Option<NaiveDate>,
}

impl Default for UserProgressState {
    fn default() -> Self {
        Self {
            points: 0,
            level: 1,
            streak: 0,
            last_streak_date: None,
        }
    }
}

impl UserProgressState {
    /// Points still needed to reach the next level.
    pub fn points_to_next_level(&self) -> u32 {
        self.level * POINTS_PER_LEVEL - self.points.min(self.level * POINTS_PER_LEVEL)
    }
}
