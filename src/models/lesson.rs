//! Lessons and Israeli (modern Hebrew) immersion units.
use super::Exercise;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Lesson {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub xp_reward: u32,
    pub exercises: Vec<Exercise>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IsraeliUnit {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub exercises: Vec<Exercise>,
}
