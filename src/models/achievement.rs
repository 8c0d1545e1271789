//! Achievement catalog entries and unlock records.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequirementType {
    Points,
    Streak,
    Lessons,
}

impl RequirementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementType::Points => "points",
            RequirementType::Streak => "streak",
            RequirementType::Lessons => "lessons",
        }
    }
}

impl FromStr for RequirementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "points" => Ok(RequirementType::Points),
            "streak" => Ok(RequirementType::Streak),
            "lessons" => Ok(RequirementType::Lessons),
            other => Err(format!("unknown requirement type '{}'", other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementDefinition {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub description: String,
    pub requirement_type: RequirementType,
    pub requirement_value: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnlockedAchievement {
    pub achievement: AchievementDefinition,
    pub unlocked_at: DateTime<Utc>,
}

/// Built-in catalog seeded into a fresh database. Ids are assigned on insert.
pub fn default_catalog() -> Vec<AchievementDefinition> {
    let entry = |code: &str, name: &str, description: &str, kind, value| AchievementDefinition {
        id: 0,
        code: code.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        requirement_type: kind,
        requirement_value: value,
    };

    vec![
        entry("first-steps", "First Steps", "Complete your first lesson", RequirementType::Lessons, 1),
        entry("scribe", "Scribe", "Complete 5 lessons", RequirementType::Lessons, 5),
        entry("centurion", "Centurion", "Earn 100 points", RequirementType::Points, 100),
        entry("treasury", "Treasury", "Earn 500 points", RequirementType::Points, 500),
        entry("three-days", "Threefold Cord", "Keep a 3 day streak", RequirementType::Streak, 3),
        entry("sabbath-week", "Sabbath Week", "Keep a 7 day streak", RequirementType::Streak, 7),
    ]
}
