use crate::models::{AchievementDefinition, RequirementType};
use std::collections::HashSet;

/// Counters an achievement threshold can be measured against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AchievementCounters {
    pub points: u32,
    pub streak: u32,
    pub lessons_completed: u32,
}

impl AchievementCounters {
    pub fn value_for(&self, requirement: RequirementType) -> u32 {
        match requirement {
            RequirementType::Points => self.points,
            RequirementType::Streak => self.streak,
            RequirementType::Lessons => self.lessons_completed,
        }
    }
}

/// Catalog entries not yet in `unlocked` whose threshold is met.
pub fn newly_unlocked(
    catalog: &[AchievementDefinition],
    unlocked: &HashSet<i64>,
    counters: AchievementCounters,
) -> Vec<AchievementDefinition> {
    catalog
        .iter()
        .filter(|a| !unlocked.contains(&a.id))
        .filter(|a| counters.value_for(a.requirement_type) >= a.requirement_value)
        .cloned()
        .collect()
}
