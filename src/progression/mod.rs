//! Progression engine: points, level, daily streak and achievement unlocks.
//!
//! One engine serves lessons, practice sessions and Israeli units; the only
//! thing that differs between them is the [`RewardPolicy`]. The engine is a
//! pure function of its inputs. Persisting the outcome, and making the
//! read-compute-write atomic, is the caller's job (see `database::actions`).

pub mod achievements;
pub mod policy;
pub mod streak;

pub use achievements::{AchievementCounters, newly_unlocked};
pub use policy::RewardPolicy;
pub use streak::advance_streak;

use crate::error::{AppError, Result};
use crate::models::{AchievementDefinition, CompletionEvent, UserProgressState, level_for_points};
use chrono::NaiveDate;
use log::debug;
use serde::Serialize;
use std::collections::HashSet;

/// Everything besides the user's own state that a completion is judged against.
pub struct CompletionContext<'a> {
    pub today: NaiveDate,
    pub catalog: &'a [AchievementDefinition],
    pub unlocked: &'a HashSet<i64>,
    /// Distinct passed lessons and units, including this completion.
    pub total_lessons_completed: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct ProgressionOutcome {
    pub points_earned: u32,
    pub new_points: u32,
    pub new_streak: u32,
    pub new_level: u32,
    pub accuracy: u8,
    pub is_perfect: bool,
    pub is_passed: bool,
    #[serde(skip)]
    pub state: UserProgressState,
    pub achievements_unlocked: Vec<AchievementDefinition>,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ProgressionEngine;

impl ProgressionEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn apply_completion(
        &self,
        state: &UserProgressState,
        event: &CompletionEvent,
        context: &CompletionContext<'_>,
    ) -> Result<ProgressionOutcome> {
        if event.accuracy > 100 {
            return Err(AppError::Validation(format!(
                "accuracy must be between 0 and 100, got {}",
                event.accuracy
            )));
        }

        let is_passed = event.is_passed();
        let mut new_state = state.clone();
        let mut points_earned = 0;
        let mut achievements_unlocked = Vec::new();

        if is_passed {
            points_earned = RewardPolicy::for_event(event).points_for(event);
            new_state.points = state.points.saturating_add(points_earned);

            let streak = advance_streak(state.streak, state.last_streak_date, context.today);
            new_state.streak = streak.streak;
            new_state.last_streak_date = streak.last_streak_date;

            achievements_unlocked = newly_unlocked(
                context.catalog,
                context.unlocked,
                AchievementCounters {
                    points: new_state.points,
                    streak: new_state.streak,
                    lessons_completed: context.total_lessons_completed,
                },
            );
        }
        new_state.level = level_for_points(new_state.points);

        debug!(
            "completion {:?}: +{} points, streak {} -> {}, {} achievement(s)",
            event.kind,
            points_earned,
            state.streak,
            new_state.streak,
            achievements_unlocked.len()
        );

        Ok(ProgressionOutcome {
            points_earned,
            new_points: new_state.points,
            new_streak: new_state.streak,
            new_level: new_state.level,
            accuracy: event.accuracy,
            is_perfect: event.is_perfect(),
            is_passed,
            state: new_state,
            achievements_unlocked,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Modality;
    use crate::models::achievement::default_catalog;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn days_ago(n: u64) -> NaiveDate {
        today().checked_sub_days(chrono::Days::new(n)).unwrap()
    }

    fn catalog() -> Vec<AchievementDefinition> {
        default_catalog()
            .into_iter()
            .enumerate()
            .map(|(i, mut a)| {
                a.id = i as i64 + 1;
                a
            })
            .collect()
    }

    fn apply(
        state: &UserProgressState,
        event: CompletionEvent,
        unlocked: &HashSet<i64>,
        lessons: u32,
    ) -> ProgressionOutcome {
        let catalog = catalog();
        let context = CompletionContext {
            today: today(),
            catalog: &catalog,
            unlocked,
            total_lessons_completed: lessons,
        };
        ProgressionEngine::new()
            .apply_completion(state, &event, &context)
            .unwrap()
    }

    #[test]
    fn test_first_perfect_lesson() {
        let outcome = apply(
            &UserProgressState::default(),
            CompletionEvent::lesson(100, 50, true),
            &HashSet::new(),
            1,
        );
        assert_eq!(outcome.points_earned, 60);
        assert_eq!(outcome.new_points, 60);
        assert_eq!(outcome.new_level, 1);
        assert_eq!(outcome.new_streak, 1);
        assert!(outcome.is_perfect);
        assert_eq!(outcome.state.last_streak_date, Some(today()));
        let codes: Vec<&str> = outcome
            .achievements_unlocked
            .iter()
            .map(|a| a.code.as_str())
            .collect();
        assert_eq!(codes, vec!["first-steps"]);
    }

    #[test]
    fn test_practice_blurting() {
        let outcome = apply(
            &UserProgressState::default(),
            CompletionEvent::practice(80, Modality::Blurting),
            &HashSet::new(),
            0,
        );
        assert_eq!(outcome.points_earned, 27);
    }

    #[test]
    fn test_level_tracks_points() {
        let state = UserProgressState {
            points: 90,
            level: 1,
            streak: 1,
            last_streak_date: Some(today()),
        };
        let outcome = apply(&state, CompletionEvent::israeli_unit(100), &HashSet::new(), 0);
        assert_eq!(outcome.new_points, 130);
        assert_eq!(outcome.new_level, 2);
    }

    #[test]
    fn test_streak_increments_then_failed_event_keeps_it() {
        let state = UserProgressState {
            points: 40,
            level: 1,
            streak: 5,
            last_streak_date: Some(days_ago(1)),
        };

        let passed = apply(&state, CompletionEvent::israeli_unit(60), &HashSet::new(), 0);
        assert_eq!(passed.new_streak, 6);

        let failed = apply(&state, CompletionEvent::israeli_unit(40), &HashSet::new(), 0);
        assert!(!failed.is_passed);
        assert_eq!(failed.points_earned, 0);
        assert_eq!(failed.new_streak, 5);
        assert_eq!(failed.state, state);
        assert!(failed.achievements_unlocked.is_empty());
    }

    #[test]
    fn test_streak_resets_after_gap() {
        let state = UserProgressState {
            points: 0,
            level: 1,
            streak: 9,
            last_streak_date: Some(days_ago(3)),
        };
        let outcome = apply(&state, CompletionEvent::practice(90, Modality::None), &HashSet::new(), 0);
        assert_eq!(outcome.new_streak, 1);
    }

    #[test]
    fn test_failed_practice_earns_nothing() {
        for accuracy in 0..50u8 {
            let outcome = apply(
                &UserProgressState::default(),
                CompletionEvent::practice(accuracy, Modality::Blurting),
                &HashSet::new(),
                0,
            );
            assert_eq!(outcome.points_earned, 0);
        }
    }

    #[test]
    fn test_accuracy_out_of_range() {
        let catalog = catalog();
        let unlocked = HashSet::new();
        let context = CompletionContext {
            today: today(),
            catalog: &catalog,
            unlocked: &unlocked,
            total_lessons_completed: 0,
        };
        let err = ProgressionEngine::new()
            .apply_completion(
                &UserProgressState::default(),
                &CompletionEvent::israeli_unit(101),
                &context,
            )
            .unwrap_err();
        assert_eq!(err.code().as_str(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_achievements_unlock_once() {
        let state = UserProgressState {
            points: 95,
            level: 1,
            streak: 0,
            last_streak_date: None,
        };
        let first = apply(&state, CompletionEvent::israeli_unit(100), &HashSet::new(), 1);
        assert_eq!(first.achievements_unlocked.len(), 2);

        let unlocked: HashSet<i64> = first.achievements_unlocked.iter().map(|a| a.id).collect();
        let again = apply(&first.state, CompletionEvent::israeli_unit(100), &unlocked, 1);
        assert!(again.achievements_unlocked.is_empty());
    }

    #[test]
    fn test_points_never_negative_and_level_invariant() {
        let mut state = UserProgressState::default();
        for accuracy in (0..=100u8).step_by(7) {
            for event in [
                CompletionEvent::lesson(accuracy, 40, accuracy % 2 == 0),
                CompletionEvent::practice(accuracy, Modality::Rhythm),
                CompletionEvent::israeli_unit(accuracy),
            ] {
                let outcome = apply(&state, event, &HashSet::new(), 0);
                assert!(outcome.new_points >= state.points);
                assert_eq!(outcome.new_level, outcome.new_points / 100 + 1);
                state = outcome.state;
            }
        }
    }
}
