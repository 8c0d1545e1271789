//! Completion and review handlers.
//!
//! Each handler runs read-state, compute, write-state and the achievement
//! unlock inserts inside a single `BEGIN IMMEDIATE` transaction, so two
//! concurrent submissions for the same learner are serialized by SQLite and
//! cannot both award points from the same stale state.

use super::{catalog, db, flashcards, users};
use crate::error::{AppError, Result};
use crate::models::sm2::calculate_next_review;
use crate::models::{CompletionEvent, FlashcardReviewState, Modality, UserProgressState};
use crate::progression::{CompletionContext, ProgressionEngine, ProgressionOutcome};
use chrono::{NaiveDate, Utc};
use log::info;
use rusqlite::{Connection, Transaction, TransactionBehavior, params};

fn validate_accuracy(accuracy: u8) -> Result<()> {
    if accuracy > 100 {
        return Err(AppError::Validation(format!(
            "accuracy must be between 0 and 100, got {}",
            accuracy
        )));
    }
    Ok(())
}

fn begin(conn: &mut Connection) -> Result<Transaction<'_>> {
    Ok(conn.transaction_with_behavior(TransactionBehavior::Immediate)?)
}

fn has_passed_lesson(conn: &Connection, user_id: i64, lesson_id: i64) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM lesson_completions WHERE user_id = ?1 AND lesson_id = ?2 AND passed = 1",
        params![user_id, lesson_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn has_passed_unit(conn: &Connection, user_id: i64, unit_id: i64) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM unit_completions WHERE user_id = ?1 AND unit_id = ?2 AND passed = 1",
        params![user_id, unit_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Distinct lessons and Israeli units the user has passed.
pub fn count_completed_activities(conn: &Connection, user_id: i64) -> Result<u32> {
    let count: u32 = conn.query_row(
        "SELECT
            (SELECT COUNT(DISTINCT lesson_id) FROM lesson_completions WHERE user_id = ?1 AND passed = 1)
          + (SELECT COUNT(DISTINCT unit_id) FROM unit_completions WHERE user_id = ?1 AND passed = 1)",
        params![user_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Runs the engine against the stored state and persists its outcome.
/// Only achievements actually inserted by this call are reported back.
fn apply_and_store(
    tx: &Transaction<'_>,
    user_id: i64,
    state: &UserProgressState,
    event: &CompletionEvent,
    today: NaiveDate,
    total_lessons_completed: u32,
) -> Result<ProgressionOutcome> {
    let catalog = catalog::list_achievements(tx)?;
    let unlocked = catalog::unlocked_achievement_ids(tx, user_id)?;
    let context = CompletionContext {
        today,
        catalog: &catalog,
        unlocked: &unlocked,
        total_lessons_completed,
    };

    let mut outcome = ProgressionEngine::new().apply_completion(state, event, &context)?;
    users::save_user_progress(tx, user_id, &outcome.state)?;

    let now = Utc::now();
    let mut granted = Vec::with_capacity(outcome.achievements_unlocked.len());
    for achievement in outcome.achievements_unlocked.drain(..) {
        if catalog::unlock_achievement(tx, user_id, achievement.id, now)? {
            info!("User {} unlocked '{}'", user_id, achievement.name);
            granted.push(achievement);
        }
    }
    outcome.achievements_unlocked = granted;

    Ok(outcome)
}

pub fn complete_lesson(
    conn: &mut Connection,
    user_id: i64,
    lesson_id: i64,
    accuracy: u8,
) -> Result<ProgressionOutcome> {
    validate_accuracy(accuracy)?;
    let tx = begin(conn)?;

    let state = users::get_user_progress(&tx, user_id)?;
    let lesson = catalog::get_lesson(&tx, lesson_id)?;
    let today = db::get_current_date(&tx)?;

    let is_first_completion = !has_passed_lesson(&tx, user_id, lesson_id)?;
    let event = CompletionEvent::lesson(accuracy, lesson.xp_reward, is_first_completion);

    let mut total = count_completed_activities(&tx, user_id)?;
    if event.is_passed() && is_first_completion {
        total += 1;
    }

    let outcome = apply_and_store(&tx, user_id, &state, &event, today, total)?;

    tx.execute(
        "INSERT INTO lesson_completions (user_id, lesson_id, accuracy, passed, points_earned, completed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user_id,
            lesson_id,
            accuracy,
            outcome.is_passed,
            outcome.points_earned,
            Utc::now()
        ],
    )?;
    tx.commit()?;

    info!(
        "User {} completed lesson '{}' at {}%: +{} points (total {}, level {}, streak {})",
        user_id,
        lesson.title,
        accuracy,
        outcome.points_earned,
        outcome.new_points,
        outcome.new_level,
        outcome.new_streak
    );
    Ok(outcome)
}

pub fn complete_practice(
    conn: &mut Connection,
    user_id: i64,
    modality: Modality,
    accuracy: u8,
) -> Result<ProgressionOutcome> {
    validate_accuracy(accuracy)?;
    let tx = begin(conn)?;

    let state = users::get_user_progress(&tx, user_id)?;
    let today = db::get_current_date(&tx)?;
    let event = CompletionEvent::practice(accuracy, modality);
    let total = count_completed_activities(&tx, user_id)?;

    let outcome = apply_and_store(&tx, user_id, &state, &event, today, total)?;

    tx.execute(
        "INSERT INTO practice_sessions (user_id, modality, accuracy, passed, points_earned, completed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user_id,
            modality.as_str(),
            accuracy,
            outcome.is_passed,
            outcome.points_earned,
            Utc::now()
        ],
    )?;
    tx.commit()?;

    info!(
        "User {} finished {} practice at {}%: +{} points",
        user_id, modality, accuracy, outcome.points_earned
    );
    Ok(outcome)
}

pub fn complete_israeli_unit(
    conn: &mut Connection,
    user_id: i64,
    unit_id: i64,
    accuracy: u8,
) -> Result<ProgressionOutcome> {
    validate_accuracy(accuracy)?;
    let tx = begin(conn)?;

    let state = users::get_user_progress(&tx, user_id)?;
    let unit = catalog::get_unit(&tx, unit_id)?;
    let today = db::get_current_date(&tx)?;
    let event = CompletionEvent::israeli_unit(accuracy);

    let mut total = count_completed_activities(&tx, user_id)?;
    if event.is_passed() && !has_passed_unit(&tx, user_id, unit_id)? {
        total += 1;
    }

    let outcome = apply_and_store(&tx, user_id, &state, &event, today, total)?;

    tx.execute(
        "INSERT INTO unit_completions (user_id, unit_id, accuracy, passed, points_earned, completed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user_id,
            unit_id,
            accuracy,
            outcome.is_passed,
            outcome.points_earned,
            Utc::now()
        ],
    )?;
    tx.commit()?;

    info!(
        "User {} completed unit '{}' at {}%: +{} points",
        user_id, unit.title, accuracy, outcome.points_earned
    );
    Ok(outcome)
}

/// Grades one flashcard (quality 0-5) and stores its next schedule.
pub fn submit_review(
    conn: &mut Connection,
    user_id: i64,
    flashcard_id: i64,
    quality: u8,
) -> Result<FlashcardReviewState> {
    if quality > 5 {
        return Err(AppError::Validation(format!(
            "quality must be between 0 and 5, got {}",
            quality
        )));
    }
    let tx = begin(conn)?;

    users::get_user_progress(&tx, user_id)?;
    let today = db::get_current_date(&tx)?;
    let current = flashcards::get_review_state(&tx, user_id, flashcard_id, today)?;
    let next = calculate_next_review(&current, quality, today);
    flashcards::save_review_state(&tx, user_id, &next)?;
    tx.commit()?;

    info!(
        "User {} reviewed card {} with quality {}: next review {} (interval {}, ease {})",
        user_id, flashcard_id, quality, next.next_review, next.interval, next.ease_factor
    );
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::db::{
        advance_day, init_database, open_in_memory, set_current_date, sync_current_date,
    };
    use std::collections::HashSet;
    use std::thread;
    use crate::database::flashcards::{get_flashcards_due_for_review, import_deck};
    use crate::models::deck::starter_deck;

    fn setup() -> (Connection, i64) {
        let conn = open_in_memory().unwrap();
        catalog::seed_defaults(&conn).unwrap();
        set_current_date(&conn, NaiveDate::from_ymd_opt(2024, 9, 1).unwrap()).unwrap();
        let user = users::create_user(&conn, "esther").unwrap();
        (conn, user)
    }

    fn lesson_ids(conn: &Connection) -> Vec<i64> {
        catalog::list_lessons(conn)
            .unwrap()
            .into_iter()
            .map(|l| l.id)
            .collect()
    }

    fn codes(outcome: &ProgressionOutcome) -> Vec<&str> {
        outcome
            .achievements_unlocked
            .iter()
            .map(|a| a.code.as_str())
            .collect()
    }

    #[test]
    fn test_first_lesson_perfect() {
        let (mut conn, user) = setup();
        let lesson = lesson_ids(&conn)[0];

        let outcome = complete_lesson(&mut conn, user, lesson, 100).unwrap();
        assert_eq!(outcome.points_earned, 60);
        assert_eq!(outcome.new_streak, 1);
        assert_eq!(codes(&outcome), vec!["first-steps"]);

        let stored = users::get_user_progress(&conn, user).unwrap();
        assert_eq!(stored.points, 60);
        assert_eq!(stored.level, 1);
    }

    #[test]
    fn test_repeat_lesson_small_reward() {
        let (mut conn, user) = setup();
        let lesson = lesson_ids(&conn)[0];

        complete_lesson(&mut conn, user, lesson, 100).unwrap();
        let again = complete_lesson(&mut conn, user, lesson, 100).unwrap();
        assert_eq!(again.points_earned, 5);
        assert!(again.achievements_unlocked.is_empty());
        assert_eq!(count_completed_activities(&conn, user).unwrap(), 1);
    }

    #[test]
    fn test_failed_lesson_then_pass_is_first_completion() {
        let (mut conn, user) = setup();
        let lesson = lesson_ids(&conn)[0];

        let failed = complete_lesson(&mut conn, user, lesson, 30).unwrap();
        assert!(!failed.is_passed);
        assert_eq!(failed.points_earned, 0);
        assert_eq!(failed.new_streak, 0);

        let passed = complete_lesson(&mut conn, user, lesson, 80).unwrap();
        assert_eq!(passed.points_earned, 40);
    }

    #[test]
    fn test_streak_across_days() {
        let (mut conn, user) = setup();

        complete_practice(&mut conn, user, Modality::Rhythm, 90).unwrap();
        advance_day(&conn).unwrap();
        complete_practice(&mut conn, user, Modality::Build, 90).unwrap();
        advance_day(&conn).unwrap();
        let third = complete_practice(&mut conn, user, Modality::None, 90).unwrap();

        assert_eq!(third.new_streak, 3);
        assert_eq!(codes(&third), vec!["three-days"]);

        advance_day(&conn).unwrap();
        advance_day(&conn).unwrap();
        let failed = complete_practice(&mut conn, user, Modality::None, 20).unwrap();
        assert_eq!(failed.new_streak, 3);
        let after_gap = complete_practice(&mut conn, user, Modality::None, 90).unwrap();
        assert_eq!(after_gap.new_streak, 1);
    }

    #[test]
    fn test_streak_continues_after_calendar_sync() {
        let (mut conn, user) = setup();

        complete_practice(&mut conn, user, Modality::Rhythm, 90).unwrap();
        let next = NaiveDate::from_ymd_opt(2024, 9, 2).unwrap();
        assert_eq!(sync_current_date(&conn, next).unwrap(), next);

        let second = complete_practice(&mut conn, user, Modality::Rhythm, 90).unwrap();
        assert_eq!(second.new_streak, 2);
    }

    #[test]
    fn test_concurrent_completions_serialize() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hebrew.sqlite3");

        let conn = init_database(&path).unwrap();
        catalog::seed_defaults(&conn).unwrap();
        let user = users::create_user(&conn, "miriam").unwrap();
        let unit = catalog::list_units(&conn).unwrap()[0].id;

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let mut conn = init_database(&path).unwrap();
                thread::spawn(move || complete_israeli_unit(&mut conn, user, unit, 100).unwrap())
            })
            .collect();
        let outcomes: Vec<ProgressionOutcome> =
            workers.into_iter().map(|w| w.join().unwrap()).collect();

        let reported: usize = outcomes.iter().map(|o| o.achievements_unlocked.len()).sum();
        assert_eq!(reported, 2);

        let stored = users::get_user_progress(&conn, user).unwrap();
        assert_eq!(stored.points, 320);
        assert_eq!(stored.level, 4);

        let unlocked = catalog::list_unlocked_achievements(&conn, user).unwrap();
        let ids: HashSet<i64> = unlocked.iter().map(|a| a.achievement.id).collect();
        assert_eq!(unlocked.len(), 2);
        assert_eq!(ids.len(), 2);

        let completions: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM unit_completions WHERE user_id = ?1",
                [user],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(completions, 8);
    }

    #[test]
    fn test_points_achievement_and_level() {
        let (mut conn, user) = setup();
        let units: Vec<i64> = catalog::list_units(&conn)
            .unwrap()
            .into_iter()
            .map(|u| u.id)
            .collect();

        let first = complete_israeli_unit(&mut conn, user, units[0], 100).unwrap();
        assert_eq!(first.points_earned, 40);
        assert_eq!(codes(&first), vec!["first-steps"]);

        let second = complete_israeli_unit(&mut conn, user, units[1], 100).unwrap();
        let third = complete_israeli_unit(&mut conn, user, units[1], 100).unwrap();
        assert_eq!(second.new_points, 80);
        assert_eq!(third.new_points, 120);
        assert_eq!(third.new_level, 2);
        assert_eq!(codes(&third), vec!["centurion"]);
        assert_eq!(count_completed_activities(&conn, user).unwrap(), 2);

        let unlocked = catalog::list_unlocked_achievements(&conn, user).unwrap();
        assert_eq!(unlocked.len(), 2);
    }

    #[test]
    fn test_errors() {
        let (mut conn, user) = setup();
        let lesson = lesson_ids(&conn)[0];

        let err = complete_lesson(&mut conn, user, lesson, 101).unwrap_err();
        assert_eq!(err.code().as_str(), "VALIDATION_ERROR");
        let err = complete_lesson(&mut conn, 999, lesson, 80).unwrap_err();
        assert_eq!(err.code().as_str(), "USER_NOT_FOUND");
        let err = complete_lesson(&mut conn, user, 999, 80).unwrap_err();
        assert_eq!(err.code().as_str(), "LESSON_NOT_FOUND");
        let err = complete_israeli_unit(&mut conn, user, 999, 80).unwrap_err();
        assert_eq!(err.code().as_str(), "UNIT_NOT_FOUND");

        // nothing was written by the failed calls
        assert_eq!(
            users::get_user_progress(&conn, user).unwrap(),
            UserProgressState::default()
        );
    }

    #[test]
    fn test_submit_review_schedules_card() {
        let (mut conn, user) = setup();
        import_deck(&mut conn, &starter_deck()).unwrap();
        let today = db::get_current_date(&conn).unwrap();
        let (_, card) = get_flashcards_due_for_review(&conn, user, "Genesis 1", today)
            .unwrap()
            .remove(0);

        let first = submit_review(&mut conn, user, card.flashcard_id, 5).unwrap();
        assert_eq!(first.interval, 1);
        assert_eq!(first.ease_factor, 260);
        assert_eq!(first.next_review, today.succ_opt().unwrap());

        let due_now = get_flashcards_due_for_review(&conn, user, "Genesis 1", today).unwrap();
        assert!(due_now.iter().all(|(_, r)| r.flashcard_id != card.flashcard_id));

        let failed = submit_review(&mut conn, user, card.flashcard_id, 1).unwrap();
        assert_eq!(failed.repetition_count, 0);
        assert_eq!(failed.ease_factor, 240);

        let err = submit_review(&mut conn, user, card.flashcard_id, 6).unwrap_err();
        assert_eq!(err.code().as_str(), "VALIDATION_ERROR");
        let err = submit_review(&mut conn, user, 9999, 4).unwrap_err();
        assert_eq!(err.code().as_str(), "FLASHCARD_NOT_FOUND");
    }
}
