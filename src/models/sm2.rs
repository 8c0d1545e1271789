//! SM-2 (SuperMemo 2) spaced repetition scheduler.
//!
//! All arithmetic is done on integers with the ease factor scaled by 100:
//! - Quality grades 0-2: interval back to 1 day, repetitions reset, EF - 0.20
//! - Quality grades 3-5: 1 day, then 6 days, then previous interval * previous EF
//! - EF never falls below 1.30 and has no ceiling

use super::review_data::{FlashcardReviewState, MIN_EASE_FACTOR};
use chrono::{Days, NaiveDate};

pub const PASS_QUALITY: u8 = 3;
const FAIL_EASE_PENALTY: u32 = 20;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchedulingResult {
    pub interval: u32,
    pub ease_factor: u32,
    pub repetition_count: u32,
    pub next_review: NaiveDate,
}

/// EF delta for a passing grade, ×100: round((0.1 - d * (0.08 + d * 0.02)) * 100), d = 5 - q.
fn ease_change(quality: u8) -> i64 {
    let d = 5 - i64::from(quality.min(5));
    10 - d * (8 + 2 * d)
}

/// Computes the next schedule for one review.
/// quality: 0-5 (0 = complete blackout, 5 = perfect response), not validated here.
pub fn schedule_next(
    quality: u8,
    prev_interval: u32,
    prev_ease_factor: u32,
    repetition_count: u32,
    today: NaiveDate,
) -> SchedulingResult {
    let (interval, ease_factor, repetition_count) = if quality >= PASS_QUALITY {
        let interval = match repetition_count {
            0 => 1,
            1 => 6,
            // round half up
            _ => {
                let scaled = (u64::from(prev_interval) * u64::from(prev_ease_factor) + 50) / 100;
                u32::try_from(scaled).unwrap_or(u32::MAX)
            }
        };
        let ease = (i64::from(prev_ease_factor) + ease_change(quality)).max(MIN_EASE_FACTOR as i64);
        let ease = u32::try_from(ease).unwrap_or(u32::MAX);
        (interval, ease, repetition_count.saturating_add(1))
    } else {
        let ease = prev_ease_factor
            .saturating_sub(FAIL_EASE_PENALTY)
            .max(MIN_EASE_FACTOR);
        (1, ease, 0)
    };

    let next_review = today
        .checked_add_days(Days::new(u64::from(interval)))
        .unwrap_or(NaiveDate::MAX);

    SchedulingResult {
        interval,
        ease_factor,
        repetition_count,
        next_review,
    }
}

/// Applies [`schedule_next`] to a stored review state.
pub fn calculate_next_review(
    review: &FlashcardReviewState,
    quality: u8,
    today: NaiveDate,
) -> FlashcardReviewState {
    let result = schedule_next(
        quality,
        review.interval,
        review.ease_factor,
        review.repetition_count,
        today,
    );

    FlashcardReviewState {
        flashcard_id: review.flashcard_id,
        interval: result.interval,
        ease_factor: result.ease_factor,
        repetition_count: result.repetition_count,
        next_review: result.next_review,
    }
}
