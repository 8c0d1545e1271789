use chrono::NaiveDate;

pub const DEFAULT_EASE_FACTOR: u32 = 250;
pub const MIN_EASE_FACTOR: u32 = 130;

/// Per user and card scheduling record. `ease_factor` is scaled by 100.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlashcardReviewState {
    pub flashcard_id: i64,
    pub interval: u32,
    pub ease_factor: u32,
    pub repetition_count: u32,
    pub next_review: NaiveDate,
}

impl FlashcardReviewState {
    /// State of a card the learner has never reviewed; due immediately.
    pub fn first_exposure(flashcard_id: i64, today: NaiveDate) -> Self {
        Self {
            flashcard_id,
            interval: 0,
            ease_factor: DEFAULT_EASE_FACTOR,
            repetition_count: 0,
            next_review: today,
        }
    }

    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.next_review <= today
    }
}
