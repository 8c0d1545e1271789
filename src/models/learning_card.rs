//! Wrapper for a flashcard inside a review session.
use super::{Flashcard, FlashcardReviewState};
use chrono::{DateTime, Utc};

#[derive(Clone, Debug)]
pub struct LearningCard {
    pub flashcard: Flashcard,
    pub review: FlashcardReviewState,
    pub is_learned: bool,
    pub last_quality: Option<u8>,
    pub last_learned_at: Option<DateTime<Utc>>,
}

impl LearningCard {
    pub fn new(flashcard: Flashcard, review: FlashcardReviewState) -> Self {
        Self {
            flashcard,
            review,
            is_learned: false,
            last_quality: None,
            last_learned_at: None,
        }
    }

    pub fn flashcard_id(&self) -> i64 {
        self.review.flashcard_id
    }

    pub fn record_grade(&mut self, quality: u8, review: FlashcardReviewState) {
        self.last_quality = Some(quality);
        self.review = review;
        if quality >= super::sm2::PASS_QUALITY {
            self.is_learned = true;
            self.last_learned_at = Some(Utc::now());
        } else {
            self.is_learned = false;
        }
    }
}
