//! Flashcard review session over the cards due today.
//! Cards that aren't recalled (grade < 3) are repeated in later rounds.

use super::{Flashcard, FlashcardReviewState, LearningCard};
use crate::database::actions;
use crate::error::{AppError, Result};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

pub struct LearningSession {
    pub deck_name: String,
    pub user_id: i64,
    pub all_cards: Vec<LearningCard>,
    pub current_round_cards: Vec<usize>,
    pub current_index: usize,
    pub show_answer: bool,
    pub conn: Arc<Mutex<Connection>>,
    pub round_number: usize,
}

impl LearningSession {
    pub fn new_from_due_cards(
        deck_name: String,
        user_id: i64,
        cards: Vec<(Flashcard, FlashcardReviewState)>,
        conn: Arc<Mutex<Connection>>,
    ) -> Self {
        let all_cards: Vec<LearningCard> = cards
            .into_iter()
            .map(|(card, review)| LearningCard::new(card, review))
            .collect();
        let indices: Vec<usize> = (0..all_cards.len()).collect();

        Self {
            deck_name,
            user_id,
            all_cards,
            current_round_cards: indices,
            current_index: 0,
            show_answer: false,
            conn,
            round_number: 1,
        }
    }

    pub fn current_card(&self) -> Option<&LearningCard> {
        self.current_round_cards
            .get(self.current_index)
            .and_then(|&idx| self.all_cards.get(idx))
    }

    pub fn toggle_answer(&mut self) {
        self.show_answer = !self.show_answer;
    }

    pub fn next_card(&mut self) {
        if self.current_index + 1 < self.current_round_cards.len() {
            self.current_index += 1;
            self.show_answer = false;
        } else {
            self.start_next_round();
        }
    }

    /// Starts a new round with the cards that were not recalled.
    /// If there are none, the session is complete.
    fn start_next_round(&mut self) {
        let failed: Vec<usize> = self
            .current_round_cards
            .iter()
            .copied()
            .filter(|&idx| self.all_cards.get(idx).is_some_and(|c| !c.is_learned))
            .collect();

        if !failed.is_empty() {
            self.current_round_cards = failed;
            self.current_index = 0;
            self.show_answer = false;
            self.round_number += 1;
        }
    }

    /// Grades the current card, persisting its next schedule.
    pub fn grade_current_card(&mut self, quality: u8) -> Result<()> {
        let Some(&idx) = self.current_round_cards.get(self.current_index) else {
            return Ok(());
        };
        let Some(card) = self.all_cards.get_mut(idx) else {
            return Ok(());
        };

        let next = {
            let mut conn = self
                .conn
                .lock()
                .map_err(|_| AppError::Internal("database connection lock poisoned".into()))?;
            actions::submit_review(&mut conn, self.user_id, card.flashcard_id(), quality)?
        };

        card.record_grade(quality, next);
        Ok(())
    }

    pub fn learned_count(&self) -> usize {
        self.current_round_cards
            .iter()
            .filter(|&&idx| self.all_cards.get(idx).is_some_and(|c| c.is_learned))
            .count()
    }

    pub fn total_count(&self) -> usize {
        self.current_round_cards.len()
    }

    pub fn remaining_count(&self) -> usize {
        self.total_count() - self.learned_count()
    }

    pub fn is_completed(&self) -> bool {
        self.current_round_cards.is_empty() || self.learned_count() == self.total_count()
    }

    pub fn phase_message(&self) -> String {
        if self.round_number == 1 {
            format!("Round {}: {} cards", self.round_number, self.total_count())
        } else {
            format!(
                "Round {} (Review): {} cards to retry",
                self.round_number,
                self.total_count()
            )
        }
    }
}
