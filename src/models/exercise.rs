//! Exercise checking for lessons, units and practice modes.
//!
//! Answers are compared after normalization: whitespace collapsed, lowercase,
//! and Hebrew vowel points / cantillation marks removed, so a learner typing
//! unpointed text still matches a pointed answer.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExerciseKind {
    Translate,
    Transliterate,
    /// Word building: the learner assembles `tiles` in order.
    BuildWord { tiles: Vec<String> },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub prompt: String,
    pub answer: String,
    pub kind: ExerciseKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExerciseScore {
    pub correct: usize,
    pub total: usize,
    pub accuracy: u8,
}

/// Points and accents in the Hebrew block. Maqaf, paseq, sof pasuq and
/// nun hafukha are punctuation and are kept.
fn is_hebrew_mark(c: char) -> bool {
    matches!(c, '\u{0591}'..='\u{05C7}')
        && !matches!(c, '\u{05BE}' | '\u{05C0}' | '\u{05C3}' | '\u{05C6}')
}

pub fn normalize_answer(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| !is_hebrew_mark(*c))
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

impl Exercise {
    pub fn translate(prompt: &str, answer: &str) -> Self {
        Self {
            prompt: prompt.to_string(),
            answer: answer.to_string(),
            kind: ExerciseKind::Translate,
        }
    }

    pub fn transliterate(prompt: &str, answer: &str) -> Self {
        Self {
            prompt: prompt.to_string(),
            answer: answer.to_string(),
            kind: ExerciseKind::Transliterate,
        }
    }

    pub fn build_word(prompt: &str, answer: &str, tiles: &[&str]) -> Self {
        Self {
            prompt: prompt.to_string(),
            answer: answer.to_string(),
            kind: ExerciseKind::BuildWord {
                tiles: tiles.iter().map(|t| t.to_string()).collect(),
            },
        }
    }

    pub fn is_correct(&self, given: &str) -> bool {
        let expected = normalize_answer(&self.answer);
        if expected.is_empty() {
            return false;
        }
        match &self.kind {
            // tiles may be submitted space separated
            ExerciseKind::BuildWord { .. } => {
                normalize_answer(given).replace(' ', "") == expected.replace(' ', "")
            }
            _ => normalize_answer(given) == expected,
        }
    }
}

/// Percentage rounded half up; an empty set scores 0.
pub fn accuracy_percent(correct: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let correct = correct.min(total);
    ((correct * 200 + total) / (total * 2)) as u8
}

/// Scores answers positionally; missing answers count as wrong.
pub fn score_answers(exercises: &[Exercise], answers: &[String]) -> ExerciseScore {
    let correct = exercises
        .iter()
        .zip(answers.iter())
        .filter(|(exercise, answer)| exercise.is_correct(answer))
        .count();

    ExerciseScore {
        correct,
        total: exercises.len(),
        accuracy: accuracy_percent(correct, exercises.len()),
    }
}

/// Blurting: share of target words that appear anywhere in the free text.
pub fn blurt_accuracy(targets: &[String], text: &str) -> u8 {
    let recalled: HashSet<String> = normalize_answer(text)
        .split(' ')
        .map(|w| w.trim_matches(|c: char| c.is_ascii_punctuation()).to_string())
        .collect();

    let targets: HashSet<String> = targets
        .iter()
        .map(|t| normalize_answer(t))
        .filter(|t| !t.is_empty())
        .collect();

    let hits = targets.iter().filter(|t| recalled.contains(*t)).count();
    accuracy_percent(hits, targets.len())
}
