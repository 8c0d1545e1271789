//! Flashcard is a Hebrew word with its transliteration and English gloss
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    pub hebrew: String,
    #[serde(default)]
    pub transliteration: String,
    pub english: String,
}

impl Flashcard {
    pub fn new(hebrew: &str, transliteration: &str, english: &str) -> Self {
        Self {
            hebrew: hebrew.to_string(),
            transliteration: transliteration.to_string(),
            english: english.to_string(),
        }
    }
}
