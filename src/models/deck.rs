//! Deck is a named vocabulary list
use super::Flashcard;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Deck {
    pub name: String,
    pub flashcards: Vec<Flashcard>,
}

impl Default for Deck {
    fn default() -> Self {
        Self {
            name: "Biblical Vocabulary".to_string(),
            flashcards: Vec::new(),
        }
    }
}

/// Starter deck seeded into a fresh database.
pub fn starter_deck() -> Deck {
    Deck {
        name: "Genesis 1".to_string(),
        flashcards: vec![
            Flashcard::new("בְּרֵאשִׁית", "bereshit", "in the beginning"),
            Flashcard::new("בָּרָא", "bara", "he created"),
            Flashcard::new("אֱלֹהִים", "elohim", "God"),
            Flashcard::new("שָׁמַיִם", "shamayim", "heavens"),
            Flashcard::new("אֶרֶץ", "erets", "earth"),
            Flashcard::new("אוֹר", "or", "light"),
            Flashcard::new("יוֹם", "yom", "day"),
            Flashcard::new("מַיִם", "mayim", "water"),
        ],
    }
}
