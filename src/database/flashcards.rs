//! Vocabulary decks, flashcards and per-user SM-2 review state.

use crate::error::{AppError, Result};
use crate::models::review_data::DEFAULT_EASE_FACTOR;
use crate::models::{Deck, Flashcard, FlashcardReviewState};
use chrono::NaiveDate;
use log::info;
use rusqlite::{Connection, OptionalExtension, params};

/// Creates a new deck in the database
pub fn new_deck(conn: &Connection, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("deck name must not be empty".into()));
    }
    conn.execute("INSERT INTO decks (name) VALUES (?1)", params![name])?;
    info!("Deck '{}' created", name);
    Ok(())
}

pub fn deck_exists(conn: &Connection, name: &str) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM decks WHERE name = ?1",
            params![name],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Adds a flashcard to a deck and returns its id.
///
/// A card whose Hebrew text already exists in the deck is left as is.
pub fn add_flashcard(conn: &Connection, deck_name: &str, card: &Flashcard) -> Result<i64> {
    conn.execute(
        "INSERT OR IGNORE INTO flashcards (deck_name, hebrew, transliteration, english)
         VALUES (?1, ?2, ?3, ?4)",
        params![deck_name, card.hebrew, card.transliteration, card.english],
    )?;

    let flashcard_id: i64 = conn.query_row(
        "SELECT id FROM flashcards WHERE deck_name = ?1 AND hebrew = ?2",
        params![deck_name, card.hebrew],
        |row| row.get(0),
    )?;

    Ok(flashcard_id)
}

/// Creates the deck and all of its cards in one transaction.
pub fn import_deck(conn: &mut Connection, deck: &Deck) -> Result<()> {
    if deck_exists(conn, &deck.name)? {
        return Err(AppError::Validation(format!(
            "deck '{}' already exists",
            deck.name
        )));
    }

    let tx = conn.transaction()?;
    new_deck(&tx, &deck.name)?;
    for card in &deck.flashcards {
        add_flashcard(&tx, &deck.name, card)?;
    }
    tx.commit()?;

    info!(
        "Imported deck '{}' with {} cards",
        deck.name,
        deck.flashcards.len()
    );
    Ok(())
}

/// Retrieves all flashcards for a given deck as (flashcard_id, Flashcard)
pub fn get_flashcards_for_deck(conn: &Connection, deck_name: &str) -> Result<Vec<(i64, Flashcard)>> {
    let mut stmt = conn.prepare(
        "SELECT id, hebrew, transliteration, english FROM flashcards WHERE deck_name = ?1 ORDER BY id",
    )?;

    let flashcards = stmt
        .query_map(params![deck_name], |row| {
            Ok((
                row.get(0)?,
                Flashcard {
                    hebrew: row.get(1)?,
                    transliteration: row.get(2)?,
                    english: row.get(3)?,
                },
            ))
        })?
        .collect::<rusqlite::Result<Vec<(i64, Flashcard)>>>()?;

    Ok(flashcards)
}

pub fn get_all_decks(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM decks ORDER BY name")?;
    let decks = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(decks)
}

/// Loads all decks with their flashcards. Review state is fetched per user.
pub fn load_all_decks(conn: &Connection) -> Result<Vec<Deck>> {
    let mut decks = Vec::new();
    for name in get_all_decks(conn)? {
        let flashcards = get_flashcards_for_deck(conn, &name)?
            .into_iter()
            .map(|(_, card)| card)
            .collect();
        decks.push(Deck { name, flashcards });
    }
    Ok(decks)
}

/// Review state of one card for one user; a card never reviewed gets the
/// first-exposure defaults.
pub fn get_review_state(
    conn: &Connection,
    user_id: i64,
    flashcard_id: i64,
    today: NaiveDate,
) -> Result<FlashcardReviewState> {
    let exists = conn
        .query_row(
            "SELECT id FROM flashcards WHERE id = ?1",
            params![flashcard_id],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    if exists.is_none() {
        return Err(AppError::FlashcardNotFound(flashcard_id));
    }

    let state = conn
        .query_row(
            "SELECT interval_days, ease_factor, repetitions, next_review
             FROM flashcard_reviews WHERE user_id = ?1 AND flashcard_id = ?2",
            params![user_id, flashcard_id],
            |row| {
                Ok(FlashcardReviewState {
                    flashcard_id,
                    interval: row.get(0)?,
                    ease_factor: row.get(1)?,
                    repetition_count: row.get(2)?,
                    next_review: row.get(3)?,
                })
            },
        )
        .optional()?;

    Ok(state.unwrap_or_else(|| FlashcardReviewState::first_exposure(flashcard_id, today)))
}

pub fn save_review_state(conn: &Connection, user_id: i64, review: &FlashcardReviewState) -> Result<()> {
    conn.execute(
        "INSERT INTO flashcard_reviews (user_id, flashcard_id, interval_days, ease_factor, repetitions, next_review)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(user_id, flashcard_id) DO UPDATE SET
            interval_days = excluded.interval_days,
            ease_factor = excluded.ease_factor,
            repetitions = excluded.repetitions,
            next_review = excluded.next_review",
        params![
            user_id,
            review.flashcard_id,
            review.interval,
            review.ease_factor,
            review.repetition_count,
            review.next_review
        ],
    )?;
    Ok(())
}

/// Flashcards of a deck due on `today` for a user, oldest due first.
/// Cards the user has never reviewed are always due.
pub fn get_flashcards_due_for_review(
    conn: &Connection,
    user_id: i64,
    deck_name: &str,
    today: NaiveDate,
) -> Result<Vec<(Flashcard, FlashcardReviewState)>> {
    let mut stmt = conn.prepare(
        "SELECT f.id, f.hebrew, f.transliteration, f.english,
                COALESCE(r.interval_days, 0), COALESCE(r.ease_factor, ?3),
                COALESCE(r.repetitions, 0), COALESCE(r.next_review, ?4)
         FROM flashcards f
         LEFT JOIN flashcard_reviews r ON f.id = r.flashcard_id AND r.user_id = ?2
         WHERE f.deck_name = ?1 AND COALESCE(r.next_review, ?4) <= ?4
         ORDER BY COALESCE(r.next_review, ?4) ASC, f.id ASC",
    )?;

    let cards = stmt
        .query_map(params![deck_name, user_id, DEFAULT_EASE_FACTOR, today], |row| {
            Ok((
                Flashcard {
                    hebrew: row.get(1)?,
                    transliteration: row.get(2)?,
                    english: row.get(3)?,
                },
                FlashcardReviewState {
                    flashcard_id: row.get(0)?,
                    interval: row.get(4)?,
                    ease_factor: row.get(5)?,
                    repetition_count: row.get(6)?,
                    next_review: row.get(7)?,
                },
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(cards)
}
