//! Database setup for the learning app
//!
//! Handles SQLite initialization, the schema for users, lessons, units,
//! achievements and flashcards, and the app's simulated current date.

use crate::error::Result;
use chrono::{Days, Local, NaiveDate};
use log::{debug, info};
use rusqlite::{Connection, params};
use std::path::Path;
use std::time::Duration;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        points INTEGER NOT NULL DEFAULT 0,
        level INTEGER NOT NULL DEFAULT 1,
        streak INTEGER NOT NULL DEFAULT 0,
        last_streak_date TEXT,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS lessons (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        code TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        xp_reward INTEGER NOT NULL,
        exercises TEXT NOT NULL DEFAULT '[]',
        sort_order INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS israeli_units (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        code TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        exercises TEXT NOT NULL DEFAULT '[]',
        sort_order INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS lesson_completions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        lesson_id INTEGER NOT NULL,
        accuracy INTEGER NOT NULL,
        passed INTEGER NOT NULL,
        points_earned INTEGER NOT NULL,
        completed_at TEXT NOT NULL,
        FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
        FOREIGN KEY (lesson_id) REFERENCES lessons(id)
    );

    CREATE TABLE IF NOT EXISTS unit_completions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        unit_id INTEGER NOT NULL,
        accuracy INTEGER NOT NULL,
        passed INTEGER NOT NULL,
        points_earned INTEGER NOT NULL,
        completed_at TEXT NOT NULL,
        FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
        FOREIGN KEY (unit_id) REFERENCES israeli_units(id)
    );

    CREATE TABLE IF NOT EXISTS practice_sessions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        modality TEXT NOT NULL,
        accuracy INTEGER NOT NULL,
        passed INTEGER NOT NULL,
        points_earned INTEGER NOT NULL,
        completed_at TEXT NOT NULL,
        FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS achievements (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        code TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        description TEXT NOT NULL,
        requirement_type TEXT NOT NULL,
        requirement_value INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS user_achievements (
        user_id INTEGER NOT NULL,
        achievement_id INTEGER NOT NULL,
        unlocked_at TEXT NOT NULL,
        PRIMARY KEY (user_id, achievement_id),
        FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
        FOREIGN KEY (achievement_id) REFERENCES achievements(id)
    );

    CREATE TABLE IF NOT EXISTS decks (
        name TEXT PRIMARY KEY
    );

    CREATE TABLE IF NOT EXISTS flashcards (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        deck_name TEXT NOT NULL,
        hebrew TEXT NOT NULL,
        transliteration TEXT NOT NULL DEFAULT '',
        english TEXT NOT NULL,
        FOREIGN KEY (deck_name) REFERENCES decks(name),
        UNIQUE(deck_name, hebrew)
    );

    CREATE TABLE IF NOT EXISTS flashcard_reviews (
        user_id INTEGER NOT NULL,
        flashcard_id INTEGER NOT NULL,
        interval_days INTEGER NOT NULL DEFAULT 0,
        ease_factor INTEGER NOT NULL DEFAULT 250,
        repetitions INTEGER NOT NULL DEFAULT 0,
        next_review TEXT NOT NULL,
        PRIMARY KEY (user_id, flashcard_id),
        FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
        FOREIGN KEY (flashcard_id) REFERENCES flashcards(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS app_state (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
";

/// Opens (or creates) the database file and makes sure the schema exists.
pub fn init_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    prepare(&conn)?;
    info!("Database ready at {}", path.display());
    Ok(conn)
}

/// In-memory database with the full schema, used by tests.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    prepare(&conn)?;
    Ok(conn)
}

fn prepare(conn: &Connection) -> Result<()> {
    conn.busy_timeout(Duration::from_secs(5))?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute_batch(SCHEMA)?;

    sync_current_date(conn, Local::now().date_naive())?;
    Ok(())
}

/// Moves the stored date forward to `today`. A date already ahead of it,
/// from "Next Day", is kept.
pub fn sync_current_date(conn: &Connection, today: NaiveDate) -> Result<NaiveDate> {
    conn.execute(
        "INSERT OR IGNORE INTO app_state (key, value) VALUES ('current_date', ?1)",
        params![today],
    )?;
    conn.execute(
        "UPDATE app_state SET value = ?1 WHERE key = 'current_date' AND value < ?1",
        params![today],
    )?;
    get_current_date(conn)
}

/// Retrieves the app's current (possibly simulated) date
pub fn get_current_date(conn: &Connection) -> Result<NaiveDate> {
    let date = conn.query_row(
        "SELECT value FROM app_state WHERE key = 'current_date'",
        [],
        |row| row.get::<_, NaiveDate>(0),
    )?;
    Ok(date)
}

pub fn set_current_date(conn: &Connection, date: NaiveDate) -> Result<()> {
    conn.execute(
        "UPDATE app_state SET value = ?1 WHERE key = 'current_date'",
        params![date],
    )?;
    Ok(())
}

/// Advances current date by one day (for exercising streaks and reviews)
pub fn advance_day(conn: &Connection) -> Result<NaiveDate> {
    let current = get_current_date(conn)?;
    let next_day = current.checked_add_days(Days::new(1)).unwrap_or(current);
    set_current_date(conn, next_day)?;
    debug!("Current date advanced to {}", next_day);
    Ok(next_day)
}
