//! Learner accounts and their progression columns.

use crate::error::{AppError, Result};
use crate::models::UserProgressState;
use chrono::{NaiveDate, Utc};
use log::info;
use rusqlite::{Connection, OptionalExtension, params};

/// Creates a learner with points=0, level=1, streak=0.
pub fn create_user(conn: &Connection, username: &str) -> Result<i64> {
    if username.trim().is_empty() {
        return Err(AppError::Validation("username must not be empty".into()));
    }
    conn.execute(
        "INSERT INTO users (username, created_at) VALUES (?1, ?2)",
        params![username, Utc::now()],
    )?;
    let id = conn.last_insert_rowid();
    info!("Created user '{}' ({})", username, id);
    Ok(id)
}

pub fn find_user(conn: &Connection, username: &str) -> Result<Option<i64>> {
    let id = conn
        .query_row(
            "SELECT id FROM users WHERE username = ?1",
            params![username],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

pub fn get_or_create_user(conn: &Connection, username: &str) -> Result<i64> {
    match find_user(conn, username)? {
        Some(id) => Ok(id),
        None => create_user(conn, username),
    }
}

pub fn get_username(conn: &Connection, user_id: i64) -> Result<String> {
    conn.query_row(
        "SELECT username FROM users WHERE id = ?1",
        params![user_id],
        |row| row.get(0),
    )
    .optional()?
    .ok_or(AppError::UserNotFound(user_id))
}

pub fn get_user_progress(conn: &Connection, user_id: i64) -> Result<UserProgressState> {
    conn.query_row(
        "SELECT points, level, streak, last_streak_date FROM users WHERE id = ?1",
        params![user_id],
        |row| {
            Ok(UserProgressState {
                points: row.get(0)?,
                level: row.get(1)?,
                streak: row.get(2)?,
                last_streak_date: row.get::<_, Option<NaiveDate>>(3)?,
            })
        },
    )
    .optional()?
    .ok_or(AppError::UserNotFound(user_id))
}

pub fn save_user_progress(conn: &Connection, user_id: i64, state: &UserProgressState) -> Result<()> {
    let updated = conn.execute(
        "UPDATE users SET points = ?1, level = ?2, streak = ?3, last_streak_date = ?4 WHERE id = ?5",
        params![
            state.points,
            state.level,
            state.streak,
            state.last_streak_date,
            user_id
        ],
    )?;
    if updated == 0 {
        return Err(AppError::UserNotFound(user_id));
    }
    Ok(())
}
