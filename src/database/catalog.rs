//! Lessons, Israeli units and the achievement catalog, plus unlock records.

use crate::error::{AppError, Result};
use crate::models::achievement::default_catalog;
use crate::models::{
    AchievementDefinition, Exercise, IsraeliUnit, Lesson, RequirementType, UnlockedAchievement,
};
use chrono::{DateTime, Utc};
use log::{debug, info};
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::HashSet;

struct SeedLesson {
    code: &'static str,
    title: &'static str,
    description: &'static str,
    xp_reward: u32,
    exercises: Vec<Exercise>,
}

fn default_lessons() -> Vec<SeedLesson> {
    vec![
        SeedLesson {
            code: "aleph-bet-1",
            title: "The Aleph-Bet: א to ה",
            description: "Name the first five letters",
            xp_reward: 50,
            exercises: vec![
                Exercise::transliterate("א", "aleph"),
                Exercise::transliterate("ב", "bet"),
                Exercise::transliterate("ג", "gimel"),
                Exercise::transliterate("ד", "dalet"),
                Exercise::transliterate("ה", "he"),
            ],
        },
        SeedLesson {
            code: "vowels-1",
            title: "Vowel Points",
            description: "Read syllables with qamets, patah and hireq",
            xp_reward: 50,
            exercises: vec![
                Exercise::transliterate("בָּ", "ba"),
                Exercise::transliterate("בַּ", "ba"),
                Exercise::transliterate("בִּ", "bi"),
                Exercise::transliterate("מִי", "mi"),
            ],
        },
        SeedLesson {
            code: "genesis-1-1",
            title: "Genesis 1:1",
            description: "The first verse of the Torah, word by word",
            xp_reward: 75,
            exercises: vec![
                Exercise::translate("בְּרֵאשִׁית", "in the beginning"),
                Exercise::translate("בָּרָא", "created"),
                Exercise::translate("אֱלֹהִים", "god"),
                Exercise::build_word("earth", "ארץ", &["א", "ר", "ץ"]),
            ],
        },
    ]
}

fn default_units() -> Vec<SeedLesson> {
    vec![
        SeedLesson {
            code: "greetings",
            title: "Greetings in Israel",
            description: "Modern everyday greetings",
            xp_reward: 0,
            exercises: vec![
                Exercise::translate("שָׁלוֹם", "hello"),
                Exercise::translate("תּוֹדָה", "thank you"),
                Exercise::translate("בֹּקֶר טוֹב", "good morning"),
            ],
        },
        SeedLesson {
            code: "shuk",
            title: "At the Shuk",
            description: "Buying food at the market",
            xp_reward: 0,
            exercises: vec![
                Exercise::translate("לֶחֶם", "bread"),
                Exercise::translate("מַיִם", "water"),
                Exercise::translate("כַּמָּה זֶה", "how much is this"),
            ],
        },
    ]
}

/// Inserts the built-in lessons, units and achievements. Safe to call on
/// every start; existing rows (matched by code) are left alone.
pub fn seed_defaults(conn: &Connection) -> Result<()> {
    for (order, lesson) in default_lessons().into_iter().enumerate() {
        conn.execute(
            "INSERT OR IGNORE INTO lessons (code, title, description, xp_reward, exercises, sort_order)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                lesson.code,
                lesson.title,
                lesson.description,
                lesson.xp_reward,
                serde_json::to_string(&lesson.exercises)?,
                order as i64
            ],
        )?;
    }

    for (order, unit) in default_units().into_iter().enumerate() {
        conn.execute(
            "INSERT OR IGNORE INTO israeli_units (code, title, description, exercises, sort_order)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                unit.code,
                unit.title,
                unit.description,
                serde_json::to_string(&unit.exercises)?,
                order as i64
            ],
        )?;
    }

    for achievement in default_catalog() {
        conn.execute(
            "INSERT OR IGNORE INTO achievements (code, name, description, requirement_type, requirement_value)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                achievement.code,
                achievement.name,
                achievement.description,
                achievement.requirement_type.as_str(),
                achievement.requirement_value
            ],
        )?;
    }

    info!("Default catalog seeded");
    Ok(())
}

type LessonRow = (i64, String, String, u32, String);

fn lesson_from_row(row: LessonRow) -> Result<Lesson> {
    let (id, title, description, xp_reward, exercises) = row;
    Ok(Lesson {
        id,
        title,
        description,
        xp_reward,
        exercises: serde_json::from_str(&exercises)?,
    })
}

pub fn list_lessons(conn: &Connection) -> Result<Vec<Lesson>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, description, xp_reward, exercises FROM lessons ORDER BY sort_order, id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
        })?
        .collect::<rusqlite::Result<Vec<LessonRow>>>()?;

    rows.into_iter().map(lesson_from_row).collect()
}

pub fn get_lesson(conn: &Connection, lesson_id: i64) -> Result<Lesson> {
    let row: Option<LessonRow> = conn
        .query_row(
            "SELECT id, title, description, xp_reward, exercises FROM lessons WHERE id = ?1",
            params![lesson_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
        )
        .optional()?;

    match row {
        Some(row) => lesson_from_row(row),
        None => Err(AppError::LessonNotFound(lesson_id)),
    }
}

type UnitRow = (i64, String, String, String);

fn unit_from_row(row: UnitRow) -> Result<IsraeliUnit> {
    let (id, title, description, exercises) = row;
    Ok(IsraeliUnit {
        id,
        title,
        description,
        exercises: serde_json::from_str(&exercises)?,
    })
}

pub fn list_units(conn: &Connection) -> Result<Vec<IsraeliUnit>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, description, exercises FROM israeli_units ORDER BY sort_order, id",
    )?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))?
        .collect::<rusqlite::Result<Vec<UnitRow>>>()?;

    rows.into_iter().map(unit_from_row).collect()
}

pub fn get_unit(conn: &Connection, unit_id: i64) -> Result<IsraeliUnit> {
    let row: Option<UnitRow> = conn
        .query_row(
            "SELECT id, title, description, exercises FROM israeli_units WHERE id = ?1",
            params![unit_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .optional()?;

    match row {
        Some(row) => unit_from_row(row),
        None => Err(AppError::UnitNotFound(unit_id)),
    }
}

fn achievement_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AchievementDefinition> {
    let requirement: String = row.get(4)?;
    let requirement_type = requirement.parse::<RequirementType>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            e.into(),
        )
    })?;

    Ok(AchievementDefinition {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        requirement_type,
        requirement_value: row.get(5)?,
    })
}

pub fn list_achievements(conn: &Connection) -> Result<Vec<AchievementDefinition>> {
    let mut stmt = conn.prepare(
        "SELECT id, code, name, description, requirement_type, requirement_value
         FROM achievements ORDER BY id",
    )?;
    let achievements = stmt
        .query_map([], achievement_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(achievements)
}

pub fn unlocked_achievement_ids(conn: &Connection, user_id: i64) -> Result<HashSet<i64>> {
    let mut stmt = conn.prepare("SELECT achievement_id FROM user_achievements WHERE user_id = ?1")?;
    let ids = stmt
        .query_map(params![user_id], |row| row.get(0))?
        .collect::<rusqlite::Result<HashSet<i64>>>()?;
    Ok(ids)
}

pub fn list_unlocked_achievements(
    conn: &Connection,
    user_id: i64,
) -> Result<Vec<UnlockedAchievement>> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.code, a.name, a.description, a.requirement_type, a.requirement_value, u.unlocked_at
         FROM user_achievements u
         JOIN achievements a ON a.id = u.achievement_id
         WHERE u.user_id = ?1
         ORDER BY u.unlocked_at, a.id",
    )?;
    let unlocked = stmt
        .query_map(params![user_id], |row| {
            Ok(UnlockedAchievement {
                achievement: achievement_from_row(row)?,
                unlocked_at: row.get::<_, DateTime<Utc>>(6)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(unlocked)
}

/// Records an unlock unless the user already has it.
/// Returns true only when this call created the record.
pub fn unlock_achievement(
    conn: &Connection,
    user_id: i64,
    achievement_id: i64,
    unlocked_at: DateTime<Utc>,
) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO user_achievements (user_id, achievement_id, unlocked_at)
         VALUES (?1, ?2, ?3)",
        params![user_id, achievement_id, unlocked_at],
    )?;
    debug!(
        "unlock achievement {} for user {}: inserted={}",
        achievement_id, user_id, inserted
    );
    Ok(inserted == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{db::open_in_memory, users::create_user};

    #[test]
    fn test_seed_is_idempotent() {
        let conn = open_in_memory().unwrap();
        seed_defaults(&conn).unwrap();
        seed_defaults(&conn).unwrap();

        assert_eq!(list_lessons(&conn).unwrap().len(), 3);
        assert_eq!(list_units(&conn).unwrap().len(), 2);
        assert_eq!(list_achievements(&conn).unwrap().len(), default_catalog().len());
    }

    #[test]
    fn test_lesson_exercises_load() {
        let conn = open_in_memory().unwrap();
        seed_defaults(&conn).unwrap();

        let lessons = list_lessons(&conn).unwrap();
        let lesson = get_lesson(&conn, lessons[0].id).unwrap();
        assert_eq!(lesson.xp_reward, 50);
        assert_eq!(lesson.exercises.len(), 5);
        assert!(lesson.exercises[0].is_correct("Aleph"));
    }

    #[test]
    fn test_missing_lesson_and_unit() {
        let conn = open_in_memory().unwrap();
        assert_eq!(
            get_lesson(&conn, 99).unwrap_err().code().as_str(),
            "LESSON_NOT_FOUND"
        );
        assert_eq!(
            get_unit(&conn, 99).unwrap_err().code().as_str(),
            "UNIT_NOT_FOUND"
        );
    }

    #[test]
    fn test_unlock_is_at_most_once() {
        let conn = open_in_memory().unwrap();
        seed_defaults(&conn).unwrap();
        let user = create_user(&conn, "deborah").unwrap();
        let achievement = list_achievements(&conn).unwrap()[0].clone();

        assert!(unlock_achievement(&conn, user, achievement.id, Utc::now()).unwrap());
        assert!(!unlock_achievement(&conn, user, achievement.id, Utc::now()).unwrap());

        let unlocked = list_unlocked_achievements(&conn, user).unwrap();
        assert_eq!(unlocked.len(), 1);
        assert_eq!(unlocked[0].achievement, achievement);
        assert!(unlocked_achievement_ids(&conn, user).unwrap().contains(&achievement.id));
    }
}
