//! JSON import/export for vocabulary decks and progress reports.

use crate::error::Result;
use crate::models::{Deck, UnlockedAchievement, UserProgressState};
use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Snapshot of a learner's standing, written out for sharing or backup.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProgressReport {
    pub username: String,
    pub generated_on: NaiveDate,
    pub progress: UserProgressState,
    pub achievements: Vec<UnlockedAchievement>,
}

/// Exports a deck to a JSON file at the specified path.
pub fn export_deck_to_path(deck: &Deck, path: &Path) -> Result<()> {
    write_json(deck, path)?;
    info!("Deck '{}' exported to '{}'", deck.name, path.display());
    Ok(())
}

/// Imports a deck from a JSON file.
/// Returns an error if the file doesn't exist or contains invalid JSON.
pub fn import_deck_from_path(path: &Path) -> Result<Deck> {
    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let deck: Deck = serde_json::from_str(&contents)?;

    info!("Deck '{}' imported from '{}'", deck.name, path.display());
    Ok(deck)
}

pub fn export_progress_to_path(report: &ProgressReport, path: &Path) -> Result<()> {
    write_json(report, path)?;
    info!(
        "Progress report for '{}' exported to '{}'",
        report.username,
        path.display()
    );
    Ok(())
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json_string = serde_json::to_string_pretty(value)?;
    let mut file = File::create(path)?;
    file.write_all(json_string.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Flashcard;
    use std::fs;

    fn create_test_deck() -> Deck {
        Deck {
            name: "Test Deck".to_string(),
            flashcards: vec![
                Flashcard::new("אָב", "av", "father"),
                Flashcard::new("אֵם", "em", "mother"),
            ],
        }
    }

    #[test]
    fn test_export_and_import_deck() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.json");
        let original = create_test_deck();

        export_deck_to_path(&original, &path).unwrap();
        let imported = import_deck_from_path(&path).unwrap();

        assert_eq!(imported.name, original.name);
        assert_eq!(imported.flashcards, original.flashcards);
    }

    #[test]
    fn test_import_json_without_transliteration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("import.json");
        fs::write(
            &path,
            r#"{
  "name": "Import Test Deck",
  "flashcards": [
    { "hebrew": "בַּיִת", "english": "house" }
  ]
}"#,
        )
        .unwrap();

        let deck = import_deck_from_path(&path).unwrap();
        assert_eq!(deck.name, "Import Test Deck");
        assert_eq!(deck.flashcards.len(), 1);
        assert_eq!(deck.flashcards[0].english, "house");
    }

    #[test]
    fn test_import_nonexistent_file() {
        let err = import_deck_from_path(Path::new("nonexistent_file_xyz123.json")).unwrap_err();
        assert_eq!(err.code().as_str(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_import_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invalid.json");
        fs::write(&path, "{ this is not valid json }").unwrap();

        assert!(import_deck_from_path(&path).is_err());
    }

    #[test]
    fn test_export_progress_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        let report = ProgressReport {
            username: "ruth".to_string(),
            generated_on: NaiveDate::from_ymd_opt(2024, 7, 4).unwrap(),
            progress: UserProgressState {
                points: 140,
                level: 2,
                streak: 3,
                last_streak_date: NaiveDate::from_ymd_opt(2024, 7, 4),
            },
            achievements: Vec::new(),
        };

        export_progress_to_path(&report, &path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["progress"]["level"], 2);
        assert_eq!(value["progress"]["last_streak_date"], "2024-07-04");
    }
}
