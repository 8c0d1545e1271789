//! Error taxonomy shared by the engine, the database layer and the actions.
//!
//! Failing a lesson or a review is a normal outcome and never shows up here.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("User not found: {0}")]
    UserNotFound(i64),

    #[error("Lesson not found: {0}")]
    LessonNotFound(i64),

    #[error("Israeli unit not found: {0}")]
    UnitNotFound(i64),

    #[error("Flashcard not found: {0}")]
    FlashcardNotFound(i64),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Stable, machine readable discriminant for an [`AppError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Validation,
    UserNotFound,
    LessonNotFound,
    UnitNotFound,
    FlashcardNotFound,
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Validation => "VALIDATION_ERROR",
            ErrorCode::UserNotFound => "USER_NOT_FOUND",
            ErrorCode::LessonNotFound => "LESSON_NOT_FOUND",
            ErrorCode::UnitNotFound => "UNIT_NOT_FOUND",
            ErrorCode::FlashcardNotFound => "FLASHCARD_NOT_FOUND",
            ErrorCode::Internal => "INTERNAL_ERROR",
        }
    }
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation(_) => ErrorCode::Validation,
            AppError::UserNotFound(_) => ErrorCode::UserNotFound,
            AppError::LessonNotFound(_) => ErrorCode::LessonNotFound,
            AppError::UnitNotFound(_) => ErrorCode::UnitNotFound,
            AppError::FlashcardNotFound(_) => ErrorCode::FlashcardNotFound,
            AppError::Internal(_) => ErrorCode::Internal,
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::Internal(format!("database: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("json: {}", err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(format!("io: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
