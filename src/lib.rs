pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod models;
pub mod progression;

pub use error::{AppError, ErrorCode};
pub use models::{
    AchievementDefinition, CompletionEvent, Deck, Flashcard, FlashcardReviewState, LearningSession,
    UserProgressState,
};
pub use progression::{ProgressionEngine, ProgressionOutcome};
