pub mod achievement;
pub mod completion;
pub mod deck;
pub mod exercise;
pub mod flashcard;
pub mod learning_card;
pub mod learning_session;
pub mod lesson;
pub mod progress;
pub mod review_data;
pub mod sm2;

pub use achievement::{AchievementDefinition, RequirementType, UnlockedAchievement};
pub use completion::{CompletionEvent, CompletionKind, Modality};
pub use deck::Deck;
pub use exercise::{Exercise, ExerciseKind, ExerciseScore};
pub use flashcard::Flashcard;
pub use learning_card::LearningCard;
pub use learning_session::LearningSession;
pub use lesson::{IsraeliUnit, Lesson};
pub use progress::{UserProgressState, level_for_points};
pub use review_data::FlashcardReviewState;
