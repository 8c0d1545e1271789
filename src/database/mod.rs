pub mod actions;
pub mod catalog;
pub mod db;
pub mod flashcards;
pub mod users;
