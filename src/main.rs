mod app;
use hebrew_learning_app::*;

use app::LearningApp;
use config::AppConfig;
use database::{catalog, db, flashcards, users};
use log::info;
use models::deck::starter_deck;
use rusqlite::Connection;

/// Opens the database, seeds the catalog and starter deck, and resolves the learner.
fn setup(config: &AppConfig) -> hebrew_learning_app::error::Result<(Connection, i64)> {
    let mut conn = db::init_database(&config.database_path)?;
    catalog::seed_defaults(&conn)?;

    if flashcards::get_all_decks(&conn)?.is_empty() {
        flashcards::import_deck(&mut conn, &starter_deck())?;
        info!("Starter deck created");
    }

    let user_id = users::get_or_create_user(&conn, &config.username)?;
    Ok((conn, user_id))
}

fn main() -> eframe::Result<()> {
    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration, using defaults: {}", e);
        AppConfig::default()
    });

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_filter))
        .init();

    let (conn, user_id) = match setup(&config) {
        Ok(ready) => ready,
        Err(e) => {
            log::error!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    info!("Signed in as '{}' ({})", config.username, user_id);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([560.0, 760.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Biblical Hebrew",
        options,
        Box::new(move |_cc| Ok(Box::new(LearningApp::new(conn, user_id)))),
    )
}
