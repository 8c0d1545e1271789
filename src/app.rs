//! Desktop front end.
//! Shows the learner's standing and drives lessons, Israeli units, practice
//! modes, flashcard reviews and deck import/export through the library.

use crate::database::{actions, catalog, db, flashcards, users};
use crate::error::{AppError, Result};
use crate::export::json::{
    ProgressReport, export_deck_to_path, export_progress_to_path, import_deck_from_path,
};
use crate::models::exercise::{blurt_accuracy, score_answers};
use crate::models::sm2::PASS_QUALITY;
use crate::models::{
    AchievementDefinition, Deck, Exercise, IsraeliUnit, LearningSession, Lesson, Modality,
    UnlockedAchievement, UserProgressState,
};
use crate::progression::ProgressionOutcome;
use chrono::NaiveDate;
use eframe::egui;
use log::{error, warn};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

#[derive(Clone, Copy, PartialEq)]
enum Activity {
    Lesson(i64),
    Unit(i64),
}

/// A lesson or unit being answered.
struct ExerciseRun {
    activity: Activity,
    title: String,
    exercises: Vec<Exercise>,
    answers: Vec<String>,
}

impl ExerciseRun {
    fn new(activity: Activity, title: &str, exercises: &[Exercise]) -> Self {
        Self {
            activity,
            title: title.to_string(),
            exercises: exercises.to_vec(),
            answers: vec![String::new(); exercises.len()],
        }
    }
}

#[derive(Default)]
enum AppScreen {
    #[default]
    Main,
    Exercises,
    Practice,
    Review,
}

pub struct LearningApp {
    conn: Arc<Mutex<Connection>>,
    user_id: i64,
    username: String,
    progress: UserProgressState,
    current_date: Option<NaiveDate>,

    lessons: Vec<Lesson>,
    units: Vec<IsraeliUnit>,
    decks: Vec<Deck>,
    catalog: Vec<AchievementDefinition>,
    unlocked: Vec<UnlockedAchievement>,
    selected_deck_index: Option<usize>,

    current_screen: AppScreen,
    exercise_run: Option<ExerciseRun>,
    learning_session: Option<LearningSession>,

    practice_modality: Modality,
    practice_accuracy: u8,
    blurt_text: String,

    show_confirmation_dialog: bool,
    allowed_to_close: bool,
    show_export_dialog: bool,
    message: Option<String>,
}

fn format_outcome(activity: &str, outcome: &ProgressionOutcome) -> String {
    let mut lines = Vec::new();
    if outcome.is_passed {
        lines.push(format!(
            "{} passed with {}% accuracy{}",
            activity,
            outcome.accuracy,
            if outcome.is_perfect { " (perfect!)" } else { "" }
        ));
        lines.push(format!("+{} points", outcome.points_earned));
    } else {
        lines.push(format!(
            "{} scored {}%. Reach 50% to earn points and keep your streak.",
            activity, outcome.accuracy
        ));
    }
    lines.push(format!(
        "Total {} points, level {}, streak {} day(s)",
        outcome.new_points, outcome.new_level, outcome.new_streak
    ));
    for achievement in &outcome.achievements_unlocked {
        lines.push(format!("Achievement unlocked: {}", achievement.name));
    }
    lines.join("\n")
}

impl eframe::App for LearningApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.render_status_bar(ctx);

        match self.current_screen {
            AppScreen::Main => self.render_main_screen(ctx),
            AppScreen::Exercises => self.render_exercise_screen(ctx),
            AppScreen::Practice => self.render_practice_screen(ctx),
            AppScreen::Review => self.render_review_screen(ctx),
        }

        if ctx.input(|i| i.viewport().close_requested()) && !self.allowed_to_close {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            self.show_confirmation_dialog = true;
        }

        if self.show_confirmation_dialog {
            egui::Window::new("Do you want to quit?")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        if ui.button("No").clicked() {
                            self.show_confirmation_dialog = false;
                            self.allowed_to_close = false;
                        }

                        if ui.button("Yes").clicked() {
                            self.show_confirmation_dialog = false;
                            self.allowed_to_close = true;
                            ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                        }
                    });
                });
        }

        if self.show_export_dialog {
            let mut export_deck_index: Option<usize> = None;
            let mut should_cancel = false;

            egui::Window::new("Export Deck")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label("Select a deck to export:");
                    ui.separator();

                    for (i, deck) in self.decks.iter().enumerate() {
                        if ui
                            .button(format!("{} ({} cards)", deck.name, deck.flashcards.len()))
                            .clicked()
                        {
                            export_deck_index = Some(i);
                        }
                    }

                    ui.separator();

                    if ui.button("Cancel").clicked() {
                        should_cancel = true;
                    }
                });

            if let Some(i) = export_deck_index {
                self.handle_export(i);
            }
            if should_cancel {
                self.show_export_dialog = false;
            }
        }

        if let Some(message) = self.message.clone() {
            egui::Window::new("Result")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(message);
                    ui.add_space(10.0);
                    if ui.button("OK").clicked() {
                        self.message = None;
                    }
                });
        }
    }
}

impl LearningApp {
    pub fn new(conn: Connection, user_id: i64) -> Self {
        let mut app = Self {
            conn: Arc::new(Mutex::new(conn)),
            user_id,
            username: String::new(),
            progress: UserProgressState::default(),
            current_date: None,
            lessons: Vec::new(),
            units: Vec::new(),
            decks: Vec::new(),
            catalog: Vec::new(),
            unlocked: Vec::new(),
            selected_deck_index: None,
            current_screen: AppScreen::Main,
            exercise_run: None,
            learning_session: None,
            practice_modality: Modality::Rhythm,
            practice_accuracy: 80,
            blurt_text: String::new(),
            show_confirmation_dialog: false,
            allowed_to_close: false,
            show_export_dialog: false,
            message: None,
        };
        app.reload_catalog();
        app.refresh();
        app
    }

    fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| AppError::Internal("database connection lock poisoned".into()))?;
        f(&mut conn)
    }

    fn show_error(&mut self, context: &str, err: AppError) {
        error!("{} failed: {} ({})", context, err, err.code().as_str());
        self.message = Some(format!("{} failed: {}", context, err));
    }

    fn reload_catalog(&mut self) {
        let loaded = self.with_conn(|conn| {
            Ok((
                catalog::list_lessons(conn)?,
                catalog::list_units(conn)?,
                catalog::list_achievements(conn)?,
                flashcards::load_all_decks(conn)?,
            ))
        });
        match loaded {
            Ok((lessons, units, achievements, decks)) => {
                self.lessons = lessons;
                self.units = units;
                self.catalog = achievements;
                if self.selected_deck_index.is_none() && !decks.is_empty() {
                    self.selected_deck_index = Some(0);
                }
                self.decks = decks;
            }
            Err(e) => self.show_error("Loading lessons", e),
        }
    }

    /// Re-reads the learner's standing and the current date.
    fn refresh(&mut self) {
        let user_id = self.user_id;
        let loaded = self.with_conn(|conn| {
            Ok((
                users::get_username(conn, user_id)?,
                users::get_user_progress(conn, user_id)?,
                catalog::list_unlocked_achievements(conn, user_id)?,
                db::get_current_date(conn)?,
            ))
        });
        match loaded {
            Ok((username, progress, unlocked, today)) => {
                self.username = username;
                self.progress = progress;
                self.unlocked = unlocked;
                self.current_date = Some(today);
            }
            Err(e) => self.show_error("Loading progress", e),
        }
    }

    fn render_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!("שָׁלוֹם, {}", self.username));
                ui.separator();
                ui.label(format!("Level {}", self.progress.level));
                ui.label(format!("{} points", self.progress.points));
                ui.label(format!("Streak: {} day(s)", self.progress.streak));
            });

            let into_level = self.progress.points % crate::models::progress::POINTS_PER_LEVEL;
            ui.add(
                egui::ProgressBar::new(into_level as f32 / 100.0).text(format!(
                    "{} points to level {}",
                    self.progress.points_to_next_level(),
                    self.progress.level + 1
                )),
            );

            ui.horizontal(|ui| {
                if let Some(today) = self.current_date {
                    ui.label(today.format("%Y-%m-%d").to_string());
                }
                if ui.button("Next Day").clicked() {
                    match self.with_conn(|conn| db::advance_day(conn)) {
                        Ok(today) => self.current_date = Some(today),
                        Err(e) => self.show_error("Advancing the day", e),
                    }
                }
            });
        });
    }

    /// Renders the dashboard with lessons, units, practice and decks
    fn render_main_screen(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let mut action_run: Option<ExerciseRun> = None;
            let mut action_practice = false;
            let mut action_select: Option<usize> = None;
            let mut action_review: Option<usize> = None;
            let mut action_import = false;
            let mut action_export_progress = false;

            ui.heading(format!("Lessons ({})", self.lessons.len()));
            for lesson in &self.lessons {
                ui.horizontal(|ui| {
                    ui.label(format!("{} (+{} xp)", lesson.title, lesson.xp_reward));
                    if ui.button("Start").clicked() {
                        action_run = Some(ExerciseRun::new(
                            Activity::Lesson(lesson.id),
                            &lesson.title,
                            &lesson.exercises,
                        ));
                    }
                });
            }

            ui.separator();
            ui.heading("Israeli Units");
            for unit in &self.units {
                ui.horizontal(|ui| {
                    ui.label(&unit.title);
                    if ui.button("Start").clicked() {
                        action_run = Some(ExerciseRun::new(
                            Activity::Unit(unit.id),
                            &unit.title,
                            &unit.exercises,
                        ));
                    }
                });
            }

            ui.separator();
            ui.horizontal(|ui| {
                ui.heading("Practice");
                if ui.button("Open").clicked() {
                    action_practice = true;
                }
            });

            ui.separator();
            ui.heading(format!("Decks ({})", self.decks.len()));
            egui::ScrollArea::vertical()
                .id_source("decks_list")
                .max_height(120.0)
                .show(ui, |ui| {
                    for (i, deck) in self.decks.iter().enumerate() {
                        let is_selected = self.selected_deck_index == Some(i);
                        ui.horizontal(|ui| {
                            if ui
                                .selectable_label(
                                    is_selected,
                                    format!("{}. {} ({} cards)", i + 1, deck.name, deck.flashcards.len()),
                                )
                                .clicked()
                            {
                                action_select = Some(i);
                            }
                            if ui.button("Review").clicked() {
                                action_review = Some(i);
                            }
                        });
                    }
                });

            ui.horizontal(|ui| {
                if ui.button("Export Deck").clicked() {
                    self.show_export_dialog = true;
                }
                if ui.button("Import Deck").clicked() {
                    action_import = true;
                }
                if ui.button("Export Progress").clicked() {
                    action_export_progress = true;
                }
            });

            ui.separator();
            ui.heading(format!(
                "Achievements ({}/{})",
                self.unlocked.len(),
                self.catalog.len()
            ));
            egui::ScrollArea::vertical()
                .id_source("achievements_list")
                .max_height(150.0)
                .show(ui, |ui| {
                    for achievement in &self.catalog {
                        let unlocked = self
                            .unlocked
                            .iter()
                            .find(|u| u.achievement.id == achievement.id);
                        match unlocked {
                            Some(u) => ui.colored_label(
                                egui::Color32::from_rgb(200, 160, 40),
                                format!(
                                    "★ {}: {} (unlocked {})",
                                    achievement.name,
                                    achievement.description,
                                    u.unlocked_at.format("%Y-%m-%d")
                                ),
                            ),
                            None => ui.label(format!(
                                "☆ {}: {}",
                                achievement.name, achievement.description
                            )),
                        };
                    }
                });

            if let Some(run) = action_run {
                self.exercise_run = Some(run);
                self.current_screen = AppScreen::Exercises;
            }
            if action_practice {
                self.current_screen = AppScreen::Practice;
            }
            if let Some(i) = action_select {
                self.selected_deck_index = Some(i);
            }
            if let Some(i) = action_review {
                self.start_review_session(i);
            }
            if action_import {
                self.handle_import();
            }
            if action_export_progress {
                self.handle_export_progress();
            }
        });
    }

    fn render_exercise_screen(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let mut action_submit = false;
            let mut action_back = false;

            if let Some(run) = &mut self.exercise_run {
                ui.heading(&run.title);
                ui.add_space(10.0);

                egui::ScrollArea::vertical()
                    .id_source("exercises")
                    .max_height(420.0)
                    .show(ui, |ui| {
                        for (exercise, answer) in run.exercises.iter().zip(run.answers.iter_mut()) {
                            ui.group(|ui| {
                                ui.label(&exercise.prompt);
                                if let crate::models::ExerciseKind::BuildWord { tiles } = &exercise.kind {
                                    ui.label(format!("Tiles: {}", tiles.join("  ")));
                                }
                                ui.text_edit_singleline(answer);
                            });
                        }
                    });

                ui.add_space(10.0);
                ui.horizontal(|ui| {
                    if ui.button("Submit").clicked() {
                        action_submit = true;
                    }
                    if ui.button("Back to Main Screen").clicked() {
                        action_back = true;
                    }
                });
            } else {
                action_back = true;
            }

            if action_submit {
                self.submit_exercises();
            }
            if action_back {
                self.exercise_run = None;
                self.current_screen = AppScreen::Main;
            }
        });
    }

    fn submit_exercises(&mut self) {
        let Some(run) = self.exercise_run.take() else {
            return;
        };
        let score = score_answers(&run.exercises, &run.answers);
        let user_id = self.user_id;

        let result = self.with_conn(|conn| match run.activity {
            Activity::Lesson(id) => actions::complete_lesson(conn, user_id, id, score.accuracy),
            Activity::Unit(id) => actions::complete_israeli_unit(conn, user_id, id, score.accuracy),
        });

        match result {
            Ok(outcome) => {
                self.message = Some(format!(
                    "{} of {} correct\n{}",
                    score.correct,
                    score.total,
                    format_outcome(&run.title, &outcome)
                ));
                self.current_screen = AppScreen::Main;
                self.refresh();
            }
            Err(e) => {
                self.exercise_run = Some(run);
                self.show_error("Submitting answers", e);
            }
        }
    }

    fn render_practice_screen(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let mut action_finish = false;
            let mut action_back = false;

            ui.heading("Practice");
            egui::ComboBox::from_label("Mode")
                .selected_text(self.practice_modality.as_str())
                .show_ui(ui, |ui| {
                    for modality in Modality::ALL {
                        ui.selectable_value(&mut self.practice_modality, modality, modality.as_str());
                    }
                });

            ui.add_space(10.0);
            if self.practice_modality == Modality::Blurting {
                let deck_name = self
                    .selected_deck_index
                    .and_then(|i| self.decks.get(i))
                    .map(|d| d.name.clone())
                    .unwrap_or_default();
                ui.label(format!(
                    "Write every word you remember from '{}', in Hebrew:",
                    deck_name
                ));
                ui.text_edit_multiline(&mut self.blurt_text);
            } else {
                ui.label("How did it go?");
                ui.add(egui::Slider::new(&mut self.practice_accuracy, 0..=100).text("Accuracy %"));
            }

            ui.add_space(10.0);
            ui.horizontal(|ui| {
                if ui.button("Finish").clicked() {
                    action_finish = true;
                }
                if ui.button("Back to Main Screen").clicked() {
                    action_back = true;
                }
            });

            if action_finish {
                self.finish_practice();
            }
            if action_back {
                self.current_screen = AppScreen::Main;
            }
        });
    }

    fn finish_practice(&mut self) {
        let modality = self.practice_modality;
        let accuracy = if modality == Modality::Blurting {
            let targets: Vec<String> = self
                .selected_deck_index
                .and_then(|i| self.decks.get(i))
                .map(|d| d.flashcards.iter().map(|c| c.hebrew.clone()).collect())
                .unwrap_or_default();
            if targets.is_empty() {
                warn!("Blurting practice without a deck selected");
            }
            blurt_accuracy(&targets, &self.blurt_text)
        } else {
            self.practice_accuracy
        };

        let user_id = self.user_id;
        match self.with_conn(|conn| actions::complete_practice(conn, user_id, modality, accuracy)) {
            Ok(outcome) => {
                self.message = Some(format_outcome(
                    &format!("{} practice", modality),
                    &outcome,
                ));
                self.blurt_text.clear();
                self.current_screen = AppScreen::Main;
                self.refresh();
            }
            Err(e) => self.show_error("Finishing practice", e),
        }
    }

    fn render_review_screen(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let mut action_toggle = false;
            let mut action_grade: Option<u8> = None;
            let mut action_back = false;

            if let Some(session) = &self.learning_session {
                ui.heading(format!("Reviewing: {}", session.deck_name));
                ui.label(session.phase_message());
                ui.label(format!(
                    "Progress: {} / {} recalled ({} remaining)",
                    session.learned_count(),
                    session.total_count(),
                    session.remaining_count()
                ));
                ui.add_space(20.0);

                if session.is_completed() {
                    ui.heading("כָּל הַכָּבוֹד!");
                    ui.label("Every due card has been recalled.");
                    ui.add_space(20.0);
                    if ui.button("Back to Main Screen").clicked() {
                        action_back = true;
                    }
                } else if let Some(card) = session.current_card() {
                    let show_answer = session.show_answer;

                    ui.group(|ui| {
                        ui.set_min_height(200.0);
                        ui.vertical_centered(|ui| {
                            ui.add_space(20.0);
                            ui.heading(&card.flashcard.hebrew);
                            ui.add_space(20.0);

                            if show_answer {
                                if !card.flashcard.transliteration.is_empty() {
                                    ui.label(&card.flashcard.transliteration);
                                }
                                ui.heading(&card.flashcard.english);
                            } else {
                                ui.label("(Click 'Show Answer' to reveal)");
                            }
                            ui.add_space(20.0);
                        });
                    });

                    ui.add_space(20.0);

                    if !show_answer {
                        if ui.button("Show Answer").clicked() {
                            action_toggle = true;
                        }
                    } else {
                        ui.label("Rate your recall:");
                        let labels = [
                            "0 - Blackout",
                            "1 - Wrong",
                            "2 - Wrong (familiar)",
                            "3 - Difficult",
                            "4 - Correct",
                            "5 - Perfect",
                        ];
                        let pass = PASS_QUALITY as usize;
                        for row in [&labels[..pass], &labels[pass..]] {
                            ui.horizontal(|ui| {
                                for label in row {
                                    if ui.button(*label).clicked() {
                                        action_grade = label[..1].parse().ok();
                                    }
                                }
                            });
                        }
                    }

                    ui.add_space(20.0);
                    if ui.button("Back to Main Screen").clicked() {
                        action_back = true;
                    }
                }
            } else {
                action_back = true;
            }

            if action_toggle {
                if let Some(session) = &mut self.learning_session {
                    session.toggle_answer();
                }
            }
            if let Some(quality) = action_grade {
                let graded = match &mut self.learning_session {
                    Some(session) => session.grade_current_card(quality).map(|_| session.next_card()),
                    None => Ok(()),
                };
                if let Err(e) = graded {
                    self.show_error("Saving review", e);
                }
            }
            if action_back {
                self.current_screen = AppScreen::Main;
                self.learning_session = None;
            }
        });
    }

    /// Starts a review session with the deck's cards due today
    fn start_review_session(&mut self, deck_index: usize) {
        let Some(deck) = self.decks.get(deck_index) else {
            return;
        };
        let deck_name = deck.name.clone();
        let user_id = self.user_id;

        let due = self.with_conn(|conn| {
            let today = db::get_current_date(conn)?;
            flashcards::get_flashcards_due_for_review(conn, user_id, &deck_name, today)
        });

        match due {
            Ok(cards) if cards.is_empty() => {
                self.message = Some(format!("No cards in '{}' are due today.", deck_name));
            }
            Ok(cards) => {
                self.learning_session = Some(LearningSession::new_from_due_cards(
                    deck_name,
                    user_id,
                    cards,
                    Arc::clone(&self.conn),
                ));
                self.current_screen = AppScreen::Review;
            }
            Err(e) => self.show_error("Loading due cards", e),
        }
    }

    /// Handles deck export to JSON file
    fn handle_export(&mut self, deck_index: usize) {
        self.show_export_dialog = false;
        let Some(deck) = self.decks.get(deck_index).cloned() else {
            return;
        };

        if let Some(path) = rfd::FileDialog::new()
            .set_file_name(format!("{}.json", deck.name))
            .add_filter("JSON files", &["json"])
            .save_file()
        {
            match export_deck_to_path(&deck, &path) {
                Ok(()) => {
                    self.message = Some(format!("Deck '{}' exported successfully!", deck.name));
                }
                Err(e) => self.show_error("Export", e),
            }
        }
    }

    /// Handles deck import from JSON file
    fn handle_import(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON files", &["json"])
            .pick_file()
        else {
            return;
        };

        let imported = import_deck_from_path(&path)
            .and_then(|deck| self.with_conn(|conn| flashcards::import_deck(conn, &deck)).map(|_| deck));

        match imported {
            Ok(deck) => {
                self.message = Some(format!(
                    "Deck '{}' imported successfully with {} cards!",
                    deck.name,
                    deck.flashcards.len()
                ));
                self.reload_catalog();
            }
            Err(e) => {
                error!("Import from '{}' failed: {}", path.display(), e);
                self.message = Some(format!(
                    "Import failed: {}\n\nPlease check the file has this structure:\n{{\n  \"name\": \"Deck Name\",\n  \"flashcards\": [{{ \"hebrew\": \"...\", \"english\": \"...\" }}]\n}}",
                    e
                ));
            }
        }
    }

    fn handle_export_progress(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(format!("{}-progress.json", self.username))
            .add_filter("JSON files", &["json"])
            .save_file()
        else {
            return;
        };

        let report = ProgressReport {
            username: self.username.clone(),
            generated_on: self
                .current_date
                .unwrap_or_else(|| chrono::Local::now().date_naive()),
            progress: self.progress.clone(),
            achievements: self.unlocked.clone(),
        };

        match export_progress_to_path(&report, &path) {
            Ok(()) => self.message = Some("Progress exported successfully!".to_string()),
            Err(e) => self.show_error("Exporting progress", e),
        }
    }
}
