//! Main application UI and state management.
//! Home, play, manage and statistics screens on top of one SQLite connection.

use chrono::Local;
use eframe::egui;
use flashcards_app::config::AppConfig;
use flashcards_app::database::{self, db};
use flashcards_app::export::json::{
    CategoryExport, export_category_to_path, import_category, import_into_store,
};
use flashcards_app::models::category::sort_by_name;
use flashcards_app::models::stats::format_percent;
use flashcards_app::models::{Card, Category, QuizMode, QuizSession, StatsReport};
use log::{info, warn};
use rusqlite::Connection;

/// Application screen states
#[derive(Default, Clone, Copy, PartialEq)]
enum AppScreen {
    #[default]
    Home,
    Play,
    Manage,
    Stats,
}

/// One run through the quiz, restarted whenever the category filter changes
struct PlayState {
    session: QuizSession,
    category_filter: Option<String>,
    user_answer: String,
}

enum PlayAction {
    Check,
    Next,
    SwitchMode(QuizMode),
    Filter(Option<String>),
    Restart,
}

struct EditingCard {
    id: String,
    question: String,
    answer: String,
}

#[derive(Default)]
struct ManageState {
    cards: Vec<Card>,
    active_category_id: Option<String>,
    new_category_name: String,
    new_question: String,
    new_answer: String,
    renaming: Option<(String, String)>,
    editing_card: Option<EditingCard>,
}

enum ManageAction {
    Select(String),
    AddCategory,
    StartRename(String, String),
    SaveRename,
    CancelRename,
    DeleteCategory(String),
    AddCard,
    StartEdit(Card),
    SaveEdit,
    CancelEdit,
    DeleteCard(String),
}

/// Main application state
pub struct FlashcardsApp {
    conn: Connection,
    config: AppConfig,
    current_screen: AppScreen,
    categories: Vec<Category>,
    play: Option<PlayState>,
    manage: ManageState,
    stats: Option<StatsReport>,

    show_confirmation_dialog: bool,
    allowed_to_close: bool,
    show_export_dialog: bool,
    message: Option<String>,
}

impl eframe::App for FlashcardsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.current_screen != AppScreen::Home {
            self.render_top_bar(ctx);
        }

        match self.current_screen {
            AppScreen::Home => self.render_home_screen(ctx),
            AppScreen::Play => self.render_play_screen(ctx),
            AppScreen::Manage => self.render_manage_screen(ctx),
            AppScreen::Stats => self.render_stats_screen(ctx),
        }

        // Handle window close requests with confirmation dialog
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
            self.render_export_dialog(ctx);
        }

        if let Some(message) = &self.message {
            let mut dismissed = false;
            egui::Window::new("Flashcards")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(message);
                    ui.add_space(10.0);
                    if ui.button("OK").clicked() {
                        dismissed = true;
                    }
                });
            if dismissed {
                self.message = None;
            }
        }
    }
}

impl FlashcardsApp {
    pub fn new(config: AppConfig, conn: Connection) -> Self {
        let mut app = Self {
            conn,
            config,
            current_screen: AppScreen::Home,
            categories: Vec::new(),
            play: None,
            manage: ManageState::default(),
            stats: None,
            show_confirmation_dialog: false,
            allowed_to_close: false,
            show_export_dialog: false,
            message: None,
        };
        app.reload_categories();
        app
    }

    /// Logs a failed store call and tells the user; the screen keeps what it had.
    fn report<T>(&mut self, what: &str, result: database::Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Failed to {}: {}", what, e);
                self.message = Some(format!("Failed to {}: {}", what, e));
                None
            }
        }
    }

    fn reload_categories(&mut self) {
        let result = db::list_categories(&self.conn);
        if let Some(categories) = self.report("load categories", result) {
            self.categories = categories;
        }
    }

    fn open_screen(&mut self, screen: AppScreen) {
        match screen {
            AppScreen::Home => {}
            AppScreen::Play => {
                let mode = self.config.default_mode;
                self.start_play(None, mode);
            }
            AppScreen::Manage => self.reload_manage(),
            AppScreen::Stats => self.reload_stats(),
        }
        self.current_screen = screen;
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        let mut go_home = false;
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("← Home").clicked() {
                    go_home = true;
                }
                ui.label(Local::now().format("%Y-%m-%d").to_string());
            });
        });
        if go_home {
            self.current_screen = AppScreen::Home;
            self.play = None;
        }
    }

    /// Renders the landing screen with navigation and import/export
    fn render_home_screen(&mut self, ctx: &egui::Context) {
        let mut next_screen: Option<AppScreen> = None;
        let mut action_import = false;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(60.0);
                ui.heading("Flashcards");
                ui.add_space(40.0);

                if ui.button("Play").clicked() {
                    next_screen = Some(AppScreen::Play);
                }
                ui.add_space(10.0);
                if ui.button("Manage categories and cards").clicked() {
                    next_screen = Some(AppScreen::Manage);
                }
                ui.add_space(10.0);
                if ui.button("Statistics").clicked() {
                    next_screen = Some(AppScreen::Stats);
                }

                ui.add_space(40.0);
                ui.separator();

                ui.horizontal(|ui| {
                    if ui.button("Export Category").clicked() {
                        self.show_export_dialog = true;
                    }
                    if ui.button("Import Category").clicked() {
                        action_import = true;
                    }
                });
            });
        });

        if let Some(screen) = next_screen {
            self.open_screen(screen);
        }
        if action_import {
            self.handle_import();
        }
    }

    fn start_play(&mut self, category_filter: Option<String>, mode: QuizMode) {
        self.reload_categories();
        let result = db::list_cards(category_filter.as_deref(), &self.conn);
        let cards = self.report("load cards", result).unwrap_or_default();

        info!("Starting {} quiz with {} cards", mode, cards.len());
        self.play = Some(PlayState {
            session: QuizSession::new(cards, mode),
            category_filter,
            user_answer: String::new(),
        });
    }

    /// Renders the quiz: mode switch, category filter, current card and verdict
    fn render_play_screen(&mut self, ctx: &egui::Context) {
        let mut action: Option<PlayAction> = None;
        let categories = &self.categories;
        let Some(play) = &mut self.play else {
            return;
        };

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                for mode in [QuizMode::Random, QuizMode::Ordered] {
                    let is_selected = play.session.mode() == mode;
                    if ui.selectable_label(is_selected, mode.label()).clicked() && !is_selected {
                        action = Some(PlayAction::SwitchMode(mode));
                    }
                }
            });

            let selected_text = play
                .category_filter
                .as_ref()
                .and_then(|id| categories.iter().find(|c| &c.id == id))
                .map(|c| c.name.clone())
                .unwrap_or_else(|| "All categories".to_string());
            let mut filter = play.category_filter.clone();
            egui::ComboBox::from_label("Category")
                .selected_text(selected_text)
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut filter, None, "All categories");
                    for category in categories {
                        ui.selectable_value(&mut filter, Some(category.id.clone()), &category.name);
                    }
                });
            if filter != play.category_filter {
                action = Some(PlayAction::Filter(filter));
            }

            ui.separator();

            if play.session.is_exhausted() {
                ui.add_space(20.0);
                if play.session.is_empty() {
                    ui.heading("No cards to play.");
                } else {
                    ui.heading("All cards done!");
                    ui.add_space(10.0);
                    if ui.button("Play again").clicked() {
                        action = Some(PlayAction::Restart);
                    }
                }
                return;
            }

            let Some(card) = play.session.current_card() else {
                return;
            };
            let question = card.question.clone();
            let answer = card.answer.clone();

            ui.label("Card");
            ui.heading(&question);
            ui.add_space(20.0);

            if let Some(verdict) = play.session.verdict().cloned() {
                ui.group(|ui| {
                    ui.label("Correct answer:");
                    ui.label(&answer);
                });
                ui.add_space(10.0);
                if verdict.is_correct {
                    ui.colored_label(egui::Color32::from_rgb(60, 160, 90), "Correct!");
                } else {
                    ui.colored_label(egui::Color32::from_rgb(200, 60, 60), "Wrong!");
                }
                ui.add_space(10.0);
                if ui.button("Next card →").clicked() {
                    action = Some(PlayAction::Next);
                }
            } else {
                ui.label("Your answer:");
                ui.text_edit_multiline(&mut play.user_answer);
                let can_submit = play.session.can_submit(&play.user_answer);
                if ui.add_enabled(can_submit, egui::Button::new("Check")).clicked() {
                    action = Some(PlayAction::Check);
                }
            }

            ui.separator();
            ui.label(format!(
                "Card {} / {}",
                play.session.position(),
                play.session.len()
            ));
        });

        if let Some(action) = action {
            self.apply_play_action(action);
        }
    }

    fn apply_play_action(&mut self, action: PlayAction) {
        let Some(play) = &mut self.play else {
            return;
        };

        match action {
            PlayAction::Check => {
                if let Some(verdict) = play.session.submit_answer(&play.user_answer) {
                    // A lost attempt only skews statistics, the quiz goes on
                    if let Err(e) =
                        db::record_attempt(&verdict.card_id, verdict.is_correct, &self.conn)
                    {
                        warn!("Failed to record attempt on card {}: {}", verdict.card_id, e);
                    }
                }
            }
            PlayAction::Next => {
                play.session.advance();
                play.user_answer.clear();
            }
            PlayAction::SwitchMode(mode) => {
                play.session.set_mode(mode);
                play.user_answer.clear();
            }
            PlayAction::Filter(filter) => {
                let mode = play.session.mode();
                self.start_play(filter, mode);
            }
            PlayAction::Restart => {
                let filter = play.category_filter.clone();
                let mode = play.session.mode();
                self.start_play(filter, mode);
            }
        }
    }

    fn reload_manage(&mut self) {
        self.reload_categories();
        let result = db::list_cards(None, &self.conn);
        if let Some(cards) = self.report("load cards", result) {
            self.manage.cards = cards;
        }

        let active_exists = self
            .manage
            .active_category_id
            .as_ref()
            .is_some_and(|id| self.categories.iter().any(|c| &c.id == id));
        if !active_exists {
            self.manage.active_category_id = self.categories.first().map(|c| c.id.clone());
        }
    }

    /// Renders category and card management
    fn render_manage_screen(&mut self, ctx: &egui::Context) {
        let mut action: Option<ManageAction> = None;
        let categories = &self.categories;
        let manage = &mut self.manage;

        egui::SidePanel::left("categories_panel")
            .resizable(false)
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Categories");
                ui.horizontal(|ui| {
                    ui.text_edit_singleline(&mut manage.new_category_name);
                    if ui.button("Add").clicked() && !manage.new_category_name.trim().is_empty() {
                        action = Some(ManageAction::AddCategory);
                    }
                });
                ui.separator();

                egui::ScrollArea::vertical()
                    .id_source("categories_list")
                    .show(ui, |ui| {
                        for category in categories {
                            ui.horizontal(|ui| {
                                let renaming_this = manage
                                    .renaming
                                    .as_ref()
                                    .is_some_and(|(id, _)| id == &category.id);

                                if renaming_this {
                                    if let Some((_, name)) = &mut manage.renaming {
                                        ui.text_edit_singleline(name);
                                    }
                                    if ui.button("OK").clicked() {
                                        action = Some(ManageAction::SaveRename);
                                    }
                                    if ui.button("Cancel").clicked() {
                                        action = Some(ManageAction::CancelRename);
                                    }
                                    return;
                                }

                                let is_active =
                                    manage.active_category_id.as_ref() == Some(&category.id);
                                if ui.selectable_label(is_active, &category.name).clicked() {
                                    action = Some(ManageAction::Select(category.id.clone()));
                                }
                                if ui.small_button("Edit").clicked() {
                                    action = Some(ManageAction::StartRename(
                                        category.id.clone(),
                                        category.name.clone(),
                                    ));
                                }
                                if ui.small_button("Delete").clicked() {
                                    action = Some(ManageAction::DeleteCategory(category.id.clone()));
                                }
                            });
                        }
                    });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            let active = manage
                .active_category_id
                .as_ref()
                .and_then(|id| categories.iter().find(|c| &c.id == id));
            let Some(active) = active else {
                ui.heading("Cards");
                ui.label("Select a category on the left first.");
                return;
            };

            let cards: Vec<&Card> = manage
                .cards
                .iter()
                .filter(|card| card.category_id == active.id)
                .collect();

            ui.heading(&active.name);
            ui.label(format!("{} cards in this category.", cards.len()));
            ui.separator();

            ui.horizontal(|ui| {
                ui.label("Question:");
                ui.text_edit_singleline(&mut manage.new_question);
            });
            ui.horizontal(|ui| {
                ui.label("Answer:");
                ui.text_edit_singleline(&mut manage.new_answer);
            });
            let can_add =
                !manage.new_question.trim().is_empty() && !manage.new_answer.trim().is_empty();
            if ui.add_enabled(can_add, egui::Button::new("Add Card")).clicked() {
                action = Some(ManageAction::AddCard);
            }

            ui.separator();

            if cards.is_empty() {
                ui.label("No cards in this category yet.");
                return;
            }

            egui::ScrollArea::vertical()
                .id_source("cards_list")
                .show(ui, |ui| {
                    egui::Grid::new("cards_grid")
                        .striped(true)
                        .num_columns(3)
                        .show(ui, |ui| {
                            ui.strong("Question");
                            ui.strong("Answer");
                            ui.strong("Actions");
                            ui.end_row();

                            for card in &cards {
                                ui.label(&card.question);
                                ui.label(&card.answer);
                                ui.horizontal(|ui| {
                                    if ui.small_button("Edit").clicked() {
                                        action = Some(ManageAction::StartEdit((*card).clone()));
                                    }
                                    if ui.small_button("Delete").clicked() {
                                        action = Some(ManageAction::DeleteCard(card.id.clone()));
                                    }
                                });
                                ui.end_row();
                            }
                        });
                });
        });

        if let Some(editing) = &mut manage.editing_card {
            egui::Window::new("Edit card")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label("Question:");
                    ui.text_edit_multiline(&mut editing.question);
                    ui.label("Correct answer:");
                    ui.text_edit_multiline(&mut editing.answer);
                    ui.horizontal(|ui| {
                        if ui.button("Cancel").clicked() {
                            action = Some(ManageAction::CancelEdit);
                        }
                        let can_save = !editing.question.trim().is_empty()
                            && !editing.answer.trim().is_empty();
                        if ui.add_enabled(can_save, egui::Button::new("Save")).clicked() {
                            action = Some(ManageAction::SaveEdit);
                        }
                    });
                });
        }

        if let Some(action) = action {
            self.apply_manage_action(action);
        }
    }

    fn apply_manage_action(&mut self, action: ManageAction) {
        match action {
            ManageAction::Select(id) => {
                self.manage.active_category_id = Some(id);
            }
            ManageAction::AddCategory => {
                let result = db::create_category(&self.manage.new_category_name, &self.conn);
                if let Some(category) = self.report("create category", result) {
                    self.manage.active_category_id = Some(category.id.clone());
                    self.manage.new_category_name.clear();
                    self.categories.push(category);
                    sort_by_name(&mut self.categories);
                }
            }
            ManageAction::StartRename(id, name) => {
                self.manage.renaming = Some((id, name));
            }
            ManageAction::SaveRename => {
                let Some((id, name)) = self.manage.renaming.take() else {
                    return;
                };
                let result = db::rename_category(&id, &name, &self.conn);
                match self.report("rename category", result) {
                    Some(renamed) => {
                        if let Some(category) = self.categories.iter_mut().find(|c| c.id == id) {
                            *category = renamed;
                        }
                        sort_by_name(&mut self.categories);
                    }
                    // keep the field open with what was typed
                    None => self.manage.renaming = Some((id, name)),
                }
            }
            ManageAction::CancelRename => {
                self.manage.renaming = None;
            }
            ManageAction::DeleteCategory(id) => {
                let result = db::delete_category(&id, &self.conn);
                if self.report("delete category", result).is_some() {
                    self.categories.retain(|c| c.id != id);
                    self.manage.cards.retain(|card| card.category_id != id);
                    if self.manage.active_category_id.as_deref() == Some(id.as_str()) {
                        self.manage.active_category_id =
                            self.categories.first().map(|c| c.id.clone());
                    }
                }
            }
            ManageAction::AddCard => {
                let Some(category_id) = self.manage.active_category_id.clone() else {
                    return;
                };
                let result = db::create_card(
                    &category_id,
                    &self.manage.new_question,
                    &self.manage.new_answer,
                    &self.conn,
                );
                if let Some(card) = self.report("add card", result) {
                    self.manage.cards.push(card);
                    self.manage.new_question.clear();
                    self.manage.new_answer.clear();
                }
            }
            ManageAction::StartEdit(card) => {
                self.manage.editing_card = Some(EditingCard {
                    id: card.id,
                    question: card.question,
                    answer: card.answer,
                });
            }
            ManageAction::SaveEdit => {
                let Some(editing) = self.manage.editing_card.take() else {
                    return;
                };
                let result =
                    db::update_card(&editing.id, &editing.question, &editing.answer, &self.conn);
                match self.report("update card", result) {
                    Some(updated) => {
                        if let Some(card) =
                            self.manage.cards.iter_mut().find(|c| c.id == updated.id)
                        {
                            *card = updated;
                        }
                    }
                    None => self.manage.editing_card = Some(editing),
                }
            }
            ManageAction::CancelEdit => {
                self.manage.editing_card = None;
            }
            ManageAction::DeleteCard(id) => {
                let result = db::delete_card(&id, &self.conn);
                if self.report("delete card", result).is_some() {
                    self.manage.cards.retain(|card| card.id != id);
                }
            }
        }
    }

    fn reload_stats(&mut self) {
        let attempts = db::list_attempts(&self.conn);
        let attempts = self.report("load attempts", attempts);
        let cards = db::list_cards(None, &self.conn);
        let cards = self.report("load cards", cards);

        self.stats = match (attempts, cards) {
            (Some(attempts), Some(cards)) => {
                Some(StatsReport::build(&attempts, &cards, &Local::now()))
            }
            _ => None,
        };
    }

    /// Renders totals, recent windows and the hardest cards
    fn render_stats_screen(&mut self, ctx: &egui::Context) {
        let mut refresh = false;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Statistics");
                if ui.button("Refresh").clicked() {
                    refresh = true;
                }
            });
            ui.label("An overview of your answers.");
            ui.separator();

            let Some(report) = &self.stats else {
                ui.label("Statistics could not be loaded.");
                return;
            };

            ui.group(|ui| {
                egui::Grid::new("summary_grid").num_columns(2).show(ui, |ui| {
                    stat_row(ui, "Total answers", report.summary.total.to_string());
                    stat_row(ui, "Correct", report.summary.correct.to_string());
                    stat_row(ui, "Wrong", report.summary.wrong.to_string());
                    stat_row(ui, "Accuracy", format_percent(report.summary.accuracy));
                });
            });

            ui.add_space(10.0);

            ui.group(|ui| {
                ui.strong("Periods");
                egui::Grid::new("periods_grid").num_columns(2).show(ui, |ui| {
                    let today = &report.recent.today;
                    let week = &report.recent.last_7_days;
                    stat_row(ui, "Today - answers", today.attempts.to_string());
                    stat_row(ui, "Today - accuracy", format_percent(today.accuracy));
                    stat_row(ui, "Last 7 days - answers", week.attempts.to_string());
                    stat_row(ui, "Last 7 days - accuracy", format_percent(week.accuracy));
                });
            });

            ui.add_space(10.0);

            ui.group(|ui| {
                ui.strong("Hardest cards");
                if report.hardest.is_empty() {
                    ui.label("Not enough answers yet.");
                    return;
                }
                egui::Grid::new("hardest_grid")
                    .striped(true)
                    .num_columns(3)
                    .show(ui, |ui| {
                        ui.strong("Card");
                        ui.strong("Answers");
                        ui.strong("Accuracy");
                        ui.end_row();

                        for card in &report.hardest {
                            ui.label(&card.label);
                            ui.label(format!("{} / {}", card.correct, card.attempts));
                            ui.label(format_percent(card.accuracy));
                            ui.end_row();
                        }
                    });
            });
        });

        if refresh {
            self.reload_stats();
        }
    }

    fn render_export_dialog(&mut self, ctx: &egui::Context) {
        let mut export_category_index: Option<usize> = None;
        let mut should_cancel = false;

        egui::Window::new("Export Category")
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label("Select a category to export:");
                ui.separator();

                for (i, category) in self.categories.iter().enumerate() {
                    if ui.button(&category.name).clicked() {
                        export_category_index = Some(i);
                    }
                }

                ui.separator();

                if ui.button("Cancel").clicked() {
                    should_cancel = true;
                }
            });

        if let Some(i) = export_category_index {
            self.handle_export(i);
        }
        if should_cancel {
            self.show_export_dialog = false;
        }
    }

    /// Handles category export to JSON file
    fn handle_export(&mut self, category_index: usize) {
        self.show_export_dialog = false;
        let Some(category) = self.categories.get(category_index).cloned() else {
            return;
        };

        let result = db::list_cards(Some(&category.id), &self.conn);
        let Some(cards) = self.report("load cards", result) else {
            return;
        };
        let export = CategoryExport::new(&category, &cards);

        if let Some(path) = rfd::FileDialog::new()
            .set_file_name(format!("{}.json", category.name))
            .add_filter("JSON files", &["json"])
            .save_file()
        {
            self.message = Some(match export_category_to_path(&export, &path) {
                Ok(()) => format!("Category '{}' exported successfully!", category.name),
                Err(e) => {
                    warn!("Export of '{}' failed: {}", category.name, e);
                    format!("Export failed: {}", e)
                }
            });
        }
    }

    /// Handles category import from JSON file
    fn handle_import(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON files", &["json"])
            .pick_file()
        else {
            return;
        };

        let imported = import_category(&path)
            .and_then(|export| import_into_store(&export, &self.conn).map(|c| (c, export)));

        match imported {
            Ok((category, export)) => {
                self.message = Some(format!(
                    "Category '{}' imported successfully with {} cards!",
                    category.name,
                    export.cards.len()
                ));
                self.reload_categories();
            }
            Err(e) => {
                warn!("Import from '{}' failed: {}", path.display(), e);
                self.message = Some(format!(
                    "Import failed: {}\n\nPlease check if the file has correct structure:\n{{\n  \"name\": \"Category Name\",\n  \"cards\": [{{ \"question\": ..., \"answer\": ... }}]\n}}",
                    e
                ));
            }
        }
    }
}

fn stat_row(ui: &mut egui::Ui, label: &str, value: String) {
    ui.label(label);
    ui.strong(value);
    ui.end_row();
}
