use std::time::Duration;

use client_core::{markdown, SessionState, Settings};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use egui::RichText;
use serde::{Deserialize, Serialize};
use shared::{
    domain::Locale,
    protocol::{HealthResponse, QueryResponse},
};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{
    events::{UiError, UiEvent},
    orchestration::dispatch_backend_command,
    reducer::SearchController,
};
use crate::ui::widgets::{show_display_tree, show_results};

pub const SETTINGS_STORAGE_KEY: &str = "search_gui_settings";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistedSearchSettings {
    #[serde(default)]
    pub backend_url: Option<String>,
    #[serde(default)]
    pub locale: Option<Locale>,
}

impl PersistedSearchSettings {
    /// Layers persisted values over `settings` loaded from file and environment.
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(url) = self.backend_url.as_ref().filter(|url| !url.trim().is_empty()) {
            settings.backend_url = url.clone();
        }
        if let Some(locale) = self.locale {
            settings.locale = locale;
        }
    }
}

pub struct SearchApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    controller: SearchController,

    query_input: String,
    backend_url_input: String,
    applied_backend_url: String,
    locale: Locale,

    status: String,
    status_banner: Option<UiError>,
    health: Option<HealthResponse>,
}

impl SearchApp {
    pub fn new(cmd_tx: Sender<BackendCommand>, ui_rx: Receiver<UiEvent>, settings: Settings) -> Self {
        Self {
            controller: SearchController::new(cmd_tx.clone(), settings.locale),
            cmd_tx,
            ui_rx,
            query_input: String::new(),
            backend_url_input: settings.backend_url.clone(),
            applied_backend_url: settings.backend_url,
            locale: settings.locale,
            status: "Starting backend worker...".to_string(),
            status_banner: None,
            health: None,
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::QuerySettled { query_id, outcome } => {
                    self.controller.apply_settlement(query_id, outcome);
                }
                UiEvent::HealthChecked(health) => {
                    self.status = match &health.model {
                        Some(model) => format!("Server status: {} ({model})", health.status),
                        None => format!("Server status: {}", health.status),
                    };
                    self.health = Some(health);
                }
                UiEvent::Error(err) => {
                    tracing::warn!(context = ?err.context(), "{}", err.message());
                    self.status = err.headline();
                    self.status_banner = Some(err);
                }
            }
        }
    }

    fn show_search_bar(&mut self, ui: &mut egui::Ui) {
        let pending = self.controller.is_pending();
        let mut submit = false;

        ui.horizontal(|ui| {
            let input = ui.add_enabled(
                !pending,
                egui::TextEdit::singleline(&mut self.query_input)
                    .hint_text("Search Cosense...")
                    .desired_width((ui.available_width() - 90.0).max(120.0)),
            );
            if input.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                submit = true;
            }

            if pending {
                ui.add(egui::Spinner::new());
            } else if ui.button("Search").clicked() {
                submit = true;
            }
        });

        if submit {
            self.controller.submit(&self.query_input, &mut self.status);
        }
    }

    fn show_status_banner(&mut self, ui: &mut egui::Ui) {
        let Some(banner) = &self.status_banner else {
            return;
        };
        let mut dismissed = false;
        let error_color = ui.visuals().error_fg_color;

        egui::Frame::NONE
            .stroke(egui::Stroke::new(1.0, error_color))
            .corner_radius(8.0)
            .inner_margin(egui::Margin::symmetric(12, 8))
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.colored_label(error_color, banner.headline());
                    if ui.small_button("Dismiss").clicked() {
                        dismissed = true;
                    }
                });
            });

        if dismissed {
            self.status_banner = None;
        }
    }

    fn show_session_state(&self, ui: &mut egui::Ui) {
        match self.controller.state() {
            SessionState::Idle => {
                ui.weak("Ask a question about the Cosense project.");
            }
            SessionState::Pending { query, .. } => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label(format!("Generating an answer for \"{query}\"..."));
                });
            }
            SessionState::Failure { message, .. } => {
                let error_color = ui.visuals().error_fg_color;
                ui.vertical_centered(|ui| {
                    ui.colored_label(error_color, message.as_str());
                });
            }
            SessionState::Success { response, .. } => {
                self.show_answer_card(ui, response);
                ui.add_space(12.0);
                show_results(ui, &response.results);
            }
        }
    }

    fn show_answer_card(&self, ui: &mut egui::Ui, response: &QueryResponse) {
        egui::Frame::NONE
            .fill(ui.visuals().faint_bg_color)
            .corner_radius(12.0)
            .stroke(egui::Stroke::new(
                1.0,
                ui.visuals().widgets.noninteractive.bg_stroke.color,
            ))
            .inner_margin(egui::Margin::symmetric(16, 14))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.horizontal(|ui| {
                    ui.label(RichText::new("AI Answer").strong());
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button("Copy answer").clicked() {
                            ui.ctx().copy_text(response.answer.clone());
                        }
                    });
                });
                ui.add_space(6.0);

                match self.controller.rendered_answer() {
                    Some(tree) => show_display_tree(ui, tree),
                    None => show_display_tree(ui, &markdown::render(&response.answer)),
                }
            });
    }

    fn show_settings(&mut self, ui: &mut egui::Ui) {
        let mut apply = false;
        let mut check = false;

        egui::CollapsingHeader::new("Server settings").show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label("Search API");
                ui.text_edit_singleline(&mut self.backend_url_input);
            });
            ui.horizontal(|ui| {
                ui.label("Error language");
                egui::ComboBox::from_id_salt("error_locale")
                    .selected_text(locale_label(self.locale))
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut self.locale, Locale::En, locale_label(Locale::En));
                        ui.selectable_value(&mut self.locale, Locale::Ja, locale_label(Locale::Ja));
                    });
            });
            ui.horizontal(|ui| {
                apply = ui.button("Apply").clicked();
                check = ui.button("Check server").clicked();
            });
            if let Some(health) = &self.health {
                ui.weak(format!("Last check: {}", health.status));
            }
        });

        if apply {
            self.applied_backend_url = self.backend_url_input.trim().to_string();
            self.controller.set_locale(self.locale);
            self.status_banner = None;
            dispatch_backend_command(
                &self.cmd_tx,
                BackendCommand::Configure {
                    backend_url: self.applied_backend_url.clone(),
                    locale: self.locale,
                },
                &mut self.status,
            );
        }
        if check {
            dispatch_backend_command(&self.cmd_tx, BackendCommand::CheckHealth, &mut self.status);
        }
    }
}

fn locale_label(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "English",
        Locale::Ja => "Japanese",
    }
}

impl eframe::App for SearchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading("Cosense RAG Search");
                ui.weak("SPLADE + Elasticsearch + Gemma3");
            });
            ui.add_space(12.0);

            self.show_search_bar(ui);
            self.show_status_banner(ui);
            ui.add_space(8.0);

            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    self.show_session_state(ui);
                    ui.add_space(18.0);
                    ui.separator();
                    self.show_settings(ui);
                    ui.weak(self.status.as_str());
                });
        });

        if self.controller.is_pending() {
            ctx.request_repaint_after(Duration::from_millis(50));
        } else {
            ctx.request_repaint_after(Duration::from_millis(250));
        }
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        let settings = PersistedSearchSettings {
            backend_url: Some(self.applied_backend_url.clone()),
            locale: Some(self.locale),
        };
        if let Ok(serialized) = serde_json::to_string(&settings) {
            storage.set_string(SETTINGS_STORAGE_KEY, serialized);
        }
    }
}
