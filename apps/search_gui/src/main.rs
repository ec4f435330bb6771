mod backend_bridge;
mod controller;
mod ui;

use clap::Parser;
use client_core::{load_settings, Settings};
use crossbeam_channel::bounded;
use eframe::egui;
use shared::domain::Locale;
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::ui::{PersistedSearchSettings, SearchApp, SETTINGS_STORAGE_KEY};

#[derive(Parser, Debug)]
struct Args {
    /// Base URL of the search API; takes precedence over saved settings.
    #[arg(long)]
    backend_url: Option<String>,
    #[arg(long, value_parser = parse_locale)]
    locale: Option<Locale>,
}

fn parse_locale(raw: &str) -> Result<Locale, String> {
    Locale::parse(raw).ok_or_else(|| format!("unsupported locale '{raw}' (expected en or ja)"))
}

/// Precedence, lowest first: file/env, saved GUI settings, command line.
fn startup_settings(
    mut settings: Settings,
    persisted: Option<PersistedSearchSettings>,
    args: &Args,
) -> Settings {
    if let Some(persisted) = persisted {
        persisted.apply_to(&mut settings);
    }
    if let Some(url) = &args.backend_url {
        settings.backend_url = url.clone();
    }
    if let Some(locale) = args.locale {
        settings.locale = locale;
    }
    settings
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(256);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Cosense RAG Search")
            .with_inner_size([880.0, 760.0])
            .with_min_inner_size([520.0, 420.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Cosense RAG Search",
        options,
        Box::new(move |cc| {
            let persisted = cc.storage.and_then(|storage| {
                storage
                    .get_string(SETTINGS_STORAGE_KEY)
                    .and_then(|text| serde_json::from_str::<PersistedSearchSettings>(&text).ok())
            });
            let settings = startup_settings(load_settings(), persisted, &args);
            backend_bridge::runtime::launch(cmd_rx, ui_tx, settings.clone());
            Ok(Box::new(SearchApp::new(cmd_tx, ui_rx, settings)))
        }),
    )
}
