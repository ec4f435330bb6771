//! UI layer for the search GUI: app shell and answer/result widgets.

pub mod app;
pub mod widgets;

pub use app::{PersistedSearchSettings, SearchApp, SETTINGS_STORAGE_KEY};
