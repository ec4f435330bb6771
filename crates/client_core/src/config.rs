use std::{collections::HashMap, fs, path::Path};

use shared::domain::Locale;
use thiserror::Error;
use tracing::warn;
use url::Url;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const CONFIG_FILE_NAME: &str = "search.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid backend url '{url}': {source}")]
    InvalidBackendUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("backend url '{0}' must use http or https")]
    UnsupportedScheme(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub backend_url: String,
    pub locale: Locale,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.into(),
            locale: Locale::En,
        }
    }
}

impl Settings {
    pub fn query_url(&self) -> Result<Url, ConfigError> {
        endpoint_url(&self.backend_url, "query")
    }

    pub fn health_url(&self) -> Result<Url, ConfigError> {
        endpoint_url(&self.backend_url, "health")
    }
}

/// Loads `search.toml` from the working directory, then applies environment overrides.
pub fn load_settings() -> Settings {
    load_settings_from(Path::new(CONFIG_FILE_NAME), |name| std::env::var(name).ok())
}

pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<HashMap<String, String>>(&raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.get("backend_url") {
                    settings.backend_url = v.clone();
                }
                if let Some(v) = file_cfg.get("locale") {
                    apply_locale(&mut settings, v);
                }
            }
            Err(err) => warn!(
                path = %path.display(),
                "ignoring unparseable config file: {err}"
            ),
        }
    }

    let read = |name: &str| env(name).filter(|value| !value.trim().is_empty());

    if let Some(v) = read("SEARCH_API_URL") {
        settings.backend_url = v;
    }
    if let Some(v) = read("APP__BACKEND_URL") {
        settings.backend_url = v;
    }
    if let Some(v) = read("APP__LOCALE") {
        apply_locale(&mut settings, &v);
    }

    settings
}

fn apply_locale(settings: &mut Settings, raw: &str) {
    match Locale::parse(raw) {
        Some(locale) => settings.locale = locale,
        None => warn!("unknown locale '{raw}', keeping {:?}", settings.locale),
    }
}

/// Joins `path` onto the configured base, tolerating a trailing slash on the base.
pub fn endpoint_url(base: &str, path: &str) -> Result<Url, ConfigError> {
    let trimmed = base.trim().trim_end_matches('/');
    let url = Url::parse(&format!("{trimmed}/{path}")).map_err(|source| {
        ConfigError::InvalidBackendUrl {
            url: base.to_string(),
            source,
        }
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::UnsupportedScheme(base.to_string()));
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use std::{
        env,
        time::{SystemTime, UNIX_EPOCH},
    };

    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn temp_config(contents: &str) -> std::path::PathBuf {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let dir = env::temp_dir().join(format!("search_client_config_test_{suffix}"));
        fs::create_dir_all(&dir).expect("temp dir");
        let path = dir.join(CONFIG_FILE_NAME);
        fs::write(&path, contents).expect("write config");
        path
    }

    #[test]
    fn defaults_when_nothing_is_configured() {
        let settings = load_settings_from(Path::new("/nonexistent/search.toml"), no_env);
        assert_eq!(settings, Settings::default());
        assert_eq!(
            settings.query_url().expect("url").as_str(),
            "http://localhost:8000/query"
        );
    }

    #[test]
    fn file_values_are_overridden_by_environment() {
        let path = temp_config("backend_url = \"http://search.internal:9000\"\nlocale = \"ja\"\n");

        let from_file = load_settings_from(&path, no_env);
        assert_eq!(from_file.backend_url, "http://search.internal:9000");
        assert_eq!(from_file.locale, Locale::Ja);

        let overridden = load_settings_from(&path, |name| match name {
            "APP__BACKEND_URL" => Some("https://rag.example.com/api/".to_string()),
            "APP__LOCALE" => Some("en".to_string()),
            _ => None,
        });
        assert_eq!(overridden.backend_url, "https://rag.example.com/api/");
        assert_eq!(overridden.locale, Locale::En);

        fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
    }

    #[test]
    fn blank_environment_values_are_ignored() {
        let settings = load_settings_from(Path::new("/nonexistent/search.toml"), |name| {
            (name == "SEARCH_API_URL").then(|| "   ".to_string())
        });
        assert_eq!(settings.backend_url, DEFAULT_BACKEND_URL);
    }

    #[test]
    fn endpoint_url_tolerates_trailing_slash_and_subpath() {
        assert_eq!(
            endpoint_url("https://rag.example.com/api/", "query")
                .expect("url")
                .as_str(),
            "https://rag.example.com/api/query"
        );
    }

    #[test]
    fn endpoint_url_rejects_garbage_and_foreign_schemes() {
        assert!(matches!(
            endpoint_url("not a url", "query"),
            Err(ConfigError::InvalidBackendUrl { .. })
        ));
        assert!(matches!(
            endpoint_url("ftp://files.example.com", "query"),
            Err(ConfigError::UnsupportedScheme(_))
        ));
    }
}
