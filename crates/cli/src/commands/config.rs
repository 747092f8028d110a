use std::env;
use std::fs;
use std::path::Path;

use quotedesk_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

/// `(key path, env vars in precedence order, rendered value)`
type Setting = (&'static str, &'static [&'static str], String);

fn setting(key_path: &'static str, env_keys: &'static [&'static str], value: String) -> Setting {
    (key_path, env_keys, value)
}

fn settings(config: &AppConfig) -> Vec<Setting> {
    vec![
        setting(
            "storage.database_url",
            &["QUOTEDESK_STORAGE_DATABASE_URL"],
            config.storage.database_url.clone(),
        ),
        setting(
            "storage.max_connections",
            &["QUOTEDESK_STORAGE_MAX_CONNECTIONS"],
            config.storage.max_connections.to_string(),
        ),
        setting(
            "storage.timeout_secs",
            &["QUOTEDESK_STORAGE_TIMEOUT_SECS"],
            config.storage.timeout_secs.to_string(),
        ),
        setting(
            "documents.accepted_media_type",
            &["QUOTEDESK_DOCUMENTS_ACCEPTED_MEDIA_TYPE"],
            config.documents.accepted_media_type.clone(),
        ),
        setting(
            "sync.export_dir",
            &["QUOTEDESK_SYNC_EXPORT_DIR"],
            config.sync.export_dir.display().to_string(),
        ),
        setting(
            "sync.export_prefix",
            &["QUOTEDESK_SYNC_EXPORT_PREFIX"],
            config.sync.export_prefix.clone(),
        ),
        setting(
            "defaults.payload_path",
            &["QUOTEDESK_DEFAULTS_PAYLOAD_PATH"],
            config
                .defaults
                .payload_path
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "(built-in)".to_string()),
        ),
        setting(
            "logging.level",
            &["QUOTEDESK_LOGGING_LEVEL", "QUOTEDESK_LOG_LEVEL"],
            config.logging.level.clone(),
        ),
        setting(
            "logging.format",
            &["QUOTEDESK_LOGGING_FORMAT", "QUOTEDESK_LOG_FORMAT"],
            format!("{:?}", config.logging.format),
        ),
    ]
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key_path, env_keys, value) in settings(&config) {
        let source =
            field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(key_path, &value, source));
    }

    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    let set_env_key = env_keys
        .iter()
        .find(|key| env::var(key).map(|value| !value.trim().is_empty()).unwrap_or(false));
    if let Some(env_key) = set_env_key {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
