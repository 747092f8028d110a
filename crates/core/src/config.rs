use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::document::PDF_MEDIA_TYPE;

pub const CONFIG_FILE_NAME: &str = "quotedesk.toml";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub documents: DocumentsConfig,
    pub sync: SyncConfig,
    pub defaults: DefaultsConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentsConfig {
    pub accepted_media_type: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncConfig {
    pub export_dir: PathBuf,
    pub export_prefix: String,
}

/// Shipped system defaults. `payload_path` points at a sync payload whose
/// catalog and rule text replace the built-in ones and whose documents become
/// system documents.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DefaultsConfig {
    pub payload_path: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub export_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl From<ConfigError> for crate::errors::ApplicationError {
    fn from(error: ConfigError) -> Self {
        Self::Configuration(error.to_string())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                database_url: "sqlite://quotedesk.db?mode=rwc".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            documents: DocumentsConfig { accepted_media_type: PDF_MEDIA_TYPE.to_string() },
            sync: SyncConfig {
                export_dir: PathBuf::from("."),
                export_prefix: "QuoteDesk_MasterConfig".to_string(),
            },
            defaults: DefaultsConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl SyncConfig {
    /// `<export_dir>/<prefix>_<YYYY-MM-DD>.json`
    pub fn export_path(&self, date: &str) -> PathBuf {
        self.export_dir.join(format!("{}_{date}.json", self.export_prefix))
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(storage) = patch.storage {
            if let Some(database_url) = storage.database_url {
                self.storage.database_url = database_url;
            }
            if let Some(max_connections) = storage.max_connections {
                self.storage.max_connections = max_connections;
            }
            if let Some(timeout_secs) = storage.timeout_secs {
                self.storage.timeout_secs = timeout_secs;
            }
        }

        if let Some(documents) = patch.documents {
            if let Some(accepted_media_type) = documents.accepted_media_type {
                self.documents.accepted_media_type = accepted_media_type;
            }
        }

        if let Some(sync) = patch.sync {
            if let Some(export_dir) = sync.export_dir {
                self.sync.export_dir = export_dir;
            }
            if let Some(export_prefix) = sync.export_prefix {
                self.sync.export_prefix = export_prefix;
            }
        }

        if let Some(defaults) = patch.defaults {
            if let Some(payload_path) = defaults.payload_path {
                self.defaults.payload_path = Some(payload_path);
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("QUOTEDESK_STORAGE_DATABASE_URL") {
            self.storage.database_url = value;
        }
        if let Some(value) = read_env("QUOTEDESK_STORAGE_MAX_CONNECTIONS") {
            self.storage.max_connections =
                parse_u32("QUOTEDESK_STORAGE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("QUOTEDESK_STORAGE_TIMEOUT_SECS") {
            self.storage.timeout_secs = parse_u64("QUOTEDESK_STORAGE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("QUOTEDESK_DOCUMENTS_ACCEPTED_MEDIA_TYPE") {
            self.documents.accepted_media_type = value;
        }

        if let Some(value) = read_env("QUOTEDESK_SYNC_EXPORT_DIR") {
            self.sync.export_dir = PathBuf::from(value);
        }
        if let Some(value) = read_env("QUOTEDESK_SYNC_EXPORT_PREFIX") {
            self.sync.export_prefix = value;
        }

        if let Some(value) = read_env("QUOTEDESK_DEFAULTS_PAYLOAD_PATH") {
            self.defaults.payload_path = Some(PathBuf::from(value));
        }

        let log_level =
            read_env("QUOTEDESK_LOGGING_LEVEL").or_else(|| read_env("QUOTEDESK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("QUOTEDESK_LOGGING_FORMAT").or_else(|| read_env("QUOTEDESK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.storage.database_url = database_url;
        }
        if let Some(export_dir) = overrides.export_dir {
            self.sync.export_dir = export_dir;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_storage(&self.storage)?;
        validate_documents(&self.documents)?;
        validate_sync(&self.sync)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// The config file `load` would read for `explicit_path`, if any exists.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(CONFIG_FILE_NAME), Path::new("config").join(CONFIG_FILE_NAME)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_storage(storage: &StorageConfig) -> Result<(), ConfigError> {
    let url = storage.database_url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "storage.database_url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if storage.max_connections == 0 {
        return Err(ConfigError::Validation(
            "storage.max_connections must be greater than zero".to_string(),
        ));
    }

    if storage.timeout_secs == 0 || storage.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "storage.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_documents(documents: &DocumentsConfig) -> Result<(), ConfigError> {
    let media_type = documents.accepted_media_type.trim();
    let well_formed = media_type
        .split_once('/')
        .map(|(kind, subtype)| !kind.is_empty() && !subtype.is_empty())
        .unwrap_or(false);
    if !well_formed {
        return Err(ConfigError::Validation(format!(
            "documents.accepted_media_type `{media_type}` is not a media type (expected type/subtype)"
        )));
    }
    Ok(())
}

fn validate_sync(sync: &SyncConfig) -> Result<(), ConfigError> {
    let prefix = sync.export_prefix.trim();
    if prefix.is_empty() || prefix.contains(|ch| ch == '/' || ch == '\\') {
        return Err(ConfigError::Validation(
            "sync.export_prefix must be a non-empty file name prefix without path separators"
                .to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    storage: Option<StoragePatch>,
    documents: Option<DocumentsPatch>,
    sync: Option<SyncPatch>,
    defaults: Option<DefaultsPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct StoragePatch {
    database_url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct DocumentsPatch {
    accepted_media_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SyncPatch {
    export_dir: Option<PathBuf>,
    export_prefix: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DefaultsPatch {
    payload_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
