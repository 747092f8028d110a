pub mod catalog;
pub mod config;
pub mod memo;
pub mod migrate;
pub mod quote_request;
pub mod reset;
pub mod rules;
pub mod show;
pub mod sync;

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;

use quotedesk_core::config::{AppConfig, LoadOptions};
use quotedesk_core::errors::{ApplicationError, InterfaceError};
use quotedesk_core::resolver::{ConfigurationResolver, ResolvedConfiguration, SystemDefaults};
use quotedesk_db::{
    connect_with_settings, migrations, DbPool, SqlDocumentRepository, SqlOverrideRepository,
};

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with_data(command, message, None)
    }

    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: Option<serde_json::Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Failure carried out of a command body; rendered as a `CommandResult`.
#[derive(Debug)]
pub(crate) struct CommandFailure {
    error_class: &'static str,
    message: String,
    exit_code: u8,
}

impl CommandFailure {
    pub(crate) fn new(
        error_class: &'static str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        Self { error_class, message: message.into(), exit_code }
    }

    pub(crate) fn usage(message: impl Into<String>) -> Self {
        Self::new("usage", message, 2)
    }

    pub(crate) fn io(error: anyhow::Error) -> Self {
        Self::new("io", format!("{error:#}"), 9)
    }
}

/// Every application error reaches the operator as a transient notification;
/// the session itself stays usable.
impl From<ApplicationError> for CommandFailure {
    fn from(error: ApplicationError) -> Self {
        let correlation_id = uuid::Uuid::new_v4().to_string();
        let interface = error.into_interface(correlation_id);
        let (error_class, exit_code, detail, correlation_id) = match &interface {
            InterfaceError::Rejected { message, correlation_id } => {
                ("rejected", 6, message, correlation_id)
            }
            InterfaceError::NotDurable { message, correlation_id } => {
                ("not_durable", 7, message, correlation_id)
            }
            InterfaceError::Internal { message, correlation_id } => {
                ("internal", 8, message, correlation_id)
            }
        };
        tracing::warn!(
            event_name = "cli.command_failed",
            error_class,
            correlation_id = %correlation_id,
            detail = %detail,
            "command failed"
        );
        Self::new(error_class, format!("{} ({detail})", interface.user_message()), exit_code)
    }
}

impl From<quotedesk_core::errors::DomainError> for CommandFailure {
    fn from(error: quotedesk_core::errors::DomainError) -> Self {
        ApplicationError::from(error).into()
    }
}

/// Successful command body output.
pub(crate) struct Reply {
    message: String,
    data: Result<Option<serde_json::Value>, serde_json::Error>,
}

impl Reply {
    pub(crate) fn message(message: impl Into<String>) -> Self {
        Self { message: message.into(), data: Ok(None) }
    }

    /// A data value that fails to serialize turns the reply into an
    /// `internal` failure when rendered.
    pub(crate) fn with_data(message: impl Into<String>, data: impl Serialize) -> Self {
        Self { message: message.into(), data: serde_json::to_value(data).map(Some) }
    }
}

/// Device store opened for one command: config, pool and the resolved
/// working configuration.
pub(crate) struct Session {
    pub(crate) config: AppConfig,
    pub(crate) resolver: ConfigurationResolver,
    pub(crate) resolved: ResolvedConfiguration,
    pool: DbPool,
}

impl Session {
    async fn open(config: AppConfig) -> Result<Self, CommandFailure> {
        let defaults = system_defaults(&config)?;
        let pool = connect_with_settings(
            &config.storage.database_url,
            config.storage.max_connections,
            config.storage.timeout_secs,
        )
        .await
        .map_err(|error| CommandFailure::new("db_connectivity", error.to_string(), 4))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| CommandFailure::new("migration", error.to_string(), 5))?;

        let resolver = ConfigurationResolver::new(
            defaults,
            Arc::new(SqlOverrideRepository::new(pool.clone())),
            Arc::new(SqlDocumentRepository::new(pool.clone())),
            config.documents.accepted_media_type.clone(),
        );
        let resolved = resolver.resolve().await;

        Ok(Self { config, resolver, resolved, pool })
    }

    async fn close(self) {
        self.pool.close().await;
    }
}

/// Built-in defaults, or the shipped payload when `defaults.payload_path` is
/// configured.
fn system_defaults(config: &AppConfig) -> Result<SystemDefaults, CommandFailure> {
    let Some(path) = config.defaults.payload_path.as_deref() else {
        return Ok(SystemDefaults::builtin());
    };

    let raw = read_text(path)?;
    let defaults = SystemDefaults::from_payload_text(&raw).map_err(|error| {
        CommandFailure::new(
            "config_validation",
            format!("defaults payload `{}` is unusable: {error}", path.display()),
            2,
        )
    })?;
    tracing::info!(
        event_name = "config.defaults_loaded",
        path = %path.display(),
        catalog_items = defaults.catalog.len(),
        system_documents = defaults.documents.len(),
        "shipped defaults loaded"
    );
    Ok(defaults)
}

pub(crate) fn load_config(command: &str) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            2,
        )
    })
}

pub(crate) fn runtime(command: &str) -> Result<tokio::runtime::Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            3,
        )
    })
}

/// Loads config, opens the device store and runs `body` against the
/// resolved session.
pub(crate) fn with_session<F, Fut>(command: &str, body: F) -> CommandResult
where
    F: FnOnce(Session) -> Fut,
    Fut: Future<Output = (Session, Result<Reply, CommandFailure>)>,
{
    let config = match load_config(command) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match runtime(command) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let outcome = runtime.block_on(async {
        let session = Session::open(config).await?;
        let (session, outcome) = body(session).await;
        session.close().await;
        outcome
    });

    render(command, outcome)
}

fn render(command: &str, outcome: Result<Reply, CommandFailure>) -> CommandResult {
    let failure = match outcome {
        Ok(Reply { message, data: Ok(data) }) => {
            return CommandResult::success_with_data(command, message, data)
        }
        Ok(Reply { data: Err(error), .. }) => {
            tracing::error!(
                event_name = "cli.reply_unserializable",
                command,
                error = %error,
                "command data could not be serialized"
            );
            CommandFailure::new("internal", format!("could not serialize output: {error}"), 8)
        }
        Err(failure) => failure,
    };
    CommandResult::failure(command, failure.error_class, failure.message, failure.exit_code)
}

pub(crate) fn read_text(path: &Path) -> Result<String, CommandFailure> {
    std::fs::read_to_string(path)
        .with_context(|| format!("could not read `{}`", path.display()))
        .map_err(CommandFailure::io)
}
