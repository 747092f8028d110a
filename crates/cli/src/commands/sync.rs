use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Subcommand;

use quotedesk_core::sync;

use crate::commands::{read_text, with_session, CommandFailure, CommandResult, Reply, Session};

const COMMAND: &str = "sync";

#[derive(Debug, Clone, Subcommand)]
pub enum SyncCommand {
    #[command(about = "Write the working configuration to a dated JSON file")]
    Export {
        #[arg(long, help = "Write to this path instead of the configured export directory")]
        out: Option<PathBuf>,
    },
    #[command(about = "Apply a previously exported file")]
    Import { file: PathBuf },
    #[command(about = "Print the working configuration as a copy/paste sync code")]
    Code,
    #[command(about = "Apply a sync code; `-` reads it from stdin")]
    ApplyCode { code: String },
}

pub fn run(command: SyncCommand) -> CommandResult {
    with_session(COMMAND, |mut session| async move {
        let outcome = execute(&mut session, command).await;
        (session, outcome)
    })
}

async fn execute(session: &mut Session, command: SyncCommand) -> Result<Reply, CommandFailure> {
    match command {
        SyncCommand::Export { out } => {
            let payload = sync::encode(&session.resolved.working())?;
            let path = out.unwrap_or_else(|| {
                session.config.sync.export_path(&export_date(Utc::now()))
            });
            std::fs::write(&path, payload)
                .with_context(|| format!("could not write `{}`", path.display()))
                .map_err(CommandFailure::io)?;
            tracing::info!(
                event_name = "sync.exported",
                path = %path.display(),
                "configuration exported"
            );
            Ok(Reply::with_data(
                format!("exported to {}", path.display()),
                serde_json::json!({ "path": path }),
            ))
        }
        SyncCommand::Import { file } => {
            let raw = read_text(&file)?;
            apply(session, &raw).await
        }
        SyncCommand::Code => {
            let code = sync::encode(&session.resolved.working())?;
            Ok(Reply::with_data(format!("{} characters", code.len()), code))
        }
        SyncCommand::ApplyCode { code } => {
            let raw = if code == "-" { read_stdin()? } else { code };
            apply(session, &raw).await
        }
    }
}

async fn apply(session: &mut Session, raw: &str) -> Result<Reply, CommandFailure> {
    let applied = sync::import(raw, &mut session.resolved).await?;
    let sections = applied.iter().map(ToString::to_string).collect::<Vec<_>>();
    let message = if sections.is_empty() {
        "nothing to apply".to_string()
    } else {
        format!("applied {}", sections.join(", "))
    };
    Ok(Reply::with_data(message, sections))
}

fn read_stdin() -> Result<String, CommandFailure> {
    let mut raw = String::new();
    std::io::stdin()
        .read_to_string(&mut raw)
        .context("could not read sync code from stdin")
        .map_err(CommandFailure::io)?;
    Ok(raw)
}

/// Calendar date (UTC) stamped on export file names.
fn export_date(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d").to_string()
}
