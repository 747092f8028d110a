use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Subcommand;

use quotedesk_core::domain::document::{UploadedFile, PDF_MEDIA_TYPE};

use crate::commands::show::DocumentSummary;
use crate::commands::{with_session, CommandFailure, CommandResult, Reply, Session};

const COMMAND: &str = "memo";

#[derive(Debug, Clone, Subcommand)]
pub enum MemoCommand {
    #[command(about = "List active documents (system documents first)")]
    List,
    #[command(about = "Upload files; only the accepted media type is kept")]
    Add {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    #[command(about = "Remove a user document by its index in `memo list`")]
    Remove { index: usize },
}

pub fn run(command: MemoCommand) -> CommandResult {
    with_session(COMMAND, |mut session| async move {
        let outcome = execute(&mut session, command).await;
        (session, outcome)
    })
}

async fn execute(session: &mut Session, command: MemoCommand) -> Result<Reply, CommandFailure> {
    let documents = &mut session.resolved.documents;
    match command {
        MemoCommand::List => {
            let summary = DocumentSummary::list(documents.active());
            Ok(Reply::with_data(format!("{} documents", summary.len()), summary))
        }
        MemoCommand::Add { files } => {
            let uploads = files.iter().map(|path| upload(path)).collect::<Result<Vec<_>, _>>()?;
            let offered = uploads.len();
            let staged = documents.stage(uploads);
            let committed = documents.commit().await?;
            Ok(Reply::message(format!(
                "added {committed} documents ({} of {offered} files skipped)",
                offered - staged
            )))
        }
        MemoCommand::Remove { index } => {
            let removed = documents.remove(index).await?;
            Ok(Reply::message(format!("removed document `{}`", removed.name)))
        }
    }
}

fn upload(path: &Path) -> Result<UploadedFile, CommandFailure> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("could not read `{}`", path.display()))
        .map_err(CommandFailure::io)?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(UploadedFile { name, media_type: media_type_for(path).to_string(), bytes })
}

fn media_type_for(path: &Path) -> &'static str {
    let extension =
        path.extension().map(|ext| ext.to_string_lossy().to_ascii_lowercase()).unwrap_or_default();
    match extension.as_str() {
        "pdf" => PDF_MEDIA_TYPE,
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "txt" => "text/plain",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::media_type_for;

    #[test]
    fn media_type_follows_extension() {
        assert_eq!(media_type_for(Path::new("promo/APRIL.PDF")), "application/pdf");
        assert_eq!(media_type_for(Path::new("scan.jpeg")), "image/jpeg");
        assert_eq!(media_type_for(Path::new("notes")), "application/octet-stream");
    }
}
