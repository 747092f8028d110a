use serde::Serialize;

use quotedesk_core::domain::catalog::CatalogItem;
use quotedesk_core::domain::document::Document;

use crate::commands::{with_session, CommandResult, Reply};

const COMMAND: &str = "show";

#[derive(Debug, Serialize)]
pub struct DocumentSummary {
    pub index: usize,
    pub name: String,
    pub mime_type: String,
    pub is_system: bool,
    pub payload_chars: usize,
}

impl DocumentSummary {
    pub fn list(documents: &[Document]) -> Vec<Self> {
        documents
            .iter()
            .enumerate()
            .map(|(index, document)| Self {
                index,
                name: document.name.clone(),
                mime_type: document.mime_type.clone(),
                is_system: document.is_system,
                payload_chars: document.base64.len(),
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
struct WorkingSummary<'a> {
    catalog: &'a [CatalogItem],
    rule_text: &'a str,
    documents: Vec<DocumentSummary>,
}

/// Prints the working configuration; document content is summarised.
pub fn run() -> CommandResult {
    with_session(COMMAND, |session| async move {
        let resolved = &session.resolved;
        let summary = WorkingSummary {
            catalog: resolved.catalog.list(),
            rule_text: resolved.rules.get(),
            documents: DocumentSummary::list(resolved.documents.active()),
        };
        let reply = Reply::with_data(
            format!(
                "{} catalog items, {} documents",
                summary.catalog.len(),
                summary.documents.len()
            ),
            &summary,
        );
        (session, Ok(reply))
    })
}
