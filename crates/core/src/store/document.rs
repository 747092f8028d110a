use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::document::{Document, UploadedFile};
use crate::errors::{ApplicationError, ConfigSection, DomainError, PortError};
use crate::ports::DocumentPort;

/// Reference documents: an active set (system + user documents) and a staged
/// set of uploads awaiting confirmation.
///
/// Only non-system documents ever reach the durable store.
pub struct DocumentStore {
    active: Vec<Document>,
    staged: Vec<Document>,
    accepted_media_type: String,
    port: Arc<dyn DocumentPort>,
}

impl DocumentStore {
    pub fn new(
        active: Vec<Document>,
        accepted_media_type: impl Into<String>,
        port: Arc<dyn DocumentPort>,
    ) -> Self {
        Self { active, staged: Vec::new(), accepted_media_type: accepted_media_type.into(), port }
    }

    /// Reads every persisted (non-system) document. An empty store yields an
    /// empty list.
    pub async fn load_persisted(port: &dyn DocumentPort) -> Result<Vec<Document>, PortError> {
        port.load_all().await
    }

    pub fn active(&self) -> &[Document] {
        &self.active
    }

    pub fn staged(&self) -> &[Document] {
        &self.staged
    }

    /// Writes the non-system part of the active set, replacing whatever the
    /// durable store held before.
    pub async fn persist(&self) -> Result<(), ApplicationError> {
        let user_documents = persistable(&self.active);
        self.port
            .replace_all(&user_documents)
            .await
            .map_err(|error| ApplicationError::persistence(ConfigSection::Documents, error))?;

        tracing::info!(
            event_name = "documents.persisted",
            persisted = user_documents.len(),
            active = self.active.len(),
            "document set persisted"
        );
        Ok(())
    }

    /// Replaces the active set wholesale and persists it. Repeated names
    /// collapse into one entry.
    pub async fn replace_active(
        &mut self,
        documents: Vec<Document>,
    ) -> Result<(), ApplicationError> {
        self.active = dedupe_by_name(documents);
        self.persist().await
    }

    /// Encodes uploaded files of the accepted media type and appends them to
    /// the staged set. Returns how many files were staged.
    pub fn stage(&mut self, files: Vec<UploadedFile>) -> usize {
        let before = self.staged.len();
        for file in files {
            if file.media_type != self.accepted_media_type {
                tracing::debug!(
                    event_name = "documents.stage_skipped",
                    name = %file.name,
                    media_type = %file.media_type,
                    "upload skipped: unsupported media type"
                );
                continue;
            }
            self.staged.push(Document::from_bytes(file.name, file.media_type, &file.bytes));
        }
        self.staged.len() - before
    }

    /// Appends the staged documents to the active set, persists, and clears
    /// the staged set. An upload named like an active document replaces its
    /// content in place.
    pub async fn commit(&mut self) -> Result<usize, ApplicationError> {
        let staged = std::mem::take(&mut self.staged);
        let committed = staged.len();
        let mut next = std::mem::take(&mut self.active);
        next.extend(staged);
        self.active = dedupe_by_name(next);
        self.persist().await?;
        Ok(committed)
    }

    /// Removes one user document by position. System documents cannot be
    /// removed.
    pub async fn remove(&mut self, index: usize) -> Result<Document, ApplicationError> {
        let Some(document) = self.active.get(index) else {
            return Err(DomainError::IndexOutOfRange { index, len: self.active.len() }.into());
        };
        if document.is_system {
            return Err(DomainError::SystemDocumentImmutable(document.name.clone()).into());
        }

        let removed = self.active.remove(index);
        self.persist().await?;
        Ok(removed)
    }
}

/// `system` followed by every persisted document whose name is not already
/// taken by a system document.
pub fn merge(system: Vec<Document>, persisted: Vec<Document>) -> Vec<Document> {
    let system_names: HashSet<String> =
        system.iter().map(|document| document.name.clone()).collect();
    let mut merged = system;
    merged.extend(
        persisted.into_iter().filter(|document| !system_names.contains(&document.name)),
    );
    merged
}

/// One document per name: each name keeps its first position and its last
/// content, matching what the durable store keeps on `replace_all`. A system
/// document is never replaced.
pub fn dedupe_by_name(documents: Vec<Document>) -> Vec<Document> {
    let mut unique: Vec<Document> = Vec::with_capacity(documents.len());
    for document in documents {
        match unique.iter_mut().find(|existing| existing.name == document.name) {
            Some(existing) if existing.is_system => {}
            Some(existing) => *existing = document,
            None => unique.push(document),
        }
    }
    unique
}

/// Documents eligible for the durable store.
pub fn persistable(documents: &[Document]) -> Vec<Document> {
    documents.iter().filter(|document| !document.is_system).cloned().collect()
}
