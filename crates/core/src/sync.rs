//! Portable sync payload shared by file export/import and the copy/paste
//! sync code.
//!
//! ```json
//! { "catalog": [..]?, "masterKnowledge": "..."?, "activeMemos": [..]? }
//! ```
//!
//! Every field is optional; an absent field leaves its store untouched.

use serde::{Deserialize, Serialize};

use crate::domain::catalog::CatalogItem;
use crate::domain::document::Document;
use crate::errors::{ApplicationError, ConfigSection};
use crate::resolver::{ResolvedConfiguration, WorkingConfiguration};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<Vec<CatalogItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_knowledge: Option<String>,
    #[serde(default, alias = "memos", skip_serializing_if = "Option::is_none")]
    pub active_memos: Option<Vec<Document>>,
}

impl SyncPayload {
    pub fn is_empty(&self) -> bool {
        self.catalog.is_none() && self.master_knowledge.is_none() && self.active_memos.is_none()
    }
}

impl From<&WorkingConfiguration> for SyncPayload {
    fn from(config: &WorkingConfiguration) -> Self {
        Self {
            catalog: Some(config.catalog.clone()),
            master_knowledge: Some(config.rule_text.clone()),
            active_memos: Some(config.documents.clone()),
        }
    }
}

/// Serializes the whole working configuration, documents included with their
/// full content. Payload size grows linearly with document size.
pub fn encode(config: &WorkingConfiguration) -> Result<String, ApplicationError> {
    serde_json::to_string(&SyncPayload::from(config))
        .map_err(|error| ApplicationError::MalformedPayload(format!("encode failed: {error}")))
}

/// Parses a payload into a partial update. Unknown fields are ignored; a
/// payload without any recognised field is a valid no-op.
pub fn decode(raw: &str) -> Result<SyncPayload, ApplicationError> {
    let value: serde_json::Value = serde_json::from_str(raw.trim())
        .map_err(|error| ApplicationError::MalformedPayload(error.to_string()))?;
    if !value.is_object() {
        return Err(ApplicationError::MalformedPayload(
            "top-level value must be an object".to_string(),
        ));
    }

    serde_json::from_value(value)
        .map_err(|error| ApplicationError::MalformedPayload(error.to_string()))
}

/// Applies a decoded update store by store: catalog, then rule text, then
/// documents. Not transactional; sections applied before a failure stay
/// applied. Returns the sections that were written.
pub async fn apply(
    payload: SyncPayload,
    target: &mut ResolvedConfiguration,
) -> Result<Vec<ConfigSection>, ApplicationError> {
    let mut applied = Vec::new();

    if let Some(catalog) = payload.catalog {
        target
            .catalog
            .replace(catalog)
            .await
            .map_err(|error| partial(&applied, ConfigSection::Catalog, error))?;
        applied.push(ConfigSection::Catalog);
    }

    if let Some(rule_text) = payload.master_knowledge.filter(|text| !text.is_empty()) {
        target
            .rules
            .set(rule_text)
            .await
            .map_err(|error| partial(&applied, ConfigSection::RuleText, error))?;
        applied.push(ConfigSection::RuleText);
    }

    if let Some(documents) = payload.active_memos {
        target
            .documents
            .replace_active(documents)
            .await
            .map_err(|error| partial(&applied, ConfigSection::Documents, error))?;
        applied.push(ConfigSection::Documents);
    }

    tracing::info!(event_name = "sync.applied", sections = ?applied, "sync payload applied");
    Ok(applied)
}

/// Decodes `raw` and applies it. A malformed payload mutates nothing.
pub async fn import(
    raw: &str,
    target: &mut ResolvedConfiguration,
) -> Result<Vec<ConfigSection>, ApplicationError> {
    let payload = decode(raw).map_err(|error| {
        tracing::warn!(event_name = "sync.rejected", error = %error, "sync payload rejected");
        error
    })?;
    apply(payload, target).await
}

fn partial(
    applied: &[ConfigSection],
    failed: ConfigSection,
    error: ApplicationError,
) -> ApplicationError {
    if applied.is_empty() {
        return error;
    }
    ApplicationError::PartialApply { applied: applied.to_vec(), failed, reason: error.to_string() }
}
