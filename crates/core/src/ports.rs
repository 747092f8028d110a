//! Persistence ports injected into the stores.
//!
//! Adapters live in `quotedesk-db`; the stores only see these traits so the
//! resolution and mutation rules can run against any backend.

use async_trait::async_trait;

use crate::domain::document::Document;
use crate::errors::PortError;

/// Entry of the per-installation key-value override store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OverrideKey {
    Catalog,
    RuleText,
}

impl OverrideKey {
    pub const ALL: [OverrideKey; 2] = [Self::Catalog, Self::RuleText];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Catalog => "catalog",
            Self::RuleText => "rule_text",
        }
    }
}

#[async_trait]
pub trait OverridePort: Send + Sync {
    async fn load(&self, key: OverrideKey) -> Result<Option<String>, PortError>;
    async fn save(&self, key: OverrideKey, value: &str) -> Result<(), PortError>;
    async fn clear(&self, key: OverrideKey) -> Result<(), PortError>;
}

/// Durable set of user-supplied documents keyed by name.
#[async_trait]
pub trait DocumentPort: Send + Sync {
    async fn load_all(&self) -> Result<Vec<Document>, PortError>;

    /// Clears the stored set and writes `documents` in its place.
    async fn replace_all(&self, documents: &[Document]) -> Result<(), PortError>;
}
