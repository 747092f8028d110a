use std::collections::HashMap;

use tokio::sync::RwLock;

use quotedesk_core::domain::document::Document;
use quotedesk_core::errors::PortError;
use quotedesk_core::ports::{DocumentPort, OverrideKey, OverridePort};
use quotedesk_core::store::{dedupe_by_name, persistable};

#[derive(Default)]
pub struct InMemoryOverrideRepository {
    values: RwLock<HashMap<OverrideKey, String>>,
}

#[async_trait::async_trait]
impl OverridePort for InMemoryOverrideRepository {
    async fn load(&self, key: OverrideKey) -> Result<Option<String>, PortError> {
        let values = self.values.read().await;
        Ok(values.get(&key).cloned())
    }

    async fn save(&self, key: OverrideKey, value: &str) -> Result<(), PortError> {
        let mut values = self.values.write().await;
        values.insert(key, value.to_string());
        Ok(())
    }

    async fn clear(&self, key: OverrideKey) -> Result<(), PortError> {
        let mut values = self.values.write().await;
        values.remove(&key);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryDocumentRepository {
    documents: RwLock<Vec<Document>>,
}

#[async_trait::async_trait]
impl DocumentPort for InMemoryDocumentRepository {
    async fn load_all(&self) -> Result<Vec<Document>, PortError> {
        let documents = self.documents.read().await;
        Ok(documents.clone())
    }

    async fn replace_all(&self, documents: &[Document]) -> Result<(), PortError> {
        *self.documents.write().await = dedupe_by_name(persistable(documents));
        Ok(())
    }
}
