use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::document::Document;
use crate::errors::PortError;
use crate::ports::{DocumentPort, OverrideKey, OverridePort};
use crate::store::document::dedupe_by_name;

#[derive(Default)]
pub struct FakeOverridePort {
    values: Mutex<HashMap<OverrideKey, String>>,
    fail_writes: AtomicBool,
}

impl FakeOverridePort {
    pub fn seed(&self, key: OverrideKey, value: &str) {
        self.values.lock().expect("values lock").insert(key, value.to_string());
    }

    pub fn value(&self, key: OverrideKey) -> Option<String> {
        self.values.lock().expect("values lock").get(&key).cloned()
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl OverridePort for FakeOverridePort {
    async fn load(&self, key: OverrideKey) -> Result<Option<String>, PortError> {
        Ok(self.value(key))
    }

    async fn save(&self, key: OverrideKey, value: &str) -> Result<(), PortError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PortError::CapacityExceeded("quota exceeded".to_string()));
        }
        self.seed(key, value);
        Ok(())
    }

    async fn clear(&self, key: OverrideKey) -> Result<(), PortError> {
        self.values.lock().expect("values lock").remove(&key);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeDocumentPort {
    documents: Mutex<Vec<Document>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl FakeDocumentPort {
    pub fn seed(&self, documents: Vec<Document>) {
        *self.documents.lock().expect("documents lock") = documents;
    }

    pub fn stored(&self) -> Vec<Document> {
        self.documents.lock().expect("documents lock").clone()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentPort for FakeDocumentPort {
    async fn load_all(&self) -> Result<Vec<Document>, PortError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(PortError::Unavailable("store closed".to_string()));
        }
        Ok(self.stored())
    }

    async fn replace_all(&self, documents: &[Document]) -> Result<(), PortError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PortError::CapacityExceeded("quota exceeded".to_string()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        let user_documents = documents.iter().filter(|document| !document.is_system).cloned();
        self.seed(dedupe_by_name(user_documents.collect()));
        Ok(())
    }
}
