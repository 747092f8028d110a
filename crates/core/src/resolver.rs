use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::catalog::{default_catalog, CatalogItem};
use crate::domain::document::Document;
use crate::errors::{ApplicationError, ConfigSection};
use crate::ports::{DocumentPort, OverrideKey, OverridePort};
use crate::store::{dedupe_by_name, merge, CatalogStore, DocumentStore, RuleTextStore};
use crate::sync::{self, SyncPayload};

pub const DEFAULT_RULE_TEXT: &str = "\
Subscription sales rules (2024/2025 edition)

1. RM88 picks
   - Washer & dryer: promotional price is RM88 across the range. Steer the customer to the \
most premium model in the catalog (e.g. the V5 series); the pricier the model, the more they save.
   - Refrigerator: recommend the \"Regular Visit 12M\" service plan as the balanced maintenance choice.

2. Microwave limits
   - Microwaves only offer 36-month and 60-month contracts.
   - Lead with the 60-month contract: the monthly rental is lower and more competitive.

3. Early settlement
   - Ticking this means the customer will pay off the remaining term in one go.
   - Rule: roughly 10% off the remaining rental balance can usually be requested.

4. Bundles
   - Combined purchases (e.g. WP + AP) earn a combined monthly rebate, usually RM10-15/month \
less than buying separately.

5. Existing customers
   - Returning customers get the handling fee waived or an extra monthly rebate.
";

/// Configuration shipped with the application. Its documents are always
/// treated as system documents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SystemDefaults {
    pub catalog: Vec<CatalogItem>,
    pub rule_text: String,
    pub documents: Vec<Document>,
}

impl SystemDefaults {
    pub fn builtin() -> Self {
        Self {
            catalog: default_catalog(),
            rule_text: DEFAULT_RULE_TEXT.to_string(),
            documents: Vec::new(),
        }
    }

    /// Built-in defaults overlaid with a payload shipped by the owner, usually
    /// an export taken from a configured device. Its documents become system
    /// documents. An empty rule text keeps the built-in one.
    pub fn with_payload(payload: SyncPayload) -> Self {
        let mut defaults = Self::builtin();
        if let Some(catalog) = payload.catalog {
            defaults.catalog = catalog;
        }
        if let Some(rule_text) = payload.master_knowledge.filter(|text| !text.is_empty()) {
            defaults.rule_text = rule_text;
        }
        if let Some(documents) = payload.active_memos {
            defaults.documents =
                dedupe_by_name(documents.into_iter().map(Document::into_system).collect());
        }
        defaults
    }

    /// Parses a shipped payload (same format as a sync export).
    pub fn from_payload_text(raw: &str) -> Result<Self, ApplicationError> {
        Ok(Self::with_payload(sync::decode(raw)?))
    }
}

/// Resolved (catalog, rule text, documents) triple consumed by the order form
/// and the reasoning-service request. Never persisted as such.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingConfiguration {
    pub catalog: Vec<CatalogItem>,
    pub rule_text: String,
    pub documents: Vec<Document>,
}

/// Handles to the three stores after resolution. All writes go through the
/// store mutators so memory and durable state move together.
pub struct ResolvedConfiguration {
    pub catalog: CatalogStore,
    pub rules: RuleTextStore,
    pub documents: DocumentStore,
}

impl ResolvedConfiguration {
    pub fn working(&self) -> WorkingConfiguration {
        WorkingConfiguration {
            catalog: self.catalog.list().to_vec(),
            rule_text: self.rules.get().to_string(),
            documents: self.documents.active().to_vec(),
        }
    }
}

/// Returned by a reset; the caller must run [`ConfigurationResolver::resolve`]
/// again before using any configuration.
#[must_use = "configuration must be resolved again after a reset"]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReloadRequired;

pub struct ConfigurationResolver {
    defaults: SystemDefaults,
    overrides: Arc<dyn OverridePort>,
    documents: Arc<dyn DocumentPort>,
    accepted_media_type: String,
}

impl ConfigurationResolver {
    pub fn new(
        defaults: SystemDefaults,
        overrides: Arc<dyn OverridePort>,
        documents: Arc<dyn DocumentPort>,
        accepted_media_type: impl Into<String>,
    ) -> Self {
        Self { defaults, overrides, documents, accepted_media_type: accepted_media_type.into() }
    }

    /// Builds the working configuration: defaults, then the device overrides,
    /// then persisted documents merged behind the system documents.
    ///
    /// Never fails; an absent or corrupt source falls back to its default.
    pub async fn resolve(&self) -> ResolvedConfiguration {
        let catalog =
            CatalogStore::resolve(self.defaults.catalog.clone(), self.overrides.clone()).await;
        let rules =
            RuleTextStore::resolve(self.defaults.rule_text.clone(), self.overrides.clone()).await;

        let system_documents =
            self.defaults.documents.iter().cloned().map(Document::into_system).collect();
        let persisted = match DocumentStore::load_persisted(self.documents.as_ref()).await {
            Ok(persisted) => persisted,
            Err(error) => {
                tracing::warn!(
                    event_name = "config.resolve.documents_unreadable",
                    error = %error,
                    "persisted documents could not be read; using system documents only"
                );
                Vec::new()
            }
        };
        let active = merge(system_documents, persisted);
        let documents =
            DocumentStore::new(active, self.accepted_media_type.clone(), self.documents.clone());

        tracing::info!(
            event_name = "config.resolve.completed",
            catalog_items = catalog.list().len(),
            documents = documents.active().len(),
            "working configuration resolved"
        );

        ResolvedConfiguration { catalog, rules, documents }
    }

    /// Clears both device overrides and the persisted document set.
    ///
    /// Destructive and irreversible; hosts must confirm with the operator
    /// before calling.
    pub async fn reset_to_defaults(&self) -> Result<ReloadRequired, ApplicationError> {
        for (key, section) in [
            (OverrideKey::Catalog, ConfigSection::Catalog),
            (OverrideKey::RuleText, ConfigSection::RuleText),
        ] {
            self.overrides
                .clear(key)
                .await
                .map_err(|error| ApplicationError::persistence(section, error))?;
        }
        self.documents
            .replace_all(&[])
            .await
            .map_err(|error| ApplicationError::persistence(ConfigSection::Documents, error))?;

        tracing::warn!(event_name = "config.reset", "device configuration reset to defaults");
        Ok(ReloadRequired)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{ConfigurationResolver, SystemDefaults};
    use crate::domain::document::{Document, PDF_MEDIA_TYPE};
    use crate::domain::plan::ProductCategory;
    use crate::errors::ApplicationError;
    use crate::ports::OverrideKey;
    use crate::store::testing::{FakeDocumentPort, FakeOverridePort};

    fn pdf(name: &str) -> Document {
        Document::from_bytes(name, PDF_MEDIA_TYPE, name.as_bytes())
    }

    fn resolver(
        overrides: &Arc<FakeOverridePort>,
        documents: &Arc<FakeDocumentPort>,
        defaults: SystemDefaults,
    ) -> ConfigurationResolver {
        ConfigurationResolver::new(defaults, overrides.clone(), documents.clone(), PDF_MEDIA_TYPE)
    }

    #[tokio::test]
    async fn resolves_to_defaults_when_nothing_is_stored() {
        let overrides = Arc::new(FakeOverridePort::default());
        let documents = Arc::new(FakeDocumentPort::default());

        let resolved = resolver(&overrides, &documents, SystemDefaults::builtin()).resolve().await;
        let working = resolved.working();

        let defaults = SystemDefaults::builtin();
        assert_eq!(working.catalog, defaults.catalog);
        assert_eq!(working.rule_text, defaults.rule_text);
        assert!(working.documents.is_empty());
    }

    #[tokio::test]
    async fn each_source_degrades_independently() {
        let overrides = Arc::new(FakeOverridePort::default());
        overrides.seed(OverrideKey::Catalog, "[[[");
        overrides.seed(OverrideKey::RuleText, "custom rules");
        let documents = Arc::new(FakeDocumentPort::default());
        documents.fail_reads();

        let working =
            resolver(&overrides, &documents, SystemDefaults::builtin()).resolve().await.working();

        assert_eq!(working.catalog, SystemDefaults::builtin().catalog);
        assert_eq!(working.rule_text, "custom rules");
        assert!(working.documents.is_empty());
    }

    #[tokio::test]
    async fn system_documents_shadow_persisted_documents_of_the_same_name() {
        let overrides = Arc::new(FakeOverridePort::default());
        let documents = Arc::new(FakeDocumentPort::default());
        documents.seed(vec![pdf("price-list"), pdf("april-promo")]);
        let defaults =
            SystemDefaults { documents: vec![pdf("price-list")], ..SystemDefaults::builtin() };

        let resolved = resolver(&overrides, &documents, defaults).resolve().await;

        let active = resolved.documents.active();
        assert_eq!(active.len(), 2);
        assert!(active[0].is_system);
        assert_eq!(active[1].name, "april-promo");
        assert_eq!(documents.stored().len(), 2, "shadowed record stays until the next edit");
    }

    #[tokio::test]
    async fn reset_returns_to_pure_defaults() {
        let overrides = Arc::new(FakeOverridePort::default());
        let documents = Arc::new(FakeDocumentPort::default());
        let resolver = resolver(&overrides, &documents, SystemDefaults::builtin());

        let mut resolved = resolver.resolve().await;
        let id = resolved.catalog.add_item().await.expect("add item");
        resolved
            .catalog
            .change_category(&id, ProductCategory::Microwave)
            .await
            .expect("change category");
        resolved.rules.set("temporary").await.expect("set rules");
        resolved.documents.replace_active(vec![pdf("memo")]).await.expect("documents");

        let _reload = resolver.reset_to_defaults().await.expect("reset");
        let working = resolver.resolve().await.working();

        let defaults = SystemDefaults::builtin();
        assert_eq!(working.catalog, defaults.catalog);
        assert_eq!(working.rule_text, defaults.rule_text);
        assert!(working.documents.iter().all(|document| document.is_system));
        assert!(working.documents.is_empty());
        assert_eq!(overrides.value(OverrideKey::Catalog), None);
    }

    #[test]
    fn shipped_payload_becomes_the_baseline() {
        let raw = r#"{
            "catalog": [{
                "id": "mw-9",
                "category": "MICROWAVE",
                "name": "NeoChef Compact",
                "models": ["MS2336GIB"],
                "supportedPlans": ["36 months", "60 months"]
            }],
            "masterKnowledge": "",
            "memos": [{
                "name": "price-list.pdf",
                "base64": "data:application/pdf;base64,JVBERg==",
                "mimeType": "application/pdf"
            }]
        }"#;

        let defaults = SystemDefaults::from_payload_text(raw).expect("payload");

        assert_eq!(defaults.catalog.len(), 1);
        assert_eq!(defaults.catalog[0].name, "NeoChef Compact");
        assert_eq!(defaults.rule_text, SystemDefaults::builtin().rule_text);
        assert_eq!(defaults.documents.len(), 1);
        assert!(defaults.documents[0].is_system);
    }

    #[test]
    fn malformed_shipped_payload_is_rejected() {
        let error = SystemDefaults::from_payload_text("[1, 2]").expect_err("not an object");
        assert!(matches!(error, ApplicationError::MalformedPayload(_)));
    }
}
