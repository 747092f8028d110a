use std::sync::Arc;

use crate::domain::catalog::{first_in_category, CatalogItem, CatalogItemId};
use crate::domain::plan::{ContractLength, ProductCategory};
use crate::errors::{ApplicationError, ConfigSection, DomainError, PortError};
use crate::ports::{OverrideKey, OverridePort};

/// Product catalog backed by the device override store.
///
/// Every edit computes the next full list and hands it to [`replace`], which
/// swaps the in-memory list and persists the whole thing.
///
/// [`replace`]: CatalogStore::replace
pub struct CatalogStore {
    items: Vec<CatalogItem>,
    port: Arc<dyn OverridePort>,
}

impl CatalogStore {
    pub fn new(items: Vec<CatalogItem>, port: Arc<dyn OverridePort>) -> Self {
        Self { items, port }
    }

    /// Overlays the device override on `defaults`. A missing, unreadable or
    /// unparseable override leaves the defaults in place.
    pub async fn resolve(defaults: Vec<CatalogItem>, port: Arc<dyn OverridePort>) -> Self {
        let items = match port.load(OverrideKey::Catalog).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<CatalogItem>>(&raw) {
                Ok(items) => {
                    tracing::debug!(
                        event_name = "config.resolve.catalog_override",
                        items = items.len(),
                        "catalog override applied"
                    );
                    items
                }
                Err(error) => {
                    tracing::warn!(
                        event_name = "config.resolve.catalog_corrupt",
                        error = %error,
                        "stored catalog override is corrupt; using built-in catalog"
                    );
                    defaults
                }
            },
            Ok(None) => defaults,
            Err(error) => {
                tracing::warn!(
                    event_name = "config.resolve.catalog_unreadable",
                    error = %error,
                    "catalog override could not be read; using built-in catalog"
                );
                defaults
            }
        };

        Self { items, port }
    }

    pub fn list(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn find(&self, id: &CatalogItemId) -> Option<&CatalogItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Replaces the whole catalog, then persists it.
    ///
    /// On a persistence error the new list is still the in-memory catalog.
    pub async fn replace(&mut self, next: Vec<CatalogItem>) -> Result<(), ApplicationError> {
        self.items = next;

        let raw = serde_json::to_string(&self.items).map_err(|error| {
            let source = PortError::Encode(error.to_string());
            ApplicationError::persistence(ConfigSection::Catalog, source)
        })?;
        self.port
            .save(OverrideKey::Catalog, &raw)
            .await
            .map_err(|error| ApplicationError::persistence(ConfigSection::Catalog, error))?;

        tracing::info!(
            event_name = "catalog.replaced",
            items = self.items.len(),
            "catalog persisted"
        );
        Ok(())
    }

    pub async fn add_item(&mut self) -> Result<CatalogItemId, ApplicationError> {
        let item = CatalogItem::placeholder();
        let id = item.id.clone();
        let mut next = self.items.clone();
        next.push(item);
        self.replace(next).await?;
        Ok(id)
    }

    pub async fn remove_item(&mut self, id: &CatalogItemId) -> Result<(), ApplicationError> {
        self.position(id)?;
        let next = self.items.iter().filter(|item| &item.id != id).cloned().collect();
        self.replace(next).await
    }

    pub async fn rename_item(
        &mut self,
        id: &CatalogItemId,
        name: &str,
    ) -> Result<(), ApplicationError> {
        self.edit(id, |item, _| item.name = name.to_string()).await
    }

    pub async fn set_models(
        &mut self,
        id: &CatalogItemId,
        models: Vec<String>,
    ) -> Result<(), ApplicationError> {
        self.edit(id, |item, _| item.models = models).await
    }

    /// Category-change transition: name and first model come from the first
    /// entry of the new category, plans reset to the category's table entry.
    pub async fn change_category(
        &mut self,
        id: &CatalogItemId,
        category: ProductCategory,
    ) -> Result<(), ApplicationError> {
        self.edit(id, |item, catalog| {
            let template = first_in_category(catalog, category).cloned();
            item.recategorize(category, template.as_ref());
        })
        .await
    }

    /// Writes the plan list as given, without consulting the plan table.
    pub async fn set_plans_unchecked(
        &mut self,
        id: &CatalogItemId,
        plans: Vec<ContractLength>,
    ) -> Result<(), ApplicationError> {
        self.edit(id, |item, _| item.supported_plans = plans).await
    }

    /// Writes the plan list only if it is a non-empty subset of the plan table
    /// entry for the item's category.
    pub async fn set_plans(
        &mut self,
        id: &CatalogItemId,
        plans: Vec<ContractLength>,
    ) -> Result<(), ApplicationError> {
        let index = self.position(id)?;
        let mut candidate = self.items[index].clone();
        candidate.supported_plans = plans;
        candidate.check_plans()?;
        self.set_plans_unchecked(id, candidate.supported_plans).await
    }

    async fn edit<F>(&mut self, id: &CatalogItemId, apply: F) -> Result<(), ApplicationError>
    where
        F: FnOnce(&mut CatalogItem, &[CatalogItem]),
    {
        let index = self.position(id)?;
        let mut next = self.items.clone();
        let mut item = next[index].clone();
        apply(&mut item, &next);
        next[index] = item;
        self.replace(next).await
    }

    fn position(&self, id: &CatalogItemId) -> Result<usize, DomainError> {
        self.items
            .iter()
            .position(|item| &item.id == id)
            .ok_or_else(|| DomainError::UnknownCatalogItem(id.0.clone()))
    }
}
