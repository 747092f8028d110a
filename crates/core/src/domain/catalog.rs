use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::plan::{allowed_plans, validate_plans, ContractLength, ProductCategory};
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogItemId(pub String);

impl CatalogItemId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: CatalogItemId,
    pub category: ProductCategory,
    pub name: String,
    pub models: Vec<String>,
    pub supported_plans: Vec<ContractLength>,
}

impl CatalogItem {
    /// Placeholder row appended by the operator's "add item" action.
    pub fn placeholder() -> Self {
        let category = ProductCategory::WaterPurifier;
        Self {
            id: CatalogItemId::generate(),
            category,
            name: "New Item".to_string(),
            models: vec!["Model X".to_string()],
            supported_plans: allowed_plans(category).to_vec(),
        }
    }

    pub fn first_model(&self) -> Option<&str> {
        self.models.first().map(String::as_str)
    }

    /// Moves the item to `category`, taking its name and first model from
    /// `template` (the first catalog entry of that category) and resetting the
    /// plan list to the category's table entry.
    pub fn recategorize(&mut self, category: ProductCategory, template: Option<&CatalogItem>) {
        self.category = category;
        self.supported_plans = allowed_plans(category).to_vec();

        let Some(template) = template else {
            self.name.clear();
            self.models.clear();
            return;
        };

        self.name = template.name.clone();
        match template.first_model() {
            Some(model) => match self.models.first_mut() {
                Some(first) => *first = model.to_string(),
                None => self.models.push(model.to_string()),
            },
            None if !self.models.is_empty() => {
                self.models.remove(0);
            }
            None => {}
        }
    }

    /// Checks `supported_plans` against the plan table for the current category.
    pub fn check_plans(&self) -> Result<(), DomainError> {
        validate_plans(self.category, &self.supported_plans)
    }
}

/// Splits a comma separated model list as typed by an operator.
pub fn parse_models(raw: &str) -> Vec<String> {
    raw.split(',').map(|model| model.trim().to_string()).collect()
}

pub fn first_in_category(
    catalog: &[CatalogItem],
    category: ProductCategory,
) -> Option<&CatalogItem> {
    catalog.iter().find(|item| item.category == category)
}

pub fn find_by_name<'a>(catalog: &'a [CatalogItem], name: &str) -> Option<&'a CatalogItem> {
    catalog.iter().find(|item| item.name == name)
}

fn item(id: &str, category: ProductCategory, name: &str, models: &[&str]) -> CatalogItem {
    CatalogItem {
        id: CatalogItemId(id.to_string()),
        category,
        name: name.to_string(),
        models: models.iter().map(|model| model.to_string()).collect(),
        supported_plans: allowed_plans(category).to_vec(),
    }
}

/// Catalog shipped with the application.
pub fn default_catalog() -> Vec<CatalogItem> {
    use ProductCategory::*;

    vec![
        item(
            "wp-1",
            WaterPurifier,
            "PuriCare Self-Service",
            &["WD518AN (Navy)", "WD518AS (Silver)", "WD516AN"],
        ),
        item("ap-1", AirPurifier, "PuriCare 360 Hit", &["AS60GHWG0", "AS60GHCGO"]),
        item("ref-1", Refrigerator, "InstaView Door-in-Door", &["GC-X247CSAV", "GC-X22FTQLL"]),
        item(
            "rac-1",
            AirConditioner,
            "Dual Inverter AirCon",
            &["S3-Q09JAPPA (1.0HP)", "S3-Q12JAPPA (1.5HP)"],
        ),
        item("mw-1", Microwave, "NeoChef Microwave", &["MS2595DIS", "MH6565DIS"]),
        item("tv-1", Television, "OLED evo C3", &["OLED55C3PSA", "OLED65C3PSA"]),
        item("sb-1", Soundbar, "LG Soundbar", &["SC9S", "S95QR"]),
        item("mon-1", Monitor, "UltraGear Gaming", &["27GR95QE", "45GR95QE"]),
        item("vac-1", Vacuum, "CordZero A9K", &["A9K-ULTRA", "A9K-CORE"]),
        item("dehu-1", Dehumidifier, "PuriCare Dehumidifier", &["MD16GQSA1", "MD19GQGA1"]),
        item("wd-1", WasherDryer, "Vivace Washer Dryer", &["V4-FV1409S4W", "V5-FV1450S4W"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::{default_catalog, first_in_category, parse_models, CatalogItem};
    use crate::domain::plan::{allowed_plans, ContractLength, ProductCategory};

    #[test]
    fn default_catalog_honours_plan_table() {
        let catalog = default_catalog();
        assert_eq!(catalog.len(), 11);
        for item in &catalog {
            item.check_plans().expect("default plans are valid");
            assert!(!item.models.is_empty());
        }
    }

    #[test]
    fn recategorize_takes_template_name_and_model() {
        let catalog = default_catalog();
        let mut microwave = catalog[4].clone();
        assert_eq!(
            microwave.supported_plans,
            vec![ContractLength::Months36, ContractLength::Months60]
        );

        let template = first_in_category(&catalog, ProductCategory::WaterPurifier);
        microwave.recategorize(ProductCategory::WaterPurifier, template);

        assert_eq!(microwave.category, ProductCategory::WaterPurifier);
        assert_eq!(microwave.name, "PuriCare Self-Service");
        assert_eq!(microwave.models, vec!["WD518AN (Navy)".to_string(), "MH6565DIS".to_string()]);
        assert_eq!(microwave.supported_plans, allowed_plans(ProductCategory::WaterPurifier));
    }

    #[test]
    fn recategorize_without_template_clears_name_and_models() {
        let mut item = CatalogItem::placeholder();
        item.recategorize(ProductCategory::Monitor, None);

        assert_eq!(item.name, "");
        assert!(item.models.is_empty());
        assert_eq!(item.supported_plans, vec![ContractLength::Months60]);
    }

    #[test]
    fn placeholder_items_get_fresh_ids() {
        let first = CatalogItem::placeholder();
        let second = CatalogItem::placeholder();
        assert_ne!(first.id, second.id);
        assert_eq!(first.models, vec!["Model X".to_string()]);
    }

    #[test]
    fn models_are_trimmed_on_split() {
        assert_eq!(parse_models(" A1 ,B2,  C3"), vec!["A1", "B2", "C3"]);
    }

    #[test]
    fn catalog_items_use_camel_case_on_the_wire() {
        let encoded = serde_json::to_value(&default_catalog()[0]).expect("encode");
        assert_eq!(encoded["id"], "wp-1");
        assert_eq!(encoded["category"], "WP (Water Purifiers)");
        assert_eq!(encoded["supportedPlans"][0], "60 months");
    }
}
