use serde::{Deserialize, Serialize};

use crate::domain::catalog::{find_by_name, first_in_category, CatalogItem};
use crate::domain::plan::{allowed_plans, default_plan, ContractLength, ProductCategory};
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustomerType {
    Existing,
    #[default]
    New,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanType {
    #[default]
    Subscribe,
    Outright,
    Bundle,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Language {
    #[default]
    En,
    Cn,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub category: Option<ProductCategory>,
    pub name: String,
    pub model: String,
    pub quantity: u32,
    pub contract: ContractLength,
}

impl Default for OrderLine {
    fn default() -> Self {
        Self {
            category: None,
            name: String::new(),
            model: String::new(),
            quantity: 1,
            contract: ContractLength::Months60,
        }
    }
}

/// In-progress order captured by the sales form.
///
/// Field transitions are constrained by the catalog and the plan table: a line
/// can only carry a contract length its product (or category) offers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderForm {
    pub customer_type: CustomerType,
    pub lines: Vec<OrderLine>,
    pub plan: PlanType,
    pub promotion: String,
    pub additional_context: String,
    pub wants_full_settlement: bool,
    pub language: Language,
}

impl Default for OrderForm {
    fn default() -> Self {
        Self {
            customer_type: CustomerType::default(),
            lines: vec![OrderLine::default()],
            plan: PlanType::default(),
            promotion: String::new(),
            additional_context: String::new(),
            wants_full_settlement: false,
            language: Language::default(),
        }
    }
}

impl OrderForm {
    pub fn add_line(&mut self) {
        self.lines.push(OrderLine::default());
    }

    pub fn remove_line(&mut self, index: usize) -> Result<(), DomainError> {
        self.check_index(index)?;
        if self.lines.len() == 1 {
            return Err(DomainError::LastOrderLine);
        }
        self.lines.remove(index);
        Ok(())
    }

    pub fn change_category(
        &mut self,
        index: usize,
        category: ProductCategory,
        catalog: &[CatalogItem],
    ) -> Result<(), DomainError> {
        let line = self.line_mut(index)?;
        let template = first_in_category(catalog, category);

        line.category = Some(category);
        line.name = template.map(|item| item.name.clone()).unwrap_or_default();
        line.model = template.and_then(CatalogItem::first_model).unwrap_or_default().to_string();
        line.contract = default_plan(category);
        Ok(())
    }

    pub fn select_product(
        &mut self,
        index: usize,
        name: &str,
        catalog: &[CatalogItem],
    ) -> Result<(), DomainError> {
        let line = self.line_mut(index)?;
        let Some(category) = line.category else {
            return Err(DomainError::CategoryNotSelected { line: index });
        };
        let found = find_by_name(catalog, name);

        line.name = name.to_string();
        line.model = found.and_then(CatalogItem::first_model).unwrap_or_default().to_string();
        line.contract = found
            .and_then(|item| item.supported_plans.first().copied())
            .unwrap_or_else(|| default_plan(category));
        Ok(())
    }

    pub fn select_model(&mut self, index: usize, model: &str) -> Result<(), DomainError> {
        self.line_mut(index)?.model = model.to_string();
        Ok(())
    }

    pub fn select_contract(
        &mut self,
        index: usize,
        contract: ContractLength,
        catalog: &[CatalogItem],
    ) -> Result<(), DomainError> {
        let offered = self.offered_contracts(index, catalog)?;
        if !offered.contains(&contract) {
            return Err(DomainError::ContractNotOffered { line: index, contract });
        }
        self.line_mut(index)?.contract = contract;
        Ok(())
    }

    /// Contract lengths selectable for a line: the selected product's
    /// supported plans, or the category's table entry when the product is not
    /// in the catalog.
    pub fn offered_contracts(
        &self,
        index: usize,
        catalog: &[CatalogItem],
    ) -> Result<Vec<ContractLength>, DomainError> {
        self.check_index(index)?;
        let line = &self.lines[index];
        let Some(category) = line.category else {
            return Err(DomainError::CategoryNotSelected { line: index });
        };

        Ok(match find_by_name(catalog, &line.name) {
            Some(item) if !item.supported_plans.is_empty() => item.supported_plans.clone(),
            _ => allowed_plans(category).to_vec(),
        })
    }

    pub fn set_quantity(&mut self, index: usize, quantity: u32) -> Result<(), DomainError> {
        self.line_mut(index)?.quantity = quantity.max(1);
        Ok(())
    }

    /// An order can be quoted once every line names a product, orders at
    /// least one unit and carries a contract length its product offers.
    ///
    /// Forms loaded from outside never went through the field transitions, so
    /// every line is checked again here.
    pub fn ensure_ready(&self, catalog: &[CatalogItem]) -> Result<(), DomainError> {
        for (index, line) in self.lines.iter().enumerate() {
            if line.name.trim().is_empty() {
                return Err(DomainError::OrderIncomplete { line: index });
            }
            if line.quantity == 0 {
                return Err(DomainError::InvalidQuantity { line: index });
            }
            if !self.offered_contracts(index, catalog)?.contains(&line.contract) {
                let contract = line.contract;
                return Err(DomainError::ContractNotOffered { line: index, contract });
            }
        }
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<(), DomainError> {
        if index < self.lines.len() {
            Ok(())
        } else {
            Err(DomainError::IndexOutOfRange { index, len: self.lines.len() })
        }
    }

    fn line_mut(&mut self, index: usize) -> Result<&mut OrderLine, DomainError> {
        let len = self.lines.len();
        self.lines.get_mut(index).ok_or(DomainError::IndexOutOfRange { index, len })
    }
}
