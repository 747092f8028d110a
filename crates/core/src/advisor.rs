//! Request envelope for the pricing reasoning service.
//!
//! Only the envelope is built here; transport and response handling belong to
//! the host.

use serde::Serialize;

use crate::domain::order::{CustomerType, Language, OrderForm};
use crate::errors::DomainError;
use crate::resolver::WorkingConfiguration;

pub const FALLBACK_RULE_TEXT: &str = "Follow standard subscription pricing.";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub name: String,
    pub mime_type: String,
    /// Raw base64 payload with the `data:...;base64,` prefix removed.
    pub data: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub language: Language,
    pub customer: CustomerType,
    pub line_items: Vec<String>,
    pub full_settlement: bool,
    pub promotion: Option<String>,
    pub additional_context: Option<String>,
    pub rule_text: String,
    pub attachments: Vec<Attachment>,
}

impl QuoteRequest {
    /// Builds the envelope for a ready order. Every active document, system or
    /// not, is attached.
    pub fn build(order: &OrderForm, config: &WorkingConfiguration) -> Result<Self, DomainError> {
        order.ensure_ready(&config.catalog)?;

        let attachments = config
            .documents
            .iter()
            .map(|document| {
                Ok(Attachment {
                    name: document.name.clone(),
                    mime_type: document.mime_type.clone(),
                    data: document.payload()?.to_string(),
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        let line_items = order
            .lines
            .iter()
            .map(|line| {
                format!("{}x {} [{}] for {}", line.quantity, line.name, line.model, line.contract)
            })
            .collect();

        let rule_text = if config.rule_text.trim().is_empty() {
            FALLBACK_RULE_TEXT.to_string()
        } else {
            config.rule_text.clone()
        };

        Ok(Self {
            language: order.language,
            customer: order.customer_type,
            line_items,
            full_settlement: order.wants_full_settlement,
            promotion: non_empty(&order.promotion),
            additional_context: non_empty(&order.additional_context),
            rule_text,
            attachments,
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
