use std::sync::Arc;

use crate::errors::{ApplicationError, ConfigSection};
use crate::ports::{OverrideKey, OverridePort};

/// Free-text pricing policy handed verbatim to the reasoning service.
pub struct RuleTextStore {
    text: String,
    port: Arc<dyn OverridePort>,
}

impl RuleTextStore {
    pub fn new(text: String, port: Arc<dyn OverridePort>) -> Self {
        Self { text, port }
    }

    /// A stored empty string counts as no override.
    pub async fn resolve(default_text: String, port: Arc<dyn OverridePort>) -> Self {
        let text = match port.load(OverrideKey::RuleText).await {
            Ok(Some(text)) if !text.is_empty() => text,
            Ok(_) => default_text,
            Err(error) => {
                tracing::warn!(
                    event_name = "config.resolve.rule_text_unreadable",
                    error = %error,
                    "rule text override could not be read; using built-in rules"
                );
                default_text
            }
        };

        Self { text, port }
    }

    pub fn get(&self) -> &str {
        &self.text
    }

    pub async fn set(&mut self, text: impl Into<String>) -> Result<(), ApplicationError> {
        self.text = text.into();
        self.port
            .save(OverrideKey::RuleText, &self.text)
            .await
            .map_err(|error| ApplicationError::persistence(ConfigSection::RuleText, error))?;

        tracing::info!(
            event_name = "rules.replaced",
            chars = self.text.len(),
            "rule text persisted"
        );
        Ok(())
    }
}
