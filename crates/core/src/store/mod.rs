pub mod catalog;
pub mod document;
pub mod rule_text;

#[cfg(test)]
pub(crate) mod testing;

pub use catalog::CatalogStore;
pub use document::{dedupe_by_name, merge, persistable, DocumentStore};
pub use rule_text::RuleTextStore;
