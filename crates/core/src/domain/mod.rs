pub mod catalog;
pub mod document;
pub mod order;
pub mod plan;
