pub mod advisor;
pub mod config;
pub mod domain;
pub mod errors;
pub mod ports;
pub mod resolver;
pub mod store;
pub mod sync;

pub use advisor::{Attachment, QuoteRequest};
pub use domain::catalog::{CatalogItem, CatalogItemId};
pub use domain::document::{Document, UploadedFile};
pub use domain::order::OrderForm;
pub use domain::plan::{ContractLength, ProductCategory};
pub use errors::{ApplicationError, ConfigSection, DomainError, InterfaceError, PortError};
pub use ports::{DocumentPort, OverrideKey, OverridePort};
pub use resolver::{
    ConfigurationResolver, ReloadRequired, ResolvedConfiguration, SystemDefaults,
    WorkingConfiguration,
};
pub use sync::SyncPayload;
