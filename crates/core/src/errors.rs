use thiserror::Error;

use crate::domain::plan::{ContractLength, ProductCategory};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("unknown product category `{0}`")]
    UnknownCategory(String),
    #[error("unknown contract length `{0}`")]
    UnknownContractLength(String),
    #[error("{0} requires at least one contract length")]
    EmptyPlanList(ProductCategory),
    #[error("{plan} is not offered for {category}")]
    PlanNotAllowed { category: ProductCategory, plan: ContractLength },
    #[error("index {index} is out of range for {len} entries")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("catalog item `{0}` does not exist")]
    UnknownCatalogItem(String),
    #[error("system document `{0}` cannot be removed")]
    SystemDocumentImmutable(String),
    #[error("malformed data URI: {0}")]
    MalformedDataUri(String),
    #[error("order line {line} has no category selected")]
    CategoryNotSelected { line: usize },
    #[error("order line {line} does not offer {contract}")]
    ContractNotOffered { line: usize, contract: ContractLength },
    #[error("the order must keep at least one line")]
    LastOrderLine,
    #[error("order line {line} has no product selected")]
    OrderIncomplete { line: usize },
    #[error("order line {line} needs a quantity of at least one")]
    InvalidQuantity { line: usize },
}

/// Failure reported by a persistence adapter.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PortError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage capacity exceeded: {0}")]
    CapacityExceeded(String),
    #[error("record could not be encoded for storage: {0}")]
    Encode(String),
    #[error("stored record could not be decoded: {0}")]
    Decode(String),
}

/// Which part of the working configuration an operation touched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Catalog,
    RuleText,
    Documents,
}

impl std::fmt::Display for ConfigSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Catalog => "catalog",
            Self::RuleText => "rule text",
            Self::Documents => "documents",
        })
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    /// The in-memory state already changed; the durable copy did not.
    #[error("{section} changed in memory but was not persisted: {source}")]
    Persistence { section: ConfigSection, source: PortError },
    #[error("malformed sync payload: {0}")]
    MalformedPayload(String),
    #[error("sync stopped at {failed} after applying {applied:?}: {reason}")]
    PartialApply { applied: Vec<ConfigSection>, failed: ConfigSection, reason: String },
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("rejected: {message}")]
    Rejected { message: String, correlation_id: String },
    #[error("not durable: {message}")]
    NotDurable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    /// Short text for the transient status notification.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Rejected { .. } => "The action was rejected. Check the input and try again.",
            Self::NotDurable { .. } => {
                "The change is active but could not be saved on this device."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::Rejected { correlation_id: id, .. }
            | InterfaceError::NotDurable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }

    pub fn persistence(section: ConfigSection, source: PortError) -> Self {
        Self::Persistence { section, source }
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let message = value.to_string();
        let correlation_id = "unassigned".to_owned();
        match value {
            ApplicationError::Domain(_) | ApplicationError::MalformedPayload(_) => {
                Self::Rejected { message, correlation_id }
            }
            ApplicationError::Persistence { .. } | ApplicationError::PartialApply { .. } => {
                Self::NotDurable { message, correlation_id }
            }
            ApplicationError::Configuration(_) => Self::Internal { message, correlation_id },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::plan::ProductCategory;
    use crate::errors::{ApplicationError, ConfigSection, DomainError, InterfaceError, PortError};

    #[test]
    fn empty_plan_list_names_the_category() {
        let error = DomainError::EmptyPlanList(ProductCategory::Television);
        assert_eq!(error.to_string(), "TV requires at least one contract length");
    }

    #[test]
    fn domain_error_maps_to_rejected_interface_error() {
        let interface = ApplicationError::from(DomainError::SystemDocumentImmutable(
            "catalogue.pdf".to_owned(),
        ))
        .into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::Rejected {
                ref correlation_id,
                ..
            } if correlation_id == "req-1"
        ));
    }

    #[test]
    fn malformed_payload_is_rejected_with_user_safe_message() {
        let interface =
            ApplicationError::MalformedPayload("expected value".to_owned()).into_interface("req-2");

        assert_eq!(
            interface.user_message(),
            "The action was rejected. Check the input and try again."
        );
    }

    #[test]
    fn persistence_error_is_distinguishable_as_not_durable() {
        let interface = ApplicationError::persistence(
            ConfigSection::Documents,
            PortError::CapacityExceeded("disk full".to_owned()),
        )
        .into_interface("req-3");

        assert!(matches!(interface, InterfaceError::NotDurable { ref message, .. }
            if message.contains("documents") && message.contains("disk full")));
        assert_eq!(
            interface.user_message(),
            "The change is active but could not be saved on this device."
        );
    }

    #[test]
    fn partial_apply_names_applied_sections() {
        let error = ApplicationError::PartialApply {
            applied: vec![ConfigSection::Catalog, ConfigSection::RuleText],
            failed: ConfigSection::Documents,
            reason: "quota".to_owned(),
        };

        assert!(error.to_string().contains("[Catalog, RuleText]"));
        assert!(matches!(error.into_interface("req-4"), InterfaceError::NotDurable { .. }));
    }

    #[test]
    fn configuration_error_maps_to_internal() {
        let interface =
            ApplicationError::Configuration("bad url".to_owned()).into_interface("req-5");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.user_message(), "An unexpected internal error occurred.");
    }
}
