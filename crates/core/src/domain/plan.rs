use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Fixed commitment period attached to a subscription order line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContractLength {
    #[serde(rename = "36 months", alias = "36-month", alias = "MONTHS_36")]
    Months36,
    #[serde(rename = "60 months", alias = "60-month", alias = "MONTHS_60")]
    Months60,
    #[serde(rename = "84 months", alias = "84-month", alias = "MONTHS_84")]
    Months84,
}

impl ContractLength {
    pub const ALL: [ContractLength; 3] = [Self::Months36, Self::Months60, Self::Months84];

    pub fn months(self) -> u32 {
        match self {
            Self::Months36 => 36,
            Self::Months60 => 60,
            Self::Months84 => 84,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Months36 => "36 months",
            Self::Months60 => "60 months",
            Self::Months84 => "84 months",
        }
    }
}

impl fmt::Display for ContractLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractLength {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        let digits: String = normalized.chars().take_while(char::is_ascii_digit).collect();
        match digits.as_str() {
            "36" => Ok(Self::Months36),
            "60" => Ok(Self::Months60),
            "84" => Ok(Self::Months84),
            _ => Err(DomainError::UnknownContractLength(value.to_string())),
        }
    }
}

/// Closed set of sellable product categories.
///
/// Wire names are the display strings persisted by earlier installations; the
/// short codes are accepted on input so hand-written payloads stay readable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductCategory {
    #[serde(rename = "WP (Water Purifiers)", alias = "WP")]
    WaterPurifier,
    #[serde(rename = "AP (Air Purifiers)", alias = "AP")]
    AirPurifier,
    #[serde(rename = "REF (Refrigerators)", alias = "REF")]
    Refrigerator,
    #[serde(rename = "RAC (Air Conditioners)", alias = "RAC")]
    AirConditioner,
    #[serde(rename = "MICROWAVE")]
    Microwave,
    #[serde(rename = "TV")]
    Television,
    #[serde(rename = "SOUNDBAR")]
    Soundbar,
    #[serde(rename = "MONITOR")]
    Monitor,
    #[serde(rename = "VACUUM")]
    Vacuum,
    #[serde(rename = "DEHUMIDIFIER")]
    Dehumidifier,
    #[serde(rename = "WASHER & DRYER", alias = "WASHER_DRYER")]
    WasherDryer,
}

impl ProductCategory {
    pub const ALL: [ProductCategory; 11] = [
        Self::WaterPurifier,
        Self::AirPurifier,
        Self::Refrigerator,
        Self::AirConditioner,
        Self::Microwave,
        Self::Television,
        Self::Soundbar,
        Self::Monitor,
        Self::Vacuum,
        Self::Dehumidifier,
        Self::WasherDryer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::WaterPurifier => "WP (Water Purifiers)",
            Self::AirPurifier => "AP (Air Purifiers)",
            Self::Refrigerator => "REF (Refrigerators)",
            Self::AirConditioner => "RAC (Air Conditioners)",
            Self::Microwave => "MICROWAVE",
            Self::Television => "TV",
            Self::Soundbar => "SOUNDBAR",
            Self::Monitor => "MONITOR",
            Self::Vacuum => "VACUUM",
            Self::Dehumidifier => "DEHUMIDIFIER",
            Self::WasherDryer => "WASHER & DRYER",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::WaterPurifier => "WP",
            Self::AirPurifier => "AP",
            Self::Refrigerator => "REF",
            Self::AirConditioner => "RAC",
            Self::Microwave => "MICROWAVE",
            Self::Television => "TV",
            Self::Soundbar => "SOUNDBAR",
            Self::Monitor => "MONITOR",
            Self::Vacuum => "VACUUM",
            Self::Dehumidifier => "DEHUMIDIFIER",
            Self::WasherDryer => "WASHER_DRYER",
        }
    }
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductCategory {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|category| {
                category.as_str().eq_ignore_ascii_case(trimmed)
                    || category.code().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| DomainError::UnknownCategory(value.to_string()))
    }
}

const LONG_TERM: &[ContractLength] = &[ContractLength::Months60, ContractLength::Months84];
const SHORT_TERM: &[ContractLength] = &[ContractLength::Months36, ContractLength::Months60];
const STANDARD: &[ContractLength] = &[ContractLength::Months60];

/// Contract lengths a category may legally carry, most preferred first.
///
/// Total over [`ProductCategory`]: every category maps to a non-empty list and
/// the first element is the default selection for a freshly chosen category.
pub fn allowed_plans(category: ProductCategory) -> &'static [ContractLength] {
    match category {
        ProductCategory::WaterPurifier
        | ProductCategory::AirPurifier
        | ProductCategory::Dehumidifier => LONG_TERM,
        ProductCategory::Microwave => SHORT_TERM,
        _ => STANDARD,
    }
}

pub fn default_plan(category: ProductCategory) -> ContractLength {
    allowed_plans(category)[0]
}

pub fn is_plan_allowed(category: ProductCategory, plan: ContractLength) -> bool {
    allowed_plans(category).contains(&plan)
}

/// Checks that `plans` is a non-empty subset of the table entry for `category`.
pub fn validate_plans(
    category: ProductCategory,
    plans: &[ContractLength],
) -> Result<(), DomainError> {
    if plans.is_empty() {
        return Err(DomainError::EmptyPlanList(category));
    }
    match plans.iter().find(|plan| !is_plan_allowed(category, **plan)) {
        Some(plan) => Err(DomainError::PlanNotAllowed { category, plan: *plan }),
        None => Ok(()),
    }
}
