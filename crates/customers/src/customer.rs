use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kegtrail_core::{CustomerId, DomainError, DomainResult};

/// Kind of counterparty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CustomerType {
    #[serde(rename = "BAR")]
    Bar,
    #[serde(rename = "DISTRIBUIDOR")]
    Distribuidor,
    #[serde(rename = "OTRO")]
    Otro,
}

impl CustomerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bar => "BAR",
            Self::Distribuidor => "DISTRIBUIDOR",
            Self::Otro => "OTRO",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "BAR" => Ok(Self::Bar),
            "DISTRIBUIDOR" => Ok(Self::Distribuidor),
            "OTRO" => Ok(Self::Otro),
            other => Err(DomainError::validation(format!(
                "unknown customer type '{other}' (expected BAR, DISTRIBUIDOR or OTRO)"
            ))),
        }
    }
}

impl core::fmt::Display for CustomerType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A counterparty that can hold assets.
///
/// Deleting a customer does not cascade: movements keep their denormalized
/// `customer_name` snapshot and assets currently held keep theirs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub address: String,
    pub contact: String,
    /// One or more phone numbers, comma-separated.
    pub phone: String,
    pub kind: CustomerType,
    pub created_at: DateTime<Utc>,
}

/// Minimum digit count per phone number.
pub const PHONE_MIN_DIGITS: usize = 9;

/// Validate a customer's editable fields.
///
/// `phone` may list several numbers separated by commas; each must carry at
/// least [`PHONE_MIN_DIGITS`] digits (formatting characters are ignored).
pub fn validate_customer(name: &str, phone: &str) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("name must not be empty"));
    }
    for number in phone.split(',') {
        let digits = number.chars().filter(|c| c.is_ascii_digit()).count();
        if digits < PHONE_MIN_DIGITS {
            return Err(DomainError::validation(format!(
                "phone number '{}' has {} digits, need at least {}",
                number.trim(),
                digits,
                PHONE_MIN_DIGITS
            )));
        }
    }
    Ok(())
}
