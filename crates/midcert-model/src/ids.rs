// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClientId(String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApplicationId(String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AuditId(String);

fn validate_id(
    kind: &'static str,
    prefix: &'static str,
    digits: usize,
    value: &str,
) -> Result<(), ValidationError> {
    let Some(rest) = value.strip_prefix(prefix) else {
        return Err(ValidationError(format!(
            "invalid {kind} `{value}`: must start with {prefix}"
        )));
    };
    if rest.len() != digits || !rest.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError(format!(
            "invalid {kind} `{value}`: must be {prefix} followed by {digits} digits"
        )));
    }
    Ok(())
}

fn format_sequence(
    kind: &'static str,
    prefix: &'static str,
    digits: usize,
    n: u32,
) -> Result<String, ValidationError> {
    let max = 10_u64.pow(digits as u32) - 1;
    if n == 0 || u64::from(n) > max {
        return Err(ValidationError(format!(
            "{kind} sequence {n} out of range 1..={max}"
        )));
    }
    Ok(format!("{prefix}{n:0width$}", width = digits))
}

macro_rules! impl_id {
    ($name:ident, $kind:literal, $prefix:literal, $digits:literal) => {
        impl $name {
            pub const PREFIX: &'static str = $prefix;
            pub const DIGITS: usize = $digits;

            pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
                let value = value.into();
                validate_id($kind, $prefix, $digits, &value)?;
                Ok(Self(value))
            }

            /// Builds the id for the 1-based position `n` in generation order.
            pub fn from_sequence(n: u32) -> Result<Self, ValidationError> {
                format_sequence($kind, $prefix, $digits, n).map(Self)
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            #[must_use]
            pub fn is_well_formed(value: &str) -> bool {
                validate_id($kind, $prefix, $digits, value).is_ok()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, ValidationError> {
                Self::new(value)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, ValidationError> {
                Self::new(s)
            }
        }
    };
}

impl_id!(ClientId, "client_id", "CLI", 4);
impl_id!(ApplicationId, "application_id", "APP", 5);
impl_id!(AuditId, "audit_id", "AUD", 5);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_ids_are_zero_padded() {
        assert_eq!(ClientId::from_sequence(7).expect("id").as_str(), "CLI0007");
        assert_eq!(
            ApplicationId::from_sequence(300).expect("id").as_str(),
            "APP00300"
        );
        assert_eq!(AuditId::from_sequence(1).expect("id").as_str(), "AUD00001");
    }

    #[test]
    fn sequence_overflow_is_rejected() {
        assert!(ClientId::from_sequence(10_000).is_err());
        assert!(ClientId::from_sequence(0).is_err());
    }

    #[test]
    fn malformed_ids_are_rejected() {
        assert!(ClientId::new("CLI001").is_err());
        assert!(ClientId::new("cli0001").is_err());
        assert!(ApplicationId::new("APP0000A").is_err());
        assert!(AuditId::new(" AUD00001").is_err());
        assert!(AuditId::is_well_formed("AUD12345"));
    }
}
