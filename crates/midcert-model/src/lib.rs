// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Record model for the certification dataset.
//!
//! Four tables share foreign-key style references:
//! clients ← applications ← certification_results / audit_results.

mod categories;
mod ids;
mod layout;
mod records;
mod serde_helpers;
mod tables;

pub use categories::{
    AuditStatus, FailureReason, InstrumentType, ManufacturerSize, MidModule, RiskClass, Sector,
};
pub use ids::{ApplicationId, AuditId, ClientId};
pub use layout::{data_layout, DataLayout, TableFile};
pub use records::{Application, AuditResult, CertificationResult, Client, Dataset};
pub use tables::{read_dataset, read_table, write_dataset, write_table, TableError};

pub const CRATE_NAME: &str = "midcert-model";

/// Calendar format shared by every date column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Days one revision cycle adds to an application's turnaround.
pub const DAYS_PER_REVISION: i64 = 14;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ValidationError {}
