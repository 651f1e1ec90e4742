// SPDX-License-Identifier: Apache-2.0

//! Untyped view of the four tables. Every cell is kept as text so that
//! malformed values surface as findings instead of load errors.

use std::path::Path;

use chrono::NaiveDate;
use midcert_model::{DataLayout, TableFile, DATE_FORMAT};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::QualityError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawClient {
    pub client_id: Option<String>,
    pub company_name: Option<String>,
    pub manufacturer_size: Option<String>,
    pub sector: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawApplication {
    pub application_id: Option<String>,
    pub client_id: Option<String>,
    pub submission_date: Option<String>,
    pub instrument_type: Option<String>,
    pub mid_module: Option<String>,
    pub risk_class: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawCertification {
    pub application_id: Option<String>,
    pub passed_first_time: Option<String>,
    pub total_revisions: Option<String>,
    pub certification_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawAudit {
    pub audit_id: Option<String>,
    pub application_id: Option<String>,
    pub audit_date: Option<String>,
    pub audit_status: Option<String>,
    pub failure_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDataset {
    pub clients: Vec<RawClient>,
    pub applications: Vec<RawApplication>,
    pub certifications: Vec<RawCertification>,
    pub audits: Vec<RawAudit>,
}

impl RawDataset {
    pub fn load(layout: &DataLayout) -> Result<Self, QualityError> {
        let missing = layout.missing_tables();
        if !missing.is_empty() {
            return Err(QualityError::MissingInput(missing));
        }
        Ok(Self {
            clients: read_rows(&layout.table(TableFile::Clients))?,
            applications: read_rows(&layout.table(TableFile::Applications))?,
            certifications: read_rows(&layout.table(TableFile::CertificationResults))?,
            audits: read_rows(&layout.table(TableFile::AuditResults))?,
        })
    }
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, QualityError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(|e| QualityError::Read(format!("{}: {e}", path.display())))?;
    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| QualityError::Read(format!("{}: {e}", path.display())))
}

/// Missing or unparseable dates both read as `None`.
#[must_use]
pub fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    raw.and_then(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).ok())
}

#[must_use]
pub fn parse_int(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.parse::<i64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_are_coerced() {
        assert_eq!(
            parse_date(Some("2024-02-29")),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert_eq!(parse_date(Some("2023-02-29")), None);
        assert_eq!(parse_date(Some("29/02/2024")), None);
        assert_eq!(parse_date(None), None);
    }

    #[test]
    fn ints_are_coerced() {
        assert_eq!(parse_int(Some("-3")), Some(-3));
        assert_eq!(parse_int(Some("two")), None);
    }
}
