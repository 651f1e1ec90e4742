// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Read-only data-quality validation of a generated dataset.
//!
//! Every rule runs to completion; violations are counted per rule and never
//! abort the evaluation.

mod index;
mod raw;
mod report;
mod rules;

use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use midcert_model::DataLayout;

pub use raw::{
    parse_date, parse_int, RawApplication, RawAudit, RawCertification, RawClient, RawDataset,
};
pub use report::{
    CategorySummary, CheckCategory, CheckOutcome, QualityReport, Severity, SeverityCounts,
    Verdict,
};
pub use rules::{
    MAX_REVISIONS, MAX_TURNAROUND_DAYS, MIN_TURNAROUND_DAYS, PASS_RATE_BAND,
    REVISION_RATE_TOLERANCE, TARGET_REVISION_RATE,
};

pub const CRATE_NAME: &str = "midcert-quality";

#[derive(Debug)]
#[non_exhaustive]
pub enum QualityError {
    MissingInput(Vec<PathBuf>),
    Read(String),
}

impl Display for QualityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingInput(paths) => {
                let joined = paths
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "missing input table(s): {joined}")
            }
            Self::Read(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for QualityError {}

/// `(id, name, category, failing severity)` for every rule, in run order.
#[must_use]
pub fn rule_catalogue() -> Vec<(&'static str, &'static str, CheckCategory, Severity)> {
    rules::QUALITY_RULES
        .iter()
        .map(|r| (r.id, r.name, r.category, r.severity))
        .collect()
}

#[must_use]
pub fn evaluate(data: &RawDataset) -> QualityReport {
    let index = index::DatasetIndex::build(data);
    let outcomes: Vec<CheckOutcome> = rules::QUALITY_RULES
        .iter()
        .map(|rule| {
            let outcome = rule.evaluate(&index);
            tracing::debug!(
                rule = outcome.id,
                severity = outcome.severity.as_str(),
                issues = outcome.issues,
                "quality rule evaluated"
            );
            outcome
        })
        .collect();
    let report = QualityReport::from_outcomes(outcomes);
    tracing::info!(
        verdict = report.verdict.as_str(),
        critical = report.counts.critical,
        warning = report.counts.warning,
        "quality evaluation complete"
    );
    report
}

pub fn validate_layout(layout: &DataLayout) -> Result<QualityReport, QualityError> {
    let data = RawDataset::load(layout)?;
    tracing::info!(
        clients = data.clients.len(),
        applications = data.applications.len(),
        certifications = data.certifications.len(),
        audits = data.audits.len(),
        "loaded tables for validation"
    );
    Ok(evaluate(&data))
}
