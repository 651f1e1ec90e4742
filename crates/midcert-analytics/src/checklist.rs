// SPDX-License-Identifier: Apache-2.0

use midcert_model::{FailureReason, MidModule};
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::query::round1;
use crate::AnalyticsError;

/// Cumulative share of failures up to which an item is HIGH priority.
pub const HIGH_PRIORITY_CUMULATIVE_PCT: f64 = 50.0;
/// Cumulative share of failures up to which an item is MEDIUM priority.
pub const MEDIUM_PRIORITY_CUMULATIVE_PCT: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Self; 3] = [Self::High, Self::Medium, Self::Low];

    #[must_use]
    pub fn from_cumulative_pct(cumulative_pct: f64) -> Self {
        if cumulative_pct <= HIGH_PRIORITY_CUMULATIVE_PCT {
            Self::High
        } else if cumulative_pct <= MEDIUM_PRIORITY_CUMULATIVE_PCT {
            Self::Medium
        } else {
            Self::Low
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

#[must_use]
pub const fn checklist_action(reason: FailureReason) -> &'static str {
    match reason {
        FailureReason::TechnicalFileIncomplete => {
            "Verify technical file contains all sections per MID Annex requirements"
        }
        FailureReason::DocumentationInconsistencies => {
            "Cross-check all document references and version numbers"
        }
        FailureReason::TestReportGaps => {
            "Confirm test reports cover all applicable MID essential requirements"
        }
        FailureReason::MetrologicalRequirementsUnclear => {
            "Review metrological characteristics against MID Annex MI-001 to MI-010"
        }
        FailureReason::SoftwareDocumentationMissing => {
            "Include software architecture, version control, and validation records"
        }
        FailureReason::DurabilityEvidenceInsufficient => {
            "Provide durability test results or field performance data"
        }
        FailureReason::MarkingNonCompliant => {
            "Check CE marking, NB number, and instrument labelling requirements"
        }
        FailureReason::EmcTestResultsMissing => "Include EMC test reports per EN 61326 or equivalent",
        FailureReason::TrainingRecordsMissing => "Verify training records for all personnel in scope",
        FailureReason::InternalAuditGaps => "Review internal audit schedule and findings closure",
        FailureReason::CalibrationRecordsOutdated => {
            "Check calibration status of all measurement equipment"
        }
        FailureReason::NonConformanceHandlingUnclear => {
            "Document NCR process with examples of recent closures"
        }
        FailureReason::ProductionProcessNotDocumented => {
            "Map production process with quality control points"
        }
        FailureReason::SupplierControlInsufficient => {
            "Include approved supplier list and evaluation records"
        }
        FailureReason::ManagementReviewIncomplete => {
            "Provide recent management review minutes with actions"
        }
        FailureReason::CorrectiveActionRecordsMissing => {
            "Document CAPA process with closure evidence"
        }
    }
}

/// Action text for a stored failure reason; unknown labels get a generic
/// review item.
#[must_use]
pub fn failure_to_action(reason: &str) -> String {
    FailureReason::parse(reason).map_or_else(
        |_| format!("Review: {reason}"),
        |r| checklist_action(r).to_string(),
    )
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChecklistItem {
    pub failure_reason: String,
    pub occurrences: i64,
    pub pct: f64,
    pub cumulative_pct: f64,
    pub priority: Priority,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Checklist {
    pub title: String,
    pub module: Option<MidModule>,
    pub total_failures: i64,
    pub items: Vec<ChecklistItem>,
}

/// Pareto prioritisation of `(reason, occurrences)` pairs, which must be
/// ordered by occurrences descending.
#[must_use]
pub fn prioritize(counts: &[(String, i64)]) -> Vec<ChecklistItem> {
    let total: i64 = counts.iter().map(|(_, n)| n).sum();
    let mut cumulative = 0.0;
    counts
        .iter()
        .map(|(reason, occurrences)| {
            let pct = if total == 0 {
                0.0
            } else {
                round1(*occurrences as f64 * 100.0 / total as f64)
            };
            cumulative = round1(cumulative + pct);
            ChecklistItem {
                failure_reason: reason.clone(),
                occurrences: *occurrences,
                pct,
                cumulative_pct: cumulative,
                priority: Priority::from_cumulative_pct(cumulative),
                action: failure_to_action(reason),
            }
        })
        .collect()
}

pub fn build_checklist(
    conn: &Connection,
    module: Option<MidModule>,
) -> Result<Checklist, AnalyticsError> {
    let mut stmt = conn.prepare(
        "SELECT failure_reason, COUNT(*) AS n
         FROM v_failures
         WHERE failure_reason IS NOT NULL AND (?1 IS NULL OR mid_module = ?1)
         GROUP BY failure_reason
         ORDER BY n DESC, failure_reason",
    )?;
    let counts = stmt
        .query_map(params![module.map(MidModule::as_str)], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    let items = prioritize(&counts);
    Ok(Checklist {
        title: module.map_or_else(|| "All Modules".to_string(), |m| format!("Module {m}")),
        module,
        total_failures: counts.iter().map(|(_, n)| n).sum(),
        items,
    })
}

impl Checklist {
    #[must_use]
    pub fn items_with(&self, priority: Priority) -> impl Iterator<Item = &ChecklistItem> {
        self.items.iter().filter(move |i| i.priority == priority)
    }
}
