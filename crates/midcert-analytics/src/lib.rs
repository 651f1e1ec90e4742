// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

//! KPI queries, failure impact and the pre-audit checklist, all read from a
//! loaded midcert store.

mod checklist;
mod export;
mod impact;
mod kpi;
mod query;

use std::fmt::{Display, Formatter, Write as _};
use std::path::{Path, PathBuf};

use midcert_model::MidModule;
use midcert_store::StoreError;
use rusqlite::Connection;
use serde::Serialize;

pub use checklist::{
    build_checklist, checklist_action, failure_to_action, prioritize, Checklist, ChecklistItem,
    Priority, HIGH_PRIORITY_CUMULATIVE_PCT, MEDIUM_PRIORITY_CUMULATIVE_PCT,
};
pub use export::{checklist_rows, export_checklist_csv, ExportRow, EXPORT_COLUMNS};
pub use impact::{
    analyze_failures, calculate_impact, estimate_savings, project_savings, FailureAnalysis,
    ImpactAnalysis, RevisionDelay, SavingsEstimate, PASS_CONVERSION_SHARE, PREVENTION_SHARE,
};
pub use kpi::{
    compute_kpis, ClientKpis, ClientRevisions, ExecutiveSummary, FailureKpis, KpiReport,
    OverallFailureRate, OverallSuccess, OverallTurnaround, RevisionKpis, SizeRevisions,
    SuccessKpis, ThroughputKpis, TurnaroundKpis,
};
pub use query::{round1, GroupStat};

pub const CRATE_NAME: &str = "midcert-analytics";

#[derive(Debug)]
pub struct AnalyticsError(pub String);

impl Display for AnalyticsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for AnalyticsError {}

impl From<rusqlite::Error> for AnalyticsError {
    fn from(value: rusqlite::Error) -> Self {
        Self(value.to_string())
    }
}

impl From<StoreError> for AnalyticsError {
    fn from(value: StoreError) -> Self {
        Self(value.0)
    }
}

impl From<csv::Error> for AnalyticsError {
    fn from(value: csv::Error) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChecklistReport {
    pub analysis: FailureAnalysis,
    pub impact: ImpactAnalysis,
    pub checklists: Vec<Checklist>,
    pub savings: SavingsEstimate,
    pub export_path: PathBuf,
    pub exported_rows: usize,
}

/// Builds the overall and per-module checklists and writes the CSV export.
pub fn run_checklist(
    conn: &Connection,
    export_path: &Path,
) -> Result<ChecklistReport, AnalyticsError> {
    let analysis = analyze_failures(conn)?;
    let impact = calculate_impact(conn)?;
    let mut checklists = vec![build_checklist(conn, None)?];
    for module in MidModule::ALL {
        checklists.push(build_checklist(conn, Some(*module))?);
    }
    let savings = estimate_savings(conn)?;
    let exported_rows = export_checklist_csv(conn, export_path)?;
    tracing::info!(
        failures = analysis.total_failures,
        prevented = savings.prevented_failures,
        "checklist built"
    );
    Ok(ChecklistReport {
        analysis,
        impact,
        checklists,
        savings,
        export_path: export_path.to_path_buf(),
        exported_rows,
    })
}

impl ChecklistReport {
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let a = &self.analysis;
        let _ = writeln!(
            out,
            "--- Failure Analysis ---\nfailed audits {}  affected applications {}",
            a.total_failures, a.affected_applications
        );
        for row in &a.by_module {
            let _ = writeln!(out, "  Module {}: {} failures ({}%)", row.key, row.count, row.value);
        }

        let i = &self.impact;
        let _ = writeln!(out, "\n--- Impact on Turnaround ---");
        if let (Some(passed), Some(failed), Some(delay)) =
            (i.passed_avg_days, i.failed_avg_days, i.delay_per_failure)
        {
            let _ = writeln!(
                out,
                "first-time pass {passed} days  with revisions {failed} days  delay {delay} days"
            );
        }
        for row in &i.by_revisions {
            let _ = writeln!(
                out,
                "  {} revision(s): {} apps  avg {} days  +{} days  ({} per revision)",
                row.revisions, row.applications, row.avg_days, row.delta_days, row.days_per_revision
            );
        }

        for checklist in &self.checklists {
            let _ = writeln!(
                out,
                "\n--- Pre-Audit Checklist: {} ({} failures) ---",
                checklist.title, checklist.total_failures
            );
            for priority in Priority::ALL {
                let items: Vec<_> = checklist.items_with(priority).collect();
                if items.is_empty() {
                    continue;
                }
                let _ = writeln!(out, "[{}]", priority.as_str());
                for item in items {
                    let _ = writeln!(
                        out,
                        "  [ ] {} ({} occurrences, {}%)\n      {}",
                        item.failure_reason, item.occurrences, item.pct, item.action
                    );
                }
            }
        }

        let s = &self.savings;
        let _ = writeln!(
            out,
            "\n--- Estimated Savings ---\ntop-3 failures {}  prevented {}  days saved {}\nsuccess {}% -> {}%",
            s.top3_failures,
            s.prevented_failures,
            s.days_saved,
            s.current_success_pct,
            s.projected_success_pct
        );
        let _ = writeln!(
            out,
            "exported {} rows to {}",
            self.exported_rows,
            self.export_path.display()
        );
        out
    }
}
