// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::path::Path;

use midcert_store::failure_counts;
use rusqlite::Connection;
use serde::Serialize;

use crate::checklist::failure_to_action;
use crate::query::round1;
use crate::AnalyticsError;

pub const EXPORT_COLUMNS: [&str; 5] = [
    "failure_reason",
    "mid_module",
    "occurrences",
    "pct_total",
    "checklist_item",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub failure_reason: String,
    pub mid_module: String,
    pub occurrences: i64,
    pub pct_total: f64,
    pub checklist_item: String,
}

pub fn checklist_rows(conn: &Connection) -> Result<Vec<ExportRow>, AnalyticsError> {
    let counts = failure_counts(conn, None)?;
    let total: i64 = counts.iter().map(|c| c.occurrences).sum();
    Ok(counts
        .into_iter()
        .map(|c| ExportRow {
            pct_total: if total == 0 {
                0.0
            } else {
                round1(c.occurrences as f64 * 100.0 / total as f64)
            },
            checklist_item: failure_to_action(&c.failure_reason),
            failure_reason: c.failure_reason,
            mid_module: c.mid_module,
            occurrences: c.occurrences,
        })
        .collect())
}

/// Writes `checklist_items.csv`, one row per (reason, module) pair ordered by
/// occurrences descending. Returns the number of rows written.
pub fn export_checklist_csv(conn: &Connection, path: &Path) -> Result<usize, AnalyticsError> {
    let rows = checklist_rows(conn)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| AnalyticsError(format!("{}: {e}", parent.display())))?;
        }
    }
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(path)
        .map_err(|e| AnalyticsError(format!("{}: {e}", path.display())))?;
    writer.write_record(EXPORT_COLUMNS)?;
    for row in &rows {
        writer.serialize(row)?;
    }
    writer
        .flush()
        .map_err(|e| AnalyticsError(format!("{}: {e}", path.display())))?;
    tracing::info!(path = %path.display(), rows = rows.len(), "checklist exported");
    Ok(rows.len())
}
