// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod load;
mod schema;
mod views;

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

use midcert_model::{read_dataset, DataLayout, Dataset};
use rusqlite::{Connection, OpenFlags};
use serde::Serialize;

pub use schema::{INDEXES, STORE_SCHEMA_VERSION, TABLES, VIEWS};
pub use views::{
    client_performance, failure_counts, module_comparison, monthly_throughput, ClientPerformance,
    FailureCount, ModuleComparison, MonthlyThroughput,
};

pub const CRATE_NAME: &str = "midcert-store";

#[derive(Debug)]
pub struct StoreError(pub String);

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for StoreError {}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreSummary {
    pub database: PathBuf,
    pub schema_version: i64,
    pub row_counts: BTreeMap<String, i64>,
    pub indexes: Vec<String>,
    pub views: Vec<String>,
    pub module_comparison: Vec<ModuleComparison>,
    pub top_failures: Vec<FailureCount>,
}

/// Rebuilds the store at `path` from scratch and loads `dataset` into it.
pub fn load_dataset(path: &Path, dataset: &Dataset) -> Result<StoreSummary, StoreError> {
    if path.exists() {
        fs::remove_file(path).map_err(|e| StoreError(format!("{}: {e}", path.display())))?;
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| StoreError(format!("{}: {e}", parent.display())))?;
    }
    let mut conn = Connection::open(path).map_err(|e| StoreError(e.to_string()))?;
    schema::create_schema(&conn)?;
    load::insert_dataset(&mut conn, dataset)?;
    schema::create_views(&conn)?;
    let summary = summarize(&conn, path)?;
    tracing::info!(
        database = %path.display(),
        applications = summary.row_counts.get("applications").copied().unwrap_or_default(),
        "store loaded"
    );
    Ok(summary)
}

/// Reads the raw CSV tables of `layout` and loads them into `layout.database`.
pub fn load_layout(layout: &DataLayout) -> Result<StoreSummary, StoreError> {
    let dataset = read_dataset(layout).map_err(|e| StoreError(e.to_string()))?;
    load_dataset(&layout.database, &dataset)
}

/// Opens an existing store read-only.
pub fn open_store(path: &Path) -> Result<Connection, StoreError> {
    if !path.exists() {
        return Err(StoreError(format!(
            "store not found: {} (run `midcert load` first)",
            path.display()
        )));
    }
    Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(|e| StoreError(format!("{}: {e}", path.display())))
}

fn sqlite_names(conn: &Connection, kind: &str) -> Result<Vec<String>, StoreError> {
    let mut stmt = conn
        .prepare(
            "SELECT name FROM sqlite_master
             WHERE type = ?1 AND name NOT LIKE 'sqlite_%'
             ORDER BY name",
        )
        .map_err(|e| StoreError(e.to_string()))?;
    let rows = stmt
        .query_map([kind], |row| row.get::<_, String>(0))
        .map_err(|e| StoreError(e.to_string()))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| StoreError(e.to_string()))
}

pub fn summarize(conn: &Connection, path: &Path) -> Result<StoreSummary, StoreError> {
    let mut row_counts = BTreeMap::new();
    for table in TABLES {
        let n: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .map_err(|e| StoreError(e.to_string()))?;
        row_counts.insert(table.to_string(), n);
    }
    let schema_version: i64 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| StoreError(e.to_string()))?;
    Ok(StoreSummary {
        database: path.to_path_buf(),
        schema_version,
        row_counts,
        indexes: sqlite_names(conn, "index")?,
        views: sqlite_names(conn, "view")?,
        module_comparison: module_comparison(conn)?,
        top_failures: failure_counts(conn, Some(3))?,
    })
}
