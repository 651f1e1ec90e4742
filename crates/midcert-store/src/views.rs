// SPDX-License-Identifier: Apache-2.0

//! Typed readers over the reporting views.

use rusqlite::{params, Connection};
use serde::Serialize;

use crate::StoreError;

fn err(e: rusqlite::Error) -> StoreError {
    StoreError(e.to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleComparison {
    pub mid_module: String,
    pub applications: i64,
    pub first_time_passes: i64,
    pub success_rate: f64,
    pub avg_revisions: f64,
    pub avg_days: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyThroughput {
    pub month: String,
    pub certifications: i64,
    pub first_time_passes: i64,
    pub success_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientPerformance {
    pub client_id: String,
    pub company_name: String,
    pub manufacturer_size: String,
    pub sector: String,
    pub applications: i64,
    pub first_time_passes: i64,
    pub success_rate: f64,
    pub total_revisions: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureCount {
    pub failure_reason: String,
    pub mid_module: String,
    pub occurrences: i64,
}

pub fn module_comparison(conn: &Connection) -> Result<Vec<ModuleComparison>, StoreError> {
    let mut stmt = conn
        .prepare(
            "SELECT mid_module, applications, first_time_passes, success_rate, avg_revisions, avg_days
             FROM v_module_comparison ORDER BY mid_module",
        )
        .map_err(err)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ModuleComparison {
                mid_module: row.get(0)?,
                applications: row.get(1)?,
                first_time_passes: row.get(2)?,
                success_rate: row.get(3)?,
                avg_revisions: row.get(4)?,
                avg_days: row.get(5)?,
            })
        })
        .map_err(err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(err)
}

pub fn monthly_throughput(conn: &Connection) -> Result<Vec<MonthlyThroughput>, StoreError> {
    let mut stmt = conn
        .prepare(
            "SELECT month, certifications, first_time_passes, success_rate
             FROM v_monthly_throughput ORDER BY month",
        )
        .map_err(err)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(MonthlyThroughput {
                month: row.get(0)?,
                certifications: row.get(1)?,
                first_time_passes: row.get(2)?,
                success_rate: row.get(3)?,
            })
        })
        .map_err(err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(err)
}

/// Clients ordered by success rate, best first; ties by id.
pub fn client_performance(conn: &Connection) -> Result<Vec<ClientPerformance>, StoreError> {
    let mut stmt = conn
        .prepare(
            "SELECT client_id, company_name, manufacturer_size, sector, applications,
                    first_time_passes, success_rate, total_revisions
             FROM v_client_performance
             ORDER BY success_rate DESC, client_id",
        )
        .map_err(err)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ClientPerformance {
                client_id: row.get(0)?,
                company_name: row.get(1)?,
                manufacturer_size: row.get(2)?,
                sector: row.get(3)?,
                applications: row.get(4)?,
                first_time_passes: row.get(5)?,
                success_rate: row.get(6)?,
                total_revisions: row.get(7)?,
            })
        })
        .map_err(err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(err)
}

/// Failure reasons by frequency; ties break on reason text.
pub fn failure_counts(conn: &Connection, limit: Option<u32>) -> Result<Vec<FailureCount>, StoreError> {
    let mut stmt = conn
        .prepare(
            "SELECT failure_reason, mid_module, COUNT(*) AS n
             FROM v_failures
             WHERE failure_reason IS NOT NULL
             GROUP BY failure_reason, mid_module
             ORDER BY n DESC, failure_reason
             LIMIT ?1",
        )
        .map_err(err)?;
    let limit = limit.map_or(-1, i64::from);
    let rows = stmt
        .query_map(params![limit], |row| {
            Ok(FailureCount {
                failure_reason: row.get(0)?,
                mid_module: row.get(1)?,
                occurrences: row.get(2)?,
            })
        })
        .map_err(err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(err)
}
