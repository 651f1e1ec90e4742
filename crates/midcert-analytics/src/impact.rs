// SPDX-License-Identifier: Apache-2.0

use midcert_model::DAYS_PER_REVISION;
use rusqlite::Connection;
use serde::Serialize;

use crate::query::{group_stats, round1, GroupStat};
use crate::AnalyticsError;

/// Share of the top three failure reasons a checklist is assumed to prevent.
pub const PREVENTION_SHARE: f64 = 0.5;
/// Share of prevented failures assumed to turn into first-time passes.
pub const PASS_CONVERSION_SHARE: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureAnalysis {
    pub total_failures: i64,
    pub affected_applications: i64,
    pub by_module: Vec<GroupStat>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevisionDelay {
    pub revisions: i64,
    pub applications: i64,
    pub avg_days: f64,
    pub delta_days: f64,
    pub days_per_revision: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactAnalysis {
    pub passed_avg_days: Option<f64>,
    pub failed_avg_days: Option<f64>,
    /// Extra turnaround of applications that needed revisions.
    pub delay_per_failure: Option<f64>,
    pub by_revisions: Vec<RevisionDelay>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavingsEstimate {
    pub completed_applications: i64,
    pub failed_applications: i64,
    pub total_revisions: i64,
    pub total_failures: i64,
    pub top3_failures: i64,
    pub prevented_failures: i64,
    pub days_saved: i64,
    pub current_success_pct: f64,
    pub projected_success_pct: f64,
}

pub fn analyze_failures(conn: &Connection) -> Result<FailureAnalysis, AnalyticsError> {
    let (total_failures, affected_applications) = conn.query_row(
        "SELECT COUNT(*), COUNT(DISTINCT application_id) FROM v_failures",
        [],
        |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
    )?;
    let by_module = group_stats(
        conn,
        "SELECT mid_module, COUNT(*), ROUND(COUNT(*) * 100.0 / (SELECT COUNT(*) FROM v_failures), 1)
         FROM v_failures GROUP BY mid_module ORDER BY mid_module",
        [],
    )?;
    Ok(FailureAnalysis {
        total_failures,
        affected_applications,
        by_module,
    })
}

pub fn calculate_impact(conn: &Connection) -> Result<ImpactAnalysis, AnalyticsError> {
    let (failed_avg_days, passed_avg_days) = conn.query_row(
        "SELECT ROUND(AVG(CASE WHEN passed_first_time = 0 THEN turnaround_days END), 1),
                ROUND(AVG(CASE WHEN passed_first_time = 1 THEN turnaround_days END), 1)
         FROM v_application_details
         WHERE certification_date IS NOT NULL",
        [],
        |row| Ok((row.get::<_, Option<f64>>(0)?, row.get::<_, Option<f64>>(1)?)),
    )?;
    let delay_per_failure = match (failed_avg_days, passed_avg_days) {
        (Some(failed), Some(passed)) => Some(round1(failed - passed)),
        _ => None,
    };

    let mut stmt = conn.prepare(
        "SELECT total_revisions, COUNT(*), ROUND(AVG(turnaround_days), 1)
         FROM v_application_details
         WHERE certification_date IS NOT NULL AND total_revisions > 0
         GROUP BY total_revisions ORDER BY total_revisions",
    )?;
    let baseline = passed_avg_days.unwrap_or_default();
    let by_revisions = stmt
        .query_map([], |row| {
            let revisions: i64 = row.get(0)?;
            let avg_days: f64 = row.get(2)?;
            let delta_days = round1(avg_days - baseline);
            Ok(RevisionDelay {
                revisions,
                applications: row.get(1)?,
                avg_days,
                delta_days,
                days_per_revision: round1(delta_days / revisions as f64),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ImpactAnalysis {
        passed_avg_days,
        failed_avg_days,
        delay_per_failure,
        by_revisions,
    })
}

/// Projection for a checklist that prevents half of the top three failure
/// reasons. Each prevented failure saves one revision cycle.
#[must_use]
pub fn project_savings(
    completed_applications: i64,
    failed_applications: i64,
    total_revisions: i64,
    total_failures: i64,
    top3_failures: i64,
) -> SavingsEstimate {
    let prevented_failures = (top3_failures as f64 * PREVENTION_SHARE).floor() as i64;
    let (current_success_pct, projected_success_pct) = if completed_applications == 0 {
        (0.0, 0.0)
    } else {
        let total = completed_applications as f64;
        let passed = (completed_applications - failed_applications) as f64;
        (
            round1(passed / total * 100.0),
            round1((passed + prevented_failures as f64 * PASS_CONVERSION_SHARE) / total * 100.0),
        )
    };
    SavingsEstimate {
        completed_applications,
        failed_applications,
        total_revisions,
        total_failures,
        top3_failures,
        prevented_failures,
        days_saved: prevented_failures * DAYS_PER_REVISION,
        current_success_pct,
        projected_success_pct,
    }
}

pub fn estimate_savings(conn: &Connection) -> Result<SavingsEstimate, AnalyticsError> {
    let (completed, failed, revisions) = conn.query_row(
        "SELECT COUNT(*),
                COALESCE(SUM(CASE WHEN passed_first_time = 0 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(total_revisions), 0)
         FROM certification_results
         WHERE certification_date IS NOT NULL",
        [],
        |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
            ))
        },
    )?;
    let total_failures: i64 =
        conn.query_row("SELECT COUNT(*) FROM v_failures", [], |row| row.get(0))?;
    let top3: i64 = conn.query_row(
        "SELECT COALESCE(SUM(n), 0) FROM (
           SELECT COUNT(*) AS n FROM v_failures
           GROUP BY failure_reason ORDER BY n DESC LIMIT 3
         )",
        [],
        |row| row.get(0),
    )?;
    Ok(project_savings(
        completed,
        failed,
        revisions,
        total_failures,
        top3,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn savings_prevent_half_of_top_three() {
        let estimate = project_savings(280, 120, 220, 230, 101);
        assert_eq!(estimate.prevented_failures, 50);
        assert_eq!(estimate.days_saved, 50 * DAYS_PER_REVISION);
        assert_eq!(estimate.current_success_pct, 57.1);
        assert_eq!(estimate.projected_success_pct, 71.4);
    }

    #[test]
    fn savings_on_empty_store_are_zero() {
        let estimate = project_savings(0, 0, 0, 0, 0);
        assert_eq!(estimate.prevented_failures, 0);
        assert_eq!(estimate.projected_success_pct, 0.0);
    }
}
