// SPDX-License-Identifier: Apache-2.0

use std::fmt::Write as _;

use midcert_store::{
    client_performance, module_comparison, monthly_throughput, ClientPerformance, ModuleComparison,
    MonthlyThroughput,
};
use rusqlite::Connection;
use serde::Serialize;

use crate::query::{group_stats, GroupStat};
use crate::AnalyticsError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallSuccess {
    pub completed: i64,
    pub first_time_passes: i64,
    pub success_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuccessKpis {
    pub overall: OverallSuccess,
    pub by_module: Vec<GroupStat>,
    pub by_manufacturer_size: Vec<GroupStat>,
    pub by_instrument: Vec<GroupStat>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallTurnaround {
    pub completed: i64,
    pub avg_days: f64,
    pub min_days: i64,
    pub max_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnaroundKpis {
    pub overall: OverallTurnaround,
    pub by_module: Vec<GroupStat>,
    pub by_outcome: Vec<GroupStat>,
    pub by_revision_count: Vec<GroupStat>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeRevisions {
    pub manufacturer_size: String,
    pub clients: i64,
    pub total_revisions: i64,
    pub avg_per_application: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientRevisions {
    pub client_id: String,
    pub company_name: String,
    pub manufacturer_size: String,
    pub applications: i64,
    pub revisions: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevisionKpis {
    pub by_manufacturer_size: Vec<SizeRevisions>,
    pub top_clients: Vec<ClientRevisions>,
    /// Share of all results per revision count, in percent.
    pub distribution: Vec<GroupStat>,
}

/// Clients ranked by first-time success; both lists are best first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientKpis {
    pub clients: i64,
    pub top: Vec<ClientPerformance>,
    pub bottom: Vec<ClientPerformance>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallFailureRate {
    pub audits: i64,
    pub failures: i64,
    pub fail_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureKpis {
    pub overall: OverallFailureRate,
    pub by_module: Vec<GroupStat>,
    pub top_reasons: Vec<GroupStat>,
    pub module_b_reasons: Vec<GroupStat>,
    pub module_d_reasons: Vec<GroupStat>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThroughputKpis {
    pub monthly: Vec<MonthlyThroughput>,
    pub quarterly: Vec<GroupStat>,
    pub by_instrument: Vec<GroupStat>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutiveSummary {
    pub completed: i64,
    pub first_time_passes: i64,
    pub success_pct: f64,
    pub avg_revisions: f64,
    pub avg_turnaround_days: f64,
    pub modules: Vec<ModuleComparison>,
    pub top_failures: Vec<GroupStat>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiReport {
    pub success: SuccessKpis,
    pub turnaround: TurnaroundKpis,
    pub revisions: RevisionKpis,
    pub clients: ClientKpis,
    pub failures: FailureKpis,
    pub throughput: ThroughputKpis,
    pub summary: ExecutiveSummary,
}

const COMPLETED: &str = "certification_date IS NOT NULL";

fn success_kpis(conn: &Connection) -> Result<SuccessKpis, AnalyticsError> {
    let overall = conn.query_row(
        &format!(
            "SELECT COUNT(*),
                    COALESCE(SUM(passed_first_time), 0),
                    COALESCE(ROUND(AVG(passed_first_time) * 100, 1), 0.0)
             FROM certification_results WHERE {COMPLETED}"
        ),
        [],
        |row| {
            Ok(OverallSuccess {
                completed: row.get(0)?,
                first_time_passes: row.get(1)?,
                success_pct: row.get(2)?,
            })
        },
    )?;
    let by = |column: &str| {
        group_stats(
            conn,
            &format!(
                "SELECT {column}, COUNT(*), ROUND(AVG(passed_first_time) * 100, 1) AS pct
                 FROM v_application_details WHERE {COMPLETED}
                 GROUP BY {column} ORDER BY pct DESC, {column}"
            ),
            [],
        )
    };
    Ok(SuccessKpis {
        overall,
        by_module: by("mid_module")?,
        by_manufacturer_size: by("manufacturer_size")?,
        by_instrument: by("instrument_type")?,
    })
}

fn turnaround_kpis(conn: &Connection) -> Result<TurnaroundKpis, AnalyticsError> {
    let overall = conn.query_row(
        &format!(
            "SELECT COUNT(*),
                    COALESCE(ROUND(AVG(turnaround_days), 1), 0.0),
                    COALESCE(MIN(turnaround_days), 0),
                    COALESCE(MAX(turnaround_days), 0)
             FROM v_application_details WHERE {COMPLETED}"
        ),
        [],
        |row| {
            Ok(OverallTurnaround {
                completed: row.get(0)?,
                avg_days: row.get(1)?,
                min_days: row.get(2)?,
                max_days: row.get(3)?,
            })
        },
    )?;
    Ok(TurnaroundKpis {
        overall,
        by_module: group_stats(
            conn,
            &format!(
                "SELECT mid_module, COUNT(*), ROUND(AVG(turnaround_days), 1)
                 FROM v_application_details WHERE {COMPLETED}
                 GROUP BY mid_module ORDER BY mid_module"
            ),
            [],
        )?,
        by_outcome: group_stats(
            conn,
            &format!(
                "SELECT CASE WHEN passed_first_time = 1 THEN 'First-time' ELSE 'Revisions' END,
                        COUNT(*), ROUND(AVG(turnaround_days), 1)
                 FROM v_application_details WHERE {COMPLETED}
                 GROUP BY passed_first_time ORDER BY passed_first_time DESC"
            ),
            [],
        )?,
        by_revision_count: group_stats(
            conn,
            &format!(
                "SELECT CAST(total_revisions AS TEXT), COUNT(*), ROUND(AVG(turnaround_days), 1)
                 FROM v_application_details WHERE {COMPLETED}
                 GROUP BY total_revisions ORDER BY total_revisions"
            ),
            [],
        )?,
    })
}

fn revision_kpis(conn: &Connection) -> Result<RevisionKpis, AnalyticsError> {
    let mut stmt = conn.prepare(
        "SELECT manufacturer_size, COUNT(DISTINCT client_id), SUM(total_revisions),
                ROUND(AVG(total_revisions), 2)
         FROM v_application_details
         GROUP BY manufacturer_size ORDER BY manufacturer_size",
    )?;
    let by_manufacturer_size = stmt
        .query_map([], |row| {
            Ok(SizeRevisions {
                manufacturer_size: row.get(0)?,
                clients: row.get(1)?,
                total_revisions: row.get(2)?,
                avg_per_application: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT client_id, company_name, manufacturer_size, COUNT(*), SUM(total_revisions) AS revs
         FROM v_application_details
         GROUP BY client_id ORDER BY revs DESC, client_id LIMIT 10",
    )?;
    let top_clients = stmt
        .query_map([], |row| {
            Ok(ClientRevisions {
                client_id: row.get(0)?,
                company_name: row.get(1)?,
                manufacturer_size: row.get(2)?,
                applications: row.get(3)?,
                revisions: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let distribution = group_stats(
        conn,
        "SELECT CAST(total_revisions AS TEXT), COUNT(*),
                ROUND(COUNT(*) * 100.0 / (SELECT COUNT(*) FROM certification_results), 1)
         FROM certification_results
         GROUP BY total_revisions ORDER BY total_revisions",
        [],
    )?;
    Ok(RevisionKpis {
        by_manufacturer_size,
        top_clients,
        distribution,
    })
}

const CLIENT_RANK_LIMIT: usize = 5;

fn client_kpis(conn: &Connection) -> Result<ClientKpis, AnalyticsError> {
    let ranked = client_performance(conn)?;
    let top = ranked.iter().take(CLIENT_RANK_LIMIT).cloned().collect();
    let bottom = ranked
        .iter()
        .skip(ranked.len().saturating_sub(CLIENT_RANK_LIMIT))
        .cloned()
        .collect();
    Ok(ClientKpis {
        clients: ranked.len() as i64,
        top,
        bottom,
    })
}

/// Failure reasons with their share, in percent, of all failures in scope.
fn reason_counts(conn: &Connection, module: Option<&str>, limit: i64) -> Result<Vec<GroupStat>, AnalyticsError> {
    group_stats(
        conn,
        "SELECT failure_reason, COUNT(*) AS n,
                ROUND(COUNT(*) * 100.0 / (SELECT COUNT(*) FROM v_failures
                                          WHERE failure_reason IS NOT NULL
                                            AND (?1 IS NULL OR mid_module = ?1)), 1)
         FROM v_failures
         WHERE failure_reason IS NOT NULL AND (?1 IS NULL OR mid_module = ?1)
         GROUP BY failure_reason ORDER BY n DESC, failure_reason LIMIT ?2",
        rusqlite::params![module, limit],
    )
}

fn failure_kpis(conn: &Connection) -> Result<FailureKpis, AnalyticsError> {
    let overall = conn.query_row(
        "SELECT COUNT(*),
                COALESCE(SUM(CASE WHEN audit_status = 'FAIL' THEN 1 ELSE 0 END), 0),
                COALESCE(ROUND(SUM(CASE WHEN audit_status = 'FAIL' THEN 1 ELSE 0 END) * 100.0
                         / COUNT(*), 1), 0.0)
         FROM audit_results WHERE audit_status != 'PENDING'",
        [],
        |row| {
            Ok(OverallFailureRate {
                audits: row.get(0)?,
                failures: row.get(1)?,
                fail_pct: row.get(2)?,
            })
        },
    )?;
    Ok(FailureKpis {
        overall,
        by_module: group_stats(
            conn,
            "SELECT a.mid_module, COUNT(*),
                    ROUND(SUM(CASE WHEN ar.audit_status = 'FAIL' THEN 1 ELSE 0 END) * 100.0
                          / COUNT(*), 1)
             FROM audit_results ar
             JOIN applications a ON ar.application_id = a.application_id
             WHERE ar.audit_status != 'PENDING'
             GROUP BY a.mid_module ORDER BY a.mid_module",
            [],
        )?,
        top_reasons: reason_counts(conn, None, 10)?,
        module_b_reasons: reason_counts(conn, Some("B"), 5)?,
        module_d_reasons: reason_counts(conn, Some("D"), 5)?,
    })
}

fn throughput_kpis(conn: &Connection) -> Result<ThroughputKpis, AnalyticsError> {
    Ok(ThroughputKpis {
        monthly: monthly_throughput(conn)?,
        quarterly: group_stats(
            conn,
            "SELECT substr(month, 1, 4) || '-Q' ||
                    ((CAST(substr(month, 6, 2) AS INTEGER) + 2) / 3) AS quarter,
                    SUM(certifications),
                    ROUND(AVG(success_rate), 1)
             FROM v_monthly_throughput
             GROUP BY quarter ORDER BY quarter",
            [],
        )?,
        by_instrument: group_stats(
            conn,
            &format!(
                "SELECT instrument_type, COUNT(*) AS certs, ROUND(AVG(passed_first_time) * 100, 1)
                 FROM v_application_details WHERE {COMPLETED}
                 GROUP BY instrument_type ORDER BY certs DESC, instrument_type"
            ),
            [],
        )?,
    })
}

fn executive_summary(conn: &Connection) -> Result<ExecutiveSummary, AnalyticsError> {
    let (completed, first_time_passes, success_pct, avg_revisions, avg_turnaround_days): (
        i64,
        i64,
        f64,
        f64,
        f64,
    ) = conn
        .query_row(
            &format!(
                "SELECT COUNT(*),
                        COALESCE(SUM(passed_first_time), 0),
                        COALESCE(ROUND(AVG(passed_first_time) * 100, 1), 0.0),
                        COALESCE(ROUND(AVG(total_revisions), 2), 0.0),
                        COALESCE(ROUND(AVG(turnaround_days), 1), 0.0)
                 FROM v_application_details WHERE {COMPLETED}"
            ),
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
        )?;
    Ok(ExecutiveSummary {
        completed,
        first_time_passes,
        success_pct,
        avg_revisions,
        avg_turnaround_days,
        modules: module_comparison(conn)?,
        top_failures: reason_counts(conn, None, 3)?,
    })
}

pub fn compute_kpis(conn: &Connection) -> Result<KpiReport, AnalyticsError> {
    let report = KpiReport {
        success: success_kpis(conn)?,
        turnaround: turnaround_kpis(conn)?,
        revisions: revision_kpis(conn)?,
        clients: client_kpis(conn)?,
        failures: failure_kpis(conn)?,
        throughput: throughput_kpis(conn)?,
        summary: executive_summary(conn)?,
    };
    tracing::info!(
        completed = report.summary.completed,
        success_pct = report.summary.success_pct,
        "kpis computed"
    );
    Ok(report)
}

fn section(out: &mut String, title: &str, rows: &[GroupStat], count: &str, value: &str) {
    let _ = writeln!(out, "\n--- {title} ---");
    let _ = writeln!(out, "{:<36} {:>8} {:>10}", "", count, value);
    for row in rows {
        let _ = writeln!(out, "{:<36} {:>8} {:>10}", row.key, row.count, row.value);
    }
}

impl KpiReport {
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let s = &self.success.overall;
        let _ = writeln!(
            out,
            "--- 1a. Overall Success Rate ---\ncompleted {}  first-time passes {}  success {}%",
            s.completed, s.first_time_passes, s.success_pct
        );
        section(&mut out, "1b. Success by Module", &self.success.by_module, "apps", "success%");
        section(
            &mut out,
            "1c. Success by Manufacturer Size",
            &self.success.by_manufacturer_size,
            "apps",
            "success%",
        );
        section(&mut out, "1d. Success by Instrument", &self.success.by_instrument, "apps", "success%");

        let t = &self.turnaround.overall;
        let _ = writeln!(
            out,
            "\n--- 2a. Overall Turnaround ---\ncompleted {}  avg {} days  min {}  max {}",
            t.completed, t.avg_days, t.min_days, t.max_days
        );
        section(&mut out, "2b. Turnaround by Module", &self.turnaround.by_module, "apps", "avg days");
        section(
            &mut out,
            "2c. First-Time Pass vs Revisions",
            &self.turnaround.by_outcome,
            "apps",
            "avg days",
        );
        section(
            &mut out,
            "2d. Turnaround by Revision Count",
            &self.turnaround.by_revision_count,
            "apps",
            "avg days",
        );

        let _ = writeln!(out, "\n--- 3a. Revisions by Manufacturer Size ---");
        for row in &self.revisions.by_manufacturer_size {
            let _ = writeln!(
                out,
                "{:<8} clients {:>3}  revisions {:>4}  avg/app {}",
                row.manufacturer_size, row.clients, row.total_revisions, row.avg_per_application
            );
        }
        let _ = writeln!(out, "\n--- 3b. Top 10 Clients by Revisions ---");
        for row in &self.revisions.top_clients {
            let _ = writeln!(
                out,
                "{:<36} {:<6} apps {:>3}  revisions {:>3}",
                row.company_name, row.manufacturer_size, row.applications, row.revisions
            );
        }
        section(&mut out, "3c. Revision Distribution", &self.revisions.distribution, "apps", "pct");

        for (title, rows) in [
            ("3d. Top Clients by Success", &self.clients.top),
            ("3e. Bottom Clients by Success", &self.clients.bottom),
        ] {
            let _ = writeln!(out, "\n--- {title} ---");
            for row in rows {
                let _ = writeln!(
                    out,
                    "{:<36} {:<6} apps {:>3}  first-time {:>3}  success {}%",
                    row.company_name,
                    row.manufacturer_size,
                    row.applications,
                    row.first_time_passes,
                    row.success_rate
                );
            }
        }

        let f = &self.failures.overall;
        let _ = writeln!(
            out,
            "\n--- 4a. Overall Failure Rate ---\naudits {}  failures {}  fail {}%",
            f.audits, f.failures, f.fail_pct
        );
        section(&mut out, "4b. Failure Rate by Module", &self.failures.by_module, "audits", "fail%");
        section(&mut out, "4c. Top Failure Reasons", &self.failures.top_reasons, "n", "pct");
        section(&mut out, "4d. Module B Failures", &self.failures.module_b_reasons, "n", "pct");
        section(&mut out, "4e. Module D Failures", &self.failures.module_d_reasons, "n", "pct");

        let _ = writeln!(out, "\n--- 5a. Monthly Trend ---");
        for m in &self.throughput.monthly {
            let _ = writeln!(
                out,
                "{}  certifications {:>3}  first-time {:>3}  success {}%",
                m.month, m.certifications, m.first_time_passes, m.success_rate
            );
        }
        section(&mut out, "5b. Quarterly Summary", &self.throughput.quarterly, "certs", "success%");
        section(&mut out, "5c. By Instrument Type", &self.throughput.by_instrument, "certs", "success%");

        let e = &self.summary;
        let _ = writeln!(out, "\n--- EXECUTIVE SUMMARY ---");
        let _ = writeln!(out, "Completed: {} applications", e.completed);
        let _ = writeln!(out, "Success rate: {}%", e.success_pct);
        let _ = writeln!(out, "Avg revisions: {}", e.avg_revisions);
        let _ = writeln!(out, "Avg turnaround: {} days", e.avg_turnaround_days);
        let _ = writeln!(out, "\nModule comparison:");
        for m in &e.modules {
            let _ = writeln!(
                out,
                "  {}: {}% success, {} days",
                m.mid_module, m.success_rate, m.avg_days
            );
        }
        let _ = writeln!(out, "\nTop failures:");
        for r in &e.top_failures {
            let _ = writeln!(out, "  - {} ({}, {}%)", r.key, r.count, r.value);
        }
        out
    }
}
