// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use midcert_analytics::{
    build_checklist, compute_kpis, estimate_savings, export_checklist_csv, failure_to_action,
    run_checklist, Priority, EXPORT_COLUMNS,
};
use midcert_generate::{generate_dataset, GeneratorConfig};
use midcert_model::{AuditStatus, Dataset, MidModule, DAYS_PER_REVISION};
use midcert_store::load_dataset;
use rusqlite::Connection;
use tempfile::{tempdir, TempDir};

fn loaded() -> (TempDir, Dataset, Connection) {
    let tmp = tempdir().expect("tmp");
    let dataset = generate_dataset(&GeneratorConfig::default()).expect("generate");
    let db = tmp.path().join("certification.db");
    load_dataset(&db, &dataset).expect("load");
    let conn = Connection::open(&db).expect("open");
    (tmp, dataset, conn)
}

fn pct(part: usize, whole: usize) -> f64 {
    (part as f64 * 1000.0 / whole as f64).round() / 10.0
}

fn failure_reasons(dataset: &Dataset, module: Option<MidModule>) -> BTreeMap<String, i64> {
    let mut counts = BTreeMap::new();
    for audit in &dataset.audit_results {
        if audit.audit_status != AuditStatus::Fail {
            continue;
        }
        let app = dataset.application(&audit.application_id).expect("app");
        if module.is_some_and(|m| m != app.mid_module) {
            continue;
        }
        if let Some(reason) = audit.failure_reason {
            *counts.entry(reason.as_str().to_string()).or_insert(0) += 1;
        }
    }
    counts
}

#[test]
fn overall_success_matches_in_memory_aggregate() {
    let (_tmp, dataset, conn) = loaded();
    let report = compute_kpis(&conn).expect("kpis");

    let completed: Vec<_> = dataset
        .certification_results
        .iter()
        .filter(|r| r.certification_date.is_some())
        .collect();
    let passes = completed.iter().filter(|r| r.passed_first_time).count();

    assert_eq!(report.success.overall.completed, completed.len() as i64);
    assert_eq!(report.success.overall.first_time_passes, passes as i64);
    assert!((report.success.overall.success_pct - pct(passes, completed.len())).abs() < 0.11);
    assert_eq!(report.summary.completed, completed.len() as i64);
    assert_eq!(report.success.by_module.len(), 2);
}

#[test]
fn failure_rate_counts_every_failed_audit() {
    let (_tmp, dataset, conn) = loaded();
    let report = compute_kpis(&conn).expect("kpis");
    let failures = dataset
        .audit_results
        .iter()
        .filter(|a| a.audit_status == AuditStatus::Fail)
        .count();
    let decided = dataset
        .audit_results
        .iter()
        .filter(|a| a.audit_status != AuditStatus::Pending)
        .count();
    assert_eq!(report.failures.overall.audits, decided as i64);
    assert_eq!(report.failures.overall.failures, failures as i64);
    assert!(report.failures.top_reasons.len() <= 10);
    let text = report.render_text();
    assert!(text.contains("1a. Overall Success Rate"));
}

#[test]
fn failure_reasons_report_their_share_of_failures() {
    let (_tmp, dataset, conn) = loaded();
    let report = compute_kpis(&conn).expect("kpis");
    for (module, rows) in [
        (None, &report.failures.top_reasons),
        (Some(MidModule::B), &report.failures.module_b_reasons),
        (Some(MidModule::D), &report.failures.module_d_reasons),
    ] {
        let expected = failure_reasons(&dataset, module);
        let total: i64 = expected.values().sum();
        assert!(!rows.is_empty());
        for row in rows {
            assert_eq!(row.count, expected[&row.key], "{}", row.key);
            let share = pct(row.count as usize, total as usize);
            assert!((row.value - share).abs() < 0.11, "{} {}", row.key, row.value);
        }
    }
    let text = report.render_text();
    let header = text
        .lines()
        .skip_while(|line| !line.contains("4c. Top Failure Reasons"))
        .nth(1)
        .expect("header row");
    assert!(header.trim_end().ends_with("pct"), "{header}");
}

#[test]
fn client_section_ranks_clients_by_success() {
    let (_tmp, dataset, conn) = loaded();
    let report = compute_kpis(&conn).expect("kpis");
    let active: std::collections::BTreeSet<_> =
        dataset.applications.iter().map(|a| &a.client_id).collect();
    assert_eq!(report.clients.clients, active.len() as i64);
    assert_eq!(report.clients.top.len(), 5);
    assert_eq!(report.clients.bottom.len(), 5);
    for rows in [&report.clients.top, &report.clients.bottom] {
        for pair in rows.windows(2) {
            assert!(pair[0].success_rate >= pair[1].success_rate);
        }
    }
    let best = &report.clients.top[0];
    let worst = report.clients.bottom.last().expect("worst");
    assert!(best.success_rate >= worst.success_rate);
    let text = report.render_text();
    assert!(text.contains("3d. Top Clients by Success"));
    assert!(text.contains(&best.company_name));
}

#[test]
fn checklist_counts_and_priorities_follow_failures() {
    let (_tmp, dataset, conn) = loaded();
    let checklist = build_checklist(&conn, None).expect("checklist");
    let expected = failure_reasons(&dataset, None);

    assert_eq!(checklist.title, "All Modules");
    assert_eq!(checklist.total_failures, expected.values().sum::<i64>());
    assert_eq!(checklist.items.len(), expected.len());
    for item in &checklist.items {
        assert_eq!(item.occurrences, expected[&item.failure_reason]);
        assert_eq!(item.action, failure_to_action(&item.failure_reason));
    }
    for pair in checklist.items.windows(2) {
        assert!(pair[0].occurrences >= pair[1].occurrences);
        assert!(pair[0].priority <= pair[1].priority);
    }
    assert_eq!(checklist.items[0].priority, Priority::High);
    let last = checklist.items.last().expect("items");
    assert!((last.cumulative_pct - 100.0).abs() < 1.0);
}

#[test]
fn module_checklists_only_list_that_modules_reasons() {
    let (_tmp, dataset, conn) = loaded();
    for module in MidModule::ALL {
        let checklist = build_checklist(&conn, Some(*module)).expect("checklist");
        let expected = failure_reasons(&dataset, Some(*module));
        assert_eq!(checklist.module, Some(*module));
        assert_eq!(checklist.total_failures, expected.values().sum::<i64>());
        for item in &checklist.items {
            assert_eq!(item.occurrences, expected[&item.failure_reason]);
        }
    }
}

#[test]
fn export_writes_header_and_rows_by_descending_occurrences() {
    let (tmp, _dataset, conn) = loaded();
    let path = tmp.path().join("checklist_items.csv");
    let rows = export_checklist_csv(&conn, &path).expect("export");
    let text = std::fs::read_to_string(&path).expect("read");
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some(EXPORT_COLUMNS.join(",").as_str()));

    let mut reader = csv::Reader::from_path(&path).expect("reader");
    let records: Vec<csv::StringRecord> = reader
        .records()
        .collect::<Result<_, _>>()
        .expect("records");
    assert_eq!(records.len(), rows);
    let occurrences: Vec<i64> = records
        .iter()
        .map(|r| r[2].parse().expect("occurrences"))
        .collect();
    assert!(occurrences.windows(2).all(|w| w[0] >= w[1]));
    assert!(records.iter().all(|r| &r[1] == "B" || &r[1] == "D"));
    assert!(records.iter().all(|r| !r[4].starts_with("Review: ")));
}

#[test]
fn savings_follow_top_three_reasons() {
    let (_tmp, dataset, conn) = loaded();
    let savings = estimate_savings(&conn).expect("savings");
    let counts = failure_reasons(&dataset, None);
    let mut sorted: Vec<i64> = counts.values().copied().collect();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    let top3: i64 = sorted.iter().take(3).sum();

    assert_eq!(savings.top3_failures, top3);
    assert_eq!(savings.prevented_failures, top3 / 2);
    assert_eq!(savings.days_saved, (top3 / 2) * DAYS_PER_REVISION);
    assert!(savings.projected_success_pct >= savings.current_success_pct);
}

#[test]
fn run_checklist_builds_three_checklists_and_exports() {
    let (tmp, _dataset, conn) = loaded();
    let path = tmp.path().join("out").join("checklist_items.csv");
    let report = run_checklist(&conn, &path).expect("run");
    assert_eq!(report.checklists.len(), 3);
    assert!(path.exists());
    assert!(report.exported_rows > 0);
    assert!(report.impact.delay_per_failure.is_some_and(|d| d > 0.0));
    let text = report.render_text();
    assert!(text.contains("Pre-Audit Checklist: Module B"));
    assert!(text.contains("[HIGH]"));
}
