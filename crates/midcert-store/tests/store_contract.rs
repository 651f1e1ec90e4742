// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use midcert_generate::{generate_dataset, generate_to_dir, GeneratorConfig};
use midcert_model::{data_layout, TableFile};
use midcert_store::{
    client_performance, failure_counts, load_dataset, load_layout, module_comparison,
    monthly_throughput, open_store, INDEXES, STORE_SCHEMA_VERSION, VIEWS,
};
use rusqlite::Connection;
use tempfile::tempdir;

#[test]
fn load_creates_tables_indexes_and_views() {
    let tmp = tempdir().expect("tmp");
    let dataset = generate_dataset(&GeneratorConfig::default()).expect("generate");
    let db = tmp.path().join("certification.db");
    let summary = load_dataset(&db, &dataset).expect("load");

    assert_eq!(summary.schema_version, STORE_SCHEMA_VERSION);
    assert_eq!(summary.row_counts["clients"], 50);
    assert_eq!(summary.row_counts["applications"], 300);
    assert_eq!(
        summary.row_counts["audit_results"],
        dataset.audit_results.len() as i64
    );
    for index in INDEXES {
        assert!(summary.indexes.iter().any(|i| i == index), "{index}");
    }
    let mut views: Vec<&str> = VIEWS.to_vec();
    views.sort_unstable();
    assert_eq!(summary.views, views);
    assert_eq!(summary.top_failures.len(), 3);
}

#[test]
fn reload_replaces_previous_store() {
    let tmp = tempdir().expect("tmp");
    let db = tmp.path().join("certification.db");
    let small = generate_dataset(&GeneratorConfig {
        applications: 10,
        clients: 3,
        ..GeneratorConfig::default()
    })
    .expect("small");
    load_dataset(&db, &small).expect("first load");
    let summary = load_dataset(&db, &generate_dataset(&GeneratorConfig::default()).expect("gen"))
        .expect("second load");
    assert_eq!(summary.row_counts["applications"], 300);
}

#[test]
fn module_view_matches_in_memory_aggregates() {
    let tmp = tempdir().expect("tmp");
    let dataset = generate_dataset(&GeneratorConfig::default()).expect("generate");
    let db = tmp.path().join("certification.db");
    load_dataset(&db, &dataset).expect("load");
    let conn = open_store(&db).expect("open");

    let mut expected: BTreeMap<&str, (i64, i64)> = BTreeMap::new();
    for (app, result) in dataset
        .applications
        .iter()
        .zip(&dataset.certification_results)
    {
        if result.is_pending() {
            continue;
        }
        let entry = expected.entry(app.mid_module.as_str()).or_default();
        entry.0 += 1;
        entry.1 += i64::from(result.passed_first_time);
    }
    let rows = module_comparison(&conn).expect("view");
    assert_eq!(rows.len(), 2);
    for row in rows {
        let (apps, passes) = expected[row.mid_module.as_str()];
        assert_eq!(row.applications, apps);
        assert_eq!(row.first_time_passes, passes);
        let rate = (passes as f64 / apps as f64 * 1000.0).round() / 10.0;
        assert!((row.success_rate - rate).abs() < 0.051);
    }
}

#[test]
fn failure_and_throughput_views_cover_every_row() {
    let tmp = tempdir().expect("tmp");
    let dataset = generate_dataset(&GeneratorConfig::default()).expect("generate");
    let db = tmp.path().join("certification.db");
    load_dataset(&db, &dataset).expect("load");
    let conn = open_store(&db).expect("open");

    let failures: i64 = failure_counts(&conn, None)
        .expect("failures")
        .iter()
        .map(|f| f.occurrences)
        .sum();
    let failed_audits = dataset
        .audit_results
        .iter()
        .filter(|a| a.failure_reason.is_some())
        .count();
    assert_eq!(failures, failed_audits as i64);

    let certified: i64 = monthly_throughput(&conn)
        .expect("monthly")
        .iter()
        .map(|m| m.certifications)
        .sum();
    let expected = dataset
        .certification_results
        .iter()
        .filter(|r| !r.is_pending())
        .count();
    assert_eq!(certified, expected as i64);

    let clients = client_performance(&conn).expect("clients");
    let apps: i64 = clients.iter().map(|c| c.applications).sum();
    assert_eq!(apps, 300);
    for pair in clients.windows(2) {
        assert!(pair[0].success_rate >= pair[1].success_rate);
    }
}

#[test]
fn constraints_reject_invalid_rows() {
    let tmp = tempdir().expect("tmp");
    let db = tmp.path().join("certification.db");
    load_dataset(
        &db,
        &generate_dataset(&GeneratorConfig {
            applications: 5,
            clients: 2,
            ..GeneratorConfig::default()
        })
        .expect("generate"),
    )
    .expect("load");
    let conn = Connection::open(&db).expect("open rw");
    conn.execute_batch("PRAGMA foreign_keys=ON;").expect("fk");
    assert!(conn
        .execute(
            "INSERT INTO applications VALUES ('APP99999', 'CLI9999', '2024-01-01', 'Dispenser', 'B', 'Low')",
            [],
        )
        .is_err());
    assert!(conn
        .execute(
            "INSERT INTO clients VALUES ('CLI9999', 'X', 'Tiny', 'Energy')",
            [],
        )
        .is_err());
}

#[test]
fn load_layout_requires_raw_tables() {
    let tmp = tempdir().expect("tmp");
    let layout = data_layout(tmp.path());
    let err = load_layout(&layout).expect_err("missing");
    assert!(err.to_string().contains("missing input"), "{err}");

    generate_to_dir(&GeneratorConfig::default(), &layout).expect("generate");
    std::fs::remove_file(layout.table(TableFile::Clients)).expect("rm");
    assert!(load_layout(&layout).is_err());
}

#[test]
fn open_store_reports_missing_database() {
    let tmp = tempdir().expect("tmp");
    let err = open_store(&tmp.path().join("absent.db")).expect_err("missing");
    assert!(err.to_string().contains("midcert load"));
}
