// SPDX-License-Identifier: Apache-2.0

use chrono::NaiveDate;
use midcert_model::{
    data_layout, read_dataset, read_table, write_dataset, Application, ApplicationId, AuditId,
    AuditResult, AuditStatus, CertificationResult, Client, ClientId, Dataset, FailureReason,
    InstrumentType, ManufacturerSize, MidModule, RiskClass, Sector, TableError, TableFile,
};
use tempfile::tempdir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("date")
}

fn tiny_dataset() -> Dataset {
    let client_id = ClientId::from_sequence(1).expect("client");
    let app_id = ApplicationId::from_sequence(1).expect("app");
    Dataset {
        clients: vec![Client {
            client_id: client_id.clone(),
            company_name: "Nordic Meters GmbH".to_string(),
            manufacturer_size: ManufacturerSize::Sme,
            sector: Sector::RetailFuel,
        }],
        applications: vec![Application {
            application_id: app_id.clone(),
            client_id,
            submission_date: date(2024, 3, 1),
            instrument_type: InstrumentType::Dispenser,
            mid_module: MidModule::B,
            risk_class: RiskClass::Medium,
        }],
        certification_results: vec![CertificationResult {
            application_id: app_id.clone(),
            passed_first_time: false,
            total_revisions: 1,
            certification_date: Some(date(2024, 5, 1)),
        }],
        audit_results: vec![
            AuditResult {
                audit_id: AuditId::from_sequence(1).expect("audit"),
                application_id: app_id.clone(),
                audit_date: date(2024, 4, 1),
                audit_status: AuditStatus::Fail,
                failure_reason: Some(FailureReason::MarkingNonCompliant),
            },
            AuditResult {
                audit_id: AuditId::from_sequence(2).expect("audit"),
                application_id: app_id,
                audit_date: date(2024, 5, 1),
                audit_status: AuditStatus::Pass,
                failure_reason: None,
            },
        ],
    }
}

#[test]
fn csv_text_uses_labels_flags_and_empty_nulls() {
    let tmp = tempdir().expect("tmp");
    let layout = data_layout(tmp.path());
    write_dataset(&layout, &tiny_dataset()).expect("write");

    let clients = std::fs::read_to_string(layout.table(TableFile::Clients)).expect("clients");
    assert_eq!(
        clients,
        "client_id,company_name,manufacturer_size,sector\nCLI0001,Nordic Meters GmbH,SME,Retail Fuel\n"
    );
    let certs =
        std::fs::read_to_string(layout.table(TableFile::CertificationResults)).expect("certs");
    assert!(certs.contains("APP00001,0,1,2024-05-01\n"));
    let audits = std::fs::read_to_string(layout.table(TableFile::AuditResults)).expect("audits");
    assert!(audits.contains("AUD00001,APP00001,2024-04-01,FAIL,Marking/labelling non-compliant\n"));
    assert!(audits.ends_with("AUD00002,APP00001,2024-05-01,PASS,\n"));
}

#[test]
fn written_dataset_reads_back_identically() {
    let tmp = tempdir().expect("tmp");
    let layout = data_layout(tmp.path());
    let dataset = tiny_dataset();
    write_dataset(&layout, &dataset).expect("write");
    assert_eq!(read_dataset(&layout).expect("read"), dataset);
}

#[test]
fn missing_tables_are_reported_together() {
    let tmp = tempdir().expect("tmp");
    let layout = data_layout(tmp.path());
    match read_dataset(&layout) {
        Err(TableError::MissingInput(paths)) => assert_eq!(paths.len(), 4),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn header_drift_is_a_schema_error() {
    let tmp = tempdir().expect("tmp");
    let path = tmp.path().join("clients.csv");
    std::fs::write(&path, "client_id,name,manufacturer_size,sector\n").expect("write");
    let err = read_table::<Client>(&path, TableFile::Clients).expect_err("schema");
    assert!(matches!(err, TableError::Schema { .. }), "{err}");
}

#[test]
fn invalid_flag_is_rejected_on_typed_read() {
    let tmp = tempdir().expect("tmp");
    let path = tmp.path().join("certification_results.csv");
    std::fs::write(
        &path,
        "application_id,passed_first_time,total_revisions,certification_date\nAPP00001,2,0,2024-01-30\n",
    )
    .expect("write");
    let err = read_table::<CertificationResult>(&path, TableFile::CertificationResults)
        .expect_err("flag");
    assert!(err.to_string().contains("flag must be 0 or 1"), "{err}");
}
