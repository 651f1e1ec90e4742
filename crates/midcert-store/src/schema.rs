// SPDX-License-Identifier: Apache-2.0

use rusqlite::Connection;

use crate::StoreError;

pub const STORE_SCHEMA_VERSION: i64 = 1;

pub const TABLES: [&str; 4] = [
    "clients",
    "applications",
    "certification_results",
    "audit_results",
];

pub const INDEXES: [&str; 7] = [
    "idx_app_client",
    "idx_app_module",
    "idx_app_instrument",
    "idx_audit_app",
    "idx_audit_status",
    "idx_app_date",
    "idx_cert_date",
];

pub const VIEWS: [&str; 5] = [
    "v_application_details",
    "v_failures",
    "v_monthly_throughput",
    "v_module_comparison",
    "v_client_performance",
];

pub(crate) fn create_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys=ON;
        CREATE TABLE clients (
          client_id TEXT PRIMARY KEY,
          company_name TEXT NOT NULL,
          manufacturer_size TEXT NOT NULL CHECK (manufacturer_size IN ('SME', 'Large')),
          sector TEXT NOT NULL
        );
        CREATE TABLE applications (
          application_id TEXT PRIMARY KEY,
          client_id TEXT NOT NULL REFERENCES clients(client_id),
          submission_date TEXT NOT NULL,
          instrument_type TEXT NOT NULL,
          mid_module TEXT NOT NULL CHECK (mid_module IN ('B', 'D')),
          risk_class TEXT NOT NULL CHECK (risk_class IN ('Low', 'Medium', 'High'))
        );
        CREATE TABLE certification_results (
          application_id TEXT PRIMARY KEY REFERENCES applications(application_id),
          passed_first_time INTEGER NOT NULL CHECK (passed_first_time IN (0, 1)),
          total_revisions INTEGER NOT NULL CHECK (total_revisions >= 0),
          certification_date TEXT
        );
        CREATE TABLE audit_results (
          audit_id TEXT PRIMARY KEY,
          application_id TEXT NOT NULL REFERENCES applications(application_id),
          audit_date TEXT NOT NULL,
          audit_status TEXT NOT NULL CHECK (audit_status IN ('PASS', 'FAIL', 'PENDING')),
          failure_reason TEXT
        );
        CREATE TABLE store_meta (
          k TEXT PRIMARY KEY,
          v TEXT NOT NULL
        ) WITHOUT ROWID;
        CREATE INDEX idx_app_client ON applications(client_id);
        CREATE INDEX idx_app_module ON applications(mid_module);
        CREATE INDEX idx_app_instrument ON applications(instrument_type);
        CREATE INDEX idx_audit_app ON audit_results(application_id);
        CREATE INDEX idx_audit_status ON audit_results(audit_status);
        CREATE INDEX idx_app_date ON applications(submission_date);
        CREATE INDEX idx_cert_date ON certification_results(certification_date);
        ",
    )
    .map_err(|e| StoreError(e.to_string()))?;
    conn.execute_batch(&format!("PRAGMA user_version={STORE_SCHEMA_VERSION};"))
        .map_err(|e| StoreError(e.to_string()))
}

pub(crate) fn create_views(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        CREATE VIEW v_application_details AS
        SELECT
          a.application_id,
          a.submission_date,
          a.instrument_type,
          a.mid_module,
          a.risk_class,
          c.client_id,
          c.company_name,
          c.manufacturer_size,
          c.sector,
          cr.passed_first_time,
          cr.total_revisions,
          cr.certification_date,
          CAST(julianday(cr.certification_date) - julianday(a.submission_date) AS INTEGER)
            AS turnaround_days
        FROM applications a
        JOIN clients c ON a.client_id = c.client_id
        JOIN certification_results cr ON a.application_id = cr.application_id;

        CREATE VIEW v_failures AS
        SELECT
          ar.audit_id,
          ar.application_id,
          ar.audit_date,
          ar.failure_reason,
          a.mid_module,
          a.instrument_type,
          a.risk_class,
          c.manufacturer_size
        FROM audit_results ar
        JOIN applications a ON ar.application_id = a.application_id
        JOIN clients c ON a.client_id = c.client_id
        WHERE ar.audit_status = 'FAIL';

        CREATE VIEW v_monthly_throughput AS
        SELECT
          strftime('%Y-%m', certification_date) AS month,
          COUNT(*) AS certifications,
          SUM(passed_first_time) AS first_time_passes,
          ROUND(AVG(passed_first_time) * 100, 1) AS success_rate
        FROM certification_results
        WHERE certification_date IS NOT NULL
        GROUP BY strftime('%Y-%m', certification_date);

        CREATE VIEW v_module_comparison AS
        SELECT
          a.mid_module,
          COUNT(*) AS applications,
          SUM(cr.passed_first_time) AS first_time_passes,
          ROUND(AVG(cr.passed_first_time) * 100, 1) AS success_rate,
          ROUND(AVG(cr.total_revisions), 2) AS avg_revisions,
          ROUND(AVG(julianday(cr.certification_date) - julianday(a.submission_date)), 1)
            AS avg_days
        FROM applications a
        JOIN certification_results cr ON a.application_id = cr.application_id
        WHERE cr.certification_date IS NOT NULL
        GROUP BY a.mid_module;

        CREATE VIEW v_client_performance AS
        SELECT
          c.client_id,
          c.company_name,
          c.manufacturer_size,
          c.sector,
          COUNT(*) AS applications,
          SUM(cr.passed_first_time) AS first_time_passes,
          ROUND(AVG(cr.passed_first_time) * 100, 1) AS success_rate,
          SUM(cr.total_revisions) AS total_revisions
        FROM clients c
        JOIN applications a ON c.client_id = a.client_id
        JOIN certification_results cr ON a.application_id = cr.application_id
        GROUP BY c.client_id;
        ",
    )
    .map_err(|e| StoreError(e.to_string()))
}
