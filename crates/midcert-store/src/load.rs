// SPDX-License-Identifier: Apache-2.0

use midcert_model::{Dataset, DATE_FORMAT};
use rusqlite::{params, Connection};

use crate::schema::STORE_SCHEMA_VERSION;
use crate::StoreError;

fn err(e: rusqlite::Error) -> StoreError {
    StoreError(e.to_string())
}

/// Inserts all rows in one transaction, parents first so foreign keys hold
/// at every statement.
pub(crate) fn insert_dataset(conn: &mut Connection, dataset: &Dataset) -> Result<(), StoreError> {
    let tx = conn.transaction().map_err(err)?;
    {
        let mut stmt = tx
            .prepare(
                "INSERT INTO clients (client_id, company_name, manufacturer_size, sector)
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .map_err(err)?;
        for c in &dataset.clients {
            stmt.execute(params![
                c.client_id.as_str(),
                c.company_name,
                c.manufacturer_size.as_str(),
                c.sector.as_str(),
            ])
            .map_err(err)?;
        }

        let mut stmt = tx
            .prepare(
                "INSERT INTO applications (
                  application_id, client_id, submission_date, instrument_type, mid_module, risk_class
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .map_err(err)?;
        for a in &dataset.applications {
            stmt.execute(params![
                a.application_id.as_str(),
                a.client_id.as_str(),
                a.submission_date.format(DATE_FORMAT).to_string(),
                a.instrument_type.as_str(),
                a.mid_module.as_str(),
                a.risk_class.as_str(),
            ])
            .map_err(err)?;
        }

        let mut stmt = tx
            .prepare(
                "INSERT INTO certification_results (
                  application_id, passed_first_time, total_revisions, certification_date
                 ) VALUES (?1, ?2, ?3, ?4)",
            )
            .map_err(err)?;
        for r in &dataset.certification_results {
            stmt.execute(params![
                r.application_id.as_str(),
                i64::from(r.passed_first_time),
                i64::from(r.total_revisions),
                r.certification_date
                    .map(|d| d.format(DATE_FORMAT).to_string()),
            ])
            .map_err(err)?;
        }

        let mut stmt = tx
            .prepare(
                "INSERT INTO audit_results (
                  audit_id, application_id, audit_date, audit_status, failure_reason
                 ) VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .map_err(err)?;
        for a in &dataset.audit_results {
            stmt.execute(params![
                a.audit_id.as_str(),
                a.application_id.as_str(),
                a.audit_date.format(DATE_FORMAT).to_string(),
                a.audit_status.as_str(),
                a.failure_reason.map(|r| r.as_str()),
            ])
            .map_err(err)?;
        }

        tx.execute(
            "INSERT INTO store_meta (k, v) VALUES ('schema_version', ?1)",
            params![STORE_SCHEMA_VERSION.to_string()],
        )
        .map_err(err)?;
        tx.execute(
            "INSERT INTO store_meta (k, v) VALUES ('created_by', ?1)",
            params![crate::CRATE_NAME],
        )
        .map_err(err)?;
    }
    tx.commit().map_err(err)
}
