// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::layout::{DataLayout, TableFile};
use crate::records::Dataset;

#[derive(Debug)]
#[non_exhaustive]
pub enum TableError {
    MissingInput(Vec<PathBuf>),
    Io { path: PathBuf, message: String },
    Csv { path: PathBuf, message: String },
    Schema { path: PathBuf, expected: String, found: String },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingInput(paths) => {
                let joined = paths
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "missing input table(s): {joined}")
            }
            Self::Io { path, message } => write!(f, "{}: {message}", path.display()),
            Self::Csv { path, message } => write!(f, "{}: csv error: {message}", path.display()),
            Self::Schema {
                path,
                expected,
                found,
            } => write!(
                f,
                "{}: header mismatch, expected `{expected}`, found `{found}`",
                path.display()
            ),
        }
    }
}

impl std::error::Error for TableError {}

fn csv_err(path: &Path, err: csv::Error) -> TableError {
    TableError::Csv {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

/// Writes `rows` with the fixed header of `table`, `\n` line endings and no
/// trailing metadata so the bytes depend on the rows only.
pub fn write_table<T: Serialize>(
    path: &Path,
    table: TableFile,
    rows: &[T],
) -> Result<(), TableError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| TableError::Io {
            path: parent.to_path_buf(),
            message: e.to_string(),
        })?;
    }
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(path)
        .map_err(|e| csv_err(path, e))?;
    writer
        .write_record(table.columns())
        .map_err(|e| csv_err(path, e))?;
    for row in rows {
        writer.serialize(row).map_err(|e| csv_err(path, e))?;
    }
    writer.flush().map_err(|e| TableError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

pub fn read_table<T: DeserializeOwned>(path: &Path, table: TableFile) -> Result<Vec<T>, TableError> {
    if !path.exists() {
        return Err(TableError::MissingInput(vec![path.to_path_buf()]));
    }
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| csv_err(path, e))?;
    let headers = reader.headers().map_err(|e| csv_err(path, e))?.clone();
    let found: Vec<&str> = headers.iter().collect();
    if found != table.columns() {
        return Err(TableError::Schema {
            path: path.to_path_buf(),
            expected: table.columns().join(","),
            found: found.join(","),
        });
    }
    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| csv_err(path, e))
}

/// Writes all four tables into `layout.raw_dir`, returning the written paths
/// in foreign-key order.
pub fn write_dataset(layout: &DataLayout, dataset: &Dataset) -> Result<Vec<PathBuf>, TableError> {
    let clients = layout.table(TableFile::Clients);
    write_table(&clients, TableFile::Clients, &dataset.clients)?;
    let applications = layout.table(TableFile::Applications);
    write_table(&applications, TableFile::Applications, &dataset.applications)?;
    let certs = layout.table(TableFile::CertificationResults);
    write_table(
        &certs,
        TableFile::CertificationResults,
        &dataset.certification_results,
    )?;
    let audits = layout.table(TableFile::AuditResults);
    write_table(&audits, TableFile::AuditResults, &dataset.audit_results)?;
    Ok(vec![clients, applications, certs, audits])
}

pub fn read_dataset(layout: &DataLayout) -> Result<Dataset, TableError> {
    let missing = layout.missing_tables();
    if !missing.is_empty() {
        return Err(TableError::MissingInput(missing));
    }
    Ok(Dataset {
        clients: read_table(&layout.table(TableFile::Clients), TableFile::Clients)?,
        applications: read_table(&layout.table(TableFile::Applications), TableFile::Applications)?,
        certification_results: read_table(
            &layout.table(TableFile::CertificationResults),
            TableFile::CertificationResults,
        )?,
        audit_results: read_table(&layout.table(TableFile::AuditResults), TableFile::AuditResults)?,
    })
}
