// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TableFile {
    Clients,
    Applications,
    CertificationResults,
    AuditResults,
}

impl TableFile {
    /// Foreign-key safe order: parents before children.
    pub const ALL: [Self; 4] = [
        Self::Clients,
        Self::Applications,
        Self::CertificationResults,
        Self::AuditResults,
    ];

    #[must_use]
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::Clients => "clients",
            Self::Applications => "applications",
            Self::CertificationResults => "certification_results",
            Self::AuditResults => "audit_results",
        }
    }

    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Clients => "clients.csv",
            Self::Applications => "applications.csv",
            Self::CertificationResults => "certification_results.csv",
            Self::AuditResults => "audit_results.csv",
        }
    }

    #[must_use]
    pub const fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Clients => &["client_id", "company_name", "manufacturer_size", "sector"],
            Self::Applications => &[
                "application_id",
                "client_id",
                "submission_date",
                "instrument_type",
                "mid_module",
                "risk_class",
            ],
            Self::CertificationResults => &[
                "application_id",
                "passed_first_time",
                "total_revisions",
                "certification_date",
            ],
            Self::AuditResults => &[
                "audit_id",
                "application_id",
                "audit_date",
                "audit_status",
                "failure_reason",
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    pub root: PathBuf,
    pub raw_dir: PathBuf,
    pub database: PathBuf,
    pub checklist_csv: PathBuf,
    pub generation_manifest: PathBuf,
}

impl DataLayout {
    #[must_use]
    pub fn table(&self, table: TableFile) -> PathBuf {
        self.raw_dir.join(table.file_name())
    }

    #[must_use]
    pub fn missing_tables(&self) -> Vec<PathBuf> {
        TableFile::ALL
            .iter()
            .map(|t| self.table(*t))
            .filter(|p| !p.exists())
            .collect()
    }
}

#[must_use]
pub fn data_layout(root: &Path) -> DataLayout {
    let raw_dir = root.join("raw");
    DataLayout {
        root: root.to_path_buf(),
        generation_manifest: raw_dir.join("generation_manifest.json"),
        raw_dir,
        database: root.join("certification.db"),
        checklist_csv: root.join("checklist_items.csv"),
    }
}
