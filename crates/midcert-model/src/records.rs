// SPDX-License-Identifier: Apache-2.0

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::categories::{
    AuditStatus, FailureReason, InstrumentType, ManufacturerSize, MidModule, RiskClass, Sector,
};
use crate::ids::{ApplicationId, AuditId, ClientId};
use crate::serde_helpers::flag_int;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub client_id: ClientId,
    pub company_name: String,
    pub manufacturer_size: ManufacturerSize,
    pub sector: Sector,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub application_id: ApplicationId,
    pub client_id: ClientId,
    pub submission_date: NaiveDate,
    pub instrument_type: InstrumentType,
    pub mid_module: MidModule,
    pub risk_class: RiskClass,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationResult {
    pub application_id: ApplicationId,
    #[serde(with = "flag_int")]
    pub passed_first_time: bool,
    pub total_revisions: u32,
    /// `None` while the application is still pending.
    pub certification_date: Option<NaiveDate>,
}

impl CertificationResult {
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.certification_date.is_none()
    }

    #[must_use]
    pub fn turnaround_days(&self, submission_date: NaiveDate) -> Option<i64> {
        self.certification_date
            .map(|cert| (cert - submission_date).num_days())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditResult {
    pub audit_id: AuditId,
    pub application_id: ApplicationId,
    pub audit_date: NaiveDate,
    pub audit_status: AuditStatus,
    pub failure_reason: Option<FailureReason>,
}

/// The four tables of one generated batch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dataset {
    pub clients: Vec<Client>,
    pub applications: Vec<Application>,
    pub certification_results: Vec<CertificationResult>,
    pub audit_results: Vec<AuditResult>,
}

impl Dataset {
    /// Share of certification results that passed on the first audit.
    #[must_use]
    pub fn first_time_pass_rate(&self) -> f64 {
        if self.certification_results.is_empty() {
            return 0.0;
        }
        let passed = self
            .certification_results
            .iter()
            .filter(|r| r.passed_first_time)
            .count();
        passed as f64 / self.certification_results.len() as f64
    }

    /// Share of certification results that needed at least one revision cycle.
    #[must_use]
    pub fn revision_rate(&self) -> f64 {
        if self.certification_results.is_empty() {
            return 0.0;
        }
        let revised = self
            .certification_results
            .iter()
            .filter(|r| r.total_revisions > 0)
            .count();
        revised as f64 / self.certification_results.len() as f64
    }

    #[must_use]
    pub fn application(&self, id: &ApplicationId) -> Option<&Application> {
        self.applications.iter().find(|a| &a.application_id == id)
    }

    #[must_use]
    pub fn row_counts(&self) -> [(&'static str, usize); 4] {
        [
            ("clients", self.clients.len()),
            ("applications", self.applications.len()),
            ("certification_results", self.certification_results.len()),
            ("audit_results", self.audit_results.len()),
        ]
    }
}
