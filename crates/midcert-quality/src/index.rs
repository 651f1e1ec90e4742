// SPDX-License-Identifier: Apache-2.0

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::raw::{parse_date, RawAudit, RawCertification, RawDataset};

/// Lookups shared by the rules, built once per evaluation.
pub(crate) struct DatasetIndex<'a> {
    pub data: &'a RawDataset,
    pub client_ids: BTreeSet<&'a str>,
    pub submissions: BTreeMap<&'a str, Option<NaiveDate>>,
    pub certifications: BTreeMap<&'a str, &'a RawCertification>,
    /// Audits per application in file order.
    pub audits: BTreeMap<&'a str, Vec<&'a RawAudit>>,
}

impl<'a> DatasetIndex<'a> {
    pub fn build(data: &'a RawDataset) -> Self {
        let client_ids = data
            .clients
            .iter()
            .filter_map(|c| c.client_id.as_deref())
            .collect();
        let submissions = data
            .applications
            .iter()
            .filter_map(|a| {
                a.application_id
                    .as_deref()
                    .map(|id| (id, parse_date(a.submission_date.as_deref())))
            })
            .collect();
        let mut certifications = BTreeMap::new();
        for cert in &data.certifications {
            if let Some(id) = cert.application_id.as_deref() {
                certifications.entry(id).or_insert(cert);
            }
        }
        let mut audits: BTreeMap<&str, Vec<&RawAudit>> = BTreeMap::new();
        for audit in &data.audits {
            if let Some(id) = audit.application_id.as_deref() {
                audits.entry(id).or_default().push(audit);
            }
        }
        Self {
            data,
            client_ids,
            submissions,
            certifications,
            audits,
        }
    }

    /// Latest audit by date; ties and undated rows keep file order.
    pub fn final_audit(&self, application_id: &str) -> Option<&'a RawAudit> {
        self.audits.get(application_id).and_then(|rows| {
            rows.iter()
                .enumerate()
                .max_by_key(|(pos, audit)| (parse_date(audit.audit_date.as_deref()), *pos))
                .map(|(_, audit)| *audit)
        })
    }

    pub fn certification_date(&self, application_id: &str) -> Option<NaiveDate> {
        self.certifications
            .get(application_id)
            .and_then(|c| parse_date(c.certification_date.as_deref()))
    }
}
