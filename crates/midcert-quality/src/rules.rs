// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeSet;

use chrono::NaiveDate;

use midcert_model::{
    ApplicationId, AuditId, AuditStatus, ClientId, FailureReason, InstrumentType,
    ManufacturerSize, MidModule, RiskClass, Sector,
};

use crate::index::DatasetIndex;
use crate::raw::{parse_date, parse_int};
use crate::report::{CheckCategory, CheckOutcome, Severity};

pub const MAX_REVISIONS: i64 = 10;
pub const MIN_TURNAROUND_DAYS: i64 = 7;
pub const MAX_TURNAROUND_DAYS: i64 = 365;
pub const PASS_RATE_BAND: (f64, f64) = (0.50, 0.62);
pub const TARGET_REVISION_RATE: f64 = 0.432;
pub const REVISION_RATE_TOLERANCE: f64 = 0.05;

/// Result of one rule before it is stamped with its catalogue entry.
#[derive(Debug, Default)]
pub(crate) struct Finding {
    issues: usize,
    /// Overrides the catalogue severity when the rule grades its own findings.
    severity: Option<Severity>,
    details: String,
}

impl Finding {
    fn count(issues: usize) -> Self {
        Self {
            issues,
            ..Self::default()
        }
    }

    fn with_details(mut self, details: String) -> Self {
        self.details = details;
        self
    }
}

#[derive(Clone, Copy)]
pub(crate) struct RuleSpec {
    pub id: &'static str,
    pub name: &'static str,
    pub category: CheckCategory,
    /// Severity reported when the rule finds issues.
    pub severity: Severity,
    check: fn(&DatasetIndex<'_>) -> Finding,
}

impl RuleSpec {
    pub fn evaluate(&self, index: &DatasetIndex<'_>) -> CheckOutcome {
        let finding = (self.check)(index);
        let severity = finding.severity.unwrap_or(if finding.issues == 0 {
            Severity::Ok
        } else {
            self.severity
        });
        CheckOutcome {
            id: self.id,
            name: self.name,
            category: self.category,
            severity,
            passed: matches!(severity, Severity::Ok | Severity::Info),
            issues: finding.issues,
            details: finding.details,
        }
    }
}

macro_rules! rule {
    ($id:literal, $name:literal, $category:ident, $severity:ident, $check:ident) => {
        RuleSpec {
            id: $id,
            name: $name,
            category: CheckCategory::$category,
            severity: Severity::$severity,
            check: $check,
        }
    };
}

pub(crate) const QUALITY_RULES: &[RuleSpec] = &[
    rule!("1.1", "Client fields complete", Completeness, Critical, client_fields_complete),
    rule!("1.2", "Application fields complete", Completeness, Critical, application_fields_complete),
    rule!("1.3", "Certification dates", Completeness, Critical, certification_dates_explained),
    rule!("1.4", "Audit dates complete", Completeness, Critical, audit_dates_complete),
    rule!("2.1", "ID format validity", Validity, Warning, id_formats_valid),
    rule!("2.2", "Categorical values valid", Validity, Critical, categorical_values_valid),
    rule!("2.3", "Revision counts valid", Validity, Critical, revision_counts_valid),
    rule!("2.4", "Binary flags valid", Validity, Critical, binary_flags_valid),
    rule!("3.1", "Date order (submit -> cert)", Consistency, Critical, certification_after_submission),
    rule!("3.2", "Turnaround range", Consistency, Warning, turnaround_in_range),
    rule!("3.3", "Audit date sequence", Consistency, Warning, audits_chronological),
    rule!("3.4", "Pass/revision consistency", Consistency, Critical, first_pass_has_no_revisions),
    rule!("3.5", "Audit count consistency", Consistency, Warning, audit_count_matches_revisions),
    rule!("3.6", "Audit dates within certification window", Consistency, Critical, audits_within_window),
    rule!("4.1", "Application -> client reference", Referential, Critical, application_client_reference),
    rule!("4.2", "Certification -> application reference", Referential, Critical, certification_application_reference),
    rule!("4.3", "Audit -> application reference", Referential, Critical, audit_application_reference),
    rule!("4.4", "One-to-one application <-> certification", Referential, Critical, one_certification_per_application),
    rule!("5.1", "Unique client ids", Uniqueness, Critical, unique_client_ids),
    rule!("5.2", "Unique application ids", Uniqueness, Critical, unique_application_ids),
    rule!("5.3", "Unique audit ids", Uniqueness, Critical, unique_audit_ids),
    rule!("6.1", "FAIL has reason", BusinessRules, Critical, failed_audit_has_reason),
    rule!("6.2", "PASS has no reason", BusinessRules, Warning, passed_audit_has_no_reason),
    rule!("6.3", "Final audit <-> certification alignment", BusinessRules, Critical, final_audit_aligned),
    rule!("7.1", "First-time pass rate plausible", Statistical, Warning, pass_rate_plausible),
    rule!("7.2", "Revision rate plausible", Statistical, Warning, revision_rate_plausible),
];

fn missing(fields: &[&Option<String>]) -> usize {
    fields.iter().filter(|f| f.is_none()).count()
}

fn invalid_label(value: &Option<String>, is_valid: fn(&str) -> bool) -> bool {
    !value.as_deref().is_some_and(is_valid)
}

fn duplicates<'a>(ids: impl Iterator<Item = Option<&'a str>>) -> usize {
    let mut seen = BTreeSet::new();
    ids.flatten().filter(|id| !seen.insert(*id)).count()
}

fn percent(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

fn client_fields_complete(index: &DatasetIndex<'_>) -> Finding {
    Finding::count(
        index
            .data
            .clients
            .iter()
            .map(|c| {
                missing(&[
                    &c.client_id,
                    &c.company_name,
                    &c.manufacturer_size,
                    &c.sector,
                ])
            })
            .sum(),
    )
}

fn application_fields_complete(index: &DatasetIndex<'_>) -> Finding {
    Finding::count(
        index
            .data
            .applications
            .iter()
            .map(|a| {
                let unparsed_date = usize::from(
                    a.submission_date.is_some() && parse_date(a.submission_date.as_deref()).is_none(),
                );
                missing(&[
                    &a.application_id,
                    &a.client_id,
                    &a.submission_date,
                    &a.instrument_type,
                    &a.mid_module,
                    &a.risk_class,
                ]) + unparsed_date
            })
            .sum(),
    )
}

/// A missing certification date is only acceptable when the application's
/// final audit is still PENDING.
fn certification_dates_explained(index: &DatasetIndex<'_>) -> Finding {
    let undated: Vec<&str> = index
        .data
        .certifications
        .iter()
        .filter(|c| parse_date(c.certification_date.as_deref()).is_none())
        .map(|c| c.application_id.as_deref().unwrap_or_default())
        .collect();
    let pending = undated
        .iter()
        .filter(|id| {
            index
                .final_audit(id)
                .is_some_and(|a| a.audit_status.as_deref() == Some(AuditStatus::Pending.as_str()))
        })
        .count();
    let unexplained = undated.len() - pending;
    let severity = if undated.is_empty() {
        Severity::Ok
    } else if unexplained == 0 {
        Severity::Info
    } else {
        Severity::Critical
    };
    Finding {
        issues: undated.len(),
        severity: Some(severity),
        details: format!("{pending} legitimately pending"),
    }
}

fn audit_dates_complete(index: &DatasetIndex<'_>) -> Finding {
    Finding::count(
        index
            .data
            .audits
            .iter()
            .filter(|a| parse_date(a.audit_date.as_deref()).is_none())
            .count(),
    )
}

fn id_formats_valid(index: &DatasetIndex<'_>) -> Finding {
    let data = index.data;
    let bad_clients = data
        .clients
        .iter()
        .filter(|c| invalid_label(&c.client_id, ClientId::is_well_formed))
        .count();
    let bad_apps = data
        .applications
        .iter()
        .filter(|a| invalid_label(&a.application_id, ApplicationId::is_well_formed))
        .count();
    let bad_audits = data
        .audits
        .iter()
        .filter(|a| invalid_label(&a.audit_id, AuditId::is_well_formed))
        .count();
    Finding::count(bad_clients + bad_apps + bad_audits)
}

fn categorical_values_valid(index: &DatasetIndex<'_>) -> Finding {
    let data = index.data;
    let mut issues = 0;
    for client in &data.clients {
        issues += usize::from(invalid_label(
            &client.manufacturer_size,
            ManufacturerSize::is_valid_label,
        ));
        issues += usize::from(invalid_label(&client.sector, Sector::is_valid_label));
    }
    for app in &data.applications {
        issues += usize::from(invalid_label(
            &app.instrument_type,
            InstrumentType::is_valid_label,
        ));
        issues += usize::from(invalid_label(&app.mid_module, MidModule::is_valid_label));
        issues += usize::from(invalid_label(&app.risk_class, RiskClass::is_valid_label));
    }
    for audit in &data.audits {
        issues += usize::from(invalid_label(&audit.audit_status, AuditStatus::is_valid_label));
        if audit.failure_reason.is_some() {
            issues += usize::from(invalid_label(
                &audit.failure_reason,
                FailureReason::is_valid_label,
            ));
        }
    }
    Finding::count(issues)
}

fn revision_counts_valid(index: &DatasetIndex<'_>) -> Finding {
    let mut broken = 0;
    let mut excessive = 0;
    for cert in &index.data.certifications {
        match parse_int(cert.total_revisions.as_deref()) {
            Some(n) if n < 0 => broken += 1,
            Some(n) if n > MAX_REVISIONS => excessive += 1,
            Some(_) => {}
            None => broken += 1,
        }
    }
    let severity = if broken > 0 {
        Severity::Critical
    } else if excessive > 0 {
        Severity::Warning
    } else {
        Severity::Ok
    };
    Finding {
        issues: broken + excessive,
        severity: Some(severity),
        details: if excessive > 0 {
            format!("{excessive} above {MAX_REVISIONS}")
        } else {
            String::new()
        },
    }
}

fn binary_flags_valid(index: &DatasetIndex<'_>) -> Finding {
    Finding::count(
        index
            .data
            .certifications
            .iter()
            .filter(|c| !matches!(c.passed_first_time.as_deref(), Some("0" | "1")))
            .count(),
    )
}

/// `(submission, certification)` pairs for certified applications.
fn certified_spans(index: &DatasetIndex<'_>) -> Vec<(NaiveDate, NaiveDate)> {
    index
        .data
        .certifications
        .iter()
        .filter_map(|cert| {
            let cert_date = parse_date(cert.certification_date.as_deref())?;
            let submitted = (*index.submissions.get(cert.application_id.as_deref()?)?)?;
            Some((submitted, cert_date))
        })
        .collect()
}

fn certification_after_submission(index: &DatasetIndex<'_>) -> Finding {
    Finding::count(
        certified_spans(index)
            .iter()
            .filter(|(submitted, certified)| certified < submitted)
            .count(),
    )
}

fn turnaround_in_range(index: &DatasetIndex<'_>) -> Finding {
    let days: Vec<i64> = certified_spans(index)
        .iter()
        .map(|(submitted, certified)| (*certified - *submitted).num_days())
        .collect();
    let out_of_range = days
        .iter()
        .filter(|d| !(MIN_TURNAROUND_DAYS..=MAX_TURNAROUND_DAYS).contains(*d))
        .count();
    let details = match (days.iter().min(), days.iter().max()) {
        (Some(lo), Some(hi)) => format!("range: {lo}-{hi} days"),
        _ => String::new(),
    };
    Finding::count(out_of_range).with_details(details)
}

fn audits_chronological(index: &DatasetIndex<'_>) -> Finding {
    Finding::count(
        index
            .audits
            .values()
            .filter(|rows| {
                let dates: Vec<_> = rows
                    .iter()
                    .filter_map(|a| parse_date(a.audit_date.as_deref()))
                    .collect();
                dates.windows(2).any(|w| w[1] < w[0])
            })
            .count(),
    )
}

fn first_pass_has_no_revisions(index: &DatasetIndex<'_>) -> Finding {
    Finding::count(
        index
            .data
            .certifications
            .iter()
            .filter(|c| {
                c.passed_first_time.as_deref() == Some("1")
                    && parse_int(c.total_revisions.as_deref()).is_some_and(|n| n > 0)
            })
            .count(),
    )
}

fn audit_count_matches_revisions(index: &DatasetIndex<'_>) -> Finding {
    Finding::count(
        index
            .certifications
            .iter()
            .filter(|(id, cert)| {
                let Some(revisions) = parse_int(cert.total_revisions.as_deref()) else {
                    return false;
                };
                let audits = index.audits.get(*id).map_or(0, Vec::len);
                i64::try_from(audits).map_or(true, |n| n != revisions + 1)
            })
            .count(),
    )
}

fn audits_within_window(index: &DatasetIndex<'_>) -> Finding {
    let mut issues = 0;
    for (app_id, audits) in &index.audits {
        let Some(Some(submitted)) = index.submissions.get(app_id) else {
            continue;
        };
        let certified = index.certification_date(app_id);
        issues += audits
            .iter()
            .filter_map(|a| parse_date(a.audit_date.as_deref()))
            .filter(|date| date < submitted || certified.is_some_and(|c| *date > c))
            .count();
    }
    Finding::count(issues)
}

fn application_client_reference(index: &DatasetIndex<'_>) -> Finding {
    Finding::count(
        index
            .data
            .applications
            .iter()
            .filter(|a| {
                !a.client_id
                    .as_deref()
                    .is_some_and(|id| index.client_ids.contains(id))
            })
            .count(),
    )
}

fn certification_application_reference(index: &DatasetIndex<'_>) -> Finding {
    Finding::count(
        index
            .data
            .certifications
            .iter()
            .filter(|c| {
                !c.application_id
                    .as_deref()
                    .is_some_and(|id| index.submissions.contains_key(id))
            })
            .count(),
    )
}

fn audit_application_reference(index: &DatasetIndex<'_>) -> Finding {
    Finding::count(
        index
            .data
            .audits
            .iter()
            .filter(|a| {
                !a.application_id
                    .as_deref()
                    .is_some_and(|id| index.submissions.contains_key(id))
            })
            .count(),
    )
}

fn one_certification_per_application(index: &DatasetIndex<'_>) -> Finding {
    let without = index
        .submissions
        .keys()
        .filter(|id| !index.certifications.contains_key(*id))
        .count();
    let repeated = duplicates(
        index
            .data
            .certifications
            .iter()
            .map(|c| c.application_id.as_deref()),
    );
    Finding::count(without + repeated)
        .with_details(format!("{without} without result, {repeated} duplicated"))
}

fn unique_client_ids(index: &DatasetIndex<'_>) -> Finding {
    Finding::count(duplicates(
        index.data.clients.iter().map(|c| c.client_id.as_deref()),
    ))
}

fn unique_application_ids(index: &DatasetIndex<'_>) -> Finding {
    Finding::count(duplicates(
        index
            .data
            .applications
            .iter()
            .map(|a| a.application_id.as_deref()),
    ))
}

fn unique_audit_ids(index: &DatasetIndex<'_>) -> Finding {
    Finding::count(duplicates(
        index.data.audits.iter().map(|a| a.audit_id.as_deref()),
    ))
}

fn failed_audit_has_reason(index: &DatasetIndex<'_>) -> Finding {
    Finding::count(
        index
            .data
            .audits
            .iter()
            .filter(|a| {
                a.audit_status.as_deref() == Some(AuditStatus::Fail.as_str())
                    && a.failure_reason.is_none()
            })
            .count(),
    )
}

fn passed_audit_has_no_reason(index: &DatasetIndex<'_>) -> Finding {
    Finding::count(
        index
            .data
            .audits
            .iter()
            .filter(|a| {
                a.audit_status.as_deref() == Some(AuditStatus::Pass.as_str())
                    && a.failure_reason.is_some()
            })
            .count(),
    )
}

fn final_audit_aligned(index: &DatasetIndex<'_>) -> Finding {
    let pass = Some(AuditStatus::Pass.as_str());
    Finding::count(
        index
            .certifications
            .keys()
            .filter(|id| {
                let Some(last) = index.final_audit(id) else {
                    return false;
                };
                let is_pass = last.audit_status.as_deref() == pass;
                index.certification_date(id).is_some() != is_pass
            })
            .count(),
    )
}

fn pass_rate_plausible(index: &DatasetIndex<'_>) -> Finding {
    let flags: Vec<&str> = index
        .data
        .certifications
        .iter()
        .filter_map(|c| c.passed_first_time.as_deref())
        .filter(|f| matches!(*f, "0" | "1"))
        .collect();
    let rate = if flags.is_empty() {
        0.0
    } else {
        flags.iter().filter(|f| **f == "1").count() as f64 / flags.len() as f64
    };
    let (lo, hi) = PASS_RATE_BAND;
    Finding::count(usize::from(!(lo..=hi).contains(&rate))).with_details(format!(
        "{} (expected {}-{})",
        percent(rate),
        percent(lo),
        percent(hi)
    ))
}

fn revision_rate_plausible(index: &DatasetIndex<'_>) -> Finding {
    let revisions: Vec<i64> = index
        .data
        .certifications
        .iter()
        .filter_map(|c| parse_int(c.total_revisions.as_deref()))
        .collect();
    let rate = if revisions.is_empty() {
        0.0
    } else {
        revisions.iter().filter(|n| **n > 0).count() as f64 / revisions.len() as f64
    };
    let off_target = (rate - TARGET_REVISION_RATE).abs() > REVISION_RATE_TOLERANCE;
    Finding::count(usize::from(off_target)).with_details(format!(
        "{} (expected {} +/- {})",
        percent(rate),
        percent(TARGET_REVISION_RATE),
        percent(REVISION_RATE_TOLERANCE)
    ))
}
