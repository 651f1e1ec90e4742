// SPDX-License-Identifier: Apache-2.0

use std::fmt::Write as _;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Ok,
    Info,
    Warning,
    Critical,
}

impl Severity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckCategory {
    Completeness,
    Validity,
    Consistency,
    Referential,
    Uniqueness,
    BusinessRules,
    Statistical,
}

impl CheckCategory {
    pub const ALL: [Self; 7] = [
        Self::Completeness,
        Self::Validity,
        Self::Consistency,
        Self::Referential,
        Self::Uniqueness,
        Self::BusinessRules,
        Self::Statistical,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completeness => "completeness",
            Self::Validity => "validity",
            Self::Consistency => "consistency",
            Self::Referential => "referential",
            Self::Uniqueness => "uniqueness",
            Self::BusinessRules => "business_rules",
            Self::Statistical => "statistical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOutcome {
    pub id: &'static str,
    pub name: &'static str,
    pub category: CheckCategory,
    pub severity: Severity,
    pub passed: bool,
    pub issues: usize,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub details: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCounts {
    pub ok: usize,
    pub info: usize,
    pub warning: usize,
    pub critical: usize,
}

impl SeverityCounts {
    fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Ok => self.ok += 1,
            Severity::Info => self.info += 1,
            Severity::Warning => self.warning += 1,
            Severity::Critical => self.critical += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub category: CheckCategory,
    pub checks: usize,
    pub passed: usize,
    pub issues: usize,
    pub worst: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    AllChecksPassed,
    AcceptableWithWarnings,
    CriticalIssuesFound,
}

impl Verdict {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AllChecksPassed => "all checks passed",
            Self::AcceptableWithWarnings => "acceptable with warnings",
            Self::CriticalIssuesFound => "critical issues found",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualityReport {
    pub checks: Vec<CheckOutcome>,
    pub counts: SeverityCounts,
    pub categories: Vec<CategorySummary>,
    pub verdict: Verdict,
}

impl QualityReport {
    #[must_use]
    pub fn from_outcomes(checks: Vec<CheckOutcome>) -> Self {
        let mut counts = SeverityCounts::default();
        for check in &checks {
            counts.add(check.severity);
        }
        let categories = CheckCategory::ALL
            .iter()
            .filter_map(|category| {
                let members: Vec<&CheckOutcome> =
                    checks.iter().filter(|c| c.category == *category).collect();
                let worst = members.iter().map(|c| c.severity).max()?;
                Some(CategorySummary {
                    category: *category,
                    checks: members.len(),
                    passed: members.iter().filter(|c| c.passed).count(),
                    issues: members.iter().map(|c| c.issues).sum(),
                    worst,
                })
            })
            .collect();
        let verdict = if counts.critical > 0 {
            Verdict::CriticalIssuesFound
        } else if counts.warning > 0 {
            Verdict::AcceptableWithWarnings
        } else {
            Verdict::AllChecksPassed
        };
        Self {
            checks,
            counts,
            categories,
            verdict,
        }
    }

    #[must_use]
    pub fn has_critical(&self) -> bool {
        self.verdict == Verdict::CriticalIssuesFound
    }

    #[must_use]
    pub fn check(&self, id: &str) -> Option<&CheckOutcome> {
        self.checks.iter().find(|c| c.id == id)
    }

    /// Fixed-width plain text rendering used by the CLI in human mode.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "DATA QUALITY REPORT");
        for check in &self.checks {
            let _ = writeln!(
                out,
                "[{:<8}] {:<4} {}",
                check.severity.as_str(),
                check.id,
                check.name
            );
            if check.issues > 0 || !check.details.is_empty() {
                let _ = write!(out, "                issues: {}", check.issues);
                if !check.details.is_empty() {
                    let _ = write!(out, " ({})", check.details);
                }
                out.push('\n');
            }
        }
        let _ = writeln!(out);
        for summary in &self.categories {
            let _ = writeln!(
                out,
                "{:<15} {}/{} passed, worst {}",
                summary.category.as_str(),
                summary.passed,
                summary.checks,
                summary.worst.as_str()
            );
        }
        let _ = writeln!(
            out,
            "\nSUMMARY: {} checks  OK: {}  INFO: {}  WARNING: {}  CRITICAL: {}",
            self.checks.len(),
            self.counts.ok,
            self.counts.info,
            self.counts.warning,
            self.counts.critical
        );
        let _ = writeln!(out, "VERDICT: {}", self.verdict.as_str());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(id: &'static str, category: CheckCategory, severity: Severity) -> CheckOutcome {
        CheckOutcome {
            id,
            name: "probe",
            category,
            severity,
            passed: matches!(severity, Severity::Ok | Severity::Info),
            issues: usize::from(!matches!(severity, Severity::Ok)),
            details: String::new(),
        }
    }

    #[test]
    fn verdict_follows_the_worst_severity() {
        let clean = QualityReport::from_outcomes(vec![
            outcome("1.1", CheckCategory::Completeness, Severity::Ok),
            outcome("1.3", CheckCategory::Completeness, Severity::Info),
        ]);
        assert_eq!(clean.verdict, Verdict::AllChecksPassed);

        let warned = QualityReport::from_outcomes(vec![
            outcome("1.1", CheckCategory::Completeness, Severity::Ok),
            outcome("7.1", CheckCategory::Statistical, Severity::Warning),
        ]);
        assert_eq!(warned.verdict, Verdict::AcceptableWithWarnings);

        let broken = QualityReport::from_outcomes(vec![
            outcome("7.1", CheckCategory::Statistical, Severity::Warning),
            outcome("4.1", CheckCategory::Referential, Severity::Critical),
        ]);
        assert!(broken.has_critical());
        assert_eq!(broken.counts.critical, 1);
    }

    #[test]
    fn categories_without_checks_are_omitted() {
        let report = QualityReport::from_outcomes(vec![outcome(
            "5.1",
            CheckCategory::Uniqueness,
            Severity::Critical,
        )]);
        assert_eq!(report.categories.len(), 1);
        assert_eq!(report.categories[0].worst, Severity::Critical);
        assert_eq!(report.categories[0].passed, 0);
    }

    #[test]
    fn text_rendering_ends_with_the_verdict() {
        let report = QualityReport::from_outcomes(vec![outcome(
            "2.1",
            CheckCategory::Validity,
            Severity::Warning,
        )]);
        let text = report.render_text();
        assert!(text.contains("[WARNING ] 2.1"));
        assert!(text.trim_end().ends_with("VERDICT: acceptable with warnings"));
    }
}
