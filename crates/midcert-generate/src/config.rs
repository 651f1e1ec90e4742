// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use midcert_model::{ApplicationId, AuditId, ClientId};
use serde::{Deserialize, Serialize};

use crate::weights::MAX_REVISIONS;
use crate::GenerateError;

pub const DEFAULT_APPLICATIONS: u32 = 300;
pub const DEFAULT_CLIENTS: u32 = 50;
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_TARGET_PASS_RATE: f64 = 0.568;
pub const DEFAULT_PENDING_PROBABILITY: f64 = 0.15;
/// Submissions this close to the period end may still be pending.
pub const PENDING_WINDOW_DAYS: i64 = 90;

/// Knobs of one generation batch. Unset JSON fields keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct GeneratorConfig {
    pub applications: u32,
    pub clients: u32,
    pub seed: u64,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub target_pass_rate: f64,
    pub pending_probability: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            applications: DEFAULT_APPLICATIONS,
            clients: DEFAULT_CLIENTS,
            seed: DEFAULT_SEED,
            period_start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN),
            period_end: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap_or(NaiveDate::MIN),
            target_pass_rate: DEFAULT_TARGET_PASS_RATE,
            pending_probability: DEFAULT_PENDING_PROBABILITY,
        }
    }
}

impl GeneratorConfig {
    pub fn load_from_json(path: &Path) -> Result<Self, GenerateError> {
        let raw = fs::read_to_string(path)
            .map_err(|e| GenerateError(format!("read config {}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| GenerateError(format!("parse config {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), GenerateError> {
        if self.applications == 0 {
            return Err(GenerateError("applications must be > 0".to_string()));
        }
        if self.clients == 0 {
            return Err(GenerateError("clients must be > 0".to_string()));
        }
        let max_apps = max_applications();
        if u64::from(self.applications) > max_apps {
            return Err(GenerateError(format!(
                "applications must be <= {max_apps}"
            )));
        }
        let max_clients = max_sequence(ClientId::DIGITS);
        if u64::from(self.clients) > max_clients {
            return Err(GenerateError(format!("clients must be <= {max_clients}")));
        }
        if self.period_end < self.period_start {
            return Err(GenerateError(format!(
                "period_end {} is before period_start {}",
                self.period_end, self.period_start
            )));
        }
        for (name, value) in [
            ("target_pass_rate", self.target_pass_rate),
            ("pending_probability", self.pending_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(GenerateError(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn period_days(&self) -> i64 {
        (self.period_end - self.period_start).num_days()
    }

    #[must_use]
    pub fn pending_cutoff(&self) -> NaiveDate {
        self.period_end - chrono::Duration::days(PENDING_WINDOW_DAYS)
    }
}

fn max_sequence(digits: usize) -> u64 {
    10_u64.pow(digits as u32) - 1
}

/// Every application may need up to `MAX_REVISIONS + 1` audits, and all of
/// them must fit the audit id space.
fn max_applications() -> u64 {
    max_sequence(ApplicationId::DIGITS)
        .min(max_sequence(AuditId::DIGITS) / u64::from(MAX_REVISIONS + 1))
}
