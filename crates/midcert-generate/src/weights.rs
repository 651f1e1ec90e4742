// SPDX-License-Identifier: Apache-2.0

//! Categorical mixes and per-stratum pass rates used by the sampler.

use midcert_model::{
    FailureReason, InstrumentType, ManufacturerSize, MidModule, RiskClass, Sector,
};

pub const SIZE_MIX: &[(ManufacturerSize, f64)] = &[
    (ManufacturerSize::Sme, 0.65),
    (ManufacturerSize::Large, 0.35),
];

pub const SECTOR_MIX: &[(Sector, f64)] = &[
    (Sector::Energy, 0.40),
    (Sector::Utilities, 0.30),
    (Sector::RetailFuel, 0.15),
    (Sector::Transportation, 0.10),
    (Sector::MultiSector, 0.05),
];

pub const INSTRUMENT_MIX: &[(InstrumentType, f64)] = &[
    (InstrumentType::GasMeter, 0.35),
    (InstrumentType::ElectricityMeter, 0.30),
    (InstrumentType::WaterMeter, 0.20),
    (InstrumentType::Dispenser, 0.10),
    (InstrumentType::Taximeter, 0.05),
];

pub const MODULE_MIX: &[(MidModule, f64)] = &[(MidModule::B, 0.70), (MidModule::D, 0.30)];

pub const RISK_MIX: &[(RiskClass, f64)] = &[
    (RiskClass::Low, 0.30),
    (RiskClass::Medium, 0.50),
    (RiskClass::High, 0.20),
];

/// Extra revision cycles drawn for an application that failed its first audit.
pub const REVISION_MIX: &[(u32, f64)] = &[(1, 0.45), (2, 0.30), (3, 0.15), (4, 0.10)];
/// Largest revision count in `REVISION_MIX`.
pub const MAX_REVISIONS: u32 = 4;

pub use midcert_model::DAYS_PER_REVISION;
pub const TURNAROUND_JITTER_DAYS: i64 = 10;

pub const COMPANY_PREFIXES: &[&str] = &[
    "Euro", "Global", "Tech", "Smart", "Precision", "Advanced", "Nordic", "Central", "Premier",
    "Allied", "United", "First", "Metro", "Alpha", "Delta", "Sigma", "Nova", "Apex",
];

pub const COMPANY_SUFFIXES: &[&str] = &[
    "Meters",
    "Instruments",
    "Systems",
    "Technologies",
    "Solutions",
    "Metering",
    "Devices",
    "Engineering",
    "Manufacturing",
    "Industries",
];

pub const LEGAL_FORMS: &[&str] = &["Ltd", "GmbH"];

#[must_use]
pub const fn base_turnaround_days(module: MidModule) -> i64 {
    match module {
        MidModule::B => 45,
        MidModule::D => 30,
    }
}

/// Uncalibrated first-time pass rate of a (module, size) stratum.
#[must_use]
pub const fn stratum_pass_rate(module: MidModule, size: ManufacturerSize) -> f64 {
    match (module, size) {
        (MidModule::B, ManufacturerSize::Sme) => 0.45,
        (MidModule::B, ManufacturerSize::Large) => 0.60,
        (MidModule::D, ManufacturerSize::Sme) => 0.55,
        (MidModule::D, ManufacturerSize::Large) => 0.70,
    }
}

const ENERGY_INSTRUMENTS: &[InstrumentType] =
    &[InstrumentType::GasMeter, InstrumentType::ElectricityMeter];
const UTILITIES_INSTRUMENTS: &[InstrumentType] = &[InstrumentType::WaterMeter];
const RETAIL_FUEL_INSTRUMENTS: &[InstrumentType] = &[InstrumentType::Dispenser];
const TRANSPORTATION_INSTRUMENTS: &[InstrumentType] = &[InstrumentType::Taximeter];

/// Instruments favoured by the client's sector, with the probability that
/// one of them is picked instead of the global mix.
#[must_use]
pub const fn sector_affinity(sector: Sector) -> Option<(&'static [InstrumentType], f64)> {
    match sector {
        Sector::Energy => Some((ENERGY_INSTRUMENTS, 0.8)),
        Sector::Utilities => Some((UTILITIES_INSTRUMENTS, 0.7)),
        Sector::RetailFuel => Some((RETAIL_FUEL_INSTRUMENTS, 0.7)),
        Sector::Transportation => Some((TRANSPORTATION_INSTRUMENTS, 0.6)),
        Sector::MultiSector => None,
    }
}

#[must_use]
pub const fn failure_weight(reason: FailureReason) -> f64 {
    match reason {
        FailureReason::TechnicalFileIncomplete => 0.25,
        FailureReason::DocumentationInconsistencies => 0.20,
        FailureReason::TestReportGaps => 0.15,
        FailureReason::MetrologicalRequirementsUnclear => 0.12,
        FailureReason::SoftwareDocumentationMissing => 0.10,
        FailureReason::DurabilityEvidenceInsufficient => 0.08,
        FailureReason::MarkingNonCompliant | FailureReason::EmcTestResultsMissing => 0.05,
        FailureReason::TrainingRecordsMissing => 0.22,
        FailureReason::InternalAuditGaps => 0.20,
        FailureReason::CalibrationRecordsOutdated => 0.15,
        FailureReason::NonConformanceHandlingUnclear => 0.12,
        FailureReason::ProductionProcessNotDocumented => 0.10,
        FailureReason::SupplierControlInsufficient
        | FailureReason::ManagementReviewIncomplete => 0.08,
        FailureReason::CorrectiveActionRecordsMissing => 0.05,
    }
}

const RATE_EPSILON: f64 = 1e-12;

/// Per-stratum pass rates whose count-weighted mean over `strata` equals
/// `target`. Base rates are scaled by a common factor; strata that would
/// exceed 1 are pinned at 1 and the shortfall is spread over the rest.
#[must_use]
pub fn calibrated_rates(strata: &[(f64, usize)], target: f64) -> Vec<f64> {
    let total: usize = strata.iter().map(|(_, n)| n).sum();
    if total == 0 {
        return strata.iter().map(|(p, _)| p.clamp(0.0, 1.0)).collect();
    }
    let mut pinned = vec![false; strata.len()];
    loop {
        let pinned_mass: f64 = strata
            .iter()
            .zip(&pinned)
            .filter(|(_, pinned)| **pinned)
            .map(|((_, n), _)| *n as f64)
            .sum();
        let free_expected: f64 = strata
            .iter()
            .zip(&pinned)
            .filter(|(_, pinned)| !**pinned)
            .map(|((p, n), _)| p * *n as f64)
            .sum();
        let remaining = target * total as f64 - pinned_mass;
        let factor = if free_expected > 0.0 {
            (remaining / free_expected).max(0.0)
        } else {
            0.0
        };
        let mut changed = false;
        for (i, (p, _)) in strata.iter().enumerate() {
            if !pinned[i] && p * factor >= 1.0 - RATE_EPSILON {
                pinned[i] = true;
                changed = true;
            }
        }
        if !changed {
            return strata
                .iter()
                .zip(&pinned)
                .map(|((p, _), pinned)| if *pinned { 1.0 } else { p * factor })
                .collect();
        }
    }
}

/// Count-weighted mean of `rates` over `strata`.
#[must_use]
pub fn mixture_rate(strata: &[(f64, usize)], rates: &[f64]) -> f64 {
    let total: usize = strata.iter().map(|(_, n)| n).sum();
    if total == 0 {
        return 0.0;
    }
    strata
        .iter()
        .zip(rates)
        .map(|((_, n), r)| r * *n as f64)
        .sum::<f64>()
        / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sum(weights: impl Iterator<Item = f64>) -> f64 {
        weights.sum()
    }

    #[test]
    fn mixes_sum_to_one() {
        for total in [
            sum(SIZE_MIX.iter().map(|(_, w)| *w)),
            sum(SECTOR_MIX.iter().map(|(_, w)| *w)),
            sum(INSTRUMENT_MIX.iter().map(|(_, w)| *w)),
            sum(MODULE_MIX.iter().map(|(_, w)| *w)),
            sum(RISK_MIX.iter().map(|(_, w)| *w)),
            sum(REVISION_MIX.iter().map(|(_, w)| *w)),
            sum(FailureReason::for_module(MidModule::B).map(failure_weight)),
            sum(FailureReason::for_module(MidModule::D).map(failure_weight)),
        ] {
            assert!((total - 1.0).abs() < 1e-9, "mix sums to {total}");
        }
    }

    fn default_strata() -> Vec<(f64, usize)> {
        vec![
            (stratum_pass_rate(MidModule::B, ManufacturerSize::Sme), 137),
            (stratum_pass_rate(MidModule::B, ManufacturerSize::Large), 73),
            (stratum_pass_rate(MidModule::D, ManufacturerSize::Sme), 58),
            (stratum_pass_rate(MidModule::D, ManufacturerSize::Large), 32),
        ]
    }

    #[test]
    fn max_revisions_matches_the_revision_mix() {
        let max = REVISION_MIX.iter().map(|(r, _)| *r).max();
        assert_eq!(max, Some(MAX_REVISIONS));
    }

    #[test]
    fn calibration_hits_target_on_default_mix() {
        let strata = default_strata();
        let rates = calibrated_rates(&strata, 0.568);
        assert!((mixture_rate(&strata, &rates) - 0.568).abs() < 1e-12);
        for ((p, _), r) in strata.iter().zip(&rates) {
            let factor = r / p;
            assert!(factor > 1.0 && factor < 1.2);
        }
    }

    #[test]
    fn high_targets_pin_strata_and_still_reach_the_mean() {
        let strata = default_strata();
        for target in [0.9, 0.97, 1.0] {
            let rates = calibrated_rates(&strata, target);
            assert!(rates.iter().all(|r| (0.0..=1.0).contains(r)), "{rates:?}");
            assert!(
                (mixture_rate(&strata, &rates) - target).abs() < 1e-9,
                "target {target}"
            );
        }
        let all = calibrated_rates(&strata, 1.0);
        assert!(all.iter().all(|r| (*r - 1.0).abs() < 1e-12));
    }

    #[test]
    fn zero_target_gives_zero_rates() {
        let strata = default_strata();
        assert!(calibrated_rates(&strata, 0.0).iter().all(|r| *r == 0.0));
    }

    #[test]
    fn calibration_of_empty_strata_is_identity() {
        assert!(calibrated_rates(&[], 0.5).is_empty());
        assert_eq!(mixture_rate(&[], &[]), 0.0);
    }
}
