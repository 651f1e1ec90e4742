// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use midcert_model::{
    Application, ApplicationId, AuditId, AuditResult, AuditStatus, CertificationResult, Client,
    ClientId, Dataset, FailureReason, InstrumentType, ManufacturerSize, MidModule, RiskClass,
    Sector,
};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};

use crate::config::GeneratorConfig;
use crate::logging::{fields, GenerateLog, GenerateStage};
use crate::weights::{
    base_turnaround_days, calibrated_rates, failure_weight, mixture_rate, sector_affinity,
    stratum_pass_rate, COMPANY_PREFIXES, COMPANY_SUFFIXES, DAYS_PER_REVISION, INSTRUMENT_MIX,
    LEGAL_FORMS, MODULE_MIX, REVISION_MIX, RISK_MIX, SECTOR_MIX, SIZE_MIX,
    TURNAROUND_JITTER_DAYS,
};
use crate::GenerateError;

const TARGET_RATE_TOLERANCE: f64 = 1e-9;

struct Weighted<T> {
    items: Vec<T>,
    index: WeightedIndex<f64>,
}

impl<T: Copy> Weighted<T> {
    fn new(mix: &[(T, f64)]) -> Result<Self, GenerateError> {
        let index = WeightedIndex::new(mix.iter().map(|(_, w)| *w))
            .map_err(|e| GenerateError(format!("invalid weight table: {e}")))?;
        Ok(Self {
            items: mix.iter().map(|(item, _)| *item).collect(),
            index,
        })
    }

    fn draw(&self, rng: &mut StdRng) -> T {
        self.items[self.index.sample(rng)]
    }
}

struct Samplers {
    size: Weighted<ManufacturerSize>,
    sector: Weighted<Sector>,
    instrument: Weighted<InstrumentType>,
    module: Weighted<MidModule>,
    risk: Weighted<RiskClass>,
    revisions: Weighted<u32>,
    reasons_b: Weighted<FailureReason>,
    reasons_d: Weighted<FailureReason>,
}

impl Samplers {
    fn new() -> Result<Self, GenerateError> {
        let reasons = |module: MidModule| {
            let mix: Vec<(FailureReason, f64)> = FailureReason::for_module(module)
                .map(|r| (r, failure_weight(r)))
                .collect();
            Weighted::new(&mix)
        };
        Ok(Self {
            size: Weighted::new(SIZE_MIX)?,
            sector: Weighted::new(SECTOR_MIX)?,
            instrument: Weighted::new(INSTRUMENT_MIX)?,
            module: Weighted::new(MODULE_MIX)?,
            risk: Weighted::new(RISK_MIX)?,
            revisions: Weighted::new(REVISION_MIX)?,
            reasons_b: reasons(MidModule::B)?,
            reasons_d: reasons(MidModule::D)?,
        })
    }

    fn failure_reason(&self, module: MidModule, rng: &mut StdRng) -> FailureReason {
        match module {
            MidModule::B => self.reasons_b.draw(rng),
            MidModule::D => self.reasons_d.draw(rng),
        }
    }
}

struct DraftApplication {
    client: usize,
    submission_date: NaiveDate,
    instrument_type: InstrumentType,
    mid_module: MidModule,
    risk_class: RiskClass,
}

fn pick<'a>(rng: &mut StdRng, items: &[&'a str]) -> &'a str {
    items[rng.gen_range(0..items.len())]
}

fn shift(date: NaiveDate, days: i64) -> Result<NaiveDate, GenerateError> {
    date.checked_add_signed(Duration::days(days))
        .ok_or_else(|| GenerateError(format!("date overflow: {date} + {days} days")))
}

fn id_error(err: midcert_model::ValidationError) -> GenerateError {
    GenerateError(err.to_string())
}

/// Samples one full batch. All randomness comes from a single `StdRng`
/// seeded with `config.seed`, consumed in table order.
pub(crate) fn sample_dataset(
    config: &GeneratorConfig,
    log: &mut GenerateLog,
) -> Result<Dataset, GenerateError> {
    let samplers = Samplers::new()?;
    let mut rng = StdRng::seed_from_u64(config.seed);

    let clients = sample_clients(config, &samplers, &mut rng)?;
    log.emit(
        GenerateStage::Sample,
        "generate.clients",
        fields([("rows", clients.len().to_string())]),
    );

    let applications = sample_applications(config, &samplers, &clients, &mut rng)?;
    log.emit(
        GenerateStage::Sample,
        "generate.applications",
        fields([("rows", applications.len().to_string())]),
    );

    let (passed, reachable) = assign_first_time_passes(config, &clients, &applications, &mut rng);
    if reachable + TARGET_RATE_TOLERANCE < config.target_pass_rate {
        tracing::warn!(
            target_pass_rate = config.target_pass_rate,
            reachable,
            "target pass rate is not reachable"
        );
        log.emit(
            GenerateStage::Sample,
            "generate.target_unreachable",
            fields([
                ("target_pass_rate", config.target_pass_rate.to_string()),
                ("reachable_pass_rate", format!("{reachable:.4}")),
            ]),
        );
    }
    let certification_results =
        sample_outcomes(config, &samplers, &applications, &passed, &mut rng)?;
    let pending = certification_results
        .iter()
        .filter(|r| r.is_pending())
        .count();
    log.emit(
        GenerateStage::Sample,
        "generate.outcomes",
        fields([
            ("rows", certification_results.len().to_string()),
            ("first_time_passes", passed.iter().filter(|p| **p).count().to_string()),
            ("pending", pending.to_string()),
        ]),
    );

    let audit_results =
        sample_audits(&samplers, &applications, &certification_results, &mut rng)?;
    log.emit(
        GenerateStage::Sample,
        "generate.audits",
        fields([("rows", audit_results.len().to_string())]),
    );

    Ok(Dataset {
        clients,
        applications,
        certification_results,
        audit_results,
    })
}

fn sample_clients(
    config: &GeneratorConfig,
    samplers: &Samplers,
    rng: &mut StdRng,
) -> Result<Vec<Client>, GenerateError> {
    (1..=config.clients)
        .map(|n| {
            let company_name = format!(
                "{} {} {}",
                pick(rng, COMPANY_PREFIXES),
                pick(rng, COMPANY_SUFFIXES),
                pick(rng, LEGAL_FORMS)
            );
            Ok(Client {
                client_id: ClientId::from_sequence(n).map_err(id_error)?,
                company_name,
                manufacturer_size: samplers.size.draw(rng),
                sector: samplers.sector.draw(rng),
            })
        })
        .collect()
}

fn sample_instrument(sector: Sector, samplers: &Samplers, rng: &mut StdRng) -> InstrumentType {
    if let Some((favoured, probability)) = sector_affinity(sector) {
        if rng.gen_bool(probability) {
            return favoured[rng.gen_range(0..favoured.len())];
        }
    }
    samplers.instrument.draw(rng)
}

fn sample_applications(
    config: &GeneratorConfig,
    samplers: &Samplers,
    clients: &[Client],
    rng: &mut StdRng,
) -> Result<Vec<Application>, GenerateError> {
    let period_days = config.period_days();
    let mut drafts = Vec::with_capacity(config.applications as usize);
    for _ in 0..config.applications {
        let client = rng.gen_range(0..clients.len());
        let instrument_type = sample_instrument(clients[client].sector, samplers, rng);
        let submission_date = shift(config.period_start, rng.gen_range(0..=period_days))?;
        drafts.push(DraftApplication {
            client,
            submission_date,
            instrument_type,
            mid_module: samplers.module.draw(rng),
            risk_class: samplers.risk.draw(rng),
        });
    }
    // Stable: equal dates keep draw order, so numbering stays deterministic.
    drafts.sort_by_key(|d| d.submission_date);

    drafts
        .into_iter()
        .zip(1_u32..)
        .map(|(draft, n)| {
            Ok(Application {
                application_id: ApplicationId::from_sequence(n).map_err(id_error)?,
                client_id: clients[draft.client].client_id.clone(),
                submission_date: draft.submission_date,
                instrument_type: draft.instrument_type,
                mid_module: draft.mid_module,
                risk_class: draft.risk_class,
            })
        })
        .collect()
}

/// Marks which applications pass their first audit. Each (module, size)
/// stratum receives `floor(n * p + u)` passes at uniformly chosen positions,
/// with `p` calibrated so the overall rate lands on the configured target.
/// Also returns the expected rate the calibrated strata can deliver.
fn assign_first_time_passes(
    config: &GeneratorConfig,
    clients: &[Client],
    applications: &[Application],
    rng: &mut StdRng,
) -> (Vec<bool>, f64) {
    let sizes: BTreeMap<&ClientId, ManufacturerSize> = clients
        .iter()
        .map(|c| (&c.client_id, c.manufacturer_size))
        .collect();
    let size_of = |app: &Application| {
        sizes
            .get(&app.client_id)
            .copied()
            .unwrap_or(ManufacturerSize::Sme)
    };
    let mut strata: Vec<(MidModule, ManufacturerSize, Vec<usize>)> = Vec::new();
    for module in MidModule::ALL {
        for size in ManufacturerSize::ALL {
            strata.push((*module, *size, Vec::new()));
        }
    }
    for (i, app) in applications.iter().enumerate() {
        let size = size_of(app);
        if let Some((_, _, members)) = strata
            .iter_mut()
            .find(|(module, s, _)| *module == app.mid_module && *s == size)
        {
            members.push(i);
        }
    }

    let weights: Vec<(f64, usize)> = strata
        .iter()
        .map(|(module, size, members)| (stratum_pass_rate(*module, *size), members.len()))
        .collect();
    let rates = calibrated_rates(&weights, config.target_pass_rate);

    let mut passed = vec![false; applications.len()];
    for ((module, size, members), rate) in strata.iter().zip(&rates) {
        let n = members.len();
        let quota = ((n as f64 * rate + rng.gen::<f64>()).floor() as usize).min(n);
        for slot in index::sample(rng, n, quota) {
            passed[members[slot]] = true;
        }
        tracing::trace!(module = %module, size = %size, n, quota, "stratum quota");
    }
    (passed, mixture_rate(&weights, &rates))
}

fn sample_outcomes(
    config: &GeneratorConfig,
    samplers: &Samplers,
    applications: &[Application],
    passed: &[bool],
    rng: &mut StdRng,
) -> Result<Vec<CertificationResult>, GenerateError> {
    let cutoff = config.pending_cutoff();
    applications
        .iter()
        .zip(passed)
        .map(|(app, &passed_first_time)| {
            let total_revisions = if passed_first_time {
                0
            } else {
                samplers.revisions.draw(rng)
            };
            let jitter = rng.gen_range(-TURNAROUND_JITTER_DAYS..=TURNAROUND_JITTER_DAYS);
            let turnaround = base_turnaround_days(app.mid_module)
                + i64::from(total_revisions) * DAYS_PER_REVISION
                + jitter;
            let is_pending =
                app.submission_date > cutoff && rng.gen_bool(config.pending_probability);
            let certification_date = if is_pending {
                None
            } else {
                Some(shift(app.submission_date, turnaround)?)
            };
            Ok(CertificationResult {
                application_id: app.application_id.clone(),
                passed_first_time,
                total_revisions,
                certification_date,
            })
        })
        .collect()
}

/// One audit per cycle, evenly spaced from submission; the closing audit of a
/// certified application sits on its certification date.
fn sample_audits(
    samplers: &Samplers,
    applications: &[Application],
    results: &[CertificationResult],
    rng: &mut StdRng,
) -> Result<Vec<AuditResult>, GenerateError> {
    let mut audits = Vec::new();
    let mut sequence = 0_u32;
    for (app, result) in applications.iter().zip(results) {
        let total = i64::from(result.total_revisions) + 1;
        let span = match result.certification_date {
            Some(cert) => (cert - app.submission_date).num_days(),
            None => {
                base_turnaround_days(app.mid_module)
                    + i64::from(result.total_revisions) * DAYS_PER_REVISION
            }
        };
        let step = span / total;
        for i in 0..total {
            let is_final = i == total - 1;
            let (offset, audit_status, failure_reason) = match (is_final, result.certification_date)
            {
                (true, Some(_)) => (span, AuditStatus::Pass, None),
                (true, None) => ((i + 1) * step, AuditStatus::Pending, None),
                (false, _) => (
                    ((i + 1) * step).min(span),
                    AuditStatus::Fail,
                    Some(samplers.failure_reason(app.mid_module, rng)),
                ),
            };
            sequence += 1;
            audits.push(AuditResult {
                audit_id: AuditId::from_sequence(sequence).map_err(id_error)?,
                application_id: app.application_id.clone(),
                audit_date: shift(app.submission_date, offset)?,
                audit_status,
                failure_reason,
            });
        }
    }
    Ok(audits)
}
