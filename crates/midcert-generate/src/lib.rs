// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Seeded generator for the four certification tables.
//!
//! The same [`GeneratorConfig`] always yields the same rows and therefore
//! byte-identical CSV files.

mod config;
mod logging;
mod sample;
pub mod weights;
mod write;

use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use midcert_model::{DataLayout, Dataset};

pub use config::{
    GeneratorConfig, DEFAULT_APPLICATIONS, DEFAULT_CLIENTS, DEFAULT_PENDING_PROBABILITY,
    DEFAULT_SEED, DEFAULT_TARGET_PASS_RATE, PENDING_WINDOW_DAYS,
};
pub use logging::{GenerateEvent, GenerateLog, GenerateStage};
pub use write::{hash_file, GenerationManifest, TableFingerprint, GENERATION_MANIFEST_VERSION};

pub const CRATE_NAME: &str = "midcert-generate";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateError(pub String);

impl Display for GenerateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for GenerateError {}

#[derive(Debug, Clone)]
pub struct GenerateResult {
    pub dataset: Dataset,
    pub manifest: GenerationManifest,
    pub written: Vec<PathBuf>,
    pub manifest_path: PathBuf,
    pub events: Vec<GenerateEvent>,
}

/// Samples a dataset in memory without touching the filesystem.
pub fn generate_dataset(config: &GeneratorConfig) -> Result<Dataset, GenerateError> {
    let mut log = GenerateLog::default();
    config.validate()?;
    sample::sample_dataset(config, &mut log)
}

pub fn generate_to_dir(
    config: &GeneratorConfig,
    layout: &DataLayout,
) -> Result<GenerateResult, GenerateError> {
    let mut log = GenerateLog::default();
    log.emit(
        GenerateStage::Prepare,
        "generate.start",
        logging::fields([
            ("seed", config.seed.to_string()),
            ("applications", config.applications.to_string()),
            ("clients", config.clients.to_string()),
        ]),
    );
    config.validate()?;

    let dataset = sample::sample_dataset(config, &mut log)?;

    log.emit(
        GenerateStage::Persist,
        "generate.persist.begin",
        logging::fields([("raw_dir", layout.raw_dir.display().to_string())]),
    );
    let (manifest, written) = write::write_generation_outputs(layout, config, &dataset)?;
    log.emit(
        GenerateStage::Finalize,
        "generate.persist.complete",
        logging::fields([
            (
                "first_time_pass_rate",
                format!("{:.4}", manifest.first_time_pass_rate),
            ),
            ("revision_rate", format!("{:.4}", manifest.revision_rate)),
        ]),
    );
    tracing::info!(
        seed = config.seed,
        applications = dataset.applications.len(),
        audits = dataset.audit_results.len(),
        pass_rate = manifest.first_time_pass_rate,
        "dataset generated"
    );

    Ok(GenerateResult {
        dataset,
        manifest,
        written,
        manifest_path: layout.generation_manifest.clone(),
        events: log.into_events(),
    })
}
