// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use midcert_core::canonical::stable_json_bytes;
use midcert_core::sha256_hex;
use midcert_model::{write_dataset, DataLayout, Dataset, TableFile};
use serde::{Deserialize, Serialize};

use crate::config::GeneratorConfig;
use crate::GenerateError;

pub const GENERATION_MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableFingerprint {
    pub file: String,
    pub rows: usize,
    pub sha256: String,
}

/// Written next to the CSVs. Contains no timestamps, so it is as
/// reproducible as the tables it fingerprints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationManifest {
    pub manifest_version: u32,
    pub config: GeneratorConfig,
    pub tables: BTreeMap<String, TableFingerprint>,
    pub first_time_pass_rate: f64,
    pub revision_rate: f64,
}

pub fn hash_file(path: &Path) -> Result<String, GenerateError> {
    let bytes = fs::read(path).map_err(|e| GenerateError(format!("{}: {e}", path.display())))?;
    Ok(sha256_hex(&bytes))
}

pub(crate) fn write_generation_outputs(
    layout: &DataLayout,
    config: &GeneratorConfig,
    dataset: &Dataset,
) -> Result<(GenerationManifest, Vec<PathBuf>), GenerateError> {
    let written = write_dataset(layout, dataset).map_err(|e| GenerateError(e.to_string()))?;

    let mut tables = BTreeMap::new();
    for ((table, path), (_, rows)) in TableFile::ALL
        .iter()
        .zip(&written)
        .zip(dataset.row_counts())
    {
        tables.insert(
            table.table_name().to_string(),
            TableFingerprint {
                file: table.file_name().to_string(),
                rows,
                sha256: hash_file(path)?,
            },
        );
    }
    let manifest = GenerationManifest {
        manifest_version: GENERATION_MANIFEST_VERSION,
        config: config.clone(),
        tables,
        first_time_pass_rate: dataset.first_time_pass_rate(),
        revision_rate: dataset.revision_rate(),
    };
    let bytes = stable_json_bytes(&manifest).map_err(|e| GenerateError(e.to_string()))?;
    fs::write(&layout.generation_manifest, bytes).map_err(|e| {
        GenerateError(format!("{}: {e}", layout.generation_manifest.display()))
    })?;
    Ok((manifest, written))
}
