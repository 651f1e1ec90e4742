// SPDX-License-Identifier: Apache-2.0

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use midcert_analytics::{compute_kpis, run_checklist};
use midcert_core::{resolve_config_path, ConfigPathScope, ENV_MIDCERT_CONFIG};
use midcert_generate::{generate_to_dir, GeneratorConfig};
use midcert_model::{data_layout, DataLayout};
use midcert_quality::{validate_layout, QualityError, QualityReport};
use midcert_store::{load_layout, open_store, StoreSummary};
use serde_json::json;

use crate::command_output_adapters::{emit_ok, to_value, CommandOutput};
use crate::{CliError, GenerateArgs, OutputMode};

/// Config precedence: `--config`, `MIDCERT_CONFIG`, `.midcert/generator.json`
/// when present, built-in defaults; then individual flags override fields.
pub(crate) fn resolve_generator_config(
    args: &GenerateArgs,
) -> Result<(GeneratorConfig, Option<PathBuf>), CliError> {
    let source = match &args.config {
        Some(path) => Some(path.clone()),
        None => {
            let env_set = std::env::var(ENV_MIDCERT_CONFIG).is_ok_and(|v| !v.trim().is_empty());
            let candidate = resolve_config_path(ConfigPathScope::Workspace);
            (env_set || candidate.exists()).then_some(candidate)
        }
    };
    let mut config = match &source {
        Some(path) if !path.exists() => {
            return Err(CliError::dependency(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        Some(path) => GeneratorConfig::load_from_json(path)
            .map_err(|e| CliError::validation("invalid_config", e.0))?,
        None => GeneratorConfig::default(),
    };
    if let Some(applications) = args.applications {
        config.applications = applications;
    }
    if let Some(clients) = args.clients {
        config.clients = clients;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    config
        .validate()
        .map_err(|e| CliError::validation("invalid_config", e.0))?;
    Ok((config, source))
}

fn generate_step(layout: &DataLayout, args: &GenerateArgs) -> Result<CommandOutput, CliError> {
    let (config, source) = resolve_generator_config(args)?;
    let result = generate_to_dir(&config, layout).map_err(|e| CliError::internal(e.0))?;

    let mut text = String::new();
    let _ = writeln!(
        text,
        "generated {} applications for {} clients (seed {})",
        config.applications, config.clients, config.seed
    );
    for table in result.manifest.tables.values() {
        let _ = writeln!(
            text,
            "  {:<26} {:>5} rows  sha256 {}",
            table.file, table.rows, table.sha256
        );
    }
    let _ = writeln!(
        text,
        "first-time pass rate {:.1}%  revision rate {:.1}%",
        result.manifest.first_time_pass_rate * 100.0,
        result.manifest.revision_rate * 100.0
    );
    let _ = writeln!(text, "manifest {}", result.manifest_path.display());

    Ok(CommandOutput::new(
        "generate",
        json!({
            "status": "ok",
            "config_source": source,
            "raw_dir": layout.raw_dir,
            "manifest_path": result.manifest_path,
            "manifest": to_value(&result.manifest)?,
            "events": to_value(&result.events)?,
        }),
        text,
    ))
}

fn validate_step(layout: &DataLayout) -> Result<(CommandOutput, QualityReport), CliError> {
    let report = validate_layout(layout).map_err(|e| CliError::dependency(e.to_string()))?;
    let output = CommandOutput::new(
        "validate",
        json!({
            "status": if report.has_critical() { "failed" } else { "ok" },
            "report": to_value(&report)?,
        }),
        report.render_text(),
    );
    Ok((output, report))
}

fn critical_error(report: &QualityReport) -> CliError {
    let mut error = CliError::validation(
        "validation_failed",
        format!("data quality: {}", report.verdict.as_str()),
    );
    error.machine = error
        .machine
        .with_detail("critical", &report.counts.critical.to_string())
        .with_detail("warning", &report.counts.warning.to_string());
    error
}

fn render_store_summary(summary: &StoreSummary) -> String {
    let mut text = String::new();
    let _ = writeln!(
        text,
        "loaded {} (schema v{})",
        summary.database.display(),
        summary.schema_version
    );
    for (table, rows) in &summary.row_counts {
        let _ = writeln!(text, "  {table:<24} {rows:>5} rows");
    }
    let _ = writeln!(
        text,
        "{} indexes, {} views",
        summary.indexes.len(),
        summary.views.len()
    );
    for module in &summary.module_comparison {
        let _ = writeln!(
            text,
            "  Module {}: {} apps  success {}%  avg revisions {}  avg {} days",
            module.mid_module,
            module.applications,
            module.success_rate,
            module.avg_revisions,
            module.avg_days
        );
    }
    text
}

fn load_step(layout: &DataLayout) -> Result<CommandOutput, CliError> {
    let missing = layout.missing_tables();
    if !missing.is_empty() {
        return Err(CliError::dependency(
            QualityError::MissingInput(missing).to_string(),
        ));
    }
    let summary = load_layout(layout).map_err(|e| CliError::dependency(e.0))?;
    Ok(CommandOutput::new(
        "load",
        json!({ "status": "ok", "summary": to_value(&summary)? }),
        render_store_summary(&summary),
    ))
}

fn kpi_step(layout: &DataLayout) -> Result<CommandOutput, CliError> {
    let conn = open_store(&layout.database).map_err(|e| CliError::dependency(e.0))?;
    let report = compute_kpis(&conn).map_err(|e| CliError::internal(e.0))?;
    Ok(CommandOutput::new(
        "kpi",
        json!({ "status": "ok", "kpis": to_value(&report)? }),
        report.render_text(),
    ))
}

fn checklist_step(layout: &DataLayout, out: Option<PathBuf>) -> Result<CommandOutput, CliError> {
    let conn = open_store(&layout.database).map_err(|e| CliError::dependency(e.0))?;
    let export_path = out.unwrap_or_else(|| layout.checklist_csv.clone());
    let report = run_checklist(&conn, &export_path).map_err(|e| CliError::internal(e.0))?;
    Ok(CommandOutput::new(
        "checklist",
        json!({ "status": "ok", "checklist": to_value(&report)? }),
        report.render_text(),
    ))
}

pub(crate) fn generate(
    data_dir: &Path,
    args: &GenerateArgs,
    output_mode: OutputMode,
) -> Result<(), CliError> {
    emit_ok(output_mode, &generate_step(&data_layout(data_dir), args)?)
}

pub(crate) fn validate(data_dir: &Path, output_mode: OutputMode) -> Result<(), CliError> {
    let (output, report) = validate_step(&data_layout(data_dir))?;
    emit_ok(output_mode, &output)?;
    if report.has_critical() {
        return Err(critical_error(&report));
    }
    Ok(())
}

pub(crate) fn load(data_dir: &Path, output_mode: OutputMode) -> Result<(), CliError> {
    emit_ok(output_mode, &load_step(&data_layout(data_dir))?)
}

pub(crate) fn kpi(data_dir: &Path, output_mode: OutputMode) -> Result<(), CliError> {
    emit_ok(output_mode, &kpi_step(&data_layout(data_dir))?)
}

pub(crate) fn checklist(
    data_dir: &Path,
    out: Option<PathBuf>,
    output_mode: OutputMode,
) -> Result<(), CliError> {
    emit_ok(output_mode, &checklist_step(&data_layout(data_dir), out)?)
}

fn emit_stages(
    output_mode: OutputMode,
    stages: Vec<CommandOutput>,
    status: &str,
) -> Result<(), CliError> {
    let mut text = String::new();
    let mut payloads = Vec::with_capacity(stages.len());
    for stage in stages {
        let name = stage
            .payload
            .get("command")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("stage")
            .to_string();
        let _ = writeln!(text, "=== {name} ===");
        text.push_str(&stage.text);
        if !stage.text.ends_with('\n') {
            text.push('\n');
        }
        payloads.push(stage.payload);
    }
    emit_ok(
        output_mode,
        &CommandOutput::new("run", json!({ "status": status, "stages": payloads }), text),
    )
}

/// generate → validate → load → kpi → checklist; stops before loading when
/// validation finds critical issues.
pub(crate) fn run_pipeline(
    data_dir: &Path,
    args: &GenerateArgs,
    output_mode: OutputMode,
) -> Result<(), CliError> {
    let layout = data_layout(data_dir);
    let mut stages = vec![generate_step(&layout, args)?];
    let (validation, report) = validate_step(&layout)?;
    stages.push(validation);
    if report.has_critical() {
        emit_stages(output_mode, stages, "failed")?;
        return Err(critical_error(&report));
    }
    stages.push(load_step(&layout)?);
    stages.push(kpi_step(&layout)?);
    stages.push(checklist_step(&layout, None)?);
    tracing::info!(data_dir = %data_dir.display(), "pipeline complete");
    emit_stages(output_mode, stages, "ok")
}

pub(crate) fn show_config(
    data_dir: &Path,
    args: &GenerateArgs,
    output_mode: OutputMode,
) -> Result<(), CliError> {
    let (config, source) = resolve_generator_config(args)?;
    let layout = data_layout(data_dir);
    let workspace_config = resolve_config_path(ConfigPathScope::Workspace);
    let user_config = resolve_config_path(ConfigPathScope::User);

    let mut text = String::new();
    let _ = writeln!(
        text,
        "config source: {}",
        source
            .as_ref()
            .map_or_else(|| "defaults".to_string(), |p| p.display().to_string())
    );
    let _ = writeln!(
        text,
        "applications {}  clients {}  seed {}\nperiod {} .. {}\ntarget pass rate {}  pending probability {}",
        config.applications,
        config.clients,
        config.seed,
        config.period_start,
        config.period_end,
        config.target_pass_rate,
        config.pending_probability
    );
    let _ = writeln!(
        text,
        "data dir {}\nraw dir {}\ndatabase {}\nchecklist {}\nworkspace config {}\nuser config {}",
        layout.root.display(),
        layout.raw_dir.display(),
        layout.database.display(),
        layout.checklist_csv.display(),
        workspace_config.display(),
        user_config.display()
    );

    emit_ok(
        output_mode,
        &CommandOutput::new(
            "config",
            json!({
                "config": to_value(&config)?,
                "config_source": source,
                "paths": {
                    "data_dir": layout.root,
                    "raw_dir": layout.raw_dir,
                    "database": layout.database,
                    "checklist_csv": layout.checklist_csv,
                    "generation_manifest": layout.generation_manifest,
                    "workspace_config": workspace_config,
                    "user_config": user_config,
                },
            }),
            text,
        ),
    )
}
