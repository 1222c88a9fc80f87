use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::model::{ResultInventoryManifest, SummaryRunReport};

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_dir = args.cache_root.join("manifests");
    let inventory_path = manifest_dir.join("result_inventory.json");

    info!(cache_root = %args.cache_root.display(), "status requested");

    if inventory_path.exists() {
        let raw = fs::read(&inventory_path)
            .with_context(|| format!("failed to read {}", inventory_path.display()))?;
        let inventory: ResultInventoryManifest = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", inventory_path.display()))?;

        info!(
            generated_at = %inventory.generated_at,
            file_count = inventory.file_count,
            source = %inventory.source_directory,
            "loaded inventory manifest"
        );
    } else {
        warn!(path = %inventory_path.display(), "inventory manifest missing");
    }

    match latest_run_report(&manifest_dir)? {
        Some((report_path, report)) => {
            info!(
                path = %report_path.display(),
                run_id = %report.run_id,
                status = %report.status,
                files_processed = report.counts.files_processed,
                files_skipped = report.counts.files_skipped,
                observations = report.counts.observations_extracted,
                empty_paths = report.empty_paths.len(),
                "loaded latest summary run report"
            );
        }
        None => {
            warn!(path = %manifest_dir.display(), "no summary run report found");
        }
    }

    if args.output_path.exists() {
        let raw = fs::read(&args.output_path)
            .with_context(|| format!("failed to read {}", args.output_path.display()))?;
        let summary: Value = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", args.output_path.display()))?;

        info!(
            path = %args.output_path.display(),
            hidden_fractions = summary.as_object().map(|fractions| fractions.len()).unwrap_or(0),
            cells = summary_cell_count(&summary),
            "summary artifact status"
        );
    } else {
        warn!(path = %args.output_path.display(), "summary artifact missing");
    }

    Ok(())
}

fn latest_run_report(manifest_dir: &Path) -> Result<Option<(PathBuf, SummaryRunReport)>> {
    if !manifest_dir.exists() {
        return Ok(None);
    }

    let mut report_paths = Vec::new();
    let entries = fs::read_dir(manifest_dir)
        .with_context(|| format!("failed to read {}", manifest_dir.display()))?;
    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", manifest_dir.display()))?;
        let path = entry.path();
        let is_report = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with("summary_run_") && name.ends_with(".json"))
            .unwrap_or(false);
        if is_report {
            report_paths.push(path);
        }
    }

    // Report filenames embed a compact UTC timestamp, so the lexical
    // maximum is the most recent run.
    report_paths.sort();
    let Some(path) = report_paths.pop() else {
        return Ok(None);
    };

    let raw = fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
    let report: SummaryRunReport = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    Ok(Some((path, report)))
}

fn summary_cell_count(summary: &Value) -> usize {
    let mut cells = 0;

    let Some(fractions) = summary.as_object() else {
        return 0;
    };
    for difficulties in fractions.values().filter_map(Value::as_object) {
        for races in difficulties.values().filter_map(Value::as_object) {
            for batches in races.values().filter_map(Value::as_object) {
                for datasets in batches.values().filter_map(Value::as_object) {
                    for optimizers in datasets.values().filter_map(Value::as_object) {
                        cells += optimizers.len();
                    }
                }
            }
        }
    }

    cells
}
