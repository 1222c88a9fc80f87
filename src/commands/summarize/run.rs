use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};

use crate::cli::SummarizeArgs;
use crate::model::{SummaryCounts, SummaryRunReport};
use crate::util::{now_utc_string, utc_compact_string, write_json_atomic};

use super::aggregate::{Aggregator, count_cells};
use super::config::SummarizeConfig;
use super::detect::{ResultFormat, detect_format};
use super::error::PipelineError;
use super::extract::{MetricPayload, extract_observations};
use super::metadata::{FileContext, ResultTreeWalker};
use super::report::{empty_grid_paths, print_rankings};

pub fn run(args: SummarizeArgs) -> Result<()> {
    let started_ts = Utc::now();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let manifest_dir = args.cache_root.join("manifests");
    let run_report_path = args.run_report_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!("summary_run_{}.json", utc_compact_string(started_ts)))
    });

    let config = SummarizeConfig {
        results_root: args.results_root,
        output_path: args.output_path,
        run_report_path,
        ranking_limit: args.ranking_limit,
        dataset_prefix_aliases: SummarizeConfig::default_dataset_prefix_aliases(),
        expected_hidden_fractions: SummarizeConfig::default_expected_hidden_fractions(),
        expected_batch_sizes: SummarizeConfig::default_expected_batch_sizes(),
    };

    info!(
        results_root = %config.results_root.display(),
        run_id = %run_id,
        "starting summarize"
    );

    let report = execute(&config, &run_id)?;

    info!(
        files_processed = report.counts.files_processed,
        files_skipped = report.counts.files_skipped,
        observations = report.counts.observations_extracted,
        empty_paths = report.empty_paths.len(),
        "summarize completed"
    );

    Ok(())
}

/// Pipeline entry point: discover and classify result files, run each
/// through detect/extract, fold the observation stream, and write the
/// summary artifact plus the run report. Fails with `EmptyResultSet` when
/// no observation survived any input file.
pub fn execute(config: &SummarizeConfig, run_id: &str) -> Result<SummaryRunReport> {
    let walker = ResultTreeWalker::new()?;
    let discovery = walker.discover(&config.results_root, &config.dataset_prefix_aliases)?;

    let mut aggregator = Aggregator::default();
    let mut counts = SummaryCounts {
        files_discovered: discovery.files.len() + discovery.skipped_files,
        files_skipped: discovery.skipped_files,
        ..SummaryCounts::default()
    };
    let mut warnings = discovery.warnings;

    for file in &discovery.files {
        let document = match read_document(&file.path) {
            Ok(document) => document,
            Err(err) => {
                warn!(path = %file.path.display(), error = %err, "failed to load result document");
                warnings.push(format!("parse failure: {}", file.relative_path));
                counts.parse_failure_files += 1;
                counts.files_skipped += 1;
                continue;
            }
        };

        match process_document(&document, &file.context, &mut aggregator, &mut counts) {
            Ok(format) => {
                counts.files_processed += 1;
                info!(
                    path = %file.relative_path,
                    format = format.as_str(),
                    "processed result document"
                );
            }
            Err(err) => {
                warn!(path = %file.path.display(), error = %err, "skipping result document");
                warnings.push(format!("unrecognized format: {}", file.relative_path));
                counts.unrecognized_format_files += 1;
                counts.files_skipped += 1;
            }
        }
    }

    if aggregator.is_empty() {
        return Err(PipelineError::EmptyResultSet.into());
    }

    let (scalar_rankings, trajectory_rankings) = aggregator.rankings();
    let summary = aggregator.into_summary();
    counts.aggregate_cells = count_cells(&summary);

    let empty_paths = empty_grid_paths(&summary, config);
    for path in &empty_paths {
        info!(path = %path, "configuration path has no data");
    }

    write_json_atomic(&config.output_path, &summary)?;
    info!(
        path = %config.output_path.display(),
        cells = counts.aggregate_cells,
        "wrote summary artifact"
    );

    let report = SummaryRunReport {
        manifest_version: 1,
        run_id: run_id.to_string(),
        generated_at: now_utc_string(),
        status: "completed".to_string(),
        results_root: config.results_root.display().to_string(),
        output_path: config.output_path.display().to_string(),
        counts,
        empty_paths,
        warnings,
    };
    write_json_atomic(&config.run_report_path, &report)?;
    info!(path = %config.run_report_path.display(), "wrote summary run report");

    print_rankings(
        &scalar_rankings,
        &trajectory_rankings,
        config.ranking_limit,
    )?;

    Ok(report)
}

/// Detects the document's layout and feeds its observations into the
/// aggregator. Only an unrecognized layout fails; malformed sub-sections
/// are counted and skipped inside the extractor.
pub(super) fn process_document(
    document: &Value,
    context: &FileContext,
    aggregator: &mut Aggregator,
    counts: &mut SummaryCounts,
) -> Result<ResultFormat, PipelineError> {
    let format = detect_format(document)?;
    let extraction = extract_observations(document, format, context);
    counts.malformed_entries += extraction.malformed_entries;

    for observation in extraction.observations {
        match observation.payload {
            MetricPayload::StepsToTarget(_) => counts.scalar_observations += 1,
            MetricPayload::Trajectory(_) => counts.trajectory_observations += 1,
        }
        counts.observations_extracted += 1;
        aggregator.insert(observation);
    }

    Ok(format)
}

fn read_document(path: &Path) -> Result<Value> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let document: Value = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(document)
}
