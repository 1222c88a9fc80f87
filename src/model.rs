use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultFileEntry {
    pub relative_path: String,
    pub hidden_fraction: String,
    pub difficulty: String,
    pub race_type: String,
    pub batch_size: u32,
    pub dataset: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub file_count: usize,
    pub files: Vec<ResultFileEntry>,
}

/// Reduction of all scalar observations sharing one key tuple.
///
/// `std` is the sample standard deviation (n - 1 denominator), 0.0 when
/// only one observation contributed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScalarStats {
    pub mean_steps: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub n: usize,
}

/// Averaged best-so-far trajectory. `steps` holds every step index present
/// in at least one contributing run; `values[i]` is the mean of the values
/// available at `steps[i]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrajectorySummary {
    pub steps: Vec<u64>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OptimizerSummary {
    Scalar(ScalarStats),
    Trajectory(TrajectorySummary),
}

pub type OptimizerMap = BTreeMap<String, OptimizerSummary>;
pub type DatasetMap = BTreeMap<String, OptimizerMap>;
pub type BatchMap = BTreeMap<u32, DatasetMap>;
pub type RaceMap = BTreeMap<String, BatchMap>;
pub type DifficultyMap = BTreeMap<String, RaceMap>;

/// hidden_fraction -> difficulty -> race_type -> batch_size -> dataset ->
/// optimizer -> cell. Built once per run; every present path is backed by
/// at least one real observation.
pub type SummaryStructure = BTreeMap<String, DifficultyMap>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryCounts {
    pub files_discovered: usize,
    pub files_processed: usize,
    pub files_skipped: usize,
    pub parse_failure_files: usize,
    pub unrecognized_format_files: usize,
    pub malformed_entries: usize,
    pub observations_extracted: usize,
    pub scalar_observations: usize,
    pub trajectory_observations: usize,
    pub aggregate_cells: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRunReport {
    pub manifest_version: u32,
    pub run_id: String,
    pub generated_at: String,
    pub status: String,
    pub results_root: String,
    pub output_path: String,
    pub counts: SummaryCounts,
    pub empty_paths: Vec<String>,
    pub warnings: Vec<String>,
}
