use std::path::PathBuf;

/// Explicit pipeline configuration: paths, the dataset canonicalization
/// table, and the grid used for empty-path reporting. Carried as one
/// value so the pipeline stays testable with synthetic inputs instead of
/// ambient process-wide state.
#[derive(Debug, Clone)]
pub struct SummarizeConfig {
    pub results_root: PathBuf,
    pub output_path: PathBuf,
    pub run_report_path: PathBuf,
    pub ranking_limit: usize,
    pub dataset_prefix_aliases: Vec<(String, String)>,
    pub expected_hidden_fractions: Vec<String>,
    pub expected_batch_sizes: Vec<u32>,
}

impl SummarizeConfig {
    /// Filename-prefix table mapping each historical provenance bucket to
    /// its canonical dataset name. DBO_/MOBO_ are two pipeline
    /// generations of the same rat_myocyte dataset.
    pub fn default_dataset_prefix_aliases() -> Vec<(String, String)> {
        [
            ("DBO_rat_myocyte", "rat_myocyte"),
            ("MOBO_rat_myocyte", "rat_myocyte"),
            ("Hela_regular_mode", "Hela_regular"),
            ("Hela_timesaving_mode", "Hela_timesaving"),
            ("TF_Cell", "TF_Cell"),
            ("T_Cell", "T_Cell"),
        ]
        .into_iter()
        .map(|(prefix, canonical)| (prefix.to_string(), canonical.to_string()))
        .collect()
    }

    pub fn default_expected_hidden_fractions() -> Vec<String> {
        vec!["0.95".to_string(), "0.99".to_string()]
    }

    pub fn default_expected_batch_sizes() -> Vec<u32> {
        vec![1, 10, 20]
    }
}
