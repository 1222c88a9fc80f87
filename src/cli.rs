use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "altourney",
    version,
    about = "Active-learning tournament result aggregation tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Inventory(InventoryArgs),
    Summarize(SummarizeArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long, default_value = "Result_Official")]
    pub results_root: PathBuf,

    #[arg(long, default_value = ".cache/altourney")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SummarizeArgs {
    #[arg(long, default_value = "Result_Official")]
    pub results_root: PathBuf,

    #[arg(long, default_value = ".cache/altourney")]
    pub cache_root: PathBuf,

    #[arg(long, default_value = "playground_data.json")]
    pub output_path: PathBuf,

    #[arg(long)]
    pub run_report_path: Option<PathBuf>,

    #[arg(long, default_value_t = 10)]
    pub ranking_limit: usize,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/altourney")]
    pub cache_root: PathBuf,

    #[arg(long, default_value = "playground_data.json")]
    pub output_path: PathBuf,
}
