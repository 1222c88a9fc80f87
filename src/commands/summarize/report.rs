use std::io::{self, Write};

use anyhow::{Context, Result};

use crate::model::SummaryStructure;

use super::aggregate::{ScalarRanking, TrajectoryRanking};
use super::config::SummarizeConfig;
use super::metadata::{Difficulty, RaceType};

/// Enumerates the configured grid and lists every configuration path that
/// ended up with no data. The consumer needs this to tell an intentional
/// placeholder apart from a pipeline bug.
pub fn empty_grid_paths(summary: &SummaryStructure, config: &SummarizeConfig) -> Vec<String> {
    let mut empty_paths = Vec::new();

    for hidden_fraction in &config.expected_hidden_fractions {
        for difficulty in [Difficulty::Regular, Difficulty::Hard] {
            for race_type in [RaceType::HideTheLabel, RaceType::OpenRace] {
                for &batch_size in &config.expected_batch_sizes {
                    let datasets = summary
                        .get(hidden_fraction)
                        .and_then(|difficulties| difficulties.get(difficulty.as_str()))
                        .and_then(|races| races.get(race_type.as_str()))
                        .and_then(|batches| batches.get(&batch_size));

                    if datasets.is_none_or(|datasets| datasets.is_empty()) {
                        empty_paths.push(format!(
                            "{hidden_fraction}/{}/{}/Batch{batch_size}",
                            difficulty.as_str(),
                            race_type.as_str()
                        ));
                    }
                }
            }
        }
    }

    empty_paths
}

/// Human-readable ranking summary printed to stdout on success.
pub fn print_rankings(
    scalar_rankings: &[ScalarRanking],
    trajectory_rankings: &[TrajectoryRanking],
    limit: usize,
) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(output, "Hide-the-Label rankings (lower mean steps is better)")
        .context("failed to write ranking summary")?;
    if scalar_rankings.is_empty() {
        writeln!(output, "  (no data)")?;
    }
    for (index, ranking) in scalar_rankings.iter().take(limit).enumerate() {
        writeln!(
            output,
            "{:2}. {:<25} {:8.1} steps (±{:.1}, n={})",
            index + 1,
            ranking.optimizer,
            ranking.mean_steps,
            ranking.std,
            ranking.n
        )?;
    }

    writeln!(output)?;
    writeln!(output, "Open Race rankings (higher final best value is better)")?;
    if trajectory_rankings.is_empty() {
        writeln!(output, "  (no data)")?;
    }
    for (index, ranking) in trajectory_rankings.iter().take(limit).enumerate() {
        writeln!(
            output,
            "{:2}. {:<25} {:10.4} final best",
            index + 1,
            ranking.optimizer,
            ranking.final_best
        )?;
    }

    output.flush()?;
    Ok(())
}
