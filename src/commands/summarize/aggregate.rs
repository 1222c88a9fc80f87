use std::collections::BTreeMap;

use crate::model::{OptimizerSummary, ScalarStats, SummaryStructure, TrajectorySummary};
use crate::util::round6;

use super::extract::{MetricPayload, Observation};
use super::metadata::{Difficulty, RaceType};

/// Composite grouping key. A pure function of each observation, so the
/// aggregation result is insensitive to input ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct GroupKey {
    pub hidden_fraction: String,
    pub difficulty: Difficulty,
    pub race_type: RaceType,
    pub batch_size: u32,
    pub dataset: String,
    pub optimizer: String,
}

impl GroupKey {
    fn of(observation: &Observation) -> Self {
        Self {
            hidden_fraction: observation.hidden_fraction.clone(),
            difficulty: observation.difficulty,
            race_type: observation.race_type,
            batch_size: observation.batch_size,
            dataset: observation.dataset.clone(),
            optimizer: observation.optimizer.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScalarRanking {
    pub optimizer: String,
    pub mean_steps: f64,
    pub std: f64,
    pub n: usize,
}

#[derive(Debug, Clone)]
pub struct TrajectoryRanking {
    pub optimizer: String,
    pub final_best: f64,
}

/// Groups the observation stream by key tuple and reduces each group into
/// its aggregate cell. Private to one pipeline invocation.
#[derive(Debug, Default)]
pub struct Aggregator {
    scalars: BTreeMap<GroupKey, Vec<f64>>,
    trajectories: BTreeMap<GroupKey, Vec<Vec<(u64, f64)>>>,
}

impl Aggregator {
    pub fn insert(&mut self, observation: Observation) {
        let key = GroupKey::of(&observation);
        match observation.payload {
            MetricPayload::StepsToTarget(steps) => {
                self.scalars.entry(key).or_default().push(steps);
            }
            MetricPayload::Trajectory(pairs) => {
                self.trajectories.entry(key).or_default().push(pairs);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.scalars.is_empty() && self.trajectories.is_empty()
    }

    /// Pooled per-optimizer rankings across every configuration:
    /// Hide-the-Label by ascending mean steps, Open Race by descending
    /// best final averaged value. Ties break on optimizer name.
    pub fn rankings(&self) -> (Vec<ScalarRanking>, Vec<TrajectoryRanking>) {
        let mut pooled: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for (key, values) in &self.scalars {
            pooled
                .entry(key.optimizer.as_str())
                .or_default()
                .extend(values.iter().copied());
        }

        let mut scalar_rankings = pooled
            .into_iter()
            .map(|(optimizer, values)| {
                let stats = scalar_stats(&values);
                ScalarRanking {
                    optimizer: optimizer.to_string(),
                    mean_steps: stats.mean_steps,
                    std: stats.std,
                    n: stats.n,
                }
            })
            .collect::<Vec<_>>();
        scalar_rankings.sort_by(|a, b| {
            a.mean_steps
                .total_cmp(&b.mean_steps)
                .then_with(|| a.optimizer.cmp(&b.optimizer))
        });

        let mut finals: BTreeMap<&str, f64> = BTreeMap::new();
        for (key, runs) in &self.trajectories {
            let trajectory = average_trajectories(runs);
            if let Some(&last) = trajectory.values.last() {
                finals
                    .entry(key.optimizer.as_str())
                    .and_modify(|best| {
                        if last > *best {
                            *best = last;
                        }
                    })
                    .or_insert(last);
            }
        }

        let mut trajectory_rankings = finals
            .into_iter()
            .map(|(optimizer, final_best)| TrajectoryRanking {
                optimizer: optimizer.to_string(),
                final_best,
            })
            .collect::<Vec<_>>();
        trajectory_rankings.sort_by(|a, b| {
            b.final_best
                .total_cmp(&a.final_best)
                .then_with(|| a.optimizer.cmp(&b.optimizer))
        });

        (scalar_rankings, trajectory_rankings)
    }

    /// Reduces every group and assembles the nested summary structure.
    /// Scalar cells are written first; in the degenerate case where one
    /// key carries both payload kinds, the trajectory cell wins.
    pub fn into_summary(self) -> SummaryStructure {
        let mut summary = SummaryStructure::new();

        for (key, values) in &self.scalars {
            insert_cell(&mut summary, key, OptimizerSummary::Scalar(scalar_stats(values)));
        }
        for (key, runs) in &self.trajectories {
            insert_cell(
                &mut summary,
                key,
                OptimizerSummary::Trajectory(average_trajectories(runs)),
            );
        }

        summary
    }
}

fn insert_cell(summary: &mut SummaryStructure, key: &GroupKey, cell: OptimizerSummary) {
    summary
        .entry(key.hidden_fraction.clone())
        .or_default()
        .entry(key.difficulty.as_str().to_string())
        .or_default()
        .entry(key.race_type.as_str().to_string())
        .or_default()
        .entry(key.batch_size)
        .or_default()
        .entry(key.dataset.clone())
        .or_default()
        .insert(key.optimizer.clone(), cell);
}

/// Mean, sample standard deviation (n - 1 denominator, 0.0 for a single
/// observation), and extrema, rounded for stable serialization.
pub fn scalar_stats(values: &[f64]) -> ScalarStats {
    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    let std = if n > 1 {
        let sum_squares = values
            .iter()
            .map(|value| (value - mean).powi(2))
            .sum::<f64>();
        (sum_squares / (n - 1) as f64).sqrt()
    } else {
        0.0
    };
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    ScalarStats {
        mean_steps: round6(mean),
        std: round6(std),
        min: round6(min),
        max: round6(max),
        n,
    }
}

/// Ragged averaging: every step index present in at least one run is
/// emitted with the mean of the values available at that index. Shorter
/// runs simply stop contributing past their last step.
pub fn average_trajectories(runs: &[Vec<(u64, f64)>]) -> TrajectorySummary {
    let mut per_step: BTreeMap<u64, Vec<f64>> = BTreeMap::new();
    for run in runs {
        for &(step, value) in run {
            per_step.entry(step).or_default().push(value);
        }
    }

    let mut steps = Vec::with_capacity(per_step.len());
    let mut values = Vec::with_capacity(per_step.len());
    for (step, bucket) in per_step {
        steps.push(step);
        values.push(round6(bucket.iter().sum::<f64>() / bucket.len() as f64));
    }

    TrajectorySummary { steps, values }
}

/// Total number of optimizer cells in an assembled summary.
pub fn count_cells(summary: &SummaryStructure) -> usize {
    summary
        .values()
        .flat_map(|difficulties| difficulties.values())
        .flat_map(|races| races.values())
        .flat_map(|batches| batches.values())
        .flat_map(|datasets| datasets.values())
        .map(|optimizers| optimizers.len())
        .sum()
}
