use serde_json::Value;
use tracing::warn;

use super::detect::ResultFormat;
use super::error::PipelineError;
use super::metadata::{Difficulty, FileContext, RaceType};

/// Metric payload of one observation: a scalar steps-to-target for
/// Hide-the-Label runs, or an ordered (step, best-so-far) sequence for
/// Open Race runs.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricPayload {
    StepsToTarget(f64),
    Trajectory(Vec<(u64, f64)>),
}

/// The atomic unit handed to the aggregator: one measurement, fully
/// tagged with its categorical keys.
#[derive(Debug, Clone)]
pub struct Observation {
    pub hidden_fraction: String,
    pub difficulty: Difficulty,
    pub race_type: RaceType,
    pub batch_size: u32,
    pub dataset: String,
    pub optimizer: String,
    pub payload: MetricPayload,
}

#[derive(Debug, Default)]
pub struct Extraction {
    pub observations: Vec<Observation>,
    pub malformed_entries: usize,
}

/// Walks a classified document and yields its observations. Structural
/// damage inside the document is skipped at entry granularity; a missing
/// optimizer result or metric is an expected absence and skipped silently.
pub fn extract_observations(
    document: &Value,
    format: ResultFormat,
    context: &FileContext,
) -> Extraction {
    let mut extraction = Extraction::default();

    match format {
        ResultFormat::CompiledAnalysis => {
            extract_compiled_analysis(document, context, &mut extraction);
        }
        ResultFormat::NestedAllTournaments => extract_tournaments(
            document
                .get("results")
                .and_then(|results| results.get("all_tournament_results")),
            context,
            &mut extraction,
        ),
        ResultFormat::NestedTournaments => extract_tournaments(
            document
                .get("results")
                .and_then(|results| results.get("tournament_results")),
            context,
            &mut extraction,
        ),
        ResultFormat::TopLevelAllTournaments => extract_tournaments(
            document.get("all_tournament_results"),
            context,
            &mut extraction,
        ),
        ResultFormat::TopLevelTournaments => {
            extract_tournaments(document.get("tournament_results"), context, &mut extraction);
        }
    }

    extraction
}

/// Pre-compiled analysis files carry aggregated per-optimizer stats; each
/// `mean_steps` becomes one scalar observation.
fn extract_compiled_analysis(document: &Value, context: &FileContext, extraction: &mut Extraction) {
    let Some(items) = document.get("items").and_then(Value::as_array) else {
        return;
    };

    for item in items {
        let Some(optimizer_stats) = item
            .get("data")
            .and_then(|data| data.get("optimizer_stats"))
            .and_then(Value::as_object)
        else {
            note_malformed(extraction, "analysis item missing data.optimizer_stats");
            continue;
        };

        for (optimizer, stats) in optimizer_stats {
            if let Some(mean_steps) = stats.get("mean_steps").and_then(Value::as_f64) {
                extraction.observations.push(observation(
                    context,
                    optimizer,
                    MetricPayload::StepsToTarget(mean_steps),
                ));
            }
        }
    }
}

fn extract_tournaments(
    tournaments: Option<&Value>,
    context: &FileContext,
    extraction: &mut Extraction,
) {
    let Some(tournaments) = tournaments.and_then(Value::as_array) else {
        return;
    };

    for tournament in tournaments {
        if !tournament.is_object() {
            note_malformed(extraction, "tournament entry is not an object");
            continue;
        }

        let Some(competitions) = tournament.get("competitions").and_then(Value::as_array) else {
            note_malformed(extraction, "tournament entry missing competitions array");
            continue;
        };

        for competition in competitions {
            let Some(optimizer_results) = competition
                .get("optimizer_results")
                .and_then(Value::as_object)
            else {
                note_malformed(extraction, "competition missing optimizer_results map");
                continue;
            };

            for (optimizer, result) in optimizer_results {
                match context.race_type {
                    RaceType::HideTheLabel => {
                        if let Some(steps) = result.get("steps_to_target").and_then(Value::as_f64) {
                            extraction.observations.push(observation(
                                context,
                                optimizer,
                                MetricPayload::StepsToTarget(steps),
                            ));
                        }
                    }
                    RaceType::OpenRace => {
                        if let Some(pairs) = trajectory_pairs(result) {
                            extraction.observations.push(observation(
                                context,
                                optimizer,
                                MetricPayload::Trajectory(pairs),
                            ));
                        }
                    }
                }
            }
        }
    }
}

/// One run's best-so-far history: sorted by step index and clamped
/// monotonically non-decreasing. Records missing a step or value are
/// dropped; an empty history yields no observation.
fn trajectory_pairs(result: &Value) -> Option<Vec<(u64, f64)>> {
    let history = result.get("optimization_history").and_then(Value::as_array)?;

    let mut pairs = Vec::with_capacity(history.len());
    for record in history {
        let step = record.get("step").and_then(step_index);
        let value = record
            .get("best_value_so_far")
            .and_then(Value::as_f64)
            .or_else(|| record.get("current_best").and_then(Value::as_f64));

        if let (Some(step), Some(value)) = (step, value) {
            pairs.push((step, value));
        }
    }

    if pairs.is_empty() {
        return None;
    }

    pairs.sort_by_key(|&(step, _)| step);
    for index in 1..pairs.len() {
        if pairs[index].1 < pairs[index - 1].1 {
            pairs[index].1 = pairs[index - 1].1;
        }
    }

    Some(pairs)
}

fn step_index(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_f64().map(|float| float as u64))
}

fn observation(context: &FileContext, optimizer: &str, payload: MetricPayload) -> Observation {
    Observation {
        hidden_fraction: context.hidden_fraction.clone(),
        difficulty: context.difficulty,
        race_type: context.race_type,
        batch_size: context.batch_size,
        dataset: context.dataset.clone(),
        optimizer: optimizer.to_string(),
        payload,
    }
}

fn note_malformed(extraction: &mut Extraction, reason: &str) {
    let error = PipelineError::MalformedEntry(reason.to_string());
    warn!(error = %error, "skipping entry");
    extraction.malformed_entries += 1;
}
