use serde_json::{Value, json};

use crate::model::SummaryCounts;

use super::aggregate::{Aggregator, average_trajectories, scalar_stats};
use super::config::SummarizeConfig;
use super::detect::{ResultFormat, detect_format};
use super::error::PipelineError;
use super::extract::{MetricPayload, Observation, extract_observations};
use super::metadata::{
    Difficulty, FileContext, RaceType, canonical_dataset, canonical_fraction,
};
use super::report::empty_grid_paths;
use super::run::process_document;

fn hide_label_context() -> FileContext {
    FileContext {
        hidden_fraction: "0.95".to_string(),
        difficulty: Difficulty::Regular,
        race_type: RaceType::HideTheLabel,
        batch_size: 1,
        dataset: "T_Cell".to_string(),
    }
}

fn open_race_context() -> FileContext {
    FileContext {
        race_type: RaceType::OpenRace,
        ..hide_label_context()
    }
}

fn scalar_observation(optimizer: &str, steps: f64) -> Observation {
    let context = hide_label_context();
    Observation {
        hidden_fraction: context.hidden_fraction,
        difficulty: context.difficulty,
        race_type: context.race_type,
        batch_size: context.batch_size,
        dataset: context.dataset,
        optimizer: optimizer.to_string(),
        payload: MetricPayload::StepsToTarget(steps),
    }
}

fn tournament_with_scalar(steps: f64) -> Value {
    json!({
        "competitions": [
            {"optimizer_results": {"BO_GP_EI": {"steps_to_target": steps}}}
        ]
    })
}

#[test]
fn detect_format_classifies_all_five_layouts() {
    let cases = [
        (
            json!({"type": "analysis", "items": []}),
            ResultFormat::CompiledAnalysis,
        ),
        (
            json!({"results": {"all_tournament_results": []}}),
            ResultFormat::NestedAllTournaments,
        ),
        (
            json!({"results": {"tournament_results": []}}),
            ResultFormat::NestedTournaments,
        ),
        (
            json!({"all_tournament_results": []}),
            ResultFormat::TopLevelAllTournaments,
        ),
        (
            json!({"tournament_results": []}),
            ResultFormat::TopLevelTournaments,
        ),
    ];

    for (document, expected) in cases {
        assert_eq!(detect_format(&document).unwrap(), expected);
    }
}

#[test]
fn detect_format_prefers_the_most_specific_signature() {
    let document = json!({
        "results": {"tournament_results": []},
        "all_tournament_results": []
    });

    assert_eq!(
        detect_format(&document).unwrap(),
        ResultFormat::NestedTournaments
    );
}

#[test]
fn detect_format_rejects_unknown_layouts() {
    let document = json!({"summary": {"optimizers": []}});

    assert!(matches!(
        detect_format(&document),
        Err(PipelineError::UnrecognizedFormat)
    ));
}

#[test]
fn each_layout_yields_one_observation_with_the_expected_key_tuple() {
    let documents = [
        json!({
            "type": "analysis",
            "items": [{"data": {"optimizer_stats": {"BO_GP_EI": {"mean_steps": 5.0}}}}]
        }),
        json!({"results": {"all_tournament_results": [tournament_with_scalar(5.0)]}}),
        json!({"results": {"tournament_results": [tournament_with_scalar(5.0)]}}),
        json!({"all_tournament_results": [tournament_with_scalar(5.0)]}),
        json!({"tournament_results": [tournament_with_scalar(5.0)]}),
    ];

    let context = hide_label_context();
    for document in documents {
        let format = detect_format(&document).unwrap();
        let extraction = extract_observations(&document, format, &context);

        assert_eq!(extraction.observations.len(), 1);
        assert_eq!(extraction.malformed_entries, 0);

        let observation = &extraction.observations[0];
        assert_eq!(observation.hidden_fraction, "0.95");
        assert_eq!(observation.difficulty, Difficulty::Regular);
        assert_eq!(observation.race_type, RaceType::HideTheLabel);
        assert_eq!(observation.batch_size, 1);
        assert_eq!(observation.dataset, "T_Cell");
        assert_eq!(observation.optimizer, "BO_GP_EI");
        assert_eq!(observation.payload, MetricPayload::StepsToTarget(5.0));
    }
}

#[test]
fn missing_optimizer_metric_is_skipped_without_failing_the_document() {
    let document = json!({
        "tournament_results": [{
            "competitions": [{
                "optimizer_results": {
                    "BO_GP_EI": {"steps_to_target": 7},
                    "RandomSearch": {}
                }
            }]
        }]
    });

    let extraction = extract_observations(
        &document,
        ResultFormat::TopLevelTournaments,
        &hide_label_context(),
    );

    assert_eq!(extraction.observations.len(), 1);
    assert_eq!(extraction.observations[0].optimizer, "BO_GP_EI");
    assert_eq!(extraction.malformed_entries, 0);
}

#[test]
fn malformed_tournament_entries_are_counted_and_skipped() {
    let document = json!({
        "tournament_results": [
            {"optimizer_names": ["BO_GP_EI"]},
            tournament_with_scalar(3.0)
        ]
    });

    let extraction = extract_observations(
        &document,
        ResultFormat::TopLevelTournaments,
        &hide_label_context(),
    );

    assert_eq!(extraction.malformed_entries, 1);
    assert_eq!(extraction.observations.len(), 1);
}

#[test]
fn trajectories_are_sorted_clamped_and_honor_current_best_fallback() {
    let document = json!({
        "tournament_results": [{
            "competitions": [{
                "optimizer_results": {
                    "SBO_GP_PV": {
                        "optimization_history": [
                            {"step": 1, "best_value_so_far": 0.5},
                            {"step": 0, "current_best": 0.2},
                            {"step": 2, "best_value_so_far": 0.4}
                        ]
                    }
                }
            }]
        }]
    });

    let extraction = extract_observations(
        &document,
        ResultFormat::TopLevelTournaments,
        &open_race_context(),
    );

    assert_eq!(extraction.observations.len(), 1);
    assert_eq!(
        extraction.observations[0].payload,
        MetricPayload::Trajectory(vec![(0, 0.2), (1, 0.5), (2, 0.5)])
    );
}

#[test]
fn scalar_stats_use_sample_standard_deviation() {
    let stats = scalar_stats(&[2.0, 4.0]);

    assert_eq!(stats.mean_steps, 3.0);
    assert_eq!(stats.std, 1.414214);
    assert_eq!(stats.min, 2.0);
    assert_eq!(stats.max, 4.0);
    assert_eq!(stats.n, 2);
}

#[test]
fn scalar_stats_of_a_single_observation_have_zero_std() {
    let stats = scalar_stats(&[5.0]);

    assert_eq!(stats.std, 0.0);
    assert_eq!(stats.n, 1);
}

#[test]
fn ragged_trajectories_average_only_where_runs_contribute() {
    let runs = vec![
        vec![(0, 1.0), (1, 2.0), (2, 3.0)],
        vec![(0, 1.0), (1, 3.0)],
    ];

    let trajectory = average_trajectories(&runs);

    assert_eq!(trajectory.steps, vec![0, 1, 2]);
    assert_eq!(trajectory.values, vec![1.0, 2.5, 3.0]);
}

#[test]
fn aggregation_is_insensitive_to_observation_order() {
    let observations = [
        scalar_observation("BO_GP_EI", 2.0),
        scalar_observation("BO_GP_EI", 4.0),
        scalar_observation("RandomSearch", 9.0),
    ];

    let mut forward = Aggregator::default();
    for observation in observations.iter().cloned() {
        forward.insert(observation);
    }

    let mut reversed = Aggregator::default();
    for observation in observations.iter().rev().cloned() {
        reversed.insert(observation);
    }

    let forward_bytes = serde_json::to_vec(&forward.into_summary()).unwrap();
    let reversed_bytes = serde_json::to_vec(&reversed.into_summary()).unwrap();
    assert_eq!(forward_bytes, reversed_bytes);
}

#[test]
fn summary_structure_nests_keys_in_the_agreed_order() {
    let mut aggregator = Aggregator::default();
    aggregator.insert(scalar_observation("BO_GP_EI", 2.0));
    aggregator.insert(scalar_observation("BO_GP_EI", 4.0));

    let summary = serde_json::to_value(aggregator.into_summary()).unwrap();

    assert_eq!(
        summary,
        json!({
            "0.95": {"Regular": {"Hide_The_Label": {"1": {"T_Cell": {
                "BO_GP_EI": {
                    "mean_steps": 3.0,
                    "std": 1.414214,
                    "min": 2.0,
                    "max": 4.0,
                    "n": 2
                }
            }}}}}
        })
    );
}

#[test]
fn rankings_pool_observations_across_configurations() {
    let mut aggregator = Aggregator::default();
    aggregator.insert(scalar_observation("BO_GP_EI", 2.0));
    aggregator.insert(scalar_observation("BO_GP_EI", 4.0));
    aggregator.insert(scalar_observation("RandomSearch", 9.0));

    let (scalar_rankings, trajectory_rankings) = aggregator.rankings();

    assert_eq!(scalar_rankings.len(), 2);
    assert_eq!(scalar_rankings[0].optimizer, "BO_GP_EI");
    assert_eq!(scalar_rankings[0].mean_steps, 3.0);
    assert_eq!(scalar_rankings[1].optimizer, "RandomSearch");
    assert!(trajectory_rankings.is_empty());
}

#[test]
fn unrecognized_documents_skip_while_the_run_continues() {
    let mut aggregator = Aggregator::default();
    let mut counts = SummaryCounts::default();
    let context = hide_label_context();

    let bad = json!({"summary": "nothing recognizable"});
    assert!(matches!(
        process_document(&bad, &context, &mut aggregator, &mut counts),
        Err(PipelineError::UnrecognizedFormat)
    ));

    let good = json!({"tournament_results": [tournament_with_scalar(4.0)]});
    let format = process_document(&good, &context, &mut aggregator, &mut counts).unwrap();

    assert_eq!(format, ResultFormat::TopLevelTournaments);
    assert!(!aggregator.is_empty());
    assert_eq!(counts.observations_extracted, 1);
    assert_eq!(counts.scalar_observations, 1);
}

#[test]
fn empty_grid_paths_list_exactly_the_paths_without_data() {
    let mut aggregator = Aggregator::default();
    aggregator.insert(scalar_observation("BO_GP_EI", 2.0));
    let summary = aggregator.into_summary();

    let config = SummarizeConfig {
        results_root: "Result_Official".into(),
        output_path: "playground_data.json".into(),
        run_report_path: "summary_run.json".into(),
        ranking_limit: 10,
        dataset_prefix_aliases: SummarizeConfig::default_dataset_prefix_aliases(),
        expected_hidden_fractions: SummarizeConfig::default_expected_hidden_fractions(),
        expected_batch_sizes: SummarizeConfig::default_expected_batch_sizes(),
    };

    let empty_paths = empty_grid_paths(&summary, &config);

    // 2 fractions x 2 difficulties x 2 race types x 3 batches, minus the
    // one populated cell.
    assert_eq!(empty_paths.len(), 23);
    assert!(!empty_paths.contains(&"0.95/Regular/Hide_The_Label/Batch1".to_string()));
    assert!(empty_paths.contains(&"0.99/Hard/Open_Race/Batch20".to_string()));
}

#[test]
fn dataset_aliases_map_both_provenance_buckets_to_one_name() {
    let aliases = SummarizeConfig::default_dataset_prefix_aliases();

    let dbo = "DBO_rat_myocyte_Hard_Hide_The_Label_Batch10_Hidden_Percentage_0.95.json";
    let mobo = "MOBO_rat_myocyte_Hard_Hide_The_Label_Batch10_Hidden_Percentage_0.95.json";
    assert_eq!(canonical_dataset(dbo, &aliases).as_deref(), Some("rat_myocyte"));
    assert_eq!(canonical_dataset(mobo, &aliases).as_deref(), Some("rat_myocyte"));

    let tf = "TF_Cell_Easy_Open_Race_Batch1_Hidden_Percentage_0.95.json";
    let t = "T_Cell_Easy_Open_Race_Batch1_Hidden_Percentage_0.95.json";
    assert_eq!(canonical_dataset(tf, &aliases).as_deref(), Some("TF_Cell"));
    assert_eq!(canonical_dataset(t, &aliases).as_deref(), Some("T_Cell"));

    assert_eq!(canonical_dataset("mystery_run_Batch1.json", &aliases), None);
}

#[test]
fn hidden_fractions_render_canonically() {
    assert_eq!(canonical_fraction(95.0 / 100.0), "0.95");
    assert_eq!(canonical_fraction(99.0 / 100.0), "0.99");
    assert_eq!(canonical_fraction(0.5), "0.5");
}
