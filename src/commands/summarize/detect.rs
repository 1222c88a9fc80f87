use serde_json::Value;

use super::error::PipelineError;

/// The five known result-file layouts. Conceptually the same data, nested
/// five incompatible ways by successive generations of the benchmarking
/// harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultFormat {
    /// Pre-compiled per-configuration analysis file with aggregated
    /// optimizer stats under `items[].data.optimizer_stats`.
    CompiledAnalysis,
    /// `results.all_tournament_results` array.
    NestedAllTournaments,
    /// `results.tournament_results` array.
    NestedTournaments,
    /// Top-level `all_tournament_results` array.
    TopLevelAllTournaments,
    /// Top-level `tournament_results` array.
    TopLevelTournaments,
}

impl ResultFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CompiledAnalysis => "compiled_analysis",
            Self::NestedAllTournaments => "nested_all_tournaments",
            Self::NestedTournaments => "nested_tournaments",
            Self::TopLevelAllTournaments => "top_level_all_tournaments",
            Self::TopLevelTournaments => "top_level_tournaments",
        }
    }
}

/// Classifies a raw result document by structural probing.
///
/// The probe order is load-bearing: the signatures are not mutually
/// exclusive under single-key checks (a document carrying a `results`
/// wrapper may also carry stray top-level keys), so the most specific
/// combination is tested first.
pub fn detect_format(document: &Value) -> Result<ResultFormat, PipelineError> {
    if document.get("type").and_then(Value::as_str) == Some("analysis")
        && document.get("items").is_some_and(Value::is_array)
    {
        return Ok(ResultFormat::CompiledAnalysis);
    }

    if nested_array(document, "results", "all_tournament_results") {
        return Ok(ResultFormat::NestedAllTournaments);
    }

    if nested_array(document, "results", "tournament_results") {
        return Ok(ResultFormat::NestedTournaments);
    }

    if document
        .get("all_tournament_results")
        .is_some_and(Value::is_array)
    {
        return Ok(ResultFormat::TopLevelAllTournaments);
    }

    if document
        .get("tournament_results")
        .is_some_and(Value::is_array)
    {
        return Ok(ResultFormat::TopLevelTournaments);
    }

    Err(PipelineError::UnrecognizedFormat)
}

fn nested_array(document: &Value, outer: &str, inner: &str) -> bool {
    document
        .get(outer)
        .and_then(|wrapper| wrapper.get(inner))
        .is_some_and(Value::is_array)
}
