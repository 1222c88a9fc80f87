use thiserror::Error;

/// Failure modes of the summarization pipeline. `UnrecognizedFormat` is
/// recovered per file and `MalformedEntry` per entry; `EmptyResultSet`
/// aborts the run, since an empty artifact would silently break the
/// consumer.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("document matches none of the known result layouts")]
    UnrecognizedFormat,

    #[error("malformed entry: {0}")]
    MalformedEntry(String),

    #[error("no observations survived across any input file")]
    EmptyResultSet,
}
