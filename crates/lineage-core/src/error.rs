use thiserror::Error;

/// Top-level error type for lineage capture.
#[derive(Error, Debug)]
pub enum LineageError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown sink: {0}")]
    UnknownSink(String),

    #[error("Sink error: {source}")]
    Sink {
        sink: String,
        #[source]
        source: StoreError,
    },

    /// `lineage.runsql.enable` is false: lineage was recorded but the query
    /// itself must not run.
    #[error("lineage.runsql.enable is false, job not run")]
    PolicyAbort,
}

/// Errors raised by an edge sink.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Sink initialization failed: {0}")]
    Init(String),

    #[error("Sink write failed: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
