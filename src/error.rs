use thiserror::Error;

/// Error types for the fastleiden library
#[derive(Error, Debug)]
pub enum ClusterError {
    /// Input matrix contains NaN or infinite values
    #[error("Non-finite input: {0}")]
    NonFiniteInput(String),

    /// Input matrix has no rows or no columns
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// The requested neighbor count is invalid (must satisfy 1 <= k < n)
    #[error("Invalid neighbor count: {0}")]
    InvalidNeighborCount(String),

    /// The resolution parameter is invalid (must be > 0)
    #[error("Invalid resolution: {0}")]
    InvalidResolution(String),

    /// The graph handed to the partitioner has no vertices
    #[error("Cannot partition an empty graph")]
    EmptyGraph,

    /// Unrecognized distance metric name
    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    /// Unrecognized quality function name
    #[error("Unknown quality function: {0}")]
    UnknownQuality(String),
}
