/// Errors returned by the proposal engine.
///
/// Every variant is a local precondition violation reported at the call
/// that detected it. Nothing is retried internally: relaxing a filter or
/// resampling after [`Error::DegenerateCandidateSet`] is the caller's call.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a lower bound is not strictly less than its upper bound.
    #[error("invalid bounds in dimension {dim}: lower ({lower}) must be less than upper ({upper})")]
    InvalidBounds {
        /// The offending dimension.
        dim: usize,
        /// The lower bound value.
        lower: f64,
        /// The upper bound value.
        upper: f64,
    },

    /// Returned when vector lengths disagree, or a space has zero dimensions.
    #[error("invalid dimension: expected {expected}, got {got}")]
    InvalidDimension {
        /// The expected number of components.
        expected: usize,
        /// The actual number of components.
        got: usize,
    },

    /// Returned when surrogate hyperparameters or their ranges are inconsistent.
    #[error("invalid hyperparameters: {0}")]
    InvalidHyperparameters(String),

    /// Returned when there are too few observations to proceed.
    #[error("insufficient data: need at least {required} observations, got {got}")]
    InsufficientData {
        /// The minimum number of observations.
        required: usize,
        /// The number of observations provided.
        got: usize,
    },

    /// Returned when a trust region anchor lies outside the global bounds.
    #[error("anchor out of bounds in dimension {dim}: {value} is not in [{lower}, {upper}]")]
    AnchorOutOfBounds {
        /// The offending dimension.
        dim: usize,
        /// The anchor coordinate.
        value: f64,
        /// The global lower bound.
        lower: f64,
        /// The global upper bound.
        upper: f64,
    },

    /// Returned when edge and novelty filtering leave no candidates.
    #[error(
        "degenerate candidate set: {generated} generated, {after_edge} inside the edge margin, {after_novelty} novel"
    )]
    DegenerateCandidateSet {
        /// Candidates produced by the design.
        generated: usize,
        /// Candidates remaining after the edge-margin filter.
        after_edge: usize,
        /// Candidates remaining after the novelty filter.
        after_novelty: usize,
    },

    /// Returned when a trust region length factor is negative or NaN.
    #[error("invalid trust region length: {0} must be non-negative")]
    InvalidLength(f64),

    /// Returned when observations or training data contain non-finite values.
    #[error("invalid data: {0}")]
    InvalidData(&'static str),

    /// Returned when every likelihood optimization run hit a singular kernel matrix.
    #[error("kernel matrix is ill-conditioned: all {attempts} optimization runs failed")]
    IllConditioned {
        /// The number of runs attempted.
        attempts: usize,
    },

    /// Returned when a proposer setting is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// Returned when parsing an acquisition strategy name fails.
    #[error("unknown acquisition strategy: '{0}'")]
    UnknownStrategy(String),
}

/// Result alias for this crate's [`Error`].
pub type Result<T> = core::result::Result<T, Error>;
