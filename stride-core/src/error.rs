//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug, PartialEq)]
pub enum StrideError {
    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),

    /// The batch cannot be split into equally sized minibatches.
    #[error("batch size {batch_size} is not divisible by the number of minibatches {num_minibatches}")]
    IndivisibleBatch {
        /// Number of samples in a batch.
        batch_size: usize,

        /// Requested number of minibatches.
        num_minibatches: usize,
    },

    /// Invalid configuration detected before training.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Parameters of an action distribution contain NaN or infinity.
    ///
    /// `values` holds `(index, value)` of the offending entries in the flattened tensor.
    #[error("Non-finite distribution parameter {name}: {values:?}")]
    NonFiniteParameter {
        /// Name of the parameter, e.g. `alpha`.
        name: String,

        /// Offending entries.
        values: Vec<(usize, f32)>,
    },

    /// Shape of an array does not match the expected one.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Expected shape.
        expected: Vec<usize>,

        /// Actual shape.
        actual: Vec<usize>,
    },
}
