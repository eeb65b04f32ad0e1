//! Error taxonomy shared by every module of the crate.

use thiserror::Error;

pub type Result<T> = core::result::Result<T, NeatError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NeatError {
    /// self-loops, unknown nodes, genes pointing outside their genotype
    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// carries the two run ids that were combined
    #[error("run {left} cannot be combined with run {right}")]
    CrossRunMismatch { left: u64, right: u64 },

    #[error("no run configuration is available")]
    ConfigMissing,

    #[error("invalid run configuration: {0}")]
    InvalidConfig(String),

    #[error("population holds {found} individuals, but the configured size is {expected}")]
    SizeInconsistency { expected: usize, found: usize },

    /// The last relaxed outputs are kept so callers may still inspect them
    #[error("relaxation did not converge within {iterations} sweeps")]
    ConvergenceFailure { iterations: usize, outputs: Vec<f64> },

    #[error("expected {expected} input values, got {found}")]
    ArityMismatch { expected: usize, found: usize },

    #[error("{entity} {id} does not exist")]
    NotFound { entity: &'static str, id: usize },

    #[error("cannot reproduce: {0}")]
    Reproduction(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<serde_json::Error> for NeatError {
    fn from(err: serde_json::Error) -> Self {
        NeatError::Json(err.to_string())
    }
}

impl From<std::io::Error> for NeatError {
    fn from(err: std::io::Error) -> Self {
        NeatError::Io(err.to_string())
    }
}
