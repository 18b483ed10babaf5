//! Error types for the elicitation engine.
//!
//! Numerical degeneracy (singular Hessians, empty design rounds) is not an
//! error: it is reported through [`crate::posterior::UpdateOutcome`] and the
//! offline [`crate::offline::BuildReport`]. The variants here cover inputs
//! the engine cannot interpret at all.

use std::path::PathBuf;

use thiserror::Error;

/// Validation failures at the runtime API boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A vignette must resolve to exactly two options.
    #[error("vignette {vignette_id} has {count} options; exactly two are required")]
    InvalidVignette { vignette_id: String, count: usize },

    /// The chosen option id is not one of the vignette's options.
    #[error("vignette {vignette_id} has no option {option_id:?}")]
    UnknownOption {
        vignette_id: String,
        option_id: String,
    },

    /// Dimension index outside 0..7.
    #[error("dimension index {index} out of range (0..{max})")]
    DimensionOutOfRange { index: usize, max: usize },

    /// Prior covariance must be symmetric positive definite.
    #[error("prior covariance is not positive definite")]
    InvalidPrior,

    /// A stored posterior carried NaN or infinite entries.
    #[error("posterior has non-finite {field}")]
    NonFinitePosterior { field: &'static str },
}

/// Setup-time misconfiguration. Raised by `validate()`, never defaulted away.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be {requirement} (got {value})")]
    OutOfRange {
        field: &'static str,
        requirement: &'static str,
        value: f64,
    },

    #[error("{field} must be positive")]
    NonPositive { field: &'static str },

    #[error("min_vignettes ({min}) exceeds max_vignettes ({max})")]
    InvertedBounds { min: usize, max: usize },

    #[error("num_beginning ({beginning}) exceeds num_static ({total})")]
    BeginningExceedsStatic { beginning: usize, total: usize },

    #[error("attribute specification is empty")]
    EmptyAttributes,

    #[error("attribute {name} declares no levels")]
    EmptyLevels { name: String },

    #[error("attribute {name} is declared more than once")]
    DuplicateAttribute { name: String },

    #[error("attribute {name}: binary attributes take levels {{0, 1}} only")]
    InvalidBinaryLevels { name: String },

    #[error("profile count {count} exceeds the limit of {limit}")]
    TooManyProfiles { count: u128, limit: usize },
}

/// Reading or writing persisted catalogs, configs and attribute specs.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize catalog: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
