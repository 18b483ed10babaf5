#![forbid(unsafe_code)]

//! # elicit-harness
//!
//! Adaptive elicitation of job preferences from forced binary choices.
//!
//! A respondent answers a sequence of "job A or job B?" vignettes. Each
//! answer updates a Laplace-approximated Gaussian posterior over a
//! 7-dimensional preference vector; the next vignette is the candidate that
//! maximizes the expected increase in det(Fisher information), and the
//! session stops once the information or the posterior variances are good
//! enough. Candidate vignettes are precomputed offline from a full-factorial
//! profile design, filtered for dominance and optimized for D-efficiency
//! and diversity.

pub mod catalog;
pub mod config;
pub mod error;
pub mod features;
pub mod fisher;
pub mod likelihood;
pub mod offline;
pub mod phase;
pub mod posterior;
pub mod selector;
pub mod simulation;
pub mod stopping;

pub use catalog::{CatalogManifest, Vignette, VignetteCatalogs, VignetteOption};
pub use config::EngineConfig;
pub use error::{CatalogError, ConfigError, EngineError};
pub use features::{encode_profile, Dimension, DimMatrix, FeatureVector, JobProfile};
pub use fisher::{bayesian_expected_fim, d_efficiency, expected_fim, prior_fim, vignette_fim};
pub use likelihood::{choice_likelihood, choice_probabilities, Choice, Contrast};
pub use offline::{build_catalogs, build_catalogs_seeded, BuildReport, OfflineConfig};
pub use phase::{NextVignette, Phase, Session};
pub use posterior::{
    init_posterior, update, update_posterior, DerivativeMode, Observation, PosteriorDistribution,
    PosteriorManager, PriorConfig, UpdateConfig, UpdateOutcome,
};
pub use selector::{select_next, Selection};
pub use stopping::{should_continue, StopRule, StoppingConfig, StoppingDiagnostics};
