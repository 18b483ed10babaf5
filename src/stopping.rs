//! When to stop asking.
//!
//! Rules are checked in a fixed order and the first one that applies wins:
//! the count bounds always dominate the information thresholds.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{validate_nonzero, validate_positive};
use crate::error::ConfigError;
use crate::features::{DimMatrix, NUM_DIMENSIONS};
use crate::fisher::d_efficiency;
use crate::posterior::PosteriorDistribution;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoppingConfig {
    /// Never stop before this many vignettes have been shown.
    pub min_vignettes: usize,
    /// Always stop once this many have been shown.
    pub max_vignettes: usize,
    /// Stop when det(FIM + 1e-8·I) reaches this.
    pub det_threshold: f64,
    /// Stop when every posterior variance is below this.
    pub max_variance_threshold: f64,
}

impl Default for StoppingConfig {
    fn default() -> Self {
        Self {
            min_vignettes: 10,
            max_vignettes: 24,
            det_threshold: 50.0,
            max_variance_threshold: 0.15,
        }
    }
}

impl StoppingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_nonzero("stopping.max_vignettes", self.max_vignettes)?;
        if self.min_vignettes > self.max_vignettes {
            return Err(ConfigError::InvertedBounds {
                min: self.min_vignettes,
                max: self.max_vignettes,
            });
        }
        validate_positive("stopping.det_threshold", self.det_threshold)?;
        validate_positive("stopping.max_variance_threshold", self.max_variance_threshold)?;
        Ok(())
    }
}

/// The rule that decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopRule {
    BelowMinimum,
    ReachedMaximum,
    DeterminantThreshold,
    VarianceThreshold,
    NeedsMoreInformation,
}

impl StopRule {
    pub fn should_stop(self) -> bool {
        matches!(
            self,
            StopRule::ReachedMaximum | StopRule::DeterminantThreshold | StopRule::VarianceThreshold
        )
    }
}

impl fmt::Display for StopRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopRule::BelowMinimum => "minimum vignette count not reached",
            StopRule::ReachedMaximum => "maximum vignette count reached",
            StopRule::DeterminantThreshold => "information determinant threshold reached",
            StopRule::VarianceThreshold => "posterior variance below threshold",
            StopRule::NeedsMoreInformation => "more information needed",
        };
        f.write_str(s)
    }
}

/// Observability snapshot, computed the same way whatever rule fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoppingDiagnostics {
    pub n_shown: usize,
    pub determinant: f64,
    pub variances: [f64; NUM_DIMENSIONS],
    pub max_variance: f64,
    pub rule: StopRule,
}

fn decide(cfg: &StoppingConfig, n_shown: usize, determinant: f64, max_variance: f64) -> StopRule {
    if n_shown < cfg.min_vignettes {
        StopRule::BelowMinimum
    } else if n_shown >= cfg.max_vignettes {
        StopRule::ReachedMaximum
    } else if determinant >= cfg.det_threshold {
        StopRule::DeterminantThreshold
    } else if max_variance < cfg.max_variance_threshold {
        StopRule::VarianceThreshold
    } else {
        StopRule::NeedsMoreInformation
    }
}

pub fn diagnostics(
    posterior: &PosteriorDistribution,
    cumulative_fim: &DimMatrix,
    n_shown: usize,
    cfg: &StoppingConfig,
) -> StoppingDiagnostics {
    let determinant = d_efficiency(cumulative_fim);
    let variances = posterior.variances();
    let max_variance = posterior.max_variance();
    StoppingDiagnostics {
        n_shown,
        determinant,
        variances,
        max_variance,
        rule: decide(cfg, n_shown, determinant, max_variance),
    }
}

/// Returns (continue?, rule that decided).
pub fn should_continue(
    posterior: &PosteriorDistribution,
    cumulative_fim: &DimMatrix,
    n_shown: usize,
    cfg: &StoppingConfig,
) -> (bool, StopRule) {
    let rule = diagnostics(posterior, cumulative_fim, n_shown, cfg).rule;
    (!rule.should_stop(), rule)
}
