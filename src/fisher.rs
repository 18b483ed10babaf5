//! Fisher information for the binary logit and D-efficiency scores.
//!
//! Information is additive across vignettes, so the cumulative matrix of a
//! session is the prior precision plus one rank-1 term per vignette shown.

use crate::features::{DimMatrix, FeatureVector};
use crate::likelihood::{choice_probabilities, Contrast};

/// Ridge added before taking determinants.
pub const DET_RIDGE: f64 = 1e-8;

/// Per-vignette information at β: p_A·p_B·d·dᵀ with d = x_A − x_B.
pub fn vignette_fim(contrast: &Contrast, beta: &FeatureVector) -> DimMatrix {
    let (p_a, p_b) = choice_probabilities(contrast, beta, 1.0);
    let d = contrast.diff();
    (d * d.transpose()) * (p_a * p_b)
}

/// Information contributed by the prior: I / prior_variance.
pub fn prior_fim(prior_variance: f64) -> DimMatrix {
    DimMatrix::identity() / prior_variance.max(f64::MIN_POSITIVE)
}

/// det(FIM + 1e-8·I), with non-finite or negative results clamped to 0.
pub fn d_efficiency(fim: &DimMatrix) -> f64 {
    let det = (fim + DimMatrix::identity() * DET_RIDGE).determinant();
    if det.is_finite() && det > 0.0 {
        det
    } else {
        0.0
    }
}

/// Cumulative matrix after adding `candidate`, and the determinant increase.
pub fn expected_fim(
    candidate: &Contrast,
    posterior_mean: &FeatureVector,
    current_fim: &DimMatrix,
) -> (DimMatrix, f64) {
    let updated = current_fim + vignette_fim(candidate, posterior_mean);
    let gain = d_efficiency(&updated) - d_efficiency(current_fim);
    (updated, clamp_gain(gain))
}

/// Like [`expected_fim`], but scales the increase by
/// (1 + dᵀ·(Σ + 1e-8·I)·d), favoring contrasts along uncertain directions.
///
/// Heuristic; not the posterior-predictive integral of textbook Bayesian
/// D-optimality.
pub fn bayesian_expected_fim(
    candidate: &Contrast,
    posterior_mean: &FeatureVector,
    posterior_covariance: &DimMatrix,
    current_fim: &DimMatrix,
) -> (DimMatrix, f64) {
    let (updated, gain) = expected_fim(candidate, posterior_mean, current_fim);
    let d = candidate.diff();
    let cov_reg = posterior_covariance + DimMatrix::identity() * DET_RIDGE;
    let directional = d.dot(&(cov_reg * d));
    let weight = if directional.is_finite() {
        1.0 + directional.max(0.0)
    } else {
        1.0
    };
    (updated, clamp_gain(gain * weight))
}

fn clamp_gain(gain: f64) -> f64 {
    if gain.is_finite() {
        gain
    } else {
        0.0
    }
}
