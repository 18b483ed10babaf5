//! Laplace-approximated Gaussian posterior over preference weights.
//!
//! Each observation is folded in with one MAP solve: the incoming posterior
//! plays the role of the Gaussian prior, Newton-Raphson finds the mode of
//! prior × likelihood, and the negative inverse Hessian at the mode becomes
//! the new covariance.
//!
//! Implementation notes:
//! - Likelihood derivatives are closed-form by default. The finite-difference
//!   path (central gradient, 4-point Hessian stencil, ε = 1e-5) is kept as
//!   [`DerivativeMode::FiniteDifference`] for parity runs.
//! - A singular Hessian never panics: Newton keeps its last iterate and the
//!   covariance step falls back to the incoming covariance, reported as
//!   [`UpdateOutcome::Degenerate`].

use nalgebra::{Cholesky, SymmetricEigen};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::Vignette;
use crate::config::validate_positive;
use crate::error::{ConfigError, EngineError};
use crate::features::{DimMatrix, FeatureVector, NUM_DIMENSIONS};
use crate::fisher::vignette_fim;
use crate::likelihood::{
    log_likelihood, log_likelihood_gradient, log_likelihood_hessian, Choice, Contrast,
};

/// Smallest eigenvalue tolerated before the covariance is regularized.
pub const MIN_EIGENVALUE: f64 = 1e-8;
/// Ridge added to an ill-conditioned covariance.
pub const COVARIANCE_RIDGE: f64 = 1e-6;

// ---------------------------------------------------------------------
//  Config
// ---------------------------------------------------------------------

/// Session prior: mean vector and isotropic variance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorConfig {
    pub mean: [f64; NUM_DIMENSIONS],
    /// Prior covariance is `variance · I`; the prior FIM is `I / variance`.
    pub variance: f64,
}

impl Default for PriorConfig {
    fn default() -> Self {
        Self {
            mean: [0.0; NUM_DIMENSIONS],
            variance: 1.0,
        }
    }
}

impl PriorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_positive("prior.variance", self.variance)?;
        if self.mean.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::OutOfRange {
                field: "prior.mean",
                requirement: "finite",
                value: f64::NAN,
            });
        }
        Ok(())
    }

    pub fn mean_vector(&self) -> FeatureVector {
        FeatureVector::from_column_slice(&self.mean)
    }
}

/// How ∇logL and ∇²logL are evaluated inside Newton-Raphson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivativeMode {
    #[default]
    Analytic,
    FiniteDifference,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// Logit temperature T.
    pub temperature: f64,
    pub derivative_mode: DerivativeMode,
    /// Newton-Raphson iteration cap.
    pub max_iterations: usize,
    /// Stop once ‖Δβ‖ falls below this.
    pub tolerance: f64,
    /// Step for the finite-difference derivatives.
    pub finite_difference_step: f64,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            derivative_mode: DerivativeMode::Analytic,
            max_iterations: 50,
            tolerance: 1e-6,
            finite_difference_step: 1e-5,
        }
    }
}

impl UpdateConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_positive("likelihood.temperature", self.temperature)?;
        validate_positive("likelihood.tolerance", self.tolerance)?;
        validate_positive("likelihood.finite_difference_step", self.finite_difference_step)?;
        if self.max_iterations == 0 {
            return Err(ConfigError::NonPositive {
                field: "likelihood.max_iterations",
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------
//  Posterior
// ---------------------------------------------------------------------

/// Gaussian belief over β. The covariance is always symmetric and has
/// eigenvalues of at least 1e-8 (otherwise a 1e-6 ridge is added).
///
/// Deserialization goes through the same conditioning as [`Self::new`], and
/// rejects non-finite entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredPosterior")]
pub struct PosteriorDistribution {
    mean: FeatureVector,
    covariance: DimMatrix,
}

#[derive(Deserialize)]
struct StoredPosterior {
    mean: FeatureVector,
    covariance: DimMatrix,
}

impl TryFrom<StoredPosterior> for PosteriorDistribution {
    type Error = EngineError;

    fn try_from(stored: StoredPosterior) -> Result<Self, Self::Error> {
        if stored.mean.iter().any(|v| !v.is_finite()) {
            return Err(EngineError::NonFinitePosterior { field: "mean" });
        }
        if stored.covariance.iter().any(|v| !v.is_finite()) {
            return Err(EngineError::NonFinitePosterior {
                field: "covariance",
            });
        }
        Ok(Self::new(stored.mean, stored.covariance))
    }
}

impl PosteriorDistribution {
    pub fn new(mean: FeatureVector, covariance: DimMatrix) -> Self {
        Self {
            mean,
            covariance: condition_covariance(covariance),
        }
    }

    pub fn from_config(prior: &PriorConfig) -> Self {
        Self::new(
            prior.mean_vector(),
            DimMatrix::identity() * prior.variance,
        )
    }

    pub fn mean(&self) -> &FeatureVector {
        &self.mean
    }

    pub fn covariance(&self) -> &DimMatrix {
        &self.covariance
    }

    pub fn variance(&self, dim: usize) -> Result<f64, EngineError> {
        check_dim(dim)?;
        Ok(self.covariance[(dim, dim)])
    }

    pub fn correlation(&self, dim1: usize, dim2: usize) -> Result<f64, EngineError> {
        check_dim(dim1)?;
        check_dim(dim2)?;
        let denom = (self.covariance[(dim1, dim1)] * self.covariance[(dim2, dim2)]).sqrt();
        if denom <= 0.0 || !denom.is_finite() {
            return Ok(0.0);
        }
        Ok(self.covariance[(dim1, dim2)] / denom)
    }

    pub fn variances(&self) -> [f64; NUM_DIMENSIONS] {
        std::array::from_fn(|i| self.covariance[(i, i)])
    }

    pub fn max_variance(&self) -> f64 {
        self.variances().into_iter().fold(f64::NEG_INFINITY, f64::max)
    }
}

fn check_dim(dim: usize) -> Result<(), EngineError> {
    if dim >= NUM_DIMENSIONS {
        return Err(EngineError::DimensionOutOfRange {
            index: dim,
            max: NUM_DIMENSIONS,
        });
    }
    Ok(())
}

fn symmetrize(m: &DimMatrix) -> DimMatrix {
    (m + m.transpose()) * 0.5
}

/// Non-finite matrices pass through unchanged; `update_posterior` then
/// reports them as [`DegenerateReason::SingularPrior`].
fn condition_covariance(cov: DimMatrix) -> DimMatrix {
    let sym = symmetrize(&cov);
    if sym.iter().any(|v| !v.is_finite()) {
        return sym;
    }
    let min_eig = SymmetricEigen::new(sym)
        .eigenvalues
        .iter()
        .copied()
        .fold(f64::INFINITY, f64::min);
    if min_eig < MIN_EIGENVALUE {
        sym + DimMatrix::identity() * COVARIANCE_RIDGE
    } else {
        sym
    }
}

fn invert(m: &DimMatrix) -> Option<DimMatrix> {
    let inv = m.try_inverse()?;
    if inv.iter().all(|v| v.is_finite()) {
        Some(inv)
    } else {
        None
    }
}

/// Build a posterior from an explicit prior.
///
/// Fails if the covariance is not symmetric positive definite.
pub fn init_posterior(
    prior_mean: [f64; NUM_DIMENSIONS],
    prior_cov: [[f64; NUM_DIMENSIONS]; NUM_DIMENSIONS],
) -> Result<PosteriorDistribution, EngineError> {
    let mean = FeatureVector::from_column_slice(&prior_mean);
    let cov = DimMatrix::from_fn(|i, j| prior_cov[i][j]);
    if mean.iter().chain(cov.iter()).any(|v| !v.is_finite()) {
        return Err(EngineError::InvalidPrior);
    }
    if (cov - cov.transpose()).abs().max() > 1e-9 || Cholesky::new(cov).is_none() {
        return Err(EngineError::InvalidPrior);
    }
    Ok(PosteriorDistribution::new(mean, cov))
}

// ---------------------------------------------------------------------
//  Update
// ---------------------------------------------------------------------

/// One answered vignette, already encoded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub contrast: Contrast,
    pub choice: Choice,
}

impl Observation {
    pub fn new(contrast: Contrast, choice: Choice) -> Self {
        Self { contrast, choice }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegenerateReason {
    /// The incoming covariance could not be inverted into a precision.
    SingularPrior,
    /// The Hessian at the MAP estimate could not be inverted.
    SingularHessian,
}

/// Result of folding one observation into the posterior.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    Updated(PosteriorDistribution),
    /// The update could not be completed. `posterior` holds the best
    /// available estimate: the last valid Newton iterate with the incoming
    /// covariance.
    Degenerate {
        posterior: PosteriorDistribution,
        reason: DegenerateReason,
    },
}

impl UpdateOutcome {
    pub fn posterior(&self) -> &PosteriorDistribution {
        match self {
            UpdateOutcome::Updated(p) => p,
            UpdateOutcome::Degenerate { posterior, .. } => posterior,
        }
    }

    pub fn into_posterior(self) -> PosteriorDistribution {
        match self {
            UpdateOutcome::Updated(p) => p,
            UpdateOutcome::Degenerate { posterior, .. } => posterior,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        matches!(self, UpdateOutcome::Degenerate { .. })
    }
}

struct LogLikelihood<'a> {
    obs: &'a Observation,
    cfg: &'a UpdateConfig,
}

impl LogLikelihood<'_> {
    fn value(&self, beta: &FeatureVector) -> f64 {
        log_likelihood(&self.obs.contrast, beta, self.obs.choice, self.cfg.temperature)
    }

    fn gradient(&self, beta: &FeatureVector) -> FeatureVector {
        match self.cfg.derivative_mode {
            DerivativeMode::Analytic => log_likelihood_gradient(
                &self.obs.contrast,
                beta,
                self.obs.choice,
                self.cfg.temperature,
            ),
            DerivativeMode::FiniteDifference => {
                let eps = self.cfg.finite_difference_step;
                FeatureVector::from_fn(|i, _| {
                    let mut up = *beta;
                    let mut down = *beta;
                    up[i] += eps;
                    down[i] -= eps;
                    (self.value(&up) - self.value(&down)) / (2.0 * eps)
                })
            }
        }
    }

    fn hessian(&self, beta: &FeatureVector) -> DimMatrix {
        match self.cfg.derivative_mode {
            DerivativeMode::Analytic => {
                log_likelihood_hessian(&self.obs.contrast, beta, self.cfg.temperature)
            }
            DerivativeMode::FiniteDifference => {
                let eps = self.cfg.finite_difference_step;
                let at = |di: f64, i: usize, dj: f64, j: usize| {
                    let mut b = *beta;
                    b[i] += di;
                    b[j] += dj;
                    self.value(&b)
                };
                let mut h = DimMatrix::zeros();
                for i in 0..NUM_DIMENSIONS {
                    for j in i..NUM_DIMENSIONS {
                        let v = (at(eps, i, eps, j) - at(eps, i, -eps, j) - at(-eps, i, eps, j)
                            + at(-eps, i, -eps, j))
                            / (4.0 * eps * eps);
                        h[(i, j)] = v;
                        h[(j, i)] = v;
                    }
                }
                h
            }
        }
    }
}

/// Newton-Raphson summary for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapEstimate {
    pub beta: FeatureVector,
    pub iterations: usize,
    pub converged: bool,
    /// Newton stopped early on a singular Hessian or a non-finite step.
    /// `beta` is the last finite iterate.
    pub aborted: bool,
}

fn find_map(
    prior_mean: &FeatureVector,
    prior_precision: &DimMatrix,
    ll: &LogLikelihood<'_>,
    cfg: &UpdateConfig,
) -> MapEstimate {
    let mut beta = *prior_mean;
    let mut converged = false;
    let mut aborted = false;
    let mut iterations = 0;

    for _ in 0..cfg.max_iterations {
        let grad = -(prior_precision * (beta - prior_mean)) + ll.gradient(&beta);
        let hess = -prior_precision + ll.hessian(&beta);
        let Some(hess_inv) = invert(&hess) else {
            aborted = true;
            break;
        };
        let step = hess_inv * grad;
        let next = beta - step;
        if next.iter().any(|v| !v.is_finite()) {
            aborted = true;
            break;
        }
        beta = next;
        iterations += 1;
        if step.norm() < cfg.tolerance {
            converged = true;
            break;
        }
    }

    MapEstimate {
        beta,
        iterations,
        converged,
        aborted,
    }
}

/// Fold one observation into `posterior`.
pub fn update_posterior(
    posterior: &PosteriorDistribution,
    observation: &Observation,
    cfg: &UpdateConfig,
) -> UpdateOutcome {
    let Some(prior_precision) = invert(&posterior.covariance) else {
        warn!("posterior covariance is singular; keeping previous estimate");
        return UpdateOutcome::Degenerate {
            posterior: posterior.clone(),
            reason: DegenerateReason::SingularPrior,
        };
    };

    let ll = LogLikelihood {
        obs: observation,
        cfg,
    };
    let map = find_map(&posterior.mean, &prior_precision, &ll, cfg);
    debug!(
        iterations = map.iterations,
        converged = map.converged,
        aborted = map.aborted,
        "newton-raphson finished"
    );

    laplace_at(&map.beta, &prior_precision, &ll, posterior)
}

/// Covariance step: −H⁻¹ at `beta`, or the previous covariance when H is
/// singular.
fn laplace_at(
    beta: &FeatureVector,
    prior_precision: &DimMatrix,
    ll: &LogLikelihood<'_>,
    previous: &PosteriorDistribution,
) -> UpdateOutcome {
    let hess = -prior_precision + ll.hessian(beta);
    match invert(&hess) {
        Some(h_inv) => UpdateOutcome::Updated(PosteriorDistribution::new(*beta, -h_inv)),
        None => {
            warn!("hessian at MAP is singular; retaining previous covariance");
            UpdateOutcome::Degenerate {
                posterior: PosteriorDistribution::new(*beta, previous.covariance),
                reason: DegenerateReason::SingularHessian,
            }
        }
    }
}

/// Runtime entry point: update the posterior and the cumulative FIM with one
/// answered catalog vignette.
///
/// The FIM contribution is evaluated at the updated posterior mean.
pub fn update(
    posterior: &PosteriorDistribution,
    cumulative_fim: &DimMatrix,
    vignette: &Vignette,
    chosen_option: &str,
    cfg: &UpdateConfig,
) -> Result<(UpdateOutcome, DimMatrix), EngineError> {
    let contrast = vignette.contrast()?;
    let choice = vignette.resolve_choice(chosen_option)?;
    let outcome = update_posterior(posterior, &Observation::new(contrast, choice), cfg);
    let fim = cumulative_fim + vignette_fim(&contrast, outcome.posterior().mean());
    Ok((outcome, fim))
}

/// Session-owned wrapper that keeps the starting prior next to the current
/// posterior.
#[derive(Debug, Clone)]
pub struct PosteriorManager {
    prior: PosteriorDistribution,
    current: PosteriorDistribution,
    cfg: UpdateConfig,
    degenerate_updates: usize,
}

impl PosteriorManager {
    pub fn new(prior: PosteriorDistribution, cfg: UpdateConfig) -> Self {
        Self {
            current: prior.clone(),
            prior,
            cfg,
            degenerate_updates: 0,
        }
    }

    pub fn prior(&self) -> &PosteriorDistribution {
        &self.prior
    }

    pub fn current(&self) -> &PosteriorDistribution {
        &self.current
    }

    pub fn degenerate_updates(&self) -> usize {
        self.degenerate_updates
    }

    pub fn observe(&mut self, observation: &Observation) -> &PosteriorDistribution {
        let outcome = update_posterior(&self.current, observation, &self.cfg);
        if outcome.is_degenerate() {
            self.degenerate_updates += 1;
        }
        self.current = outcome.into_posterior();
        &self.current
    }

    pub fn variance(&self, dim: usize) -> Result<f64, EngineError> {
        self.current.variance(dim)
    }

    pub fn correlation(&self, dim1: usize, dim2: usize) -> Result<f64, EngineError> {
        self.current.correlation(dim1, dim2)
    }

    pub fn reset(&mut self) {
        self.current = self.prior.clone();
        self.degenerate_updates = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_contrast(dim: usize) -> Contrast {
        let mut x_a = FeatureVector::zeros();
        x_a[dim] = 1.0;
        Contrast::new(x_a, FeatureVector::zeros())
    }

    #[test]
    fn covariance_is_regularized_when_ill_conditioned() {
        let mut cov = DimMatrix::identity();
        cov[(6, 6)] = 0.0;
        let p = PosteriorDistribution::new(FeatureVector::zeros(), cov);
        assert!((p.variance(6).unwrap() - COVARIANCE_RIDGE).abs() < 1e-15);
        assert!((p.variance(0).unwrap() - (1.0 + COVARIANCE_RIDGE)).abs() < 1e-15);
    }

    #[test]
    fn covariance_is_symmetrized() {
        let mut cov = DimMatrix::identity();
        cov[(0, 1)] = 0.2;
        cov[(1, 0)] = 0.4;
        let p = PosteriorDistribution::new(FeatureVector::zeros(), cov);
        assert!((p.covariance()[(0, 1)] - 0.3).abs() < 1e-15);
        assert_eq!(p.covariance()[(0, 1)], p.covariance()[(1, 0)]);
    }

    #[test]
    fn accessors_reject_out_of_range_dimensions() {
        let p = PosteriorDistribution::from_config(&PriorConfig::default());
        assert!(p.variance(7).is_err());
        assert!(p.correlation(0, 9).is_err());
        assert_eq!(p.correlation(0, 1).unwrap(), 0.0);
        assert!((p.correlation(2, 2).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn init_posterior_rejects_indefinite_covariance() {
        let mut cov = [[0.0; 7]; 7];
        for (i, row) in cov.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        assert!(init_posterior([0.0; 7], cov).is_ok());
        cov[3][3] = -1.0;
        assert!(matches!(init_posterior([0.0; 7], cov), Err(EngineError::InvalidPrior)));
    }

    #[test]
    fn choosing_a_moves_weight_toward_contrast() {
        let prior = PosteriorDistribution::from_config(&PriorConfig::default());
        let obs = Observation::new(unit_contrast(2), Choice::A);
        let out = update_posterior(&prior, &obs, &UpdateConfig::default());
        assert!(!out.is_degenerate());
        let post = out.posterior();
        assert!(post.mean()[2] > 0.0);
        assert!(post.variance(2).unwrap() < 1.0);
        // Untouched dimensions keep their prior.
        assert!(post.mean()[0].abs() < 1e-12);
        assert!((post.variance(0).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn analytic_and_finite_difference_agree() {
        let prior = PosteriorDistribution::new(
            FeatureVector::repeat(0.2),
            DimMatrix::identity() * 1.5,
        );
        let contrast = Contrast::new(
            FeatureVector::from_column_slice(&[0.5, 0.7, 1.0, 0.5, 0.0, 1.0, 0.0]),
            FeatureVector::from_column_slice(&[0.3, 0.2, 0.0, 1.0, 1.0, 0.5, 1.0]),
        );
        let obs = Observation::new(contrast, Choice::B);
        let analytic = update_posterior(&prior, &obs, &UpdateConfig::default());
        let fd_cfg = UpdateConfig {
            derivative_mode: DerivativeMode::FiniteDifference,
            ..UpdateConfig::default()
        };
        let fd = update_posterior(&prior, &obs, &fd_cfg);
        let diff = (analytic.posterior().mean() - fd.posterior().mean()).abs().max();
        assert!(diff < 1e-4, "MAP mismatch {diff}");
        let cov_diff = (analytic.posterior().covariance() - fd.posterior().covariance())
            .abs()
            .max();
        assert!(cov_diff < 1e-3, "covariance mismatch {cov_diff}");
    }

    #[test]
    fn stored_posterior_is_conditioned_on_load() {
        let mut cov = DimMatrix::identity();
        cov[(1, 1)] = 0.0;
        let raw = serde_json::json!({
            "mean": ([0.0_f64; 7]),
            "covariance": cov,
        });
        let loaded: PosteriorDistribution = serde_json::from_value(raw).unwrap();
        assert!((loaded.variance(1).unwrap() - COVARIANCE_RIDGE).abs() < 1e-15);

        let out = update_posterior(
            &loaded,
            &Observation::new(unit_contrast(0), Choice::A),
            &UpdateConfig::default(),
        );
        assert!(!out.is_degenerate());
        assert!(out.posterior().mean()[0] > 0.0);

        let json = serde_json::to_string(&loaded).unwrap();
        let again: PosteriorDistribution = serde_json::from_str(&json).unwrap();
        assert_eq!(again.mean(), loaded.mean());
        assert!((again.covariance() - loaded.covariance()).abs().max() < 1e-12);
    }

    #[test]
    fn stored_posterior_with_non_finite_entries_is_rejected() {
        let mut cov = [[0.0; 7]; 7];
        for (i, row) in cov.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        let stored = StoredPosterior {
            mean: FeatureVector::repeat(f64::INFINITY),
            covariance: DimMatrix::from_fn(|i, j| cov[i][j]),
        };
        assert!(matches!(
            PosteriorDistribution::try_from(stored),
            Err(EngineError::NonFinitePosterior { field: "mean" })
        ));
    }

    #[test]
    fn newton_aborts_on_singular_hessian_and_keeps_start() {
        let start = FeatureVector::repeat(0.3);
        let obs = Observation::new(
            Contrast::new(FeatureVector::zeros(), FeatureVector::zeros()),
            Choice::A,
        );
        let cfg = UpdateConfig::default();
        let ll = LogLikelihood { obs: &obs, cfg: &cfg };
        let map = find_map(&start, &DimMatrix::zeros(), &ll, &cfg);
        assert!(map.aborted);
        assert!(!map.converged);
        assert_eq!(map.iterations, 0);
        assert_eq!(map.beta, start);
    }

    #[test]
    fn singular_hessian_keeps_previous_covariance() {
        let mut cov = DimMatrix::identity() * 2.0;
        cov[(0, 1)] = 0.5;
        cov[(1, 0)] = 0.5;
        let previous = PosteriorDistribution::new(FeatureVector::zeros(), cov);
        let obs = Observation::new(
            Contrast::new(FeatureVector::zeros(), FeatureVector::zeros()),
            Choice::B,
        );
        let cfg = UpdateConfig::default();
        let ll = LogLikelihood { obs: &obs, cfg: &cfg };
        let beta = FeatureVector::repeat(0.4);

        let out = laplace_at(&beta, &DimMatrix::zeros(), &ll, &previous);
        match out {
            UpdateOutcome::Degenerate { posterior, reason } => {
                assert_eq!(reason, DegenerateReason::SingularHessian);
                assert_eq!(posterior.mean(), &beta);
                assert_eq!(posterior.covariance(), previous.covariance());
            }
            UpdateOutcome::Updated(_) => panic!("expected a degenerate update"),
        }
    }

    #[test]
    fn non_finite_covariance_degrades_without_panicking() {
        let mut cov = DimMatrix::identity();
        cov[(2, 2)] = f64::NAN;
        let broken = PosteriorDistribution::new(FeatureVector::repeat(0.1), cov);
        assert!(broken.variance(2).unwrap().is_nan());

        let mut mgr = PosteriorManager::new(broken, UpdateConfig::default());
        let obs = Observation::new(unit_contrast(0), Choice::A);
        let outcome = update_posterior(mgr.current(), &obs, &UpdateConfig::default());
        assert!(matches!(
            outcome,
            UpdateOutcome::Degenerate {
                reason: DegenerateReason::SingularPrior,
                ..
            }
        ));
        assert_eq!(outcome.posterior().mean(), &FeatureVector::repeat(0.1));

        mgr.observe(&obs);
        assert_eq!(mgr.degenerate_updates(), 1);
        assert_eq!(mgr.current().mean(), &FeatureVector::repeat(0.1));
    }

    #[test]
    fn manager_reset_restores_prior() {
        let prior = PosteriorDistribution::from_config(&PriorConfig::default());
        let mut mgr = PosteriorManager::new(prior.clone(), UpdateConfig::default());
        mgr.observe(&Observation::new(unit_contrast(0), Choice::B));
        assert!(mgr.current().mean()[0] < 0.0);
        assert_eq!(mgr.prior(), &prior);
        mgr.reset();
        assert_eq!(mgr.current(), &prior);
    }
}
