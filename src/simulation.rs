//! Synthetic respondents for offline evaluation.
//!
//! A respondent with known weights answers each vignette by sampling the
//! logit; the real session loop (phase machine, posterior updates, stopping
//! rule) runs to completion and the recovered posterior mean is scored
//! against the truth.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info};

use crate::catalog::VignetteCatalogs;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::features::{cosine_similarity, FeatureVector, NUM_DIMENSIONS};
use crate::likelihood::{choice_probabilities, Choice, Contrast};
use crate::phase::{Phase, Session};
use crate::posterior::PosteriorDistribution;
use crate::stopping::StopRule;

// =============================================================================
// Respondent definitions
// =============================================================================

#[derive(Debug, Clone)]
pub struct SyntheticRespondent {
    pub name: &'static str,
    pub weights: [f64; NUM_DIMENSIONS],
    /// Logit temperature of the simulated answers.
    pub temperature: f64,
    pub seed: u64,
}

impl SyntheticRespondent {
    pub fn weight_vector(&self) -> FeatureVector {
        FeatureVector::from_column_slice(&self.weights)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecoveryMetrics {
    pub cosine_similarity: f64,
    pub rmse: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    pub respondent: String,
    pub vignettes_used: usize,
    pub phases: Vec<Phase>,
    pub stop_rule: Option<StopRule>,
    pub degenerate_updates: usize,
    pub posterior: PosteriorDistribution,
    pub metrics: RecoveryMetrics,
    /// RMSE of the posterior mean after each answer.
    pub error_trajectory: Vec<f64>,
}

// =============================================================================
// Public API
// =============================================================================

pub fn synthetic_respondents() -> Vec<SyntheticRespondent> {
    vec![
        SyntheticRespondent {
            name: "money_first",
            weights: [3.0, 0.5, 0.5, 0.5, 0.5, 0.2, 0.2],
            temperature: 1.0,
            seed: 11,
        },
        SyntheticRespondent {
            name: "balanced",
            weights: [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0],
            temperature: 1.0,
            seed: 23,
        },
        SyntheticRespondent {
            name: "lifestyle_over_pay",
            weights: [-0.5, 2.0, 0.3, 2.5, 0.8, 0.4, 1.2],
            temperature: 1.0,
            seed: 37,
        },
        SyntheticRespondent {
            name: "noisy_security",
            weights: [0.5, 0.2, 0.2, 0.2, 2.0, 0.1, 0.1],
            temperature: 2.5,
            seed: 41,
        },
    ]
}

/// Run every respondent whose name matches `filter` (all when `None`).
pub fn run_synthetic_suite(
    catalogs: &VignetteCatalogs,
    cfg: &EngineConfig,
    filter: Option<&str>,
) -> Result<Vec<SimulationResult>, EngineError> {
    synthetic_respondents()
        .iter()
        .filter(|r| filter.map_or(true, |f| r.name == f))
        .map(|r| run_simulation(catalogs, cfg, r))
        .collect()
}

pub fn run_simulation(
    catalogs: &VignetteCatalogs,
    cfg: &EngineConfig,
    respondent: &SyntheticRespondent,
) -> Result<SimulationResult, EngineError> {
    let truth = respondent.weight_vector();
    let mut rng = StdRng::seed_from_u64(respondent.seed);
    let mut session = Session::new(&cfg.prior);
    let mut phases = Vec::new();
    let mut error_trajectory = Vec::new();

    while let Some(next) = session.next_vignette(catalogs, cfg) {
        let contrast = next.vignette.contrast()?;
        let choice = simulate_choice(&mut rng, &contrast, &truth, respondent.temperature);
        let option_id = next
            .vignette
            .option(choice)
            .map(|o| o.option_id.clone())
            .unwrap_or_else(|| choice.option_id().to_string());
        debug!(
            respondent = respondent.name,
            vignette = %next.vignette.vignette_id,
            phase = %next.phase,
            choice = %option_id,
            "simulated answer"
        );
        phases.push(next.phase);
        let posterior = session.record_answer(next.vignette, &option_id, cfg)?;
        error_trajectory.push(rmse(posterior.mean(), &truth));
    }

    let posterior = session.posterior().clone();
    let metrics = RecoveryMetrics {
        cosine_similarity: cosine_similarity(posterior.mean(), &truth),
        rmse: rmse(posterior.mean(), &truth),
    };
    info!(
        respondent = respondent.name,
        vignettes = session.answered(),
        cosine = metrics.cosine_similarity,
        rmse = metrics.rmse,
        "simulation finished"
    );

    Ok(SimulationResult {
        respondent: respondent.name.to_string(),
        vignettes_used: session.answered(),
        phases,
        stop_rule: session.last_rule(),
        degenerate_updates: session.degenerate_updates(),
        posterior,
        metrics,
        error_trajectory,
    })
}

// =============================================================================
// Helpers
// =============================================================================

/// Sample A with probability p_A under the logit.
pub fn simulate_choice(
    rng: &mut impl Rng,
    contrast: &Contrast,
    weights: &FeatureVector,
    temperature: f64,
) -> Choice {
    let (p_a, _) = choice_probabilities(contrast, weights, temperature);
    if rng.gen::<f64>() < p_a {
        Choice::A
    } else {
        Choice::B
    }
}

fn rmse(estimate: &FeatureVector, truth: &FeatureVector) -> f64 {
    ((estimate - truth).norm_squared() / NUM_DIMENSIONS as f64).sqrt()
}
