//! Greedy D-efficient static vignette set.
//!
//! Each round samples candidate pairs, screens them, and keeps the one that
//! most increases det(FIM) of the running design, evaluated at a fixed
//! weight estimate (the prior mean).

use std::collections::HashSet;

use rand::Rng;
use tracing::{debug, warn};

use crate::features::{DimMatrix, FeatureVector, JobProfile};
use crate::fisher::{d_efficiency, prior_fim, vignette_fim};
use crate::likelihood::Contrast;

use super::sampling::{sample_pairs, PairKey};
use super::screening::PairScreen;
use super::{best_candidate, evaluate_candidates, DesignedPair, OfflineConfig, RoundSummary};

#[derive(Debug, Clone)]
pub struct StaticDesign {
    pub pairs: Vec<DesignedPair>,
    /// Cumulative information of the design, prior included.
    pub fim: DimMatrix,
    pub rounds: Vec<RoundSummary>,
    pub warnings: Vec<String>,
}

impl StaticDesign {
    pub fn d_efficiency(&self) -> f64 {
        d_efficiency(&self.fim)
    }
}

pub fn optimize_static_set<R: Rng + ?Sized>(
    profiles: &[JobProfile],
    encoded: &[FeatureVector],
    weights: &FeatureVector,
    prior_variance: f64,
    cfg: &OfflineConfig,
    rng: &mut R,
) -> StaticDesign {
    let screen = PairScreen {
        max_wage_ratio: cfg.max_wage_ratio,
        quasi_dominance_dims: cfg.quasi_dominance_dims,
        cancellation_threshold: None,
    };

    let mut fim = prior_fim(prior_variance);
    let mut chosen: HashSet<PairKey> = HashSet::new();
    let mut pairs = Vec::with_capacity(cfg.num_static);
    let mut rounds = Vec::with_capacity(cfg.num_static);
    let mut warnings = Vec::new();

    for round in 0..cfg.num_static {
        let sampled = sample_pairs(profiles.len(), cfg.static_sample_size, &chosen, rng);
        let base = d_efficiency(&fim);
        let current = fim;
        let (scored, rejections) = evaluate_candidates(&sampled, profiles, encoded, &screen, |(i, j)| {
            let contrast = Contrast::new(encoded[i], encoded[j]);
            d_efficiency(&(current + vignette_fim(&contrast, weights))) - base
        });

        let best = best_candidate(&scored);
        rounds.push(RoundSummary {
            round,
            attempts: 1,
            sampled: sampled.len(),
            eligible: scored.len(),
            rejections,
            best_score: best.map(|(_, s)| s),
        });

        let Some(((i, j), score)) = best else {
            let msg = format!(
                "static design stopped after {} of {} vignettes: no eligible candidates",
                pairs.len(),
                cfg.num_static
            );
            warn!(round, "{msg}");
            warnings.push(msg);
            break;
        };

        fim += vignette_fim(&Contrast::new(encoded[i], encoded[j]), weights);
        chosen.insert((i, j));
        pairs.push(DesignedPair { a: i, b: j, score });
        debug!(round, a = i, b = j, score, "static vignette selected");
    }

    StaticDesign {
        pairs,
        fim,
        rounds,
        warnings,
    }
}
