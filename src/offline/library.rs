//! Adaptive vignette library: a larger pool that trades raw information for
//! diversity, so the runtime selector has distinct contrasts to choose from.
//!
//! Score = (1 − λ)·informativeness + λ·diversity, where informativeness is
//! the round-normalized determinant increase (divided by `2^k` when the two
//! profiles already appear k times in the library) and diversity is
//! 1 − max |cos| against previously selected contrasts.

use std::collections::HashSet;

use rand::Rng;
use tracing::{debug, warn};

use crate::features::{cosine_similarity, FeatureVector, JobProfile};
use crate::fisher::{d_efficiency, prior_fim, vignette_fim};
use crate::likelihood::Contrast;

use super::sampling::{sample_pairs, PairKey};
use super::screening::PairScreen;
use super::{best_candidate, evaluate_candidates, DesignedPair, OfflineConfig, RoundSummary};

#[derive(Debug, Clone)]
pub struct LibraryDesign {
    pub pairs: Vec<DesignedPair>,
    pub rounds: Vec<RoundSummary>,
    pub warnings: Vec<String>,
}

/// Geometric reuse penalty: 2^level.
pub fn reuse_penalty(level: u32) -> f64 {
    2f64.powi(level.min(1023) as i32)
}

/// 1 − max |cos| between `diff` and every selected contrast; 1.0 when none.
///
/// Absolute cosine: side A follows candidate index order, so a contrast and
/// its mirror ask the same question.
pub fn diversity(diff: &FeatureVector, selected: &[FeatureVector]) -> f64 {
    let max_sim = selected
        .iter()
        .map(|s| cosine_similarity(diff, s).abs())
        .fold(0.0, f64::max);
    1.0 - max_sim
}

pub fn build_adaptive_library<R: Rng + ?Sized>(
    profiles: &[JobProfile],
    encoded: &[FeatureVector],
    weights: &FeatureVector,
    prior_variance: f64,
    cfg: &OfflineConfig,
    exclude: &HashSet<PairKey>,
    rng: &mut R,
) -> LibraryDesign {
    let screen = PairScreen {
        max_wage_ratio: cfg.max_wage_ratio,
        quasi_dominance_dims: cfg.quasi_dominance_dims,
        cancellation_threshold: Some(cfg.cancellation_threshold),
    };
    let lambda = cfg.diversity_weight;

    let mut fim = prior_fim(prior_variance);
    let mut excluded = exclude.clone();
    let mut usage = vec![0u32; profiles.len()];
    let mut selected_diffs: Vec<FeatureVector> = Vec::with_capacity(cfg.num_library);
    let mut pairs = Vec::with_capacity(cfg.num_library);
    let mut rounds = Vec::with_capacity(cfg.num_library);
    let mut warnings = Vec::new();

    'rounds: for round in 0..cfg.num_library {
        let base = d_efficiency(&fim);
        let current = fim;
        let penalize = cfg.reuse_penalty;
        let usage_now = &usage;

        let mut attempts = 0;
        let (sampled, scored, rejections) = loop {
            attempts += 1;
            let sampled = sample_pairs(profiles.len(), cfg.library_sample_size, &excluded, rng);
            let (scored, rejections) =
                evaluate_candidates(&sampled, profiles, encoded, &screen, |(i, j)| {
                    let contrast = Contrast::new(encoded[i], encoded[j]);
                    let gain = d_efficiency(&(current + vignette_fim(&contrast, weights))) - base;
                    if penalize {
                        gain / reuse_penalty(usage_now[i] + usage_now[j])
                    } else {
                        gain
                    }
                });
            if !scored.is_empty() || attempts >= cfg.max_attempts {
                break (sampled.len(), scored, rejections);
            }
            debug!(round, attempts, "no eligible library candidates; resampling");
        };

        if scored.is_empty() {
            rounds.push(RoundSummary {
                round,
                attempts,
                sampled,
                eligible: 0,
                rejections,
                best_score: None,
            });
            let msg = format!(
                "adaptive library stopped after {} of {} vignettes: no eligible candidates in {} attempts",
                pairs.len(),
                cfg.num_library,
                attempts
            );
            warn!(round, "{msg}");
            warnings.push(msg);
            break 'rounds;
        }

        let max_info = scored
            .iter()
            .map(|(_, s)| *s)
            .fold(0.0, f64::max);
        let norm = if max_info > 0.0 { max_info } else { 1.0 };
        let blended: Vec<(PairKey, f64)> = scored
            .iter()
            .map(|&((i, j), info)| {
                let diff = encoded[i] - encoded[j];
                let score = (1.0 - lambda) * (info / norm) + lambda * diversity(&diff, &selected_diffs);
                ((i, j), score)
            })
            .collect();

        let Some(((i, j), score)) = best_candidate(&blended) else {
            break 'rounds;
        };
        rounds.push(RoundSummary {
            round,
            attempts,
            sampled,
            eligible: scored.len(),
            rejections,
            best_score: Some(score),
        });

        fim += vignette_fim(&Contrast::new(encoded[i], encoded[j]), weights);
        excluded.insert((i, j));
        usage[i] += 1;
        usage[j] += 1;
        selected_diffs.push(encoded[i] - encoded[j]);
        pairs.push(DesignedPair { a: i, b: j, score });
        debug!(round, a = i, b = j, score, "library vignette selected");
    }

    LibraryDesign {
        pairs,
        rounds,
        warnings,
    }
}
