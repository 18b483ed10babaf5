//! Offline catalog construction.
//!
//! attribute spec → full factorial → Pareto frontier → greedy static set
//! (split into beginning/end) + diversity-aware adaptive library.
//!
//! All randomness flows through the caller's RNG. Candidate scoring within
//! a round runs on rayon; rounds are sequential.

pub mod attributes;
pub mod dominance;
pub mod library;
pub mod profiles;
pub mod sampling;
pub mod screening;
pub mod static_design;

use std::collections::HashSet;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::{CatalogManifest, Vignette, VignetteCatalogs};
use crate::config::{validate_nonzero, validate_positive, validate_unit_interval};
use crate::error::ConfigError;
use crate::features::{encode_profile, Dimension, FeatureVector, JobProfile, NUM_DIMENSIONS};
use crate::posterior::PriorConfig;

use self::attributes::{attribute_fingerprint, AttributeSpec};
use self::dominance::pareto_frontier;
use self::library::build_adaptive_library;
use self::profiles::generate_profiles;
use self::sampling::PairKey;
use self::screening::{PairScreen, RejectReason, RejectionCounts};
use self::static_design::optimize_static_set;

/// Offline pipeline knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfflineConfig {
    /// Total static vignettes (beginning + end).
    pub num_static: usize,
    /// Leading static vignettes shown before adaptive selection.
    pub num_beginning: usize,
    /// Candidate pairs sampled per static round.
    pub static_sample_size: usize,
    pub num_library: usize,
    /// Candidate pairs sampled per library attempt.
    pub library_sample_size: usize,
    /// Library resampling attempts per round before giving up.
    pub max_attempts: usize,
    /// λ in (1 − λ)·informativeness + λ·diversity.
    pub diversity_weight: f64,
    pub max_wage_ratio: f64,
    /// Winning on this many encoded dimensions makes a pair quasi-dominated.
    pub quasi_dominance_dims: usize,
    pub cancellation_threshold: f64,
    /// Divide library informativeness by 2^k for profiles already used k times.
    pub reuse_penalty: bool,
    pub seed: u64,
    /// Refuse to enumerate attribute designs larger than this.
    pub max_profiles: usize,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            num_static: 8,
            num_beginning: 4,
            static_sample_size: 100_000,
            num_library: 40,
            library_sample_size: 10_000,
            max_attempts: 5,
            diversity_weight: 0.3,
            max_wage_ratio: 1.67,
            quasi_dominance_dims: 5,
            cancellation_threshold: 0.15,
            reuse_penalty: true,
            seed: 1337,
            max_profiles: 200_000,
        }
    }
}

impl OfflineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_nonzero("offline.num_static", self.num_static)?;
        if self.num_beginning > self.num_static {
            return Err(ConfigError::BeginningExceedsStatic {
                beginning: self.num_beginning,
                total: self.num_static,
            });
        }
        validate_nonzero("offline.static_sample_size", self.static_sample_size)?;
        validate_nonzero("offline.library_sample_size", self.library_sample_size)?;
        validate_nonzero("offline.max_attempts", self.max_attempts)?;
        validate_nonzero("offline.max_profiles", self.max_profiles)?;
        validate_unit_interval("offline.diversity_weight", self.diversity_weight)?;
        validate_positive("offline.cancellation_threshold", self.cancellation_threshold)?;
        if !self.max_wage_ratio.is_finite() || self.max_wage_ratio < 1.0 {
            return Err(ConfigError::OutOfRange {
                field: "offline.max_wage_ratio",
                requirement: "finite and >= 1",
                value: self.max_wage_ratio,
            });
        }
        if !(1..=NUM_DIMENSIONS).contains(&self.quasi_dominance_dims) {
            return Err(ConfigError::OutOfRange {
                field: "offline.quasi_dominance_dims",
                requirement: "within 1..=7",
                value: self.quasi_dominance_dims as f64,
            });
        }
        Ok(())
    }
}

/// A selected pair of profile indices (into the frontier) and its score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DesignedPair {
    pub a: usize,
    pub b: usize,
    pub score: f64,
}

/// Per-round trace of a greedy build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub round: usize,
    pub attempts: usize,
    pub sampled: usize,
    pub eligible: usize,
    pub rejections: RejectionCounts,
    /// `None` when the round found no eligible candidate.
    pub best_score: Option<f64>,
}

/// Screen every sampled pair and score the survivors. Output order matches
/// `sampled`, so downstream argmax is deterministic.
pub(crate) fn evaluate_candidates<F>(
    sampled: &[PairKey],
    profiles: &[JobProfile],
    encoded: &[FeatureVector],
    screen: &PairScreen,
    score: F,
) -> (Vec<(PairKey, f64)>, RejectionCounts)
where
    F: Fn(PairKey) -> f64 + Sync,
{
    let results: Vec<Result<(PairKey, f64), RejectReason>> = sampled
        .par_iter()
        .map(|&(i, j)| {
            match screen.check(&profiles[i], &profiles[j], &encoded[i], &encoded[j]) {
                Some(reason) => Err(reason),
                None => Ok(((i, j), score((i, j)))),
            }
        })
        .collect();

    let mut rejections = RejectionCounts::default();
    let mut scored = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(pair) => scored.push(pair),
            Err(reason) => rejections.record(reason),
        }
    }
    (scored, rejections)
}

/// Highest score, first one on ties. Non-finite scores count as 0.
pub(crate) fn best_candidate(scored: &[(PairKey, f64)]) -> Option<(PairKey, f64)> {
    let mut best: Option<(PairKey, f64)> = None;
    for &(key, raw) in scored {
        let score = if raw.is_finite() { raw } else { 0.0 };
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((key, score));
        }
    }
    best
}

/// Encoded dimension with the largest absolute contrast (first on ties).
pub fn dominant_dimension(diff: &FeatureVector) -> Dimension {
    let mut best = (0, f64::NEG_INFINITY);
    for (idx, v) in diff.iter().enumerate() {
        if v.abs() > best.1 {
            best = (idx, v.abs());
        }
    }
    Dimension::from_index(best.0).unwrap_or(Dimension::Financial)
}

/// What the offline build did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildReport {
    pub profiles_generated: usize,
    pub frontier_size: usize,
    pub static_rounds: Vec<RoundSummary>,
    pub library_rounds: Vec<RoundSummary>,
    /// det(FIM + 1e-8·I) of the static set, prior included.
    pub static_d_efficiency: f64,
    pub num_beginning: usize,
    pub num_end: usize,
    pub library_size: usize,
    pub warnings: Vec<String>,
}

impl BuildReport {
    pub fn is_complete(&self, cfg: &OfflineConfig) -> bool {
        self.num_beginning + self.num_end == cfg.num_static && self.library_size == cfg.num_library
    }
}

fn to_vignette<R: Rng + ?Sized>(
    id: String,
    pair: &DesignedPair,
    frontier: &[JobProfile],
    encoded: &[FeatureVector],
    rng: &mut R,
) -> Vignette {
    let (first, second) = if rng.gen_bool(0.5) {
        (pair.a, pair.b)
    } else {
        (pair.b, pair.a)
    };
    let category = dominant_dimension(&(encoded[first] - encoded[second]));
    Vignette::pair(
        id,
        category.as_str(),
        frontier[first].clone(),
        frontier[second].clone(),
    )
}

/// Run the whole pipeline with the caller's RNG.
pub fn build_catalogs<R: Rng + ?Sized>(
    specs: &[AttributeSpec],
    prior: &PriorConfig,
    cfg: &OfflineConfig,
    rng: &mut R,
) -> Result<(VignetteCatalogs, BuildReport), ConfigError> {
    run_pipeline(specs, prior, cfg, None, rng)
}

/// Run the whole pipeline from `StdRng::seed_from_u64(cfg.seed)`.
pub fn build_catalogs_seeded(
    specs: &[AttributeSpec],
    prior: &PriorConfig,
    cfg: &OfflineConfig,
) -> Result<(VignetteCatalogs, BuildReport), ConfigError> {
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    run_pipeline(specs, prior, cfg, Some(cfg.seed), &mut rng)
}

fn run_pipeline<R: Rng + ?Sized>(
    specs: &[AttributeSpec],
    prior: &PriorConfig,
    cfg: &OfflineConfig,
    seed: Option<u64>,
    rng: &mut R,
) -> Result<(VignetteCatalogs, BuildReport), ConfigError> {
    cfg.validate()?;
    prior.validate()?;

    let all = generate_profiles(specs, cfg.max_profiles)?;
    let frontier = pareto_frontier(&all, specs);
    let encoded: Vec<FeatureVector> = frontier.iter().map(encode_profile).collect();
    let weights = prior.mean_vector();
    info!(
        generated = all.len(),
        frontier = frontier.len(),
        "profiles enumerated"
    );

    let design = optimize_static_set(&frontier, &encoded, &weights, prior.variance, cfg, rng);
    let static_d_efficiency = design.d_efficiency();
    info!(
        selected = design.pairs.len(),
        d_efficiency = static_d_efficiency,
        "static design complete"
    );

    let exclude: HashSet<PairKey> = design.pairs.iter().map(|p| (p.a, p.b)).collect();
    let library = build_adaptive_library(
        &frontier,
        &encoded,
        &weights,
        prior.variance,
        cfg,
        &exclude,
        rng,
    );
    info!(selected = library.pairs.len(), "adaptive library complete");

    let split = cfg.num_beginning.min(design.pairs.len());
    let (begin_pairs, end_pairs) = design.pairs.split_at(split);
    let static_vignettes_beginning: Vec<Vignette> = begin_pairs
        .iter()
        .enumerate()
        .map(|(n, p)| to_vignette(format!("static_begin_{:02}", n + 1), p, &frontier, &encoded, rng))
        .collect();
    let static_vignettes_end: Vec<Vignette> = end_pairs
        .iter()
        .enumerate()
        .map(|(n, p)| to_vignette(format!("static_end_{:02}", n + 1), p, &frontier, &encoded, rng))
        .collect();
    let adaptive_library: Vec<Vignette> = library
        .pairs
        .iter()
        .enumerate()
        .map(|(n, p)| to_vignette(format!("adaptive_{:03}", n + 1), p, &frontier, &encoded, rng))
        .collect();

    let mut warnings = design.warnings;
    warnings.extend(library.warnings);

    let manifest = CatalogManifest {
        generated_at: Utc::now(),
        attribute_fingerprint: attribute_fingerprint(specs),
        seed,
        prior_variance: prior.variance,
        num_beginning: static_vignettes_beginning.len(),
        num_end: static_vignettes_end.len(),
        num_library: adaptive_library.len(),
        warnings: warnings.clone(),
    };
    let report = BuildReport {
        profiles_generated: all.len(),
        frontier_size: frontier.len(),
        static_rounds: design.rounds,
        library_rounds: library.rounds,
        static_d_efficiency,
        num_beginning: manifest.num_beginning,
        num_end: manifest.num_end,
        library_size: manifest.num_library,
        warnings,
    };
    let catalogs = VignetteCatalogs {
        static_vignettes_beginning,
        static_vignettes_end,
        adaptive_library,
        manifest,
    };
    Ok((catalogs, report))
}
