//! Pair screens applied before a candidate vignette is scored.
//!
//! A pair is rejected when the choice is obvious (one job is better on
//! nearly everything), when the wage gap swamps every other attribute, or
//! (library only) when a contrast visible in the raw attributes cancels out
//! inside an aggregated dimension.

use serde::{Deserialize, Serialize};

use crate::features::{attr, dimension_components, Dimension, FeatureVector, JobProfile};

/// Differences below this are treated as ties.
const TIE_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Both options encode to the same point.
    NoContrast,
    /// One option is at least as good on every encoded dimension.
    ParetoDominated,
    /// One option is strictly better on a majority of encoded dimensions.
    QuasiDominated,
    WageGap,
    AttributeCancellation,
}

/// Screening thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairScreen {
    /// Reject when max(wage) / min(wage) exceeds this.
    pub max_wage_ratio: f64,
    /// Reject when one side wins on at least this many encoded dimensions.
    pub quasi_dominance_dims: usize,
    /// Cancellation threshold on the encoded difference; `None` disables it.
    pub cancellation_threshold: Option<f64>,
}

/// True when the wage gap is excessive. Ratios exactly at `max_ratio` pass.
/// Missing or non-positive wages skip the check.
pub fn wage_ratio_exceeds(wage_a: f64, wage_b: f64, max_ratio: f64) -> bool {
    let lo = wage_a.min(wage_b);
    let hi = wage_a.max(wage_b);
    if lo.is_nan() || lo <= 0.0 || !hi.is_finite() {
        return false;
    }
    hi / lo > max_ratio
}

/// Counts of encoded dimensions where A beats B and where B beats A.
fn win_counts(x_a: &FeatureVector, x_b: &FeatureVector) -> (usize, usize) {
    x_a.iter()
        .zip(x_b.iter())
        .fold((0, 0), |(wa, wb), (a, b)| {
            if a - b > TIE_TOLERANCE {
                (wa + 1, wb)
            } else if b - a > TIE_TOLERANCE {
                (wa, wb + 1)
            } else {
                (wa, wb)
            }
        })
}

/// The aggregated dimension in which `a` and `b` differ in opposite
/// directions on their components but end up within `threshold` after
/// averaging.
pub fn attribute_cancellation(a: &JobProfile, b: &JobProfile, threshold: f64) -> Option<Dimension> {
    Dimension::ALL
        .into_iter()
        .filter(|d| d.is_aggregated())
        .find(|&dim| {
            let ca = dimension_components(a, dim);
            let cb = dimension_components(b, dim);
            let diffs: Vec<f64> = ca
                .iter()
                .zip(&cb)
                .filter_map(|(x, y)| Some((*x)? - (*y)?))
                .collect();
            let has_pos = diffs.iter().any(|d| *d > TIE_TOLERANCE);
            let has_neg = diffs.iter().any(|d| *d < -TIE_TOLERANCE);
            if !(has_pos && has_neg) {
                return false;
            }
            let aggregated = mean_present(&ca) - mean_present(&cb);
            aggregated.abs() < threshold
        })
}

fn mean_present(values: &[Option<f64>]) -> f64 {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        0.0
    } else {
        present.iter().sum::<f64>() / present.len() as f64
    }
}

impl PairScreen {
    /// First rule that rejects the pair, or `None` if it is admissible.
    pub fn check(
        &self,
        a: &JobProfile,
        b: &JobProfile,
        x_a: &FeatureVector,
        x_b: &FeatureVector,
    ) -> Option<RejectReason> {
        let (wins_a, wins_b) = win_counts(x_a, x_b);
        if wins_a == 0 && wins_b == 0 {
            return Some(RejectReason::NoContrast);
        }
        if wins_a == 0 || wins_b == 0 {
            return Some(RejectReason::ParetoDominated);
        }
        if wins_a >= self.quasi_dominance_dims || wins_b >= self.quasi_dominance_dims {
            return Some(RejectReason::QuasiDominated);
        }
        if let (Some(wa), Some(wb)) = (a.get(attr::WAGE), b.get(attr::WAGE)) {
            if wage_ratio_exceeds(wa, wb, self.max_wage_ratio) {
                return Some(RejectReason::WageGap);
            }
        }
        if let Some(threshold) = self.cancellation_threshold {
            if attribute_cancellation(a, b, threshold).is_some() {
                return Some(RejectReason::AttributeCancellation);
            }
        }
        None
    }
}

/// Per-reason rejection tallies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionCounts {
    pub no_contrast: usize,
    pub pareto_dominated: usize,
    pub quasi_dominated: usize,
    pub wage_gap: usize,
    pub attribute_cancellation: usize,
}

impl RejectionCounts {
    pub fn record(&mut self, reason: RejectReason) {
        match reason {
            RejectReason::NoContrast => self.no_contrast += 1,
            RejectReason::ParetoDominated => self.pareto_dominated += 1,
            RejectReason::QuasiDominated => self.quasi_dominated += 1,
            RejectReason::WageGap => self.wage_gap += 1,
            RejectReason::AttributeCancellation => self.attribute_cancellation += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.no_contrast
            + self.pareto_dominated
            + self.quasi_dominated
            + self.wage_gap
            + self.attribute_cancellation
    }
}
