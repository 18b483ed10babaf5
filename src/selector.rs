//! D-optimal selection of the next vignette.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::catalog::Vignette;
use crate::features::DimMatrix;
use crate::fisher::{bayesian_expected_fim, expected_fim};
use crate::likelihood::Contrast;
use crate::posterior::PosteriorDistribution;

/// A scored candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection<'a> {
    pub vignette: &'a Vignette,
    /// Expected determinant increase (Bayesian-weighted if requested).
    pub score: f64,
}

/// Score one contrast against the current state.
pub fn selection_score(
    contrast: &Contrast,
    posterior: &PosteriorDistribution,
    current_fim: &DimMatrix,
    use_bayesian: bool,
) -> f64 {
    let (_, gain) = if use_bayesian {
        bayesian_expected_fim(contrast, posterior.mean(), posterior.covariance(), current_fim)
    } else {
        expected_fim(contrast, posterior.mean(), current_fim)
    };
    gain
}

/// Pick the unshown candidate with the largest expected determinant
/// increase. Ties go to the earliest candidate; `None` when nothing is left.
pub fn select_next<'a>(
    candidates: &'a [Vignette],
    posterior: &PosteriorDistribution,
    current_fim: &DimMatrix,
    shown_ids: &HashSet<String>,
    use_bayesian: bool,
) -> Option<Selection<'a>> {
    let mut best: Option<Selection<'a>> = None;

    for vignette in candidates {
        if shown_ids.contains(&vignette.vignette_id) {
            continue;
        }
        let contrast = match vignette.contrast() {
            Ok(c) => c,
            Err(err) => {
                warn!(error = %err, "skipping malformed candidate vignette");
                continue;
            }
        };
        let score = selection_score(&contrast, posterior, current_fim, use_bayesian);
        if best.map_or(true, |b| score > b.score) {
            best = Some(Selection { vignette, score });
        }
    }

    if let Some(sel) = &best {
        debug!(vignette_id = %sel.vignette.vignette_id, score = sel.score, "selected vignette");
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::VignetteOption;
    use crate::features::{attr, FeatureVector, JobProfile};
    use crate::fisher::prior_fim;
    use crate::posterior::PriorConfig;

    fn vignette(id: &str, a: JobProfile, b: JobProfile) -> Vignette {
        Vignette {
            vignette_id: id.to_string(),
            category: String::new(),
            options: vec![VignetteOption::new("A", a), VignetteOption::new("B", b)],
        }
    }

    fn wage(w: f64) -> JobProfile {
        JobProfile::default().with(attr::WAGE, w)
    }

    #[test]
    fn picks_largest_contrast_and_skips_shown() {
        let cands = vec![
            vignette("small", wage(3000.0), wage(4000.0)),
            vignette("large", wage(3000.0), wage(5000.0)),
            vignette(
                "wide",
                JobProfile::default().with(attr::JOB_SECURITY, 1.0),
                JobProfile::default().with(attr::JOB_SECURITY, 0.0),
            ),
        ];
        let post = PosteriorDistribution::from_config(&PriorConfig::default());
        let fim = prior_fim(1.0);

        let sel = select_next(&cands, &post, &fim, &HashSet::new(), false).unwrap();
        assert_eq!(sel.vignette.vignette_id, "wide");

        let shown: HashSet<String> = ["wide".to_string()].into_iter().collect();
        let sel = select_next(&cands, &post, &fim, &shown, false).unwrap();
        assert_eq!(sel.vignette.vignette_id, "large");
    }

    #[test]
    fn ties_go_to_first_candidate() {
        let cands = vec![
            vignette("first", wage(3000.0), wage(5000.0)),
            vignette("second", wage(5000.0), wage(3000.0)),
        ];
        let post = PosteriorDistribution::from_config(&PriorConfig::default());
        let sel = select_next(&cands, &post, &prior_fim(1.0), &HashSet::new(), true).unwrap();
        assert_eq!(sel.vignette.vignette_id, "first");
    }

    #[test]
    fn empty_pool_returns_none() {
        let cands = vec![vignette("only", wage(3000.0), wage(5000.0))];
        let post = PosteriorDistribution::new(FeatureVector::zeros(), DimMatrix::identity());
        let shown: HashSet<String> = ["only".to_string()].into_iter().collect();
        assert!(select_next(&cands, &post, &DimMatrix::identity(), &shown, false).is_none());
        assert!(select_next(&[], &post, &DimMatrix::identity(), &HashSet::new(), false).is_none());
    }

    #[test]
    fn malformed_candidates_are_skipped() {
        let mut bad = vignette("bad", wage(3000.0), wage(5000.0));
        bad.options.pop();
        let cands = vec![bad, vignette("good", wage(3000.0), wage(4000.0))];
        let post = PosteriorDistribution::from_config(&PriorConfig::default());
        let sel = select_next(&cands, &post, &prior_fim(1.0), &HashSet::new(), false).unwrap();
        assert_eq!(sel.vignette.vignette_id, "good");
    }
}
