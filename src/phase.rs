//! Vignette phase state machine and the session that drives it.
//!
//! Beginning (static, in order) → Adaptive (D-optimal picks from the library
//! until the stopping rule fires or the library runs out) → End (static, in
//! order) → Done. [`Phase::advance`] is the only transition function.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{Vignette, VignetteCatalogs};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::features::DimMatrix;
use crate::fisher::prior_fim;
use crate::posterior::{update, PosteriorDistribution, PriorConfig, UpdateOutcome};
use crate::selector::select_next;
use crate::stopping::{should_continue, StopRule};

/// Session phases, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Beginning,
    Adaptive,
    End,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Beginning => "beginning",
            Phase::Adaptive => "adaptive",
            Phase::End => "end",
            Phase::Done => "done",
        })
    }
}

/// What the transition function needs to know about the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseProgress {
    pub beginning_remaining: usize,
    /// An unshown library vignette is available.
    pub adaptive_available: bool,
    /// The stopping rule says enough has been asked.
    pub stop_requested: bool,
    pub end_remaining: usize,
}

impl Phase {
    /// One step of the state machine. Returns `self` when the phase still
    /// has work.
    pub fn advance(self, progress: &PhaseProgress) -> Phase {
        match self {
            Phase::Beginning if progress.beginning_remaining > 0 => Phase::Beginning,
            Phase::Beginning => Phase::Adaptive,
            Phase::Adaptive if progress.adaptive_available && !progress.stop_requested => {
                Phase::Adaptive
            }
            Phase::Adaptive => Phase::End,
            Phase::End if progress.end_remaining > 0 => Phase::End,
            Phase::End | Phase::Done => Phase::Done,
        }
    }

    /// Advance until a phase with work (or Done) is reached. Phases only move
    /// forward, so this takes at most three steps.
    pub fn settle(self, progress: &PhaseProgress) -> Phase {
        let mut phase = self;
        loop {
            let next = phase.advance(progress);
            if next == phase {
                return phase;
            }
            phase = next;
        }
    }
}

/// A vignette handed out by [`Session::next_vignette`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NextVignette<'a> {
    pub vignette: &'a Vignette,
    pub phase: Phase,
    /// Expected determinant increase, for adaptive picks.
    pub score: Option<f64>,
}

/// One respondent's elicitation state. The caller owns it and may persist
/// the posterior between calls.
#[derive(Debug, Clone)]
pub struct Session {
    phase: Phase,
    posterior: PosteriorDistribution,
    fim: DimMatrix,
    shown: HashSet<String>,
    beginning_pos: usize,
    end_pos: usize,
    answered: usize,
    degenerate_updates: usize,
    last_rule: Option<StopRule>,
}

impl Session {
    pub fn new(prior: &PriorConfig) -> Self {
        Self {
            phase: Phase::Beginning,
            posterior: PosteriorDistribution::from_config(prior),
            fim: prior_fim(prior.variance),
            shown: HashSet::new(),
            beginning_pos: 0,
            end_pos: 0,
            answered: 0,
            degenerate_updates: 0,
            last_rule: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn posterior(&self) -> &PosteriorDistribution {
        &self.posterior
    }

    pub fn fim(&self) -> &DimMatrix {
        &self.fim
    }

    pub fn answered(&self) -> usize {
        self.answered
    }

    pub fn degenerate_updates(&self) -> usize {
        self.degenerate_updates
    }

    /// The stopping rule from the most recent adaptive check.
    pub fn last_rule(&self) -> Option<StopRule> {
        self.last_rule
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    /// The next vignette to show, or `None` once the session is Done.
    ///
    /// The stopping rule counts the end-set vignettes still to come, so
    /// `max_vignettes` bounds the whole session whenever the end set fits.
    pub fn next_vignette<'a>(
        &mut self,
        catalogs: &'a VignetteCatalogs,
        cfg: &EngineConfig,
    ) -> Option<NextVignette<'a>> {
        let beginning_remaining = catalogs
            .static_vignettes_beginning
            .len()
            .saturating_sub(self.beginning_pos);
        let end_remaining = catalogs.static_vignettes_end.len().saturating_sub(self.end_pos);

        let mut stop_requested = false;
        let mut pick = None;
        if beginning_remaining == 0 && matches!(self.phase, Phase::Beginning | Phase::Adaptive) {
            let committed = self.answered + end_remaining;
            let (cont, rule) = should_continue(&self.posterior, &self.fim, committed, &cfg.stopping);
            self.last_rule = Some(rule);
            stop_requested = !cont;
            if cont {
                pick = select_next(
                    &catalogs.adaptive_library,
                    &self.posterior,
                    &self.fim,
                    &self.shown,
                    cfg.use_bayesian_selection,
                );
            }
        }

        let progress = PhaseProgress {
            beginning_remaining,
            adaptive_available: pick.is_some(),
            stop_requested,
            end_remaining,
        };
        let next = self.phase.settle(&progress);
        if next != self.phase {
            debug!(from = %self.phase, to = %next, answered = self.answered, "phase transition");
        }
        self.phase = next;

        let (vignette, score) = match self.phase {
            Phase::Beginning => {
                let v = catalogs.static_vignettes_beginning.get(self.beginning_pos)?;
                self.beginning_pos += 1;
                (v, None)
            }
            Phase::Adaptive => {
                let selection = pick?;
                (selection.vignette, Some(selection.score))
            }
            Phase::End => {
                let v = catalogs.static_vignettes_end.get(self.end_pos)?;
                self.end_pos += 1;
                (v, None)
            }
            Phase::Done => return None,
        };
        self.shown.insert(vignette.vignette_id.clone());
        Some(NextVignette {
            vignette,
            phase: self.phase,
            score,
        })
    }

    /// Fold the respondent's answer into the posterior and the cumulative FIM.
    pub fn record_answer(
        &mut self,
        vignette: &Vignette,
        chosen_option: &str,
        cfg: &EngineConfig,
    ) -> Result<&PosteriorDistribution, EngineError> {
        let (outcome, fim) = update(
            &self.posterior,
            &self.fim,
            vignette,
            chosen_option,
            &cfg.likelihood,
        )?;
        if let UpdateOutcome::Degenerate { reason, .. } = &outcome {
            debug!(vignette = %vignette.vignette_id, ?reason, "degenerate update");
            self.degenerate_updates += 1;
        }
        self.posterior = outcome.into_posterior();
        self.fim = fim;
        self.shown.insert(vignette.vignette_id.clone());
        self.answered += 1;
        Ok(&self.posterior)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(begin: usize, available: bool, stop: bool, end: usize) -> PhaseProgress {
        PhaseProgress {
            beginning_remaining: begin,
            adaptive_available: available,
            stop_requested: stop,
            end_remaining: end,
        }
    }

    #[test]
    fn beginning_holds_while_static_items_remain() {
        assert_eq!(
            Phase::Beginning.advance(&progress(2, true, false, 3)),
            Phase::Beginning
        );
        assert_eq!(
            Phase::Beginning.advance(&progress(0, true, false, 3)),
            Phase::Adaptive
        );
    }

    #[test]
    fn adaptive_leaves_on_stop_or_exhaustion() {
        assert_eq!(Phase::Adaptive.advance(&progress(0, true, false, 1)), Phase::Adaptive);
        assert_eq!(Phase::Adaptive.advance(&progress(0, true, true, 1)), Phase::End);
        assert_eq!(Phase::Adaptive.advance(&progress(0, false, false, 1)), Phase::End);
    }

    #[test]
    fn settle_skips_empty_phases() {
        assert_eq!(Phase::Beginning.settle(&progress(0, false, false, 0)), Phase::Done);
        assert_eq!(Phase::Beginning.settle(&progress(0, false, true, 2)), Phase::End);
        assert_eq!(Phase::Done.settle(&progress(5, true, false, 5)), Phase::Done);
    }
}
