//! Profile-level Pareto filtering.
//!
//! The frontier is built incrementally: each candidate is compared only with
//! the current frontier, so the cost per candidate is O(frontier), not O(n).

use std::cmp::Ordering;

use crate::features::JobProfile;

use super::attributes::{AttributeSpec, Direction};

/// Direction-adjusted comparison of one attribute. `None` when the attribute
/// is neutral or missing from either profile.
fn compare_attribute(spec: &AttributeSpec, a: &JobProfile, b: &JobProfile) -> Option<Ordering> {
    if spec.direction == Direction::Neutral {
        return None;
    }
    let (va, vb) = (a.get(&spec.name)?, b.get(&spec.name)?);
    let ord = va.partial_cmp(&vb)?;
    match spec.direction {
        Direction::LowerIsBetter => Some(ord.reverse()),
        Direction::HigherIsBetter | Direction::Neutral => Some(ord),
    }
}

/// `a` dominates `b`: at least as good on every directional attribute and
/// strictly better on one.
pub fn profile_dominates(a: &JobProfile, b: &JobProfile, specs: &[AttributeSpec]) -> bool {
    let mut strictly_better = false;
    for spec in specs {
        match compare_attribute(spec, a, b) {
            Some(Ordering::Less) => return false,
            Some(Ordering::Greater) => strictly_better = true,
            Some(Ordering::Equal) | None => {}
        }
    }
    strictly_better
}

/// Indices (into `profiles`) of the non-dominated set, in input order.
pub fn pareto_frontier_indices(profiles: &[JobProfile], specs: &[AttributeSpec]) -> Vec<usize> {
    if specs.iter().all(|s| s.direction == Direction::Neutral) {
        return (0..profiles.len()).collect();
    }
    let mut frontier: Vec<usize> = Vec::new();
    for (idx, candidate) in profiles.iter().enumerate() {
        if frontier
            .iter()
            .any(|&f| profile_dominates(&profiles[f], candidate, specs))
        {
            continue;
        }
        frontier.retain(|&f| !profile_dominates(candidate, &profiles[f], specs));
        frontier.push(idx);
    }
    frontier
}

/// The non-dominated profiles, in input order.
pub fn pareto_frontier(profiles: &[JobProfile], specs: &[AttributeSpec]) -> Vec<JobProfile> {
    pareto_frontier_indices(profiles, specs)
        .into_iter()
        .map(|i| profiles[i].clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::attr;

    fn specs() -> Vec<AttributeSpec> {
        vec![
            AttributeSpec::ordinal(attr::WAGE, &[3000.0, 5000.0], Direction::HigherIsBetter),
            AttributeSpec::ordinal(attr::COMMUTE_TIME, &[15.0, 60.0], Direction::LowerIsBetter),
            AttributeSpec::binary(attr::REMOTE_WORK, Direction::Neutral),
        ]
    }

    fn profile(wage: f64, commute: f64, remote: f64) -> JobProfile {
        JobProfile::default()
            .with(attr::WAGE, wage)
            .with(attr::COMMUTE_TIME, commute)
            .with(attr::REMOTE_WORK, remote)
    }

    #[test]
    fn lower_is_better_is_respected() {
        let s = specs();
        assert!(profile_dominates(&profile(3000.0, 15.0, 0.0), &profile(3000.0, 60.0, 1.0), &s));
        assert!(!profile_dominates(&profile(3000.0, 60.0, 0.0), &profile(3000.0, 15.0, 0.0), &s));
    }

    #[test]
    fn equal_profiles_do_not_dominate() {
        let s = specs();
        let p = profile(4000.0, 30.0, 1.0);
        assert!(!profile_dominates(&p, &p.clone(), &s));
    }

    #[test]
    fn neutral_only_specs_never_dominate() {
        let s = vec![AttributeSpec::binary(attr::REMOTE_WORK, Direction::Neutral)];
        let a = JobProfile::default().with(attr::REMOTE_WORK, 1.0);
        let b = JobProfile::default().with(attr::REMOTE_WORK, 0.0);
        assert!(!profile_dominates(&a, &b, &s));
        assert_eq!(pareto_frontier(&[a, b], &s).len(), 2);
    }

    #[test]
    fn later_dominator_evicts_frontier_members() {
        let s = specs();
        let profiles = vec![
            profile(3000.0, 60.0, 0.0),
            profile(4000.0, 45.0, 0.0),
            profile(5000.0, 15.0, 1.0),
        ];
        assert_eq!(pareto_frontier_indices(&profiles, &s), vec![2]);
    }
}
