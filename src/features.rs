//! Feature encoder: job profile attributes → 7-dimensional preference space.
//!
//! The offline designer and the runtime selector both go through
//! [`encode_profile`]. A catalog built with one encoding and scored with
//! another is meaningless, so there is exactly one implementation.

use std::collections::BTreeMap;
use std::fmt;

use nalgebra::{SMatrix, SVector};
use serde::{Deserialize, Serialize};

/// Number of latent preference dimensions.
pub const NUM_DIMENSIONS: usize = 7;

/// A point in preference-feature space (also the shape of β).
pub type FeatureVector = SVector<f64, NUM_DIMENSIONS>;
/// A 7×7 matrix (covariances and Fisher information).
pub type DimMatrix = SMatrix<f64, NUM_DIMENSIONS, NUM_DIMENSIONS>;

/// Wage is divided by this before entering the financial dimension.
pub const WAGE_SCALE: f64 = 10_000.0;
/// Commute time (minutes) at which the commute score reaches zero.
pub const COMMUTE_ZERO_MINUTES: f64 = 60.0;
/// Minutes of commute per unit of commute score.
pub const COMMUTE_SPAN_MINUTES: f64 = 45.0;

pub mod attr {
    pub const WAGE: &str = "wage";
    pub const PHYSICAL_DEMAND: &str = "physical_demand";
    pub const REMOTE_WORK: &str = "remote_work";
    pub const CAREER_GROWTH: &str = "career_growth";
    pub const FLEXIBILITY: &str = "flexibility";
    pub const COMMUTE_TIME: &str = "commute_time";
    pub const JOB_SECURITY: &str = "job_security";
    pub const TASK_VARIETY: &str = "task_variety";
    pub const SOCIAL_INTERACTION: &str = "social_interaction";
    pub const COMPANY_VALUES: &str = "company_values";
}

/// The latent preference dimensions, in vector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Financial,
    WorkEnvironment,
    CareerGrowth,
    WorkLifeBalance,
    JobSecurity,
    TaskPreference,
    ValuesCulture,
}

impl Dimension {
    pub const ALL: [Dimension; NUM_DIMENSIONS] = [
        Dimension::Financial,
        Dimension::WorkEnvironment,
        Dimension::CareerGrowth,
        Dimension::WorkLifeBalance,
        Dimension::JobSecurity,
        Dimension::TaskPreference,
        Dimension::ValuesCulture,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Dimension::Financial => "financial",
            Dimension::WorkEnvironment => "work_environment",
            Dimension::CareerGrowth => "career_growth",
            Dimension::WorkLifeBalance => "work_life_balance",
            Dimension::JobSecurity => "job_security",
            Dimension::TaskPreference => "task_preference",
            Dimension::ValuesCulture => "values_culture",
        }
    }

    /// Dimensions that average several raw attributes.
    pub fn is_aggregated(self) -> bool {
        matches!(
            self,
            Dimension::WorkEnvironment | Dimension::WorkLifeBalance | Dimension::TaskPreference
        )
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A job profile: attribute name → numeric level.
///
/// Ordinal attributes carry their declared level (wage, commute minutes);
/// binary attributes carry 0 or 1.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobProfile {
    attributes: BTreeMap<String, f64>,
}

impl JobProfile {
    pub fn new(attributes: BTreeMap<String, f64>) -> Self {
        Self { attributes }
    }

    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.attributes.get(name).copied()
    }

    pub fn attributes(&self) -> &BTreeMap<String, f64> {
        &self.attributes
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl FromIterator<(String, f64)> for JobProfile {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            attributes: iter.into_iter().collect(),
        }
    }
}

fn commute_score(minutes: f64) -> f64 {
    ((COMMUTE_ZERO_MINUTES - minutes) / COMMUTE_SPAN_MINUTES).max(0.0)
}

fn mean_of_present(values: &[Option<f64>]) -> f64 {
    let (sum, count) = values
        .iter()
        .flatten()
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Per-component scores feeding an aggregated dimension, in declaration
/// order. `None` marks an absent attribute.
pub fn dimension_components(profile: &JobProfile, dim: Dimension) -> Vec<Option<f64>> {
    let commute = profile.get(attr::COMMUTE_TIME).map(commute_score);
    match dim {
        Dimension::Financial => vec![profile.get(attr::WAGE).map(|w| w / WAGE_SCALE)],
        Dimension::WorkEnvironment => vec![
            profile.get(attr::PHYSICAL_DEMAND).map(|p| 1.0 - p),
            profile.get(attr::REMOTE_WORK),
            commute,
        ],
        Dimension::CareerGrowth => vec![profile.get(attr::CAREER_GROWTH)],
        Dimension::WorkLifeBalance => vec![profile.get(attr::FLEXIBILITY), commute],
        Dimension::JobSecurity => vec![profile.get(attr::JOB_SECURITY)],
        Dimension::TaskPreference => vec![
            profile.get(attr::TASK_VARIETY),
            profile.get(attr::SOCIAL_INTERACTION),
        ],
        Dimension::ValuesCulture => vec![profile.get(attr::COMPANY_VALUES)],
    }
}

/// Encode a profile into preference-feature space.
pub fn encode_profile(profile: &JobProfile) -> FeatureVector {
    FeatureVector::from_fn(|i, _| {
        let dim = Dimension::ALL[i];
        mean_of_present(&dimension_components(profile, dim))
    })
}

/// Cosine similarity; zero vectors are orthogonal to everything.
pub fn cosine_similarity(a: &FeatureVector, b: &FeatureVector) -> f64 {
    let na = a.norm();
    let nb = b.norm();
    if na <= f64::EPSILON || nb <= f64::EPSILON {
        return 0.0;
    }
    (a.dot(b) / (na * nb)).clamp(-1.0, 1.0)
}
