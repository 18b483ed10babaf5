//! Binary logit choice model.
//!
//! P(A) = exp(u_A) / (exp(u_A) + exp(u_B)) with u = β·x / T, evaluated with
//! max-subtraction so large utilities do not overflow.

use serde::{Deserialize, Serialize};

use crate::features::{DimMatrix, FeatureVector};

/// Floor added inside the log so a zero probability stays finite.
pub const LOG_FLOOR: f64 = 1e-10;

/// Which option of a vignette the respondent chose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Choice {
    A,
    B,
}

impl Choice {
    pub fn option_id(self) -> &'static str {
        match self {
            Choice::A => "A",
            Choice::B => "B",
        }
    }

    pub fn from_option_id(id: &str) -> Option<Self> {
        match id.trim() {
            "A" | "a" => Some(Choice::A),
            "B" | "b" => Some(Choice::B),
            _ => None,
        }
    }

    pub fn other(self) -> Self {
        match self {
            Choice::A => Choice::B,
            Choice::B => Choice::A,
        }
    }
}

/// Encoded feature vectors of a vignette's two options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contrast {
    pub x_a: FeatureVector,
    pub x_b: FeatureVector,
}

impl Contrast {
    pub fn new(x_a: FeatureVector, x_b: FeatureVector) -> Self {
        Self { x_a, x_b }
    }

    /// x_A − x_B.
    pub fn diff(&self) -> FeatureVector {
        self.x_a - self.x_b
    }

    pub fn features(&self, choice: Choice) -> &FeatureVector {
        match choice {
            Choice::A => &self.x_a,
            Choice::B => &self.x_b,
        }
    }
}

/// Returns (p_A, p_B). `temperature` is clamped away from zero.
pub fn choice_probabilities(contrast: &Contrast, beta: &FeatureVector, temperature: f64) -> (f64, f64) {
    let t = temperature.max(f64::MIN_POSITIVE);
    let u_a = beta.dot(&contrast.x_a) / t;
    let u_b = beta.dot(&contrast.x_b) / t;
    let m = u_a.max(u_b);
    let e_a = (u_a - m).exp();
    let e_b = (u_b - m).exp();
    let p_a = e_a / (e_a + e_b);
    (p_a, 1.0 - p_a)
}

/// Likelihood of the observed choice.
pub fn choice_likelihood(
    contrast: &Contrast,
    beta: &FeatureVector,
    choice: Choice,
    temperature: f64,
) -> f64 {
    let (p_a, p_b) = choice_probabilities(contrast, beta, temperature);
    match choice {
        Choice::A => p_a,
        Choice::B => p_b,
    }
}

/// ln(p_chosen + 1e-10).
pub fn log_likelihood(contrast: &Contrast, beta: &FeatureVector, choice: Choice, temperature: f64) -> f64 {
    (choice_likelihood(contrast, beta, choice, temperature) + LOG_FLOOR).ln()
}

/// Closed-form ∇β log p_chosen.
///
/// For A: p_B·(x_A − x_B)/T. For B: −p_A·(x_A − x_B)/T.
pub fn log_likelihood_gradient(
    contrast: &Contrast,
    beta: &FeatureVector,
    choice: Choice,
    temperature: f64,
) -> FeatureVector {
    let t = temperature.max(f64::MIN_POSITIVE);
    let (p_a, p_b) = choice_probabilities(contrast, beta, temperature);
    let d = contrast.diff();
    match choice {
        Choice::A => d * (p_b / t),
        Choice::B => d * (-p_a / t),
    }
}

/// Closed-form ∇²β log p_chosen = −p_A·p_B·d·dᵀ / T², independent of the choice.
pub fn log_likelihood_hessian(contrast: &Contrast, beta: &FeatureVector, temperature: f64) -> DimMatrix {
    let t = temperature.max(f64::MIN_POSITIVE);
    let (p_a, p_b) = choice_probabilities(contrast, beta, temperature);
    let d = contrast.diff();
    -(d * d.transpose()) * (p_a * p_b / (t * t))
}
