use nalgebra::SymmetricEigen;
use proptest::prelude::*;

use elicit_harness::{
    choice_probabilities, d_efficiency, expected_fim, prior_fim, vignette_fim, Contrast,
    FeatureVector,
};

fn vec7(range: std::ops::Range<f64>) -> impl Strategy<Value = FeatureVector> {
    prop::collection::vec(range, 7).prop_map(|v| FeatureVector::from_column_slice(&v))
}

proptest! {
    #[test]
    fn probabilities_sum_to_one(
        beta in vec7(-20.0..20.0),
        x_a in vec7(0.0..1.0),
        x_b in vec7(0.0..1.0),
        temperature in 0.1f64..5.0,
    ) {
        let (p_a, p_b) = choice_probabilities(&Contrast::new(x_a, x_b), &beta, temperature);
        prop_assert!((p_a + p_b - 1.0).abs() < 1e-9);
        prop_assert!((0.0..=1.0).contains(&p_a));
    }

    #[test]
    fn vignette_fim_is_symmetric_psd(
        beta in vec7(-5.0..5.0),
        x_a in vec7(0.0..1.0),
        x_b in vec7(0.0..1.0),
    ) {
        let fim = vignette_fim(&Contrast::new(x_a, x_b), &beta);
        prop_assert!((fim - fim.transpose()).amax() < 1e-12);
        let eig = SymmetricEigen::new(fim);
        prop_assert!(eig.eigenvalues.iter().all(|&l| l >= -1e-9));
    }

    #[test]
    fn determinant_never_decreases_as_information_accumulates(
        beta in vec7(-3.0..3.0),
        pairs in prop::collection::vec((vec7(0.0..1.0), vec7(0.0..1.0)), 1..12),
    ) {
        let mut fim = prior_fim(1.0);
        let mut det = d_efficiency(&fim);
        for (x_a, x_b) in pairs {
            let contrast = Contrast::new(x_a, x_b);
            let (next, gain) = expected_fim(&contrast, &beta, &fim);
            prop_assert!(gain >= -1e-9 * det.max(1.0));
            let next_det = d_efficiency(&next);
            prop_assert!(next_det + 1e-9 * det.max(1.0) >= det);
            fim = next;
            det = next_det;
        }
    }
}

#[test]
fn degenerate_determinants_clamp_to_zero() {
    let mut fim = prior_fim(1.0);
    fim[(0, 0)] = -5.0;
    assert_eq!(d_efficiency(&fim), 0.0);
    fim[(0, 0)] = f64::NAN;
    assert_eq!(d_efficiency(&fim), 0.0);
}
