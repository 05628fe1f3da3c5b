use credit_score_core::{decide, probability_to_score, risk_score, ScoringParams, Threshold};
use proptest::prelude::*;

// Property-based checks for the score transform and decision policy

fn bounds() -> impl Strategy<Value = (f64, f64)> {
    (0.0f64..0.5, 0.01f64..0.5).prop_map(|(low, width)| (low, (low + width).min(1.0)))
}

proptest! {
    #[test]
    fn score_stays_within_range(p in -10.0f64..10.0, (p_min, p_max) in bounds()) {
        let score = probability_to_score(p, p_min, p_max);
        prop_assert!((0.0..=100.0).contains(&score));
    }

    #[test]
    fn score_is_monotonic(a in 0.0f64..=1.0, b in 0.0f64..=1.0, (p_min, p_max) in bounds()) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(
            probability_to_score(low, p_min, p_max) <= probability_to_score(high, p_min, p_max)
        );
    }

    #[test]
    fn clipping_is_exact(delta in 0.0f64..1.0) {
        let params = ScoringParams::default();
        prop_assert_eq!(params.probability_to_score(params.p_min() - delta), 0.0);
        prop_assert_eq!(params.probability_to_score(params.p_max() + delta), 100.0);
    }

    #[test]
    fn risk_is_a_probability(p in 0.0f64..=1.0, prediction in 0u8..=1) {
        let risk = risk_score(p, prediction);
        prop_assert!((0.0..=1.0).contains(&risk));
    }

    #[test]
    fn decisions_agree_with_threshold(p in 0.0f64..=1.0, t in 0.0f64..=1.0) {
        let outcome = decide(p, Threshold::new(t).unwrap()).unwrap();
        prop_assert_eq!(outcome.prediction == 1, p >= t);
        prop_assert!((0.0..=1.0).contains(&outcome.risk_score));
    }
}

#[test]
fn reference_bounds_match_published_values() {
    let params = ScoringParams::new(0.006125, 0.723838).unwrap();
    assert_eq!(params.probability_to_score(0.006125), 0.0);
    assert_eq!(params.probability_to_score(0.723838), 100.0);
    assert!((params.probability_to_score(0.365) - 50.04).abs() < 0.05);
}

#[test]
fn persisted_bounds_reproduce_scores() {
    let params = ScoringParams::new(0.013, 0.61).unwrap();
    let json = serde_json::to_string(&params).unwrap();
    let reloaded: ScoringParams = serde_json::from_str(&json).unwrap();
    for p in [0.0, 0.05, 0.2, 0.4, 0.6, 0.9] {
        assert!((params.probability_to_score(p) - reloaded.probability_to_score(p)).abs() < 1e-6);
    }
}

#[test]
fn threshold_above_one_is_rejected() {
    assert!(Threshold::new(1.5).unwrap_err().is_client_error());
}
