//! Tests for the similarity scorer

use farsight_eye::similarity;
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_bounded_by_half(a in -1.0e3f64..1.0e3, b in -1.0e3f64..1.0e3, k in 0.001f64..500.0) {
        let score = similarity(a, b, k);
        prop_assert!(score >= 0.0);
        prop_assert!(score <= 0.5);
        // Positive as long as the exponent does not overflow
        if k * (a - b).powi(2) < 700.0 {
            prop_assert!(score > 0.0);
        }
    }

    #[test]
    fn test_exact_match_scores_half(a in -1.0e6f64..1.0e6, k in 0.001f64..1.0e4) {
        prop_assert_eq!(similarity(a, a, k), 0.5);
    }

    #[test]
    fn test_non_increasing_in_distance(
        a in -10.0f64..10.0,
        d1 in 0.0f64..5.0,
        d2 in 0.0f64..5.0,
        k in 0.1f64..200.0,
    ) {
        let (near, far) = if d1 <= d2 { (d1, d2) } else { (d2, d1) };
        prop_assert!(similarity(a, a + near, k) >= similarity(a, a + far, k));
    }

    #[test]
    fn test_non_increasing_in_k(d in 0.01f64..2.0, k1 in 0.1f64..200.0, k2 in 0.1f64..200.0) {
        let (low, high) = if k1 <= k2 { (k1, k2) } else { (k2, k1) };
        prop_assert!(similarity(0.0, d, low) >= similarity(0.0, d, high));
    }
}
