//! Logistic closeness score between two numeric features

/// Closeness of `a` and `b`, in `(0, 0.5]`.
///
/// `1 / (1 + e^(k * (a - b)^2))`: an exact match scores 0.5 and the score
/// falls off faster as `k` grows. Profile weights are tuned against this
/// exact form.
pub fn similarity(a: f64, b: f64, k: f64) -> f64 {
    let squared_diff = (a - b).powi(2);
    1.0 / (1.0 + (k * squared_diff).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_is_half() {
        assert_eq!(similarity(0.785, 0.785, 70.0), 0.5);
        assert_eq!(similarity(-3.0, -3.0, 1.0), 0.5);
    }

    #[test]
    fn test_falls_off_with_distance() {
        let near = similarity(1.0, 1.1, 70.0);
        let far = similarity(1.0, 1.3, 70.0);
        assert!(near > far);
        assert!(far > 0.0);
    }

    #[test]
    fn test_falls_off_with_k() {
        assert!(similarity(0.0, 0.2, 70.0) > similarity(0.0, 0.2, 100.0));
    }

    #[test]
    fn test_symmetric() {
        assert_eq!(similarity(0.2, 0.7, 100.0), similarity(0.7, 0.2, 100.0));
    }
}
