use cortex_eas::compute_eas;
use proptest::prelude::*;

proptest! {
    #[test]
    fn invariant_2_nonnegative_outputs(
        m in proptest::collection::vec(proptest::collection::vec(-1.0f64..1.0, 3), 1..6),
        q in proptest::collection::vec(-1.0f64..1.0, 3),
        r in proptest::collection::vec(-1.0f64..1.0, 3),
    ) {
        let result = compute_eas(&m, &q, &r);
        for &s in &result.scores {
            prop_assert!(s >= 0.0);
        }
        for &raw in &result.raw_scores {
            prop_assert!(raw >= 0.0);
        }
    }

    #[test]
    fn invariant_3_deterministic(
        m in proptest::collection::vec(proptest::collection::vec(-1.0f64..1.0, 4), 1..5),
        q in proptest::collection::vec(-1.0f64..1.0, 4),
        r in proptest::collection::vec(-1.0f64..1.0, 4),
    ) {
        let a = compute_eas(&m, &q, &r);
        let b = compute_eas(&m, &q, &r);
        prop_assert_eq!(a.scores, b.scores);
        prop_assert_eq!(a.raw_scores, b.raw_scores);
    }

    #[test]
    fn invariant_1_scores_sum_to_one_when_k_ge_1(
        m in proptest::collection::vec(proptest::collection::vec(-1.0f64..1.0, 3), 1..6),
        q in proptest::collection::vec(-1.0f64..1.0, 3),
        r in proptest::collection::vec(-1.0f64..1.0, 3),
    ) {
        let result = compute_eas(&m, &q, &r);
        let sum: f64 = result.scores.iter().sum();
        prop_assert!((sum - 1.0).abs() < 1e-9);
    }
}
