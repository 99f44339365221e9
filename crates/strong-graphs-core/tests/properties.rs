use proptest::prelude::*;

use strong_graphs_core::params::arcs_from_density;
use strong_graphs_core::{generate, UniformWeights};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn generated_instances_keep_their_certificate(
        seed in 0u64..10_000,
        n in 2u32..24,
        density in 0.0f64..=1.0,
        ratio in 0.0f64..=1.0,
        lower in -500i64..=0,
        upper in 0i64..=500,
    ) {
        let m = arcs_from_density(n, density) as u32;
        let weights = UniformWeights::new(lower, upper).unwrap();
        let instance = generate(seed, n, m, ratio, &weights).unwrap();

        prop_assert!(instance.verify().is_ok());
        prop_assert!(!instance.network.has_negative_cycle());
        prop_assert!(instance.network.reaches_all_from(instance.source));
        prop_assert!(instance.network.reached_by_all(instance.source));

        let arcs = instance.arc_count();
        prop_assert!(arcs >= m as usize);
        prop_assert!(arcs <= (m + n - 1) as usize);

        let budget = instance.budget;
        prop_assert!(instance.negative_arc_count() <= budget.realized());
        prop_assert!(budget.realized() <= instance.non_positive_arc_count());
        prop_assert_eq!(budget.shortfall(), 0);
        prop_assert_eq!(budget.realized(), budget.target);
        if upper > 0 {
            prop_assert_eq!(instance.non_positive_arc_count(), budget.target);
        }
    }

    #[test]
    fn generation_is_reproducible(seed in 0u64..10_000, ratio in 0.0f64..=1.0) {
        let weights = UniformWeights::default();
        let a = generate(seed, 16, 70, ratio, &weights).unwrap();
        let b = generate(seed, 16, 70, ratio, &weights).unwrap();
        prop_assert_eq!(a, b);
    }
}
