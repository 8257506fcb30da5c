use metrics_layout::{ExponentialLayout, Layout, MAX_PRECISION};
use proptest::prelude::*;

fn layout(precision: u8) -> &'static ExponentialLayout {
    ExponentialLayout::create(precision).expect("precision is valid")
}

fn finite() -> impl Strategy<Value = f64> {
    prop::num::f64::NORMAL | prop::num::f64::SUBNORMAL | prop::num::f64::ZERO
}

fn non_negative_finite() -> impl Strategy<Value = f64> {
    prop::num::f64::POSITIVE
        | prop::num::f64::NORMAL
        | prop::num::f64::SUBNORMAL
        | prop::num::f64::ZERO
}

fn positive_normal() -> impl Strategy<Value = f64> {
    prop::num::f64::POSITIVE | prop::num::f64::NORMAL
}

proptest! {
    #[test]
    fn test_sign_symmetry(precision in 0..=MAX_PRECISION, value in finite()) {
        let layout = layout(precision);
        prop_assert_eq!(layout.map_to_bin_index(-value), -layout.map_to_bin_index(value));
    }

    #[test]
    fn test_monotonic(precision in 0..=MAX_PRECISION, a in non_negative_finite(), b in non_negative_finite()) {
        let layout = layout(precision);
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(layout.map_to_bin_index(low) <= layout.map_to_bin_index(high));
        prop_assert!(layout.map_to_bin_index(-high) <= layout.map_to_bin_index(-low));
    }

    #[test]
    fn test_within_range(precision in 0..=MAX_PRECISION, value in finite()) {
        let layout = layout(precision);
        let index = layout.map_to_bin_index(value);
        prop_assert!(index > layout.underflow_bin_index());
        prop_assert!(index < layout.overflow_bin_index());
    }

    #[test]
    fn test_exact_bounds_contain_value(precision in 0..=MAX_PRECISION, value in finite()) {
        let layout = layout(precision);
        let index = layout.map_to_bin_index(value);
        let lower = layout.bin_lower_bound(index);
        let upper = layout.bin_upper_bound(index);
        prop_assert!(lower <= value && value <= upper, "{} not in [{}, {}]", value, lower, upper);
        prop_assert_eq!(layout.map_to_bin_index(lower), index);
        prop_assert_eq!(layout.map_to_bin_index(upper), index);
    }

    #[test]
    fn test_relative_error_bound(precision in 0..=MAX_PRECISION, value in positive_normal()) {
        let layout = layout(precision);
        let index = layout.map_to_bin_index(value);
        prop_assume!(index + 1 < layout.overflow_bin_index());

        let lower = layout.bin_lower_bound_approximation(index);
        let upper = layout.bin_lower_bound_approximation(index + 1);
        prop_assert!(lower <= value && value < upper, "{} not in [{}, {})", value, lower, upper);

        let max_relative_width = layout.relative_bucket_width() * (1.0 + 1e-9);
        prop_assert!((upper - lower) / lower <= max_relative_width);
    }

    #[test]
    fn test_approximation_exact_for_normal_values(precision in 0..=MAX_PRECISION, value in positive_normal()) {
        let layout = layout(precision);
        let index = layout.map_to_bin_index(value);
        prop_assume!(layout.bin_lower_bound(index) >= f64::MIN_POSITIVE);

        prop_assert_eq!(layout.bin_lower_bound_approximation(index), layout.bin_lower_bound(index));
        prop_assert_eq!(layout.bin_lower_bound_approximation(-index), layout.bin_lower_bound(-index));
    }

    #[test]
    fn test_serialization_round_trip(precision in 0..=MAX_PRECISION) {
        let layout = layout(precision);
        let decoded = ExponentialLayout::from_bytes(&layout.to_bytes()).unwrap();
        prop_assert!(std::ptr::eq(layout, decoded));
        prop_assert_eq!(layout, decoded);
    }
}

#[test]
fn test_index_density() {
    for precision in 0..=MAX_PRECISION {
        let layout = layout(precision);
        let step = if precision <= 5 { 1 } else { 61 };

        let mut index = layout.underflow_bin_index() + 1;
        while index < layout.overflow_bin_index() {
            let lower = layout.bin_lower_bound(index);
            assert!(lower.is_finite());
            assert_eq!(layout.map_to_bin_index(lower), index, "{} at index {}", layout, index);
            index += step;
        }
    }
}

#[test]
fn test_subnormal_transition_is_contiguous() {
    for precision in 0..=MAX_PRECISION {
        let layout = layout(precision);

        let mut previous = 0;
        for bits in 1..1u64 << 20 {
            let index = layout.map_to_bin_index(f64::from_bits(bits));
            assert!(index == previous || index == previous + 1, "{} at bits {}", layout, bits);
            previous = index;
        }
    }
}
