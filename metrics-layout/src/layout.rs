use std::fmt;

use crate::float::{from_ordered_bits, next_down, to_ordered_bits};

/// A mapping of finite values onto contiguous integer bucket indices.
///
/// Bucket indices increase with the values they cover. Every index strictly between
/// [`underflow_bin_index`](Layout::underflow_bin_index) and
/// [`overflow_bin_index`](Layout::overflow_bin_index) covers at least one finite value, while the
/// two sentinel indices mark values outside of the representable range.
///
/// Implementations must be cheap to share across threads: histograms hold references to a layout
/// and call [`map_to_bin_index`](Layout::map_to_bin_index) concurrently without synchronization.
pub trait Layout: Send + Sync + fmt::Debug {
    /// Maps a value to the index of the bucket containing it.
    ///
    /// The value must not be NaN or infinite. Such values are mapped to an unspecified index
    /// without panicking.
    fn map_to_bin_index(&self, value: f64) -> i32;

    /// Gets the index marking values below the representable range.
    fn underflow_bin_index(&self) -> i32;

    /// Gets the index marking values above the representable range.
    fn overflow_bin_index(&self) -> i32;

    /// Gets an approximation of the smallest value mapped to the given bucket index.
    ///
    /// Indices at or below the underflow index yield negative infinity, and indices at or above the
    /// overflow index yield positive infinity.
    fn bin_lower_bound_approximation(&self, bin_index: i32) -> f64;

    /// Clamps a bucket index into the range spanned by the two sentinel indices.
    fn normalize_bin_index(&self, bin_index: i32) -> i32 {
        bin_index.clamp(self.underflow_bin_index(), self.overflow_bin_index())
    }

    /// Gets the smallest value mapped to the given bucket index or above.
    ///
    /// Unlike [`bin_lower_bound_approximation`](Layout::bin_lower_bound_approximation), the result
    /// is exact: the approximation is only used as a starting point for a search over all doubles.
    fn bin_lower_bound(&self, bin_index: i32) -> f64 {
        if bin_index <= self.underflow_bin_index() {
            return f64::NEG_INFINITY;
        }
        let bin_index = bin_index.min(self.overflow_bin_index());
        first_value_at_or_above(self, bin_index)
    }

    /// Gets the largest value mapped to the given bucket index or below.
    fn bin_upper_bound(&self, bin_index: i32) -> f64 {
        if bin_index >= self.overflow_bin_index() {
            return f64::INFINITY;
        }
        let bin_index = bin_index.max(self.underflow_bin_index());
        next_down(first_value_at_or_above(self, bin_index + 1))
    }
}

impl<L: Layout + ?Sized> Layout for &L {
    fn map_to_bin_index(&self, value: f64) -> i32 {
        (**self).map_to_bin_index(value)
    }

    fn underflow_bin_index(&self) -> i32 {
        (**self).underflow_bin_index()
    }

    fn overflow_bin_index(&self) -> i32 {
        (**self).overflow_bin_index()
    }

    fn bin_lower_bound_approximation(&self, bin_index: i32) -> f64 {
        (**self).bin_lower_bound_approximation(bin_index)
    }
}

/// Finds the smallest value in `[-inf, +inf]` whose bucket index is at least `bin_index`.
///
/// `bin_index` must lie in `(underflow, overflow]`, which guarantees that negative infinity maps
/// below it and positive infinity maps at or above it.
fn first_value_at_or_above<L: Layout + ?Sized>(layout: &L, bin_index: i32) -> f64 {
    let predicate = |ordered: i64| layout.map_to_bin_index(from_ordered_bits(ordered)) >= bin_index;

    let hint = to_ordered_bits(layout.bin_lower_bound_approximation(bin_index));
    let ordered = find_first(
        predicate,
        to_ordered_bits(f64::NEG_INFINITY),
        to_ordered_bits(f64::INFINITY),
        hint,
    );
    from_ordered_bits(ordered)
}

/// Finds the first integer in `(low, high]` for which a monotone predicate holds.
///
/// The predicate must be false at `low` and true at `high`. The search gallops outwards from
/// `hint`, which is clamped into the range, and then bisects, so a good hint needs only a handful
/// of evaluations while a bad one costs at most a few hundred.
fn find_first<P>(predicate: P, mut low: i64, mut high: i64, hint: i64) -> i64
where
    P: Fn(i64) -> bool,
{
    let hint = hint.clamp(low, high);
    if predicate(hint) {
        high = hint;
        let mut step = 1i64;
        loop {
            let probe = high.saturating_sub(step).max(low);
            if probe == low {
                break;
            }
            if predicate(probe) {
                high = probe;
                step = step.saturating_mul(2);
            } else {
                low = probe;
                break;
            }
        }
    } else {
        low = hint;
        let mut step = 1i64;
        loop {
            let probe = low.saturating_add(step).min(high);
            if probe == high {
                break;
            }
            if predicate(probe) {
                high = probe;
                break;
            } else {
                low = probe;
                step = step.saturating_mul(2);
            }
        }
    }

    // Invariant: predicate(low) is false and predicate(high) is true.
    while high.wrapping_sub(low) as u64 > 1 {
        let mid = low.wrapping_add((high.wrapping_sub(low) as u64 / 2) as i64);
        if predicate(mid) {
            high = mid;
        } else {
            low = mid;
        }
    }
    high
}

#[cfg(test)]
mod tests {
    use super::find_first;
    use crate::float::next_up;
    use crate::{ExponentialLayout, Layout, MAX_PRECISION};

    #[test]
    fn test_find_first_with_any_hint() {
        let threshold = 1_000_003i64;
        for hint in [i64::MIN, -5, 0, 999_999, threshold, threshold + 1, 1 << 40, i64::MAX] {
            let found = find_first(|x| x >= threshold, -(1 << 50), 1 << 50, hint);
            assert_eq!(found, threshold, "hint {}", hint);
        }
    }

    #[test]
    fn test_find_first_over_full_range() {
        let found = find_first(|x| x >= 7, i64::MIN, i64::MAX, i64::MIN);
        assert_eq!(found, 7);

        let found = find_first(|x| x > i64::MIN, i64::MIN, i64::MAX, 0);
        assert_eq!(found, i64::MIN + 1);
    }

    #[test]
    fn test_sentinel_bounds() {
        for p in 0..=MAX_PRECISION {
            let layout = ExponentialLayout::create(p).unwrap();
            let underflow = layout.underflow_bin_index();
            let overflow = layout.overflow_bin_index();

            assert_eq!(layout.bin_lower_bound(underflow), f64::NEG_INFINITY);
            assert_eq!(layout.bin_upper_bound(underflow), f64::NEG_INFINITY);
            assert_eq!(layout.bin_lower_bound(underflow + 1), f64::MIN);
            assert_eq!(layout.bin_upper_bound(overflow - 1), f64::MAX);
            assert_eq!(layout.bin_lower_bound(overflow), f64::INFINITY);
            assert_eq!(layout.bin_upper_bound(overflow), f64::INFINITY);

            assert_eq!(layout.normalize_bin_index(i32::MIN), underflow);
            assert_eq!(layout.normalize_bin_index(i32::MAX), overflow);
            assert_eq!(layout.normalize_bin_index(3), 3);
        }
    }

    #[test]
    fn test_bounds_around_zero() {
        for p in 0..=MAX_PRECISION {
            let layout = ExponentialLayout::create(p).unwrap();
            assert_eq!(layout.bin_lower_bound(0).to_bits(), (-0.0f64).to_bits());
            assert_eq!(layout.bin_upper_bound(0).to_bits(), 0.0f64.to_bits());
            assert_eq!(layout.bin_lower_bound(1), f64::from_bits(1));
            assert_eq!(layout.bin_upper_bound(-1), -f64::from_bits(1));
        }
    }

    #[test]
    fn test_adjacent_bounds_touch() {
        let layout = ExponentialLayout::create(6).unwrap();
        for index in [-70_000, -1000, -3, 2, 64, 1500, 70_000] {
            let upper = layout.bin_upper_bound(index);
            let next_lower = layout.bin_lower_bound(index + 1);
            assert_eq!(next_up(upper), next_lower);
            assert_eq!(layout.map_to_bin_index(upper), index);
            assert_eq!(layout.map_to_bin_index(next_lower), index + 1);
        }
    }

    #[test]
    fn test_layout_through_reference() {
        let layout = ExponentialLayout::create(3).unwrap();
        let shared: &dyn Layout = &layout;
        assert_eq!(shared.map_to_bin_index(10.0), layout.map_to_bin_index(10.0));
        assert_eq!(shared.bin_lower_bound(100), layout.bin_lower_bound(100));
    }
}
