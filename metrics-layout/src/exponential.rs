use std::fmt;
use std::hash::{Hash, Hasher};

use tracing::debug;

use crate::boundaries::BOUNDARY_CONSTANTS;
use crate::float::{next_up, EXPONENT_MASK, IMPLICIT_BIT, MANTISSA_BITS, MANTISSA_MASK};
use crate::{registry, Layout, LayoutError, MAX_PRECISION};

/// An exponential histogram bucket layout.
///
/// Every binary exponent is split into `2^precision` buckets of equal width ratio, so each bucket
/// spans values within a relative range of roughly `2^(2^-precision) - 1`. Values are mapped to
/// buckets in constant time by table lookups on the raw IEEE 754 representation, and subnormal
/// values are mapped so that bucket indices stay contiguous across the whole range of finite
/// values.
///
/// Layouts are immutable and shared: [`ExponentialLayout::create`] returns the same instance for
/// the same precision for the lifetime of the process.
pub struct ExponentialLayout {
    precision: u8,
    underflow_bin_index: i32,
    overflow_bin_index: i32,
    boundaries: Box<[u64]>,
    indices: Box<[u32]>,
    first_normal_value_bits: u64,
    index_offset: i32,
}

impl ExponentialLayout {
    /// Gets the layout for the given precision.
    ///
    /// The layout is built on first use and cached, so repeated calls, including concurrent ones,
    /// return the same instance.
    ///
    /// # Errors
    ///
    /// If `precision` is greater than [`MAX_PRECISION`], an error is returned and nothing is built.
    pub fn create(precision: u8) -> Result<&'static ExponentialLayout, LayoutError> {
        registry::get_or_create(precision)
    }

    /// Builds the lookup tables for a precision already known to be valid.
    pub(crate) fn build(precision: u8) -> ExponentialLayout {
        debug_assert!(precision <= MAX_PRECISION);

        let p = u32::from(precision);
        let boundaries = calculate_boundaries(p);
        let indices = calculate_indices(&boundaries, p);
        let (first_normal_value_bits, index_offset) =
            align_subnormal_range(&indices, &boundaries, p);
        let overflow_bin_index = map_bits_to_bin_index(
            f64::MAX.to_bits(),
            &indices,
            &boundaries,
            p,
            first_normal_value_bits,
            index_offset,
        ) + 1;

        debug!(
            precision,
            first_normal_value_bits,
            index_offset,
            overflow_bin_index,
            "Built exponential layout."
        );

        ExponentialLayout {
            precision,
            underflow_bin_index: -overflow_bin_index,
            overflow_bin_index,
            boundaries,
            indices,
            first_normal_value_bits,
            index_offset,
        }
    }

    /// Gets the precision of this layout.
    pub fn precision(&self) -> u8 {
        self.precision
    }

    /// Gets the relative width of a bucket, `2^(2^-precision) - 1`.
    ///
    /// This is an upper bound on `(upper - lower) / lower` for any bucket covering normal values.
    pub fn relative_bucket_width(&self) -> f64 {
        relative_bucket_width(self.precision)
    }

    #[cfg(test)]
    pub(crate) fn first_normal_value_bits(&self) -> u64 {
        self.first_normal_value_bits
    }

    #[cfg(test)]
    pub(crate) fn index_offset(&self) -> i32 {
        self.index_offset
    }

    /// Lower bound approximation for a bucket index in `1..overflow_bin_index`.
    fn positive_lower_bound_approximation(&self, bin_index: i32) -> f64 {
        let bin_index_bits = bin_index as u64;
        if bin_index_bits < self.first_normal_value_bits {
            return f64::from_bits(bin_index_bits);
        }

        let p = u32::from(self.precision);
        let shifted = bin_index - self.index_offset;
        let k = (shifted & ((1 << p) - 1)) as usize;
        let mut exponent = shifted >> p;
        let mut mantissa = if k > 0 { self.boundaries[k - 1] } else { 0 };
        if exponent <= 0 {
            // Undo the renormalization of the encoder, rounding up to the first subnormal that
            // still lands in this bucket.
            let shift = (1 - exponent) as u32;
            mantissa += !u64::MAX.checked_shl(shift).unwrap_or(0);
            mantissa |= IMPLICIT_BIT;
            mantissa = mantissa.checked_shr(shift).unwrap_or(0);
            exponent = 0;
        }

        f64::from_bits(mantissa | ((exponent as u64) << MANTISSA_BITS))
    }
}

impl Layout for ExponentialLayout {
    #[inline]
    fn map_to_bin_index(&self, value: f64) -> i32 {
        let bits = value.to_bits();
        let index = map_bits_to_bin_index(
            bits,
            &self.indices,
            &self.boundaries,
            u32::from(self.precision),
            self.first_normal_value_bits,
            self.index_offset,
        );
        if bits >> 63 == 0 {
            index
        } else {
            -index
        }
    }

    fn underflow_bin_index(&self) -> i32 {
        self.underflow_bin_index
    }

    fn overflow_bin_index(&self) -> i32 {
        self.overflow_bin_index
    }

    fn bin_lower_bound_approximation(&self, bin_index: i32) -> f64 {
        if bin_index >= self.overflow_bin_index {
            f64::INFINITY
        } else if bin_index <= self.underflow_bin_index {
            f64::NEG_INFINITY
        } else if bin_index == 0 {
            -0.0
        } else if bin_index > 0 {
            self.positive_lower_bound_approximation(bin_index)
        } else {
            // Negating the lower bound of the mirrored bucket lands exactly on the boundary of the
            // neighbouring negative bucket, so step one value up.
            next_up(-self.positive_lower_bound_approximation(-bin_index + 1))
        }
    }
}

impl PartialEq for ExponentialLayout {
    fn eq(&self, other: &Self) -> bool {
        self.precision == other.precision
    }
}

impl Eq for ExponentialLayout {}

impl Hash for ExponentialLayout {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.precision.hash(state);
    }
}

impl fmt::Debug for ExponentialLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExponentialLayout")
            .field("precision", &self.precision)
            .field("underflow_bin_index", &self.underflow_bin_index)
            .field("overflow_bin_index", &self.overflow_bin_index)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ExponentialLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExponentialLayout [precision={}]", self.precision)
    }
}

/// Gets `2^(2^-precision) - 1`, the relative width of a bucket at the given precision.
pub(crate) fn relative_bucket_width(precision: u8) -> f64 {
    (std::f64::consts::LN_2 / f64::from(1u32 << precision)).exp_m1()
}

/// Downsamples the boundary constants to `2^precision + 1` mantissa thresholds.
///
/// The last two thresholds are pinned to the implicit bit, which no mantissa can reach.
fn calculate_boundaries(precision: u32) -> Box<[u64]> {
    let len = 1usize << precision;
    let stride_shift = u32::from(MAX_PRECISION) - precision;

    let mut boundaries = vec![IMPLICIT_BIT; len + 1];
    for (i, boundary) in boundaries.iter_mut().take(len - 1).enumerate() {
        *boundary = BOUNDARY_CONSTANTS[(i + 1) << stride_shift];
    }
    boundaries.into_boxed_slice()
}

/// For every value of the top `precision` mantissa bits, finds the first boundary above the
/// smallest mantissa with that prefix.
fn calculate_indices(boundaries: &[u64], precision: u32) -> Box<[u32]> {
    let len = 1usize << precision;
    let mut indices = Vec::with_capacity(len);
    let mut cursor = 0;
    for prefix in 0..len as u64 {
        let mantissa_lower_bound = prefix << (MANTISSA_BITS - precision);
        while boundaries[cursor] <= mantissa_lower_bound {
            cursor += 1;
        }
        indices.push(cursor as u32);
    }
    indices.into_boxed_slice()
}

/// Finds where subnormal bit patterns stop getting a bucket each, and the offset that keeps the
/// bucket indices on either side of that point contiguous.
///
/// Near zero every bit pattern is further from its neighbour than a bucket is wide. Walking the
/// bit patterns upwards, the first pair of consecutive patterns sharing a bucket marks the end of
/// that identity region. The region only shrinks relative to the bucket width as the patterns
/// grow, so the walk stops after a few thousand steps at most, far below the mantissa cap.
fn align_subnormal_range(indices: &[u32], boundaries: &[u64], precision: u32) -> (u64, i32) {
    let mut value_bits = 0;
    let mut index = i32::MIN;
    for next_value_bits in 1..=MANTISSA_MASK {
        let next_index =
            map_bits_to_bin_index(next_value_bits, indices, boundaries, precision, 0, 0);
        if next_index == index {
            break;
        }
        value_bits = next_value_bits;
        index = next_index;
    }

    (value_bits, value_bits as i32 - index)
}

/// Maps the magnitude encoded in `bits` to a bucket index, ignoring the sign bit.
#[inline]
fn map_bits_to_bin_index(
    bits: u64,
    indices: &[u32],
    boundaries: &[u64],
    precision: u32,
    first_normal_value_bits: u64,
    index_offset: i32,
) -> i32 {
    let mut mantissa = bits & MANTISSA_MASK;
    let mut exponent = ((bits & EXPONENT_MASK) >> MANTISSA_BITS) as i32;
    if exponent == 0 {
        if mantissa < first_normal_value_bits {
            return mantissa as i32;
        }

        // Normalize the subnormal mantissa the way hardware would, pushing the exponent negative.
        let nlz = mantissa.leading_zeros() as i32 - 12;
        exponent -= nlz;
        mantissa <<= nlz + 1;
        mantissa &= MANTISSA_MASK;
    }

    let i = indices[(mantissa >> (MANTISSA_BITS - precision)) as usize] as usize;
    let k = i + usize::from(mantissa >= boundaries[i]) + usize::from(mantissa >= boundaries[i + 1]);
    (exponent << precision) + k as i32 + index_offset
}
