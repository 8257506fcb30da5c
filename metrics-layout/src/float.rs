//! Bit-level helpers for IEEE 754 double precision values.

/// Mask selecting the 52-bit mantissa.
pub(crate) const MANTISSA_MASK: u64 = 0x000F_FFFF_FFFF_FFFF;

/// Mask selecting the 11-bit biased exponent.
pub(crate) const EXPONENT_MASK: u64 = 0x7FF0_0000_0000_0000;

/// The implicit leading bit of a normal mantissa, one past the largest mantissa.
pub(crate) const IMPLICIT_BIT: u64 = 0x0010_0000_0000_0000;

/// Number of explicitly stored mantissa bits.
pub(crate) const MANTISSA_BITS: u32 = 52;

/// Maps a value onto a signed integer so that integer order matches numeric order.
///
/// Positive values keep their bit pattern, negative values have their magnitude bits flipped. `-0.0`
/// maps to `-1` and `+0.0` to `0`, so the two zeroes stay distinct and adjacent. NaNs map outside of
/// the range spanned by the infinities.
pub(crate) fn to_ordered_bits(value: f64) -> i64 {
    let bits = value.to_bits() as i64;
    bits ^ (((bits >> 63) as u64) >> 1) as i64
}

/// Inverse of [`to_ordered_bits`].
pub(crate) fn from_ordered_bits(ordered: i64) -> f64 {
    let bits = ordered ^ (((ordered >> 63) as u64) >> 1) as i64;
    f64::from_bits(bits as u64)
}

/// Gets the smallest value strictly greater than `value`.
///
/// Both zeroes step to the smallest positive subnormal. NaN and positive infinity are returned
/// unchanged.
pub(crate) fn next_up(value: f64) -> f64 {
    if value.is_nan() || value == f64::INFINITY {
        value
    } else if value == 0.0 {
        f64::from_bits(1)
    } else {
        from_ordered_bits(to_ordered_bits(value) + 1)
    }
}

/// Gets the largest value strictly less than `value`.
pub(crate) fn next_down(value: f64) -> f64 {
    if value.is_nan() || value == f64::NEG_INFINITY {
        value
    } else if value == 0.0 {
        -f64::from_bits(1)
    } else {
        from_ordered_bits(to_ordered_bits(value) - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_bits_preserve_order() {
        let values = [
            f64::NEG_INFINITY,
            f64::MIN,
            -1.0,
            -f64::MIN_POSITIVE,
            -f64::from_bits(1),
            -0.0,
            0.0,
            f64::from_bits(1),
            f64::MIN_POSITIVE,
            1.0,
            f64::MAX,
            f64::INFINITY,
        ];

        for pair in values.windows(2) {
            assert!(to_ordered_bits(pair[0]) < to_ordered_bits(pair[1]), "{:?}", pair);
        }

        assert_eq!(to_ordered_bits(-0.0), -1);
        assert_eq!(to_ordered_bits(0.0), 0);
    }

    #[test]
    fn test_ordered_bits_round_trip() {
        for value in [f64::MIN, -3.5, -0.0, 0.0, 1.0e-310, 42.0, f64::INFINITY] {
            let decoded = from_ordered_bits(to_ordered_bits(value));
            assert_eq!(decoded.to_bits(), value.to_bits());
        }
    }

    #[test]
    fn test_next_up_and_down() {
        assert_eq!(next_up(0.0), f64::from_bits(1));
        assert_eq!(next_up(-0.0), f64::from_bits(1));
        assert_eq!(next_up(1.0), 1.0 + f64::EPSILON);
        assert_eq!(next_up(-f64::from_bits(1)).to_bits(), (-0.0f64).to_bits());
        assert_eq!(next_up(f64::MAX), f64::INFINITY);
        assert_eq!(next_up(f64::NEG_INFINITY), f64::MIN);
        assert_eq!(next_up(f64::INFINITY), f64::INFINITY);

        assert_eq!(next_down(0.0), -f64::from_bits(1));
        assert_eq!(next_down(1.0 + f64::EPSILON), 1.0);
        assert_eq!(next_down(f64::MIN), f64::NEG_INFINITY);
        assert_eq!(next_down(f64::INFINITY), f64::MAX);
    }
}
