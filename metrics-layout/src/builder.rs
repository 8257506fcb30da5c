use crate::exponential::relative_bucket_width;
use crate::{ExponentialLayout, LayoutError, MAX_PRECISION};

const DEFAULT_PRECISION: u8 = 7;

enum Resolution {
    Precision(u8),
    MaxRelativeError(f64),
}

/// Builder for an [`ExponentialLayout`].
///
/// A layout can be configured either with an explicit precision or with the largest relative
/// error a bucket may have, in which case the coarsest precision meeting that error is chosen.
/// Whichever of the two was configured last wins.
pub struct LayoutBuilder {
    resolution: Resolution,
}

impl LayoutBuilder {
    /// Creates a new [`LayoutBuilder`] with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the precision.
    ///
    /// Each binary exponent is split into `2^precision` buckets, and valid precisions range from 0
    /// to [`MAX_PRECISION`].
    ///
    /// Defaults to 7, or 128 buckets per power of two, which keeps the relative error of a bucket
    /// below 0.55%.
    #[must_use]
    pub fn with_precision(mut self, precision: u8) -> Self {
        self.resolution = Resolution::Precision(precision);
        self
    }

    /// Set the largest acceptable relative error of a bucket.
    ///
    /// The relative error of a bucket is its width divided by its lower bound. For example, a value
    /// of `0.01` selects precision 7, the smallest precision whose buckets are at most 1% wide.
    #[must_use]
    pub fn with_max_relative_error(mut self, relative_error: f64) -> Self {
        self.resolution = Resolution::MaxRelativeError(relative_error);
        self
    }

    /// Gets the precision this builder would build a layout for.
    ///
    /// # Errors
    ///
    /// If the configured precision is out of range, or the configured relative error is invalid
    /// or finer than the finest precision can provide, an error is returned.
    pub fn precision(&self) -> Result<u8, LayoutError> {
        match self.resolution {
            Resolution::Precision(precision) if precision <= MAX_PRECISION => Ok(precision),
            Resolution::Precision(precision) => Err(LayoutError::InvalidPrecision { precision }),
            Resolution::MaxRelativeError(relative_error) => {
                precision_for_relative_error(relative_error)
            }
        }
    }

    /// Builds the layout, or gets it from the cache of published layouts.
    ///
    /// # Errors
    ///
    /// See [`LayoutBuilder::precision`].
    pub fn build(self) -> Result<&'static ExponentialLayout, LayoutError> {
        ExponentialLayout::create(self.precision()?)
    }
}

impl Default for LayoutBuilder {
    fn default() -> Self {
        LayoutBuilder { resolution: Resolution::Precision(DEFAULT_PRECISION) }
    }
}

fn precision_for_relative_error(relative_error: f64) -> Result<u8, LayoutError> {
    if !relative_error.is_finite() || relative_error <= 0.0 {
        return Err(LayoutError::InvalidRelativeError { relative_error });
    }

    (0..=MAX_PRECISION)
        .find(|precision| relative_bucket_width(*precision) <= relative_error)
        .ok_or(LayoutError::UnachievableRelativeError { relative_error })
}
