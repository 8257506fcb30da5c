use thiserror::Error;

/// Errors that could occur while creating, configuring or decoding a layout.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum LayoutError {
    /// The requested precision is outside of the supported range.
    #[error("invalid precision {precision}: must be between 0 and {max}", max = crate::MAX_PRECISION)]
    InvalidPrecision {
        /// The rejected precision.
        precision: u8,
    },

    /// A serialized layout carried a version this crate does not understand.
    #[error("unsupported serial version {actual}: expected {expected}")]
    UnsupportedVersion {
        /// The only supported version.
        expected: u8,

        /// The version found in the input.
        actual: u8,
    },

    /// The input ended before a complete layout could be read.
    #[error("unexpected end of input while reading layout")]
    UnexpectedEof,

    /// The requested relative error was not a finite, positive number.
    #[error("invalid relative error {relative_error}: must be finite and greater than 0")]
    InvalidRelativeError {
        /// The rejected relative error.
        relative_error: f64,
    },

    /// No supported precision yields buckets as narrow as the requested relative error.
    #[error("relative error {relative_error} is finer than the finest supported precision")]
    UnachievableRelativeError {
        /// The rejected relative error.
        relative_error: f64,
    },
}
