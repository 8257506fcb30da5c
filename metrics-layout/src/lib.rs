//! Exponential bucket layouts for histograms.
//!
//! A layout maps every finite `f64` to an integer bucket index. Buckets grow exponentially: each
//! power of two is split into `2^precision` buckets of equal width ratio, so a bucket never spans
//! more than a fixed relative range of values. Histograms built on the same layout can be merged by
//! simply adding up the counts of matching indices.
//!
//! Mapping a value is a constant-time, allocation-free operation that works directly on the bits of
//! the value, and covers negative values, zeroes and subnormal values with contiguous indices.
//!
//! # Usage
//!
//! ```
//! use metrics_layout::{ExponentialLayout, Layout};
//!
//! let layout = ExponentialLayout::create(0).expect("precision is valid");
//! assert_eq!(layout.map_to_bin_index(1.0), layout.map_to_bin_index(1.99));
//! assert_eq!(layout.map_to_bin_index(2.0), layout.map_to_bin_index(1.0) + 1);
//!
//! // Layouts are shared: asking for the same precision again yields the same instance.
//! assert!(std::ptr::eq(layout, ExponentialLayout::create(0).unwrap()));
//! ```
//!
//! Layouts can also be chosen by the relative error a bucket may have:
//!
//! ```
//! use metrics_layout::LayoutBuilder;
//!
//! let layout = LayoutBuilder::new()
//!     .with_max_relative_error(0.01)
//!     .build()
//!     .expect("relative error is achievable");
//! assert_eq!(layout.precision(), 7);
//! ```
//!
//! # Serialization
//!
//! A layout serializes to two bytes, a version and the precision. See
//! [`ExponentialLayout::write`] and [`ExponentialLayout::read`].
#![deny(missing_docs)]

mod boundaries;
mod float;

mod builder;
pub use self::builder::LayoutBuilder;

mod error;
pub use self::error::LayoutError;

mod exponential;
pub use self::exponential::ExponentialLayout;

mod layout;
pub use self::layout::Layout;

mod registry;

mod serialization;
pub use self::serialization::{SERIALIZED_LEN, SERIAL_VERSION_V0};

/// The finest supported precision.
///
/// At this precision, each power of two is split into 1024 buckets.
pub const MAX_PRECISION: u8 = 10;
