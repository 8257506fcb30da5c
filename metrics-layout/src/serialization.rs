//! Wire format for exponential layouts.
//!
//! A layout is identified by its precision alone, so it is serialized as exactly two bytes: the
//! serial version followed by the precision. Lookup tables are never transmitted. Decoding resolves
//! the precision through the process-wide registry, which means a decoded layout is the very same
//! instance [`ExponentialLayout::create`] returns.
use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::debug;

use crate::{ExponentialLayout, LayoutError};

/// The only serial version understood by this crate.
pub const SERIAL_VERSION_V0: u8 = 0;

/// Length of a serialized layout, in bytes.
pub const SERIALIZED_LEN: usize = 2;

impl ExponentialLayout {
    /// Writes this layout to `buf`.
    ///
    /// # Panics
    ///
    /// Panics if `buf` does not have room for [`SERIALIZED_LEN`] bytes.
    pub fn write<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(SERIAL_VERSION_V0);
        buf.put_u8(self.precision());
    }

    /// Serializes this layout into a new buffer.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(SERIALIZED_LEN);
        self.write(&mut buf);
        buf.freeze()
    }

    /// Reads a layout from `buf`, consuming exactly the bytes that belong to it.
    ///
    /// # Errors
    ///
    /// The version byte is checked first: if it is not [`SERIAL_VERSION_V0`], an error is returned
    /// without interpreting the precision. If the precision is out of range, or `buf` runs out of
    /// bytes, an error is returned as well.
    pub fn read<B: Buf>(buf: &mut B) -> Result<&'static ExponentialLayout, LayoutError> {
        let version = read_u8(buf)?;
        if version != SERIAL_VERSION_V0 {
            debug!(version, "Rejected serialized layout with unsupported version.");
            return Err(LayoutError::UnsupportedVersion {
                expected: SERIAL_VERSION_V0,
                actual: version,
            });
        }

        let precision = read_u8(buf)?;
        ExponentialLayout::create(precision).map_err(|e| {
            debug!(precision, "Rejected serialized layout with invalid precision.");
            e
        })
    }

    /// Deserializes a layout from a byte slice.
    ///
    /// Trailing bytes after the layout are ignored.
    ///
    /// # Errors
    ///
    /// See [`ExponentialLayout::read`].
    pub fn from_bytes(mut bytes: &[u8]) -> Result<&'static ExponentialLayout, LayoutError> {
        Self::read(&mut bytes)
    }
}

fn read_u8<B: Buf>(buf: &mut B) -> Result<u8, LayoutError> {
    if buf.has_remaining() {
        Ok(buf.get_u8())
    } else {
        Err(LayoutError::UnexpectedEof)
    }
}

#[cfg(test)]
mod tests {
    use bytes::Buf;

    use super::{SERIALIZED_LEN, SERIAL_VERSION_V0};
    use crate::{ExponentialLayout, LayoutError, MAX_PRECISION};

    #[test]
    fn test_round_trip_is_same_instance() {
        for precision in 0..=MAX_PRECISION {
            let layout = ExponentialLayout::create(precision).unwrap();
            let bytes = layout.to_bytes();
            assert_eq!(&bytes[..], &[SERIAL_VERSION_V0, precision]);
            assert_eq!(bytes.len(), SERIALIZED_LEN);

            let decoded = ExponentialLayout::from_bytes(&bytes).unwrap();
            assert!(std::ptr::eq(layout, decoded));
        }
    }

    #[test]
    fn test_precision_out_of_range() {
        let result = ExponentialLayout::from_bytes(&[0x00, 0x0B]);
        assert_eq!(result, Err(LayoutError::InvalidPrecision { precision: 11 }));
    }

    #[test]
    fn test_unsupported_version() {
        for precision in [0x00, 0x05, 0xFF] {
            let result = ExponentialLayout::from_bytes(&[0x01, precision]);
            assert_eq!(result, Err(LayoutError::UnsupportedVersion { expected: 0, actual: 1 }));
        }

        // The precision byte is left unread.
        let mut buf = &[0xFFu8, 0x03][..];
        assert!(ExponentialLayout::read(&mut buf).is_err());
        assert_eq!(buf.remaining(), 1);
    }

    #[test]
    fn test_truncated_input() {
        assert_eq!(ExponentialLayout::from_bytes(&[]), Err(LayoutError::UnexpectedEof));
        assert_eq!(ExponentialLayout::from_bytes(&[0x00]), Err(LayoutError::UnexpectedEof));
    }

    #[test]
    fn test_read_consumes_only_its_bytes() {
        let mut buf = &[0x00u8, 0x04, 0xAA, 0xBB][..];
        let layout = ExponentialLayout::read(&mut buf).unwrap();
        assert_eq!(layout.precision(), 4);
        assert_eq!(buf, &[0xAAu8, 0xBB][..]);
    }

    #[test]
    fn test_write_appends() {
        let mut buf = Vec::new();
        ExponentialLayout::create(2).unwrap().write(&mut buf);
        ExponentialLayout::create(10).unwrap().write(&mut buf);
        assert_eq!(buf, vec![0u8, 2, 0, 10]);
    }
}
