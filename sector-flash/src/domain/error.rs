//! Driver-level errors.
//!
//! These errors represent rule violations of the sector driver and failures
//! reported by the physical flash device through the port error type.

use core::fmt;

/// Errors that can occur while using a [`SectorDriver`](crate::domain::SectorDriver).
#[derive(Debug)]
#[non_exhaustive]
pub enum DriverError<E> {
    /// An operation reached outside the reserved region.
    OutOfRange {
        /// Relative start address of the operation.
        address: u32,
        /// Length of the operation in bytes.
        len: usize,
        /// Size of the reserved region.
        size: u32,
    },

    /// Error from the underlying FlashDevice implementation.
    Device(E),
}

impl<E: fmt::Display> fmt::Display for DriverError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { address, len, size } => write!(
                f,
                "Access of {} bytes at {:#x} exceeds region of {:#x} bytes",
                len, address, size
            ),
            Self::Device(e) => write!(f, "Flash device error: {}", e),
        }
    }
}

impl<E: core::error::Error + 'static> core::error::Error for DriverError<E> {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Device(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_display() {
        let error: DriverError<core::fmt::Error> = DriverError::OutOfRange {
            address: 0x1FFF,
            len: 4,
            size: 0x2000,
        };

        let msg = format!("{}", error);
        assert!(msg.contains("4 bytes"));
        assert!(msg.contains("0x1fff"));
        assert!(msg.contains("0x2000"));
    }

    #[test]
    fn test_device_error_is_source() {
        use core::error::Error;

        let error: DriverError<core::fmt::Error> = DriverError::Device(core::fmt::Error);
        assert!(error.source().is_some());
        assert!(format!("{}", error).starts_with("Flash device error"));

        let error: DriverError<core::fmt::Error> = DriverError::OutOfRange {
            address: 0,
            len: 1,
            size: 0,
        };
        assert!(error.source().is_none());
    }
}
