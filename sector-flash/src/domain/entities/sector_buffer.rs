//! Backing storage for the cached sector.

use crate::domain::value_objects::ERASED_BYTE;

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

/// Memory that can hold one cached sector.
///
/// The driver allocates its buffer lazily on the first sector load and keeps
/// reusing it afterwards. Two flavours exist:
/// - Stack-allocated: `[u8; N]` for no_std environments, where `N` must equal
///   the device sector size
/// - Heap-allocated: `Vec<u8>` when the `alloc` feature is enabled, sized at
///   runtime from the device geometry
pub trait SectorBuffer: AsRef<[u8]> + AsMut<[u8]> + Sized {
    /// Whether this buffer type can hold sectors of `len` bytes.
    fn fits(len: usize) -> bool;

    /// Allocate a buffer of `len` bytes filled with the erased value.
    ///
    /// Only called after [`SectorBuffer::fits`] accepted `len`.
    fn allocate(len: usize) -> Self;
}

impl<const N: usize> SectorBuffer for [u8; N] {
    #[inline]
    fn fits(len: usize) -> bool {
        len == N
    }

    #[inline]
    fn allocate(_len: usize) -> Self {
        [ERASED_BYTE; N]
    }
}

#[cfg(feature = "alloc")]
impl SectorBuffer for Vec<u8> {
    #[inline]
    fn fits(_len: usize) -> bool {
        true
    }

    fn allocate(len: usize) -> Self {
        alloc::vec![ERASED_BYTE; len]
    }
}
