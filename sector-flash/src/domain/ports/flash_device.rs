//! FlashDevice port - Secondary (driven) port for physical flash access.
//!
//! This port defines what the sector driver needs from the hardware layer.
//! Each target platform provides one adapter implementing it; the driver
//! never talks to memory controllers directly.

use crate::domain::value_objects::FlashGeometry;
use core::error::Error;

/// Port for physical NOR flash operations.
///
/// All addresses are absolute flash offsets. Every call blocks until the
/// hardware finished; implementations may suspend interrupts or park other
/// cores for the duration of an erase or program.
///
/// # Hexagonal Architecture
///
/// ```text
/// ┌─────────────────────┐
/// │   Domain Layer      │
/// │  (SectorDriver)     │
/// └──────────┬──────────┘
///            │ depends on
///            ▼
/// ┌─────────────────────┐
/// │  FlashDevice Port   │  ◄── This trait
/// └──────────┬──────────┘
///            │ implemented by
///            ▼
/// ┌─────────────────────┐
/// │  Adapter Layer      │
/// │ (NorFlashDevice,    │
/// │  RamFlash, ...)     │
/// └─────────────────────┘
/// ```
pub trait FlashDevice {
    /// The error type for device operations.
    type Error: Error + 'static;

    /// Platform geometry, including the free flash window.
    fn geometry(&self) -> FlashGeometry;

    /// Read `dest.len()` bytes starting at `address`.
    ///
    /// Always reflects the last committed physical state.
    fn read(&mut self, address: u32, dest: &mut [u8]) -> Result<(), Self::Error>;

    /// Reset the `len` bytes starting at `address` to the erased value.
    ///
    /// `address` and `len` are sector aligned.
    fn erase_sector(&mut self, address: u32, len: u32) -> Result<(), Self::Error>;

    /// Program `data` at `address`.
    ///
    /// Programming can only clear bits. The target range must be erased, or
    /// `data` must not require any bit to go from 0 back to 1. `address` and
    /// `data.len()` are multiples of the geometry page size.
    fn program(&mut self, address: u32, data: &[u8]) -> Result<(), Self::Error>;
}

impl<D: FlashDevice + ?Sized> FlashDevice for &mut D {
    type Error = D::Error;

    #[inline]
    fn geometry(&self) -> FlashGeometry {
        (**self).geometry()
    }

    #[inline]
    fn read(&mut self, address: u32, dest: &mut [u8]) -> Result<(), Self::Error> {
        (**self).read(address, dest)
    }

    #[inline]
    fn erase_sector(&mut self, address: u32, len: u32) -> Result<(), Self::Error> {
        (**self).erase_sector(address, len)
    }

    #[inline]
    fn program(&mut self, address: u32, data: &[u8]) -> Result<(), Self::Error> {
        (**self).program(address, data)
    }
}
