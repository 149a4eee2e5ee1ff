//! Critical-section wrapper for flash devices.
//!
//! On most microcontrollers the CPU executes from the same flash it erases
//! and programs. Interrupt handlers fetching code from flash during such an
//! operation stall or fault, so erase and program must run with interrupts
//! suspended.

use crate::domain::{ports::FlashDevice, value_objects::FlashGeometry};

/// Runs erase and program of the wrapped device inside
/// [`critical_section::with`].
///
/// Reads are passed through unchanged.
#[derive(Debug)]
pub struct CriticalSectionFlash<D> {
    inner: D,
}

impl<D: FlashDevice> CriticalSectionFlash<D> {
    /// Wrap `inner`.
    pub const fn new(inner: D) -> Self {
        Self { inner }
    }

    /// The wrapped device.
    pub fn inner(&self) -> &D {
        &self.inner
    }

    /// Unwrap the device.
    pub fn into_inner(self) -> D {
        self.inner
    }
}

impl<D: FlashDevice> FlashDevice for CriticalSectionFlash<D> {
    type Error = D::Error;

    #[inline]
    fn geometry(&self) -> FlashGeometry {
        self.inner.geometry()
    }

    #[inline]
    fn read(&mut self, address: u32, dest: &mut [u8]) -> Result<(), Self::Error> {
        self.inner.read(address, dest)
    }

    fn erase_sector(&mut self, address: u32, len: u32) -> Result<(), Self::Error> {
        critical_section::with(|_| self.inner.erase_sector(address, len))
    }

    fn program(&mut self, address: u32, data: &[u8]) -> Result<(), Self::Error> {
        critical_section::with(|_| self.inner.program(address, data))
    }
}

#[cfg(test)]
#[cfg(feature = "alloc")]
mod tests {
    use super::*;
    use crate::adapters::RamFlash;
    use crate::domain::HeapSectorDriver;

    #[test]
    fn test_passes_operations_through() {
        let mut flash = CriticalSectionFlash::new(RamFlash::new(0x2000, 0x1000, 0x100));
        flash.program(0x1000, &[0x00; 0x100]).unwrap();
        flash.erase_sector(0x1000, 0x1000).unwrap();

        let stats = flash.inner().stats();
        assert_eq!(stats.programs, 1);
        assert_eq!(stats.erases, 1);
        assert_eq!(flash.geometry(), flash.inner().geometry());
    }

    #[test]
    fn test_driver_commits_through_wrapper() {
        let device = CriticalSectionFlash::new(RamFlash::new(0x4000, 0x1000, 0x100));
        let mut driver = HeapSectorDriver::new(device, "cs", 0x2000, 0x2000);

        driver.write_u32(0x10, 0xDEAD_BEEF).unwrap();
        driver.commit().unwrap();

        assert_eq!(driver.read_u32(0x10).unwrap(), 0xDEAD_BEEF);
        assert_eq!(driver.into_inner().into_inner().stats().programs, 1);
    }
}
