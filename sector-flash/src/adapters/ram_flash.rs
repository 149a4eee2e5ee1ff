//! RAM-backed NOR flash simulator.
//!
//! `RamFlash` behaves like real NOR flash: erase resets whole sectors to
//! `0xFF` and program can only clear bits. It counts every physical
//! operation, which makes it useful for host-side simulation and for
//! checking how much wear a sequence of writes causes.

use crate::domain::{ports::FlashDevice, value_objects::{FlashGeometry, ERASED_BYTE}};
use alloc::vec::Vec;
use core::fmt;

/// Counters of physical operations performed on a [`RamFlash`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlashStats {
    /// Read calls.
    pub reads: usize,
    /// Sector erase calls.
    pub erases: usize,
    /// Program calls.
    pub programs: usize,
    /// Bytes handed to program calls.
    pub programmed_bytes: usize,
}

/// Simulated NOR flash held in memory.
///
/// # Examples
///
/// ```
/// use sector_flash::{FlashDevice, RamFlash};
///
/// let mut flash = RamFlash::new(0x4000, 0x1000, 0x100);
/// flash.program(0x1000, &[0x0F; 0x100]).unwrap();
/// // Programming can only clear bits
/// flash.program(0x1000, &[0xF0; 0x100]).unwrap();
/// assert_eq!(flash.contents()[0x1000], 0x00);
///
/// flash.erase_sector(0x1000, 0x1000).unwrap();
/// assert_eq!(flash.contents()[0x1000], 0xFF);
/// assert_eq!(flash.stats().erases, 1);
/// ```
#[derive(Debug, Clone)]
pub struct RamFlash {
    data: Vec<u8>,
    geometry: FlashGeometry,
    stats: FlashStats,
}

impl RamFlash {
    /// Create an erased flash of `capacity` bytes.
    ///
    /// The whole device is reported as free flash; narrow it with
    /// [`with_free_region`](Self::with_free_region).
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is not a multiple of `sector_size`.
    pub fn new(capacity: usize, sector_size: u32, page_size: u32) -> Self {
        assert!(
            sector_size > 0 && capacity % sector_size as usize == 0,
            "capacity must be a multiple of sector_size"
        );
        Self {
            data: alloc::vec![ERASED_BYTE; capacity],
            geometry: FlashGeometry {
                sector_size,
                page_size,
                free_start: 0,
                free_end: capacity as u32,
            },
            stats: FlashStats::default(),
        }
    }

    /// Report `start..end` as the free flash window.
    pub fn with_free_region(mut self, start: u32, end: u32) -> Self {
        self.geometry.free_start = start;
        self.geometry.free_end = end;
        self
    }

    /// Raw contents of the whole device.
    pub fn contents(&self) -> &[u8] {
        &self.data
    }

    /// Total size in bytes.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Operation counters since creation or the last reset.
    pub fn stats(&self) -> FlashStats {
        self.stats
    }

    /// Reset all operation counters.
    pub fn reset_stats(&mut self) {
        self.stats = FlashStats::default();
    }

    fn range(&self, address: u32, len: usize) -> Result<core::ops::Range<usize>, RamFlashError> {
        let start = address as usize;
        match start.checked_add(len) {
            Some(end) if end <= self.data.len() => Ok(start..end),
            _ => Err(RamFlashError::OutOfBounds { address, len }),
        }
    }
}

impl FlashDevice for RamFlash {
    type Error = RamFlashError;

    fn geometry(&self) -> FlashGeometry {
        self.geometry
    }

    fn read(&mut self, address: u32, dest: &mut [u8]) -> Result<(), Self::Error> {
        let range = self.range(address, dest.len())?;
        dest.copy_from_slice(&self.data[range]);
        self.stats.reads += 1;
        Ok(())
    }

    fn erase_sector(&mut self, address: u32, len: u32) -> Result<(), Self::Error> {
        let sector = self.geometry.sector_size;
        if address % sector != 0 || len % sector != 0 {
            return Err(RamFlashError::NotAligned {
                address,
                len: len as usize,
            });
        }

        let range = self.range(address, len as usize)?;
        self.data[range].fill(ERASED_BYTE);
        self.stats.erases += 1;
        Ok(())
    }

    fn program(&mut self, address: u32, data: &[u8]) -> Result<(), Self::Error> {
        let page = self.geometry.page_size.max(1);
        if address % page != 0 || data.len() % page as usize != 0 {
            return Err(RamFlashError::NotAligned {
                address,
                len: data.len(),
            });
        }

        let range = self.range(address, data.len())?;
        for (cell, byte) in self.data[range].iter_mut().zip(data) {
            *cell &= *byte;
        }
        self.stats.programs += 1;
        self.stats.programmed_bytes += data.len();
        Ok(())
    }
}

/// Error type for [`RamFlash`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RamFlashError {
    /// The access reaches past the end of the device.
    OutOfBounds {
        /// Start of the access.
        address: u32,
        /// Length of the access.
        len: usize,
    },
    /// Erase or program not aligned to the sector or page size.
    NotAligned {
        /// Start of the access.
        address: u32,
        /// Length of the access.
        len: usize,
    },
}

impl fmt::Display for RamFlashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { address, len } => {
                write!(f, "RAM flash access of {} bytes at {:#x} out of bounds", len, address)
            }
            Self::NotAligned { address, len } => {
                write!(f, "RAM flash access of {} bytes at {:#x} not aligned", len, address)
            }
        }
    }
}

impl core::error::Error for RamFlashError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_flash_is_erased() {
        let flash = RamFlash::new(0x2000, 0x1000, 0x100);
        assert!(flash.contents().iter().all(|&b| b == ERASED_BYTE));
        assert_eq!(flash.geometry().free_end, 0x2000);
    }

    #[test]
    fn test_program_clears_bits_only() {
        let mut flash = RamFlash::new(0x1000, 0x1000, 4);
        flash.program(0, &[0b1010_1010; 4]).unwrap();
        flash.program(0, &[0b0101_1111; 4]).unwrap();
        assert_eq!(flash.contents()[0], 0b0000_1010);
        assert_eq!(flash.stats().programs, 2);
        assert_eq!(flash.stats().programmed_bytes, 8);
    }

    #[test]
    fn test_program_requires_page_alignment() {
        let mut flash = RamFlash::new(0x1000, 0x1000, 0x100);
        assert!(matches!(
            flash.program(0x10, &[0; 0x100]),
            Err(RamFlashError::NotAligned { address: 0x10, .. })
        ));
        assert!(matches!(
            flash.program(0, &[0; 0x10]),
            Err(RamFlashError::NotAligned { len: 0x10, .. })
        ));
    }

    #[test]
    fn test_erase_requires_sector_alignment() {
        let mut flash = RamFlash::new(0x2000, 0x1000, 0x100);
        assert!(flash.erase_sector(0x800, 0x1000).is_err());
        assert!(flash.erase_sector(0x1000, 0x1000).is_ok());
        assert_eq!(flash.stats().erases, 1);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut flash = RamFlash::new(0x1000, 0x1000, 0x100);
        let mut buf = [0u8; 2];
        assert_eq!(
            flash.read(0xFFF, &mut buf),
            Err(RamFlashError::OutOfBounds { address: 0xFFF, len: 2 })
        );
        assert!(flash.erase_sector(0x1000, 0x1000).is_err());
    }

    #[test]
    fn test_reset_stats() {
        let mut flash = RamFlash::new(0x1000, 0x1000, 0x100);
        let mut buf = [0u8; 1];
        flash.read(0, &mut buf).unwrap();
        assert_eq!(flash.stats().reads, 1);
        flash.reset_stats();
        assert_eq!(flash.stats(), FlashStats::default());
    }

    #[test]
    #[should_panic(expected = "multiple of sector_size")]
    fn test_capacity_must_be_sector_multiple() {
        let _ = RamFlash::new(0x1800, 0x1000, 0x100);
    }
}
