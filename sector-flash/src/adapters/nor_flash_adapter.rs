//! NOR Flash adapter for embedded-storage traits
//!
//! This module provides an adapter that wraps types implementing
//! `embedded-storage` NOR flash traits and exposes them as a [`FlashDevice`].
//!
//! # Example
//!
//! ```ignore
//! use esp_storage::FlashStorage as EspFlash;
//! use sector_flash::{HeapSectorDriver, NorFlashConfig, NorFlashDevice};
//!
//! let config = NorFlashConfig::new().with_free_region(0x30_0000, 0x40_0000);
//! let device = NorFlashDevice::new(EspFlash::new(), config);
//!
//! let mut driver = HeapSectorDriver::new(device, "params", 0x3F_0000, 0x2000);
//! ```

use embedded_storage::nor_flash::{NorFlash, NorFlashErrorKind};

use crate::domain::{ports::FlashDevice, value_objects::FlashGeometry};

/// Bounce buffer length for reads that do not meet the flash read alignment.
const BOUNCE_LEN: usize = 64;

/// Default program page size in bytes.
pub const DEFAULT_PAGE_SIZE: u32 = 256;

/// Configuration of the flash window handed to sector drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NorFlashConfig {
    /// First byte that is not occupied by firmware.
    pub free_start: u32,
    /// End of free flash, the device capacity when `None`.
    pub free_end: Option<u32>,
    /// Program granularity used when committing sectors.
    pub page_size: u32,
}

impl NorFlashConfig {
    /// Whole device free, 256 byte pages.
    pub const fn new() -> Self {
        Self {
            free_start: 0,
            free_end: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Restrict free flash to `start..end`.
    pub const fn with_free_region(mut self, start: u32, end: u32) -> Self {
        self.free_start = start;
        self.free_end = Some(end);
        self
    }

    /// Set the program page size.
    pub const fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }
}

impl Default for NorFlashConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Error type for NOR flash operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NorFlashError {
    kind: NorFlashErrorKind,
}

impl NorFlashError {
    /// Wrap an error kind reported by the flash driver.
    pub const fn new(kind: NorFlashErrorKind) -> Self {
        Self { kind }
    }

    /// The error kind reported by the flash driver.
    pub const fn kind(&self) -> NorFlashErrorKind {
        self.kind
    }
}

impl core::fmt::Display for NorFlashError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.kind {
            NorFlashErrorKind::NotAligned => write!(f, "NOR flash error: not aligned"),
            NorFlashErrorKind::OutOfBounds => write!(f, "NOR flash error: out of bounds"),
            _ => write!(f, "NOR flash error"),
        }
    }
}

impl core::error::Error for NorFlashError {}

impl embedded_storage::nor_flash::NorFlashError for NorFlashError {
    fn kind(&self) -> NorFlashErrorKind {
        self.kind
    }
}

#[inline]
fn map_err<E: embedded_storage::nor_flash::NorFlashError>(err: E) -> NorFlashError {
    NorFlashError::new(err.kind())
}

/// Adapter that wraps embedded-storage NOR flash as a [`FlashDevice`].
///
/// Sector size comes from `F::ERASE_SIZE`. Reads that are not aligned to
/// `F::READ_SIZE` go through a small bounce buffer, so sector drivers can
/// read any byte range.
pub struct NorFlashDevice<F> {
    flash: F,
    config: NorFlashConfig,
}

impl<F: NorFlash> NorFlashDevice<F> {
    /// Create a new NOR flash adapter
    ///
    /// # Panics
    ///
    /// Panics if the page size is not a multiple of `F::WRITE_SIZE`, or if
    /// `F::READ_SIZE` does not divide the bounce buffer length.
    pub fn new(flash: F, config: NorFlashConfig) -> Self {
        assert!(
            F::WRITE_SIZE > 0 && config.page_size as usize % F::WRITE_SIZE == 0,
            "page_size must be a multiple of WRITE_SIZE"
        );
        assert!(
            F::READ_SIZE > 0 && BOUNCE_LEN % F::READ_SIZE == 0,
            "READ_SIZE must divide 64"
        );
        Self { flash, config }
    }

    /// Get the configuration
    pub fn config(&self) -> &NorFlashConfig {
        &self.config
    }

    /// Consume the adapter and return the underlying flash
    pub fn into_inner(self) -> F {
        self.flash
    }

    fn read_unaligned(&mut self, address: u32, dest: &mut [u8]) -> Result<(), NorFlashError> {
        let read_size = F::READ_SIZE as u32;
        let mut scratch = [0u8; BOUNCE_LEN];
        let mut done = 0;

        while done < dest.len() {
            let pos = address + done as u32;
            let base = pos - pos % read_size;
            let skip = (pos - base) as usize;
            let n = (BOUNCE_LEN - skip).min(dest.len() - done);
            let span = (skip + n).div_ceil(F::READ_SIZE) * F::READ_SIZE;

            self.flash.read(base, &mut scratch[..span]).map_err(map_err)?;
            dest[done..done + n].copy_from_slice(&scratch[skip..skip + n]);
            done += n;
        }
        Ok(())
    }
}

impl<F: NorFlash> FlashDevice for NorFlashDevice<F> {
    type Error = NorFlashError;

    fn geometry(&self) -> FlashGeometry {
        FlashGeometry {
            sector_size: F::ERASE_SIZE as u32,
            page_size: self.config.page_size,
            free_start: self.config.free_start,
            free_end: self
                .config
                .free_end
                .unwrap_or(self.flash.capacity() as u32),
        }
    }

    fn read(&mut self, address: u32, dest: &mut [u8]) -> Result<(), Self::Error> {
        let aligned = address as usize % F::READ_SIZE == 0 && dest.len() % F::READ_SIZE == 0;
        if aligned {
            self.flash.read(address, dest).map_err(map_err)
        } else {
            self.read_unaligned(address, dest)
        }
    }

    fn erase_sector(&mut self, address: u32, len: u32) -> Result<(), Self::Error> {
        self.flash.erase(address, address + len).map_err(map_err)
    }

    fn program(&mut self, address: u32, data: &[u8]) -> Result<(), Self::Error> {
        self.flash.write(address, data).map_err(map_err)
    }
}
