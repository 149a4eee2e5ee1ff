//! Flash geometry and the validated reserved region.

use super::SectorLayout;
use core::fmt;

/// Value of every byte of a freshly erased sector.
pub const ERASED_BYTE: u8 = 0xFF;

/// Platform flash geometry, reported once by the physical device.
///
/// `free_start..free_end` is the window of flash not consumed by code, data,
/// a filesystem or other reserved areas. All values are absolute flash
/// offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlashGeometry {
    /// Smallest erasable unit in bytes.
    pub sector_size: u32,
    /// Program granularity in bytes; divides `sector_size`.
    pub page_size: u32,
    /// First absolute offset available for reserved regions.
    pub free_start: u32,
    /// End (exclusive) of flash available for reserved regions.
    pub free_end: u32,
}

/// A reserved flash region validated against the platform geometry.
///
/// Only constructible through [`FlashRegion::new`], so holding one proves
/// the region is sector aligned and lies inside the free flash window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashRegion {
    offset: u32,
    size: u32,
    geometry: FlashGeometry,
}

impl FlashRegion {
    /// Validate `offset` and `size` against `geometry`.
    ///
    /// # Errors
    ///
    /// Checks run in this order and the first violation is reported:
    /// zero sector size, page size not dividing the sector size, unaligned
    /// size, unaligned offset, region end behind the free flash end, region
    /// start before the free flash start.
    ///
    /// # Examples
    ///
    /// ```
    /// use sector_flash::domain::{FlashGeometry, FlashRegion, RegionError};
    ///
    /// let geometry = FlashGeometry {
    ///     sector_size: 0x1000,
    ///     page_size: 0x100,
    ///     free_start: 0x8000,
    ///     free_end: 0x20000,
    /// };
    ///
    /// assert!(FlashRegion::new(0x10000, 0x2000, geometry).is_ok());
    /// assert_eq!(
    ///     FlashRegion::new(0x10000, 0x1800, geometry),
    ///     Err(RegionError::SizeUnaligned { size: 0x1800, sector_size: 0x1000 })
    /// );
    /// ```
    pub const fn new(offset: u32, size: u32, geometry: FlashGeometry) -> Result<Self, RegionError> {
        let sector_size = geometry.sector_size;

        if sector_size == 0 {
            return Err(RegionError::ZeroSectorSize);
        }
        if geometry.page_size == 0 || sector_size % geometry.page_size != 0 {
            return Err(RegionError::PageSizeInvalid {
                page_size: geometry.page_size,
                sector_size,
            });
        }
        if size % sector_size != 0 {
            return Err(RegionError::SizeUnaligned { size, sector_size });
        }
        if offset % sector_size != 0 {
            return Err(RegionError::OffsetUnaligned { offset, sector_size });
        }

        let end = offset as u64 + size as u64;
        if end > geometry.free_end as u64 {
            return Err(RegionError::EndBehindFreeFlash {
                end,
                free_end: geometry.free_end,
            });
        }
        if offset < geometry.free_start {
            return Err(RegionError::StartBeforeFreeFlash {
                offset,
                free_start: geometry.free_start,
            });
        }

        Ok(Self {
            offset,
            size,
            geometry,
        })
    }

    /// Absolute start of the region.
    #[inline]
    pub const fn offset(&self) -> u32 {
        self.offset
    }

    /// Reserved capacity in bytes.
    #[inline]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Sector size of the underlying flash.
    #[inline]
    pub const fn sector_size(&self) -> u32 {
        self.geometry.sector_size
    }

    /// Number of sectors in the region.
    #[inline]
    pub const fn sector_count(&self) -> u32 {
        self.size / self.geometry.sector_size
    }

    /// Program granularity of the underlying flash.
    #[inline]
    pub const fn page_size(&self) -> u32 {
        self.geometry.page_size
    }

    /// Geometry the region was validated against.
    #[inline]
    pub const fn geometry(&self) -> &FlashGeometry {
        &self.geometry
    }

    /// Address translator for this region.
    #[inline]
    pub const fn layout(&self) -> SectorLayout {
        SectorLayout::new(self.geometry.sector_size)
    }

    /// Absolute flash address of a relative address.
    #[inline]
    pub const fn absolute(&self, relative: u32) -> u32 {
        self.offset + relative
    }

    /// Whether `len` bytes starting at `relative` stay inside the region.
    #[inline]
    pub const fn contains(&self, relative: u32, len: usize) -> bool {
        relative as u64 + len as u64 <= self.size as u64
    }
}

/// Reasons a reserved region is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum RegionError {
    /// The device reported a sector size of zero.
    ZeroSectorSize,
    /// Program page size is zero or does not divide the sector size.
    PageSizeInvalid {
        /// Program granularity of the device.
        page_size: u32,
        /// Sector size of the device.
        sector_size: u32,
    },
    /// Region size is not a multiple of the sector size.
    SizeUnaligned {
        /// Requested region size.
        size: u32,
        /// Sector size of the device.
        sector_size: u32,
    },
    /// Region offset is not a multiple of the sector size.
    OffsetUnaligned {
        /// Requested region offset.
        offset: u32,
        /// Sector size of the device.
        sector_size: u32,
    },
    /// Region ends behind the free flash window.
    EndBehindFreeFlash {
        /// Exclusive end of the requested region.
        end: u64,
        /// Exclusive end of free flash.
        free_end: u32,
    },
    /// Region starts before the free flash window.
    StartBeforeFreeFlash {
        /// Requested region offset.
        offset: u32,
        /// First free flash offset.
        free_start: u32,
    },
    /// A fixed-size sector buffer does not match the device sector size.
    BufferMismatch {
        /// Length of the sector buffer.
        buffer: usize,
        /// Sector size of the device.
        sector_size: u32,
    },
}

impl fmt::Display for RegionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroSectorSize => write!(f, "Flash: sector size is zero"),
            Self::PageSizeInvalid {
                page_size,
                sector_size,
            } => write!(
                f,
                "Flash: page size {:#x} does not divide sector size {:#x}",
                page_size, sector_size
            ),
            Self::SizeUnaligned { size, sector_size } => write!(
                f,
                "Flash: size {:#x} unaligned to sector size {:#x}",
                size, sector_size
            ),
            Self::OffsetUnaligned { offset, sector_size } => write!(
                f,
                "Flash: offset {:#x} unaligned to sector size {:#x}",
                offset, sector_size
            ),
            Self::EndBehindFreeFlash { end, free_end } => write!(
                f,
                "Flash: end {:#x} behind free flash end {:#x}",
                end, free_end
            ),
            Self::StartBeforeFreeFlash { offset, free_start } => write!(
                f,
                "Flash: offset {:#x} starts before free flash begin {:#x}",
                offset, free_start
            ),
            Self::BufferMismatch {
                buffer,
                sector_size,
            } => write!(
                f,
                "Flash: sector buffer of {} bytes cannot hold sectors of {} bytes",
                buffer, sector_size
            ),
        }
    }
}

impl core::error::Error for RegionError {}
