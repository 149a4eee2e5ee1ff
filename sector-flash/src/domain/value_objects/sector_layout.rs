//! Address translation between relative byte addresses and sectors.

use super::SectorIndex;

/// Maps relative addresses inside a region onto fixed-size sectors.
///
/// All addresses handled here are relative to the region start. The layout
/// knows nothing about where the region lives in flash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorLayout {
    sector_size: u32,
}

/// Position of a relative address inside its sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SectorSpan {
    /// Sector owning the address.
    pub sector: SectorIndex,
    /// Byte offset of the address inside that sector.
    pub offset: usize,
    /// Contiguous bytes from `offset` to the end of the sector.
    pub available: usize,
}

/// The part of a larger operation that falls into a single sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Segment {
    /// Sector this segment lives in.
    pub sector: SectorIndex,
    /// Byte offset inside the sector.
    pub offset: usize,
    /// Number of bytes in this segment.
    pub len: usize,
    /// Offset of this segment inside the caller's data.
    pub source: usize,
}

impl SectorLayout {
    /// Create a layout for the given sector size.
    ///
    /// # Panics
    ///
    /// Panics if `sector_size` is zero.
    pub const fn new(sector_size: u32) -> Self {
        assert!(sector_size > 0, "sector_size must be non-zero");
        Self { sector_size }
    }

    /// Sector size in bytes.
    #[inline]
    pub const fn sector_size(&self) -> u32 {
        self.sector_size
    }

    /// Sector containing `relative`.
    #[inline]
    pub const fn sector_of(&self, relative: u32) -> SectorIndex {
        SectorIndex::new(relative / self.sector_size)
    }

    /// Relative address of the first byte of `sector`.
    #[inline]
    pub const fn sector_start(&self, sector: SectorIndex) -> u32 {
        sector.value() * self.sector_size
    }

    /// Resolve `relative` into sector, in-sector offset and room left.
    ///
    /// # Examples
    ///
    /// ```
    /// use sector_flash::domain::{SectorIndex, SectorLayout};
    ///
    /// let layout = SectorLayout::new(0x1000);
    /// let span = layout.locate(0x1FF0);
    /// assert_eq!(span.sector, SectorIndex::new(1));
    /// assert_eq!(span.offset, 0xFF0);
    /// assert_eq!(span.available, 0x10);
    /// ```
    #[inline]
    pub const fn locate(&self, relative: u32) -> SectorSpan {
        let offset = (relative % self.sector_size) as usize;
        SectorSpan {
            sector: self.sector_of(relative),
            offset,
            available: self.sector_size as usize - offset,
        }
    }

    /// Split `len` bytes starting at `relative` into per-sector segments.
    ///
    /// Segments come out in ascending address order. An empty range yields
    /// no segments.
    pub const fn segments(&self, relative: u32, len: usize) -> Segments {
        Segments {
            layout: *self,
            next: relative,
            remaining: len,
            source: 0,
        }
    }
}

/// Iterator over the per-sector pieces of an operation.
///
/// Created by [`SectorLayout::segments`].
#[derive(Debug, Clone)]
pub struct Segments {
    layout: SectorLayout,
    next: u32,
    remaining: usize,
    source: usize,
}

impl Iterator for Segments {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        if self.remaining == 0 {
            return None;
        }

        let span = self.layout.locate(self.next);
        let len = span.available.min(self.remaining);
        let segment = Segment {
            sector: span.sector,
            offset: span.offset,
            len,
            source: self.source,
        };

        self.next = self.next.saturating_add(len as u32);
        self.remaining -= len;
        self.source += len;
        Some(segment)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.remaining == 0 {
            return (0, Some(0));
        }
        let first = self.layout.locate(self.next).available;
        let rest = self.remaining.saturating_sub(first);
        let sector = self.layout.sector_size as usize;
        let count = 1 + rest.div_ceil(sector);
        (count, Some(count))
    }
}

impl ExactSizeIterator for Segments {}
