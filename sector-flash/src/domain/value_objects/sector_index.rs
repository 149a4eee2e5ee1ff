//! Type-safe sector index value object.

use core::fmt;

/// Index of a sector inside a reserved flash region.
///
/// Sector indices are relative to the start of the region, never absolute
/// flash positions. Keeping them in their own type avoids mixing them with
/// byte addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SectorIndex(u32);

impl SectorIndex {
    /// Create a new sector index.
    ///
    /// # Examples
    ///
    /// ```
    /// use sector_flash::domain::SectorIndex;
    ///
    /// let sector = SectorIndex::new(3);
    /// assert_eq!(sector.value(), 3);
    /// ```
    #[inline]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Get the underlying u32 value.
    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SectorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sector({})", self.0)
    }
}

impl From<u32> for SectorIndex {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<SectorIndex> for u32 {
    fn from(sector: SectorIndex) -> Self {
        sector.value()
    }
}
