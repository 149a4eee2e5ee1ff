//! Sector state for tracking buffer modifications.

/// The state of the cached sector.
///
/// A cached sector transitions through these states:
/// - Clean: nothing was written since it was loaded or committed
/// - Dirty: writes were applied and may differ from flash
///
/// `Dirty` is only a hint. The commit engine still compares the buffer with
/// flash byte by byte before touching the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SectorState {
    /// Buffer was not written since load or commit.
    #[default]
    Clean,
    /// Buffer received writes since load or commit.
    Dirty,
}

impl SectorState {
    /// Check if the sector is dirty.
    #[inline]
    pub const fn is_dirty(&self) -> bool {
        matches!(self, SectorState::Dirty)
    }

    /// Check if the sector is clean.
    #[inline]
    pub const fn is_clean(&self) -> bool {
        matches!(self, SectorState::Clean)
    }
}
