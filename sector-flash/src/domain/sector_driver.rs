//! SectorDriver domain service - buffered byte access over a flash region.
//!
//! This module contains the `SectorDriver` service which caches one sector
//! at a time, applies writes to the cached copy and hands the sector to the
//! commit engine when switching sectors or on explicit commit.

use crate::domain::{
    commit::{self, CommitOutcome},
    entities::{SectorBuffer, SectorState},
    error::DriverError,
    ports::FlashDevice,
    value_objects::{FlashRegion, RegionError, SectorIndex},
};

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

/// Domain service providing byte-granular access to a reserved flash region.
///
/// `SectorDriver` implements the business rules of buffered flash access:
/// - At most one sector is cached; loading another sector commits the
///   cached one first
/// - Writes only touch the cached copy; hardware is written on sector switch
///   or explicit [`commit`](Self::commit)
/// - Reads go straight to physical flash and never consult the cache
/// - Every operation must stay inside the reserved region
///
/// Addresses are relative to the region start.
///
/// # Type Parameters
///
/// - `D`: The physical flash device (must implement `FlashDevice`)
/// - `T`: The sector buffer (`Vec<u8>` for heap, `[u8; N]` for stack)
///
/// # Examples
///
/// ```
/// use sector_flash::{HeapSectorDriver, RamFlash};
///
/// let flash = RamFlash::new(0x40000, 0x1000, 0x100).with_free_region(0x8000, 0x40000);
/// let mut driver = HeapSectorDriver::try_new(flash, "params", 0x10000, 0x2000).unwrap();
///
/// let next = driver.write(0x0FFE, &[1, 2, 3, 4]).unwrap();
/// assert_eq!(next, 0x1002);
/// driver.commit().unwrap();
///
/// let mut out = [0u8; 4];
/// driver.read(0x0FFE, &mut out).unwrap();
/// assert_eq!(out, [1, 2, 3, 4]);
/// ```
pub struct SectorDriver<D: FlashDevice, T: SectorBuffer> {
    id: &'static str,
    device: D,
    region: FlashRegion,
    cached: Option<SectorIndex>,
    state: SectorState,
    buffer: Option<T>,
}

/// Sector driver with a heap buffer sized from the device geometry.
#[cfg(feature = "alloc")]
pub type HeapSectorDriver<D> = SectorDriver<D, Vec<u8>>;

/// Sector driver with an inline buffer of exactly `N` bytes.
pub type StackSectorDriver<D, const N: usize> = SectorDriver<D, [u8; N]>;

impl<D: FlashDevice, T: SectorBuffer> SectorDriver<D, T> {
    /// Create a driver for `size` bytes at absolute flash `offset`.
    ///
    /// The sector size and free flash window come from the device geometry.
    ///
    /// # Errors
    ///
    /// Returns the [`RegionError`] describing why the region is unsafe to
    /// use: misaligned offset or size, a region outside the free flash
    /// window, or a stack buffer that does not match the sector size.
    pub fn try_new(device: D, id: &'static str, offset: u32, size: u32) -> Result<Self, RegionError> {
        let geometry = device.geometry();
        let region = FlashRegion::new(offset, size, geometry)?;

        let sector_size = region.sector_size() as usize;
        if !T::fits(sector_size) {
            return Err(RegionError::BufferMismatch {
                buffer: core::mem::size_of::<T>(),
                sector_size: region.sector_size(),
            });
        }

        info!("FlashDriver<{}>: initialize {} bytes at {:#x}", id, size, offset);
        debug!("FlashDriver<{}>: sector size {}", id, geometry.sector_size);
        debug!("FlashDriver<{}>: page size {}", id, geometry.page_size);
        debug!("FlashDriver<{}>: free start {:#x}", id, geometry.free_start);
        debug!("FlashDriver<{}>: free end {:#x}", id, geometry.free_end);

        Ok(Self {
            id,
            device,
            region,
            cached: None,
            state: SectorState::Clean,
            buffer: None,
        })
    }

    /// Create a driver, treating a misconfigured region as fatal.
    ///
    /// A region that overlaps code, data or other reserved flash must never
    /// be written.
    ///
    /// # Panics
    ///
    /// Panics with the region diagnostic if [`try_new`](Self::try_new) fails.
    pub fn new(device: D, id: &'static str, offset: u32, size: u32) -> Self {
        match Self::try_new(device, id, offset, size) {
            Ok(driver) => driver,
            Err(e) => {
                error!("FlashDriver<{}>: invalid region at {:#x}", id, offset);
                panic!("FlashDriver<{}>: {}", id, e)
            }
        }
    }

    /// Diagnostic label of this driver.
    #[inline]
    pub fn id(&self) -> &'static str {
        self.id
    }

    /// The validated region.
    #[inline]
    pub fn region(&self) -> &FlashRegion {
        &self.region
    }

    /// Absolute start offset of the region.
    #[inline]
    pub fn offset(&self) -> u32 {
        self.region.offset()
    }

    /// Size of the region in bytes.
    #[inline]
    pub fn size(&self) -> u32 {
        self.region.size()
    }

    /// Sector size in bytes.
    #[inline]
    pub fn sector_size(&self) -> u32 {
        self.region.sector_size()
    }

    /// Start of the platform free flash window.
    #[inline]
    pub fn free_start(&self) -> u32 {
        self.region.geometry().free_start
    }

    /// End of the platform free flash window.
    #[inline]
    pub fn free_end(&self) -> u32 {
        self.region.geometry().free_end
    }

    /// Sector owning a relative address.
    #[inline]
    pub fn sector_of(&self, address: u32) -> SectorIndex {
        self.region.layout().sector_of(address)
    }

    /// Currently cached sector, if any.
    #[inline]
    pub fn cached_sector(&self) -> Option<SectorIndex> {
        self.cached
    }

    /// Whether the cached sector received writes since load or commit.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.cached.is_some() && self.state.is_dirty()
    }

    /// Get a reference to the underlying device.
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Consume the driver and return the underlying device.
    ///
    /// **Warning**: uncommitted writes are lost! Call
    /// [`commit`](Self::commit) first.
    pub fn into_inner(self) -> D {
        self.device
    }

    /// Load `sector` into the cache.
    ///
    /// # Business Rules
    ///
    /// - If `sector` is already cached and `force` is false, this is a no-op
    /// - If a different sector is cached, it is committed first
    /// - A forced reload of the cached sector discards its pending writes
    /// - The first load allocates the sector buffer, later loads reuse it
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if `sector` is not part of the region, or the
    /// device error of the commit or read.
    pub fn load(&mut self, sector: SectorIndex, force: bool) -> Result<(), DriverError<D::Error>> {
        self.load_buffer(sector, force).map(|_| ())
    }

    /// Write the cached sector back to flash if it changed.
    ///
    /// A sector that received no writes since load or the last commit is
    /// not compared with flash again, so changes made to flash behind the
    /// driver's back are not repaired. The sector stays cached afterwards. Skipped erases and writes are not
    /// errors; they only show up in the returned [`CommitOutcome`] and in
    /// trace logs.
    ///
    /// # Errors
    ///
    /// Returns the device error if reading, erasing or programming fails.
    /// The sector then stays cached and dirty.
    pub fn commit(&mut self) -> Result<CommitOutcome, DriverError<D::Error>> {
        let (Some(sector), Some(buffer)) = (self.cached, self.buffer.as_ref()) else {
            return Ok(CommitOutcome::Unchanged);
        };

        trace!("FlashDriver<{}>: commit {}", self.id, sector.value());
        if self.state.is_clean() {
            trace!("FlashDriver<{}>: skip write sector, because no changes", self.id);
            return Ok(CommitOutcome::Unchanged);
        }

        let address = self.region.absolute(self.region.layout().sector_start(sector));
        let page_size = self.region.page_size() as usize;
        let outcome = commit::commit_sector(&mut self.device, address, buffer.as_ref(), page_size)
            .map_err(DriverError::Device)?;

        self.state = SectorState::Clean;
        Ok(outcome)
    }

    /// Fill `count` bytes starting at `address` with `value`.
    ///
    /// Returns the address following the written range.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if the range leaves the region, or the device
    /// error of a sector switch.
    pub fn fill(&mut self, address: u32, value: u8, count: usize) -> Result<u32, DriverError<D::Error>> {
        self.write_with(address, count, |dst, _| dst.fill(value))
    }

    /// Copy `src` into the region starting at `address`.
    ///
    /// Writes crossing a sector boundary are split into one buffered write
    /// per sector. There is no atomicity across the boundary: the first
    /// sector is committed when the second one is loaded.
    ///
    /// Returns the address following the written range.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if the range leaves the region, or the device
    /// error of a sector switch.
    pub fn write(&mut self, address: u32, src: &[u8]) -> Result<u32, DriverError<D::Error>> {
        self.write_with(address, src.len(), |dst, source| {
            dst.copy_from_slice(&src[source..source + dst.len()])
        })
    }

    /// Write a single byte.
    pub fn write_u8(&mut self, address: u32, value: u8) -> Result<u32, DriverError<D::Error>> {
        self.write(address, &[value])
    }

    /// Write a `u16` in native byte order.
    pub fn write_u16(&mut self, address: u32, value: u16) -> Result<u32, DriverError<D::Error>> {
        self.write(address, &value.to_ne_bytes())
    }

    /// Write a `u32` in native byte order.
    pub fn write_u32(&mut self, address: u32, value: u32) -> Result<u32, DriverError<D::Error>> {
        self.write(address, &value.to_ne_bytes())
    }

    /// Read `dest.len()` bytes starting at `address` from physical flash.
    ///
    /// The sector cache is bypassed: bytes written but not yet committed are
    /// not visible.
    ///
    /// Returns the address following the read range.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if the range leaves the region, or the device
    /// read error.
    pub fn read(&mut self, address: u32, dest: &mut [u8]) -> Result<u32, DriverError<D::Error>> {
        if dest.is_empty() {
            return Ok(address);
        }
        self.check_range(address, dest.len())?;

        self.device
            .read(self.region.absolute(address), dest)
            .map_err(DriverError::Device)?;
        Ok(address + dest.len() as u32)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self, address: u32) -> Result<u8, DriverError<D::Error>> {
        let mut bytes = [0u8; 1];
        self.read(address, &mut bytes)?;
        Ok(bytes[0])
    }

    /// Read a `u16` in native byte order.
    pub fn read_u16(&mut self, address: u32) -> Result<u16, DriverError<D::Error>> {
        let mut bytes = [0u8; 2];
        self.read(address, &mut bytes)?;
        Ok(u16::from_ne_bytes(bytes))
    }

    /// Read a `u32` in native byte order.
    pub fn read_u32(&mut self, address: u32) -> Result<u32, DriverError<D::Error>> {
        let mut bytes = [0u8; 4];
        self.read(address, &mut bytes)?;
        Ok(u32::from_ne_bytes(bytes))
    }

    fn check_range(&self, address: u32, len: usize) -> Result<(), DriverError<D::Error>> {
        if self.region.contains(address, len) {
            Ok(())
        } else {
            Err(DriverError::OutOfRange {
                address,
                len,
                size: self.region.size(),
            })
        }
    }

    fn write_with<F>(&mut self, address: u32, len: usize, mut apply: F) -> Result<u32, DriverError<D::Error>>
    where
        F: FnMut(&mut [u8], usize),
    {
        if len == 0 {
            return Ok(address);
        }
        self.check_range(address, len)?;

        for segment in self.region.layout().segments(address, len) {
            let buffer = self.load_buffer(segment.sector, false)?;
            apply(&mut buffer[segment.offset..segment.offset + segment.len], segment.source);
            self.state = SectorState::Dirty;
        }

        Ok(address + len as u32)
    }

    fn load_buffer(&mut self, sector: SectorIndex, force: bool) -> Result<&mut [u8], DriverError<D::Error>> {
        let sector_size = self.region.sector_size() as usize;
        let reload = force || self.cached != Some(sector) || self.buffer.is_none();

        if reload {
            if sector.value() >= self.region.sector_count() {
                return Err(DriverError::OutOfRange {
                    address: sector.value().saturating_mul(self.region.sector_size()),
                    len: sector_size,
                    size: self.region.size(),
                });
            }

            trace!("FlashDriver<{}>: load buffer for sector {}", self.id, sector.value());
            if self.cached.is_some_and(|cached| cached != sector) {
                self.commit()?;
            }

            let address = self.region.absolute(self.region.layout().sector_start(sector));
            let buffer = self.buffer.get_or_insert_with(|| T::allocate(sector_size));

            self.cached = None;
            self.device
                .read(address, buffer.as_mut())
                .map_err(DriverError::Device)?;
            self.cached = Some(sector);
            self.state = SectorState::Clean;
        }

        Ok(self.buffer.get_or_insert_with(|| T::allocate(sector_size)).as_mut())
    }
}

#[cfg(test)]
#[cfg(feature = "alloc")]
mod tests {
    use super::*;
    use crate::domain::value_objects::FlashGeometry;
    use core::fmt;

    const SECTOR: usize = 256;
    const PAGE: usize = 64;

    // Mock NOR flash recording every physical operation
    struct MockFlash {
        data: Vec<u8>,
        erases: Vec<u32>,
        programs: Vec<(u32, usize)>,
    }

    impl MockFlash {
        fn new() -> Self {
            Self {
                data: vec![0xFF; 8 * SECTOR],
                erases: Vec::new(),
                programs: Vec::new(),
            }
        }
    }

    #[derive(Debug)]
    struct MockError;

    impl fmt::Display for MockError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "Mock flash error")
        }
    }

    impl core::error::Error for MockError {}

    impl FlashDevice for MockFlash {
        type Error = MockError;

        fn geometry(&self) -> FlashGeometry {
            FlashGeometry {
                sector_size: SECTOR as u32,
                page_size: PAGE as u32,
                free_start: 2 * SECTOR as u32,
                free_end: 8 * SECTOR as u32,
            }
        }

        fn read(&mut self, address: u32, dest: &mut [u8]) -> Result<(), Self::Error> {
            let start = address as usize;
            let src = self.data.get(start..start + dest.len()).ok_or(MockError)?;
            dest.copy_from_slice(src);
            Ok(())
        }

        fn erase_sector(&mut self, address: u32, len: u32) -> Result<(), Self::Error> {
            self.erases.push(address);
            let start = address as usize;
            self.data[start..start + len as usize].fill(0xFF);
            Ok(())
        }

        fn program(&mut self, address: u32, data: &[u8]) -> Result<(), Self::Error> {
            self.programs.push((address, data.len()));
            let start = address as usize;
            for (cell, byte) in self.data[start..start + data.len()].iter_mut().zip(data) {
                *cell &= *byte;
            }
            Ok(())
        }
    }

    fn driver() -> HeapSectorDriver<MockFlash> {
        HeapSectorDriver::try_new(MockFlash::new(), "test", 2 * SECTOR as u32, 4 * SECTOR as u32).unwrap()
    }

    #[test]
    fn test_rejects_unaligned_region() {
        let result = HeapSectorDriver::try_new(MockFlash::new(), "test", 2 * SECTOR as u32 + 1, SECTOR as u32);
        assert!(matches!(result, Err(RegionError::OffsetUnaligned { .. })));
    }

    #[test]
    fn test_rejects_region_before_free_flash() {
        let result = HeapSectorDriver::try_new(MockFlash::new(), "test", 0, SECTOR as u32);
        assert!(matches!(result, Err(RegionError::StartBeforeFreeFlash { .. })));
    }

    #[test]
    #[should_panic(expected = "FlashDriver<test>")]
    fn test_new_panics_on_invalid_region() {
        let _ = HeapSectorDriver::new(MockFlash::new(), "test", 2 * SECTOR as u32, 7 * SECTOR as u32);
    }

    #[test]
    fn test_stack_buffer_must_match_sector_size() {
        let result = StackSectorDriver::<_, 128>::try_new(MockFlash::new(), "test", 2 * SECTOR as u32, SECTOR as u32);
        assert!(matches!(result, Err(RegionError::BufferMismatch { buffer: 128, .. })));

        let result = StackSectorDriver::<_, SECTOR>::try_new(MockFlash::new(), "test", 2 * SECTOR as u32, SECTOR as u32);
        assert!(result.is_ok());
    }

    #[test]
    fn test_no_buffer_before_first_write() {
        let driver = driver();
        assert!(driver.buffer.is_none());
        assert_eq!(driver.cached_sector(), None);
        assert!(!driver.is_dirty());
    }

    #[test]
    fn test_write_marks_dirty_and_defers_hardware() {
        let mut driver = driver();
        driver.write(10, &[1, 2, 3]).unwrap();

        assert_eq!(driver.cached_sector(), Some(SectorIndex::new(0)));
        assert!(driver.is_dirty());
        assert!(driver.device().programs.is_empty());
        assert!(driver.device().erases.is_empty());
    }

    #[test]
    fn test_commit_on_erased_flash_skips_erase() {
        let mut driver = driver();
        driver.fill(0, 0x00, PAGE).unwrap();

        let outcome = driver.commit().unwrap();
        assert_eq!(
            outcome,
            CommitOutcome::Programmed {
                erased: false,
                erase_skipped: false,
                bytes: PAGE
            }
        );
        assert!(driver.device().erases.is_empty());
        assert_eq!(driver.device().programs, vec![(2 * SECTOR as u32, PAGE)]);
        assert!(!driver.is_dirty());
    }

    #[test]
    fn test_setting_bits_erases_and_reprograms_only_changed_pages() {
        let mut driver = driver();
        driver.fill(0, 0x00, SECTOR).unwrap();
        driver.commit().unwrap();

        // Restore page 1 to 0xFF, keep pages 0, 2 and 3 at zero
        driver.fill(PAGE as u32, 0xFF, PAGE).unwrap();
        driver.device.programs.clear();
        let outcome = driver.commit().unwrap();

        assert_eq!(driver.device().erases, vec![2 * SECTOR as u32]);
        // Page 1 now equals the erased state, pages 0 and 2..4 are programmed
        assert_eq!(
            driver.device().programs,
            vec![(2 * SECTOR as u32, PAGE), (2 * SECTOR as u32 + 2 * PAGE as u32, 2 * PAGE)]
        );
        assert!(matches!(outcome, CommitOutcome::Programmed { erased: true, bytes, .. } if bytes == 3 * PAGE));
    }

    #[test]
    fn test_same_bytes_twice_commit_once() {
        let mut driver = driver();
        driver.write(5, &[0x12, 0x34]).unwrap();
        driver.commit().unwrap();
        let programs = driver.device().programs.len();

        driver.write(5, &[0x12, 0x34]).unwrap();
        assert!(driver.is_dirty());
        assert_eq!(driver.commit().unwrap(), CommitOutcome::Unchanged);
        assert_eq!(driver.device().programs.len(), programs);
    }

    #[test]
    fn test_sector_switch_commits_previous_sector() {
        let mut driver = driver();
        driver.write_u8(0, 0x42).unwrap();
        driver.write_u8(SECTOR as u32, 0x43).unwrap();

        assert_eq!(driver.cached_sector(), Some(SectorIndex::new(1)));
        assert_eq!(driver.device().data[2 * SECTOR], 0x42);
        assert_eq!(driver.device().data[3 * SECTOR], 0xFF);
    }

    #[test]
    fn test_forced_reload_discards_pending_writes() {
        let mut driver = driver();
        driver.write_u8(0, 0x00).unwrap();
        driver.load(SectorIndex::new(0), true).unwrap();

        assert!(!driver.is_dirty());
        assert_eq!(driver.commit().unwrap(), CommitOutcome::Unchanged);
        assert_eq!(driver.device().data[2 * SECTOR], 0xFF);
    }

    #[test]
    fn test_load_rejects_sector_outside_region() {
        let mut driver = driver();
        let result = driver.load(SectorIndex::new(4), false);
        assert!(matches!(result, Err(DriverError::OutOfRange { .. })));
    }

    #[test]
    fn test_write_out_of_range() {
        let mut driver = driver();
        let result = driver.write(4 * SECTOR as u32 - 1, &[0, 0]);
        assert!(matches!(result, Err(DriverError::OutOfRange { len: 2, .. })));
        assert_eq!(driver.cached_sector(), None);
    }

    #[test]
    fn test_zero_length_operations_are_noops() {
        let mut driver = driver();
        assert_eq!(driver.fill(0x123, 0xAA, 0).unwrap(), 0x123);
        assert_eq!(driver.write(0x124, &[]).unwrap(), 0x124);
        assert_eq!(driver.read(0x125, &mut []).unwrap(), 0x125);
        assert_eq!(driver.cached_sector(), None);
    }

    #[test]
    fn test_read_bypasses_cache() {
        let mut driver = driver();
        driver.write_u32(0, 0x1122_3344).unwrap();
        assert_eq!(driver.read_u32(0).unwrap(), u32::MAX);

        driver.commit().unwrap();
        assert_eq!(driver.read_u32(0).unwrap(), 0x1122_3344);
    }

    #[test]
    fn test_narrow_helpers_roundtrip() {
        let mut driver = driver();
        let next = driver.write_u8(0, 0xAB).unwrap();
        let next = driver.write_u16(next, 0xBEEF).unwrap();
        let next = driver.write_u32(next, 0xDEAD_BEEF).unwrap();
        assert_eq!(next, 7);
        driver.commit().unwrap();

        assert_eq!(driver.read_u8(0).unwrap(), 0xAB);
        assert_eq!(driver.read_u16(1).unwrap(), 0xBEEF);
        assert_eq!(driver.read_u32(3).unwrap(), 0xDEAD_BEEF);
    }

    #[test]
    fn test_read_returns_following_address() {
        let mut driver = driver();
        let mut out = [0u8; 16];
        assert_eq!(driver.read(0x20, &mut out).unwrap(), 0x30);
    }

    #[test]
    fn test_accessors() {
        let driver = driver();
        assert_eq!(driver.id(), "test");
        assert_eq!(driver.offset(), 2 * SECTOR as u32);
        assert_eq!(driver.size(), 4 * SECTOR as u32);
        assert_eq!(driver.sector_size(), SECTOR as u32);
        assert_eq!(driver.free_start(), 2 * SECTOR as u32);
        assert_eq!(driver.free_end(), 8 * SECTOR as u32);
        assert_eq!(driver.sector_of(SECTOR as u32 + 1), SectorIndex::new(1));
    }

    #[test]
    fn test_commit_without_cached_sector() {
        let mut driver = driver();
        assert_eq!(driver.commit().unwrap(), CommitOutcome::Unchanged);
    }

    #[test]
    fn test_commit_of_clean_sector_touches_nothing() {
        let mut driver = driver();
        driver.load(SectorIndex::new(1), false).unwrap();
        assert!(!driver.is_dirty());

        assert_eq!(driver.commit().unwrap(), CommitOutcome::Unchanged);
        assert_eq!(driver.cached_sector(), Some(SectorIndex::new(1)));
        assert!(driver.device().programs.is_empty());
        assert!(driver.device().erases.is_empty());
    }
}
