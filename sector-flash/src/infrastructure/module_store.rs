//! Persisting module state through a sector driver.

use alloc::vec;

use crate::domain::{
    entities::SectorBuffer, ports::FlashDevice, value_objects::ERASED_BYTE, DriverError,
    SectorDriver,
};
use crate::infrastructure::FlashModule;

/// Length prefix that marks never written flash.
const UNWRITTEN: u16 = 0xFFFF;

/// Stores the flash blobs of a list of modules back to back.
///
/// Each module occupies one record starting at region address 0:
///
/// ```text
/// ┌──────────────┬──────────────────────┐
/// │ len: u16 LE  │ payload (len bytes)  │  module 0
/// ├──────────────┼──────────────────────┤
/// │ len: u16 LE  │ payload (len bytes)  │  module 1
/// └──────────────┴──────────────────────┘
/// ```
///
/// Modules must be passed in the same order for saving and loading. When a
/// stored length does not match what a module expects now, its payload is
/// skipped and the module keeps its defaults.
///
/// # Examples
///
/// ```
/// use sector_flash::{FlashModule, HeapSectorDriver, ModuleStore, RamFlash};
///
/// struct Counter(u32);
///
/// impl FlashModule for Counter {
///     fn name(&self) -> &str { "Counter" }
///     fn flash_size(&self) -> u16 { 4 }
///     fn write_flash(&mut self, data: &mut [u8]) { data.copy_from_slice(&self.0.to_le_bytes()) }
///     fn read_flash(&mut self, data: &[u8]) {
///         self.0 = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
///     }
/// }
///
/// let flash = RamFlash::new(0x10000, 0x1000, 0x100);
/// let mut store = ModuleStore::new(HeapSectorDriver::new(flash, "modules", 0xF000, 0x1000));
///
/// store.save(&mut [&mut Counter(42)]).unwrap();
///
/// let mut restored = Counter(0);
/// store.load(&mut [&mut restored]).unwrap();
/// assert_eq!(restored.0, 42);
/// ```
pub struct ModuleStore<D: FlashDevice, T: SectorBuffer> {
    driver: SectorDriver<D, T>,
}

impl<D: FlashDevice, T: SectorBuffer> ModuleStore<D, T> {
    /// Store records through `driver`.
    pub fn new(driver: SectorDriver<D, T>) -> Self {
        Self { driver }
    }

    /// The underlying driver.
    pub fn driver(&self) -> &SectorDriver<D, T> {
        &self.driver
    }

    /// Consume the store and return the driver.
    pub fn into_inner(self) -> SectorDriver<D, T> {
        self.driver
    }

    /// Write one record per module and commit.
    ///
    /// Returns the region address following the last record.
    pub fn save(&mut self, modules: &mut [&mut dyn FlashModule]) -> Result<u32, DriverError<D::Error>> {
        let mut address = 0;
        for module in modules.iter_mut() {
            let size = module.flash_size();
            let mut data = vec![ERASED_BYTE; size as usize];
            module.write_flash(&mut data);

            debug!("FlashDriver<{}>: save {} ({} bytes) at {:#x}", self.driver.id(), module.name(), size, address);
            address = self.driver.write(address, &size.to_le_bytes())?;
            address = self.driver.write(address, &data)?;
        }

        self.driver.commit()?;
        Ok(address)
    }

    /// Hand every module its stored record.
    ///
    /// Loading stops early at never written flash. Returns the region
    /// address following the last record read.
    pub fn load(&mut self, modules: &mut [&mut dyn FlashModule]) -> Result<u32, DriverError<D::Error>> {
        self.driver.commit()?;

        let mut address = 0;
        for module in modules.iter_mut() {
            let mut prefix = [0u8; 2];
            let next = self.driver.read(address, &mut prefix)?;
            let stored = u16::from_le_bytes(prefix);

            if stored == UNWRITTEN {
                info!("FlashDriver<{}>: no data stored at {:#x}", self.driver.id(), address);
                break;
            }

            if stored != module.flash_size() {
                warn!(
                    "FlashDriver<{}>: skip {}, stored size {} differs from expected {}",
                    self.driver.id(),
                    module.name(),
                    stored,
                    module.flash_size()
                );
                address = next + stored as u32;
                continue;
            }

            let mut data = vec![0u8; stored as usize];
            address = self.driver.read(next, &mut data)?;
            debug!("FlashDriver<{}>: load {} ({} bytes)", self.driver.id(), module.name(), stored);
            module.read_flash(&data);
        }

        Ok(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::RamFlash;
    use crate::domain::HeapSectorDriver;
    use alloc::vec::Vec;

    struct Blob {
        size: u16,
        fill: u8,
        loaded: Option<Vec<u8>>,
    }

    impl Blob {
        fn new(size: u16, fill: u8) -> Self {
            Self { size, fill, loaded: None }
        }
    }

    impl FlashModule for Blob {
        fn name(&self) -> &str {
            "Blob"
        }

        fn flash_size(&self) -> u16 {
            self.size
        }

        fn write_flash(&mut self, data: &mut [u8]) {
            data.fill(self.fill);
        }

        fn read_flash(&mut self, data: &[u8]) {
            self.loaded = Some(data.to_vec());
        }
    }

    fn store() -> ModuleStore<RamFlash, Vec<u8>> {
        let flash = RamFlash::new(0x4000, 0x1000, 0x100);
        ModuleStore::new(HeapSectorDriver::new(flash, "modules", 0x2000, 0x2000))
    }

    #[test]
    fn test_save_writes_length_prefixed_records() {
        let mut store = store();
        let end = store
            .save(&mut [&mut Blob::new(3, 0x11), &mut Blob::new(0, 0), &mut Blob::new(2, 0x22)])
            .unwrap();
        assert_eq!(end, 2 + 3 + 2 + 2 + 2);

        let contents = store.into_inner().into_inner();
        let record = &contents.contents()[0x2000..0x2000 + end as usize];
        assert_eq!(record, &[3, 0, 0x11, 0x11, 0x11, 0, 0, 2, 0, 0x22, 0x22]);
    }

    #[test]
    fn test_load_restores_in_order() {
        let mut store = store();
        store.save(&mut [&mut Blob::new(3, 0x11), &mut Blob::new(2, 0x22)]).unwrap();

        let mut a = Blob::new(3, 0);
        let mut b = Blob::new(2, 0);
        store.load(&mut [&mut a, &mut b]).unwrap();
        assert_eq!(a.loaded.as_deref(), Some(&[0x11, 0x11, 0x11][..]));
        assert_eq!(b.loaded.as_deref(), Some(&[0x22, 0x22][..]));
    }

    #[test]
    fn test_load_skips_size_mismatch() {
        let mut store = store();
        store.save(&mut [&mut Blob::new(3, 0x11), &mut Blob::new(2, 0x22)]).unwrap();

        let mut a = Blob::new(4, 0);
        let mut b = Blob::new(2, 0);
        store.load(&mut [&mut a, &mut b]).unwrap();
        assert_eq!(a.loaded, None);
        assert_eq!(b.loaded.as_deref(), Some(&[0x22, 0x22][..]));
    }

    #[test]
    fn test_load_stops_at_unwritten_flash() {
        let mut store = store();
        let mut a = Blob::new(3, 0);
        assert_eq!(store.load(&mut [&mut a]).unwrap(), 0);
        assert_eq!(a.loaded, None);
    }

    #[test]
    fn test_resave_same_state_is_noop() {
        let mut store = store();
        store.save(&mut [&mut Blob::new(8, 0x5A)]).unwrap();
        let before = store.driver().device().stats();

        store.save(&mut [&mut Blob::new(8, 0x5A)]).unwrap();
        let after = store.driver().device().stats();
        assert_eq!(after.erases, before.erases);
        assert_eq!(after.programs, before.programs);
    }
}
