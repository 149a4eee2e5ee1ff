//! Lifecycle interface of application modules.
//!
//! A module is a unit of firmware functionality that may persist a small
//! blob of state in flash. [`ModuleStore`](super::ModuleStore) walks a list
//! of modules and saves or restores their blobs in order.

/// Hooks a firmware module can implement.
///
/// Everything except [`name`](Self::name) has a no-op default.
pub trait FlashModule {
    /// Human readable module name, used in log output.
    fn name(&self) -> &str;

    /// Module version string.
    fn version(&self) -> &str {
        "0.0"
    }

    /// Number of bytes the module persists in flash.
    fn flash_size(&self) -> u16 {
        0
    }

    /// Serialize the persisted state into `data`.
    ///
    /// `data` is exactly [`flash_size`](Self::flash_size) bytes long and
    /// pre-filled with the erased value.
    fn write_flash(&mut self, data: &mut [u8]) {
        let _ = data;
    }

    /// Restore state previously produced by [`write_flash`](Self::write_flash).
    fn read_flash(&mut self, data: &[u8]) {
        let _ = data;
    }

    /// Called once the startup delay elapsed.
    fn process_after_startup_delay(&mut self) {}

    /// Called right before the device restarts.
    fn process_before_restart(&mut self) {}

    /// Called before configuration tables are unloaded.
    fn process_before_tables_unload(&mut self) {}

    /// Enter a low power state.
    fn save_power(&mut self) {}

    /// Leave the low power state. Returns `false` if a restart is needed.
    fn restore_power(&mut self) -> bool {
        true
    }

    /// Whether the module runs work on the second core.
    fn uses_second_core(&self) -> bool {
        false
    }
}
