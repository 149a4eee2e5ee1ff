//! Infrastructure layer - high-level utilities built on the sector driver.
//!
//! - **Streaming**: `SectorStream`, blocking `embedded_io` Read/Write/Seek
//!   over a reserved region
//! - **Modules**: the `FlashModule` lifecycle trait and `ModuleStore`, which
//!   persists module state as length prefixed records (requires `alloc`)

pub mod streaming;
mod module;

#[cfg(feature = "alloc")]
mod module_store;

pub use module::FlashModule;

#[cfg(feature = "alloc")]
pub use module_store::ModuleStore;
