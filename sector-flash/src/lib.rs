//! Buffered, sector-granular byte access to a reserved NOR flash region.
//!
//! NOR flash can only be erased in whole sectors and programming can only
//! clear bits. This crate hides both rules behind a byte-addressable driver:
//! writes land in a one-sector RAM cache and reach flash on commit, which
//! erases only when a bit has to go from 0 back to 1 and programs only the
//! pages that actually changed.
//!
//! # Architecture
//!
//! The crate is organized into three layers:
//!
//! ## Domain Layer (`domain`)
//! Pure logic with no hardware dependencies:
//! - **Value Objects**: `FlashRegion`, `SectorLayout`, `SectorIndex`, `FlashGeometry`
//! - **Entities**: `SectorState`, `SectorBuffer`
//! - **Services**: `SectorDriver` and the commit engine
//! - **Ports**: `FlashDevice` interface
//!
//! ## Adapter Layer (`adapters`)
//! Implementations of the `FlashDevice` port:
//! - **`NorFlashDevice`**: any `embedded-storage` NOR flash
//! - **`RamFlash`**: in-memory simulator (requires `alloc`)
//! - **`CriticalSectionFlash`**: erase and program with interrupts suspended
//!
//! ## Infrastructure Layer (`infrastructure`)
//! High-level utilities built on the domain:
//! - `SectorStream` with `embedded_io` Read/Write/Seek
//! - `FlashModule` lifecycle hooks and `ModuleStore`
//!
//! # Quick Start
//!
//! ```
//! use sector_flash::{HeapSectorDriver, RamFlash};
//!
//! let flash = RamFlash::new(0x20000, 0x1000, 0x100).with_free_region(0x10000, 0x20000);
//! let mut driver = HeapSectorDriver::new(flash, "params", 0x10000, 0x2000);
//!
//! // Spans both sectors of the region
//! driver.fill(0x0FF0, 0xAA, 32).unwrap();
//! driver.commit().unwrap();
//!
//! let mut buf = [0u8; 32];
//! driver.read(0x0FF0, &mut buf).unwrap();
//! assert!(buf.iter().all(|&b| b == 0xAA));
//! ```
//!
//! ## Stack-Allocated Buffer (no_std, no alloc)
//!
//! ```ignore
//! use sector_flash::{NorFlashConfig, NorFlashDevice, StackSectorDriver};
//!
//! let device = NorFlashDevice::new(hal_flash, NorFlashConfig::new().with_free_region(0x8_0000, 0x10_0000));
//! let mut driver: StackSectorDriver<_, 4096> = StackSectorDriver::new(device, "params", 0xF_E000, 0x2000);
//! ```
//!
//! # Features
//!
//! - `alloc`: Heap sector buffers, `RamFlash` and `ModuleStore`
//! - `std`: Enable standard library features
//! - `embedded-storage`: `NorFlashDevice` adapter
//! - `critical-section`: `CriticalSectionFlash` adapter
//! - `log`: Enable logging support
//! - `defmt`: Enable defmt logging for embedded

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

#[cfg(feature = "alloc")]
extern crate alloc;

// This must go first so the macros are visible in every module
mod fmt;

// Core layers
pub mod domain;
pub mod adapters;
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    CommitOutcome, DriverError, FlashDevice, FlashGeometry, FlashRegion, RegionError, SectorBuffer,
    SectorDriver, SectorIndex, SectorLayout, SectorState, Segment, StackSectorDriver, ERASED_BYTE,
};

#[cfg(feature = "alloc")]
pub use domain::HeapSectorDriver;

#[cfg(feature = "alloc")]
pub use adapters::{FlashStats, RamFlash, RamFlashError};

#[cfg(feature = "embedded-storage")]
pub use adapters::{NorFlashConfig, NorFlashDevice, NorFlashError};

#[cfg(feature = "critical-section")]
pub use adapters::CriticalSectionFlash;

// Infrastructure layer exports
pub use infrastructure::streaming::{SectorStream, StreamError};
pub use infrastructure::FlashModule;

#[cfg(feature = "alloc")]
pub use infrastructure::ModuleStore;

// Re-export embedded_io for convenience
pub use embedded_io;
