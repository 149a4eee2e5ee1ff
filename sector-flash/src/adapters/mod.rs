//! Adapter layer - Concrete implementations of the `FlashDevice` port.
//!
//! This layer connects the pure sector driver to actual flash hardware or a
//! simulation of it.
//!
//! # Hexagonal Architecture
//!
//! ```text
//!     ┌──────────────────────────────────┐
//!     │      Domain Layer                │
//!     │  - SectorDriver (service)        │
//!     │  - FlashDevice (port)            │
//!     └────────────┬─────────────────────┘
//!                  │
//!                  │ implemented by
//!                  ▼
//!     ┌──────────────────────────────────┐
//!     │      Adapter Layer               │  ◄── This module
//!     │  - NorFlashDevice                │
//!     │  - RamFlash                      │
//!     │  - CriticalSectionFlash          │
//!     └────────────┬─────────────────────┘
//!                  │
//!                  │ uses
//!                  ▼
//!     ┌──────────────────────────────────┐
//!     │  Infrastructure (NOR flash HAL)  │
//!     └──────────────────────────────────┘
//! ```
//!
//! # Available Adapters
//!
//! - **`NorFlashDevice`**: Any `embedded-storage` NOR flash (requires `embedded-storage`)
//! - **`RamFlash`**: In-memory simulator with operation counters (requires `alloc`)
//! - **`CriticalSectionFlash`**: Erase and program with interrupts suspended (requires `critical-section`)

#[cfg(feature = "alloc")]
mod ram_flash;

#[cfg(feature = "embedded-storage")]
mod nor_flash_adapter;

#[cfg(feature = "critical-section")]
mod critical_section_flash;

#[cfg(feature = "alloc")]
pub use ram_flash::{FlashStats, RamFlash, RamFlashError};

#[cfg(feature = "embedded-storage")]
pub use nor_flash_adapter::{NorFlashConfig, NorFlashDevice, NorFlashError, DEFAULT_PAGE_SIZE};

#[cfg(feature = "critical-section")]
pub use critical_section_flash::CriticalSectionFlash;
