//! Domain layer - Pure flash buffering logic with zero hardware dependencies.
//!
//! This is the core of the hexagonal architecture. The domain layer contains:
//! - **Entities**: the cached sector (`SectorState`, `SectorBuffer`)
//! - **Value Objects**: `SectorIndex`, `SectorLayout`, `FlashRegion`, `FlashGeometry`
//! - **Domain Services**: `SectorDriver` and the commit engine
//! - **Ports**: `FlashDevice`, the interface to physical flash
//! - **Domain Errors**: `DriverError`, `RegionError`
//!
//! # Hexagonal Architecture
//!
//! ```text
//!     ┌──────────────────────────────────┐
//!     │      Domain Layer (Core)         │
//!     │                                  │
//!     │  ┌────────────────────────────┐  │
//!     │  │  Entities & Value Objects  │  │
//!     │  │  - FlashRegion, Segments   │  │
//!     │  └────────────────────────────┘  │
//!     │              ▲                   │
//!     │              │                   │
//!     │  ┌────────────────────────────┐  │
//!     │  │    Domain Services         │  │
//!     │  │    - SectorDriver, commit  │  │
//!     │  └────────────────────────────┘  │
//!     │              │                   │
//!     │              ▼                   │
//!     │  ┌────────────────────────────┐  │
//!     │  │    Ports (Interfaces)      │  │
//!     │  │    - FlashDevice           │  │
//!     │  └────────────────────────────┘  │
//!     └──────────────────────────────────┘
//!                    ▲
//!                    │ implemented by
//!                    │
//!     ┌──────────────────────────────────┐
//!     │      Adapter Layer               │
//!     │  - NorFlashDevice                │
//!     │  - RamFlash                      │
//!     │  - CriticalSectionFlash          │
//!     └──────────────────────────────────┘
//! ```
//!
//! # Examples
//!
//! ```ignore
//! use sector_flash::domain::{SectorDriver, SectorIndex};
//!
//! let device = MyFlash::new();  // Implements FlashDevice port
//! let mut driver: SectorDriver<_, [u8; 4096]> = SectorDriver::new(device, "params", 0x1F_0000, 0x2000);
//!
//! driver.write(0x10, b"config")?;
//! driver.commit()?;
//! ```

pub mod entities;
pub mod value_objects;
pub mod ports;
pub mod error;
pub mod commit;

mod sector_driver;

// Re-export commonly used types
pub use entities::{SectorBuffer, SectorState};
pub use value_objects::{FlashGeometry, FlashRegion, RegionError, SectorIndex, SectorLayout, SectorSpan, Segment, Segments, ERASED_BYTE};
pub use ports::FlashDevice;
pub use error::DriverError;
pub use commit::CommitOutcome;
pub use sector_driver::{SectorDriver, StackSectorDriver};

#[cfg(feature = "alloc")]
pub use sector_driver::HeapSectorDriver;
