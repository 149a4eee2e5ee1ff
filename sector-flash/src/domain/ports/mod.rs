//! Ports define the interfaces between the domain and the outside world.
//!
//! This module contains the **secondary (driven) port** the sector driver
//! depends on: raw access to physical flash.

mod flash_device;

pub use flash_device::FlashDevice;
