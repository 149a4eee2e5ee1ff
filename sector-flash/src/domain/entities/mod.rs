//! Domain entities.
//!
//! The cached sector is the only entity: its identity is the sector index
//! held by the driver, its state is tracked by [`SectorState`] and its bytes
//! live in a [`SectorBuffer`].

mod sector_state;
mod sector_buffer;

pub use sector_state::SectorState;
pub use sector_buffer::SectorBuffer;
