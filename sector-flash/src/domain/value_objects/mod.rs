//! Value objects for the domain layer.
//!
//! Value objects are immutable, validated data types that represent
//! concepts in the domain model. They provide type safety and encapsulate
//! validation logic.

mod sector_index;
mod sector_layout;
mod flash_region;

pub use sector_index::SectorIndex;
pub use sector_layout::{Segment, Segments, SectorLayout, SectorSpan};
pub use flash_region::{FlashGeometry, FlashRegion, RegionError, ERASED_BYTE};
