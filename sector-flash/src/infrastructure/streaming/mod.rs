//! Streaming cursor over a sector driver.
//!
//! [`SectorStream`] keeps a position inside the reserved region and
//! implements the blocking `embedded_io` Read/Write/Seek traits, so code
//! written against those traits can persist data through the sector cache.

mod sector_stream;
mod embedded_io_impl;

pub use sector_stream::SectorStream;

use crate::domain::DriverError;
use core::fmt;

/// Unified I/O error type for streaming operations.
#[derive(Debug)]
pub enum StreamError<E> {
    /// Error from the underlying sector driver.
    Driver(DriverError<E>),
    /// Write at the end of the region.
    EndOfRegion,
    /// Invalid seek position.
    InvalidSeek,
}

impl<E: fmt::Display> fmt::Display for StreamError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Driver(e) => write!(f, "Driver error: {}", e),
            Self::EndOfRegion => write!(f, "Write would exceed region bounds"),
            Self::InvalidSeek => write!(f, "Invalid seek position"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> core::error::Error for StreamError<E> {}

impl<E> From<DriverError<E>> for StreamError<E> {
    fn from(err: DriverError<E>) -> Self {
        Self::Driver(err)
    }
}

// Implement embedded_io::Error so our streams can be used with embedded_io
impl<E: fmt::Debug + fmt::Display> embedded_io::Error for StreamError<E> {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            Self::Driver(DriverError::Device(_)) => embedded_io::ErrorKind::Other,
            Self::Driver(_) => embedded_io::ErrorKind::InvalidInput,
            Self::EndOfRegion => embedded_io::ErrorKind::InvalidInput,
            Self::InvalidSeek => embedded_io::ErrorKind::InvalidInput,
        }
    }
}
