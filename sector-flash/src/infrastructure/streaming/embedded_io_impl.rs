//! Implementations of embedded_io traits for [`SectorStream`].

use crate::domain::{entities::SectorBuffer, ports::FlashDevice};
use crate::infrastructure::streaming::{SectorStream, StreamError};
use embedded_io::{ErrorType, Read, Seek, SeekFrom, Write};

impl<D: FlashDevice, T: SectorBuffer> ErrorType for SectorStream<D, T> {
    type Error = StreamError<D::Error>;
}

impl<D: FlashDevice, T: SectorBuffer> Read for SectorStream<D, T> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        SectorStream::read(self, buf)
    }
}

impl<D: FlashDevice, T: SectorBuffer> Write for SectorStream<D, T> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        SectorStream::write(self, buf)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        SectorStream::flush(self)
    }
}

impl<D: FlashDevice, T: SectorBuffer> Seek for SectorStream<D, T> {
    fn seek(&mut self, pos: SeekFrom) -> Result<u64, Self::Error> {
        SectorStream::seek(self, pos)
    }
}
