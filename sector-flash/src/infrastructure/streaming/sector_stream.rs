//! Cursor-based streaming over a sector driver.

use embedded_io::SeekFrom;

use crate::domain::{entities::SectorBuffer, ports::FlashDevice, SectorDriver};
use crate::infrastructure::streaming::StreamError;

/// Read/Write/Seek cursor over the reserved region of a [`SectorDriver`].
///
/// Writes go to the sector cache and reach flash on [`flush`](Self::flush)
/// or when the cursor moves to another sector. Since driver reads come from
/// physical flash, a read commits pending writes first so the stream always
/// observes its own writes.
///
/// # Examples
///
/// ```
/// use embedded_io::{Read, Seek, SeekFrom, Write};
/// use sector_flash::{HeapSectorDriver, RamFlash, SectorStream};
///
/// let flash = RamFlash::new(0x10000, 0x1000, 0x100);
/// let driver = HeapSectorDriver::new(flash, "log", 0x8000, 0x2000);
/// let mut stream = SectorStream::new(driver);
///
/// stream.write_all(b"hello flash").unwrap();
/// stream.seek(SeekFrom::Start(6)).unwrap();
///
/// let mut buf = [0u8; 5];
/// stream.read_exact(&mut buf).unwrap();
/// assert_eq!(&buf, b"flash");
/// ```
pub struct SectorStream<D: FlashDevice, T: SectorBuffer> {
    driver: SectorDriver<D, T>,
    position: u32,
}

impl<D: FlashDevice, T: SectorBuffer> SectorStream<D, T> {
    /// Create a stream positioned at the start of the region.
    pub fn new(driver: SectorDriver<D, T>) -> Self {
        Self { driver, position: 0 }
    }

    /// Current position relative to the region start.
    pub fn position(&self) -> u64 {
        self.position as u64
    }

    /// Size of the region in bytes.
    pub fn size(&self) -> u64 {
        self.driver.size() as u64
    }

    /// The underlying driver.
    pub fn driver(&self) -> &SectorDriver<D, T> {
        &self.driver
    }

    /// Mutable access to the underlying driver.
    pub fn driver_mut(&mut self) -> &mut SectorDriver<D, T> {
        &mut self.driver
    }

    /// Consume the stream and return the driver.
    ///
    /// Pending writes stay in the driver's cache; commit them before
    /// dropping the driver.
    pub fn into_inner(self) -> SectorDriver<D, T> {
        self.driver
    }

    pub(crate) fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError<D::Error>> {
        let remaining = (self.driver.size() - self.position) as usize;
        let n = buf.len().min(remaining);
        if n == 0 {
            return Ok(0);
        }

        if self.driver.is_dirty() {
            self.driver.commit()?;
        }
        self.position = self.driver.read(self.position, &mut buf[..n])?;
        Ok(n)
    }

    pub(crate) fn write(&mut self, buf: &[u8]) -> Result<usize, StreamError<D::Error>> {
        if buf.is_empty() {
            return Ok(0);
        }

        let remaining = (self.driver.size() - self.position) as usize;
        if remaining == 0 {
            return Err(StreamError::EndOfRegion);
        }

        let n = buf.len().min(remaining);
        self.position = self.driver.write(self.position, &buf[..n])?;
        Ok(n)
    }

    pub(crate) fn flush(&mut self) -> Result<(), StreamError<D::Error>> {
        self.driver.commit()?;
        Ok(())
    }

    pub(crate) fn seek(&mut self, pos: SeekFrom) -> Result<u64, StreamError<D::Error>> {
        let size = self.driver.size() as i64;
        let new_pos = match pos {
            SeekFrom::Start(offset) => i64::try_from(offset).map_err(|_| StreamError::InvalidSeek)?,
            SeekFrom::Current(offset) => self.position as i64 + offset,
            SeekFrom::End(offset) => size + offset,
        };

        if new_pos < 0 || new_pos > size {
            return Err(StreamError::InvalidSeek);
        }

        self.position = new_pos as u32;
        Ok(self.position as u64)
    }
}
