//! Commit engine - reconciles a cached sector with physical flash.
//!
//! Committing a sector runs four steps:
//!
//! 1. **Dirty check**: compare the buffer with flash. Identical contents end
//!    the commit without erasing or programming anything.
//! 2. **Erase necessity**: programming only clears bits. If any byte needs a
//!    bit to go from 0 (flash) to 1 (buffer), the sector must be erased.
//! 3. **Erase skip**: a sector that already reads as fully erased is not
//!    erased again.
//! 4. **Program**: the sector is walked page by page and only runs of pages
//!    that differ from flash are programmed.

use core::ops::Range;

use crate::domain::{ports::FlashDevice, value_objects::ERASED_BYTE};

/// Bytes read from flash per comparison step.
const SCRATCH_LEN: usize = 64;

/// Difference between buffered bytes and flash contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Delta {
    /// At least one byte differs.
    pub differs: bool,
    /// At least one bit must go from 0 to 1, which needs an erase.
    pub needs_erase: bool,
}

impl Delta {
    /// Combine two deltas of adjacent ranges.
    #[inline]
    pub const fn merge(self, other: Delta) -> Delta {
        Delta {
            differs: self.differs || other.differs,
            needs_erase: self.needs_erase || other.needs_erase,
        }
    }
}

/// What a commit did to the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommitOutcome {
    /// Nothing was cached, nothing changed, or flash already matched.
    Unchanged,
    /// The sector was erased, programmed, or both.
    ///
    /// Restoring an all-`0xFF` sector over programmed flash only erases, so
    /// `bytes` can be zero.
    Programmed {
        /// The sector was physically erased first.
        erased: bool,
        /// An erase was needed but the sector already read as erased.
        erase_skipped: bool,
        /// Bytes handed to the program operation.
        bytes: usize,
    },
}

impl CommitOutcome {
    /// Whether the commit touched the hardware.
    #[inline]
    pub const fn is_unchanged(&self) -> bool {
        matches!(self, CommitOutcome::Unchanged)
    }
}

/// Compare `buffer` with `flash` byte by byte.
///
/// # Examples
///
/// ```
/// use sector_flash::domain::commit::compare;
///
/// // 1 -> 0 transitions only: program without erase
/// let delta = compare(&[0x0F], &[0xFF]);
/// assert!(delta.differs && !delta.needs_erase);
///
/// // 0 -> 1 transition: erase first
/// let delta = compare(&[0xF0], &[0x0F]);
/// assert!(delta.differs && delta.needs_erase);
/// ```
pub fn compare(buffer: &[u8], flash: &[u8]) -> Delta {
    let mut delta = Delta::default();
    for (&b, &f) in buffer.iter().zip(flash) {
        let diff = b ^ f;
        if diff != 0 {
            delta.differs = true;
            if diff & b != 0 {
                delta.needs_erase = true;
                break;
            }
        }
    }
    delta
}

/// Whether every byte of `data` holds the erased value.
#[inline]
pub fn is_erased(data: &[u8]) -> bool {
    data.iter().all(|&b| b == ERASED_BYTE)
}

/// Compare `data` with the flash contents at `address`.
pub(crate) fn compare_physical<D: FlashDevice>(
    device: &mut D,
    address: u32,
    data: &[u8],
) -> Result<Delta, D::Error> {
    let mut scratch = [0u8; SCRATCH_LEN];
    let mut delta = Delta::default();

    for (i, chunk) in data.chunks(SCRATCH_LEN).enumerate() {
        let flash = &mut scratch[..chunk.len()];
        device.read(address + (i * SCRATCH_LEN) as u32, flash)?;
        delta = delta.merge(compare(chunk, flash));
        if delta.needs_erase {
            break;
        }
    }

    Ok(delta)
}

/// Whether the `len` bytes of flash at `address` read as erased.
pub(crate) fn physical_is_erased<D: FlashDevice>(
    device: &mut D,
    address: u32,
    len: usize,
) -> Result<bool, D::Error> {
    let mut scratch = [0u8; SCRATCH_LEN];
    let mut done = 0;

    while done < len {
        let n = SCRATCH_LEN.min(len - done);
        device.read(address + done as u32, &mut scratch[..n])?;
        if !is_erased(&scratch[..n]) {
            return Ok(false);
        }
        done += n;
    }

    Ok(true)
}

/// Coalesces consecutive changed pages into program runs.
#[derive(Debug, Default)]
pub(crate) struct RunTracker {
    run: Option<Range<usize>>,
}

impl RunTracker {
    /// Feed the next page; returns a finished run when an unchanged page
    /// closes it.
    pub(crate) fn push(&mut self, page: Range<usize>, changed: bool) -> Option<Range<usize>> {
        if changed {
            match &mut self.run {
                Some(run) => run.end = page.end,
                None => self.run = Some(page),
            }
            None
        } else {
            self.run.take()
        }
    }

    /// Flush the run still open after the last page.
    pub(crate) fn finish(&mut self) -> Option<Range<usize>> {
        self.run.take()
    }
}

/// Write `buffer` to the sector at `address`, erasing only when needed and
/// programming only pages that differ.
pub(crate) fn commit_sector<D: FlashDevice>(
    device: &mut D,
    address: u32,
    buffer: &[u8],
    page_size: usize,
) -> Result<CommitOutcome, D::Error> {
    let delta = compare_physical(device, address, buffer)?;
    if !delta.differs {
        trace!("skip write sector at {:#x}, because no changes", address);
        return Ok(CommitOutcome::Unchanged);
    }

    let mut erased = false;
    let mut erase_skipped = false;
    if delta.needs_erase {
        if physical_is_erased(device, address, buffer.len())? {
            trace!("skip erase sector at {:#x}, because already erased", address);
            erase_skipped = true;
        } else {
            trace!("erase sector at {:#x}", address);
            device.erase_sector(address, buffer.len() as u32)?;
            erased = true;
        }
    }

    trace!("write sector at {:#x}", address);
    let mut tracker = RunTracker::default();
    let mut bytes = 0;
    let mut start = 0;
    while start < buffer.len() {
        let page = start..start + page_size;
        let data = &buffer[page.clone()];
        let changed = if erased {
            !is_erased(data)
        } else {
            compare_physical(device, address + start as u32, data)?.differs
        };

        if let Some(run) = tracker.push(page, changed) {
            bytes += program_run(device, address, buffer, run)?;
        }
        start += page_size;
    }
    if let Some(run) = tracker.finish() {
        bytes += program_run(device, address, buffer, run)?;
    }

    Ok(CommitOutcome::Programmed {
        erased,
        erase_skipped,
        bytes,
    })
}

fn program_run<D: FlashDevice>(
    device: &mut D,
    address: u32,
    buffer: &[u8],
    run: Range<usize>,
) -> Result<usize, D::Error> {
    trace!("program {} bytes at {:#x}", run.len(), address + run.start as u32);
    device.program(address + run.start as u32, &buffer[run.clone()])?;
    Ok(run.len())
}
