use std::fmt::Display;
use std::mem::size_of;

use super::*;

const BITS_IN_USIZE: u64 = (size_of::<usize>() * 8) as u64;

impl Bitmap {
    /// Create bitmap for `count` blocks with the first `reserved` ones occupied
    pub(crate) fn new(count: u64, reserved: u64) -> Result<Self, Error> {
        let words = ((count + BITS_IN_USIZE - 1) / BITS_IN_USIZE) as usize;
        let mut bitfield = Vec::new();
        bitfield
            .try_reserve_exact(words)
            .map_err(|_| Error::BitmapAllocation)?;
        bitfield.resize(words, 0);
        let mut bitmap = Self {
            bitfield,
            count,
            reserved: u64::min(reserved, count),
        };
        for index in 0..bitmap.reserved {
            bitmap.set(index, true)?;
        }
        Ok(bitmap)
    }

    /// Modify occupancy
    pub(crate) fn set(&mut self, index: u64, value: bool) -> Result<(), Error> {
        if index >= self.count {
            return Err(Error::OutOfBounds);
        }
        let row = (index / BITS_IN_USIZE) as usize;
        let col = index % BITS_IN_USIZE;
        if value {
            self.bitfield[row] |= 1usize << col;
        } else {
            self.bitfield[row] &= !(1usize << col);
        }
        Ok(())
    }

    /// Get occupancy
    pub fn get(&self, index: u64) -> Result<bool, Error> {
        if index >= self.count {
            return Err(Error::OutOfBounds);
        }
        let row = (index / BITS_IN_USIZE) as usize;
        let col = index % BITS_IN_USIZE;
        Ok(self.bitfield[row] & (1usize << col) != 0)
    }

    /// Lowest unoccupied index past the reserved region
    pub(crate) fn next_free(&self) -> Option<u64> {
        let first_row = (self.reserved / BITS_IN_USIZE) as usize;
        for (row, &word) in self.bitfield.iter().enumerate().skip(first_row) {
            if word == usize::MAX {
                continue;
            }
            let start = if row == first_row {
                self.reserved % BITS_IN_USIZE
            } else {
                0
            };
            for col in start..BITS_IN_USIZE {
                let index = row as u64 * BITS_IN_USIZE + col;
                if index >= self.count {
                    return None;
                }
                if word & (1usize << col) == 0 {
                    return Some(index);
                }
            }
        }
        None
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn free_count(&self) -> u64 {
        (0..self.count)
            .filter(|&index| matches!(self.get(index), Ok(false)))
            .count() as u64
    }
}

impl Display for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bitmap ({} of {} free):", self.free_count(), self.count)?;
        for index in 0..self.count {
            if index % 64 == 0 {
                write!(f, "\n    {index:>6} ")?;
            }
            let bit = matches!(self.get(index), Ok(true));
            write!(f, "{}", bit as u8)?;
        }
        Ok(())
    }
}
