use std::fmt::Debug;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::debug;

use crate::structs::BLOCK_SIZE;
use crate::Error;

/// Fixed-size block storage the filesystem lives on
pub trait BlockDevice: Debug + Send {
    /// Number of [`BLOCK_SIZE`] blocks on the device
    fn block_count(&self) -> u64;

    /// Read block `index` into `buffer`, which must be exactly one block long
    fn read_block(&mut self, index: u64, buffer: &mut [u8]) -> Result<(), Error>;

    /// Write `buffer`, exactly one block long, into block `index`
    fn write_block(&mut self, index: u64, buffer: &[u8]) -> Result<(), Error>;
}

/// Block device backed by any seekable byte stream
#[derive(Debug)]
pub struct Disk<S> {
    stream: S,
    blocks: u64,
}

impl<S: Read + Write + Seek> Disk<S> {
    /// Wrap a stream, sizing the device to the whole blocks it holds
    pub fn new(mut stream: S) -> Result<Self, Error> {
        let length = stream.seek(SeekFrom::End(0))?;
        let blocks = length / BLOCK_SIZE as u64;
        debug!("Opened disk with {blocks} blocks");
        Ok(Self { stream, blocks })
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    fn seek_block(&mut self, index: u64, buffer_length: usize) -> Result<(), Error> {
        if index >= self.blocks || buffer_length != BLOCK_SIZE {
            return Err(Error::OutOfBounds);
        }
        self.stream
            .seek(SeekFrom::Start(index * BLOCK_SIZE as u64))?;
        Ok(())
    }
}

impl Disk<Cursor<Vec<u8>>> {
    /// Zero-filled memory-backed device
    pub fn in_memory(blocks: u32) -> Self {
        Self {
            stream: Cursor::new(vec![0u8; blocks as usize * BLOCK_SIZE]),
            blocks: blocks as u64,
        }
    }
}

impl Disk<std::fs::File> {
    /// Create (or truncate) an image file holding `blocks` zeroed blocks
    pub fn create<P: AsRef<Path>>(path: P, blocks: u32) -> Result<Self, Error> {
        let file = std::fs::File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len(blocks as u64 * BLOCK_SIZE as u64)?;
        Self::new(file)
    }
}

impl<S: Read + Write + Seek + Debug + Send> BlockDevice for Disk<S> {
    fn block_count(&self) -> u64 {
        self.blocks
    }

    fn read_block(&mut self, index: u64, buffer: &mut [u8]) -> Result<(), Error> {
        self.seek_block(index, buffer.len())?;
        self.stream.read_exact(buffer)?;
        Ok(())
    }

    fn write_block(&mut self, index: u64, buffer: &[u8]) -> Result<(), Error> {
        self.seek_block(index, buffer.len())?;
        self.stream.write_all(buffer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::{BlockDevice, Disk};
    use crate::{structs::BLOCK_SIZE, Error};

    #[test]
    fn size_from_stream() {
        let disk = Disk::new(Cursor::new(vec![0u8; 10 * BLOCK_SIZE + 100])).unwrap();
        assert_eq!(disk.block_count(), 10);
    }

    #[test]
    fn write_and_read() {
        let mut disk = Disk::in_memory(4);
        let data = (0..BLOCK_SIZE).map(|v| v as u8).collect::<Vec<u8>>();
        disk.write_block(2, &data).unwrap();
        let mut buffer = vec![0u8; BLOCK_SIZE];
        disk.read_block(2, &mut buffer).unwrap();
        assert_eq!(buffer, data);
        disk.read_block(1, &mut buffer).unwrap();
        assert_eq!(buffer, vec![0u8; BLOCK_SIZE]);
        let raw = disk.into_inner().into_inner();
        assert_eq!(&raw[2 * BLOCK_SIZE..3 * BLOCK_SIZE], &data[..]);
    }

    #[test]
    fn out_of_bounds() {
        let mut disk = Disk::in_memory(4);
        let mut buffer = vec![0u8; BLOCK_SIZE];
        assert!(matches!(
            disk.read_block(4, &mut buffer),
            Err(Error::OutOfBounds)
        ));
        assert!(matches!(
            disk.write_block(0, &buffer[..10]),
            Err(Error::OutOfBounds)
        ));
    }
}
