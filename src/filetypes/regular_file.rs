use log::{debug, warn};

use super::{BlockCursor, FileBlocks};
use crate::structs::{Block, Inode};
use crate::{Error, Filesystem};

impl Filesystem {
    /// Read file bytes starting at `offset` into `buffer`.
    /// Returns the count of bytes read, short near the end of the file
    pub fn read(&mut self, index: u32, buffer: &mut [u8], offset: u64) -> Result<usize, Error> {
        let inode = self.load_inode(index)?;
        let mut blocks = FileBlocks::new(&inode)?;
        let size = inode.size().map(u64::from).ok_or(Error::InodeNotAllocated)?;
        if offset >= size || buffer.is_empty() {
            return Ok(0);
        }
        let length = u64::min(buffer.len() as u64, size - offset) as usize;
        let Some(span) = BlockCursor::span(offset, length as u64) else {
            return Ok(0);
        };
        let mut cursor = BlockCursor::new(offset);
        let mut filled = 0;
        for logical in span {
            debug_assert_eq!(cursor.block(), logical);
            let Some(physical) = blocks.resolve(self, logical)? else {
                warn!("File {index} has no block for logical block {logical}");
                return Err(Error::Corrupted);
            };
            let block: Block = self.load_indexed(physical)?;
            let wanted = usize::min(cursor.remaining(), length - filled);
            let bytes = block.read_bytes(cursor.byte(), wanted);
            buffer[filled..filled + bytes.len()].copy_from_slice(bytes);
            filled += bytes.len();
            cursor.advance(bytes.len() as u64);
        }
        Ok(filled)
    }

    /// Write `data` at `offset`, allocating blocks past the current end.
    /// Running out of blocks or reaching the maximum file size ends the
    /// write early and the count of bytes committed until then is returned
    pub fn write(&mut self, index: u32, data: &[u8], offset: u64) -> Result<usize, Error> {
        let mut inode = self.load_inode(index)?;
        let mut blocks = FileBlocks::new(&inode)?;
        let size = inode.size().map(u64::from).ok_or(Error::InodeNotAllocated)?;
        if offset > size {
            return Err(Error::InvalidOffset);
        }
        let Some(span) = BlockCursor::span(offset, data.len() as u64) else {
            return Ok(0);
        };
        debug!("Write {} bytes at {offset} to file {index}, blocks {span:?}", data.len());

        let mut cursor = BlockCursor::new(offset);
        let mut remaining = data;
        let mut failure = None;
        for logical in span {
            let (physical, fresh) = match blocks.resolve_or_allocate(self, logical) {
                Ok(resolved) => resolved,
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            };
            let mut block = if fresh {
                Block::empty(physical)
            } else {
                match self.load_indexed(physical) {
                    Ok(block) => block,
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
            };
            let rest = block.write_bytes(cursor.byte(), remaining);
            if let Err(e) = self.flush_block(&block) {
                if fresh {
                    blocks.forget(self, logical)?;
                }
                failure = Some(e);
                break;
            }
            cursor.advance((remaining.len() - rest.len()) as u64);
            remaining = rest;
        }

        let committed = data.len() - remaining.len();
        if let Inode::File { size: current, .. } = &mut inode {
            *current = u64::max(size, offset + committed as u64) as u32;
        }
        blocks.flush(self, &mut inode)?;
        self.flush_inode(index, &inode)?;

        match failure {
            None => Ok(committed),
            Some(e @ (Error::OutOfSpace | Error::MaxFileSizeExceeded)) => {
                warn!(
                    "Partial write to file {index}: {committed} of {} bytes ({e})",
                    data.len()
                );
                Ok(committed)
            }
            Some(e) => Err(e),
        }
    }

    /// Return every block of a file to the bitmap and free its inode
    pub(crate) fn release_file(&mut self, index: u32, inode: &Inode) -> Result<(), Error> {
        let mut blocks = FileBlocks::new(inode)?;
        for block in blocks.owned(self)? {
            self.release_block(block)?;
        }
        debug!("Release file {index}");
        self.flush_inode(index, &Inode::Free)
    }

    /// Delete a regular file and its entry in `parent`
    pub fn delete_file(&mut self, index: u32, parent: u32) -> Result<(), Error> {
        let inode = self.load_inode(index)?;
        match inode {
            Inode::File { .. } => {}
            Inode::Free => return Err(Error::InodeNotAllocated),
            Inode::Directory { .. } => return Err(Error::NotAFile),
        }
        if !self.remove_entry(parent, index)? {
            return Err(Error::NameNotFound);
        }
        self.release_file(index, &inode)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, ErrorKind};

    use crate::filesystem::tests::formatted;
    use crate::structs::{Inode, BLOCK_SIZE, MAX_FILE_SIZE, NULL_BLOCK, ROOT_INODE};
    use crate::{BlockDevice, Disk, Error, Filesystem};

    /// Memory device with one block that cannot be written
    #[derive(Debug)]
    struct BadBlock {
        disk: Disk<Cursor<Vec<u8>>>,
        bad: u64,
    }

    impl BlockDevice for BadBlock {
        fn block_count(&self) -> u64 {
            self.disk.block_count()
        }

        fn read_block(&mut self, index: u64, buffer: &mut [u8]) -> Result<(), Error> {
            self.disk.read_block(index, buffer)
        }

        fn write_block(&mut self, index: u64, buffer: &[u8]) -> Result<(), Error> {
            if index == self.bad {
                return Err(Error::Io(std::io::Error::new(
                    ErrorKind::Other,
                    format!("block {index} is bad"),
                )));
            }
            self.disk.write_block(index, buffer)
        }
    }

    fn pattern(length: usize) -> Vec<u8> {
        (0..length).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn empty_write() {
        let mut fs = formatted(64);
        let file = fs.create_file(ROOT_INODE, "f").unwrap();
        assert_eq!(fs.write(file, &[], 0).unwrap(), 0);
        assert_eq!(fs.get_size(file).unwrap(), 0);
        let mut buffer = [0u8; 16];
        assert_eq!(fs.read(file, &mut buffer, 0).unwrap(), 0);
    }

    #[test]
    fn direct_blocks_only() {
        let mut fs = formatted(64);
        let file = fs.create_file(ROOT_INODE, "f").unwrap();
        let free = fs.usage().unwrap().blocks_free;
        assert_eq!(fs.write(file, &pattern(5000), 0).unwrap(), 5000);
        assert_eq!(fs.get_size(file).unwrap(), 5000);
        assert_eq!(fs.usage().unwrap().blocks_free, free - 5);
        match fs.load_inode(file).unwrap() {
            Inode::File {
                direct, indirect, ..
            } => {
                assert!(direct.iter().all(|&p| p != NULL_BLOCK));
                assert_eq!(indirect, NULL_BLOCK);
            }
            other => panic!("unexpected inode {other:?}"),
        }
    }

    #[test]
    fn indirect_block() {
        let mut fs = formatted(64);
        let file = fs.create_file(ROOT_INODE, "f").unwrap();
        let free = fs.usage().unwrap().blocks_free;
        assert_eq!(fs.write(file, &pattern(6000), 0).unwrap(), 6000);
        assert_eq!(fs.get_size(file).unwrap(), 6000);
        assert_eq!(fs.usage().unwrap().blocks_free, free - 7);
        assert!(matches!(
            fs.load_inode(file).unwrap(),
            Inode::File { indirect, .. } if indirect != NULL_BLOCK
        ));
    }

    #[test]
    fn binary_round_trip() {
        let mut fs = formatted(64);
        let file = fs.create_file(ROOT_INODE, "data.bin").unwrap();
        let data = pattern(7000);
        assert_eq!(fs.write(file, &data, 0).unwrap(), data.len());

        let mut whole = vec![0xFF; data.len()];
        assert_eq!(fs.read(file, &mut whole, 0).unwrap(), data.len());
        assert_eq!(whole, data);

        let mut middle = vec![0; 1500];
        assert_eq!(fs.read(file, &mut middle, 1000).unwrap(), 1500);
        assert_eq!(middle, &data[1000..2500]);

        let mut tail = vec![0; 4096];
        assert_eq!(fs.read(file, &mut tail, 6500).unwrap(), 500);
        assert_eq!(&tail[..500], &data[6500..]);
        assert_eq!(fs.read(file, &mut tail, 7000).unwrap(), 0);
    }

    #[test]
    fn append_and_overwrite() {
        let mut fs = formatted(64);
        let file = fs.create_file(ROOT_INODE, "notes").unwrap();
        assert_eq!(fs.write(file, b"hello world", 0).unwrap(), 11);
        assert_eq!(fs.write(file, b"HELLO", 0).unwrap(), 5);
        assert_eq!(fs.get_size(file).unwrap(), 11);
        assert_eq!(fs.write(file, b", again", 11).unwrap(), 7);
        assert_eq!(fs.get_size(file).unwrap(), 18);

        let mut buffer = vec![0; 18];
        fs.read(file, &mut buffer, 0).unwrap();
        assert_eq!(buffer, b"HELLO world, again");

        let free = fs.usage().unwrap().blocks_free;
        assert_eq!(fs.write(file, &pattern(1024), 18).unwrap(), 1024);
        assert_eq!(fs.usage().unwrap().blocks_free, free - 1);
        assert!(matches!(
            fs.write(file, b"gap", 2000),
            Err(Error::InvalidOffset)
        ));
    }

    #[test]
    fn partial_write_when_full() {
        let mut fs = formatted(16);
        let file = fs.create_file(ROOT_INODE, "big").unwrap();
        assert_eq!(fs.usage().unwrap().blocks_free, 12);
        let data = pattern(20_000);
        // 11 data blocks fit next to the indirect block
        let written = fs.write(file, &data, 0).unwrap();
        assert_eq!(written, 11 * 1024);
        assert_eq!(fs.get_size(file).unwrap(), written as u64);
        assert_eq!(fs.usage().unwrap().blocks_free, 0);

        let mut buffer = vec![0; written];
        assert_eq!(fs.read(file, &mut buffer, 0).unwrap(), written);
        assert_eq!(buffer, &data[..written]);
        assert_eq!(fs.write(file, b"more", written as u64).unwrap(), 0);
        assert_eq!(fs.get_size(file).unwrap(), written as u64);
    }

    #[test]
    fn maximum_file_size() {
        let mut fs = formatted(400);
        let file = fs.create_file(ROOT_INODE, "huge").unwrap();
        let data = pattern(MAX_FILE_SIZE as usize + 100);
        assert_eq!(fs.write(file, &data, 0).unwrap(), MAX_FILE_SIZE as usize);
        assert_eq!(fs.get_size(file).unwrap(), MAX_FILE_SIZE);
        assert_eq!(fs.write(file, b"x", MAX_FILE_SIZE).unwrap(), 0);

        let mut tail = vec![0; 10];
        fs.read(file, &mut tail, MAX_FILE_SIZE - 10).unwrap();
        assert_eq!(tail, &data[MAX_FILE_SIZE as usize - 10..MAX_FILE_SIZE as usize]);
    }

    #[test]
    fn wrong_inode_kind() {
        let mut fs = formatted(64);
        let mut buffer = [0u8; 8];
        assert!(matches!(
            fs.read(ROOT_INODE, &mut buffer, 0),
            Err(Error::NotAFile)
        ));
        assert!(matches!(fs.write(ROOT_INODE, b"x", 0), Err(Error::NotAFile)));
        assert!(matches!(
            fs.write(9, b"x", 0),
            Err(Error::InodeNotAllocated)
        ));
        assert!(matches!(
            fs.read(100_000, &mut buffer, 0),
            Err(Error::InvalidInodeIndex)
        ));
    }

    #[test]
    fn delete_releases_everything() {
        let mut fs = formatted(64);
        let before = fs.usage().unwrap();
        let file = fs.create_file(ROOT_INODE, "tmp").unwrap();
        fs.write(file, &pattern(9000), 0).unwrap();
        fs.delete_file(file, ROOT_INODE).unwrap();
        assert_eq!(fs.usage().unwrap(), before);
        assert!(fs.lookup(ROOT_INODE, "tmp").unwrap().is_none());
        assert!(matches!(
            fs.delete_file(file, ROOT_INODE),
            Err(Error::InodeNotAllocated)
        ));
    }

    #[test]
    fn delete_from_wrong_parent() {
        let mut fs = formatted(64);
        let dir = fs.create_dir("/dir").unwrap();
        let file = fs.create_file(ROOT_INODE, "f").unwrap();
        assert!(matches!(
            fs.delete_file(file, dir),
            Err(Error::NameNotFound)
        ));
        assert_eq!(fs.get_size(file).unwrap(), 0);
    }

    #[test]
    fn failed_block_write_keeps_size_consistent() {
        let _ = env_logger::builder().is_test(true).try_init();
        // data_start is 8, so the sixth data block of the first file is 14
        let mut fs = Filesystem::new(Box::new(BadBlock {
            disk: Disk::in_memory(64),
            bad: 14,
        }));
        fs.format().unwrap();
        fs.mount().unwrap();
        let file = fs.create_file(ROOT_INODE, "f").unwrap();
        let free = fs.usage().unwrap().blocks_free;

        assert!(matches!(fs.write(file, &pattern(6000), 0), Err(Error::Io(_))));
        let written = 5 * BLOCK_SIZE as u64;
        assert_eq!(fs.get_size(file).unwrap(), written);
        assert!(matches!(
            fs.load_inode(file).unwrap(),
            Inode::File { indirect, .. } if indirect == NULL_BLOCK
        ));
        assert_eq!(fs.usage().unwrap().blocks_free, free - 5);

        fs.unmount();
        fs.mount().unwrap();
        assert_eq!(fs.usage().unwrap().blocks_free, free - 5);
        let mut buffer = vec![0; written as usize];
        assert_eq!(fs.read(file, &mut buffer, 0).unwrap(), written as usize);
        assert_eq!(buffer, &pattern(6000)[..written as usize]);
    }
}
