use std::fmt::Display;

use super::*;

impl Superblock {
    /// Geometry for a volume of `block_count` blocks, a tenth of which goes to the inode table
    pub fn new(block_count: u32) -> Result<Self, Error> {
        let inode_blocks = block_count / 10 + 1;
        let inode_count = inode_blocks
            .checked_mul(INODES_PER_BLOCK as u32)
            .ok_or(Error::DeviceTooLarge)?;
        Ok(Self {
            magic: MAGIC_SIGNATURE,
            block_count,
            inode_blocks,
            inode_count,
        })
    }

    pub fn block_count(&self) -> u32 {
        self.block_count
    }

    pub fn inode_blocks(&self) -> u32 {
        self.inode_blocks
    }

    pub fn inode_count(&self) -> u32 {
        self.inode_count
    }

    /// First block past the superblock and the inode table
    pub fn data_start(&self) -> u32 {
        1 + self.inode_blocks
    }

    /// Inode table block and slot within it holding inode `index`
    pub(crate) fn inode_position(&self, index: u32) -> Result<(u32, usize), Error> {
        if index >= self.inode_count {
            return Err(Error::InvalidInodeIndex);
        }
        let block = index / INODES_PER_BLOCK as u32 + 1;
        let slot = index as usize % INODES_PER_BLOCK;
        Ok((block, slot))
    }

    pub(crate) fn load(device: &mut dyn BlockDevice) -> Result<Self, Error> {
        let block = Block::load(device, 0)?;
        let raw: RawSuperblock =
            bytemuck::pod_read_unaligned(&block.data[..std::mem::size_of::<RawSuperblock>()]);
        let superblock = Self {
            magic: u32::from_le(raw.magic),
            block_count: u32::from_le(raw.block_count),
            inode_blocks: u32::from_le(raw.inode_blocks),
            inode_count: u32::from_le(raw.inode_count),
        };
        if superblock.magic != MAGIC_SIGNATURE {
            return Err(Error::InvalidSignature);
        }
        let inode_count = superblock
            .inode_blocks
            .checked_mul(INODES_PER_BLOCK as u32);
        let data_start = superblock.inode_blocks.checked_add(1);
        if superblock.inode_blocks == 0
            || inode_count != Some(superblock.inode_count)
            || data_start.map_or(true, |start| start >= superblock.block_count)
            || superblock.block_count as u64 > device.block_count()
        {
            return Err(Error::Corrupted);
        }
        Ok(superblock)
    }

    pub(crate) fn flush(&self, device: &mut dyn BlockDevice) -> Result<(), Error> {
        let raw = RawSuperblock {
            magic: self.magic.to_le(),
            block_count: self.block_count.to_le(),
            inode_blocks: self.inode_blocks.to_le(),
            inode_count: self.inode_count.to_le(),
        };
        let mut block = Block::empty(0);
        block.write_bytes(0, bytemuck::bytes_of(&raw));
        block.flush(device)
    }
}

impl Display for Superblock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "superblock:")?;
        if self.magic == MAGIC_SIGNATURE {
            writeln!(f, "    magic number is valid")?;
        } else {
            writeln!(f, "    magic number is invalid")?;
        }
        writeln!(f, "    {} blocks on disk", self.block_count)?;
        writeln!(f, "    {} blocks for inodes", self.inode_blocks)?;
        write!(f, "    {} inodes total", self.inode_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Disk;

    #[test]
    fn geometry() {
        let superblock = Superblock::new(64).unwrap();
        assert_eq!(superblock.inode_blocks, 7);
        assert_eq!(superblock.inode_count, 7 * INODES_PER_BLOCK as u32);
        assert_eq!(superblock.data_start(), 8);
        assert_eq!(superblock.inode_position(0).unwrap(), (1, 0));
        assert_eq!(superblock.inode_position(33).unwrap(), (2, 1));
        assert!(matches!(
            superblock.inode_position(superblock.inode_count),
            Err(Error::InvalidInodeIndex)
        ));
    }

    #[test]
    fn load_and_flush() {
        let mut dev = Disk::in_memory(64);
        let superblock = Superblock::new(64).unwrap();
        superblock.flush(&mut dev).unwrap();
        assert_eq!(Superblock::load(&mut dev).unwrap(), superblock);
    }

    #[test]
    fn reject_blank_device() {
        let mut dev = Disk::in_memory(64);
        assert!(matches!(
            Superblock::load(&mut dev),
            Err(Error::InvalidSignature)
        ));
    }

    #[test]
    fn oversized_geometry() {
        assert!(matches!(
            Superblock::new(2_000_000_000),
            Err(Error::DeviceTooLarge)
        ));
        assert!(matches!(
            Superblock::new(u32::MAX),
            Err(Error::DeviceTooLarge)
        ));
        let largest = (u32::MAX / INODES_PER_BLOCK as u32 - 1) * 10;
        assert!(Superblock::new(largest).is_ok());
    }

    #[test]
    fn reject_overflowing_inode_table() {
        let mut dev = Disk::in_memory(64);
        for inode_blocks in [0x0800_0000, u32::MAX] {
            let raw = RawSuperblock {
                magic: MAGIC_SIGNATURE.to_le(),
                block_count: 64u32.to_le(),
                inode_blocks: inode_blocks.to_le(),
                inode_count: 0,
            };
            let mut block = Block::empty(0);
            block.write_bytes(0, bytemuck::bytes_of(&raw));
            block.flush(&mut dev).unwrap();
            assert!(matches!(
                Superblock::load(&mut dev),
                Err(Error::Corrupted)
            ));
        }
    }
}
