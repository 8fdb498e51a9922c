use std::fmt::Display;

use super::*;
use crate::filetypes::helpers::u32_from_bytes;

impl Block {
    /// Zero-initialized block that will be written to `index`
    pub fn empty(index: u32) -> Self {
        Self {
            index,
            data: vec![0; BLOCK_SIZE],
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Copy bytes into the block and return ones exceeding its capacity
    pub fn write_bytes<'a>(&mut self, position: usize, data: &'a [u8]) -> &'a [u8] {
        let end = usize::min(position + data.len(), self.data.len());
        let fits = end - position;
        self.data[position..end].copy_from_slice(&data[..fits]);
        &data[fits..]
    }

    /// Borrow `length` bytes starting at `position`, clamped to the block's end
    pub fn read_bytes(&self, position: usize, length: usize) -> &[u8] {
        let end = usize::min(position + length, self.data.len());
        &self.data[position..end]
    }
}

impl PermanentIndexed for Block {
    fn index(&self) -> u32 {
        self.index
    }

    fn load(device: &mut dyn BlockDevice, index: u32) -> Result<Self, Error> {
        let mut block = Self::empty(index);
        device.read_block(index as u64, &mut block.data)?;
        Ok(block)
    }

    fn flush(&self, device: &mut dyn BlockDevice) -> Result<(), Error> {
        device.write_block(self.index as u64, &self.data)
    }
}

impl Display for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "block {}:", self.index)?;
        for (row, chunk) in self.data.chunks(32).enumerate() {
            write!(f, "\n    {:04x} ", row * 32)?;
            for byte in chunk {
                write!(f, "{byte:02x}")?;
            }
        }
        Ok(())
    }
}

impl PointerBlock {
    pub(crate) fn empty(index: u32) -> Self {
        Self {
            index,
            pointers: vec![NULL_BLOCK; POINTERS_PER_BLOCK],
        }
    }

    /// Non-null pointers, in slot order
    pub(crate) fn allocated(&self) -> impl Iterator<Item = u32> + '_ {
        self.pointers.iter().copied().filter(|&p| p != NULL_BLOCK)
    }
}

impl PermanentIndexed for PointerBlock {
    fn index(&self) -> u32 {
        self.index
    }

    fn load(device: &mut dyn BlockDevice, index: u32) -> Result<Self, Error> {
        let block = Block::load(device, index)?;
        let pointers = block
            .data
            .chunks_exact(std::mem::size_of::<u32>())
            .map(u32_from_bytes)
            .collect();
        Ok(Self { index, pointers })
    }

    fn flush(&self, device: &mut dyn BlockDevice) -> Result<(), Error> {
        let mut block = Block::empty(self.index);
        for (slot, chunk) in self
            .pointers
            .iter()
            .zip(block.data.chunks_exact_mut(std::mem::size_of::<u32>()))
        {
            chunk.copy_from_slice(&slot.to_le_bytes());
        }
        block.flush(device)
    }
}

impl PermanentIndexed for InodeBlock {
    fn index(&self) -> u32 {
        self.index
    }

    fn load(device: &mut dyn BlockDevice, index: u32) -> Result<Self, Error> {
        let block = Block::load(device, index)?;
        let inodes = block
            .data
            .chunks_exact(INODE_SIZE)
            .map(|chunk| Inode::decode(bytemuck::pod_read_unaligned(chunk)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { index, inodes })
    }

    fn flush(&self, device: &mut dyn BlockDevice) -> Result<(), Error> {
        let mut block = Block::empty(self.index);
        for (inode, chunk) in self.inodes.iter().zip(block.data.chunks_exact_mut(INODE_SIZE)) {
            chunk.copy_from_slice(bytemuck::bytes_of(&inode.encode()));
        }
        block.flush(device)
    }
}
