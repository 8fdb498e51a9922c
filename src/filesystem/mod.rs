use log::{debug, info, warn};

use crate::filetypes::{EntryBlock, FileType};
use crate::structs::*;
use crate::Error;

mod device;
pub(crate) mod path;
mod shared;

pub use device::{BlockDevice, Disk};
pub use shared::SharedFilesystem;

#[derive(Debug)]
pub struct Filesystem {
    pub(crate) device: Box<dyn BlockDevice>,
    pub(crate) mounted: Option<Mounted>,
}

/// In-memory state that only exists while the volume is mounted
#[derive(Debug)]
pub(crate) struct Mounted {
    pub(crate) superblock: Superblock,
    pub(crate) blocks: Bitmap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub blocks: u64,
    pub blocks_free: u64,
    pub inodes: u64,
    pub inodes_free: u64,
}

impl Filesystem {
    /// Wrap a device without touching it. Call [`Self::format`] or [`Self::mount`] next
    pub fn new(device: Box<dyn BlockDevice>) -> Self {
        Self {
            device,
            mounted: None,
        }
    }

    pub fn into_device(self) -> Box<dyn BlockDevice> {
        self.device
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    fn state(&self) -> Result<&Mounted, Error> {
        self.mounted.as_ref().ok_or(Error::NotMounted)
    }

    fn state_mut(&mut self) -> Result<&mut Mounted, Error> {
        self.mounted.as_mut().ok_or(Error::NotMounted)
    }

    pub fn superblock(&self) -> Result<Superblock, Error> {
        Ok(self.state()?.superblock)
    }

    pub fn bitmap(&self) -> Result<&Bitmap, Error> {
        Ok(&self.state()?.blocks)
    }

    /// Write a fresh superblock, an empty inode table and the root directory.
    /// A mounted instance loses its in-memory state and has to be mounted again
    pub fn format(&mut self) -> Result<(), Error> {
        let block_count = u64::min(self.device.block_count(), u32::MAX as u64) as u32;
        let superblock = Superblock::new(block_count)?;
        if superblock.data_start() >= block_count {
            return Err(Error::DeviceTooSmall);
        }
        if self.mounted.take().is_some() {
            warn!("Formatting mounted filesystem, it is now unmounted");
        }
        info!(
            "Formatting {block_count} blocks with {} inode blocks",
            superblock.inode_blocks
        );
        superblock.flush(&mut *self.device)?;
        let root_entries = superblock.data_start();
        for index in 1..=superblock.inode_blocks {
            let mut table = InodeBlock {
                index,
                inodes: vec![Inode::Free; INODES_PER_BLOCK],
            };
            if index == 1 {
                table.inodes[ROOT_INODE as usize] = Inode::Directory {
                    name: ROOT_NAME.to_owned(),
                    size: 0,
                    entries: root_entries,
                };
            }
            table.flush(&mut *self.device)?;
        }
        EntryBlock::empty(root_entries).flush(&mut *self.device)?;
        Ok(())
    }

    /// Validate the superblock and rebuild the block bitmap from the inode table
    pub fn mount(&mut self) -> Result<(), Error> {
        let superblock = Superblock::load(&mut *self.device)?;
        let mut blocks = Bitmap::new(
            superblock.block_count as u64,
            superblock.data_start() as u64,
        )?;
        for (index, inode) in scan_table(&mut *self.device, &superblock)? {
            match inode {
                Inode::Free if index == ROOT_INODE => return Err(Error::Corrupted),
                Inode::File { .. } if index == ROOT_INODE => return Err(Error::Corrupted),
                Inode::Free => {}
                Inode::File {
                    direct, indirect, ..
                } => {
                    for pointer in direct.into_iter().filter(|&p| p != NULL_BLOCK) {
                        claim(&mut blocks, pointer)?;
                    }
                    if indirect != NULL_BLOCK {
                        claim(&mut blocks, indirect)?;
                        let pointers = PointerBlock::load(&mut *self.device, indirect)?;
                        for pointer in pointers.allocated() {
                            claim(&mut blocks, pointer)?;
                        }
                    }
                }
                Inode::Directory { entries, .. } => claim(&mut blocks, entries)?,
            }
        }
        if self.mounted.is_some() {
            debug!("Remounting, bitmap rebuilt");
        }
        info!(
            "Mounted filesystem with {} of {} blocks free",
            blocks.free_count(),
            blocks.count()
        );
        self.mounted = Some(Mounted { superblock, blocks });
        Ok(())
    }

    /// Drop the in-memory state. Every change is already on the device
    pub fn unmount(&mut self) {
        if self.mounted.take().is_some() {
            info!("Unmounted filesystem");
        }
    }

    /// Get index of first free block past the reserved region
    pub(crate) fn acquire_block(&mut self) -> Result<u32, Error> {
        let blocks = &mut self.state_mut()?.blocks;
        if let Some(index) = blocks.next_free() {
            blocks.set(index, true)?;
            debug!("Acquire block {index}");
            Ok(index as u32)
        } else {
            Err(Error::OutOfSpace)
        }
    }

    /// Release block at index. Releasing a free block is a no-op
    pub(crate) fn release_block(&mut self, index: u32) -> Result<(), Error> {
        let blocks = &mut self.state_mut()?.blocks;
        if (index as u64) < blocks.reserved {
            return Err(Error::OutOfBounds);
        }
        debug!("Release block {index}");
        blocks.set(index as u64, false)
    }

    fn check_block(&self, index: u32) -> Result<(), Error> {
        let superblock = self.superblock()?;
        if index == 0 || index >= superblock.block_count {
            return Err(Error::OutOfBounds);
        }
        Ok(())
    }

    /// Load a block-resident structure
    pub(crate) fn load_indexed<T: PermanentIndexed>(&mut self, index: u32) -> Result<T, Error> {
        self.check_block(index)?;
        T::load(&mut *self.device, index)
    }

    /// Flush a block-resident structure
    pub(crate) fn flush_indexed<T: PermanentIndexed>(&mut self, item: &T) -> Result<(), Error> {
        self.check_block(item.index())?;
        item.flush(&mut *self.device)
    }

    /// Load block with index, the superblock included
    pub fn load_block(&mut self, index: u32) -> Result<Block, Error> {
        if index >= self.superblock()?.block_count {
            return Err(Error::OutOfBounds);
        }
        Block::load(&mut *self.device, index)
    }

    pub(crate) fn flush_block(&mut self, block: &Block) -> Result<(), Error> {
        self.flush_indexed(block)
    }

    /// Load inode with index
    pub fn load_inode(&mut self, index: u32) -> Result<Inode, Error> {
        let (block, slot) = self.superblock()?.inode_position(index)?;
        let table: InodeBlock = self.load_indexed(block)?;
        Ok(table.inodes[slot].clone())
    }

    /// Flush inode
    pub(crate) fn flush_inode(&mut self, index: u32, inode: &Inode) -> Result<(), Error> {
        let (block, slot) = self.superblock()?.inode_position(index)?;
        let mut table: InodeBlock = self.load_indexed(block)?;
        debug!("Flush inode {index}");
        table.inodes[slot] = inode.clone();
        self.flush_indexed(&table)
    }

    /// Every inode of the table with its index
    pub fn scan_inodes(&mut self) -> Result<Vec<(u32, Inode)>, Error> {
        let superblock = self.superblock()?;
        scan_table(&mut *self.device, &superblock)
    }

    /// Lowest free inode index, `None` when the table is full
    pub fn find_free_inode(&mut self) -> Result<Option<u32>, Error> {
        let superblock = self.superblock()?;
        for block in 1..=superblock.inode_blocks {
            let table: InodeBlock = self.load_indexed(block)?;
            if let Some(slot) = table.inodes.iter().position(Inode::is_free) {
                return Ok(Some((block - 1) * INODES_PER_BLOCK as u32 + slot as u32));
            }
        }
        Ok(None)
    }

    /// Size in bytes of a file, or entry count of a directory
    pub fn get_size(&mut self, index: u32) -> Result<u64, Error> {
        self.load_inode(index)?
            .size()
            .map(u64::from)
            .ok_or(Error::InodeNotAllocated)
    }

    pub fn usage(&mut self) -> Result<Usage, Error> {
        let inodes = self.scan_inodes()?;
        let blocks = self.bitmap()?;
        Ok(Usage {
            blocks: blocks.count(),
            blocks_free: blocks.free_count(),
            inodes: inodes.len() as u64,
            inodes_free: inodes.iter().filter(|(_, inode)| inode.is_free()).count() as u64,
        })
    }

    /// Human-readable listing of the superblock, live inodes and the bitmap
    pub fn debug_dump(&mut self) -> Result<String, Error> {
        let mut dump = format!("{}\n", self.superblock()?);
        for (index, inode) in self.scan_inodes()? {
            if inode.is_free() {
                continue;
            }
            dump.push_str(&format!("inode {index}\n{inode}\n"));
            match inode {
                Inode::File { indirect, .. } if indirect != NULL_BLOCK => {
                    let pointers: PointerBlock = self.load_indexed(indirect)?;
                    dump.push_str("    indirect data blocks:");
                    for pointer in pointers.allocated() {
                        dump.push_str(&format!(" {pointer}"));
                    }
                    dump.push('\n');
                }
                Inode::Directory { .. } => {
                    for entry in self.list_directory(index)? {
                        let kind = match entry.kind {
                            FileType::RegularFile => "file",
                            FileType::Directory => "dir",
                        };
                        dump.push_str(&format!(
                            "    {} {kind} -> inode {}\n",
                            entry.name, entry.inode
                        ));
                    }
                }
                _ => {}
            }
        }
        dump.push_str(&format!("{}\n", self.bitmap()?));
        Ok(dump)
    }
}

fn scan_table(
    device: &mut dyn BlockDevice,
    superblock: &Superblock,
) -> Result<Vec<(u32, Inode)>, Error> {
    let mut inodes = Vec::with_capacity(superblock.inode_count as usize);
    for block in 1..=superblock.inode_blocks {
        let table = InodeBlock::load(device, block)?;
        let first = (block - 1) * INODES_PER_BLOCK as u32;
        inodes.extend(
            table
                .inodes
                .into_iter()
                .enumerate()
                .map(|(slot, inode)| (first + slot as u32, inode)),
        );
    }
    Ok(inodes)
}

/// Mark a block referenced by an inode, refusing blocks that are already taken
fn claim(blocks: &mut Bitmap, index: u32) -> Result<(), Error> {
    if blocks.get(index as u64)? {
        warn!("Block {index} is referenced twice");
        return Err(Error::Corrupted);
    }
    blocks.set(index as u64, true)
}
