mod bitmap;
mod block;
mod inode;
mod superblock;

use bytemuck::{Pod, Zeroable};

use crate::{filesystem::BlockDevice, Error};

pub const BLOCK_SIZE: usize = 1024;
pub const MAGIC_SIGNATURE: u32 = 0xF0F0_3410;
pub const INODE_SIZE: usize = std::mem::size_of::<RawInode>();
pub const INODES_PER_BLOCK: usize = BLOCK_SIZE / INODE_SIZE;
pub const POINTERS_PER_INODE: usize = 5;
pub const POINTERS_PER_BLOCK: usize = BLOCK_SIZE / std::mem::size_of::<u32>();
pub const MAX_FILE_SIZE: u64 = ((POINTERS_PER_INODE + POINTERS_PER_BLOCK) * BLOCK_SIZE) as u64;
pub const NAME_LENGTH: usize = 20;
pub const ENTRY_SIZE: usize = 32;
pub const ENTRIES_PER_BLOCK: usize = BLOCK_SIZE / ENTRY_SIZE;
pub const ROOT_INODE: u32 = 0;
pub const ROOT_NAME: &str = "root";
/// Pointer value meaning "no block". Block 0 always holds the superblock.
pub const NULL_BLOCK: u32 = 0;

pub(crate) const INODE_FREE: u8 = 0;
pub(crate) const INODE_FILE: u8 = 1;
pub(crate) const INODE_DIRECTORY: u8 = 2;

/// Block-resident structure addressed by its block index
pub(crate) trait PermanentIndexed: Sized {
    fn index(&self) -> u32;
    fn load(device: &mut dyn BlockDevice, index: u32) -> Result<Self, Error>;
    fn flush(&self, device: &mut dyn BlockDevice) -> Result<(), Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Superblock {
    /// Magic signature
    pub(crate) magic: u32,
    /// Total count of blocks in the filesystem
    pub(crate) block_count: u32,
    /// Count of blocks reserved for the inode table
    pub(crate) inode_blocks: u32,
    /// Total count of inodes in the filesystem
    pub(crate) inode_count: u32,
}

#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct RawSuperblock {
    pub(crate) magic: u32,
    pub(crate) block_count: u32,
    pub(crate) inode_blocks: u32,
    pub(crate) inode_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inode {
    Free,
    File {
        /// File size in bytes
        size: u32,
        /// Data blocks for the first [`POINTERS_PER_INODE`] logical blocks
        direct: [u32; POINTERS_PER_INODE],
        /// Block holding pointers to the remaining data blocks
        indirect: u32,
    },
    Directory {
        name: String,
        /// Count of live entries
        size: u32,
        /// The single block holding this directory's entries
        entries: u32,
    },
}

/// On-disk inode record. `payload` holds either the direct pointers of a
/// file or the name of a directory, depending on `kind`.
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct RawInode {
    pub(crate) kind: u8,
    pub(crate) name_length: u8,
    #[doc(hidden)]
    pub(crate) __padding_1: [u8; 2],
    pub(crate) size: u32,
    pub(crate) indirect: u32,
    pub(crate) payload: [u8; 20],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Block's index
    pub(crate) index: u32,
    /// Raw data as bytes
    pub(crate) data: Vec<u8>,
}

/// Indirect block of a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PointerBlock {
    pub(crate) index: u32,
    pub(crate) pointers: Vec<u32>,
}

/// One block of the inode table
#[derive(Debug, Clone)]
pub(crate) struct InodeBlock {
    pub(crate) index: u32,
    pub(crate) inodes: Vec<Inode>,
}

#[derive(Debug, Clone)]
pub struct Bitmap {
    /// Bits mapping to block indexes
    pub(crate) bitfield: Vec<usize>,
    /// Number of valid indexes
    pub(crate) count: u64,
    /// Leading indexes that are never handed out
    pub(crate) reserved: u64,
}
