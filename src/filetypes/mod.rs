mod block_cursor;
mod block_map;
mod directory;
mod directory_entry;
pub(crate) mod helpers;
mod regular_file;

use bytemuck::{Pod, Zeroable};

use crate::structs::{PointerBlock, NAME_LENGTH, POINTERS_PER_INODE};

pub(crate) const ENTRY_REGULAR_FILE: u8 = 1;
pub(crate) const ENTRY_DIRECTORY: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    RegularFile,
    Directory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub(crate) name: String,
    pub(crate) kind: FileType,
    pub(crate) inode: u32,
}

/// On-disk directory entry record
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct RawDirectoryEntry {
    pub(crate) inode: u32,
    pub(crate) kind: u8,
    pub(crate) name_length: u8,
    #[doc(hidden)]
    pub(crate) __padding_1: [u8; 6],
    pub(crate) name: [u8; NAME_LENGTH],
}

/// Entry block of a directory, holding its live entries in insertion order
#[derive(Debug, Clone)]
pub(crate) struct EntryBlock {
    pub(crate) index: u32,
    pub(crate) entries: Vec<DirectoryEntry>,
}

/// Position inside a file expressed as logical block and byte within it
#[derive(Debug, Clone)]
pub struct BlockCursor {
    pub(crate) block_size: usize,
    pub(crate) current_block: u64,
    pub(crate) current_byte: usize,
}

/// Logical to physical block translation of a single file
#[derive(Debug, Clone)]
pub(crate) struct FileBlocks {
    pub(crate) direct: [u32; POINTERS_PER_INODE],
    pub(crate) indirect: u32,
    /// Indirect block, loaded on first use
    pub(crate) pointers: Option<PointerBlock>,
    pub(crate) modified: bool,
}
