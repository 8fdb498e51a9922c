//! Educational filesystem living on a flat array of fixed-size blocks.
//!
//! Volume layout:
//! - block 0: superblock
//! - blocks `1..=inode_blocks`: inode table
//! - remaining blocks: file data, indirect pointer blocks and directory entry blocks
//!
//! The free-space bitmap is never stored on disk, it is rebuilt from the
//! inode table every time the volume is mounted.

mod error;
mod filesystem;
mod filetypes;
mod structs;

pub use error::Error;
pub use filesystem::{BlockDevice, Disk, Filesystem, SharedFilesystem, Usage};
pub use filetypes::{DirectoryEntry, FileType};
pub use structs::{
    Bitmap, Block, Inode, Superblock, BLOCK_SIZE, ENTRIES_PER_BLOCK, INODES_PER_BLOCK,
    MAGIC_SIGNATURE, MAX_FILE_SIZE, NAME_LENGTH, POINTERS_PER_BLOCK, POINTERS_PER_INODE,
    ROOT_INODE, ROOT_NAME,
};
