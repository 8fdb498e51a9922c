use std::fmt::Display;

use super::*;
use crate::filetypes::helpers::{encode_name, u32_from_bytes};

impl Inode {
    pub(crate) fn empty_file() -> Self {
        Self::File {
            size: 0,
            direct: [NULL_BLOCK; POINTERS_PER_INODE],
            indirect: NULL_BLOCK,
        }
    }

    pub fn is_free(&self) -> bool {
        matches!(self, Self::Free)
    }

    /// Bytes for a file, entry count for a directory
    pub fn size(&self) -> Option<u32> {
        match self {
            Self::Free => None,
            Self::File { size, .. } | Self::Directory { size, .. } => Some(*size),
        }
    }

    pub(crate) fn decode(raw: RawInode) -> Result<Self, Error> {
        let size = u32::from_le(raw.size);
        let indirect = u32::from_le(raw.indirect);
        match raw.kind {
            INODE_FREE => Ok(Self::Free),
            INODE_FILE => {
                let mut direct = [NULL_BLOCK; POINTERS_PER_INODE];
                for (pointer, chunk) in direct
                    .iter_mut()
                    .zip(raw.payload.chunks_exact(std::mem::size_of::<u32>()))
                {
                    *pointer = u32_from_bytes(chunk);
                }
                Ok(Self::File {
                    size,
                    direct,
                    indirect,
                })
            }
            INODE_DIRECTORY => {
                let length = raw.name_length as usize;
                if length == 0 || length > NAME_LENGTH || indirect == NULL_BLOCK {
                    return Err(Error::Corrupted);
                }
                let name = std::str::from_utf8(&raw.payload[..length])?.to_owned();
                Ok(Self::Directory {
                    name,
                    size,
                    entries: indirect,
                })
            }
            _ => Err(Error::Corrupted),
        }
    }

    pub(crate) fn encode(&self) -> RawInode {
        let mut raw = RawInode::zeroed();
        match self {
            Self::Free => {}
            Self::File {
                size,
                direct,
                indirect,
            } => {
                raw.kind = INODE_FILE;
                raw.size = size.to_le();
                raw.indirect = indirect.to_le();
                for (pointer, chunk) in direct
                    .iter()
                    .zip(raw.payload.chunks_exact_mut(std::mem::size_of::<u32>()))
                {
                    chunk.copy_from_slice(&pointer.to_le_bytes());
                }
            }
            Self::Directory {
                name,
                size,
                entries,
            } => {
                raw.kind = INODE_DIRECTORY;
                raw.size = size.to_le();
                raw.indirect = entries.to_le();
                raw.name_length = encode_name(name, &mut raw.payload) as u8;
            }
        }
        raw
    }
}

impl Display for Inode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Free => write!(f, "    free"),
            Self::File {
                size,
                direct,
                indirect,
            } => {
                write!(f, "    {size} size")?;
                if direct.iter().any(|&p| p != NULL_BLOCK) {
                    write!(f, "\n    direct blocks:")?;
                    for pointer in direct.iter().filter(|&&p| p != NULL_BLOCK) {
                        write!(f, " {pointer}")?;
                    }
                }
                if *indirect != NULL_BLOCK {
                    write!(f, "\n    indirect block: {indirect}")?;
                }
                Ok(())
            }
            Self::Directory {
                name,
                size,
                entries,
            } => {
                write!(f, "    directory {name}\n    {size} entries\n    entry block: {entries}")
            }
        }
    }
}
