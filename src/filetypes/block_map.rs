use log::debug;

use super::FileBlocks;
use crate::structs::{Inode, PointerBlock, NULL_BLOCK, POINTERS_PER_BLOCK, POINTERS_PER_INODE};
use crate::{Error, Filesystem};

impl FileBlocks {
    pub(crate) fn new(inode: &Inode) -> Result<Self, Error> {
        match inode {
            Inode::File {
                direct, indirect, ..
            } => Ok(Self {
                direct: *direct,
                indirect: *indirect,
                pointers: None,
                modified: false,
            }),
            Inode::Free => Err(Error::InodeNotAllocated),
            Inode::Directory { .. } => Err(Error::NotAFile),
        }
    }

    /// Indirect block, read from the device at most once
    fn pointers(&mut self, fs: &mut Filesystem) -> Result<&mut PointerBlock, Error> {
        if self.pointers.is_none() {
            self.pointers = Some(fs.load_indexed(self.indirect)?);
        }
        self.pointers.as_mut().ok_or(Error::Corrupted)
    }

    /// Physical block backing logical block `logical`, `None` if not allocated yet
    pub(crate) fn resolve(&mut self, fs: &mut Filesystem, logical: u64) -> Result<Option<u32>, Error> {
        let pointer = if logical < POINTERS_PER_INODE as u64 {
            self.direct[logical as usize]
        } else {
            let slot = (logical - POINTERS_PER_INODE as u64) as usize;
            if slot >= POINTERS_PER_BLOCK {
                return Err(Error::MaxFileSizeExceeded);
            }
            if self.indirect == NULL_BLOCK {
                return Ok(None);
            }
            self.pointers(fs)?.pointers[slot]
        };
        Ok((pointer != NULL_BLOCK).then_some(pointer))
    }

    /// Physical block backing logical block `logical`, allocated if missing.
    /// The flag is `true` when the block was just allocated
    pub(crate) fn resolve_or_allocate(
        &mut self,
        fs: &mut Filesystem,
        logical: u64,
    ) -> Result<(u32, bool), Error> {
        if let Some(physical) = self.resolve(fs, logical)? {
            return Ok((physical, false));
        }
        let physical = fs.acquire_block()?;
        if logical < POINTERS_PER_INODE as u64 {
            self.direct[logical as usize] = physical;
        } else {
            if self.indirect == NULL_BLOCK {
                match fs.acquire_block() {
                    Ok(indirect) => {
                        debug!("Indirect block {indirect} allocated");
                        self.indirect = indirect;
                        self.pointers = Some(PointerBlock::empty(indirect));
                    }
                    Err(e) => {
                        fs.release_block(physical)?;
                        return Err(e);
                    }
                }
            }
            let slot = (logical - POINTERS_PER_INODE as u64) as usize;
            self.pointers(fs)?.pointers[slot] = physical;
        }
        self.modified = true;
        Ok((physical, true))
    }

    /// Unlink and release the block backing `logical`. An indirect block left
    /// without pointers is released too
    pub(crate) fn forget(&mut self, fs: &mut Filesystem, logical: u64) -> Result<(), Error> {
        let Some(physical) = self.resolve(fs, logical)? else {
            return Ok(());
        };
        if logical < POINTERS_PER_INODE as u64 {
            self.direct[logical as usize] = NULL_BLOCK;
        } else {
            let slot = (logical - POINTERS_PER_INODE as u64) as usize;
            let pointers = self.pointers(fs)?;
            pointers.pointers[slot] = NULL_BLOCK;
            if pointers.allocated().next().is_none() {
                fs.release_block(self.indirect)?;
                self.indirect = NULL_BLOCK;
                self.pointers = None;
            }
        }
        self.modified = true;
        fs.release_block(physical)
    }

    /// Persist the indirect block and copy the pointers back into `inode`
    pub(crate) fn flush(&mut self, fs: &mut Filesystem, inode: &mut Inode) -> Result<(), Error> {
        if !self.modified {
            return Ok(());
        }
        if let Some(pointers) = &self.pointers {
            fs.flush_indexed(pointers)?;
        }
        if let Inode::File {
            direct, indirect, ..
        } = inode
        {
            *direct = self.direct;
            *indirect = self.indirect;
        }
        self.modified = false;
        Ok(())
    }

    /// Every block owned by the file, the indirect block last
    pub(crate) fn owned(&mut self, fs: &mut Filesystem) -> Result<Vec<u32>, Error> {
        let mut owned = self
            .direct
            .iter()
            .copied()
            .filter(|&p| p != NULL_BLOCK)
            .collect::<Vec<_>>();
        if self.indirect != NULL_BLOCK {
            let indirect = self.indirect;
            owned.extend(self.pointers(fs)?.allocated());
            owned.push(indirect);
        }
        Ok(owned)
    }
}
