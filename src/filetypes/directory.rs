use log::{debug, warn};

use super::{helpers::validate_name, DirectoryEntry, EntryBlock, FileType};
use crate::filesystem::path::split_parent;
use crate::structs::{Inode, ROOT_INODE};
use crate::{Error, Filesystem};

impl Filesystem {
    /// Entry block of a directory, checked against the directory's size
    fn load_entries(&mut self, dir: u32) -> Result<EntryBlock, Error> {
        match self.load_inode(dir)? {
            Inode::Directory { size, entries, .. } => {
                let block: EntryBlock = self.load_indexed(entries)?;
                if block.entries.len() != size as usize {
                    warn!(
                        "Directory {dir} holds {} entries but records {size}",
                        block.entries.len()
                    );
                    return Err(Error::Corrupted);
                }
                Ok(block)
            }
            Inode::File { .. } => Err(Error::NotADirectory),
            Inode::Free => Err(Error::InodeNotAllocated),
        }
    }

    /// Persist an entry block and the entry count of its directory
    fn flush_entries(&mut self, dir: u32, block: &EntryBlock) -> Result<(), Error> {
        let mut inode = self.load_inode(dir)?;
        let Inode::Directory { size, .. } = &mut inode else {
            return Err(Error::NotADirectory);
        };
        *size = block.entries.len() as u32;
        self.flush_indexed(block)?;
        self.flush_inode(dir, &inode)
    }

    /// Entry named `name` in directory `dir`
    pub fn lookup(&mut self, dir: u32, name: &str) -> Result<Option<DirectoryEntry>, Error> {
        Ok(self.load_entries(dir)?.find(name).cloned())
    }

    /// Live entries of a directory in insertion order
    pub fn list_directory(&mut self, dir: u32) -> Result<Vec<DirectoryEntry>, Error> {
        Ok(self.load_entries(dir)?.entries)
    }

    /// Allocate an inode of `kind` and link it into `dir` as `name`
    pub fn create_entry(&mut self, dir: u32, name: &str, kind: FileType) -> Result<u32, Error> {
        let mut block = self.load_entries(dir)?;
        validate_name(name)?;
        if block.is_full() {
            return Err(Error::DirectoryFull);
        }
        if block.find(name).is_some() {
            return Err(Error::DuplicateName);
        }
        let index = self.find_free_inode()?.ok_or(Error::InodeTableFull)?;
        let inode = match kind {
            FileType::RegularFile => Inode::empty_file(),
            FileType::Directory => {
                let entries = self.acquire_block()?;
                if let Err(e) = self.flush_indexed(&EntryBlock::empty(entries)) {
                    self.release_block(entries)?;
                    return Err(e);
                }
                Inode::Directory {
                    name: name.to_owned(),
                    size: 0,
                    entries,
                }
            }
        };
        self.flush_inode(index, &inode)?;
        block.entries.push(DirectoryEntry {
            name: name.to_owned(),
            kind,
            inode: index,
        });
        self.flush_entries(dir, &block)?;
        debug!("Created {kind:?} {name} as inode {index} in directory {dir}");
        Ok(index)
    }

    /// Unlink the entry pointing at `target`. Returns `false` if there is none
    pub fn remove_entry(&mut self, dir: u32, target: u32) -> Result<bool, Error> {
        let mut block = self.load_entries(dir)?;
        if block.remove(target).is_none() {
            return Ok(false);
        }
        self.flush_entries(dir, &block)?;
        Ok(true)
    }

    pub fn create_file(&mut self, parent: u32, name: &str) -> Result<u32, Error> {
        self.create_entry(parent, name, FileType::RegularFile)
    }

    /// Create a directory at an absolute path whose parent already exists
    pub fn create_dir(&mut self, path: &str) -> Result<u32, Error> {
        let (parent, name) = split_parent(path)?;
        let parent = self.resolve_components(&parent)?;
        self.create_entry(parent, name, FileType::Directory)
    }

    /// Directory holding an entry for `index`
    pub fn find_parent(&mut self, index: u32) -> Result<Option<u32>, Error> {
        for (dir, inode) in self.scan_inodes()? {
            let Inode::Directory { entries, .. } = inode else {
                continue;
            };
            let block: EntryBlock = self.load_indexed(entries)?;
            if block.entries.iter().any(|entry| entry.inode == index) {
                return Ok(Some(dir));
            }
        }
        Ok(None)
    }

    /// Delete a directory with everything below it
    pub fn delete_dir(&mut self, index: u32) -> Result<(), Error> {
        if index == ROOT_INODE {
            return Err(Error::RootDeletionForbidden);
        }
        match self.load_inode(index)? {
            Inode::Directory { .. } => {}
            Inode::File { .. } => return Err(Error::NotADirectory),
            Inode::Free => return Err(Error::InodeNotAllocated),
        }
        let parent = self.find_parent(index)?;
        if parent.is_none() {
            warn!("Directory {index} is not linked from any directory");
        }
        self.delete_subtree(index, parent)
    }

    fn delete_subtree(&mut self, index: u32, parent: Option<u32>) -> Result<(), Error> {
        let Inode::Directory { entries, .. } = self.load_inode(index)? else {
            return Err(Error::NotADirectory);
        };
        for entry in self.load_entries(index)?.entries {
            match entry.kind {
                FileType::Directory => self.delete_subtree(entry.inode, Some(index))?,
                FileType::RegularFile => {
                    let file = self.load_inode(entry.inode)?;
                    self.release_file(entry.inode, &file)?;
                    self.remove_entry(index, entry.inode)?;
                }
            }
        }
        if let Some(parent) = parent {
            self.remove_entry(parent, index)?;
        }
        self.release_block(entries)?;
        debug!("Release directory {index}");
        self.flush_inode(index, &Inode::Free)
    }
}
