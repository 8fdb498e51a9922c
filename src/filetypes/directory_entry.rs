use super::{
    helpers::*, DirectoryEntry, EntryBlock, FileType, RawDirectoryEntry, ENTRY_DIRECTORY,
    ENTRY_REGULAR_FILE,
};
use crate::filesystem::BlockDevice;
use crate::structs::{Block, PermanentIndexed, ENTRIES_PER_BLOCK, ENTRY_SIZE, NAME_LENGTH};
use crate::Error;

use bytemuck::Zeroable;

impl DirectoryEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FileType {
        self.kind
    }

    pub fn inode(&self) -> u32 {
        self.inode
    }

    /// Decode a record, `None` for an unused slot
    pub(crate) fn from_raw(raw: &RawDirectoryEntry) -> Result<Option<Self>, Error> {
        let kind = match raw.kind {
            0 => return Ok(None),
            ENTRY_REGULAR_FILE => FileType::RegularFile,
            ENTRY_DIRECTORY => FileType::Directory,
            _ => return Err(Error::Corrupted),
        };
        let length = raw.name_length as usize;
        if length == 0 || length > NAME_LENGTH {
            return Err(Error::Corrupted);
        }
        let name = std::str::from_utf8(&raw.name[..length])?.to_owned();
        Ok(Some(Self {
            name,
            kind,
            inode: u32::from_le(raw.inode),
        }))
    }

    pub(crate) fn as_raw(&self) -> RawDirectoryEntry {
        let mut raw = RawDirectoryEntry::zeroed();
        raw.inode = self.inode.to_le();
        raw.kind = match self.kind {
            FileType::RegularFile => ENTRY_REGULAR_FILE,
            FileType::Directory => ENTRY_DIRECTORY,
        };
        raw.name_length = encode_name(&self.name, &mut raw.name) as u8;
        raw
    }
}

impl EntryBlock {
    pub(crate) fn empty(index: u32) -> Self {
        Self {
            index,
            entries: Vec::with_capacity(ENTRIES_PER_BLOCK),
        }
    }

    pub(crate) fn is_full(&self) -> bool {
        self.entries.len() >= ENTRIES_PER_BLOCK
    }

    pub(crate) fn find(&self, name: &str) -> Option<&DirectoryEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Remove the entry pointing at `inode`, keeping the order of the others
    pub(crate) fn remove(&mut self, inode: u32) -> Option<DirectoryEntry> {
        let position = self.entries.iter().position(|entry| entry.inode == inode)?;
        Some(self.entries.remove(position))
    }
}

impl PermanentIndexed for EntryBlock {
    fn index(&self) -> u32 {
        self.index
    }

    fn load(device: &mut dyn BlockDevice, index: u32) -> Result<Self, Error> {
        let block = Block::load(device, index)?;
        let mut entries = Vec::with_capacity(ENTRIES_PER_BLOCK);
        for chunk in block.data.chunks_exact(ENTRY_SIZE) {
            match DirectoryEntry::from_raw(&bytemuck::pod_read_unaligned(chunk))? {
                Some(entry) => entries.push(entry),
                None => break,
            }
        }
        Ok(Self { index, entries })
    }

    fn flush(&self, device: &mut dyn BlockDevice) -> Result<(), Error> {
        if self.entries.len() > ENTRIES_PER_BLOCK {
            return Err(Error::DirectoryFull);
        }
        let mut block = Block::empty(self.index);
        for (entry, chunk) in self.entries.iter().zip(block.data.chunks_exact_mut(ENTRY_SIZE)) {
            chunk.copy_from_slice(bytemuck::bytes_of(&entry.as_raw()));
        }
        block.flush(device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Disk;

    #[test]
    fn record_size() {
        assert_eq!(std::mem::size_of::<RawDirectoryEntry>(), ENTRY_SIZE);
        assert_eq!(ENTRIES_PER_BLOCK, 32);
    }

    #[test]
    fn byte_conversion() {
        let entry = DirectoryEntry {
            inode: 420,
            kind: FileType::RegularFile,
            name: "foobar.exe".into(),
        };
        let raw = entry.as_raw();
        assert_eq!(&raw.name[..10], b"foobar.exe");
        assert_eq!(DirectoryEntry::from_raw(&raw).unwrap(), Some(entry));
        assert_eq!(
            DirectoryEntry::from_raw(&RawDirectoryEntry::zeroed()).unwrap(),
            None
        );
    }

    #[test]
    fn block_keeps_order() {
        let mut dev = Disk::in_memory(16);
        let mut block = EntryBlock::empty(10);
        for (inode, name) in ["a", "b", "c", "d"].into_iter().enumerate() {
            block.entries.push(DirectoryEntry {
                name: name.into(),
                kind: FileType::Directory,
                inode: inode as u32 + 1,
            });
        }
        assert_eq!(block.remove(2).unwrap().name, "b");
        assert!(block.remove(2).is_none());
        block.flush(&mut dev).unwrap();
        let loaded = EntryBlock::load(&mut dev, 10).unwrap();
        let names = loaded
            .entries
            .iter()
            .map(DirectoryEntry::name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["a", "c", "d"]);
        assert_eq!(loaded.find("d").unwrap().inode, 4);
        assert!(loaded.find("b").is_none());
    }
}
