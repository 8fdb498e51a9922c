use std::fmt::Display;
use std::str::Utf8Error;
use std::sync::PoisonError;

#[derive(Debug)]
pub enum Error {
    NotMounted,
    InvalidInodeIndex,
    InodeNotAllocated,
    NotADirectory,
    NotAFile,
    DirectoryFull,
    DuplicateName,
    NameNotFound,
    OutOfSpace,
    MaxFileSizeExceeded,
    InvalidPath,
    InvalidName,
    InvalidOffset,
    RootDeletionForbidden,
    BitmapAllocation,
    InodeTableFull,
    InvalidSignature,
    DeviceTooSmall,
    DeviceTooLarge,
    OutOfBounds,
    Corrupted,
    ThreadSync,
    Utf8(Utf8Error),
    Io(std::io::Error),
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotMounted => write!(f, "filesystem is not mounted"),
            Self::InvalidInodeIndex => write!(f, "inode index out of range"),
            Self::InodeNotAllocated => write!(f, "inode is not allocated"),
            Self::NotADirectory => write!(f, "not a directory"),
            Self::NotAFile => write!(f, "not a regular file"),
            Self::DirectoryFull => write!(f, "directory entry block is full"),
            Self::DuplicateName => write!(f, "name already exists"),
            Self::NameNotFound => write!(f, "no such file or directory"),
            Self::OutOfSpace => write!(f, "no free blocks left"),
            Self::MaxFileSizeExceeded => write!(f, "maximum file size exceeded"),
            Self::InvalidPath => write!(f, "invalid path"),
            Self::InvalidName => write!(f, "invalid name"),
            Self::InvalidOffset => write!(f, "offset lies past the end of file"),
            Self::RootDeletionForbidden => write!(f, "root directory cannot be deleted"),
            Self::BitmapAllocation => write!(f, "could not allocate block bitmap"),
            Self::InodeTableFull => write!(f, "no free inodes left"),
            Self::InvalidSignature => write!(f, "magic signature mismatch"),
            Self::DeviceTooSmall => write!(f, "device too small to hold a filesystem"),
            Self::DeviceTooLarge => write!(f, "device too large for the inode table"),
            Self::OutOfBounds => write!(f, "out of bounds"),
            Self::Corrupted => write!(f, "corrupted metadata"),
            Self::ThreadSync => write!(f, "filesystem lock poisoned"),
            Self::Utf8(e) => write!(f, "{e}"),
            Self::Io(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<Utf8Error> for Error {
    fn from(value: Utf8Error) -> Self {
        Self::Utf8(value)
    }
}

impl<T> From<PoisonError<T>> for Error {
    fn from(_: PoisonError<T>) -> Self {
        Self::ThreadSync
    }
}
