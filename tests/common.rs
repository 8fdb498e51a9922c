//! Shared setup for the integration tests

use simplefs::{Disk, Filesystem};

/// Memory-backed volume, formatted and mounted
pub fn volume(blocks: u32) -> Filesystem {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut fs = Filesystem::new(Box::new(Disk::in_memory(blocks)));
    fs.format().unwrap();
    fs.mount().unwrap();
    fs
}
