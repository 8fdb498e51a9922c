use std::sync::{Arc, Mutex, MutexGuard};

use super::Filesystem;
use crate::Error;

/// Filesystem shared between threads behind a single lock
#[derive(Debug, Clone)]
pub struct SharedFilesystem {
    pub(crate) filesystem: Arc<Mutex<Filesystem>>,
}

impl SharedFilesystem {
    pub fn new(filesystem: Filesystem) -> Self {
        Self {
            filesystem: Arc::new(Mutex::new(filesystem)),
        }
    }

    pub fn fs_handle(&self) -> Result<MutexGuard<'_, Filesystem>, Error> {
        if let Ok(fs) = self.filesystem.lock() {
            Ok(fs)
        } else {
            Err(Error::ThreadSync)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::SharedFilesystem;
    use crate::filesystem::tests::formatted;
    use crate::structs::ROOT_INODE;

    #[test]
    fn concurrent_writers() {
        let shared = SharedFilesystem::new(formatted(128));
        let workers = (0..4u8)
            .map(|worker| {
                let shared = shared.clone();
                thread::spawn(move || {
                    let mut fs = shared.fs_handle().unwrap();
                    let index = fs.create_file(ROOT_INODE, &format!("worker{worker}")).unwrap();
                    let data = vec![worker; 3000];
                    assert_eq!(fs.write(index, &data, 0).unwrap(), data.len());
                    index
                })
            })
            .collect::<Vec<_>>();
        let indexes = workers
            .into_iter()
            .map(|worker| worker.join().unwrap())
            .collect::<Vec<_>>();
        let mut fs = shared.fs_handle().unwrap();
        assert_eq!(fs.list_directory(ROOT_INODE).unwrap().len(), 4);
        for index in indexes {
            let mut buffer = vec![0u8; 3000];
            assert_eq!(fs.read(index, &mut buffer, 0).unwrap(), 3000);
            assert!(buffer.iter().all(|&b| b == buffer[0]));
        }
    }
}
