//! Process-shared memory segments for graph sequences.
//!
//! A segment is a memory-mapped file in `/dev/shm` (or the system temporary
//! directory when that does not exist) identified by a name. The process
//! that creates the segment owns it and removes the backing file when the
//! segment is dropped; other processes map the existing file read-only and
//! merely detach. A named lock file serializes segment creation against
//! readers mapping the same segment.

use memmap2::{Mmap, MmapMut};

use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

//-----------------------------------------------------------------------------

const SEGMENT_PREFIX: &str = "gbwtgraph_";
const LOCK_SUFFIX: &str = ".lock";
const LOCK_TIMEOUT: Duration = Duration::from_secs(10);
const LOCK_RETRY: Duration = Duration::from_millis(10);

fn segment_directory() -> PathBuf {
    let shm = Path::new("/dev/shm");
    if shm.is_dir() {
        shm.to_path_buf()
    } else {
        std::env::temp_dir()
    }
}

fn segment_path(name: &str) -> PathBuf {
    let mut path = segment_directory();
    path.push(format!("{}{}", SEGMENT_PREFIX, name));
    path
}

//-----------------------------------------------------------------------------

// A named lock based on exclusive file creation. Acquisition is bounded:
// waiting longer than the timeout is an error.
struct NamedLock {
    path: PathBuf,
}

impl NamedLock {
    fn acquire(name: &str) -> Result<Self, String> {
        let mut path = segment_path(name).into_os_string();
        path.push(LOCK_SUFFIX);
        let path = PathBuf::from(path);
        let start = Instant::now();
        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => return Ok(NamedLock { path }),
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    if start.elapsed() > LOCK_TIMEOUT {
                        return Err(format!("Timeout while waiting for lock {}", path.display()));
                    }
                    std::thread::sleep(LOCK_RETRY);
                }
                Err(err) => {
                    return Err(format!("Cannot create lock {}: {}", path.display(), err));
                }
            }
        }
    }
}

impl Drop for NamedLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

//-----------------------------------------------------------------------------

enum Mapping {
    Writable(MmapMut),
    ReadOnly(Mmap),
}

/// A named process-shared memory segment.
pub struct SharedMemory {
    map: Mapping,
    path: PathBuf,
    owner: bool,
}

impl SharedMemory {
    /// Creates a segment with the given name and contents.
    ///
    /// The calling process becomes the owner of the segment and removes it
    /// when the segment is dropped. Returns an error if a segment with the
    /// same name already exists.
    pub fn create(name: &str, data: &[u8]) -> Result<Self, String> {
        let _lock = NamedLock::acquire(name)?;
        let path = segment_path(name);
        let file = OpenOptions::new().read(true).write(true).create_new(true).open(&path)
            .map_err(|err| format!("Cannot create shared memory segment {}: {}", path.display(), err))?;
        file.set_len(data.len() as u64)
            .map_err(|err| format!("Cannot resize shared memory segment {}: {}", path.display(), err))?;

        let mut map = unsafe { MmapMut::map_mut(&file) }
            .map_err(|err| format!("Cannot map shared memory segment {}: {}", path.display(), err))?;
        map.copy_from_slice(data);

        Ok(SharedMemory {
            map: Mapping::Writable(map),
            path,
            owner: true,
        })
    }

    /// Maps an existing segment with the given name read-only.
    ///
    /// The segment remains owned by its creator; dropping the returned
    /// value only detaches from it.
    pub fn open(name: &str) -> Result<Self, String> {
        let _lock = NamedLock::acquire(name)?;
        let path = segment_path(name);
        let file = File::open(&path)
            .map_err(|err| format!("Cannot open shared memory segment {}: {}", path.display(), err))?;
        let map = unsafe { Mmap::map(&file) }
            .map_err(|err| format!("Cannot map shared memory segment {}: {}", path.display(), err))?;

        Ok(SharedMemory {
            map: Mapping::ReadOnly(map),
            path,
            owner: false,
        })
    }

    /// Returns the length of the segment in bytes.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Returns `true` if the segment is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the contents of the segment.
    pub fn as_bytes(&self) -> &[u8] {
        match &self.map {
            Mapping::Writable(map) => map,
            Mapping::ReadOnly(map) => map,
        }
    }

    /// Returns `true` if this process owns the segment.
    pub fn is_owner(&self) -> bool {
        self.owner
    }

    /// Returns the path of the file backing the segment.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SharedMemory {
    fn drop(&mut self) {
        if self.owner {
            let _ = fs::remove_file(&self.path);
        }
    }
}

impl std::fmt::Debug for SharedMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedMemory")
            .field("path", &self.path)
            .field("len", &self.len())
            .field("owner", &self.owner)
            .finish()
    }
}

//-----------------------------------------------------------------------------
