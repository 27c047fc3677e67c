use crate::domain::model::FileHandle;
use crate::domain::ports::StagingFs;
use crate::utils::error::{Result, SpimError};
use crate::utils::validation::{validate_path, validate_relative_path};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Largest file `MemFs` will grow to.
pub const MEMFS_MAX_FILE_SIZE: usize = 64 * 1024 * 1024;

#[derive(Debug)]
struct OpenFile {
    path: String,
    buffer: Vec<u8>,
}

#[derive(Debug, Default)]
struct MemFsInner {
    files: HashMap<String, Vec<u8>>,
    open: HashMap<FileHandle, OpenFile>,
    next_handle: u64,
}

/// In-memory filesystem shared between the session and an in-process simulator.
///
/// Opening truncates the file; written bytes become visible to `read` when
/// the handle is closed.
#[derive(Debug, Clone, Default)]
pub struct MemFs {
    inner: Arc<Mutex<MemFsInner>>,
}

impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemFsInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn exists(&self, path: &str) -> bool {
        self.lock().files.contains_key(path)
    }

    pub fn open_handles(&self) -> usize {
        self.lock().open.len()
    }
}

impl StagingFs for MemFs {
    fn open(&mut self, path: &str) -> Result<FileHandle> {
        validate_path("staging path", path)?;

        let mut inner = self.lock();
        inner.next_handle += 1;
        let handle = FileHandle(inner.next_handle);
        inner.files.insert(path.to_string(), Vec::new());
        inner.open.insert(
            handle,
            OpenFile {
                path: path.to_string(),
                buffer: Vec::new(),
            },
        );

        tracing::debug!("memfs: opened {} as {:?}", path, handle);
        Ok(handle)
    }

    fn write(&mut self, handle: FileHandle, data: &[u8], position: u64) -> Result<usize> {
        let mut inner = self.lock();
        let file = inner.open.get_mut(&handle).ok_or_else(|| {
            SpimError::staging(&format!("{:?}", handle), "write to a handle that is not open")
        })?;

        let end = usize::try_from(position)
            .ok()
            .and_then(|start| start.checked_add(data.len()))
            .filter(|&end| end <= MEMFS_MAX_FILE_SIZE)
            .ok_or_else(|| SpimError::staging(&file.path, "write position out of range"))?;
        let start = end - data.len();
        if file.buffer.len() < end {
            file.buffer.resize(end, 0);
        }
        file.buffer[start..end].copy_from_slice(data);

        Ok(data.len())
    }

    fn close(&mut self, handle: FileHandle) -> Result<()> {
        let mut inner = self.lock();
        let file = inner.open.remove(&handle).ok_or_else(|| {
            SpimError::staging(&format!("{:?}", handle), "close of a handle that is not open")
        })?;

        tracing::debug!("memfs: closed {} ({} bytes)", file.path, file.buffer.len());
        inner.files.insert(file.path, file.buffer);
        Ok(())
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.lock().files.get(path).cloned().ok_or_else(|| {
            SpimError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("File not found: {}", path),
            ))
        })
    }
}

/// Staging directory on the host, for simulators that open files with the C library.
#[derive(Debug)]
pub struct HostFs {
    root: PathBuf,
    open: HashMap<FileHandle, (String, File)>,
    next_handle: u64,
}

impl HostFs {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            open: HashMap::new(),
            next_handle: 0,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, path: &str) -> Result<PathBuf> {
        validate_relative_path("staging path", path)?;
        Ok(self.root.join(path))
    }
}

impl StagingFs for HostFs {
    fn open(&mut self, path: &str) -> Result<FileHandle> {
        let full_path = self.full_path(path)?;
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(&full_path)?;
        self.next_handle += 1;
        let handle = FileHandle(self.next_handle);
        self.open.insert(handle, (path.to_string(), file));

        tracing::debug!("hostfs: opened {} as {:?}", full_path.display(), handle);
        Ok(handle)
    }

    fn write(&mut self, handle: FileHandle, data: &[u8], position: u64) -> Result<usize> {
        let (_, file) = self.open.get_mut(&handle).ok_or_else(|| {
            SpimError::staging(&format!("{:?}", handle), "write to a handle that is not open")
        })?;

        file.seek(SeekFrom::Start(position))?;
        file.write_all(data)?;
        Ok(data.len())
    }

    fn close(&mut self, handle: FileHandle) -> Result<()> {
        let (path, file) = self.open.remove(&handle).ok_or_else(|| {
            SpimError::staging(&format!("{:?}", handle), "close of a handle that is not open")
        })?;

        file.sync_all()?;
        tracing::debug!("hostfs: closed {}", path);
        Ok(())
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.full_path(path)?)?)
    }

    fn resolve(&self, path: &str) -> String {
        self.root.join(path).display().to_string()
    }
}
