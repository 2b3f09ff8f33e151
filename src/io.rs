//! C1: the filesystem abstraction importers and exporters read and write
//! through. Generalised from the teacher's `import::Source` trait (which
//! exposed only `gltf()`/`buffer()`/`image()`) into a general path-keyed
//! open/read/write interface so every codec, not just glTF, can share it.

use std::fs::File;
use std::io::{self, Read, Seek, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// A readable, seekable handle to one entry in an [`IoSystem`].
pub trait Stream: Read + Seek + Send {}
impl<T: Read + Seek + Send> Stream for T {}

/// How a path should be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    Write,
}

/// Abstracts over where importer/exporter input and output actually lives.
/// A host can supply an in-memory, network-backed, or archive-backed
/// implementation; [`FsIoSystem`] is the only concrete implementation this
/// crate provides itself.
pub trait IoSystem: Send + Sync {
    fn open_read(&self, path: &Path) -> Result<Box<dyn Stream>>;

    fn open_write(&self, path: &Path) -> Result<Box<dyn Write>>;

    fn exists(&self, path: &Path) -> bool;

    /// Reads an entire file into memory. Default implementation built on
    /// `open_read`; codecs needing whole-document XML or whole-archive ZIP
    /// access call this rather than streaming.
    fn read_to_vec(&self, path: &Path) -> Result<Vec<u8>> {
        let mut stream = self.open_read(path)?;
        let mut buf = Vec::new();
        stream
            .read_to_end(&mut buf)
            .map_err(|source| Error::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(buf)
    }
}

/// The default [`IoSystem`], backed directly by `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct FsIoSystem {
    root: PathBuf,
}

impl FsIoSystem {
    /// Resolves relative paths (as used for glTF external buffers/images and
    /// 3MF-embedded textures) against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsIoSystem { root: root.into() }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl IoSystem for FsIoSystem {
    fn open_read(&self, path: &Path) -> Result<Box<dyn Stream>> {
        let resolved = self.resolve(path);
        File::open(&resolved)
            .map(|f| Box::new(f) as Box<dyn Stream>)
            .map_err(|source| Error::Io {
                path: resolved,
                source,
            })
    }

    fn open_write(&self, path: &Path) -> Result<Box<dyn Write>> {
        let resolved = self.resolve(path);
        File::create(&resolved)
            .map(|f| Box::new(f) as Box<dyn Write>)
            .map_err(|source| Error::Io {
                path: resolved,
                source,
            })
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).exists()
    }
}

/// An in-memory [`IoSystem`] used by tests and by hosts embedding archives
/// without touching disk (e.g. a single glTF + GLB pair already in memory).
#[derive(Debug, Clone, Default)]
pub struct MemoryIoSystem {
    files: std::collections::HashMap<PathBuf, Vec<u8>>,
}

impl MemoryIoSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, data: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), data.into());
    }
}

impl IoSystem for MemoryIoSystem {
    fn open_read(&self, path: &Path) -> Result<Box<dyn Stream>> {
        let data = self.files.get(path).cloned().ok_or_else(|| Error::Io {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotFound, "not found in MemoryIoSystem"),
        })?;
        Ok(Box::new(io::Cursor::new(data)))
    }

    fn open_write(&self, path: &Path) -> Result<Box<dyn Write>> {
        Err(Error::Io {
            path: path.to_path_buf(),
            source: io::Error::new(
                io::ErrorKind::Unsupported,
                "MemoryIoSystem is read-only",
            ),
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }
}
