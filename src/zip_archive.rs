//! C4: ZIP archive reading, shared by the OPC package reader (3MF) and
//! usable standalone by any future zip-packaged format. Thin wrapper over
//! the `zip` crate exposing only what C5 needs: a file listing and
//! whole-entry reads by name.

use std::io::{Cursor, Read};

use crate::error::{Error, Result};

pub struct ZipArchive {
    inner: zip::ZipArchive<Cursor<Vec<u8>>>,
}

impl ZipArchive {
    pub fn open(bytes: Vec<u8>) -> Result<Self> {
        let inner = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| Error::malformed(format!("not a valid zip archive: {e}")))?;
        Ok(ZipArchive { inner })
    }

    /// Every entry name in the archive, in central-directory order (not
    /// sorted — 3MF's relationship-driven discovery depends on being able
    /// to recognise specific well-known names regardless of position, but
    /// preserves original order for anything that does care, such as glTF
    /// buffers referenced relative to one another).
    pub fn file_names(&self) -> Vec<String> {
        self.inner.file_names().map(|s| s.to_owned()).collect()
    }

    pub fn exists(&mut self, name: &str) -> bool {
        self.inner.by_name(name).is_ok()
    }

    pub fn read(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut entry = self
            .inner
            .by_name(name)
            .map_err(|e| Error::malformed(format!("zip entry '{name}' not found: {e}")))?;
        let mut buf = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut buf)
            .map_err(|e| Error::malformed(format!("failed reading zip entry '{name}': {e}")))?;
        Ok(buf)
    }

    pub fn read_string(&mut self, name: &str) -> Result<String> {
        let bytes = self.read(name)?;
        String::from_utf8(bytes)
            .map_err(|e| Error::malformed(format!("zip entry '{name}' is not valid utf-8: {e}")))
    }
}
