use crate::content::hash_reader;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;
use vendiff_common::{ContentHash, VendiffError};
use zip::ZipArchive;

/// Upper bound on the buffer reserved up front when reading an entry
const MAX_PREALLOCATION: u64 = 1 << 20;

/// A regular file inside the reference archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFile {
    /// Position in the archive's central directory
    pub index: usize,
    /// Full entry name as stored in the archive
    pub name: String,
    /// Entry name with the root prefix removed
    pub relative_path: String,
}

/// Read-only view over the pristine reference ZIP.
///
/// The underlying file handle is closed when this value is dropped, on every
/// exit path.
pub struct ReferenceArchive {
    path: PathBuf,
    archive: ZipArchive<File>,
}

impl ReferenceArchive {
    pub fn open(path: &Path) -> Result<Self, VendiffError> {
        let file = File::open(path).map_err(|e| VendiffError::archive(path, e))?;
        let archive = ZipArchive::new(file).map_err(|e| VendiffError::archive(path, e))?;

        debug!("Opened reference archive {:?} with {} entries", path, archive.len());
        Ok(Self {
            path: path.to_path_buf(),
            archive,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }

    /// Regular files whose names start with `prefix`, in archive order.
    /// Directory entries and the prefix itself are skipped.
    pub fn files_under(&mut self, prefix: &str) -> Result<Vec<ArchiveFile>, VendiffError> {
        let mut files = Vec::new();

        for index in 0..self.archive.len() {
            let entry = self
                .archive
                .by_index(index)
                .map_err(|e| VendiffError::archive(&self.path, e))?;

            if entry.is_dir() {
                continue;
            }

            let name = entry.name().to_string();
            let relative_path = match name.strip_prefix(prefix) {
                Some(rest) if !rest.is_empty() => rest.to_string(),
                _ => continue,
            };

            files.push(ArchiveFile {
                index,
                name,
                relative_path,
            });
        }

        Ok(files)
    }

    /// Full decompressed content of an entry
    pub fn read(&mut self, index: usize) -> Result<Vec<u8>, VendiffError> {
        let mut entry = self
            .archive
            .by_index(index)
            .map_err(|e| VendiffError::archive(&self.path, e))?;

        // Declared sizes come from the archive header and are not trusted
        let capacity = entry.size().min(MAX_PREALLOCATION) as usize;
        let mut content = Vec::with_capacity(capacity);
        entry
            .read_to_end(&mut content)
            .map_err(|e| VendiffError::archive(&self.path, format!("{}: {}", entry.name(), e)))?;
        Ok(content)
    }

    /// Content digest of an entry, streamed without buffering the whole file
    pub fn hash(&mut self, index: usize) -> Result<ContentHash, VendiffError> {
        let mut entry = self
            .archive
            .by_index(index)
            .map_err(|e| VendiffError::archive(&self.path, e))?;

        let name = entry.name().to_string();
        hash_reader(&mut entry)
            .map_err(|e| VendiffError::archive(&self.path, format!("{}: {}", name, e)))
    }
}
