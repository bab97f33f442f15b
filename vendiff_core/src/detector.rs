use crate::archive::ReferenceArchive;
use crate::content::{file_name, hash_bytes, is_binary, is_os_junk};
use crate::ignore_rules::{to_slash, IgnoreRules};
use crate::patch_writer::{PatchMode, PatchWriter};
use jwalk::{Parallelism, WalkDir};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info};
use vendiff_common::{AppConfig, ContentHash, ModificationReport, ModificationType, VendiffError};

/// A reference archive file kept for lookup during the local walk
struct ReferenceEntry {
    relative_path: String,
    index: usize,
    hash: ContentHash,
    seen: bool,
}

/// Checksummed view of the reference archive, keyed by relative path
struct ReferenceIndex {
    entries: Vec<ReferenceEntry>,
    by_path: HashMap<String, usize>,
}

impl ReferenceIndex {
    /// Add an entry; a later archive entry with the same path replaces the earlier one
    fn insert(&mut self, entry: ReferenceEntry) {
        match self.by_path.get(&entry.relative_path) {
            Some(&slot) => self.entries[slot] = entry,
            None => {
                self.by_path
                    .insert(entry.relative_path.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    fn get_mut(&mut self, relative_path: &str) -> Option<&mut ReferenceEntry> {
        let slot = *self.by_path.get(relative_path)?;
        self.entries.get_mut(slot)
    }
}

/// Compares a local vendored tree against its pristine reference archive
pub struct ModificationDetector {
    config: AppConfig,
    writer: PatchWriter,
}

impl ModificationDetector {
    pub fn new(config: AppConfig) -> Self {
        let writer = PatchWriter::new(config.context_lines);
        Self { config, writer }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Report every added, modified and deleted file under `local_root`
    /// relative to the entries of `archive_path` below the configured prefix,
    /// together with the combined patch for all text changes.
    ///
    /// Any unreadable local file or archive entry aborts the whole check.
    pub fn detect(
        &self,
        local_root: &Path,
        archive_path: &Path,
    ) -> Result<ModificationReport, VendiffError> {
        info!("Checking {:?} against {:?}", local_root, archive_path);

        let metadata =
            fs::metadata(local_root).map_err(|e| VendiffError::local_read(local_root, e))?;
        if !metadata.is_dir() {
            return Err(VendiffError::Path(format!(
                "{} is not a directory",
                local_root.display()
            )));
        }

        let rules = IgnoreRules::build_with(
            local_root,
            &self.config.ignore_file_name,
            &self.config.extra_ignore_patterns,
        );

        let mut archive = ReferenceArchive::open(archive_path)?;
        let mut index = self.index_reference(&mut archive, &rules)?;

        let mut report = ModificationReport::new();
        self.compare_local_tree(local_root, &rules, &mut archive, &mut index, &mut report)?;
        self.record_deleted(&mut archive, &index, &mut report)?;

        info!(
            "Found {} modification(s): {} added, {} modified, {} deleted",
            report.modifications.len(),
            report.count(ModificationType::Added),
            report.count(ModificationType::Modified),
            report.count(ModificationType::Deleted)
        );
        Ok(report)
    }

    fn index_reference(
        &self,
        archive: &mut ReferenceArchive,
        rules: &IgnoreRules,
    ) -> Result<ReferenceIndex, VendiffError> {
        let files = archive.files_under(&self.config.archive_root_prefix)?;
        let mut index = ReferenceIndex {
            entries: Vec::with_capacity(files.len()),
            by_path: HashMap::with_capacity(files.len()),
        };

        for file in files {
            if is_os_junk(file_name(&file.relative_path))
                || rules.is_ignored(&file.relative_path, false)
            {
                debug!("Skipping reference entry {}", file.name);
                continue;
            }

            let hash = archive.hash(file.index)?;
            index.insert(ReferenceEntry {
                relative_path: file.relative_path,
                index: file.index,
                hash,
                seen: false,
            });
        }

        debug!(
            "Indexed {} reference file(s) under '{}'",
            index.entries.len(),
            self.config.archive_root_prefix
        );
        Ok(index)
    }

    fn compare_local_tree(
        &self,
        local_root: &Path,
        rules: &IgnoreRules,
        archive: &mut ReferenceArchive,
        index: &mut ReferenceIndex,
        report: &mut ModificationReport,
    ) -> Result<(), VendiffError> {
        let walker = WalkDir::new(local_root)
            .parallelism(Parallelism::Serial)
            .skip_hidden(false)
            .sort(true);

        for entry in walker {
            let entry = entry.map_err(|e| {
                VendiffError::local_read(
                    local_root,
                    io::Error::new(io::ErrorKind::Other, format!("Walk error: {}", e)),
                )
            })?;

            if entry.file_type().is_dir() {
                continue;
            }

            let path = entry.path();
            let relative_path = match path.strip_prefix(local_root) {
                Ok(rel) => to_slash(rel),
                Err(_) => continue,
            };

            if is_os_junk(file_name(&relative_path)) || rules.is_ignored(&relative_path, false) {
                debug!("Skipping local file {}", relative_path);
                continue;
            }

            let local = fs::read(&path).map_err(|e| VendiffError::local_read(&path, e))?;
            let patch_path = self.patch_path(&relative_path);

            let reference = match index.get_mut(&relative_path) {
                Some(reference) => {
                    reference.seen = true;
                    reference
                }
                None => {
                    let binary = is_binary(&local);
                    let fragment = if binary {
                        String::new()
                    } else {
                        self.writer.file_patch(&patch_path, b"", &local, PatchMode::NewFile)
                    };
                    debug!("Added: {}", relative_path);
                    report.record(relative_path, ModificationType::Added, binary, fragment);
                    continue;
                }
            };

            if reference.hash == hash_bytes(&local) {
                continue;
            }

            let original = archive.read(reference.index)?;
            let binary = is_binary(&local) || is_binary(&original);
            let fragment = if binary {
                String::new()
            } else {
                self.writer
                    .file_patch(&patch_path, &original, &local, PatchMode::Modified)
            };
            debug!("Modified: {}", relative_path);
            report.record(relative_path, ModificationType::Modified, binary, fragment);
        }

        Ok(())
    }

    fn record_deleted(
        &self,
        archive: &mut ReferenceArchive,
        index: &ReferenceIndex,
        report: &mut ModificationReport,
    ) -> Result<(), VendiffError> {
        for reference in index.entries.iter().filter(|entry| !entry.seen) {
            let original = archive.read(reference.index)?;
            let binary = is_binary(&original);
            let fragment = if binary {
                String::new()
            } else {
                let patch_path = self.patch_path(&reference.relative_path);
                self.writer
                    .file_patch(&patch_path, &original, b"", PatchMode::DeletedFile)
            };
            debug!("Deleted: {}", reference.relative_path);
            report.record(
                reference.relative_path.clone(),
                ModificationType::Deleted,
                binary,
                fragment,
            );
        }
        Ok(())
    }

    /// Location of a file inside the patch, rooted at the archive prefix
    fn patch_path(&self, relative_path: &str) -> String {
        format!("{}{}", self.config.archive_root_prefix, relative_path)
    }
}

impl Default for ModificationDetector {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

/// Run a check with the default configuration
pub fn detect_modifications(
    local_root: &Path,
    archive_path: &Path,
) -> Result<ModificationReport, VendiffError> {
    ModificationDetector::default().detect(local_root, archive_path)
}
