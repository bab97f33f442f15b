use serde::{Deserialize, Serialize};
use std::fmt;

/// How a path differs between the local tree and the reference archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModificationType {
    /// Present only in the local tree
    Added,
    /// Present on both sides with different content
    Modified,
    /// Present only in the reference archive
    Deleted,
}

impl ModificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModificationType::Added => "added",
            ModificationType::Modified => "modified",
            ModificationType::Deleted => "deleted",
        }
    }
}

impl fmt::Display for ModificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single file that differs from the reference release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifiedFile {
    /// Forward-slash path relative to the compared root
    pub relative_path: String,
    pub mod_type: ModificationType,
    /// Binary files are listed but never represented in the patch
    pub is_binary: bool,
}

/// Patch text produced for one changed file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchFragment {
    pub relative_path: String,
    pub text: String,
}

/// Output of a modification check: the change list plus the combined patch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModificationReport {
    pub modifications: Vec<ModifiedFile>,
    /// Fragments in discovery order; empty fragments are not stored
    pub fragments: Vec<PatchFragment>,
}

impl ModificationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.modifications.is_empty()
    }

    /// Number of modifications of the given kind
    pub fn count(&self, mod_type: ModificationType) -> usize {
        self.modifications
            .iter()
            .filter(|m| m.mod_type == mod_type)
            .count()
    }

    /// Number of modifications that could not be captured in the patch
    pub fn binary_count(&self) -> usize {
        self.modifications.iter().filter(|m| m.is_binary).count()
    }

    /// The full git-compatible patch document
    pub fn patch_content(&self) -> String {
        self.fragments.iter().map(|f| f.text.as_str()).collect()
    }

    /// Record a modification together with its (possibly empty) patch text
    pub fn record(
        &mut self,
        relative_path: impl Into<String>,
        mod_type: ModificationType,
        is_binary: bool,
        fragment: String,
    ) {
        let relative_path = relative_path.into();
        if !fragment.is_empty() {
            self.fragments.push(PatchFragment {
                relative_path: relative_path.clone(),
                text: fragment,
            });
        }
        self.modifications.push(ModifiedFile {
            relative_path,
            mod_type,
            is_binary,
        });
    }
}

/// BLAKE3 content digest (32 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<blake3::Hash> for ContentHash {
    fn from(hash: blake3::Hash) -> Self {
        Self(*hash.as_bytes())
    }
}

pub const DEFAULT_ARCHIVE_ROOT_PREFIX: &str = "MetaplaySDK/";
pub const DEFAULT_IGNORE_FILE_NAME: &str = ".gitignore";
pub const DEFAULT_CONTEXT_LINES: usize = 3;
pub const DEFAULT_MAX_LISTED: usize = 20;
pub const DEFAULT_PATCH_FILE_NAME: &str = "metaplay-sdk-modifications.patch";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Only archive entries under this prefix are compared (e.g. "MetaplaySDK/")
    pub archive_root_prefix: String,

    /// Name of the gitignore-style files collected from the local tree
    pub ignore_file_name: String,

    /// Unchanged lines kept around each hunk
    pub context_lines: usize,

    /// Maximum number of modifications listed in the summary
    pub max_listed: usize,

    /// File name used when the patch is written into a directory
    pub patch_file_name: String,

    /// Extra ignore patterns (e.g. "*.log", "Generated/") applied at the tree root
    pub extra_ignore_patterns: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            archive_root_prefix: DEFAULT_ARCHIVE_ROOT_PREFIX.to_string(),
            ignore_file_name: DEFAULT_IGNORE_FILE_NAME.to_string(),
            context_lines: DEFAULT_CONTEXT_LINES,
            max_listed: DEFAULT_MAX_LISTED,
            patch_file_name: DEFAULT_PATCH_FILE_NAME.to_string(),
            extra_ignore_patterns: Vec::new(),
        }
    }
}
