pub mod archive;
pub mod content;
pub mod detector;
pub mod hunks;
pub mod ignore_rules;
pub mod line_diff;
pub mod patch_writer;

pub use archive::{ArchiveFile, ReferenceArchive};
pub use content::{hash_bytes, hash_file, is_binary, is_os_junk};
pub use detector::{detect_modifications, ModificationDetector};
pub use hunks::{build_default_hunks, build_hunks};
pub use ignore_rules::{IgnoreEntry, IgnoreRules};
pub use line_diff::{diff_lines, split_lines};
pub use patch_writer::{format_file_patch, PatchMode, PatchWriter};
