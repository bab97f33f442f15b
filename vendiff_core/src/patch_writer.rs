use crate::content::is_binary;
use crate::hunks::build_hunks;
use crate::line_diff::diff_lines;
use vendiff_common::{Hunk, DEFAULT_CONTEXT_LINES};

/// Which side of a file pair is missing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchMode {
    /// Both sides exist
    Modified,
    /// Old side is `/dev/null`
    NewFile,
    /// New side is `/dev/null`
    DeletedFile,
}

/// Renders git-compatible unified diffs for single files.
///
/// Output per file: `diff --git` header, optional `new file mode` /
/// `deleted file mode` line, `---`/`+++` lines (using `/dev/null` for the
/// missing side), then every hunk. Binary content produces no output at all.
#[derive(Debug, Clone, Copy)]
pub struct PatchWriter {
    context_lines: usize,
}

impl PatchWriter {
    pub fn new(context_lines: usize) -> Self {
        Self { context_lines }
    }

    pub fn context_lines(&self) -> usize {
        self.context_lines
    }

    /// Diff `old` against `new` and render the file's patch fragment
    pub fn file_patch(&self, path_in_patch: &str, old: &[u8], new: &[u8], mode: PatchMode) -> String {
        if is_binary(old) || is_binary(new) {
            return String::new();
        }

        let old_text = String::from_utf8_lossy(old);
        let new_text = String::from_utf8_lossy(new);
        let ops = diff_lines(&old_text, &new_text);
        let hunks = build_hunks(&ops, self.context_lines);

        let mut output = Self::file_header(path_in_patch, mode);
        for hunk in &hunks {
            output.push_str(&Self::serialize_hunk(hunk));
        }
        output
    }

    fn file_header(path: &str, mode: PatchMode) -> String {
        let mut output = format!("diff --git a/{path} b/{path}\n");

        match mode {
            PatchMode::NewFile => output.push_str("new file mode 100644\n"),
            PatchMode::DeletedFile => output.push_str("deleted file mode 100644\n"),
            PatchMode::Modified => {}
        }

        if mode == PatchMode::NewFile {
            output.push_str("--- /dev/null\n");
        } else {
            output.push_str(&format!("--- a/{path}\n"));
        }

        if mode == PatchMode::DeletedFile {
            output.push_str("+++ /dev/null\n");
        } else {
            output.push_str(&format!("+++ b/{path}\n"));
        }

        output
    }

    /// Render one hunk: header line plus prefixed body lines
    pub fn serialize_hunk(hunk: &Hunk) -> String {
        let mut output = hunk.header();
        output.push('\n');
        for line in &hunk.lines {
            output.push(line.prefix());
            output.push_str(&line.text);
            output.push('\n');
        }
        output
    }
}

impl Default for PatchWriter {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_LINES)
    }
}

/// Flag-style entry point: `is_new` takes precedence over `is_deleted`
pub fn format_file_patch(
    path_in_patch: &str,
    old: &[u8],
    new: &[u8],
    is_new: bool,
    is_deleted: bool,
) -> String {
    let mode = if is_new {
        PatchMode::NewFile
    } else if is_deleted {
        PatchMode::DeletedFile
    } else {
        PatchMode::Modified
    };
    PatchWriter::default().file_patch(path_in_patch, old, new, mode)
}
