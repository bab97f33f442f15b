use serde::{Deserialize, Serialize};

/// Kind of a single line in a line-level edit script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineTag {
    Equal,
    Delete,
    Insert,
}

impl LineTag {
    /// Unified diff prefix character for this line kind
    pub fn prefix(&self) -> char {
        match self {
            LineTag::Equal => ' ',
            LineTag::Delete => '-',
            LineTag::Insert => '+',
        }
    }

    /// Whether the line exists in the old file
    pub fn on_old_side(&self) -> bool {
        matches!(self, LineTag::Equal | LineTag::Delete)
    }

    /// Whether the line exists in the new file
    pub fn on_new_side(&self) -> bool {
        matches!(self, LineTag::Equal | LineTag::Insert)
    }
}

/// One line of an edit script, without its line terminator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineOperation {
    pub tag: LineTag,
    pub text: String,
}

impl LineOperation {
    pub fn new(tag: LineTag, text: impl Into<String>) -> Self {
        Self {
            tag,
            text: text.into(),
        }
    }

    pub fn equal(text: impl Into<String>) -> Self {
        Self::new(LineTag::Equal, text)
    }

    pub fn delete(text: impl Into<String>) -> Self {
        Self::new(LineTag::Delete, text)
    }

    pub fn insert(text: impl Into<String>) -> Self {
        Self::new(LineTag::Insert, text)
    }

    pub fn is_change(&self) -> bool {
        self.tag != LineTag::Equal
    }
}

/// A line kept in a hunk, already stripped of any trailing CR
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HunkLine {
    pub tag: LineTag,
    pub text: String,
}

impl HunkLine {
    pub fn prefix(&self) -> char {
        self.tag.prefix()
    }
}

/// A context-padded change region of one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunk {
    /// Starting line number in the old file (1-based, 0 when `old_count` is 0)
    pub old_start: usize,
    /// Number of old-side lines in this hunk
    pub old_count: usize,
    /// Starting line number in the new file (1-based, 0 when `new_count` is 0)
    pub new_start: usize,
    /// Number of new-side lines in this hunk
    pub new_count: usize,
    pub lines: Vec<HunkLine>,
}

impl Hunk {
    /// The `@@ -o,c +o,c @@` header line, without newline
    pub fn header(&self) -> String {
        format!(
            "@@ -{},{} +{},{} @@",
            self.old_start, self.old_count, self.new_start, self.new_count
        )
    }
}
