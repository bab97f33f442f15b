use ignore::gitignore::{Gitignore, GitignoreBuilder};
use jwalk::{Parallelism, WalkDir};
use std::fs;
use std::path::Path;
use tracing::debug;
use vendiff_common::DEFAULT_IGNORE_FILE_NAME;

/// Rules from a single ignore file, scoped to the directory it was found in
pub struct IgnoreEntry {
    /// Directory of the ignore file relative to the tree root ("" for the root)
    base_dir: String,
    matcher: Gitignore,
}

impl IgnoreEntry {
    /// Compile gitignore-style lines; invalid lines are skipped
    pub fn from_lines<'a>(
        base_dir: impl Into<String>,
        lines: impl IntoIterator<Item = &'a str>,
    ) -> Option<Self> {
        let base_dir = base_dir.into();
        let mut builder = GitignoreBuilder::new("");
        for line in lines {
            if let Err(err) = builder.add_line(None, line) {
                debug!("Skipping ignore pattern '{}' in '{}': {}", line, base_dir, err);
            }
        }

        match builder.build() {
            Ok(matcher) => Some(Self { base_dir, matcher }),
            Err(e) => {
                debug!("Failed to build ignore rules for '{}': {}", base_dir, e);
                None
            }
        }
    }

    pub fn base_dir(&self) -> &str {
        &self.base_dir
    }

    /// Path relative to this entry's base directory, if the entry applies to it
    fn scoped<'p>(&self, relative_path: &'p str) -> Option<&'p str> {
        if self.base_dir.is_empty() {
            return Some(relative_path);
        }
        relative_path
            .strip_prefix(self.base_dir.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
    }
}

/// Hierarchical ignore rules collected from every ignore file in a tree
#[derive(Default)]
pub struct IgnoreRules {
    entries: Vec<IgnoreEntry>,
}

impl IgnoreRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every `.gitignore` below `root`
    pub fn build(root: &Path) -> Self {
        Self::build_with(root, DEFAULT_IGNORE_FILE_NAME, &[])
    }

    /// Collect every ignore file named `ignore_file_name` below `root`, plus
    /// `extra_patterns` applied at the root. Unreadable ignore files contribute
    /// no rules.
    pub fn build_with(root: &Path, ignore_file_name: &str, extra_patterns: &[String]) -> Self {
        let mut rules = Self::new();

        if !extra_patterns.is_empty() {
            if let Some(entry) =
                IgnoreEntry::from_lines("", extra_patterns.iter().map(String::as_str))
            {
                rules.push(entry);
            }
        }

        let walker = WalkDir::new(root)
            .parallelism(Parallelism::Serial)
            .skip_hidden(false)
            .sort(true);

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry while collecting ignore files: {}", e);
                    continue;
                }
            };

            if entry.file_type().is_dir() || entry.file_name() != ignore_file_name {
                continue;
            }

            let path = entry.path();
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    debug!("Failed to read ignore file {:?}: {}", path, e);
                    continue;
                }
            };

            let base_dir = path
                .parent()
                .and_then(|dir| dir.strip_prefix(root).ok())
                .map(to_slash)
                .unwrap_or_default();

            if let Some(ignore_entry) = IgnoreEntry::from_lines(base_dir, content.lines()) {
                debug!("Added ignore rules from {:?}", path);
                rules.push(ignore_entry);
            }
        }

        debug!("Found {} ignore rule sets in {:?}", rules.len(), root);
        rules
    }

    pub fn push(&mut self, entry: IgnoreEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check a forward-slash relative path and every one of its ancestor
    /// directories. Ancestors are always tested as directories; the path itself
    /// uses `is_dir`.
    pub fn is_ignored(&self, relative_path: &str, is_dir: bool) -> bool {
        if self.entries.is_empty() || relative_path.is_empty() {
            return false;
        }

        let relative_path = relative_path.trim_end_matches('/');
        let mut boundaries: Vec<usize> = relative_path
            .match_indices('/')
            .map(|(index, _)| index)
            .collect();
        boundaries.push(relative_path.len());

        let last = boundaries.len() - 1;
        boundaries.iter().enumerate().any(|(i, &end)| {
            let partial = &relative_path[..end];
            let check_as_dir = i != last || is_dir;
            !partial.is_empty() && self.is_path_ignored(partial, check_as_dir)
        })
    }

    fn is_path_ignored(&self, relative_path: &str, is_dir: bool) -> bool {
        self.entries.iter().any(|entry| {
            entry
                .scoped(relative_path)
                .map_or(false, |scoped| entry.matcher.matched(scoped, is_dir).is_ignore())
        })
    }
}

/// Join path components with forward slashes
pub(crate) fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
