use std::fs::File;
use std::io::Read;
use std::path::Path;
use vendiff_common::{ContentHash, VendiffError};

/// Number of leading bytes inspected when classifying content as binary
pub const BINARY_SNIFF_LEN: usize = 8192;

/// OS-generated files that are never part of a vendored tree
const OS_JUNK_NAMES: &[&str] = &[".DS_Store", "Thumbs.db", "desktop.ini", "._.DS_Store"];

/// macOS resource fork shadow files
const OS_JUNK_PREFIXES: &[&str] = &["._"];

/// Hash a complete in-memory buffer
pub fn hash_bytes(data: &[u8]) -> ContentHash {
    blake3::hash(data).into()
}

/// Hash everything a reader yields, 64KB at a time
pub fn hash_reader<R: Read>(mut reader: R) -> std::io::Result<ContentHash> {
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0; 64 * 1024]; // 64KB buffer

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hasher.finalize().into())
}

/// Hash a file on disk without loading it into memory
pub fn hash_file(path: &Path) -> Result<ContentHash, VendiffError> {
    let file = File::open(path).map_err(|e| VendiffError::local_read(path, e))?;
    hash_reader(file).map_err(|e| VendiffError::local_read(path, e))
}

/// Heuristic binary check: a NUL byte anywhere in the first 8KB
pub fn is_binary(data: &[u8]) -> bool {
    let sniff = data.len().min(BINARY_SNIFF_LEN);
    data[..sniff].contains(&0)
}

/// Whether a file name belongs to OS metadata that is always skipped
pub fn is_os_junk(file_name: &str) -> bool {
    OS_JUNK_NAMES.contains(&file_name)
        || OS_JUNK_PREFIXES
            .iter()
            .any(|prefix| file_name.starts_with(prefix))
}

/// Final component of a forward-slash relative path
pub fn file_name(relative_path: &str) -> &str {
    relative_path.rsplit('/').next().unwrap_or(relative_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_hash_bytes_matches_file_hash() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data.txt");
        fs::write(&path, b"hello vendored world\n").unwrap();

        let from_file = hash_file(&path).unwrap();
        let from_bytes = hash_bytes(b"hello vendored world\n");
        assert_eq!(from_file, from_bytes);
        assert_ne!(from_bytes, hash_bytes(b"hello vendored world"));
    }

    #[test]
    fn test_hash_file_missing_is_local_read_error() {
        let temp = TempDir::new().unwrap();
        let err = hash_file(&temp.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, VendiffError::LocalRead { .. }));
    }

    #[test]
    fn test_hash_reader_large_input() {
        let data = vec![7u8; 200 * 1024];
        let hash = hash_reader(std::io::Cursor::new(&data)).unwrap();
        assert_eq!(hash, hash_bytes(&data));
    }

    #[test]
    fn test_is_binary() {
        assert!(!is_binary(b""));
        assert!(!is_binary(b"plain text\nwith lines\n"));
        assert!(is_binary(&[0x00, 0x01, 0x02]));
        assert!(is_binary(b"text then \0 nul"));
    }

    #[test]
    fn test_is_binary_only_inspects_prefix() {
        let mut data = vec![b'a'; BINARY_SNIFF_LEN];
        data.push(0);
        assert!(!is_binary(&data));

        data[BINARY_SNIFF_LEN - 1] = 0;
        assert!(is_binary(&data));
    }

    #[test]
    fn test_os_junk_names() {
        assert!(is_os_junk(".DS_Store"));
        assert!(is_os_junk("Thumbs.db"));
        assert!(is_os_junk("desktop.ini"));
        assert!(is_os_junk("._.DS_Store"));
        assert!(is_os_junk("._Program.cs"));
        assert!(!is_os_junk("Program.cs"));
        assert!(!is_os_junk(".gitignore"));
        assert!(!is_os_junk("thumbs.db.bak"));
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("a/b/c.txt"), "c.txt");
        assert_eq!(file_name("c.txt"), "c.txt");
        assert_eq!(file_name("dir/._hidden"), "._hidden");
    }
}
