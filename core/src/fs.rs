//! File helpers for experiment outputs.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

/// How [`safe_open`] opens the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    /// Read only; the file must exist.
    #[default]
    Read,
    /// Create or truncate, then write.
    Write,
    /// Create if missing, then append.
    Append,
    /// Read and write; creates the file if missing, never truncates.
    ReadWrite,
}

impl OpenMode {
    fn options(self) -> OpenOptions {
        let mut options = OpenOptions::new();
        match self {
            OpenMode::Read => options.read(true),
            OpenMode::Write => options.write(true).create(true).truncate(true),
            OpenMode::Append => options.append(true).create(true),
            OpenMode::ReadWrite => options.read(true).write(true).create(true).truncate(false),
        };
        options
    }
}

/// Creates every missing parent directory of `path`, then opens it.
///
/// Existing directories are left untouched.
///
/// # Errors
///
/// Returns the underlying I/O error if a directory cannot be created or the
/// file cannot be opened.
///
/// # Examples
///
/// ```no_run
/// use std::io::Write;
/// use argclass_core::{OpenMode, safe_open};
///
/// let mut file = safe_open("runs/2024-01-01/bert/config.json", OpenMode::Write).unwrap();
/// file.write_all(b"{}").unwrap();
/// ```
pub fn safe_open(path: impl AsRef<Path>, mode: OpenMode) -> io::Result<File> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    mode.options().open(path)
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};

    use super::*;

    #[test]
    fn test_creates_missing_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/c/out.txt");

        let mut file = safe_open(&path, OpenMode::Write).unwrap();
        file.write_all(b"hello").unwrap();
        drop(file);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");
    }

    #[test]
    fn test_existing_parents_are_fine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");

        safe_open(&path, OpenMode::Append)
            .unwrap()
            .write_all(b"one\n")
            .unwrap();
        safe_open(&path, OpenMode::Append)
            .unwrap()
            .write_all(b"two\n")
            .unwrap();

        let mut text = String::new();
        safe_open(&path, OpenMode::Read)
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "one\ntwo\n");
    }

    #[test]
    fn test_write_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x/out.txt");
        safe_open(&path, OpenMode::Write)
            .unwrap()
            .write_all(b"longer content")
            .unwrap();
        safe_open(&path, OpenMode::Write)
            .unwrap()
            .write_all(b"short")
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "short");
    }

    #[test]
    fn test_read_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = safe_open(dir.path().join("nested/missing.txt"), OpenMode::Read).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        // Parents are still created.
        assert!(dir.path().join("nested").is_dir());
    }
}
