//! Reads the username list and classifies why it could not be opened.

use std::io::{self, ErrorKind};
use std::path::Path;
use thiserror::Error;
use tokio::fs;

#[cfg(target_os = "linux")]
const ENAMETOOLONG: i32 = 36;
#[cfg(target_os = "windows")]
const ENAMETOOLONG: i32 = 206;
#[cfg(not(any(target_os = "linux", target_os = "windows")))]
const ENAMETOOLONG: i32 = 63;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("<file> is a zero-length string, contains only white space, or contains one or more invalid characters")]
    InvalidPath(#[source] Option<io::Error>),

    #[error("<file>'s path exceed the system-defined maximum length.")]
    PathTooLong(#[source] io::Error),

    #[error("The specified path is invalid (for example, it is on an unmapped drive).")]
    DirectoryNotFound(#[source] io::Error),

    #[error("<file> is a directory or the caller does not have the required permission")]
    Unauthorized(#[source] io::Error),

    #[error("<file> was not found")]
    FileNotFound(#[source] io::Error),

    #[error("An I/O error occurred while opening the file.")]
    Io(#[source] io::Error),
}

impl LoadError {
    /// Process exit status: the OS error number when there is one, otherwise 1.
    pub fn exit_code(&self) -> i32 {
        let source = match self {
            LoadError::InvalidPath(source) => source.as_ref(),
            LoadError::PathTooLong(e)
            | LoadError::DirectoryNotFound(e)
            | LoadError::Unauthorized(e)
            | LoadError::FileNotFound(e)
            | LoadError::Io(e) => Some(e),
        };

        source
            .and_then(io::Error::raw_os_error)
            .filter(|code| *code != 0)
            .unwrap_or(1)
    }
}

/// Returns every line of the file in order. An empty file yields an empty list.
/// Bytes that are not UTF-8 are replaced, never rejected.
pub async fn load_usernames(path: &Path) -> Result<Vec<String>, LoadError> {
    let lossy = path.to_string_lossy();
    if lossy.trim().is_empty() || lossy.contains('\0') {
        return Err(LoadError::InvalidPath(None));
    }

    let bytes = fs::read(path).await.map_err(|err| classify(path, err))?;

    Ok(String::from_utf8_lossy(&bytes)
        .lines()
        .map(str::to_string)
        .collect())
}

fn classify(path: &Path, err: io::Error) -> LoadError {
    if err.raw_os_error() == Some(ENAMETOOLONG) {
        return LoadError::PathTooLong(err);
    }

    match err.kind() {
        ErrorKind::NotFound => {
            let parent_exists = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.is_dir(),
                _ => true,
            };
            if parent_exists {
                LoadError::FileNotFound(err)
            } else {
                LoadError::DirectoryNotFound(err)
            }
        }
        ErrorKind::PermissionDenied => LoadError::Unauthorized(err),
        ErrorKind::InvalidInput => LoadError::InvalidPath(Some(err)),
        _ if path.is_dir() => LoadError::Unauthorized(err),
        _ => LoadError::Io(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("fetch_profiles_usernames_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn scratch_file(name: &str, content: &[u8]) -> PathBuf {
        let path = scratch_dir().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_lines_in_file_order() {
        let path = scratch_file("two.txt", b"alice\nbob\n");
        assert_eq!(load_usernames(&path).await.unwrap(), vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn test_crlf_and_blank_lines_are_kept() {
        let path = scratch_file("crlf.txt", b"alice\r\n\r\nbob");
        assert_eq!(load_usernames(&path).await.unwrap(), vec!["alice", "", "bob"]);
    }

    #[tokio::test]
    async fn test_latin1_file_is_read_not_rejected() {
        let path = scratch_file("latin1.txt", b"jos\xe9\nbob\n");
        let usernames = load_usernames(&path).await.unwrap();
        assert_eq!(usernames, vec!["jos\u{FFFD}", "bob"]);
    }

    #[tokio::test]
    async fn test_empty_file_yields_no_usernames() {
        let path = scratch_file("empty.txt", b"");
        assert!(load_usernames(&path).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_path_is_invalid() {
        let err = load_usernames(Path::new("   ")).await.unwrap_err();
        assert!(matches!(err, LoadError::InvalidPath(None)));
        assert_eq!(err.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let path = scratch_dir().join("does-not-exist.txt");
        let err = load_usernames(&path).await.unwrap_err();
        assert!(matches!(err, LoadError::FileNotFound(_)));
        assert_eq!(err.to_string(), "<file> was not found");
        assert_ne!(err.exit_code(), 0);
    }

    #[tokio::test]
    async fn test_missing_directory() {
        let path = scratch_dir().join("no-such-dir").join("list.txt");
        let err = load_usernames(&path).await.unwrap_err();
        assert!(matches!(err, LoadError::DirectoryNotFound(_)));
    }

    #[tokio::test]
    async fn test_directory_instead_of_file() {
        let err = load_usernames(&scratch_dir()).await.unwrap_err();
        assert!(matches!(err, LoadError::Unauthorized(_)));
        assert_ne!(err.exit_code(), 0);
    }

    #[tokio::test]
    async fn test_overlong_name() {
        let path = scratch_dir().join("x".repeat(1024));
        let err = load_usernames(&path).await.unwrap_err();
        assert!(matches!(err, LoadError::PathTooLong(_)));
    }
}
