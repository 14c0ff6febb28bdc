use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Read a file to string, replacing invalid UTF-8 sequences with the replacement character.
///
/// # Errors
/// Returns an error if the file cannot be read.
pub fn read_to_string_lossy(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Lexically normalize a path: drop `.` components and fold `..` into the
/// preceding component.
///
/// The filesystem is never consulted, so symlinks are left alone. A `..`
/// directly under the root stays at the root.
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }

    out
}

/// Render a relative path with `/` separators regardless of platform.
#[must_use]
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_to_string_lossy_valid_utf8() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"name":"pkg"}"#).unwrap();
        file.flush().unwrap();

        let content = read_to_string_lossy(file.path()).unwrap();
        assert_eq!(content, r#"{"name":"pkg"}"#);
    }

    #[test]
    fn test_read_to_string_lossy_invalid_utf8() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0x48, 0x65, 0x6c, 0x6c, 0x6f, 0x80, 0x81])
            .unwrap();
        file.flush().unwrap();

        let content = read_to_string_lossy(file.path()).unwrap();
        assert!(content.starts_with("Hello"));
        assert!(content.contains('\u{FFFD}'));
    }

    #[test]
    fn test_read_to_string_lossy_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_to_string_lossy(&dir.path().join("nope.json")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_normalize_path_folds_dots() {
        assert_eq!(
            normalize_path(Path::new("/proj/x/y/./../a/b.js")),
            PathBuf::from("/proj/x/a/b.js")
        );
        assert_eq!(
            normalize_path(Path::new("/proj/x/y/../../a.js")),
            PathBuf::from("/proj/a.js")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_normalize_path_parent_of_root() {
        assert_eq!(normalize_path(Path::new("/../a.js")), PathBuf::from("/a.js"));
    }

    #[test]
    fn test_normalize_path_relative_keeps_leading_parent() {
        assert_eq!(
            normalize_path(Path::new("../a/./b")),
            Path::new("..").join("a").join("b")
        );
    }

    #[test]
    fn test_to_slash() {
        let p = Path::new("dist").join("sub").join("a.js");
        assert_eq!(to_slash(&p), "dist/sub/a.js");
    }
}
