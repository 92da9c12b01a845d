//! Schema file discovery.

use std::path::Path;

use walkdir::WalkDir;

use crate::Error;
use crate::Result;
use crate::schema;

/// Recursively lists schema files under `dir`.
///
/// Only regular files whose name ends with `.proto` (any case) are returned.
/// Symbolic links are not followed. Paths are relative to `dir`, use `/`
/// separators, and are sorted.
pub fn discover_schema_files(dir: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry.map_err(|e| Error::Io(e.into()))?;
        if !entry.file_type().is_file() || !schema::is_schema_path(entry.path()) {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(dir) {
            files.push(schema::to_forward_slash(relative));
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_discover_sorted_relative() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("b/nested")).unwrap();
        fs::write(root.join("z.proto"), "").unwrap();
        fs::write(root.join("b/nested/y.PROTO"), "").unwrap();
        fs::write(root.join("a.proto"), "").unwrap();
        fs::write(root.join("notes.txt"), "").unwrap();
        fs::write(root.join("descriptor.pb"), "").unwrap();

        let files = discover_schema_files(root).unwrap();
        assert_eq!(files, ["a.proto", "b/nested/y.PROTO", "z.proto"]);
    }

    #[test]
    fn test_discover_skips_directories_named_like_schemas() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("odd.proto")).unwrap();
        assert!(discover_schema_files(temp.path()).unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_does_not_follow_symlinks() {
        let temp = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("secret.proto"), "").unwrap();
        std::os::unix::fs::symlink(outside.path(), temp.path().join("link")).unwrap();
        std::os::unix::fs::symlink(
            outside.path().join("secret.proto"),
            temp.path().join("direct.proto"),
        )
        .unwrap();

        assert!(discover_schema_files(temp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_discover_missing_directory() {
        let temp = TempDir::new().unwrap();
        let err = discover_schema_files(&temp.path().join("missing")).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Io);
    }
}
