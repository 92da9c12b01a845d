//! Destination path resolution for archive entries.

use std::io;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use crate::Error;
use crate::Result;

/// Lexically normalizes a raw archive entry name into a relative path.
///
/// Entry names are split on `/`. Empty and `.` segments are skipped and `..`
/// removes the previous segment. The name is rejected with
/// [`Error::PathTraversal`] if it:
/// - is absolute, or any segment carries a root or drive prefix
/// - contains a NUL byte
/// - climbs above the root with `..`
/// - resolves to the root itself
///
/// # Examples
///
/// ```
/// use protolane_core::security::normalize_entry_name;
/// use std::path::Path;
///
/// # fn main() -> Result<(), protolane_core::Error> {
/// assert_eq!(normalize_entry_name("a/./b/../c.proto")?, Path::new("a/c.proto"));
/// assert!(normalize_entry_name("../evil.txt").is_err());
/// assert!(normalize_entry_name("/etc/passwd").is_err());
/// # Ok(())
/// # }
/// ```
pub fn normalize_entry_name(name: &str) -> Result<PathBuf> {
    let traversal = || Error::PathTraversal {
        path: PathBuf::from(name),
    };

    if name.contains('\0') || name.starts_with('/') {
        return Err(traversal());
    }

    let mut parts: Vec<&str> = Vec::new();
    for segment in name.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.pop().is_none() {
                    return Err(traversal());
                }
            }
            _ => {
                // A segment must be exactly one normal component on this host
                // (rejects `C:` prefixes and backslash separators on Windows).
                let mut components = Path::new(segment).components();
                match (components.next(), components.next()) {
                    (Some(Component::Normal(_)), None) => parts.push(segment),
                    _ => return Err(traversal()),
                }
            }
        }
    }

    if parts.is_empty() {
        return Err(traversal());
    }

    Ok(parts.iter().collect())
}

/// Resolves an entry name to an absolute destination strictly inside `root`.
///
/// `root` must be a canonical path. After lexical normalization, the deepest
/// ancestor of the destination that already exists is canonicalized and must
/// still lie under `root`, so a directory replaced by a link cannot redirect
/// the write.
pub fn resolve_entry_path(root: &Path, name: &str) -> Result<PathBuf> {
    let relative = normalize_entry_name(name)?;
    let destination = root.join(&relative);

    let existing = destination
        .ancestors()
        .find(|ancestor| ancestor.symlink_metadata().is_ok())
        .unwrap_or(root);

    let canonical = match existing.canonicalize() {
        Ok(canonical) => canonical,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::PathTraversal {
                path: PathBuf::from(name),
            });
        }
        Err(e) => return Err(Error::Io(e)),
    };

    if !canonical.starts_with(root) {
        return Err(Error::PathTraversal {
            path: PathBuf::from(name),
        });
    }

    if existing == destination && canonical == root {
        return Err(Error::PathTraversal {
            path: PathBuf::from(name),
        });
    }

    Ok(destination)
}
