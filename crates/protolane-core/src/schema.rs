//! Schema file naming helpers.

use std::ffi::OsString;
use std::path::Component;
use std::path::Path;

/// Suffix identifying schema source files, matched case-insensitively.
pub const SCHEMA_SUFFIX: &str = ".proto";

/// Default descriptor set file name.
pub const DEFAULT_DESCRIPTOR_NAME: &str = "descriptor.pb";

/// Returns `true` if `name` ends with [`SCHEMA_SUFFIX`], ignoring ASCII case.
///
/// # Examples
///
/// ```
/// use protolane_core::schema::is_schema_name;
///
/// assert!(is_schema_name("api/v1/Service.PROTO"));
/// assert!(!is_schema_name("README.md"));
/// assert!(!is_schema_name(".proto.bak"));
/// ```
#[must_use]
pub fn is_schema_name(name: &str) -> bool {
    let name = name.as_bytes();
    let suffix = SCHEMA_SUFFIX.as_bytes();
    name.len() >= suffix.len() && name[name.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}

/// Same as [`is_schema_name`] for a path's final component.
#[must_use]
pub fn is_schema_path(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| is_schema_name(&name.to_string_lossy()))
}

/// Renders a relative path with `/` separators regardless of host conventions.
#[must_use]
pub fn to_forward_slash(relative: &Path) -> String {
    let mut out = String::new();
    for component in relative.components() {
        if let Component::Normal(part) = component {
            if !out.is_empty() {
                out.push('/');
            }
            out.push_str(&part.to_string_lossy());
        }
    }
    out
}

/// Like [`to_forward_slash`], but keeps non-UTF-8 components intact.
#[must_use]
pub fn to_forward_slash_os(relative: &Path) -> OsString {
    let mut out = OsString::new();
    for component in relative.components() {
        if let Component::Normal(part) = component {
            if !out.is_empty() {
                out.push("/");
            }
            out.push(part);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_is_schema_name_case_insensitive() {
        assert!(is_schema_name("a.proto"));
        assert!(is_schema_name("a.Proto"));
        assert!(is_schema_name("dir/A.PROTO"));
        assert!(is_schema_name(".proto"));
        assert!(!is_schema_name("a.protobuf"));
        assert!(!is_schema_name("proto"));
        assert!(!is_schema_name(""));
    }

    #[test]
    fn test_is_schema_name_multibyte() {
        assert!(is_schema_name("схема.proto"));
        assert!(!is_schema_name("схема"));
    }

    #[test]
    fn test_is_schema_path() {
        assert!(is_schema_path(Path::new("a/b/c.proto")));
        assert!(!is_schema_path(Path::new("a/b/c.txt")));
        assert!(!is_schema_path(Path::new("/")));
    }

    #[test]
    fn test_to_forward_slash() {
        let path: PathBuf = ["a", "b", "c.proto"].iter().collect();
        assert_eq!(to_forward_slash(&path), "a/b/c.proto");
        assert_eq!(to_forward_slash_os(&path), OsString::from("a/b/c.proto"));
        assert_eq!(to_forward_slash(Path::new("./root.proto")), "root.proto");
    }
}
