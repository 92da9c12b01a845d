//! Configuration for extraction, compilation, and relay.

use std::ffi::OsString;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

/// Resource limits applied while extracting a single archive.
///
/// There are intentionally no defaults: every caller picks its own policy.
/// Front ends accept only positive values. A zero limit is still honored
/// literally: `max_entries == 0` admits only an empty archive and
/// `max_uncompressed_bytes == 0` admits only empty files.
///
/// # Examples
///
/// ```
/// use protolane_core::ExtractionLimits;
///
/// let limits = ExtractionLimits::new(3000, 300 * 1024 * 1024);
/// assert_eq!(limits.max_entries, 3000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionLimits {
    /// Maximum number of entries (files and directories) in the archive.
    pub max_entries: usize,

    /// Maximum sum of uncompressed file sizes in bytes.
    pub max_uncompressed_bytes: u64,
}

impl ExtractionLimits {
    /// Creates limits from explicit values.
    #[must_use]
    pub const fn new(max_entries: usize, max_uncompressed_bytes: u64) -> Self {
        Self {
            max_entries,
            max_uncompressed_bytes,
        }
    }
}

/// How the relay treats destination hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostPolicyMode {
    /// Only scheme validation; any host is reachable.
    Open,
    /// Only globally routable unicast destinations are reachable.
    #[default]
    Restricted,
}

impl HostPolicyMode {
    /// Returns the lowercase name used in configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Restricted => "restricted",
        }
    }
}

impl fmt::Display for HostPolicyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HostPolicyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "restricted" => Ok(Self::Restricted),
            other => Err(format!(
                "invalid host policy '{other}' (expected 'open' or 'restricted')"
            )),
        }
    }
}

/// Relay forwarding configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayConfig {
    /// Destination host policy.
    pub policy: HostPolicyMode,

    /// Whole-request timeout applied by the transport.
    pub timeout: Duration,
}

impl Default for RelayConfig {
    /// Restricted policy with a 30 second timeout.
    fn default() -> Self {
        Self {
            policy: HostPolicyMode::Restricted,
            timeout: Duration::from_secs(30),
        }
    }
}

impl RelayConfig {
    /// Creates a configuration with the given policy and the default timeout.
    #[must_use]
    pub fn with_policy(policy: HostPolicyMode) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }
}

/// Schema compiler configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    /// Compiler executable, looked up on `PATH` if not absolute.
    pub program: OsString,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: OsString::from("protoc"),
        }
    }
}

impl CompilerConfig {
    /// Creates a configuration for a specific compiler executable.
    #[must_use]
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

/// Parses a byte size with an optional binary suffix (K, M, G, T).
///
/// # Examples
///
/// ```
/// use protolane_core::parse_byte_size;
///
/// assert_eq!(parse_byte_size("25M"), Ok(25 * 1024 * 1024));
/// assert_eq!(parse_byte_size("4096"), Ok(4096));
/// assert!(parse_byte_size("lots").is_err());
/// ```
pub fn parse_byte_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty byte size".to_string());
    }

    let (num_str, multiplier) = if let Some(stripped) = s.strip_suffix(['T', 't']) {
        (stripped, 1024_u64.pow(4))
    } else if let Some(stripped) = s.strip_suffix(['G', 'g']) {
        (stripped, 1024_u64.pow(3))
    } else if let Some(stripped) = s.strip_suffix(['M', 'm']) {
        (stripped, 1024_u64.pow(2))
    } else if let Some(stripped) = s.strip_suffix(['K', 'k']) {
        (stripped, 1024)
    } else {
        (s, 1)
    };

    num_str
        .trim()
        .parse::<u64>()
        .map_err(|_| format!("invalid byte size: {s}"))
        .and_then(|n| {
            n.checked_mul(multiplier)
                .ok_or_else(|| format!("byte size overflow: {s}"))
        })
}

/// Like [`parse_byte_size`], but rejects zero.
///
/// # Examples
///
/// ```
/// use protolane_core::parse_positive_byte_size;
///
/// assert_eq!(parse_positive_byte_size("1K"), Ok(1024));
/// assert!(parse_positive_byte_size("0M").is_err());
/// ```
pub fn parse_positive_byte_size(s: &str) -> Result<u64, String> {
    match parse_byte_size(s)? {
        0 => Err(format!("byte size must be greater than zero: {}", s.trim())),
        n => Ok(n),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_config_default() {
        let config = RelayConfig::default();
        assert_eq!(config.policy, HostPolicyMode::Restricted);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_compiler_config_default() {
        assert_eq!(CompilerConfig::default().program, OsString::from("protoc"));
    }

    #[test]
    fn test_host_policy_from_str() {
        assert_eq!("open".parse::<HostPolicyMode>(), Ok(HostPolicyMode::Open));
        assert_eq!(
            " Restricted ".parse::<HostPolicyMode>(),
            Ok(HostPolicyMode::Restricted)
        );
        assert!("closed".parse::<HostPolicyMode>().is_err());
    }

    #[test]
    fn test_host_policy_serde_lowercase() {
        let json = serde_json::to_string(&HostPolicyMode::Open).unwrap();
        assert_eq!(json, "\"open\"");
        let mode: HostPolicyMode = serde_json::from_str("\"restricted\"").unwrap();
        assert_eq!(mode, HostPolicyMode::Restricted);
    }

    #[test]
    fn test_parse_byte_size() {
        assert_eq!(parse_byte_size("0"), Ok(0));
        assert_eq!(parse_byte_size("1K"), Ok(1024));
        assert_eq!(parse_byte_size("300M"), Ok(300 * 1024 * 1024));
        assert_eq!(parse_byte_size("2g"), Ok(2 * 1024 * 1024 * 1024));
        assert_eq!(parse_byte_size("1T"), Ok(1024_u64.pow(4)));
        assert!(parse_byte_size("").is_err());
        assert!(parse_byte_size("M").is_err());
        assert!(parse_byte_size("-5").is_err());
        assert!(parse_byte_size("99999999999T").is_err());
    }

    #[test]
    fn test_parse_positive_byte_size_rejects_zero() {
        assert_eq!(parse_positive_byte_size("2K"), Ok(2048));
        assert!(parse_positive_byte_size("0").is_err());
        assert!(parse_positive_byte_size(" 0K ").is_err());
        assert!(parse_positive_byte_size("lots").is_err());
    }
}
