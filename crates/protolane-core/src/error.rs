//! Error types shared by extraction, compilation, and relay operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error source carried by transport and compiler failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Flat discriminant of an [`Error`].
///
/// Callers branch on the kind instead of matching on variant payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Filesystem or other local I/O failure.
    Io,
    /// The byte stream is not a readable archive.
    InvalidArchive,
    /// Archive holds more entries than allowed.
    TooManyEntries,
    /// An entry resolves outside the output directory.
    PathTraversal,
    /// Running uncompressed total exceeded the limit.
    SizeLimitExceeded,
    /// Two entries resolve to the same destination file.
    DuplicateEntry,
    /// No schema files were found to compile.
    NoSchemaFiles,
    /// Descriptor output name is not a plain file name.
    InvalidOutputName,
    /// The compiler process could not be started.
    CompilerUnavailable,
    /// The compiler exited unsuccessfully.
    CompilerFailure,
    /// Destination URL is malformed or uses a disallowed scheme.
    InvalidUrl,
    /// A caller-supplied header cannot be sent.
    InvalidHeader,
    /// Destination host is rejected by the host policy.
    ForbiddenHost,
    /// Network-level failure talking to the destination.
    TransportError,
}

impl ErrorKind {
    /// Stable machine-readable code for this kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use protolane_core::ErrorKind;
    ///
    /// assert_eq!(ErrorKind::PathTraversal.code(), "PATH_TRAVERSAL");
    /// ```
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Io => "IO_ERROR",
            Self::InvalidArchive => "INVALID_ARCHIVE",
            Self::TooManyEntries => "TOO_MANY_ENTRIES",
            Self::PathTraversal => "PATH_TRAVERSAL",
            Self::SizeLimitExceeded => "SIZE_LIMIT_EXCEEDED",
            Self::DuplicateEntry => "DUPLICATE_ENTRY",
            Self::NoSchemaFiles => "NO_SCHEMA_FILES",
            Self::InvalidOutputName => "INVALID_OUTPUT_NAME",
            Self::CompilerUnavailable => "COMPILER_UNAVAILABLE",
            Self::CompilerFailure => "COMPILER_FAILURE",
            Self::InvalidUrl => "INVALID_URL",
            Self::InvalidHeader => "INVALID_HEADER",
            Self::ForbiddenHost => "FORBIDDEN_HOST",
            Self::TransportError => "TRANSPORT_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Errors that can occur while extracting, compiling, or relaying.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive is corrupted or not a ZIP archive.
    #[error("invalid archive: {0}")]
    InvalidArchive(String),

    /// Archive contains more entries than the configured maximum.
    #[error("too many archive entries ({count} > {max})")]
    TooManyEntries {
        /// Number of entries in the archive.
        count: usize,
        /// Maximum allowed entries.
        max: usize,
    },

    /// Entry name resolves outside the output directory.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The raw entry name.
        path: PathBuf,
    },

    /// Uncompressed size limit exceeded.
    #[error("uncompressed size limit exceeded ({total} > {max} bytes)")]
    SizeLimitExceeded {
        /// Running total at the point of failure.
        total: u64,
        /// Maximum allowed total.
        max: u64,
    },

    /// Entry would overwrite a file written earlier in the same archive.
    #[error("duplicate archive entry: {path}")]
    DuplicateEntry {
        /// The raw entry name.
        path: PathBuf,
    },

    /// Directory contains no schema files.
    #[error("no .proto files found in {dir}")]
    NoSchemaFiles {
        /// The searched directory.
        dir: PathBuf,
    },

    /// Descriptor output name is not a single file name.
    #[error("invalid descriptor output name: {name}")]
    InvalidOutputName {
        /// The rejected name.
        name: String,
    },

    /// Compiler process could not be spawned.
    #[error("failed to launch {program}: {source}")]
    CompilerUnavailable {
        /// Program that was invoked.
        program: PathBuf,
        /// OS-level spawn error.
        #[source]
        source: std::io::Error,
    },

    /// Compiler exited with a non-zero status or was killed.
    #[error("{}", compiler_failure_message(*.exit_code, .diagnostics))]
    CompilerFailure {
        /// Exit code, or `None` if terminated by a signal.
        exit_code: Option<i32>,
        /// Captured diagnostics, verbatim.
        diagnostics: String,
    },

    /// URL is malformed or not http/https.
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl {
        /// The URL as supplied.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Header name or value is not valid on the wire.
    #[error("invalid header '{name}': {reason}")]
    InvalidHeader {
        /// Header name as supplied.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Host rejected by the restricted host policy.
    #[error("forbidden host '{host}': {reason}")]
    ForbiddenHost {
        /// Host as it appears in the URL.
        host: String,
        /// Which rule rejected it.
        reason: String,
    },

    /// DNS, connection, timeout, or other transport failure.
    #[error("transport error: {message}")]
    Transport {
        /// Full error chain of the underlying cause.
        message: String,
        /// Underlying cause.
        #[source]
        source: BoxError,
    },
}

fn compiler_failure_message(exit_code: Option<i32>, diagnostics: &str) -> String {
    let status = exit_code.map_or_else(|| "signal".to_string(), |code| code.to_string());
    let diagnostics = diagnostics.trim();
    if diagnostics.is_empty() {
        format!("protoc exit {status}")
    } else {
        format!("protoc exit {status}: {diagnostics}")
    }
}

impl Error {
    /// Builds a transport error, flattening the cause's source chain into the
    /// message so nothing below the top-level error is lost.
    pub fn transport(source: impl Into<BoxError>) -> Self {
        let source = source.into();
        let mut message = source.to_string();
        let mut cause = source.source();
        while let Some(inner) = cause {
            let text = inner.to_string();
            if !message.contains(&text) {
                message.push_str(": ");
                message.push_str(&text);
            }
            cause = inner.source();
        }
        Self::Transport { message, source }
    }

    /// Returns the discriminating kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Io,
            Self::InvalidArchive(_) => ErrorKind::InvalidArchive,
            Self::TooManyEntries { .. } => ErrorKind::TooManyEntries,
            Self::PathTraversal { .. } => ErrorKind::PathTraversal,
            Self::SizeLimitExceeded { .. } => ErrorKind::SizeLimitExceeded,
            Self::DuplicateEntry { .. } => ErrorKind::DuplicateEntry,
            Self::NoSchemaFiles { .. } => ErrorKind::NoSchemaFiles,
            Self::InvalidOutputName { .. } => ErrorKind::InvalidOutputName,
            Self::CompilerUnavailable { .. } => ErrorKind::CompilerUnavailable,
            Self::CompilerFailure { .. } => ErrorKind::CompilerFailure,
            Self::InvalidUrl { .. } => ErrorKind::InvalidUrl,
            Self::InvalidHeader { .. } => ErrorKind::InvalidHeader,
            Self::ForbiddenHost { .. } => ErrorKind::ForbiddenHost,
            Self::Transport { .. } => ErrorKind::TransportError,
        }
    }

    /// Returns `true` if this error represents a rejected hostile input.
    ///
    /// # Examples
    ///
    /// ```
    /// use protolane_core::Error;
    /// use std::path::PathBuf;
    ///
    /// let err = Error::PathTraversal {
    ///     path: PathBuf::from("../etc/passwd"),
    /// };
    /// assert!(err.is_security_violation());
    ///
    /// let err = Error::InvalidArchive("bad header".into());
    /// assert!(!err.is_security_violation());
    /// ```
    #[must_use]
    pub const fn is_security_violation(&self) -> bool {
        matches!(
            self,
            Self::TooManyEntries { .. }
                | Self::PathTraversal { .. }
                | Self::SizeLimitExceeded { .. }
                | Self::DuplicateEntry { .. }
                | Self::ForbiddenHost { .. }
        )
    }

    /// Returns the compiler diagnostics, if this is a compiler failure.
    #[must_use]
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            Self::CompilerFailure { diagnostics, .. } => Some(diagnostics),
            _ => None,
        }
    }
}
