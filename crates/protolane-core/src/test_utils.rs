//! In-memory ZIP fixtures for tests, doc examples, and benchmarks.
//!
//! # Panics
//!
//! Builders panic on writer errors; they are meant for test code only.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::io::Cursor;
use std::io::Write;

use zip::CompressionMethod;
use zip::write::SimpleFileOptions;
use zip::write::ZipWriter;

/// Builds a ZIP archive entry by entry.
///
/// # Examples
///
/// ```
/// use protolane_core::test_utils::ZipBuilder;
///
/// let zip = ZipBuilder::new()
///     .dir("a/")
///     .file("a/b.proto", b"syntax = \"proto3\";")
///     .deflated("big.proto", &vec![b' '; 4096])
///     .build();
/// assert!(!zip.is_empty());
/// ```
pub struct ZipBuilder {
    writer: ZipWriter<Cursor<Vec<u8>>>,
}

impl ZipBuilder {
    /// Starts an empty archive.
    #[must_use]
    pub fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    fn options(method: CompressionMethod) -> SimpleFileOptions {
        SimpleFileOptions::default()
            .compression_method(method)
            .unix_permissions(0o644)
    }

    /// Adds a stored file entry.
    #[must_use]
    pub fn file(mut self, name: &str, data: impl AsRef<[u8]>) -> Self {
        self.writer
            .start_file(name, Self::options(CompressionMethod::Stored))
            .unwrap();
        self.writer.write_all(data.as_ref()).unwrap();
        self
    }

    /// Adds a deflate-compressed file entry.
    #[must_use]
    pub fn deflated(mut self, name: &str, data: impl AsRef<[u8]>) -> Self {
        self.writer
            .start_file(name, Self::options(CompressionMethod::Deflated))
            .unwrap();
        self.writer.write_all(data.as_ref()).unwrap();
        self
    }

    /// Adds a directory entry. The name should end with `/`.
    #[must_use]
    pub fn dir(mut self, name: &str) -> Self {
        self.writer
            .add_directory(name, Self::options(CompressionMethod::Stored))
            .unwrap();
        self
    }

    /// Adds a symlink entry pointing at `target`.
    #[must_use]
    pub fn symlink(mut self, name: &str, target: &str) -> Self {
        self.writer
            .add_symlink(name, target, Self::options(CompressionMethod::Stored))
            .unwrap();
        self
    }

    /// Finishes the archive and returns its bytes.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        self.writer.finish().unwrap().into_inner()
    }
}

impl Default for ZipBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Creates an archive of stored files from `(name, content)` pairs.
#[must_use]
pub fn zip_of(entries: &[(&str, &[u8])]) -> Vec<u8> {
    entries
        .iter()
        .fold(ZipBuilder::new(), |builder, (name, data)| {
            builder.file(name, data)
        })
        .build()
}
