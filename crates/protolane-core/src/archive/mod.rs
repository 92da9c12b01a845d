//! Safe ZIP extraction into scoped scratch directories.

use std::fs;
use std::fs::OpenOptions;
use std::io;
use std::io::Cursor;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::Error;
use crate::ExtractionLimits;
use crate::ExtractionReport;
use crate::Result;
use crate::ScratchDir;
use crate::ScratchSpace;
use crate::schema;
use crate::security::SizeBudget;
use crate::security::resolve_entry_path;

/// Extracts untrusted ZIP archives.
///
/// Every call gets a fresh directory from the configured [`ScratchSpace`].
/// The directory is owned by the returned [`ExtractionResult`] and released
/// when that result is dropped. If extraction fails, the partially written
/// directory is released before the error is returned.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use protolane_core::{ArchiveExtractor, ExtractionLimits, TempScratch};
/// use protolane_core::test_utils::ZipBuilder;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let root = tempfile::tempdir()?;
/// let extractor = ArchiveExtractor::new(Arc::new(TempScratch::new(root.path())));
///
/// let archive = ZipBuilder::new()
///     .dir("a/")
///     .file("a/b.proto", b"syntax = \"proto3\";")
///     .file("root.proto", b"syntax = \"proto3\";")
///     .build();
///
/// let result = extractor.extract(&archive, &ExtractionLimits::new(10, 1024 * 1024))?;
/// assert_eq!(result.schema_files(), ["a/b.proto", "root.proto"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ArchiveExtractor {
    scratch: Arc<dyn ScratchSpace>,
}

impl ArchiveExtractor {
    /// Creates an extractor allocating output directories from `scratch`.
    pub fn new(scratch: Arc<dyn ScratchSpace>) -> Self {
        Self { scratch }
    }

    /// Extracts `archive` into a new scratch directory.
    ///
    /// Fails fast on the first violation:
    /// - [`Error::InvalidArchive`] if the bytes are not a readable ZIP
    /// - [`Error::TooManyEntries`] before anything is written
    /// - [`Error::PathTraversal`] for entries resolving outside the directory
    /// - [`Error::SizeLimitExceeded`] when the running uncompressed total
    ///   passes the limit, by declared or by actual size
    /// - [`Error::DuplicateEntry`] when an entry would overwrite a file or
    ///   needs a directory where a file was already written
    pub fn extract(&self, archive: &[u8], limits: &ExtractionLimits) -> Result<ExtractionResult> {
        let started = Instant::now();
        let mut zip = zip::ZipArchive::new(Cursor::new(archive))
            .map_err(|e| Error::InvalidArchive(format!("failed to open ZIP archive: {e}")))?;

        let count = zip.len();
        if count > limits.max_entries {
            tracing::warn!(count, max = limits.max_entries, "archive rejected: too many entries");
            return Err(Error::TooManyEntries {
                count,
                max: limits.max_entries,
            });
        }

        let dir = ScratchDir::allocate(&self.scratch)?;
        let root = dir.path().to_path_buf();
        let mut budget = SizeBudget::new(limits.max_uncompressed_bytes);
        let mut report = ExtractionReport {
            entries: count,
            ..ExtractionReport::new()
        };
        let mut schema_files = Vec::new();

        for index in 0..count {
            let mut entry = zip.by_index(index).map_err(|e| {
                Error::InvalidArchive(format!("failed to read ZIP entry {index}: {e}"))
            })?;
            let name = entry.name().to_string();
            let destination = resolve_entry_path(&root, &name).inspect_err(|_| {
                tracing::warn!(entry = %name, "archive rejected: path traversal");
            })?;

            if entry.is_dir() {
                create_dir_for_entry(&destination, &name)?;
                report.directories_created += 1;
                tracing::debug!(entry = %name, "created directory");
                continue;
            }

            budget.check_declared(entry.size())?;
            if let Some(parent) = destination.parent() {
                create_dir_for_entry(parent, &name)?;
            }

            let written = write_new_file(&destination, &name, &mut entry, budget.remaining())?;
            budget.charge(written)?;
            report.files_written += 1;
            tracing::debug!(entry = %name, bytes = written, "wrote file");

            if schema::is_schema_name(&name) {
                let relative = destination.strip_prefix(&root).unwrap_or(&destination);
                schema_files.push(schema::to_forward_slash(relative));
            }
        }

        schema_files.sort();
        report.schema_files = schema_files.len();
        report.bytes_written = budget.used();
        report.duration = started.elapsed();

        tracing::info!(
            dir = %root.display(),
            files = report.files_written,
            schema_files = report.schema_files,
            bytes = report.bytes_written,
            "archive extracted"
        );

        Ok(ExtractionResult {
            dir,
            schema_files,
            report,
        })
    }
}

/// Creates `path` and its parents, reporting a file in the way as a
/// colliding entry.
fn create_dir_for_entry(path: &Path, name: &str) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| match e.kind() {
        io::ErrorKind::AlreadyExists | io::ErrorKind::NotADirectory => {
            tracing::warn!(entry = %name, "archive rejected: entry collides with a file");
            Error::DuplicateEntry {
                path: PathBuf::from(name),
            }
        }
        _ => Error::Io(e),
    })
}

/// Writes at most `allowance + 1` bytes of `reader` into a newly created file.
///
/// Reading one byte past the allowance is enough for the caller's budget to
/// detect an entry that decompresses beyond its declared size.
fn write_new_file(
    destination: &Path,
    name: &str,
    reader: &mut impl Read,
    allowance: u64,
) -> Result<u64> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(destination)
        .map_err(|e| {
            if e.kind() == io::ErrorKind::AlreadyExists {
                tracing::warn!(entry = %name, "archive rejected: duplicate entry");
                Error::DuplicateEntry {
                    path: PathBuf::from(name),
                }
            } else {
                Error::Io(e)
            }
        })?;

    let mut limited = reader.take(allowance.saturating_add(1));
    io::copy(&mut limited, &mut file).map_err(|e| {
        if e.kind() == io::ErrorKind::InvalidData {
            Error::InvalidArchive(format!("failed to decompress {name}: {e}"))
        } else {
            Error::Io(e)
        }
    })
}

/// Output of a successful extraction.
///
/// Owns the scratch directory: dropping the result deletes the directory.
/// Use [`keep`](Self::keep) to detach it.
#[derive(Debug)]
pub struct ExtractionResult {
    dir: ScratchDir,
    schema_files: Vec<String>,
    report: ExtractionReport,
}

impl ExtractionResult {
    /// Absolute path of the extraction directory.
    pub fn output_dir(&self) -> &Path {
        self.dir.path()
    }

    /// Schema files relative to [`output_dir`](Self::output_dir), with `/`
    /// separators, sorted.
    pub fn schema_files(&self) -> &[String] {
        &self.schema_files
    }

    /// Extraction statistics.
    pub fn report(&self) -> &ExtractionReport {
        &self.report
    }

    /// Deletes the directory now, reporting any error.
    pub fn close(self) -> io::Result<()> {
        self.dir.close()
    }

    /// Detaches the directory so it outlives the result.
    pub fn keep(self) -> (PathBuf, Vec<String>) {
        (self.dir.keep(), self.schema_files)
    }
}
