//! Descriptor set compilation through an external `protoc` process.
//!
//! The compiler is treated as an opaque executable. [`SchemaCompiler`] only
//! builds the argument list, runs it through a [`ProcessRunner`], and reads
//! back the file the process wrote.

mod discover;

pub use discover::discover_schema_files;

use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Stdio;
use std::sync::Arc;

use crate::CompilerConfig;
use crate::Error;
use crate::Result;
use crate::schema;

/// A fully described compiler process launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Executable to run.
    pub program: OsString,
    /// Arguments, in order.
    pub args: Vec<OsString>,
    /// Working directory (the schema directory).
    pub cwd: PathBuf,
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, or `None` if the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Captured standard output.
    pub stdout: Vec<u8>,
    /// Captured standard error.
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    /// Returns `true` for a zero exit code.
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.exit_code, Some(0))
    }

    /// Diagnostics text: stderr, or stdout when stderr is empty.
    #[must_use]
    pub fn diagnostics(&self) -> String {
        let stderr = String::from_utf8_lossy(&self.stderr);
        if stderr.trim().is_empty() {
            String::from_utf8_lossy(&self.stdout).into_owned()
        } else {
            stderr.into_owned()
        }
    }
}

/// Runs an [`Invocation`] to completion.
pub trait ProcessRunner: Send + Sync + fmt::Debug {
    /// Runs the process, capturing its output in memory.
    ///
    /// Returns an error only if the process could not be started or waited on.
    fn run(&self, invocation: &Invocation) -> io::Result<ProcessOutput>;
}

/// [`ProcessRunner`] backed by `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<ProcessOutput> {
        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .stdin(Stdio::null())
            .output()?;
        Ok(ProcessOutput {
            exit_code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// Compiled descriptor set bytes, exactly as written by the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledDescriptor(Vec<u8>);

impl CompiledDescriptor {
    /// Borrows the bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Takes ownership of the bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the compiler produced an empty file.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CompiledDescriptor {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Compiles a directory of `.proto` files into a descriptor set.
///
/// # Examples
///
/// ```no_run
/// use protolane_core::{CompilerConfig, SchemaCompiler};
/// use std::path::Path;
///
/// # fn main() -> Result<(), protolane_core::Error> {
/// let compiler = SchemaCompiler::new(&CompilerConfig::default());
/// let descriptor = compiler.compile(Path::new("/tmp/schemas"))?;
/// println!("{} bytes", descriptor.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SchemaCompiler {
    program: OsString,
    runner: Arc<dyn ProcessRunner>,
}

impl SchemaCompiler {
    /// Creates a compiler that launches real processes.
    pub fn new(config: &CompilerConfig) -> Self {
        Self::with_runner(config, Arc::new(SystemRunner))
    }

    /// Creates a compiler with a custom process runner.
    pub fn with_runner(config: &CompilerConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            program: config.program.clone(),
            runner,
        }
    }

    /// Compiles `dir` into `descriptor.pb` and returns its bytes.
    pub fn compile(&self, dir: &Path) -> Result<CompiledDescriptor> {
        self.compile_as(dir, schema::DEFAULT_DESCRIPTOR_NAME)
    }

    /// Compiles `dir` into `<dir>/<output_name>` and returns its bytes.
    ///
    /// `output_name` must be a plain file name. The output file is removed
    /// before the compiler runs, so a failed run can never return stale bytes.
    /// A relative `dir` is resolved against the current directory first; the
    /// compiler always sees absolute paths.
    pub fn compile_as(&self, dir: &Path, output_name: &str) -> Result<CompiledDescriptor> {
        validate_output_name(output_name)?;

        let dir = &dir.canonicalize()?;
        let files = discover_schema_files(dir)?;
        if files.is_empty() {
            return Err(Error::NoSchemaFiles {
                dir: dir.to_path_buf(),
            });
        }

        let output_path = dir.join(output_name);
        match fs::remove_file(&output_path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(Error::Io(e)),
            _ => {}
        }

        let invocation = self.invocation(dir, &files, &output_path);
        tracing::debug!(
            program = ?invocation.program,
            dir = %dir.display(),
            files = files.len(),
            "running schema compiler"
        );

        let output = self
            .runner
            .run(&invocation)
            .map_err(|source| Error::CompilerUnavailable {
                program: PathBuf::from(&self.program),
                source,
            })?;

        if !output.success() {
            tracing::warn!(exit_code = ?output.exit_code, "schema compiler failed");
            return Err(Error::CompilerFailure {
                exit_code: output.exit_code,
                diagnostics: output.diagnostics(),
            });
        }

        let bytes = fs::read(&output_path)?;
        tracing::info!(
            dir = %dir.display(),
            files = files.len(),
            bytes = bytes.len(),
            "descriptor set compiled"
        );
        Ok(CompiledDescriptor(bytes))
    }

    /// Builds the process invocation for `files` (relative, `/`-separated).
    ///
    /// `dir` and `output_path` are passed through as given and should be
    /// absolute, since the process runs with `dir` as its working directory.
    pub fn invocation(&self, dir: &Path, files: &[String], output_path: &Path) -> Invocation {
        let mut proto_path = OsString::from("--proto_path=");
        proto_path.push(dir.as_os_str());
        let mut descriptor_out = OsString::from("--descriptor_set_out=");
        descriptor_out.push(output_path.as_os_str());

        let mut args = vec![
            proto_path,
            OsString::from("--include_imports"),
            OsString::from("--include_source_info"),
            descriptor_out,
        ];
        args.extend(files.iter().map(OsString::from));

        Invocation {
            program: self.program.clone(),
            args,
            cwd: dir.to_path_buf(),
        }
    }
}

fn validate_output_name(name: &str) -> Result<()> {
    let invalid = || Error::InvalidOutputName {
        name: name.to_string(),
    };
    if name.contains(['/', '\\', '\0']) {
        return Err(invalid());
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(invalid()),
    }
}
