//! Untrusted-input core of protolane.
//!
//! Three independent components:
//!
//! - [`ArchiveExtractor`] turns an untrusted ZIP archive into a bounded,
//!   safely rooted scratch directory plus a sorted list of `.proto` files,
//!   rejecting path traversal, zip bombs, and duplicate entries.
//! - [`SchemaCompiler`] runs `protoc` over a directory and returns the
//!   descriptor set bytes it wrote.
//! - [`RelayForwarder`] POSTs a binary payload to a caller-chosen URL after
//!   checking the destination against a [`HostPolicyMode`].
//!
//! None of them depends on another; the caller composes them.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use protolane_core::{
//!     ArchiveExtractor, CompilerConfig, ExtractionLimits, SchemaCompiler, TempScratch,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let archive = std::fs::read("schemas.zip")?;
//! let extractor = ArchiveExtractor::new(Arc::new(TempScratch::system()));
//! let compiler = SchemaCompiler::new(&CompilerConfig::default());
//!
//! let extracted = extractor.extract(&archive, &ExtractionLimits::new(3000, 300 << 20))?;
//! let descriptor = compiler.compile(extracted.output_dir())?;
//! println!("{} files, {} bytes", extracted.schema_files().len(), descriptor.len());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod archive;
pub mod compiler;
pub mod config;
pub mod error;
pub mod relay;
pub mod report;
pub mod schema;
pub mod scratch;
pub mod security;
#[doc(hidden)]
pub mod test_utils;

pub use archive::ArchiveExtractor;
pub use archive::ExtractionResult;
pub use compiler::CompiledDescriptor;
pub use compiler::Invocation;
pub use compiler::ProcessOutput;
pub use compiler::ProcessRunner;
pub use compiler::SchemaCompiler;
pub use compiler::SystemRunner;
pub use compiler::discover_schema_files;
pub use config::CompilerConfig;
pub use config::ExtractionLimits;
pub use config::HostPolicyMode;
pub use config::RelayConfig;
pub use config::parse_byte_size;
pub use config::parse_positive_byte_size;
pub use error::Error;
pub use error::ErrorKind;
pub use error::Result;
pub use relay::HeaderOverrides;
pub use relay::HeaderScalar;
pub use relay::RelayForwarder;
pub use relay::RelayRequest;
pub use relay::RelayResponse;
pub use relay::parse_header_overrides;
pub use report::ExtractionReport;
pub use scratch::ScratchDir;
pub use scratch::ScratchSpace;
pub use scratch::TempScratch;
