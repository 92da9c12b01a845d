//! CLI argument parsing using clap.

use clap::Parser;
use clap::Subcommand;
use clap_complete::Shell;
use protolane_core::HostPolicyMode;
use protolane_core::parse_positive_byte_size;
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "protolane")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Safely extract a schema archive and list its .proto files
    Extract(ExtractArgs),
    /// Compile a schema archive or directory into a descriptor set
    Compile(CompileArgs),
    /// POST a binary payload to a URL under a host policy
    Relay(RelayArgs),
    /// Print shell completions
    Completion(CompletionArgs),
}

/// Limits shared by every command that reads an archive.
#[derive(clap::Args, Clone, Copy)]
pub struct LimitArgs {
    /// Maximum number of archive entries
    #[arg(long, default_value_t = 3000, value_parser = clap::value_parser!(u64).range(1..))]
    pub max_entries: u64,

    /// Maximum total uncompressed size (e.g. 300M, 1G)
    #[arg(long, default_value = "300M", value_parser = parse_positive_byte_size)]
    pub max_uncompressed: u64,
}

#[derive(clap::Args)]
pub struct ExtractArgs {
    /// Path to the ZIP archive
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Parent directory for the extraction directory (default: system temp)
    #[arg(long, value_name = "DIR")]
    pub into: Option<PathBuf>,

    #[command(flatten)]
    pub limits: LimitArgs,
}

#[derive(clap::Args)]
pub struct CompileArgs {
    /// ZIP archive or directory of .proto files
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// File to write the descriptor set to
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Compiler executable
    #[arg(long, value_name = "PROG", default_value = "protoc", env = "PROTOLANE_PROTOC")]
    pub protoc: OsString,

    /// Descriptor file name inside the schema directory
    #[arg(long, value_name = "NAME", default_value = "descriptor.pb")]
    pub output_name: String,

    #[command(flatten)]
    pub limits: LimitArgs,
}

#[derive(clap::Args)]
pub struct RelayArgs {
    /// Destination URL (http or https)
    #[arg(value_name = "URL")]
    pub url: String,

    /// Payload file, or '-' for stdin (default: empty payload)
    #[arg(short, long, value_name = "FILE")]
    pub payload: Option<PathBuf>,

    /// Header override as name=value (can be repeated)
    #[arg(short = 'H', long = "header", value_name = "NAME=VALUE", value_parser = parse_header_pair)]
    pub header: Vec<(String, String)>,

    /// Header overrides as a JSON object of scalar values
    #[arg(long, value_name = "JSON")]
    pub headers: Option<String>,

    /// Destination host policy
    #[arg(long, default_value = "restricted", value_parser = parse_policy)]
    pub policy: HostPolicyMode,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,

    /// Write the response body to FILE
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct CompletionArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,
}

fn parse_header_pair(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in '{s}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

fn parse_policy(s: &str) -> Result<HostPolicyMode, String> {
    s.parse()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_header_pair() {
        assert_eq!(
            parse_header_pair("X-Trace=abc=def").unwrap(),
            ("X-Trace".to_string(), "abc=def".to_string())
        );
        assert_eq!(
            parse_header_pair("x-empty=").unwrap(),
            ("x-empty".to_string(), String::new())
        );
        assert!(parse_header_pair("novalue").is_err());
        assert!(parse_header_pair("=value").is_err());
    }

    #[test]
    fn test_relay_defaults() {
        let cli = Cli::try_parse_from(["protolane", "relay", "https://example.com/x"]).unwrap();
        let Commands::Relay(args) = cli.command else {
            panic!("expected relay");
        };
        assert_eq!(args.policy, HostPolicyMode::Restricted);
        assert_eq!(args.timeout, 30);
        assert!(args.header.is_empty());
    }

    #[test]
    fn test_limit_parsing() {
        let cli = Cli::try_parse_from([
            "protolane",
            "extract",
            "a.zip",
            "--max-entries",
            "5",
            "--max-uncompressed",
            "2K",
        ])
        .unwrap();
        let Commands::Extract(args) = cli.command else {
            panic!("expected extract");
        };
        assert_eq!(args.limits.max_entries, 5);
        assert_eq!(args.limits.max_uncompressed, 2048);
    }

    #[test]
    fn test_zero_limits_rejected() {
        for flag in ["--max-entries", "--max-uncompressed"] {
            let result = Cli::try_parse_from(["protolane", "extract", "a.zip", flag, "0"]);
            assert!(result.is_err(), "{flag}");
        }
    }
}
