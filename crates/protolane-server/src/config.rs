//! Server configuration from flags and `PROTOLANE_*` environment variables.

use std::ffi::OsString;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use protolane_core::CompilerConfig;
use protolane_core::ExtractionLimits;
use protolane_core::HostPolicyMode;
use protolane_core::RelayConfig;
use protolane_core::parse_positive_byte_size;

const MIB: u64 = 1024 * 1024;

/// Default listen address.
pub const DEFAULT_LISTEN: SocketAddr =
    SocketAddr::V4(std::net::SocketAddrV4::new(std::net::Ipv4Addr::LOCALHOST, 3000));

/// Runtime configuration for `protolane-server`.
#[derive(Debug, Clone, Parser)]
#[command(name = "protolane-server", version, about, long_about = None)]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "PROTOLANE_LISTEN", default_value_t = DEFAULT_LISTEN)]
    pub listen: SocketAddr,

    /// Maximum accepted archive upload size (e.g. 25M)
    #[arg(long, env = "PROTOLANE_MAX_UPLOAD", default_value_t = 25 * MIB, value_parser = parse_positive_byte_size)]
    pub max_upload: u64,

    /// Maximum number of entries in an uploaded archive
    #[arg(long, env = "PROTOLANE_MAX_ENTRIES", default_value_t = 3000, value_parser = clap::value_parser!(u64).range(1..))]
    pub max_entries: u64,

    /// Maximum total uncompressed size of an uploaded archive
    #[arg(long, env = "PROTOLANE_MAX_UNCOMPRESSED", default_value_t = 300 * MIB, value_parser = parse_positive_byte_size)]
    pub max_uncompressed: u64,

    /// Maximum relay payload size
    #[arg(long, env = "PROTOLANE_MAX_PAYLOAD", default_value_t = 10 * MIB, value_parser = parse_positive_byte_size)]
    pub max_payload: u64,

    /// Schema compiler executable
    #[arg(long, env = "PROTOLANE_PROTOC", default_value = "protoc")]
    pub protoc: OsString,

    /// Parent directory for extraction scratch directories (default: system temp)
    #[arg(long, env = "PROTOLANE_SCRATCH_ROOT")]
    pub scratch_root: Option<PathBuf>,

    /// Relay destination policy: open or restricted
    #[arg(long, env = "PROTOLANE_HOST_POLICY", default_value = "restricted", value_parser = parse_policy)]
    pub host_policy: HostPolicyMode,

    /// Relay request timeout in seconds
    #[arg(long, env = "PROTOLANE_RELAY_TIMEOUT", default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    pub relay_timeout: u64,

    /// Maximum number of archive compilations running at once
    #[arg(long, env = "PROTOLANE_MAX_CONCURRENT_COMPILATIONS", default_value_t = 4, value_parser = clap::value_parser!(u64).range(1..=1024))]
    pub max_concurrent_compilations: u64,

    /// Expose POST /mock, which echoes its body
    #[arg(long, env = "PROTOLANE_ENABLE_MOCK")]
    pub enable_mock: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "PROTOLANE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN,
            max_upload: 25 * MIB,
            max_entries: 3000,
            max_uncompressed: 300 * MIB,
            max_payload: 10 * MIB,
            protoc: OsString::from("protoc"),
            scratch_root: None,
            host_policy: HostPolicyMode::Restricted,
            relay_timeout: 30,
            max_concurrent_compilations: 4,
            enable_mock: false,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Limits applied to every uploaded archive.
    pub fn extraction_limits(&self) -> ExtractionLimits {
        ExtractionLimits::new(
            usize::try_from(self.max_entries).unwrap_or(usize::MAX),
            self.max_uncompressed,
        )
    }

    /// Relay policy and timeout.
    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            policy: self.host_policy,
            timeout: Duration::from_secs(self.relay_timeout),
        }
    }

    /// Compiler program.
    pub fn compiler_config(&self) -> CompilerConfig {
        CompilerConfig::new(self.protoc.clone())
    }

    /// Upload limit as a body size, saturating on narrow platforms.
    pub fn max_upload_bytes(&self) -> usize {
        usize::try_from(self.max_upload).unwrap_or(usize::MAX)
    }

    /// Relay payload limit as a body size.
    pub fn max_payload_bytes(&self) -> usize {
        usize::try_from(self.max_payload).unwrap_or(usize::MAX)
    }
}

fn parse_policy(s: &str) -> Result<HostPolicyMode, String> {
    s.parse()
}
