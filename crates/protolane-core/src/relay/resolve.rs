//! Host name resolution used by the restricted host policy.

use std::fmt;
use std::io;
use std::net::SocketAddr;

use async_trait::async_trait;

/// Resolves host names to socket addresses.
#[async_trait]
pub trait HostResolver: Send + Sync + fmt::Debug {
    /// Resolves `host` for a connection to `port`.
    async fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<SocketAddr>>;
}

/// [`HostResolver`] using the operating system resolver via Tokio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl HostResolver for SystemResolver {
    async fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<SocketAddr>> {
        let addrs = tokio::net::lookup_host((host, port)).await?;
        Ok(addrs.collect())
    }
}
